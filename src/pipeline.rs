//! Patient enrichment: attach a CPIC recommendation to every drug record.
//!
//! For each entry of `drug_analysis` the drug is mapped to its gene, the
//! patient's phenotype for that gene is looked up, and retrieval plus
//! generation produce a `clinical_recommendation`. Misses at any step become
//! placeholder recommendations; only retrieval failures abort the request.

use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::guidelines::{gene_for_drug, normalize_drug, Gene};
use crate::llm::recommend::RecommendationGenerator;
use crate::models::ClinicalRecommendation;
use crate::search::ChunkSearch;

pub const PROFILE_KEY: &str = "pharmacogenomic_profile";
pub const DRUG_ANALYSIS_KEY: &str = "drug_analysis";
pub const RECOMMENDATION_KEY: &str = "clinical_recommendation";

/// Gene → phenotype lookup built from a patient payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientProfile {
    phenotypes: BTreeMap<Gene, String>,
}

impl PatientProfile {
    /// Read `pharmacogenomic_profile.genes`, or a bare list under
    /// `pharmacogenomic_profile`. Unknown genes and blank phenotypes are
    /// ignored; the first entry for a gene wins.
    pub fn from_payload(payload: &Value) -> Self {
        let entries = match payload.get(PROFILE_KEY) {
            Some(Value::Array(list)) => list.as_slice(),
            Some(Value::Object(obj)) => match obj.get("genes") {
                Some(Value::Array(list)) => list.as_slice(),
                _ => &[],
            },
            _ => &[],
        };

        let mut phenotypes = BTreeMap::new();
        for entry in entries {
            let gene = entry.get("gene").and_then(Value::as_str).and_then(Gene::parse);
            let phenotype = entry
                .get("phenotype")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|p| !p.is_empty());
            if let (Some(gene), Some(phenotype)) = (gene, phenotype) {
                phenotypes.entry(gene).or_insert_with(|| phenotype.to_string());
            }
        }

        Self { phenotypes }
    }

    pub fn phenotype(&self, gene: Gene) -> Option<&str> {
        self.phenotypes.get(&gene).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.phenotypes.is_empty()
    }
}

/// Retrieval query for one gene/drug/phenotype triple.
pub fn cpic_query(drug: &str, gene: Gene, phenotype: &str) -> String {
    format!("CPIC therapeutic recommendation for {drug} based on {gene} phenotype: {phenotype}")
}

/// Retrieval + generation over a patient payload. Built once and shared.
pub struct EnrichmentPipeline {
    search: Arc<dyn ChunkSearch>,
    generator: RecommendationGenerator,
    k: usize,
}

impl EnrichmentPipeline {
    pub fn new(search: Arc<dyn ChunkSearch>, generator: RecommendationGenerator, k: usize) -> Self {
        Self {
            search,
            generator,
            k,
        }
    }

    /// Retrieve and generate for a known gene and phenotype.
    pub async fn recommend_for(
        &self,
        gene: Gene,
        drug: &str,
        phenotype: &str,
    ) -> Result<ClinicalRecommendation> {
        let drug = normalize_drug(drug);
        let query = cpic_query(&drug, gene, phenotype);
        let hits = self.search.search(gene, &drug, &query, self.k).await?;
        tracing::debug!("{} context chunks for {gene}/{drug}", hits.len());
        Ok(self.generator.generate(gene, &drug, phenotype, &hits).await)
    }

    /// Recommendation for one drug against a profile, with placeholders for
    /// unmapped drugs and missing phenotypes.
    pub async fn recommend(
        &self,
        drug: &str,
        profile: &PatientProfile,
    ) -> Result<ClinicalRecommendation> {
        let Some(gene) = gene_for_drug(drug) else {
            tracing::info!("No CPIC mapping for drug {drug:?}");
            return Ok(ClinicalRecommendation::no_mapping());
        };
        let Some(phenotype) = profile.phenotype(gene) else {
            tracing::info!("Patient profile has no {gene} phenotype (drug {drug:?})");
            return Ok(ClinicalRecommendation::phenotype_missing(gene));
        };
        self.recommend_for(gene, drug, phenotype).await
    }

    /// Enrich every `drug_analysis` record in place. Other fields, at the top
    /// level and inside each record, pass through unchanged.
    pub async fn enrich(&self, mut patient: Value) -> Result<Value> {
        let profile = PatientProfile::from_payload(&patient);

        let Some(records) = patient
            .get_mut(DRUG_ANALYSIS_KEY)
            .and_then(Value::as_array_mut)
        else {
            return Ok(patient);
        };

        for record in records.iter_mut() {
            if !record.is_object() {
                let mut wrapped = Map::new();
                wrapped.insert("drug".to_string(), Value::String(value_as_text(record)));
                *record = Value::Object(wrapped);
            }

            let drug = record.get("drug").map(value_as_text).unwrap_or_default();
            let recommendation = self.recommend(&drug, &profile).await?;

            if let Some(obj) = record.as_object_mut() {
                obj.insert(
                    RECOMMENDATION_KEY.to_string(),
                    serde_json::to_value(recommendation)?,
                );
            }
        }

        Ok(patient)
    }
}

/// Strings as-is; anything else in its JSON form.
fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

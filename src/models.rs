use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::guidelines::Gene;

/// A filtered, drug-tagged span of guideline text ready for embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub gene: Gene,
    /// Uppercase drug keyword detected in the text.
    pub drug: String,
    /// Source PDF filename.
    pub source: String,
    pub text: String,
}

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone, Serialize)]
pub struct ChunkHit {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Structured dosing guidance extracted from retrieved CPIC context.
///
/// Every field is independently nullable: `None` means the context did not
/// say, not that something failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecommendation {
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub alternative_drugs: Vec<String>,
    #[serde(default)]
    pub dosing_guidance: Option<String>,
    #[serde(default)]
    pub monitoring: Option<String>,
    #[serde(default)]
    pub cpic_classification: Option<String>,
}

pub const GENERATION_ERROR_MESSAGE: &str = "Error generating CPIC recommendation";
pub const NO_MAPPING_MESSAGE: &str = "No CPIC guideline mapping found for this drug.";

impl ClinicalRecommendation {
    /// Placeholder carrying only a message.
    pub fn placeholder(message: impl Into<String>) -> Self {
        Self {
            recommendation: Some(message.into()),
            ..Default::default()
        }
    }

    /// Returned whenever the LLM reply cannot be turned into a recommendation.
    pub fn generation_error() -> Self {
        Self::placeholder(GENERATION_ERROR_MESSAGE)
    }

    pub fn no_mapping() -> Self {
        Self::placeholder(NO_MAPPING_MESSAGE)
    }

    pub fn phenotype_missing(gene: Gene) -> Self {
        Self::placeholder(format!("Phenotype not found for gene {gene}."))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One gene/phenotype pair of a patient profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenePhenotype {
    pub gene: String,
    pub phenotype: String,
}

/// Single gene/drug analysis request
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub gene: String,
    pub drug: String,
    pub phenotype: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub result: ClinicalRecommendation,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Collection statistics
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub collection: String,
    pub total_chunks: usize,
    /// Keyed by "GENE/DRUG"
    pub by_gene_drug: std::collections::BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_always_serializes_five_fields() {
        let json = serde_json::to_value(ClinicalRecommendation::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 5);
        for key in [
            "recommendation",
            "alternative_drugs",
            "dosing_guidance",
            "monitoring",
            "cpic_classification",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj["alternative_drugs"], serde_json::json!([]));
        assert!(obj["monitoring"].is_null());
    }

    #[test]
    fn test_recommendation_null_alternatives_become_empty() {
        let rec: ClinicalRecommendation = serde_json::from_str(
            r#"{"recommendation": "Avoid codeine", "alternative_drugs": null}"#,
        )
        .unwrap();
        assert!(rec.alternative_drugs.is_empty());
        assert_eq!(rec.recommendation.as_deref(), Some("Avoid codeine"));
        assert_eq!(rec.dosing_guidance, None);
    }

    #[test]
    fn test_phenotype_missing_names_gene() {
        let rec = ClinicalRecommendation::phenotype_missing(Gene::Dpyd);
        assert_eq!(
            rec.recommendation.as_deref(),
            Some("Phenotype not found for gene DPYD.")
        );
        assert!(rec.alternative_drugs.is_empty());
    }
}

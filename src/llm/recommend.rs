use std::sync::Arc;

use super::ChatModel;
use crate::guidelines::Gene;
use crate::models::{ChunkHit, ClinicalRecommendation};

/// Result of interpreting an LLM reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(ClinicalRecommendation),
    /// The reply was unusable; carries why, for logging.
    Fallback { reason: String },
}

impl ParseOutcome {
    pub fn into_recommendation(self) -> ClinicalRecommendation {
        match self {
            ParseOutcome::Parsed(rec) => rec,
            ParseOutcome::Fallback { .. } => ClinicalRecommendation::generation_error(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ParseOutcome::Fallback { .. })
    }
}

/// Turns retrieved guideline chunks into a [`ClinicalRecommendation`] with
/// one LLM call.
#[derive(Clone)]
pub struct RecommendationGenerator {
    llm: Arc<dyn ChatModel>,
}

impl RecommendationGenerator {
    pub fn new(llm: Arc<dyn ChatModel>) -> Self {
        Self { llm }
    }

    /// Never fails: transport errors and unusable replies both yield the
    /// generation-error placeholder.
    pub async fn generate(
        &self,
        gene: Gene,
        drug: &str,
        phenotype: &str,
        chunks: &[ChunkHit],
    ) -> ClinicalRecommendation {
        let prompt = build_prompt(gene, drug, phenotype, chunks);

        let reply = match self.llm.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("LLM call failed for {gene}/{drug}: {e:#}");
                return ClinicalRecommendation::generation_error();
            }
        };

        let outcome = parse_recommendation(&reply);
        if let ParseOutcome::Fallback { reason } = &outcome {
            tracing::warn!("Unparseable recommendation for {gene}/{drug}: {reason}");
        }
        outcome.into_recommendation()
    }
}

const OUTPUT_SCHEMA: &str = r#"{
  "recommendation": string or null,
  "alternative_drugs": [string],
  "dosing_guidance": string or null,
  "monitoring": string or null,
  "cpic_classification": string or null
}"#;

/// Build the grounding prompt. Chunk texts appear in retrieval order,
/// separated by blank lines.
pub fn build_prompt(gene: Gene, drug: &str, phenotype: &str, chunks: &[ChunkHit]) -> String {
    let context = chunks
        .iter()
        .map(|h| h.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a clinical pharmacogenomics assistant.\n\n\
         Use ONLY the CPIC guideline context below. Do NOT use outside knowledge.\n\
         If a field is not supported by the context, set it to null \
         (or an empty list for alternative_drugs).\n\n\
         Gene: {gene}\n\
         Drug: {drug}\n\
         Patient Phenotype: {phenotype}\n\n\
         CPIC Context:\n\
         {context}\n\n\
         Respond with ONLY a JSON object matching this schema. \
         No markdown, no code fences, no explanation.\n\
         {OUTPUT_SCHEMA}"
    )
}

/// Parse an LLM reply into a recommendation, or say why it could not be.
pub fn parse_recommendation(reply: &str) -> ParseOutcome {
    let body = strip_code_fence(reply);

    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            return ParseOutcome::Fallback {
                reason: format!("invalid JSON: {e}"),
            }
        }
    };

    if !value.is_object() {
        return ParseOutcome::Fallback {
            reason: "reply is not a JSON object".to_string(),
        };
    }

    match serde_json::from_value::<ClinicalRecommendation>(value) {
        Ok(rec) => ParseOutcome::Parsed(rec),
        Err(e) => ParseOutcome::Fallback {
            reason: format!("unexpected shape: {e}"),
        },
    }
}

/// Remove a leading ```json / ``` fence and a trailing ``` if present.
fn strip_code_fence(reply: &str) -> &str {
    let mut s = reply.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

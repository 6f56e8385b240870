use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Map, Value};

use crate::backend::VcfUpload;
use crate::pipeline::{DRUG_ANALYSIS_KEY, RECOMMENDATION_KEY};
use crate::state::AppState;

/// POST /full_analyze - VCF upload → external analysis → enrichment.
///
/// Multipart fields: `vcf` (file) and `drugs` (comma-separated). Returns a
/// map from each drug name to its recommendation, without `monitoring`.
pub async fn full_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Map<String, Value>>, (StatusCode, String)> {
    let mut vcf: Option<VcfUpload> = None;
    let mut drugs_field = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "vcf" => {
                let file_name = field.file_name().unwrap_or("upload.vcf").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Failed to read VCF upload: {e}"))
                })?;
                vcf = Some(VcfUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            "drugs" => {
                drugs_field = field.text().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Failed to read drugs field: {e}"))
                })?;
            }
            _ => {}
        }
    }

    let vcf = vcf.ok_or((StatusCode::BAD_REQUEST, "A VCF file is required".to_string()))?;
    let drugs = parse_drug_list(&drugs_field);
    if drugs.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "At least one drug is required".to_string(),
        ));
    }

    let analysis = state
        .backend
        .analyze(vcf, &drugs.join(","))
        .await
        .map_err(|e| {
            tracing::error!("Analysis backend call failed: {e}");
            (StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    let patient = with_drug_analysis(analysis, &drugs).ok_or_else(|| {
        (
            StatusCode::BAD_GATEWAY,
            "External API returned a non-object payload".to_string(),
        )
    })?;

    let enriched = state.pipeline.enrich(patient).await.map_err(|e| {
        tracing::error!("Enrichment after VCF analysis failed: {e:#}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Retrieval error: {e}"),
        )
    })?;

    Ok(Json(recommendations_by_drug(&enriched)))
}

/// Split a comma-separated drug list, dropping blanks.
pub fn parse_drug_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ensure the backend payload has a `drug_analysis` list, synthesizing one
/// from the requested drugs when it is missing. `None` for non-objects.
fn with_drug_analysis(analysis: Value, drugs: &[String]) -> Option<Value> {
    let Value::Object(mut fields) = analysis else {
        return None;
    };
    let has_list = fields.get(DRUG_ANALYSIS_KEY).is_some_and(Value::is_array);
    if !has_list {
        let records = drugs.iter().map(|d| json!({ "drug": d })).collect();
        fields.insert(DRUG_ANALYSIS_KEY.to_string(), Value::Array(records));
    }
    Some(Value::Object(fields))
}

/// `{drug: recommendation}` over the enriched records, `monitoring` removed.
pub fn recommendations_by_drug(enriched: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    let Some(records) = enriched.get(DRUG_ANALYSIS_KEY).and_then(Value::as_array) else {
        return out;
    };

    for record in records {
        let Some(drug) = record.get("drug").and_then(Value::as_str) else {
            continue;
        };
        let mut recommendation = record.get(RECOMMENDATION_KEY).cloned().unwrap_or(Value::Null);
        strip_monitoring(&mut recommendation);
        out.insert(drug.to_string(), recommendation);
    }
    out
}

fn strip_monitoring(recommendation: &mut Value) {
    if let Some(obj) = recommendation.as_object_mut() {
        obj.remove("monitoring");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drug_list() {
        assert_eq!(
            parse_drug_list(" codeine, Warfarin ,,"),
            vec!["codeine".to_string(), "Warfarin".to_string()]
        );
        assert!(parse_drug_list(" , ").is_empty());
    }

    #[test]
    fn test_missing_drug_analysis_is_synthesized() {
        let drugs = vec!["codeine".to_string(), "warfarin".to_string()];
        let out = with_drug_analysis(json!({"patient_id": "P1"}), &drugs).unwrap();
        assert_eq!(
            out["drug_analysis"],
            json!([{"drug": "codeine"}, {"drug": "warfarin"}])
        );
        assert_eq!(out["patient_id"], "P1");

        let existing = json!({"drug_analysis": [{"drug": "CODEINE", "risk": "high"}]});
        assert_eq!(with_drug_analysis(existing.clone(), &drugs), Some(existing));

        assert_eq!(with_drug_analysis(json!([1, 2]), &drugs), None);
    }

    #[test]
    fn test_recommendations_by_drug_drops_monitoring() {
        let enriched = json!({
            "drug_analysis": [
                {
                    "drug": "Codeine",
                    "clinical_recommendation": {
                        "recommendation": "Avoid codeine",
                        "alternative_drugs": [],
                        "dosing_guidance": null,
                        "monitoring": "Respiratory depression",
                        "cpic_classification": "Strong"
                    }
                }
            ]
        });
        let out = recommendations_by_drug(&enriched);
        assert_eq!(out.len(), 1);
        let rec = out["Codeine"].as_object().unwrap();
        assert_eq!(rec.len(), 4);
        assert!(!rec.contains_key("monitoring"));
        assert_eq!(rec["recommendation"], "Avoid codeine");
    }
}

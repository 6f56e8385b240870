//! Keyword heuristics deciding which chunks are worth embedding.

use crate::guidelines::{Gene, DOSING_KEYWORDS, REFERENCE_INDICATORS};

/// Why a chunk was kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep { drug: &'static str },
    Reference,
    /// No drug keyword for the document's gene
    General,
    NoDosingSignal,
}

/// Apply the filters in order: reference section, drug detection, dosing signal.
pub fn classify(gene: Gene, text: &str) -> Verdict {
    if is_reference_chunk(text) {
        return Verdict::Reference;
    }
    let Some(drug) = detect_drug(gene, text) else {
        return Verdict::General;
    };
    if !has_dosing_signal(text) {
        return Verdict::NoDosingSignal;
    }
    Verdict::Keep { drug }
}

pub fn is_reference_chunk(text: &str) -> bool {
    let lower = text.to_lowercase();
    REFERENCE_INDICATORS.iter().any(|k| lower.contains(k))
}

/// First drug of `gene`'s list mentioned in the text.
pub fn detect_drug(gene: Gene, text: &str) -> Option<&'static str> {
    let upper = text.to_uppercase();
    gene.drugs().find(|d| upper.contains(d))
}

pub fn has_dosing_signal(text: &str) -> bool {
    let lower = text.to_lowercase();
    DOSING_KEYWORDS.iter().any(|k| lower.contains(k))
}

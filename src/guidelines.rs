//! Static CPIC vocabulary shared by ingestion and enrichment.
//!
//! Both the ingestion filter (drug keyword detection) and the enrichment
//! pipeline (drug → gene lookup) read [`DRUG_GENE_TABLE`], so a drug is
//! retrievable exactly when it can be enriched.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bump when any table in this module changes.
pub const TABLES_VERSION: &str = "2024.1";

/// Pharmacogenes covered by the guideline corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gene {
    #[serde(rename = "CYP2C9")]
    Cyp2c9,
    #[serde(rename = "CYP2C19")]
    Cyp2c19,
    #[serde(rename = "CYP2D6")]
    Cyp2d6,
    #[serde(rename = "SLCO1B1")]
    Slco1b1,
    #[serde(rename = "TPMT")]
    Tpmt,
    #[serde(rename = "DPYD")]
    Dpyd,
}

impl Gene {
    pub const ALL: [Gene; 6] = [
        Gene::Cyp2c9,
        Gene::Cyp2c19,
        Gene::Cyp2d6,
        Gene::Slco1b1,
        Gene::Tpmt,
        Gene::Dpyd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gene::Cyp2c9 => "CYP2C9",
            Gene::Cyp2c19 => "CYP2C19",
            Gene::Cyp2d6 => "CYP2D6",
            Gene::Slco1b1 => "SLCO1B1",
            Gene::Tpmt => "TPMT",
            Gene::Dpyd => "DPYD",
        }
    }

    /// Case-insensitive exact match against the gene set.
    pub fn parse(name: &str) -> Option<Gene> {
        let upper = name.trim().to_uppercase();
        Gene::ALL.into_iter().find(|g| g.as_str() == upper)
    }

    /// Drug keywords for this gene, in detection priority order.
    pub fn drugs(&self) -> impl Iterator<Item = &'static str> + '_ {
        DRUG_GENE_TABLE
            .iter()
            .filter(move |(_, g)| g == self)
            .map(|(d, _)| *d)
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drug → gene mapping. Drug names are uppercase.
pub const DRUG_GENE_TABLE: &[(&str, Gene)] = &[
    ("WARFARIN", Gene::Cyp2c9),
    ("CLOPIDOGREL", Gene::Cyp2c19),
    ("CODEINE", Gene::Cyp2d6),
    ("SIMVASTATIN", Gene::Slco1b1),
    ("AZATHIOPRINE", Gene::Tpmt),
    ("MERCAPTOPURINE", Gene::Tpmt),
    ("THIOGUANINE", Gene::Tpmt),
    ("FLUOROURACIL", Gene::Dpyd),
    ("CAPECITABINE", Gene::Dpyd),
];

/// Chunks containing any of these (lowercase) are reference-section noise.
pub const REFERENCE_INDICATORS: &[&str] =
    &["references", "et al.", "doi:", "pmid", "acknowledgments"];

/// A chunk needs at least one of these (lowercase) to count as dosing content.
pub const DOSING_KEYWORDS: &[&str] = &[
    "dose",
    "dosing",
    "initiate",
    "recommendation",
    "starting",
    "maintenance",
    "adjust",
    "reduce",
    "avoid",
    "metabolizer",
];

/// Uppercase and trim a caller-supplied drug name.
pub fn normalize_drug(drug: &str) -> String {
    drug.trim().to_uppercase()
}

/// Look up the gene governing a drug. Input is normalized first.
pub fn gene_for_drug(drug: &str) -> Option<Gene> {
    let drug = normalize_drug(drug);
    DRUG_GENE_TABLE
        .iter()
        .find(|(d, _)| *d == drug)
        .map(|(_, g)| *g)
}

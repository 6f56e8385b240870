use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::guidelines::Gene;
use crate::models::{ChunkHit, DocumentChunk};

/// A stored vector entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorEntry {
    #[serde(flatten)]
    chunk: DocumentChunk,
    embedding: Vec<f32>,
}

/// On-disk layout of a collection
#[derive(Debug, Default, Serialize, Deserialize)]
struct CollectionFile {
    name: String,
    tables_version: String,
    entries: Vec<VectorEntry>,
}

/// Named in-memory vector collection with disk persistence and
/// cosine similarity search restricted by gene/drug metadata.
pub struct VectorStore {
    name: String,
    entries: RwLock<Vec<VectorEntry>>,
    persist_path: PathBuf,
}

impl VectorStore {
    pub fn open_or_create(vector_dir: &Path, collection: &str) -> Result<Self> {
        std::fs::create_dir_all(vector_dir)?;
        let persist_path = vector_dir.join(format!("{collection}.json"));

        let entries = if persist_path.exists() {
            let data = std::fs::read_to_string(&persist_path)
                .context("Failed to read vector collection")?;
            let file: CollectionFile = serde_json::from_str(&data)
                .with_context(|| format!("Corrupt vector collection at {}", persist_path.display()))?;
            if file.tables_version != crate::guidelines::TABLES_VERSION {
                tracing::warn!(
                    "Collection {collection} was built with guideline tables {} (current {})",
                    file.tables_version,
                    crate::guidelines::TABLES_VERSION
                );
            }
            file.entries
        } else {
            Vec::new()
        };

        tracing::info!("Opened collection {collection} with {} chunks", entries.len());

        Ok(Self {
            name: collection.to_string(),
            entries: RwLock::new(entries),
            persist_path,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append chunks with their embeddings. `embeddings` must be parallel with `chunks`.
    pub fn add_chunks(&self, chunks: Vec<DocumentChunk>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != embeddings.len() {
            anyhow::bail!(
                "Got {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            );
        }

        let mut entries = self.entries.write();
        entries.extend(
            chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| VectorEntry { chunk, embedding }),
        );

        self.persist(&entries)
    }

    /// Drop every entry. Used before a full re-ingest.
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write();
        entries.clear();
        self.persist(&entries)
    }

    // Atomic write via temp file + rename
    fn persist(&self, entries: &[VectorEntry]) -> Result<()> {
        let file = CollectionFileRef {
            name: &self.name,
            tables_version: crate::guidelines::TABLES_VERSION,
            entries,
        };
        let data = serde_json::to_string(&file)?;
        let tmp_path = self.persist_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)?;
        std::fs::rename(&tmp_path, &self.persist_path)?;
        Ok(())
    }

    /// Top-`k` chunks by cosine similarity whose metadata matches both
    /// `gene` and `drug`. Never falls back to a looser filter.
    pub fn search(&self, query_embedding: &[f32], gene: Gene, drug: &str, k: usize) -> Vec<ChunkHit> {
        let drug = crate::guidelines::normalize_drug(drug);
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &VectorEntry)> = entries
            .iter()
            .filter(|e| e.chunk.gene == gene && e.chunk.drug == drug)
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .collect();

        // Stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(score, e)| ChunkHit {
                chunk: e.chunk.clone(),
                score,
            })
            .collect()
    }

    pub fn count(&self) -> usize {
        self.entries.read().len()
    }

    /// Counts grouped by "GENE/DRUG".
    pub fn counts_by_gene_drug(&self) -> BTreeMap<String, usize> {
        let entries = self.entries.read();
        let mut counts = BTreeMap::new();
        for e in entries.iter() {
            *counts
                .entry(format!("{}/{}", e.chunk.gene, e.chunk.drug))
                .or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Serialize)]
struct CollectionFileRef<'a> {
    name: &'a str,
    tables_version: &'a str,
    entries: &'a [VectorEntry],
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

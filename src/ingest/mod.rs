//! Offline ingestion: guideline PDFs → filtered, drug-tagged chunks → vector store.
//!
//! Each PDF is named after its gene (`cyp2d6.pdf`, `TPMT.pdf`, ...). Files
//! whose stem is not a known gene are skipped. Only chunks that name one of
//! the gene's drugs and carry a dosing keyword are kept; reference sections
//! are dropped outright.

pub mod filter;
pub mod pdf;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::chunking::{chunk_pages, Page};
use crate::config::ChunkingConfig;
use crate::guidelines::Gene;
use crate::llm::{EmbedTask, Embedder};
use crate::models::DocumentChunk;
use crate::search::vector::VectorStore;
use filter::Verdict;

/// Counters from one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub skipped_documents: Vec<String>,
    pub chunks_before: usize,
    pub chunks_after: usize,
    pub dropped_reference: usize,
    pub dropped_general: usize,
    pub dropped_no_dosing: usize,
}

impl IngestReport {
    fn absorb(&mut self, other: IngestReport) {
        self.documents += other.documents;
        self.skipped_documents.extend(other.skipped_documents);
        self.chunks_before += other.chunks_before;
        self.chunks_after += other.chunks_after;
        self.dropped_reference += other.dropped_reference;
        self.dropped_general += other.dropped_general;
        self.dropped_no_dosing += other.dropped_no_dosing;
    }
}

/// Gene named by a PDF file stem, case-insensitively. Non-PDF files yield `None`.
pub fn gene_from_filename(path: &Path) -> Option<Gene> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return None;
    }
    path.file_stem().and_then(|s| s.to_str()).and_then(Gene::parse)
}

/// PDFs directly inside `docs_dir` (not recursive), sorted by name.
/// Returns the gene-named ones plus the names of PDFs that were skipped.
pub fn discover_documents(docs_dir: &Path) -> Result<(Vec<(PathBuf, Gene)>, Vec<String>)> {
    let mut found = Vec::new();
    let mut skipped = Vec::new();

    for entry in walkdir::WalkDir::new(docs_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to list {}", docs_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            continue;
        }
        match gene_from_filename(path) {
            Some(gene) => found.push((path.to_path_buf(), gene)),
            None => {
                tracing::info!("Skipping {}: file name is not a known gene", path.display());
                skipped.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
    }

    Ok((found, skipped))
}

/// Chunk and filter one document's pages. Pure: no I/O.
pub fn prepare_chunks(
    gene: Gene,
    source: &str,
    pages: &[Page],
    chunking: ChunkingConfig,
) -> (Vec<DocumentChunk>, IngestReport) {
    let mut report = IngestReport {
        documents: 1,
        ..Default::default()
    };
    let mut kept = Vec::new();

    for chunk in chunk_pages(pages, chunking) {
        report.chunks_before += 1;
        match filter::classify(gene, &chunk.content) {
            Verdict::Reference => report.dropped_reference += 1,
            Verdict::General => report.dropped_general += 1,
            Verdict::NoDosingSignal => report.dropped_no_dosing += 1,
            Verdict::Keep { drug } => kept.push(DocumentChunk {
                id: Uuid::new_v4(),
                gene,
                drug: drug.to_string(),
                source: source.to_string(),
                text: chunk.content,
            }),
        }
    }

    report.chunks_after = kept.len();
    (kept, report)
}

/// Embed chunks and append them to the store.
pub async fn store_chunks(
    store: &VectorStore,
    embedder: &dyn Embedder,
    chunks: Vec<DocumentChunk>,
) -> Result<()> {
    if chunks.is_empty() {
        return Ok(());
    }
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder
        .embed(&texts, EmbedTask::Document)
        .await
        .context("Embedding guideline chunks failed")?;
    store.add_chunks(chunks, embeddings)
}

/// Ingest every gene-named PDF in `docs_dir`.
pub async fn ingest_directory(
    docs_dir: &Path,
    store: &VectorStore,
    embedder: &dyn Embedder,
    chunking: ChunkingConfig,
) -> Result<IngestReport> {
    let (documents, skipped) = discover_documents(docs_dir)?;
    tracing::info!("Found {} guideline PDFs in {}", documents.len(), docs_dir.display());

    let mut report = IngestReport {
        skipped_documents: skipped,
        ..Default::default()
    };

    for (path, gene) in documents {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let pdf_path = path.clone();
        let pages = tokio::task::spawn_blocking(move || pdf::extract_pages(&pdf_path)).await??;

        let (chunks, doc_report) = prepare_chunks(gene, &source, &pages, chunking);
        tracing::info!(
            "{source} ({gene}): {} pages, {} chunks, {} kept",
            pages.len(),
            doc_report.chunks_before,
            doc_report.chunks_after
        );

        store_chunks(store, embedder, chunks).await?;
        report.absorb(doc_report);
    }

    tracing::info!(
        "Ingestion complete: {} chunks before filtering, {} stored",
        report.chunks_before,
        report.chunks_after
    );
    Ok(report)
}

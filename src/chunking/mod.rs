//! Guideline text chunking.

pub mod recursive;

use crate::config::ChunkingConfig;
use recursive::RecursiveSplitter;

/// One page of extracted PDF text.
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    pub text: String,
}

/// A chunk of page text before tagging.
#[derive(Debug, Clone)]
pub struct ChunkOutput {
    pub content: String,
    pub page: u32,
}

/// Split every page into overlapping windows. Chunks never span pages.
pub fn chunk_pages(pages: &[Page], config: ChunkingConfig) -> Vec<ChunkOutput> {
    let splitter = RecursiveSplitter::new(config.chunk_size, config.chunk_overlap);

    pages
        .iter()
        .flat_map(|page| {
            splitter
                .split(&page.text)
                .into_iter()
                .map(move |content| ChunkOutput {
                    content,
                    page: page.number,
                })
        })
        .collect()
}

use anyhow::{Context, Result};
use std::path::Path;

use crate::chunking::Page;

/// Extract text page by page. Pages whose content stream cannot be decoded
/// are skipped with a warning rather than failing the whole document.
pub fn extract_pages(pdf_path: &Path) -> Result<Vec<Page>> {
    let doc = lopdf::Document::load(pdf_path)
        .with_context(|| format!("Failed to load PDF {}", pdf_path.display()))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys().copied() {
        match doc.extract_text(&[page_number]) {
            Ok(text) => pages.push(Page {
                number: page_number,
                text: normalize_whitespace(&text),
            }),
            Err(e) => {
                tracing::warn!(
                    "Skipping page {page_number} of {}: {e}",
                    pdf_path.display()
                );
            }
        }
    }

    Ok(pages)
}

/// Collapse runs of spaces/tabs inside lines and drop trailing blanks,
/// keeping line and paragraph breaks for the splitter.
fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace_keeps_breaks() {
        let raw = "Dosing   recommendations\t for\n\nCYP2D6   poor metabolizers  \n";
        assert_eq!(
            normalize_whitespace(raw),
            "Dosing recommendations for\n\nCYP2D6 poor metabolizers"
        );
    }

    #[test]
    fn test_missing_file_errors() {
        let err = extract_pages(Path::new("/nonexistent/cyp2d6.pdf")).unwrap_err();
        assert!(err.to_string().contains("Failed to load PDF"));
    }
}

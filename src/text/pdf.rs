//! PDF text extraction
//!
//! Produces one [`PageText`] per page that has extractable text, numbered from 1
//! in document order. Pages without text are skipped.

use crate::error::{AssistantError, Result};
use crate::text::PageText;
use std::path::Path;

/// PDF processor backed by `pdf-extract`
pub struct PdfProcessor;

impl PdfProcessor {
    /// Extract page-tagged text from a PDF file
    pub fn extract_pages<P: AsRef<Path>>(path: P) -> Result<Vec<PageText>> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(AssistantError::Pdf(format!(
                "PDF file not found: {}",
                path.display()
            )));
        }

        let raw_pages = pdf_extract::extract_text_by_pages(path).map_err(|e| {
            AssistantError::Pdf(format!("Failed to extract text from {}: {}", path.display(), e))
        })?;

        let pages = Self::collect_pages(raw_pages);
        log::info!(
            "Extracted {} pages with text from {}",
            pages.len(),
            path.display()
        );
        Ok(pages)
    }

    /// Extract page-tagged text from PDF bytes
    pub fn extract_pages_from_mem(bytes: &[u8]) -> Result<Vec<PageText>> {
        let raw_pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| AssistantError::Pdf(format!("Failed to extract text: {}", e)))?;
        Ok(Self::collect_pages(raw_pages))
    }

    fn collect_pages(raw_pages: Vec<String>) -> Vec<PageText> {
        raw_pages
            .into_iter()
            .enumerate()
            .filter_map(|(i, text)| {
                let text = text.trim();
                if text.is_empty() {
                    None
                } else {
                    Some(PageText::new(i as u32 + 1, text))
                }
            })
            .collect()
    }
}

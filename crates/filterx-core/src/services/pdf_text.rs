use async_trait::async_trait;

use crate::error::ExtractionError;

/// Turns a document's raw bytes into plain text
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, ExtractionError>;
}

/// Join per-page text the way it is fed to the model: blank line between pages, trimmed
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut full_text = String::new();
    for page in pages {
        full_text.push_str(page.as_ref().trim());
        full_text.push_str("\n\n");
    }
    full_text.trim().to_string()
}

#[cfg(feature = "pdf")]
pub use pdfium::PdfiumTextExtractor;

#[cfg(feature = "pdf")]
mod pdfium {
    use async_trait::async_trait;
    use pdfium_render::prelude::*;
    use std::path::PathBuf;
    use tracing::{debug, warn};

    use super::{TextExtractor, join_pages};
    use crate::error::ExtractionError;

    impl From<PdfiumError> for ExtractionError {
        fn from(err: PdfiumError) -> Self {
            ExtractionError::Document(format!("{:?}", err))
        }
    }

    /// Directory holding the pdfium shared library, if one was provided at build time
    fn pdfium_lib_path() -> Option<PathBuf> {
        let lib_dir = option_env!("PDFIUM_LIB_DIR")?;
        Some(PathBuf::from(lib_dir))
    }

    fn bind_pdfium() -> Result<Pdfium, ExtractionError> {
        let bindings = match pdfium_lib_path() {
            Some(lib_dir) => {
                let lib_path = lib_dir.join(Pdfium::pdfium_platform_library_name());
                Pdfium::bind_to_library(&lib_path).or_else(|_| Pdfium::bind_to_system_library())
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ExtractionError::Binding(format!("Failed to bind pdfium: {:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }

    fn extract_blocking(bytes: &[u8]) -> Result<String, ExtractionError> {
        let pdfium = bind_pdfium()?;
        let document = pdfium.load_pdf_from_byte_slice(bytes, None)?;

        let mut pages = Vec::new();
        for page in document.pages().iter() {
            pages.push(page.text()?.all());
        }

        debug!(page_count = pages.len(), "Extracted PDF text");
        Ok(join_pages(pages))
    }

    /// Extracts page text with pdfium on a blocking worker thread
    #[derive(Debug, Default, Clone, Copy)]
    pub struct PdfiumTextExtractor;

    #[async_trait]
    impl TextExtractor for PdfiumTextExtractor {
        async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, ExtractionError> {
            tokio::task::spawn_blocking(move || extract_blocking(&bytes))
                .await
                .map_err(|e| {
                    warn!(error = %e, "PDF extraction worker failed");
                    ExtractionError::Document(e.to_string())
                })?
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_pages_separates_with_blank_line() {
        assert_eq!(join_pages(["first page", "second page"]), "first page\n\nsecond page");
    }

    #[test]
    fn test_join_pages_trims_and_skips_trailing_whitespace() {
        assert_eq!(join_pages(["  intro  ", "", "end\n"]), "intro\n\n\n\nend");
        assert_eq!(join_pages(Vec::<String>::new()), "");
    }
}

//! Document ingestion: pulls plain text out of an uploaded PDF so the
//! summarization stage has something to prompt with.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("document not found: {0}")]
    Missing(PathBuf),
    #[error("unsupported document type: {0}")]
    Unsupported(PathBuf),
    #[error("failed to extract text from PDF: {0}")]
    Extraction(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Extension check for documents already written into a run workspace.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Extract the full plain text of the PDF at `path`.
///
/// The extracted text is returned verbatim; a document that yields only
/// whitespace is treated as an extraction failure since every later stage
/// would be prompting on nothing.
pub fn extract_text(path: &Path) -> Result<String, IngestError> {
    if !path.exists() {
        return Err(IngestError::Missing(path.to_path_buf()));
    }
    if !is_pdf(path) {
        return Err(IngestError::Unsupported(path.to_path_buf()));
    }

    let text =
        pdf_extract::extract_text(path).map_err(|e| IngestError::Extraction(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(IngestError::Extraction(
            "document contains no extractable text".to_string(),
        ));
    }

    Ok(text)
}

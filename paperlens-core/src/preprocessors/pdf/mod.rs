//! PDF Preprocessor
//!
//! Main preprocessor for PDF documents. Uses pluggable backends to extract
//! positioned text, metadata and embedded images into PreprocessorOutput.

pub mod backends;

use crate::preprocessors::traits::Preprocessor;
use crate::types::*;
use anyhow::Result;
use std::path::Path;

pub use backends::{LopdfBackend, PdfBackend};

/// Backend enum for runtime backend selection
pub enum PdfBackendImpl {
    Lopdf(LopdfBackend),
}

impl PdfBackend for PdfBackendImpl {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<PreprocessorOutput> {
        match self {
            PdfBackendImpl::Lopdf(backend) => backend.extract(pdf_bytes),
        }
    }

    fn name(&self) -> &str {
        match self {
            PdfBackendImpl::Lopdf(backend) => backend.name(),
        }
    }
}

/// PDF Preprocessor with pluggable backend
pub struct PdfPreprocessor {
    backend: PdfBackendImpl,
}

impl Default for PdfPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfPreprocessor {
    /// Create PdfPreprocessor with the in-process lopdf backend.
    pub fn new() -> Self {
        Self {
            backend: PdfBackendImpl::Lopdf(LopdfBackend::new()),
        }
    }

    /// Get the backend name for logging
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}

impl Preprocessor for PdfPreprocessor {
    fn process(&self, pdf_bytes: &[u8]) -> Result<PreprocessorOutput> {
        self.backend.extract(pdf_bytes)
    }

    fn name(&self) -> &str {
        "PdfPreprocessor"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        if let Some(extension) = path.extension() {
            matches!(
                extension.to_str().unwrap_or("").to_lowercase().as_str(),
                "pdf"
            )
        } else {
            false
        }
    }
}

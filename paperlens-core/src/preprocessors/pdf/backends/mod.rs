//! PDF extraction backends.
//!
//! A backend owns the raw-format walk: PDF bytes in, PreprocessorOutput out.
//! The rest of the pipeline never touches PDF objects directly.

mod lopdf_backend;

use crate::types::PreprocessorOutput;
use anyhow::Result;

pub use lopdf_backend::LopdfBackend;

/// Backend trait: raw PDF bytes → structured pages + metadata + figures.
pub trait PdfBackend {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<PreprocessorOutput>;

    /// Backend name for debugging/logging
    fn name(&self) -> &str;
}

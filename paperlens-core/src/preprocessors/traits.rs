// Preprocessor abstraction for document processing
//
// This module defines the boundary between document preprocessing (PDF ->
// positioned text) and semantic processing (sections, terminology, scores).
// The preprocessor abstraction allows for different PDF parsing backends
// while maintaining a consistent interface.

use crate::types::*;
use anyhow::Result;
use std::path::Path;

/// Preprocessor trait - converts raw document bytes to structured pages
///
/// This is the key abstraction boundary in paperlens. Preprocessors handle:
/// - Document format parsing (PDF content streams)
/// - Text extraction with positioning and font information
/// - Document-level metadata and embedded image enumeration
///
/// Everything after this point works with StructuredPage values and is
/// backend-agnostic.
pub trait Preprocessor {
    /// Full extraction pass: pages, metadata and figures in one walk.
    ///
    /// This is the main entry point for document processing.
    fn process(&self, pdf_bytes: &[u8]) -> Result<PreprocessorOutput>;

    /// Positioned text only: pages of blocks, blocks of lines, lines of
    /// aggregated span fonts/sizes.
    fn extract_structured_text(&self, pdf_bytes: &[u8]) -> Result<Vec<StructuredPage>> {
        Ok(self.process(pdf_bytes)?.pages)
    }

    /// Document metadata with empty-string fallbacks for absent fields.
    fn extract_metadata(&self, pdf_bytes: &[u8]) -> Result<DocumentMetadata> {
        Ok(self.process(pdf_bytes)?.metadata)
    }

    /// Best-effort embedded raster image enumeration.
    fn extract_figures(&self, pdf_bytes: &[u8]) -> Result<Vec<PotentialFigure>> {
        Ok(self.process(pdf_bytes)?.potential_figures)
    }

    /// Convenience method: Process from file path
    fn process_file(&self, input: &Path) -> Result<PreprocessorOutput> {
        let pdf_bytes = std::fs::read(input)?;
        self.process(&pdf_bytes)
    }

    /// Get preprocessor name for debugging/logging
    fn name(&self) -> &str;

    /// Check if preprocessor supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}

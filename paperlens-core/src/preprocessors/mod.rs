//! Document Preprocessors
//!
//! This module provides the preprocessing layer for converting raw PDF bytes
//! into the unified PreprocessorOutput that feeds the structural extractor.
//!
//! ## Architecture
//!
//! ```text
//! PDF bytes
//!     ↓
//! [PdfBackend (lopdf content-stream walk)]
//!     ↓
//! PreprocessorOutput (pages / metadata / figures)
//!     ↓
//! [Structural extractor]
//!     ↓
//! DocumentStructure
//! ```

pub mod pdf;
pub mod traits;

// Re-export main types
pub use pdf::{LopdfBackend, PdfBackend, PdfBackendImpl, PdfPreprocessor};
pub use traits::Preprocessor;

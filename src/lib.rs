//! tanzif-pdf - Margin cleaner for scanned Arabic book PDFs
//!
//! Cleans scanner artifacts (stains, stray lines, edge smudges) from the
//! margins of scanned book pages while protecting legitimate margin elements
//! such as page numbers and running headers, distinguishing them with OCR.
//! Surviving content can optionally be re-centered on the page.
//!
//! # Pipeline
//!
//! 1. Render each page to a raster at the configured DPI.
//! 2. Detect the content bounding region ([`detect::ContentBoundsDetector`]).
//! 3. Partition the page into margin strips and find protected text inside
//!    them ([`detect::MarginTextDetector`]).
//! 4. Whiten the residual margin rectangles and optionally re-center the
//!    content ([`pipeline::PdfPipeline`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tanzif_pdf::{NoProgress, PdfPipeline, PipelineConfig};
//!
//! let pipeline = PdfPipeline::new(PipelineConfig::default());
//! let report = pipeline
//!     .process(Path::new("kitab.pdf"), Path::new("out/kitab.pdf"), &NoProgress)
//!     .unwrap();
//! println!("{}/{} pages edited", report.edited_count(), report.total_pages);
//! ```

pub mod config;
pub mod detect;
pub mod geometry;
pub mod ocr;
pub mod pipeline;
pub mod progress;
pub mod raster;
pub mod render;

// Re-export the public surface used by the CLI and embedders.
pub use config::{CliOverrides, Config, ConfigError};
pub use detect::{
    BoundsOptions, ContentBoundsDetector, MarginReconciler, MarginRegion, MarginSide,
    MarginTextDetector, MarginTextOptions, Reconciliation, TextBlockClassifier,
};
pub use geometry::{PixelRect, PointRect};
pub use ocr::{
    NullRecognizer, OcrConfig, OcrError, TesseractRecognizer, TextRecognizer,
};
pub use pipeline::{
    NoProgress, PdfPipeline, PipelineConfig, PipelineError, ProcessReport, ProgressCallback,
    DEFAULT_DPI,
};
pub use progress::{OutputMode, ProcessingStage, ProgressTracker};
pub use render::{DocumentRenderer, PopplerDocument, RenderError};

/// Process exit codes used by the CLI.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INPUT_NOT_FOUND: i32 = 2;
}

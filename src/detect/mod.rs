//! Page analysis: content bounds, text-block classification, margin text
//! protection, and margin reconciliation.
//!
//! # Example
//!
//! ```rust,no_run
//! use tanzif_pdf::detect::{BoundsOptions, MarginReconciler, MarginTextOptions};
//! use tanzif_pdf::ocr::NullRecognizer;
//!
//! let gray = image::open("page.png").unwrap().to_luma8();
//! let recognizer = NullRecognizer;
//! let reconciler = MarginReconciler::new(
//!     BoundsOptions::default(),
//!     MarginTextOptions::default(),
//!     &recognizer,
//! );
//!
//! let result = reconciler.reconcile(&gray);
//! println!(
//!     "{} rects to clean, content at {:?}",
//!     result.clean_rects.len(),
//!     result.content_bounds
//! );
//! ```

mod content_bounds;
mod margin_text;
mod reconcile;
mod text_block;
mod types;

pub use content_bounds::ContentBoundsDetector;
pub use margin_text::MarginTextDetector;
pub use reconcile::{margin_regions, MarginReconciler};
pub use text_block::TextBlockClassifier;
pub use types::{
    BoundsOptions, BoundsOptionsBuilder, MarginRegion, MarginSide, MarginTextOptions,
    MarginTextOptionsBuilder, Reconciliation, INK_THRESHOLD, MARGIN_TOLERANCE,
};

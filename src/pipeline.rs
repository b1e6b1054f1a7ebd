//! End-to-end page cleaning pipeline.
//!
//! Drives one document through render → analyze → edit: each page is
//! rasterized, reconciled into cleanable margin rectangles, converted to page
//! space, and whitened; optionally the surviving content is re-centered on
//! the page. Page analysis runs on a bounded rayon pool; document mutation
//! is applied strictly in page order afterwards.

use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::detect::{BoundsOptions, MarginReconciler, MarginTextOptions, INK_THRESHOLD};
use crate::geometry::{PixelRect, PointRect};
use crate::ocr::{self, OcrConfig, TextRecognizer};
use crate::raster;
use crate::render::{DocumentRenderer, PopplerDocument, RenderError};

/// Default processing resolution.
pub const DEFAULT_DPI: u32 = 200;

/// Centering shifts below this many points are ignored.
const CENTER_SKIP_POINTS: f64 = 5.0;

/// Channel value above which a pixel counts as near-white when flattening
/// re-inserted content.
const NEAR_WHITE: u8 = 200;

// ============================================================
// Error Types
// ============================================================

/// Pipeline error types
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("thread pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// ============================================================
// Configuration
// ============================================================

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Processing resolution in DPI.
    pub dpi: u32,
    /// Re-center surviving content on edited pages.
    pub center_content: bool,
    /// Worker threads for page analysis; `None` uses the core count.
    pub threads: Option<usize>,
    /// Analyze only the first N pages (debug aid); the rest pass through.
    pub max_pages: Option<usize>,
    /// OCR engine configuration.
    pub ocr: OcrConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            center_content: true,
            threads: None,
            max_pages: None,
            ocr: OcrConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Serialize for reporting (dry runs, logs).
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

// ============================================================
// Progress callback
// ============================================================

/// Progress notifications from the pipeline.
///
/// Page progress is a monotonic count of completed pages.
pub trait ProgressCallback: Sync {
    fn on_step_start(&self, _step: &str) {}
    fn on_step_progress(&self, _current: usize, _total: usize) {}
    fn on_step_complete(&self, _step: &str, _message: &str) {}
}

/// Callback that ignores all notifications.
pub struct NoProgress;

impl ProgressCallback for NoProgress {}

// ============================================================
// Plans and reports
// ============================================================

/// Recenter instruction for one page.
struct RecenterPlan {
    /// Full page rectangle (white-filled before re-inserting content).
    page_rect: PointRect,
    /// Where the content lands, centered.
    target: PointRect,
    /// Flattened content crop from the analysis raster.
    image: RgbImage,
}

/// Planned edits for one page. Empty plans leave the page untouched.
struct PageEditPlan {
    page: usize,
    fills: Vec<PointRect>,
    recenter: Option<RecenterPlan>,
}

impl PageEditPlan {
    fn untouched(page: usize) -> Self {
        Self {
            page,
            fills: Vec::new(),
            recenter: None,
        }
    }

    fn is_edit(&self) -> bool {
        !self.fills.is_empty()
    }
}

/// Summary of one processed document.
#[derive(Debug, Clone)]
pub struct ProcessReport {
    pub total_pages: usize,
    /// 1-based numbers of edited pages, ascending.
    pub edited_pages: Vec<usize>,
    pub elapsed_seconds: f64,
    pub output_size: u64,
}

impl ProcessReport {
    pub fn edited_count(&self) -> usize {
        self.edited_pages.len()
    }
}

// ============================================================
// Pipeline
// ============================================================

/// The document cleaning pipeline. This is the entry point both the CLI and
/// any other front end call; nothing else is required of them.
pub struct PdfPipeline {
    config: PipelineConfig,
}

impl PdfPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Clean `input` and write the result to `output`.
    pub fn process(
        &self,
        input: &Path,
        output: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<ProcessReport> {
        let mut renderer = PopplerDocument::open(input)?;
        let recognizer = ocr::recognizer_from_config(&self.config.ocr);
        info!(
            input = %input.display(),
            pages = renderer.page_count(),
            engine = recognizer.describe(),
            "processing document"
        );
        self.process_document(&mut renderer, recognizer.as_ref(), output, progress)
    }

    /// Pipeline body, generic over the renderer for testability.
    pub fn process_document<R>(
        &self,
        renderer: &mut R,
        recognizer: &dyn TextRecognizer,
        output: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<ProcessReport>
    where
        R: DocumentRenderer + Sync,
    {
        let start = Instant::now();
        let total_pages = renderer.page_count();
        let analyzed = match self.config.max_pages {
            Some(max) => total_pages.min(max),
            None => total_pages,
        };

        // Phase 1: analyze pages in parallel. The renderer is only shared
        // immutably here; rasterization spawns independent processes.
        progress.on_step_start("Analyzing pages");
        let plans = self.plan_pages(&*renderer, recognizer, analyzed, progress)?;

        // Phase 2: apply edits strictly in page order.
        progress.on_step_start("Applying edits");
        let mut edited_pages = Vec::new();
        for plan in &plans {
            if !plan.is_edit() {
                continue;
            }
            edited_pages.push(plan.page + 1);

            for rect in &plan.fills {
                renderer.apply_white_fill(plan.page, rect)?;
            }
            if let Some(recenter) = &plan.recenter {
                renderer.apply_white_fill(plan.page, &recenter.page_rect)?;
                renderer.insert_image(plan.page, &recenter.target, &recenter.image)?;
            }
        }

        progress.on_step_start("Saving");
        renderer.save(output)?;
        let output_size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);

        let report = ProcessReport {
            total_pages,
            edited_pages,
            elapsed_seconds: start.elapsed().as_secs_f64(),
            output_size,
        };
        progress.on_step_complete(
            "Done",
            &format!("{}/{} pages edited", report.edited_count(), total_pages),
        );
        Ok(report)
    }

    fn plan_pages<R>(
        &self,
        renderer: &R,
        recognizer: &dyn TextRecognizer,
        analyzed: usize,
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<PageEditPlan>>
    where
        R: DocumentRenderer + Sync,
    {
        let threads = self.config.threads.unwrap_or_else(num_cpus::get).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| PipelineError::ThreadPool(e.to_string()))?;

        let completed = AtomicUsize::new(0);
        pool.install(|| {
            (0..analyzed)
                .into_par_iter()
                .map(|page| {
                    let raster = renderer.render(page, self.config.dpi)?;
                    let page_size = renderer.page_size(page)?;
                    let plan = self.plan_page(page, &raster, page_size, recognizer);

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.on_step_progress(done, analyzed);
                    Ok(plan)
                })
                .collect::<Result<Vec<_>>>()
        })
    }

    /// Plan the edits for one page from its raster.
    fn plan_page(
        &self,
        page: usize,
        raster: &RgbImage,
        page_size: (f64, f64),
        recognizer: &dyn TextRecognizer,
    ) -> PageEditPlan {
        let gray = image::imageops::grayscale(raster);
        let reconciler = MarginReconciler::new(
            BoundsOptions::default(),
            MarginTextOptions::default(),
            recognizer,
        );

        let result = reconciler.reconcile(&gray);
        if !result.modified {
            return PageEditPlan::untouched(page);
        }

        // Whitening an already-white strip is a no-op; skipping it keeps a
        // second run over cleaned output from reporting edits.
        let fills_px: Vec<PixelRect> = result
            .clean_rects
            .into_iter()
            .filter(|rect| raster::ink_count_in(&gray, rect, INK_THRESHOLD) > 0)
            .collect();
        if fills_px.is_empty() {
            return PageEditPlan::untouched(page);
        }

        debug!(
            page,
            fills = fills_px.len(),
            protected = result.protected_boxes.len(),
            "page edits planned"
        );

        let fills = fills_px
            .iter()
            .map(|rect| rect.to_points(self.config.dpi))
            .collect();

        let recenter = if self.config.center_content {
            self.plan_recenter(raster, &result.content_bounds, page_size)
        } else {
            None
        };

        PageEditPlan {
            page,
            fills,
            recenter,
        }
    }

    /// Compute the recenter instruction, if the content is far enough off
    /// the page center to bother.
    fn plan_recenter(
        &self,
        raster: &RgbImage,
        bounds: &PixelRect,
        (page_width, page_height): (f64, f64),
    ) -> Option<RecenterPlan> {
        if bounds.is_empty() {
            return None;
        }

        let content = bounds.to_points(self.config.dpi);
        let (content_cx, content_cy) = content.center();
        let shift_x = page_width / 2.0 - content_cx;
        let shift_y = page_height / 2.0 - content_cy;
        if shift_x.abs() < CENTER_SKIP_POINTS && shift_y.abs() < CENTER_SKIP_POINTS {
            return None;
        }

        // Crop the content from the pre-edit raster and flatten scanner gray
        // so the re-inserted image does not carry a visible background tile.
        let mut crop =
            image::imageops::crop_imm(raster, bounds.x0, bounds.y0, bounds.width(), bounds.height())
                .to_image();
        for pixel in crop.pixels_mut() {
            if pixel.0.iter().all(|&c| c > NEAR_WHITE) {
                pixel.0 = [255, 255, 255];
            }
        }

        let new_x0 = (page_width - content.width()) / 2.0;
        let new_y0 = (page_height - content.height()) / 2.0;
        let target = PointRect::new(
            new_x0,
            new_y0,
            new_x0 + content.width(),
            new_y0 + content.height(),
        );

        Some(RecenterPlan {
            page_rect: PointRect::new(0.0, 0.0, page_width, page_height),
            target,
            image: crop,
        })
    }
}

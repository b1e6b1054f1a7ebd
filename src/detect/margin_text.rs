//! Margin text detection.
//!
//! Finds sub-rectangles inside a margin strip that contain genuine script or
//! digits (page numbers, running headers, catchwords) so the reconciler can
//! exempt them from whitening. Only ever runs outside the content bounds,
//! where a false positive costs a little leftover smudge and a false negative
//! costs a page number.

use image::GrayImage;
use tracing::debug;

use super::text_block::TextBlockClassifier;
use super::types::{MarginRegion, MarginTextOptions, JOIN_KERNEL, MIN_MARGIN_DIMENSION, SPECKLE_KERNEL};
use crate::geometry::PixelRect;
use crate::ocr::{contains_script, TextRecognizer};
use crate::raster;

/// OCR-assisted detector for legitimate text inside margins.
///
/// Configuration and the recognizer handle are explicit constructor inputs;
/// there is no process-global engine state.
pub struct MarginTextDetector<'a> {
    options: MarginTextOptions,
    recognizer: &'a dyn TextRecognizer,
}

impl<'a> MarginTextDetector<'a> {
    pub fn new(options: MarginTextOptions, recognizer: &'a dyn TextRecognizer) -> Self {
        Self { options, recognizer }
    }

    /// Detect protected boxes inside one margin region.
    ///
    /// Returned rectangles are padded, clamped to the margin, and expressed
    /// in full-image coordinates.
    pub fn detect(&self, gray: &GrayImage, margin: &MarginRegion) -> Vec<PixelRect> {
        let rect = margin.rect;
        if rect.width() < MIN_MARGIN_DIMENSION || rect.height() < MIN_MARGIN_DIMENSION {
            return Vec::new();
        }

        let crop = raster::crop(gray, &rect);
        let local_bounds = PixelRect::of_image(crop.width(), crop.height());

        let binary = raster::binarize_inverted(&crop, self.options.ink_threshold);
        let despeckled = raster::open_rect(&binary, SPECKLE_KERNEL, SPECKLE_KERNEL);
        let joined = raster::dilate_rect(&despeckled, JOIN_KERNEL.0, JOIN_KERNEL.1);

        let mut protected = Vec::new();

        for component in raster::component_boxes(&joined) {
            let candidate = component.rect;

            if !self.passes_geometry(&candidate, &crop) {
                continue;
            }

            if self.is_confirmed_text(&crop, &candidate, margin) {
                let boxed = candidate
                    .padded(self.options.padding, &local_bounds)
                    .translated(rect.x0, rect.y0);
                protected.push(boxed);
            }
        }

        protected
    }

    /// Geometric and density filters applied before any recognition.
    fn passes_geometry(&self, candidate: &PixelRect, crop: &GrayImage) -> bool {
        let area = candidate.area();
        if area < self.options.area_range.0 || area > self.options.area_range.1 {
            return false;
        }
        if candidate.width() < self.options.min_dimension
            || candidate.height() < self.options.min_dimension
        {
            return false;
        }
        let aspect = candidate.aspect_ratio();
        if aspect < self.options.aspect_range.0 || aspect > self.options.aspect_range.1 {
            return false;
        }

        // Density is measured against the raw binarization, not the joined
        // mask, so the stroke structure of text stays in the mid-range while
        // solid stains saturate.
        let ink = raster::ink_count_in(crop, candidate, self.options.ink_threshold);
        let density = ink as f64 / area as f64;
        density >= self.options.density_range.0 && density <= self.options.density_range.1
    }

    /// Confirm a candidate structurally or through the recognizer.
    ///
    /// Any recognizer failure (absent engine, error, timeout) confirms the
    /// candidate: protecting a stain is recoverable, deleting a page number
    /// is not.
    fn is_confirmed_text(&self, crop: &GrayImage, candidate: &PixelRect, margin: &MarginRegion) -> bool {
        let roi = raster::crop(crop, candidate);

        if TextBlockClassifier::is_text_block(&roi, 1) {
            return true;
        }

        match self.recognizer.recognize(&roi) {
            Ok(text) => {
                let confirmed = contains_script(&text);
                debug!(
                    side = margin.side.name(),
                    text = text.trim(),
                    confirmed,
                    "margin candidate recognized"
                );
                confirmed
            }
            Err(err) => {
                debug!(
                    side = margin.side.name(),
                    error = %err,
                    "recognizer failed, protecting candidate"
                );
                true
            }
        }
    }
}

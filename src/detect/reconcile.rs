//! Margin reconciliation.
//!
//! Combines content-bounds detection with margin-text protection to produce
//! the final set of rectangles that are safe to whiten: everything outside
//! the content bounds, minus any box confirmed to hold script or digits.

use image::GrayImage;
use tracing::debug;

use super::content_bounds::ContentBoundsDetector;
use super::margin_text::MarginTextDetector;
use super::types::{
    BoundsOptions, MarginRegion, MarginSide, MarginTextOptions, Reconciliation, MARGIN_TOLERANCE,
};
use crate::geometry::{self, PixelRect};
use crate::ocr::TextRecognizer;

/// Computes cleanable margin rectangles for one page raster.
pub struct MarginReconciler<'a> {
    bounds_options: BoundsOptions,
    text_detector: MarginTextDetector<'a>,
}

impl<'a> MarginReconciler<'a> {
    pub fn new(
        bounds_options: BoundsOptions,
        text_options: MarginTextOptions,
        recognizer: &'a dyn TextRecognizer,
    ) -> Self {
        Self {
            bounds_options,
            text_detector: MarginTextDetector::new(text_options, recognizer),
        }
    }

    /// Reconcile one page image.
    ///
    /// Returns the content bounds, the clean rectangles (disjoint from every
    /// protected box), and whether any cleanable area exists. A page whose
    /// content spans the full image yields no rectangles and
    /// `modified = false`.
    pub fn reconcile(&self, gray: &GrayImage) -> Reconciliation {
        let (width, height) = gray.dimensions();
        let content_bounds = ContentBoundsDetector::detect(gray, &self.bounds_options);

        let mut clean_rects = Vec::new();
        let mut protected_boxes = Vec::new();

        for margin in margin_regions(&content_bounds, width, height) {
            let protected = self.text_detector.detect(gray, &margin);
            debug!(
                side = margin.side.name(),
                protected = protected.len(),
                "margin analyzed"
            );

            if protected.is_empty() {
                clean_rects.push(margin.rect);
            } else {
                clean_rects.extend(geometry::subtract(margin.rect, &protected));
                protected_boxes.extend(protected);
            }
        }

        let modified = !clean_rects.is_empty();
        Reconciliation {
            content_bounds,
            clean_rects,
            protected_boxes,
            modified,
        }
    }
}

/// Partition the image area outside `bounds` into up to four margin strips.
///
/// Top and bottom strips span the full image width; left and right strips
/// cover the band between them. A strip is only emitted when its extent
/// exceeds the 5 px tolerance.
pub fn margin_regions(bounds: &PixelRect, width: u32, height: u32) -> Vec<MarginRegion> {
    let mut regions = Vec::with_capacity(4);

    if bounds.y0 > MARGIN_TOLERANCE {
        regions.push(MarginRegion {
            side: MarginSide::Top,
            rect: PixelRect::new(0, 0, width, bounds.y0),
        });
    }
    if bounds.y1 + MARGIN_TOLERANCE < height {
        regions.push(MarginRegion {
            side: MarginSide::Bottom,
            rect: PixelRect::new(0, bounds.y1, width, height),
        });
    }
    if bounds.x0 > MARGIN_TOLERANCE {
        regions.push(MarginRegion {
            side: MarginSide::Left,
            rect: PixelRect::new(0, bounds.y0, bounds.x0, bounds.y1),
        });
    }
    if bounds.x1 + MARGIN_TOLERANCE < width {
        regions.push(MarginRegion {
            side: MarginSide::Right,
            rect: PixelRect::new(bounds.x1, bounds.y0, width, bounds.y1),
        });
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::NullRecognizer;
    use image::Luma;

    #[test]
    fn test_margin_regions_all_four() {
        let bounds = PixelRect::new(50, 80, 550, 720);
        let regions = margin_regions(&bounds, 600, 800);

        assert_eq!(regions.len(), 4);
        assert_eq!(regions[0].side, MarginSide::Top);
        assert_eq!(regions[0].rect, PixelRect::new(0, 0, 600, 80));
        assert_eq!(regions[1].side, MarginSide::Bottom);
        assert_eq!(regions[1].rect, PixelRect::new(0, 720, 600, 800));
        assert_eq!(regions[2].side, MarginSide::Left);
        assert_eq!(regions[2].rect, PixelRect::new(0, 80, 50, 720));
        assert_eq!(regions[3].side, MarginSide::Right);
        assert_eq!(regions[3].rect, PixelRect::new(550, 80, 600, 720));
    }

    #[test]
    fn test_margin_regions_within_tolerance_omitted() {
        // 5 px or less on each side: nothing to clean.
        let bounds = PixelRect::new(5, 3, 596, 797);
        assert!(margin_regions(&bounds, 600, 800).is_empty());
    }

    #[test]
    fn test_margin_regions_partial() {
        let bounds = PixelRect::new(0, 100, 600, 800);
        let regions = margin_regions(&bounds, 600, 800);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].side, MarginSide::Top);
    }

    #[test]
    fn test_margin_regions_do_not_overlap() {
        let bounds = PixelRect::new(40, 60, 560, 740);
        let regions = margin_regions(&bounds, 600, 800);
        for (i, a) in regions.iter().enumerate() {
            assert!(!a.rect.overlaps(&bounds));
            for b in &regions[i + 1..] {
                assert!(!a.rect.overlaps(&b.rect), "{:?} vs {:?}", a, b);
            }
        }
    }

    /// Page with a line-textured content block.
    fn synthetic_page(width: u32, height: u32, block: PixelRect) -> GrayImage {
        let mut img = GrayImage::from_pixel(width, height, Luma([255]));
        let mut y = block.y0;
        while y + 6 <= block.y1 {
            for ly in y..y + 6 {
                for x in block.x0..block.x1 {
                    img.put_pixel(x, ly, Luma([30]));
                }
            }
            y += 14;
        }
        img
    }

    #[test]
    fn test_reconcile_blank_page_uses_fallback() {
        let img = GrayImage::from_pixel(400, 600, Luma([255]));
        let recognizer = NullRecognizer;
        let reconciler = MarginReconciler::new(
            BoundsOptions::default(),
            MarginTextOptions::default(),
            &recognizer,
        );

        let result = reconciler.reconcile(&img);
        assert_eq!(result.content_bounds, PixelRect::new(50, 50, 350, 550));
        assert_eq!(result.clean_rects.len(), 4);
        assert!(result.protected_boxes.is_empty());
        assert!(result.modified);
    }

    #[test]
    fn test_reconcile_full_bleed_content_untouched() {
        // Content texture across the whole page: no margin beyond tolerance.
        let img = synthetic_page(400, 600, PixelRect::new(0, 0, 400, 600));
        let recognizer = NullRecognizer;
        let reconciler = MarginReconciler::new(
            BoundsOptions::default(),
            MarginTextOptions::default(),
            &recognizer,
        );

        let result = reconciler.reconcile(&img);
        assert!(result.clean_rects.is_empty());
        assert!(!result.modified);
    }

    #[test]
    fn test_reconcile_clean_rects_stay_in_margins() {
        let img = synthetic_page(600, 800, PixelRect::new(100, 120, 500, 680));
        let recognizer = NullRecognizer;
        let reconciler = MarginReconciler::new(
            BoundsOptions::default(),
            MarginTextOptions::default(),
            &recognizer,
        );

        let result = reconciler.reconcile(&img);
        assert!(result.modified);
        for rect in &result.clean_rects {
            assert!(
                !rect.overlaps(&result.content_bounds),
                "{:?} overlaps content {:?}",
                rect,
                result.content_bounds
            );
        }
    }
}

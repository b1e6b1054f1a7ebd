//! Content bounding-box detection.
//!
//! Finds the rectangle enclosing all genuine page content (paragraphs of
//! text, figures) while excluding scattered scanner noise. The closing and
//! dilation cascade merges genuine content into a few large blobs; isolated
//! stains stay below the area and aspect filters, and whatever survives
//! geometry is still required to show horizontal line structure.

use image::GrayImage;
use tracing::debug;

use super::text_block::TextBlockClassifier;
use super::types::{BoundsOptions, BLOCK_KERNEL_HEIGHT, EXPAND_KERNEL, LINE_KERNEL_WIDTH};
use crate::geometry::PixelRect;
use crate::raster;

/// Detects the bounding rectangle of genuine page content.
pub struct ContentBoundsDetector;

impl ContentBoundsDetector {
    /// Detect content bounds. Never fails; the result is always inside the
    /// image extents.
    ///
    /// When no candidate survives filtering, a fixed fallback rectangle
    /// inset by `options.fallback_inset` on every side is returned.
    pub fn detect(gray: &GrayImage, options: &BoundsOptions) -> PixelRect {
        let (width, height) = gray.dimensions();
        let image_rect = PixelRect::of_image(width, height);

        let binary = raster::binarize_inverted(gray, options.ink_threshold);

        // Bridge ink into text lines, lines into blocks, blocks into regions.
        let lines = raster::close_rect(&binary, LINE_KERNEL_WIDTH, 1);
        let blocks = raster::close_rect(&lines, 1, BLOCK_KERNEL_HEIGHT);
        let regions = raster::dilate_rect(&blocks, EXPAND_KERNEL.0, EXPAND_KERNEL.1);

        let mut bounds: Option<PixelRect> = None;
        let mut candidates = 0usize;
        let mut accepted = 0usize;

        for component in raster::component_boxes(&regions) {
            candidates += 1;
            let rect = component.rect;

            if rect.area() < options.min_area {
                continue;
            }
            if rect.width() < options.min_width || rect.height() < options.min_height {
                continue;
            }
            let aspect = rect.aspect_ratio();
            if aspect < options.aspect_range.0 || aspect > options.aspect_range.1 {
                continue;
            }

            // Final disambiguation between an ink blob and a paragraph.
            let roi = raster::crop(gray, &rect);
            if !TextBlockClassifier::is_text_block(&roi, 1) {
                continue;
            }

            accepted += 1;
            bounds = Some(match bounds {
                Some(b) => b.union(&rect),
                None => rect,
            });
        }

        debug!(candidates, accepted, "content bounds candidates");

        match bounds {
            Some(b) => b.padded(options.padding, &image_rect),
            None => Self::fallback(width, height, options.fallback_inset),
        }
    }

    /// Fixed fallback bounds when no content is detected.
    ///
    /// For images at least twice the inset in each dimension this is the
    /// inset rectangle; smaller images yield a normalized (degenerate)
    /// rectangle rather than an inverted one.
    pub fn fallback(width: u32, height: u32, inset: u32) -> PixelRect {
        PixelRect::new(
            inset.min(width),
            inset.min(height),
            width.saturating_sub(inset),
            height.saturating_sub(inset),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// A page image with a block of horizontal-line texture at the given
    /// rectangle, simulating a paragraph of text.
    fn page_with_text_block(width: u32, height: u32, block: PixelRect) -> GrayImage {
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
    fn test_detect_within_image_bounds() {
        let block = PixelRect::new(100, 150, 500, 600);
        let img = page_with_text_block(640, 800, block);

        let bounds = ContentBoundsDetector::detect(&img, &BoundsOptions::default());
        assert!(PixelRect::of_image(640, 800).contains(&bounds));
    }

    #[test]
    fn test_detect_covers_text_block() {
        let block = PixelRect::new(100, 150, 500, 600);
        let img = page_with_text_block(640, 800, block);

        let bounds = ContentBoundsDetector::detect(&img, &BoundsOptions::default());
        // Line texture spans the block width; last line starts before y1.
        assert!(bounds.x0 <= block.x0);
        assert!(bounds.y0 <= block.y0);
        assert!(bounds.x1 >= block.x1);
        assert!(bounds.y1 + 14 >= block.y1);
    }

    #[test]
    fn test_blank_image_falls_back() {
        let img = GrayImage::from_pixel(400, 600, Luma([255]));
        let bounds = ContentBoundsDetector::detect(&img, &BoundsOptions::default());
        assert_eq!(bounds, PixelRect::new(50, 50, 350, 550));
    }

    #[test]
    fn test_small_stain_is_ignored() {
        let mut img = GrayImage::from_pixel(400, 600, Luma([255]));
        // A 12x12 stain: below the area filter once isolated.
        for y in 30..42 {
            for x in 30..42 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        let bounds = ContentBoundsDetector::detect(&img, &BoundsOptions::default());
        assert_eq!(bounds, PixelRect::new(50, 50, 350, 550));
    }

    #[test]
    fn test_thin_scan_line_is_ignored() {
        let mut img = GrayImage::from_pixel(600, 800, Luma([255]));
        // A 2 px vertical scanner streak along the page.
        for y in 0..800 {
            for x in 10..12 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        let bounds = ContentBoundsDetector::detect(&img, &BoundsOptions::default());
        assert_eq!(bounds, PixelRect::new(50, 50, 550, 750));
    }

    #[test]
    fn test_stain_next_to_text_not_included() {
        let block = PixelRect::new(200, 200, 500, 500);
        let mut img = page_with_text_block(640, 800, block);
        // Dense blob near the corner, far from the text block. It passes the
        // geometric filters only if it survives is_text_block, which a solid
        // blob of this size does not (single run, but width below 50 keeps
        // the classifier from even considering it).
        for y in 20..48 {
            for x in 20..48 {
                img.put_pixel(x, y, Luma([0]));
            }
        }

        let bounds = ContentBoundsDetector::detect(&img, &BoundsOptions::default());
        assert!(bounds.x0 >= 150, "stain pulled bounds to {:?}", bounds);
    }

    #[test]
    fn test_fallback_degenerate_on_tiny_image() {
        let rect = ContentBoundsDetector::fallback(80, 60, 50);
        // Normalized, not inverted.
        assert!(rect.x0 <= rect.x1 && rect.y0 <= rect.y1);
    }

    #[test]
    fn test_two_blocks_unioned() {
        let mut img = page_with_text_block(800, 1000, PixelRect::new(100, 100, 700, 300));
        let lower = page_with_text_block(800, 1000, PixelRect::new(100, 600, 700, 900));
        for (x, y, p) in lower.enumerate_pixels() {
            if p.0[0] < 200 {
                img.put_pixel(x, y, *p);
            }
        }

        let bounds = ContentBoundsDetector::detect(&img, &BoundsOptions::default());
        assert!(bounds.y0 <= 100);
        assert!(bounds.y1 >= 880);
    }
}

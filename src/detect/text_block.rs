//! Structural text-block classification.
//!
//! A cheap proxy for "contains ruled text lines" versus "contains a blob":
//! typeset text shows regular horizontal banding in its projection profile,
//! stains do not. Used by the bounds detector to disambiguate content from
//! large ink smudges, and by the margin detector as a structural shortcut
//! before consulting OCR.

use image::GrayImage;

use super::types::{INK_THRESHOLD, MIN_BLOCK_HEIGHT, MIN_BLOCK_WIDTH, TEXT_ROW_RATIO};
use crate::raster;

/// Classifies regions by their horizontal line structure.
pub struct TextBlockClassifier;

impl TextBlockClassifier {
    /// Whether a region exhibits the signature of typeset lines.
    ///
    /// Regions smaller than 50x20 are rejected outright, for all inputs.
    pub fn is_text_block(region: &GrayImage, min_lines: usize) -> bool {
        Self::count_text_lines(region) >= min_lines.max(1)
    }

    /// Count maximal runs of consecutive textual rows.
    ///
    /// A row is textual when its ink pixel count exceeds 10% of the region
    /// width. Returns 0 for trivially small regions.
    pub fn count_text_lines(region: &GrayImage) -> usize {
        let (width, height) = region.dimensions();
        if height < MIN_BLOCK_HEIGHT || width < MIN_BLOCK_WIDTH {
            return 0;
        }

        let binary = raster::binarize_inverted(region, INK_THRESHOLD);
        let row_threshold = f64::from(width) * TEXT_ROW_RATIO;

        let mut line_count = 0usize;
        let mut in_line = false;
        for y in 0..height {
            let ink: u32 = (0..width).filter(|&x| binary.get_pixel(x, y).0[0] > 0).count() as u32;
            let textual = f64::from(ink) > row_threshold;
            if textual && !in_line {
                line_count += 1;
                in_line = true;
            } else if !textual {
                in_line = false;
            }
        }

        line_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// White region with `lines` dark horizontal bands of the given height.
    fn lined_region(width: u32, height: u32, lines: u32, line_height: u32, gap: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(width, height, Luma([255]));
        let mut y = gap;
        for _ in 0..lines {
            for ly in y..(y + line_height).min(height) {
                for x in 5..width.saturating_sub(5) {
                    img.put_pixel(x, ly, Luma([30]));
                }
            }
            y += line_height + gap;
        }
        img
    }

    #[test]
    fn test_rejects_small_regions() {
        // Below the 50x20 floor, always false regardless of content.
        let tiny = GrayImage::from_pixel(49, 100, Luma([0]));
        assert!(!TextBlockClassifier::is_text_block(&tiny, 1));

        let short = GrayImage::from_pixel(100, 19, Luma([0]));
        assert!(!TextBlockClassifier::is_text_block(&short, 1));

        let empty = GrayImage::new(0, 0);
        assert!(!TextBlockClassifier::is_text_block(&empty, 1));
    }

    #[test]
    fn test_counts_separated_lines() {
        let region = lined_region(200, 100, 4, 8, 12);
        assert_eq!(TextBlockClassifier::count_text_lines(&region), 4);
        assert!(TextBlockClassifier::is_text_block(&region, 4));
        assert!(!TextBlockClassifier::is_text_block(&region, 5));
    }

    #[test]
    fn test_blank_region_is_not_text() {
        let blank = GrayImage::from_pixel(200, 100, Luma([255]));
        assert!(!TextBlockClassifier::is_text_block(&blank, 1));
    }

    #[test]
    fn test_solid_blob_counts_one_line() {
        // A solid blob is one uninterrupted run: passes min_lines=1 but
        // cannot fake a multi-line paragraph.
        let blob = GrayImage::from_pixel(200, 100, Luma([20]));
        assert_eq!(TextBlockClassifier::count_text_lines(&blob), 1);
        assert!(!TextBlockClassifier::is_text_block(&blob, 2));
    }

    #[test]
    fn test_sparse_rows_below_ratio_ignored() {
        // A single thin vertical scratch inks <10% of each row.
        let mut region = GrayImage::from_pixel(200, 100, Luma([255]));
        for y in 0..100 {
            for x in 95..100 {
                region.put_pixel(x, y, Luma([0]));
            }
        }
        assert_eq!(TextBlockClassifier::count_text_lines(&region), 0);
    }

    #[test]
    fn test_min_lines_zero_treated_as_one() {
        let blank = GrayImage::from_pixel(200, 100, Luma([255]));
        assert!(!TextBlockClassifier::is_text_block(&blank, 0));

        let region = lined_region(200, 100, 2, 8, 12);
        assert!(TextBlockClassifier::is_text_block(&region, 0));
    }
}

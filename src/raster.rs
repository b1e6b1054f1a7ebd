//! Low-level raster operations shared by the detection stages.
//!
//! All functions operate on inverted binary images: ink is white (255),
//! background is black (0). Morphology kernels are axis-aligned rectangles,
//! applied separably (a `w x h` kernel is one horizontal pass followed by one
//! vertical pass). Out-of-image pixels are neutral for both min and max, so
//! content touching the border is neither grown nor eaten by the border.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::HashMap;

use crate::geometry::PixelRect;

/// Binarize a grayscale image with ink inverted to white.
///
/// Pixels strictly darker than `threshold` become 255, everything else 0.
pub fn binarize_inverted(gray: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut binary = GrayImage::new(width, height);

    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = if pixel.0[0] < threshold { 255 } else { 0 };
        binary.put_pixel(x, y, Luma([value]));
    }

    binary
}

/// Count ink pixels (value 255) in a binary image.
pub fn ink_count(binary: &GrayImage) -> u64 {
    binary.pixels().filter(|p| p.0[0] > 0).count() as u64
}

/// Count pixels darker than `threshold` inside `rect` of a grayscale image.
///
/// `rect` is clamped to the image extents.
pub fn ink_count_in(gray: &GrayImage, rect: &PixelRect, threshold: u8) -> u64 {
    let (width, height) = gray.dimensions();
    let x1 = rect.x1.min(width);
    let y1 = rect.y1.min(height);
    let mut count = 0u64;

    for y in rect.y0.min(y1)..y1 {
        for x in rect.x0.min(x1)..x1 {
            if gray.get_pixel(x, y).0[0] < threshold {
                count += 1;
            }
        }
    }

    count
}

/// Crop a rectangle out of a grayscale image into an owned buffer.
pub fn crop(gray: &GrayImage, rect: &PixelRect) -> GrayImage {
    image::imageops::crop_imm(gray, rect.x0, rect.y0, rect.width(), rect.height()).to_image()
}

// ============================================================
// Rectangular morphology
// ============================================================

#[derive(Clone, Copy)]
enum Pass {
    Dilate,
    Erode,
}

/// One separable min/max pass along a single axis.
///
/// The kernel anchor matches OpenCV's rectangular structuring elements:
/// a kernel of length `k` spans `[-k/2, k-1-k/2]` around the anchor pixel.
fn morph_axis(src: &GrayImage, kernel: u32, horizontal: bool, pass: Pass) -> GrayImage {
    if kernel <= 1 {
        return src.clone();
    }

    let (width, height) = src.dimensions();
    let mut out = GrayImage::new(width, height);
    let reach_before = (kernel / 2) as i64;
    let reach_after = (kernel - 1 - kernel / 2) as i64;

    for y in 0..height {
        for x in 0..width {
            let (mut best_max, mut best_min) = (0u8, 255u8);
            let center = if horizontal { x as i64 } else { y as i64 };
            let limit = if horizontal { width } else { height } as i64;

            let lo = (center - reach_before).max(0);
            let hi = (center + reach_after).min(limit - 1);
            for i in lo..=hi {
                let v = if horizontal {
                    src.get_pixel(i as u32, y).0[0]
                } else {
                    src.get_pixel(x, i as u32).0[0]
                };
                best_max = best_max.max(v);
                best_min = best_min.min(v);
            }

            let value = match pass {
                Pass::Dilate => best_max,
                Pass::Erode => best_min,
            };
            out.put_pixel(x, y, Luma([value]));
        }
    }

    out
}

/// Dilate with a `kw x kh` rectangular kernel.
pub fn dilate_rect(binary: &GrayImage, kw: u32, kh: u32) -> GrayImage {
    let h = morph_axis(binary, kw, true, Pass::Dilate);
    morph_axis(&h, kh, false, Pass::Dilate)
}

/// Erode with a `kw x kh` rectangular kernel.
pub fn erode_rect(binary: &GrayImage, kw: u32, kh: u32) -> GrayImage {
    let h = morph_axis(binary, kw, true, Pass::Erode);
    morph_axis(&h, kh, false, Pass::Erode)
}

/// Morphological closing (dilate then erode) with a rectangular kernel.
///
/// Bridges gaps narrower than the kernel without growing overall extent.
pub fn close_rect(binary: &GrayImage, kw: u32, kh: u32) -> GrayImage {
    let dilated = dilate_rect(binary, kw, kh);
    erode_rect(&dilated, kw, kh)
}

/// Morphological opening (erode then dilate) with a rectangular kernel.
///
/// Removes ink specks smaller than the kernel.
pub fn open_rect(binary: &GrayImage, kw: u32, kh: u32) -> GrayImage {
    let eroded = erode_rect(binary, kw, kh);
    dilate_rect(&eroded, kw, kh)
}

// ============================================================
// Connected components
// ============================================================

/// Bounding box and ink mass of one connected component.
#[derive(Debug, Clone, Copy)]
pub struct ComponentBox {
    pub rect: PixelRect,
    pub pixel_count: u64,
}

impl ComponentBox {
    /// Ink pixels per bounding-box pixel, in `[0, 1]`.
    pub fn fill_ratio(&self) -> f64 {
        let area = self.rect.area();
        if area == 0 {
            0.0
        } else {
            self.pixel_count as f64 / area as f64
        }
    }
}

/// Extract bounding boxes of all 8-connected ink components.
pub fn component_boxes(binary: &GrayImage) -> Vec<ComponentBox> {
    let labels = connected_components(binary, Connectivity::Eight, Luma([0u8]));
    let mut boxes: HashMap<u32, ComponentBox> = HashMap::new();

    for (x, y, label) in labels.enumerate_pixels() {
        let id = label.0[0];
        if id == 0 {
            continue;
        }
        boxes
            .entry(id)
            .and_modify(|b| {
                b.rect = b.rect.union(&PixelRect::new(x, y, x + 1, y + 1));
                b.pixel_count += 1;
            })
            .or_insert(ComponentBox {
                rect: PixelRect::new(x, y, x + 1, y + 1),
                pixel_count: 1,
            });
    }

    boxes.into_values().collect()
}

//! Detection module core types and tuning options.

use crate::geometry::PixelRect;

// ============================================================
// Constants
// ============================================================

/// Luminance threshold for binarization: pixels darker than this are ink.
pub const INK_THRESHOLD: u8 = 200;

/// Horizontal closing kernel width: bridges ink within one text line.
pub const LINE_KERNEL_WIDTH: u32 = 30;

/// Vertical closing kernel height: merges adjacent lines into blocks.
pub const BLOCK_KERNEL_HEIGHT: u32 = 10;

/// Expansion kernel bridging adjacent paragraphs and figures.
pub const EXPAND_KERNEL: (u32, u32) = (15, 8);

/// Fraction of region width a row must cover in ink to count as textual.
pub const TEXT_ROW_RATIO: f64 = 0.1;

/// Regions shorter than this cannot be text blocks.
pub const MIN_BLOCK_HEIGHT: u32 = 20;

/// Regions narrower than this cannot be text blocks.
pub const MIN_BLOCK_WIDTH: u32 = 50;

/// Margins narrower than this are left alone.
pub const MARGIN_TOLERANCE: u32 = 5;

/// Margins smaller than this in either dimension are skipped entirely.
pub const MIN_MARGIN_DIMENSION: u32 = 10;

/// Speckle-removal opening kernel inside margins.
pub const SPECKLE_KERNEL: u32 = 2;

/// Dilation joining glyph strokes into word/number blobs.
pub const JOIN_KERNEL: (u32, u32) = (8, 4);

// ============================================================
// Content-bounds options
// ============================================================

/// Tuning for [`crate::detect::ContentBoundsDetector`].
#[derive(Debug, Clone)]
pub struct BoundsOptions {
    /// Binarization threshold (0-255).
    pub ink_threshold: u8,
    /// Minimum candidate area in px².
    pub min_area: u64,
    /// Minimum candidate width in px.
    pub min_width: u32,
    /// Minimum candidate height in px.
    pub min_height: u32,
    /// Accepted candidate aspect ratio (w/h) range.
    pub aspect_range: (f64, f64),
    /// Padding added around the united content box.
    pub padding: u32,
    /// Inset of the fallback rectangle when nothing is detected.
    pub fallback_inset: u32,
}

impl Default for BoundsOptions {
    fn default() -> Self {
        Self {
            ink_threshold: INK_THRESHOLD,
            min_area: 2000,
            min_width: 50,
            min_height: 20,
            aspect_range: (0.1, 30.0),
            padding: 8,
            fallback_inset: 50,
        }
    }
}

impl BoundsOptions {
    /// Create a new options builder.
    pub fn builder() -> BoundsOptionsBuilder {
        BoundsOptionsBuilder::default()
    }
}

/// Builder for [`BoundsOptions`].
#[derive(Debug, Default)]
pub struct BoundsOptionsBuilder {
    options: BoundsOptions,
}

impl BoundsOptionsBuilder {
    #[must_use]
    pub fn ink_threshold(mut self, threshold: u8) -> Self {
        self.options.ink_threshold = threshold;
        self
    }

    #[must_use]
    pub fn min_area(mut self, area: u64) -> Self {
        self.options.min_area = area;
        self
    }

    #[must_use]
    pub fn min_dimensions(mut self, width: u32, height: u32) -> Self {
        self.options.min_width = width;
        self.options.min_height = height;
        self
    }

    #[must_use]
    pub fn aspect_range(mut self, min: f64, max: f64) -> Self {
        self.options.aspect_range = (min.min(max), min.max(max));
        self
    }

    #[must_use]
    pub fn padding(mut self, padding: u32) -> Self {
        self.options.padding = padding;
        self
    }

    #[must_use]
    pub fn fallback_inset(mut self, inset: u32) -> Self {
        self.options.fallback_inset = inset;
        self
    }

    #[must_use]
    pub fn build(self) -> BoundsOptions {
        self.options
    }
}

// ============================================================
// Margin-text options
// ============================================================

/// Tuning for [`crate::detect::MarginTextDetector`].
///
/// Thresholds are biased toward false positives: wrongly protecting a stain
/// is cheaper than erasing a real page number.
#[derive(Debug, Clone)]
pub struct MarginTextOptions {
    /// Binarization threshold (0-255).
    pub ink_threshold: u8,
    /// Accepted candidate area range in px².
    pub area_range: (u64, u64),
    /// Minimum candidate width and height.
    pub min_dimension: u32,
    /// Accepted candidate aspect ratio (w/h) range.
    pub aspect_range: (f64, f64),
    /// Accepted ink density range inside the candidate box. Text sits in the
    /// middle; solid stains are denser, faint specks sparser.
    pub density_range: (f64, f64),
    /// Padding added around confirmed boxes.
    pub padding: u32,
}

impl Default for MarginTextOptions {
    fn default() -> Self {
        Self {
            ink_threshold: INK_THRESHOLD,
            area_range: (100, 50_000),
            min_dimension: 10,
            aspect_range: (0.05, 15.0),
            density_range: (0.03, 0.7),
            padding: 5,
        }
    }
}

impl MarginTextOptions {
    /// Create a new options builder.
    pub fn builder() -> MarginTextOptionsBuilder {
        MarginTextOptionsBuilder::default()
    }
}

/// Builder for [`MarginTextOptions`].
#[derive(Debug, Default)]
pub struct MarginTextOptionsBuilder {
    options: MarginTextOptions,
}

impl MarginTextOptionsBuilder {
    #[must_use]
    pub fn ink_threshold(mut self, threshold: u8) -> Self {
        self.options.ink_threshold = threshold;
        self
    }

    #[must_use]
    pub fn area_range(mut self, min: u64, max: u64) -> Self {
        self.options.area_range = (min.min(max), min.max(max));
        self
    }

    #[must_use]
    pub fn min_dimension(mut self, dim: u32) -> Self {
        self.options.min_dimension = dim;
        self
    }

    #[must_use]
    pub fn aspect_range(mut self, min: f64, max: f64) -> Self {
        self.options.aspect_range = (min.min(max), min.max(max));
        self
    }

    #[must_use]
    pub fn density_range(mut self, min: f64, max: f64) -> Self {
        self.options.density_range = (min.min(max).max(0.0), min.max(max).min(1.0));
        self
    }

    #[must_use]
    pub fn padding(mut self, padding: u32) -> Self {
        self.options.padding = padding;
        self
    }

    #[must_use]
    pub fn build(self) -> MarginTextOptions {
        self.options
    }
}

// ============================================================
// Margin regions
// ============================================================

/// Which page edge a margin strip belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl MarginSide {
    pub fn name(&self) -> &'static str {
        match self {
            MarginSide::Top => "top",
            MarginSide::Bottom => "bottom",
            MarginSide::Left => "left",
            MarginSide::Right => "right",
        }
    }
}

/// One margin strip outside the content bounds.
#[derive(Debug, Clone, Copy)]
pub struct MarginRegion {
    pub side: MarginSide,
    pub rect: PixelRect,
}

// ============================================================
// Reconciliation result
// ============================================================

/// Output of [`crate::detect::MarginReconciler::reconcile`].
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Content bounding box in image space.
    pub content_bounds: PixelRect,
    /// Margin area safe to whiten: disjoint from every protected box.
    pub clean_rects: Vec<PixelRect>,
    /// Boxes inside margins confirmed to contain script or digits.
    pub protected_boxes: Vec<PixelRect>,
    /// Whether any cleanable area was found.
    pub modified: bool,
}

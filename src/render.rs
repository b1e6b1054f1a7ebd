//! Document rendering and mutation.
//!
//! [`DocumentRenderer`] is the seam between page analysis and the PDF on
//! disk: rasterize a page at a DPI, paint opaque white rectangles, insert an
//! image, save. The DPI passed to [`DocumentRenderer::render`] defines the
//! pixel-to-point scale (`dpi / 72`) for every rectangle later applied to the
//! same page.
//!
//! [`PopplerDocument`] is the production implementation: `lopdf` owns the
//! document structure and rewriting, Poppler's `pdftoppm` does the
//! rasterization (located on `PATH` at open time, the same way the CLI
//! probes its other external tools).
//!
//! Rectangles arrive in top-left-origin page space; conversion into PDF's
//! bottom-left coordinate system happens here, against each page's MediaBox.

use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

use crate::geometry::PointRect;

/// JPEG quality for re-inserted content images.
const JPEG_QUALITY: u8 = 90;

// ============================================================
// Error Types
// ============================================================

/// Rendering and document mutation error types
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("not a usable PDF document: {0}")]
    InvalidDocument(String),

    #[error("pdftoppm not found on PATH (install poppler-utils)")]
    RasterizerUnavailable,

    #[error("page {page} out of range, document has {count} pages")]
    PageOutOfRange { page: usize, count: usize },

    #[error("failed to rasterize page {page}: {message}")]
    RasterizeFailed { page: usize, message: String },

    #[error("failed to save document: {0}")]
    SaveFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, RenderError>;

// ============================================================
// Renderer trait
// ============================================================

/// Rendering collaborator contract used by the pipeline.
pub trait DocumentRenderer {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Page size `(width, height)` in points.
    fn page_size(&self, page: usize) -> Result<(f64, f64)>;

    /// Rasterize a page (0-based) at the given DPI.
    fn render(&self, page: usize, dpi: u32) -> Result<RgbImage>;

    /// Paint an opaque white rectangle over the page.
    fn apply_white_fill(&mut self, page: usize, rect: &PointRect) -> Result<()>;

    /// Draw an image over the given page rectangle.
    fn insert_image(&mut self, page: usize, rect: &PointRect, img: &RgbImage) -> Result<()>;

    /// Write the document out.
    fn save(&mut self, path: &Path) -> Result<()>;
}

// ============================================================
// lopdf + pdftoppm implementation
// ============================================================

/// PDF document backed by `lopdf`, rasterized through `pdftoppm`.
pub struct PopplerDocument {
    source: PathBuf,
    doc: Document,
    pages: Vec<ObjectId>,
    pdftoppm: PathBuf,
    image_counter: usize,
}

impl PopplerDocument {
    /// Open a document and locate the rasterizer.
    ///
    /// Fails before any page work when the file is missing, unparseable, or
    /// `pdftoppm` is absent.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RenderError::InputNotFound(path.to_path_buf()));
        }
        let pdftoppm = which::which("pdftoppm").map_err(|_| RenderError::RasterizerUnavailable)?;
        let doc = Document::load(path).map_err(|e| RenderError::InvalidDocument(e.to_string()))?;

        Self::build(doc, path.to_path_buf(), pdftoppm)
    }

    fn build(doc: Document, source: PathBuf, pdftoppm: PathBuf) -> Result<Self> {
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(RenderError::InvalidDocument("document has no pages".into()));
        }

        Ok(Self {
            source,
            doc,
            pages,
            pdftoppm,
            image_counter: 0,
        })
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        self.pages
            .get(page)
            .copied()
            .ok_or(RenderError::PageOutOfRange {
                page,
                count: self.pages.len(),
            })
    }

    /// Look up a page attribute, following the Pages-tree inheritance chain.
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<Object> {
        let mut id = page_id;
        loop {
            let dict = self.doc.get_object(id).ok()?.as_dict().ok()?;
            if let Ok(value) = dict.get(key) {
                let value = match value {
                    Object::Reference(rid) => self.doc.get_object(*rid).ok()?.clone(),
                    other => other.clone(),
                };
                return Some(value);
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => id = *parent,
                _ => return None,
            }
        }
    }

    /// Resolve the page MediaBox as `[x0, y0, x1, y1]`.
    fn media_box(&self, page_id: ObjectId) -> Result<[f64; 4]> {
        let value = self
            .inherited_attribute(page_id, b"MediaBox")
            .ok_or_else(|| RenderError::InvalidDocument("page has no MediaBox".into()))?;
        let array = value
            .as_array()
            .map_err(|_| RenderError::InvalidDocument("MediaBox is not an array".into()))?;
        if array.len() != 4 {
            return Err(RenderError::InvalidDocument(
                "MediaBox does not have 4 entries".into(),
            ));
        }

        let mut out = [0.0f64; 4];
        for (slot, obj) in out.iter_mut().zip(array) {
            let resolved = match obj {
                Object::Reference(rid) => self
                    .doc
                    .get_object(*rid)
                    .map_err(|e| RenderError::InvalidDocument(e.to_string()))?,
                other => other,
            };
            *slot = object_to_f64(resolved)
                .ok_or_else(|| RenderError::InvalidDocument("non-numeric MediaBox entry".into()))?;
        }
        Ok(out)
    }

    /// Append a self-contained content stream to a page.
    fn append_content(&mut self, page_id: ObjectId, operations: Vec<Operation>) -> Result<()> {
        let encoded = Content { operations }
            .encode()
            .map_err(|e| RenderError::InvalidDocument(e.to_string()))?;
        let stream_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, encoded));

        let page_dict = self
            .doc
            .get_object(page_id)
            .map_err(|e| RenderError::InvalidDocument(e.to_string()))?
            .as_dict()
            .map_err(|e| RenderError::InvalidDocument(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(Object::Reference(existing)) => {
                vec![Object::Reference(*existing), Object::Reference(stream_id)]
            }
            Ok(Object::Array(existing)) => {
                let mut entries = existing.clone();
                entries.push(Object::Reference(stream_id));
                entries
            }
            _ => vec![Object::Reference(stream_id)],
        };

        let page_dict = self
            .doc
            .get_object_mut(page_id)
            .map_err(|e| RenderError::InvalidDocument(e.to_string()))?
            .as_dict_mut()
            .map_err(|e| RenderError::InvalidDocument(e.to_string()))?;
        page_dict.set("Contents", Object::Array(contents));
        Ok(())
    }

    /// Register an image XObject under a fresh name in the page resources.
    ///
    /// Resources are materialized as an inline dictionary on the page (a
    /// clone of the resolved/inherited one plus the new entry), so shared or
    /// inherited resource dictionaries are never mutated.
    fn register_image(&mut self, page_id: ObjectId, image_id: ObjectId) -> Result<String> {
        self.image_counter += 1;
        let name = format!("TzIm{}", self.image_counter);

        let mut resources = match self.inherited_attribute(page_id, b"Resources") {
            Some(Object::Dictionary(dict)) => dict,
            _ => Dictionary::new(),
        };
        let mut xobjects = match resources.get(b"XObject") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(rid)) => self
                .doc
                .get_object(*rid)
                .ok()
                .and_then(|o| o.as_dict().ok().cloned())
                .unwrap_or_default(),
            _ => Dictionary::new(),
        };
        xobjects.set(name.as_bytes(), Object::Reference(image_id));
        resources.set("XObject", Object::Dictionary(xobjects));

        let page_dict = self
            .doc
            .get_object_mut(page_id)
            .map_err(|e| RenderError::InvalidDocument(e.to_string()))?
            .as_dict_mut()
            .map_err(|e| RenderError::InvalidDocument(e.to_string()))?;
        page_dict.set("Resources", Object::Dictionary(resources));
        Ok(name)
    }
}

impl DocumentRenderer for PopplerDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let media_box = self.media_box(self.page_id(page)?)?;
        Ok((media_box[2] - media_box[0], media_box[3] - media_box[1]))
    }

    fn render(&self, page: usize, dpi: u32) -> Result<RgbImage> {
        let count = self.page_count();
        if page >= count {
            return Err(RenderError::PageOutOfRange { page, count });
        }

        let dir = tempfile::tempdir()?;
        let prefix = dir.path().join("page");
        let page_number = (page + 1).to_string();

        let output = Command::new(&self.pdftoppm)
            .args(["-f", &page_number, "-l", &page_number])
            .args(["-r", &dpi.to_string()])
            .arg("-png")
            .arg("-singlefile")
            .arg(&self.source)
            .arg(&prefix)
            .output()?;

        if !output.status.success() {
            return Err(RenderError::RasterizeFailed {
                page,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let rendered = prefix.with_extension("png");
        let img = image::open(&rendered).map_err(|e| RenderError::RasterizeFailed {
            page,
            message: e.to_string(),
        })?;
        debug!(page, dpi, width = img.width(), height = img.height(), "page rendered");
        Ok(img.to_rgb8())
    }

    fn apply_white_fill(&mut self, page: usize, rect: &PointRect) -> Result<()> {
        let page_id = self.page_id(page)?;
        let media_box = self.media_box(page_id)?;
        self.append_content(page_id, white_fill_ops(rect, &media_box))
    }

    fn insert_image(&mut self, page: usize, rect: &PointRect, img: &RgbImage) -> Result<()> {
        let page_id = self.page_id(page)?;
        let media_box = self.media_box(page_id)?;

        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )?;

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(img.width()),
                "Height" => i64::from(img.height()),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        );
        let image_id = self.doc.add_object(stream);

        let name = self.register_image(page_id, image_id)?;
        self.append_content(page_id, image_ops(&name, rect, &media_box))
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.doc.compress();
        self.doc
            .save(path)
            .map_err(|e| RenderError::SaveFailed(e.to_string()))?;
        Ok(())
    }
}

// ============================================================
// Content operator construction
// ============================================================

fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// Flip a top-left-origin rectangle into PDF user space against a MediaBox.
///
/// Returns `(x, y, width, height)` with `(x, y)` at the rectangle's
/// bottom-left corner.
fn to_pdf_space(rect: &PointRect, media_box: &[f64; 4]) -> (f64, f64, f64, f64) {
    let page_height = media_box[3] - media_box[1];
    let x = media_box[0] + rect.x0;
    let y = media_box[1] + (page_height - rect.y1);
    (x, y, rect.width(), rect.height())
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Operators painting an opaque white rectangle.
fn white_fill_ops(rect: &PointRect, media_box: &[f64; 4]) -> Vec<Operation> {
    let (x, y, w, h) = to_pdf_space(rect, media_box);
    vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![1.into(), 1.into(), 1.into()]),
        Operation::new("re", vec![real(x), real(y), real(w), real(h)]),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Operators drawing a named image XObject into a page rectangle.
fn image_ops(name: &str, rect: &PointRect, media_box: &[f64; 4]) -> Vec<Operation> {
    let (x, y, w, h) = to_pdf_space(rect, media_box);
    vec![
        Operation::new("q", vec![]),
        Operation::new("cm", vec![real(w), real(0.0), real(0.0), real(h), real(x), real(y)]),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

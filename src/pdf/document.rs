//! Engine-neutral document and page handles
//!
//! The extractor and its renderers only see these traits. The PDFium
//! backend in [`super::reader`] implements them; tests implement them with
//! in-memory documents.

use crate::error::Result;
use async_trait::async_trait;
use image::DynamicImage;
use serde::Serialize;
use std::collections::BTreeMap;

// ============================================================================
// Page-level types
// ============================================================================

/// Unscaled, unrotated page geometry
///
/// `width` and `height` are the media box as drawn before `/Rotate` applies;
/// [`Viewport`] swaps them for quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: i32,
}

/// Scaled, rotation-adjusted drawing area for one page
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
    /// Scale factor applied to the page size
    pub scale: f32,
    /// Page rotation in degrees
    pub rotation: i32,
}

impl Viewport {
    /// Compute the viewport of a page at the given scale.
    pub fn new(size: PageSize, scale: f32) -> Self {
        let (width, height) = if size.rotation == 90 || size.rotation == 270 {
            (size.height, size.width)
        } else {
            (size.width, size.height)
        };
        Self {
            width: width * scale,
            height: height * scale,
            scale,
            rotation: size.rotation,
        }
    }

    /// Pixel width, rounded up so the whole page fits
    pub fn pixel_width(&self) -> u32 {
        self.width.ceil().max(1.0) as u32
    }

    /// Pixel height, rounded up so the whole page fits
    pub fn pixel_height(&self) -> u32 {
        self.height.ceil().max(1.0) as u32
    }
}

/// A run of text on a page
///
/// Coordinates are unscaled points with a top-left origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Annotation on a page (popups excluded)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Annotation type (e.g., "link", "highlight", "text")
    pub subtype: String,
    /// Bounding rectangle `[x0, y0, x1, y1]`, top-left origin, unscaled points
    pub rect: Option<[f32; 4]>,
    /// Text content (comment, note)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    /// Target URL for URI links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Target page (1-indexed) for internal links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_page: Option<u32>,
}

/// One step of a path outline
///
/// Points are unscaled page points with a top-left origin, like [`TextItem`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    CurveTo {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x: f32,
        y: f32,
    },
    Close,
}

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Rule deciding which regions of a path are inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// A filled and/or stroked path
#[derive(Debug, Clone, PartialEq)]
pub struct PathGraphic {
    pub commands: Vec<PathCommand>,
    /// Fill color, `None` when the path is not filled
    pub fill: Option<Color>,
    pub fill_rule: FillRule,
    /// Stroke color, `None` when the path is not stroked
    pub stroke: Option<Color>,
    /// Stroke width in points
    pub stroke_width: f32,
}

/// An image placed on the page
#[derive(Debug, Clone)]
pub struct ImageGraphic {
    /// Maps the unit square (origin at the image's bottom-left corner) to
    /// top-left page space, as `[a, b, c, d, e, f]`
    pub transform: [f32; 6],
    pub image: DynamicImage,
}

/// A drawing element of the page content, in painting order
#[derive(Debug, Clone)]
pub enum Graphic {
    Path(PathGraphic),
    Image(ImageGraphic),
}

/// Options forwarded to bitmap rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitmapOptions {
    pub render_annotations: bool,
    pub render_form_data: bool,
}

impl Default for BitmapOptions {
    fn default() -> Self {
        Self {
            render_annotations: true,
            render_form_data: true,
        }
    }
}

// ============================================================================
// Document-level types
// ============================================================================

/// Raw document metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PdfMetaData {
    /// Entries of the trailer's /Info dictionary
    pub info: BTreeMap<String, String>,
    /// XMP metadata stream of the catalog, if present
    pub metadata: Option<String>,
}

/// Explicit destination: a target page plus a view specification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination {
    /// Target page (1-indexed), if it resolves to a page of this document
    pub page: Option<u32>,
    /// View kind ("XYZ", "Fit", "FitH", "FitV", "FitR", "FitB", "FitBH", "FitBV")
    pub kind: String,
    /// Numeric parameters of the view; `None` for PDF null
    pub args: Vec<Option<f64>>,
}

/// Outline entry (bookmark)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineItem {
    pub title: String,
    pub dest: Option<Destination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub items: Vec<OutlineItem>,
}

// ============================================================================
// Handles
// ============================================================================

/// One page of an open document
///
/// Handles are fetched on demand and dropped once every renderer has seen
/// the page.
#[async_trait(?Send)]
pub trait PageHandle {
    /// Page number (1-indexed)
    fn number(&self) -> u32;

    /// Unscaled page geometry
    fn size(&self) -> PageSize;

    /// Viewport of this page at `scale`
    fn viewport(&self, scale: f32) -> Viewport {
        Viewport::new(self.size(), scale)
    }

    /// Text runs in content order
    async fn text_content(&self) -> Result<Vec<TextItem>>;

    /// Annotations, popups excluded
    async fn annotations(&self) -> Result<Vec<Annotation>>;

    /// Rasterize the page at `scale`
    async fn render_bitmap(&self, scale: f32, options: BitmapOptions) -> Result<DynamicImage>;

    /// Vector paths and placed images, in painting order
    ///
    /// Text is not included; it is reported by [`PageHandle::text_content`].
    async fn graphics(&self) -> Result<Vec<Graphic>> {
        Ok(Vec::new())
    }
}

/// An open document
#[async_trait(?Send)]
pub trait DocumentHandle {
    /// Number of pages
    fn num_pages(&self) -> u32;

    /// Fetch a page by its 1-based number
    async fn page<'a>(&'a self, number: u32) -> Result<Box<dyn PageHandle + 'a>>;

    /// Raw metadata (info dictionary and XMP)
    async fn metadata(&self) -> Result<PdfMetaData>;

    /// Outline tree, `None` if the document has none
    async fn outline(&self) -> Result<Option<Vec<OutlineItem>>>;

    /// One label per page, `None` if the document defines no labels
    async fn page_labels(&self) -> Result<Option<Vec<String>>>;

    /// Named destinations, sorted by name
    async fn destinations(&self) -> Result<BTreeMap<String, Destination>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_scales_page() {
        let size = PageSize {
            width: 612.0,
            height: 792.0,
            rotation: 0,
        };
        let vp = Viewport::new(size, 1.5);
        assert_eq!(vp.width, 918.0);
        assert_eq!(vp.height, 1188.0);
        assert_eq!(vp.pixel_width(), 918);
    }

    #[test]
    fn test_viewport_swaps_rotated_dimensions() {
        let size = PageSize {
            width: 612.0,
            height: 792.0,
            rotation: 90,
        };
        let vp = Viewport::new(size, 1.0);
        assert_eq!(vp.width, 792.0);
        assert_eq!(vp.height, 612.0);
        assert_eq!(vp.rotation, 90);
    }
}

//! Run configuration: page range, viewport scale and render options

use crate::error::{Error, Result};
use crate::pdf::BitmapOptions;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;

/// Default scale factor applied to page sizes
pub const DEFAULT_VIEWPORT_SCALE: f32 = 1.5;

/// Inclusive page range, 1-indexed; the end is unbounded unless set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl PageRange {
    /// Pages `start..=end`
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Pages `start..` up to the last page of the document
    pub fn starting_at(start: u32) -> Self {
        Self { start, end: None }
    }

    /// Every page
    pub fn all() -> Self {
        Self::starting_at(1)
    }

    /// Clamp to a document with `num_pages` pages.
    ///
    /// A start of 0 is treated as 1. The end is clamped to `num_pages`,
    /// never extended. The result is empty when the start lies past the
    /// clamped end.
    pub fn resolve(&self, num_pages: u32) -> RangeInclusive<u32> {
        let first = self.start.max(1);
        let last = self.end.map_or(num_pages, |end| end.min(num_pages));
        first..=last
    }
}

impl Default for PageRange {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-", self.start),
        }
    }
}

/// Parses `"N"`, `"N-M"`, `"N-"` and `"-M"`.
impl FromStr for PageRange {
    type Err = Error;

    fn from_str(range: &str) -> Result<Self> {
        let invalid = || Error::InvalidPageRange {
            range: range.to_string(),
        };
        let parse = |s: &str| s.trim().parse::<u32>().map_err(|_| invalid());

        let range = range.trim();
        if range.is_empty() {
            return Err(invalid());
        }

        let parsed = match range.split_once('-') {
            Some((start, end)) => {
                let start = if start.trim().is_empty() {
                    1
                } else {
                    parse(start)?
                };
                if end.trim().is_empty() {
                    Self::starting_at(start)
                } else {
                    Self::new(start, parse(end)?)
                }
            }
            None => {
                let page = parse(range)?;
                Self::new(page, page)
            }
        };

        if let Some(end) = parsed.end {
            if parsed.start > end {
                return Err(invalid());
            }
        }

        Ok(parsed)
    }
}

type ScaleFn = dyn Fn(f32, f32) -> f32 + Send + Sync;

/// Scale factor for a page, fixed or computed from its width and height
#[derive(Clone)]
pub enum ViewportScale {
    Fixed(f32),
    Computed(Arc<ScaleFn>),
}

impl ViewportScale {
    /// Scale computed from the page's `(width, height)` in points
    pub fn from_fn(f: impl Fn(f32, f32) -> f32 + Send + Sync + 'static) -> Self {
        Self::Computed(Arc::new(f))
    }

    /// Scale every page to `pixels` wide
    pub fn fit_width(pixels: f32) -> Self {
        Self::from_fn(move |width, _| pixels / width)
    }

    /// Scale every page to `pixels` high
    pub fn fit_height(pixels: f32) -> Self {
        Self::from_fn(move |_, height| pixels / height)
    }

    /// Scale factor for a page of the given size
    pub fn scale_for(&self, width: f32, height: f32) -> f32 {
        match self {
            Self::Fixed(scale) => *scale,
            Self::Computed(f) => f(width, height),
        }
    }
}

impl Default for ViewportScale {
    fn default() -> Self {
        Self::Fixed(DEFAULT_VIEWPORT_SCALE)
    }
}

impl fmt::Debug for ViewportScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(scale) => f.debug_tuple("Fixed").field(scale).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Output format of the raster renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RasterFormat {
    #[default]
    Png,
    Jpeg,
}

impl RasterFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Options passed through to every renderer
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Raster renderer output format (default: PNG)
    pub raster_format: RasterFormat,
    /// Draw annotations into bitmaps (default: true)
    pub render_annotations: bool,
    /// Draw form field contents into bitmaps (default: true)
    pub render_form_data: bool,
    /// Embed the page bitmap beneath the SVG vector layers (default: false)
    pub svg_raster_underlay: bool,
    /// Emit selectable text in SVG output (default: true)
    pub svg_text_layer: bool,
}

impl RenderOptions {
    pub fn bitmap_options(&self) -> BitmapOptions {
        BitmapOptions {
            render_annotations: self.render_annotations,
            render_form_data: self.render_form_data,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            raster_format: RasterFormat::Png,
            render_annotations: true,
            render_form_data: true,
            svg_raster_underlay: false,
            svg_text_layer: true,
        }
    }
}

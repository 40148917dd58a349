//! PDF Extractor Library
//!
//! Extracts a PDF into a directory of artifacts:
//! - `page-<n>.json`: page geometry, text items and annotations
//! - `page-<n>.png` / `page-<n>.jpg`: rasterized pages
//! - `page-<n>.svg` and `document.svg`: vector pages with a text layer
//! - `info.json`: per-page entries plus document metadata, outline,
//!   page labels and named destinations
//!
//! ```no_run
//! use pdf_extractor::{ExtractorOptions, PageRange, PdfExtractor};
//!
//! # async fn run() -> pdf_extractor::Result<()> {
//! let options = ExtractorOptions::default().with_page_range(PageRange::new(1, 3));
//! let mut extractor = PdfExtractor::new("out", options)?;
//! let meta = extractor.parse("document.pdf").await?;
//! println!("{} pages extracted", meta.pages().len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod metadata;
pub mod pdf;
pub mod render;

pub use config::{PageRange, RasterFormat, RenderOptions, ViewportScale};
pub use error::{Error, ErrorKind, Result};
pub use extractor::{ExtractionState, ExtractorOptions, PdfExtractor, VERSION};
pub use metadata::{MetaDataHandler, PageEntry};
pub use render::{Renderer, RendererConfig};

//! PDF engine layer
//!
//! Engine-neutral handles plus the PDFium/lopdf backend that implements them.

pub mod catalog;
mod document;
pub mod engine;
mod reader;

pub use document::{
    Annotation, BitmapOptions, Color, Destination, DocumentHandle, FillRule, Graphic,
    ImageGraphic, OutlineItem, PageHandle, PageSize, PathCommand, PathGraphic, PdfMetaData,
    TextItem, Viewport,
};
pub use reader::{check_pdf_header, PdfiumDocument, PdfiumPage};

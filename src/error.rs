//! Error types for the PDF extractor

use thiserror::Error;

/// Result type alias for the PDF extractor
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the PDF extractor
#[derive(Error, Debug)]
pub enum Error {
    /// Output directory missing, not a directory, or not readable/writable
    #[error("Output directory not accessible: {path} ({reason})")]
    OutputDirInaccessible { path: String, reason: String },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// PDF is password protected and no (or a wrong) password was provided
    #[error("PDF is password protected")]
    PasswordRequired,

    /// The PDF engine could not be bound
    #[error("PDF engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    /// The document could not be loaded by the engine
    #[error("Failed to load document: {reason}")]
    DocumentLoad { reason: String },

    /// A page could not be retrieved from the document
    #[error("Failed to fetch page {page}: {source}")]
    PageFetch {
        page: u32,
        #[source]
        source: Box<Error>,
    },

    /// Page out of bounds
    #[error("Page {page} out of bounds (total: {total})")]
    PageOutOfBounds { page: u32, total: u32 },

    /// A renderer failed while processing a page
    #[error("Renderer '{renderer}' failed on page {page}: {source}")]
    PageRender {
        renderer: String,
        page: u32,
        #[source]
        source: Box<Error>,
    },

    /// A renderer failed while producing its document-level artifact
    #[error("Renderer '{renderer}' failed to render document: {source}")]
    DocumentRender {
        renderer: String,
        #[source]
        source: Box<Error>,
    },

    /// One of the document-level metadata fetches failed
    #[error("Failed to fetch document {field}: {source}")]
    MetadataFetch {
        field: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// Free-form fault raised by a renderer implementation
    #[error("Render failed: {reason}")]
    Renderer { reason: String },

    /// Invalid page range
    #[error("Invalid page range: {range}")]
    InvalidPageRange { range: String },

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// Document structure error
    #[error("PDF structure error: {0}")]
    Structure(#[from] lopdf::Error),

    /// Image encoding error
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`], one per failure stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    DocumentLoad,
    PageFetch,
    Render,
    MetadataFetch,
    Other,
}

impl Error {
    /// Which stage of an extraction run produced this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OutputDirInaccessible { .. } => ErrorKind::Precondition,
            Error::InvalidPdf { .. }
            | Error::PasswordRequired
            | Error::EngineUnavailable { .. }
            | Error::DocumentLoad { .. } => ErrorKind::DocumentLoad,
            Error::PageFetch { .. } | Error::PageOutOfBounds { .. } => ErrorKind::PageFetch,
            Error::PageRender { .. } | Error::DocumentRender { .. } => ErrorKind::Render,
            Error::MetadataFetch { .. } => ErrorKind::MetadataFetch,
            Error::Renderer { .. }
            | Error::InvalidPageRange { .. }
            | Error::Pdfium { .. }
            | Error::Structure(_)
            | Error::Image(_)
            | Error::Io(_)
            | Error::Serialization(_) => ErrorKind::Other,
        }
    }

    /// Shorthand for a renderer fault.
    pub fn renderer(reason: impl Into<String>) -> Self {
        Error::Renderer {
            reason: reason.into(),
        }
    }
}

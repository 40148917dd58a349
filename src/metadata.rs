//! Aggregate metadata built up over one extraction run

use crate::error::Result;
use crate::pdf::{Destination, OutlineItem, PdfMetaData, Viewport};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the aggregate metadata written by [`MetaDataHandler::finalize`]
pub const INFO_FILE_NAME: &str = "info.json";

/// One processed page, as recorded in `info.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEntry {
    /// Page number (1-indexed)
    pub page: u32,
    /// Unscaled width in points
    pub width: f32,
    /// Unscaled height in points
    pub height: f32,
    pub rotation: i32,
    pub viewport: Viewport,
    /// Number of text items found on the page
    pub text_items: usize,
    /// Number of annotations (popups excluded)
    pub annotation_count: usize,
    /// Artifact file names keyed by the renderer that wrote them
    pub artifacts: BTreeMap<String, String>,
}

impl PageEntry {
    /// Record an artifact written for this page
    pub fn attach(&mut self, renderer: &str, file_name: impl Into<String>) {
        self.artifacts.insert(renderer.to_string(), file_name.into());
    }
}

/// Serialize a set-once field: unset and set-to-`None` both become `null`
fn serialize_collected<T, S>(
    value: &Option<Option<T>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    value.as_ref().and_then(Option::as_ref).serialize(serializer)
}

/// Accumulates per-page entries and document metadata, then writes them once.
///
/// A fresh handler is created for every run and lent to each renderer call.
/// Pages are appended in traversal order. The four document-level fields
/// start absent and are set once, after the last page and before any
/// document-level rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDataHandler {
    version: String,
    pages: Vec<PageEntry>,
    pdf_meta_data: Option<PdfMetaData>,
    /// Outer `Option` tracks whether the field was set, inner whether the document has one
    #[serde(serialize_with = "serialize_collected")]
    pdf_outline: Option<Option<Vec<OutlineItem>>>,
    #[serde(serialize_with = "serialize_collected")]
    pdf_page_labels: Option<Option<Vec<String>>>,
    pdf_destinations: Option<BTreeMap<String, Destination>>,
}

impl MetaDataHandler {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            pages: Vec::new(),
            pdf_meta_data: None,
            pdf_outline: None,
            pdf_page_labels: None,
            pdf_destinations: None,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Append the entry for the page just processed
    pub fn record_page(&mut self, entry: PageEntry) {
        debug_assert!(
            self.pages.last().map_or(true, |last| last.page < entry.page),
            "page {} recorded out of order",
            entry.page
        );
        self.pages.push(entry);
    }

    pub fn pages(&self) -> &[PageEntry] {
        &self.pages
    }

    pub fn page(&self, number: u32) -> Option<&PageEntry> {
        self.pages.iter().rev().find(|entry| entry.page == number)
    }

    pub fn page_mut(&mut self, number: u32) -> Option<&mut PageEntry> {
        self.pages.iter_mut().rev().find(|entry| entry.page == number)
    }

    pub fn set_pdf_meta_data(&mut self, meta_data: PdfMetaData) {
        debug_assert!(self.pdf_meta_data.is_none(), "metadata already set");
        self.pdf_meta_data = Some(meta_data);
    }

    /// `None` when the document has no outline
    pub fn set_outline(&mut self, outline: Option<Vec<OutlineItem>>) {
        debug_assert!(self.pdf_outline.is_none(), "outline already set");
        self.pdf_outline = Some(outline);
    }

    /// `None` when the document defines no page labels
    pub fn set_page_labels(&mut self, labels: Option<Vec<String>>) {
        debug_assert!(self.pdf_page_labels.is_none(), "page labels already set");
        self.pdf_page_labels = Some(labels);
    }

    pub fn set_destinations(&mut self, destinations: BTreeMap<String, Destination>) {
        debug_assert!(self.pdf_destinations.is_none(), "destinations already set");
        self.pdf_destinations = Some(destinations);
    }

    pub fn pdf_meta_data(&self) -> Option<&PdfMetaData> {
        self.pdf_meta_data.as_ref()
    }

    pub fn outline(&self) -> Option<&[OutlineItem]> {
        self.pdf_outline.as_ref().and_then(|outline| outline.as_deref())
    }

    pub fn page_labels(&self) -> Option<&[String]> {
        self.pdf_page_labels.as_ref().and_then(|labels| labels.as_deref())
    }

    pub fn destinations(&self) -> Option<&BTreeMap<String, Destination>> {
        self.pdf_destinations.as_ref()
    }

    /// Label of a page, if the document defines page labels
    pub fn page_label(&self, number: u32) -> Option<&str> {
        let index = number.checked_sub(1)? as usize;
        self.page_labels()
            .and_then(|labels| labels.get(index))
            .map(String::as_str)
    }

    /// Pretty-printed JSON of the whole aggregate
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the aggregate to `<output_dir>/info.json`.
    ///
    /// Must be called once, after every page has been recorded and the
    /// document-level fields have been collected. Calling it earlier writes
    /// an incomplete file.
    pub async fn finalize(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(INFO_FILE_NAME);
        let json = self.to_json()?;
        tokio::fs::write(&path, json).await?;
        tracing::debug!(path = %path.display(), pages = self.pages.len(), "Metadata written");
        Ok(path)
    }
}

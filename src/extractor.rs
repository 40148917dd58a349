//! Extraction orchestrator
//!
//! Walks the pages of a document in order, feeding each one through the
//! JSON renderer and then every configured renderer, collects the document
//! metadata, and finally lets each renderer write its document-level
//! output. Every step is awaited before the next one starts.

use crate::config::{PageRange, RenderOptions, ViewportScale};
use crate::error::{Error, Result};
use crate::metadata::MetaDataHandler;
use crate::pdf::{engine, DocumentHandle, PageHandle, PdfiumDocument};
use crate::render::{default_renderers, JsonRenderer, Renderer, RendererConfig};
use std::fmt;
use std::path::{Path, PathBuf};

/// Version recorded in every `info.json`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for [`PdfExtractor::new`]
#[derive(Default)]
pub struct ExtractorOptions {
    /// Pages to process (default: all)
    pub page_range: PageRange,
    /// Scale applied to every page (default: 1.5)
    pub viewport_scale: ViewportScale,
    /// Renderers run after the JSON renderer, in order (default: raster, SVG)
    pub renderers: Option<Vec<Box<dyn Renderer>>>,
    /// Replacement for the built-in JSON renderer (default: [`JsonRenderer`])
    ///
    /// It runs first for every page and last at document level, so it must
    /// record each page's entry and write `info.json`.
    pub json_renderer: Option<Box<dyn Renderer>>,
    /// Options passed to every built-in renderer
    pub render: RenderOptions,
}

impl ExtractorOptions {
    pub fn with_page_range(mut self, page_range: PageRange) -> Self {
        self.page_range = page_range;
        self
    }

    pub fn with_viewport_scale(mut self, viewport_scale: ViewportScale) -> Self {
        self.viewport_scale = viewport_scale;
        self
    }

    pub fn with_renderers(mut self, renderers: Vec<Box<dyn Renderer>>) -> Self {
        self.renderers = Some(renderers);
        self
    }

    pub fn with_json_renderer(mut self, json_renderer: Box<dyn Renderer>) -> Self {
        self.json_renderer = Some(json_renderer);
        self
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }
}

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    Idle,
    Loading,
    /// Processing the given page
    Page(u32),
    CollectingMetadata,
    FinalizingDocument,
    Done,
    Failed,
}

impl fmt::Display for ExtractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Page(n) => write!(f, "page {}", n),
            Self::CollectingMetadata => write!(f, "collecting metadata"),
            Self::FinalizingDocument => write!(f, "finalizing document"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Check that `path` is an existing directory we can read and write
pub fn check_output_dir(path: &Path) -> Result<()> {
    let inaccessible = |reason: String| Error::OutputDirInaccessible {
        path: path.display().to_string(),
        reason,
    };

    let metadata = std::fs::metadata(path).map_err(|e| inaccessible(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(inaccessible("not a directory".to_string()));
    }
    check_access(path).map_err(inaccessible)
}

/// Ask the OS whether the effective user may read and write `path`
#[cfg(not(windows))]
fn check_access(path: &Path) -> std::result::Result<(), String> {
    use rustix::fs::{access, Access};

    access(path, Access::READ_OK | Access::WRITE_OK)
        .map_err(|e| format!("not readable and writable: {}", std::io::Error::from(e)))
}

#[cfg(windows)]
fn check_access(path: &Path) -> std::result::Result<(), String> {
    std::fs::read_dir(path).map_err(|e| format!("not readable: {}", e))?;
    if std::fs::metadata(path).map_err(|e| e.to_string())?.permissions().readonly() {
        return Err("not writable".to_string());
    }
    Ok(())
}

/// Extracts a PDF into a directory of artifacts
pub struct PdfExtractor {
    output_dir: PathBuf,
    page_range: PageRange,
    json: Box<dyn Renderer>,
    renderers: Vec<Box<dyn Renderer>>,
    state: ExtractionState,
}

impl PdfExtractor {
    /// Create an extractor writing into `output_dir`.
    ///
    /// The directory must already exist and be readable and writable.
    pub fn new(output_dir: impl Into<PathBuf>, options: ExtractorOptions) -> Result<Self> {
        let output_dir = output_dir.into();
        check_output_dir(&output_dir)?;

        let config = RendererConfig {
            output_dir: output_dir.clone(),
            viewport_scale: options.viewport_scale,
            options: options.render,
        };
        let renderers = options
            .renderers
            .unwrap_or_else(|| default_renderers(&config));
        let json = options
            .json_renderer
            .unwrap_or_else(|| Box::new(JsonRenderer::new(config)));

        Ok(Self {
            output_dir,
            page_range: options.page_range,
            json,
            renderers,
            state: ExtractionState::Idle,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn page_range(&self) -> PageRange {
        self.page_range
    }

    pub fn state(&self) -> ExtractionState {
        self.state
    }

    /// Names of the configured renderers, in run order (JSON excluded)
    pub fn renderer_names(&self) -> Vec<&str> {
        self.renderers.iter().map(|r| r.name()).collect()
    }

    fn transition(&mut self, state: ExtractionState) {
        tracing::debug!(from = %self.state, to = %state, "State transition");
        self.state = state;
    }

    fn fail(&mut self, err: Error) -> Error {
        tracing::error!(state = %self.state, error = %err, "Extraction failed");
        self.transition(ExtractionState::Failed);
        err
    }

    /// Extract the PDF at `path`
    pub async fn parse(&mut self, path: impl AsRef<Path>) -> Result<MetaDataHandler> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|e| {
            self.fail(Error::InvalidPdf {
                reason: format!("Cannot read {}: {}", path.display(), e),
            })
        })?;
        self.parse_from_bytes(data).await
    }

    /// Extract a PDF held in memory
    pub async fn parse_from_bytes(&mut self, data: Vec<u8>) -> Result<MetaDataHandler> {
        self.transition(ExtractionState::Loading);

        let document = engine::install()
            .and_then(|_| PdfiumDocument::open_bytes(data))
            .map_err(|e| self.fail(e))?;

        self.parse_document(&document).await
    }

    /// Run the extraction against an already loaded document
    pub async fn parse_document(&mut self, doc: &dyn DocumentHandle) -> Result<MetaDataHandler> {
        let mut meta = MetaDataHandler::new(VERSION);
        match self.run(doc, &mut meta).await {
            Ok(()) => {
                self.transition(ExtractionState::Done);
                tracing::info!(pages = meta.pages().len(), "Extraction finished");
                Ok(meta)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn run(&mut self, doc: &dyn DocumentHandle, meta: &mut MetaDataHandler) -> Result<()> {
        let num_pages = doc.num_pages();
        let pages = self.page_range.resolve(num_pages);
        tracing::info!(
            num_pages,
            first = pages.start(),
            last = pages.end(),
            "Extracting document"
        );

        for number in pages {
            self.transition(ExtractionState::Page(number));
            let page = doc.page(number).await.map_err(|e| Error::PageFetch {
                page: number,
                source: Box::new(e),
            })?;
            self.render_page(page.as_ref(), meta).await?;
            tracing::info!(page = number, "Page extracted");
        }

        self.transition(ExtractionState::CollectingMetadata);
        self.collect_metadata(doc, meta).await?;

        self.transition(ExtractionState::FinalizingDocument);
        self.render_document(doc, meta).await
    }

    async fn render_page(&mut self, page: &dyn PageHandle, meta: &mut MetaDataHandler) -> Result<()> {
        let number = page.number();
        let page_error = |renderer: &str, e: Error| Error::PageRender {
            renderer: renderer.to_string(),
            page: number,
            source: Box::new(e),
        };

        self.json
            .render_page(page, meta)
            .await
            .map_err(|e| page_error(self.json.name(), e))?;

        for renderer in self.renderers.iter_mut() {
            tracing::debug!(page = number, renderer = renderer.name(), "Rendering page");
            renderer
                .render_page(page, meta)
                .await
                .map_err(|e| page_error(renderer.name(), e))?;
        }
        Ok(())
    }

    async fn collect_metadata(
        &self,
        doc: &dyn DocumentHandle,
        meta: &mut MetaDataHandler,
    ) -> Result<()> {
        let fetch_error = |field: &'static str| {
            move |e: Error| Error::MetadataFetch {
                field,
                source: Box::new(e),
            }
        };

        meta.set_pdf_meta_data(doc.metadata().await.map_err(fetch_error("metadata"))?);
        meta.set_outline(doc.outline().await.map_err(fetch_error("outline"))?);
        meta.set_page_labels(doc.page_labels().await.map_err(fetch_error("page labels"))?);
        meta.set_destinations(doc.destinations().await.map_err(fetch_error("destinations"))?);
        Ok(())
    }

    async fn render_document(
        &mut self,
        doc: &dyn DocumentHandle,
        meta: &mut MetaDataHandler,
    ) -> Result<()> {
        let document_error = |renderer: &str, e: Error| Error::DocumentRender {
            renderer: renderer.to_string(),
            source: Box::new(e),
        };

        for renderer in self.renderers.iter_mut() {
            tracing::debug!(renderer = renderer.name(), "Rendering document");
            renderer
                .render_document(doc, meta)
                .await
                .map_err(|e| document_error(renderer.name(), e))?;
        }

        self.json
            .render_document(doc, meta)
            .await
            .map_err(|e| document_error(self.json.name(), e))
    }
}

//! Structured JSON output: one file per page plus the aggregate `info.json`

use super::{page_file_name, Renderer, RendererConfig};
use crate::error::Result;
use crate::metadata::{MetaDataHandler, PageEntry};
use crate::pdf::{Annotation, DocumentHandle, PageHandle, TextItem, Viewport};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

/// Contents of `page-<n>.json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageDocument<'a> {
    page: u32,
    width: f32,
    height: f32,
    rotation: i32,
    viewport: Viewport,
    text_content: &'a [TextItem],
    annotations: &'a [Annotation],
}

/// Writes `page-<n>.json` and creates the page's entry in the handler.
///
/// The extractor runs this renderer before every other one on each page,
/// and its document step writes `info.json` after all other document
/// renderers have finished.
pub struct JsonRenderer {
    config: RendererConfig,
}

impl JsonRenderer {
    pub const NAME: &'static str = "json";

    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }
}

#[async_trait(?Send)]
impl Renderer for JsonRenderer {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn render_page(
        &mut self,
        page: &dyn PageHandle,
        meta: &mut MetaDataHandler,
    ) -> Result<()> {
        let number = page.number();
        let size = page.size();
        let viewport = self.config.viewport(page);
        let text = page.text_content().await?;
        let annotations = page.annotations().await?;

        let document = PageDocument {
            page: number,
            width: size.width,
            height: size.height,
            rotation: size.rotation,
            viewport,
            text_content: &text,
            annotations: &annotations,
        };
        let file_name = page_file_name(number, "json");
        let json = serde_json::to_string_pretty(&document)?;
        tokio::fs::write(self.config.output_dir.join(&file_name), json).await?;

        let mut artifacts = BTreeMap::new();
        artifacts.insert(Self::NAME.to_string(), file_name);
        meta.record_page(PageEntry {
            page: number,
            width: size.width,
            height: size.height,
            rotation: size.rotation,
            viewport,
            text_items: text.len(),
            annotation_count: annotations.len(),
            artifacts,
        });

        tracing::debug!(
            page = number,
            text_items = text.len(),
            annotations = annotations.len(),
            "Page JSON written"
        );
        Ok(())
    }

    async fn render_document(
        &mut self,
        _doc: &dyn DocumentHandle,
        meta: &mut MetaDataHandler,
    ) -> Result<()> {
        meta.finalize(&self.config.output_dir).await?;
        Ok(())
    }
}

//! Page renderers
//!
//! Each renderer turns a page into one artifact file and may write a
//! document-level artifact once every page has been processed. Renderers
//! share the run's [`MetaDataHandler`], which is lent to each call.

mod json;
mod raster;
mod svg;

pub use json::JsonRenderer;
pub use raster::RasterRenderer;
pub use svg::SvgRenderer;

use crate::config::{RenderOptions, ViewportScale};
use crate::error::Result;
use crate::metadata::MetaDataHandler;
use crate::pdf::{DocumentHandle, PageHandle, Viewport};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A page-to-artifact transformation
///
/// The JSON renderer always runs first for a page, so the page's entry in
/// the handler exists by the time any other renderer sees it. Nothing else
/// about other renderers may be assumed.
#[async_trait(?Send)]
pub trait Renderer {
    /// Short name used for logging and as the artifact key in page entries
    fn name(&self) -> &str;

    /// Render one page
    async fn render_page(&mut self, page: &dyn PageHandle, meta: &mut MetaDataHandler)
        -> Result<()>;

    /// Produce document-level output after all pages and document metadata
    async fn render_document(
        &mut self,
        _doc: &dyn DocumentHandle,
        _meta: &mut MetaDataHandler,
    ) -> Result<()> {
        Ok(())
    }
}

/// Settings shared by the renderers of one run
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub output_dir: PathBuf,
    pub viewport_scale: ViewportScale,
    pub options: RenderOptions,
}

impl RendererConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            viewport_scale: ViewportScale::default(),
            options: RenderOptions::default(),
        }
    }

    /// Viewport of a page under the configured scale
    pub fn viewport(&self, page: &dyn PageHandle) -> Viewport {
        // Fit against the displayed (rotated) dimensions
        let unscaled = page.viewport(1.0);
        page.viewport(self.viewport_scale.scale_for(unscaled.width, unscaled.height))
    }

    /// Path of a page artifact: `page-<n>.<extension>`
    pub fn page_path(&self, number: u32, extension: &str) -> PathBuf {
        self.output_dir.join(page_file_name(number, extension))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// File name of a page artifact
pub fn page_file_name(number: u32, extension: &str) -> String {
    format!("page-{}.{}", number, extension)
}

/// The renderers used when none are configured: raster, then SVG
pub fn default_renderers(config: &RendererConfig) -> Vec<Box<dyn Renderer>> {
    vec![
        Box::new(RasterRenderer::new(config.clone())),
        Box::new(SvgRenderer::new(config.clone())),
    ]
}

/// Build a renderer by name ("raster" or "svg")
pub fn renderer_by_name(name: &str, config: &RendererConfig) -> Option<Box<dyn Renderer>> {
    match name {
        RasterRenderer::NAME => Some(Box::new(RasterRenderer::new(config.clone()))),
        SvgRenderer::NAME => Some(Box::new(SvgRenderer::new(config.clone()))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_file_name() {
        assert_eq!(page_file_name(3, "png"), "page-3.png");
        let config = RendererConfig::new("/tmp/out");
        assert_eq!(
            config.page_path(12, "svg"),
            PathBuf::from("/tmp/out/page-12.svg")
        );
    }

    #[test]
    fn test_default_renderers_order() {
        let config = RendererConfig::new("/tmp/out");
        let names: Vec<String> = default_renderers(&config)
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["raster", "svg"]);
    }

    struct QuarterTurnedPage;

    #[async_trait(?Send)]
    impl PageHandle for QuarterTurnedPage {
        fn number(&self) -> u32 {
            1
        }

        fn size(&self) -> crate::pdf::PageSize {
            crate::pdf::PageSize {
                width: 612.0,
                height: 792.0,
                rotation: 90,
            }
        }

        async fn text_content(&self) -> Result<Vec<crate::pdf::TextItem>> {
            Ok(Vec::new())
        }

        async fn annotations(&self) -> Result<Vec<crate::pdf::Annotation>> {
            Ok(Vec::new())
        }

        async fn render_bitmap(
            &self,
            _scale: f32,
            _options: crate::pdf::BitmapOptions,
        ) -> Result<image::DynamicImage> {
            Err(crate::error::Error::renderer("not rendered in this test"))
        }
    }

    #[test]
    fn test_fit_width_uses_displayed_width() {
        let config = RendererConfig {
            viewport_scale: ViewportScale::fit_width(396.0),
            ..RendererConfig::new("/tmp/out")
        };
        let viewport = config.viewport(&QuarterTurnedPage);
        assert_eq!(viewport.scale, 0.5);
        assert_eq!((viewport.width, viewport.height), (396.0, 306.0));
    }

    #[test]
    fn test_renderer_by_name() {
        let config = RendererConfig::new("/tmp/out");
        assert!(renderer_by_name("svg", &config).is_some());
        assert!(renderer_by_name("raster", &config).is_some());
        assert!(renderer_by_name("canvas", &config).is_none());
    }
}

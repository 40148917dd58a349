//! PDF Extractor - Entry point
//!
//! Extracts a PDF into a directory of JSON, raster and SVG artifacts.

use anyhow::Context;
use clap::Parser;
use pdf_extractor::render::{renderer_by_name, RendererConfig};
use pdf_extractor::{
    ExtractorOptions, PageRange, PdfExtractor, RasterFormat, RenderOptions, ViewportScale,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pdf-extractor", version, about = "Extract a PDF into a directory of artifacts")]
struct Cli {
    /// PDF file to extract
    pdf: PathBuf,

    /// Output directory, created if missing
    #[arg(default_value = ".")]
    output_dir: PathBuf,

    /// Only extract the first N pages (0 extracts every page)
    page_limit: Option<u32>,

    /// Page range to extract, e.g. "3", "2-5" or "4-"
    #[arg(long, conflicts_with = "page_limit", value_parser = parse_page_range)]
    pages: Option<PageRange>,

    /// Fixed viewport scale factor
    #[arg(long, conflicts_with_all = ["fit_width", "fit_height"])]
    scale: Option<f32>,

    /// Scale every page to this width in pixels
    #[arg(long, conflicts_with = "fit_height")]
    fit_width: Option<f32>,

    /// Scale every page to this height in pixels
    #[arg(long)]
    fit_height: Option<f32>,

    /// Renderers to run after the JSON renderer, in order
    #[arg(long, value_delimiter = ',', default_value = "raster,svg")]
    renderers: Vec<String>,

    /// Raster image format
    #[arg(long, value_enum, default_value_t = RasterFormat::Png)]
    format: RasterFormat,

    /// Do not draw annotations into rendered bitmaps
    #[arg(long)]
    no_annotations: bool,
}

fn parse_page_range(range: &str) -> Result<PageRange, String> {
    range.parse().map_err(|e: pdf_extractor::Error| e.to_string())
}

impl Cli {
    fn page_range(&self) -> PageRange {
        match (self.pages, self.page_limit) {
            (Some(range), _) => range,
            (None, Some(0)) | (None, None) => PageRange::all(),
            (None, Some(limit)) => PageRange::new(1, limit),
        }
    }

    fn viewport_scale(&self) -> ViewportScale {
        if let Some(width) = self.fit_width {
            ViewportScale::fit_width(width)
        } else if let Some(height) = self.fit_height {
            ViewportScale::fit_height(height)
        } else {
            self.scale.map(ViewportScale::Fixed).unwrap_or_default()
        }
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            raster_format: self.format,
            render_annotations: !self.no_annotations,
            ..RenderOptions::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_extractor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tokio::fs::create_dir_all(&cli.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", cli.output_dir.display()))?;

    let data = tokio::fs::read(&cli.pdf)
        .await
        .with_context(|| format!("Failed to read {}", cli.pdf.display()))?;
    let hash = format!("{:x}", md5::compute(&data));
    tracing::info!(
        input = %cli.pdf.display(),
        output = %cli.output_dir.display(),
        md5 = %hash,
        "Starting extraction"
    );

    let config = RendererConfig {
        output_dir: cli.output_dir.clone(),
        viewport_scale: cli.viewport_scale(),
        options: cli.render_options(),
    };
    let renderers = cli
        .renderers
        .iter()
        .map(|name| {
            renderer_by_name(name.trim(), &config)
                .with_context(|| format!("Unknown renderer: {}", name))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let options = ExtractorOptions::default()
        .with_page_range(cli.page_range())
        .with_viewport_scale(config.viewport_scale.clone())
        .with_render_options(config.options.clone())
        .with_renderers(renderers);

    let mut extractor = PdfExtractor::new(&cli.output_dir, options)?;
    extractor.parse_from_bytes(data).await?;

    println!("# End of Document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("pdf-extractor").chain(args.iter().copied()))
    }

    #[test]
    fn test_page_limit() {
        assert_eq!(cli(&["in.pdf", "out", "3"]).page_range(), PageRange::new(1, 3));
        assert_eq!(cli(&["in.pdf", "out", "0"]).page_range(), PageRange::all());
        assert_eq!(cli(&["in.pdf"]).page_range(), PageRange::all());
    }

    #[test]
    fn test_pages_flag() {
        let cli = cli(&["in.pdf", "--pages", "2-5"]);
        assert_eq!(cli.page_range(), PageRange::new(2, 5));
        assert_eq!(cli.output_dir, PathBuf::from("."));
    }
}

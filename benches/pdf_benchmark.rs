//! Performance benchmarks for the PDF extractor
//!
//! Run with: `cargo bench`
//!
//! Runs the extraction pipeline over an in-memory document so the numbers
//! reflect orchestration and renderer cost rather than PDF decoding.

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{DynamicImage, Rgba, RgbaImage};
use pdf_extractor::pdf::{
    Annotation, BitmapOptions, Destination, DocumentHandle, OutlineItem, PageHandle, PageSize,
    PdfMetaData, TextItem,
};
use pdf_extractor::{ExtractorOptions, PdfExtractor, RenderOptions, Result, ViewportScale};
use std::collections::BTreeMap;

struct SyntheticPage {
    number: u32,
}

#[async_trait(?Send)]
impl PageHandle for SyntheticPage {
    fn number(&self) -> u32 {
        self.number
    }

    fn size(&self) -> PageSize {
        PageSize {
            width: 612.0,
            height: 792.0,
            rotation: 0,
        }
    }

    async fn text_content(&self) -> Result<Vec<TextItem>> {
        Ok((0..50)
            .map(|line| TextItem {
                text: format!("Line {} of page {}", line, self.number),
                x: 72.0,
                y: 72.0 + line as f32 * 12.0,
                width: 200.0,
                height: 10.0,
            })
            .collect())
    }

    async fn annotations(&self) -> Result<Vec<Annotation>> {
        Ok(Vec::new())
    }

    async fn render_bitmap(&self, scale: f32, _options: BitmapOptions) -> Result<DynamicImage> {
        let viewport = self.viewport(scale);
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            viewport.pixel_width(),
            viewport.pixel_height(),
            Rgba([255, 255, 255, 255]),
        )))
    }
}

struct SyntheticDocument {
    num_pages: u32,
}

#[async_trait(?Send)]
impl DocumentHandle for SyntheticDocument {
    fn num_pages(&self) -> u32 {
        self.num_pages
    }

    async fn page<'a>(&'a self, number: u32) -> Result<Box<dyn PageHandle + 'a>> {
        Ok(Box::new(SyntheticPage { number }))
    }

    async fn metadata(&self) -> Result<PdfMetaData> {
        Ok(PdfMetaData::default())
    }

    async fn outline(&self) -> Result<Option<Vec<OutlineItem>>> {
        Ok(None)
    }

    async fn page_labels(&self) -> Result<Option<Vec<String>>> {
        Ok(None)
    }

    async fn destinations(&self) -> Result<BTreeMap<String, Destination>> {
        Ok(BTreeMap::new())
    }
}

/// Benchmark the JSON-only pipeline for growing page counts
fn bench_json_pipeline(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create output dir");

    let mut group = c.benchmark_group("json_pipeline");
    for pages in [1, 10, 50] {
        let doc = SyntheticDocument { num_pages: pages };
        group.throughput(Throughput::Elements(pages as u64));
        group.bench_with_input(BenchmarkId::new("pages", pages), &doc, |b, doc| {
            b.iter(|| {
                let options = ExtractorOptions::default().with_renderers(Vec::new());
                let mut extractor = PdfExtractor::new(dir.path(), options).unwrap();
                let meta = tokio_test::block_on(extractor.parse_document(black_box(doc))).unwrap();
                black_box(meta);
            });
        });
    }
    group.finish();
}

/// Benchmark the default renderers (raster + SVG) at a small scale
fn bench_default_renderers(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create output dir");
    let doc = SyntheticDocument { num_pages: 5 };

    let mut group = c.benchmark_group("default_renderers");
    group.throughput(Throughput::Elements(5));

    for underlay in [false, true] {
        group.bench_function(format!("svg_underlay_{}", underlay), |b| {
            b.iter(|| {
                let options = ExtractorOptions::default()
                    .with_viewport_scale(ViewportScale::Fixed(0.5))
                    .with_render_options(RenderOptions {
                        svg_raster_underlay: underlay,
                        ..RenderOptions::default()
                    });
                let mut extractor = PdfExtractor::new(dir.path(), options).unwrap();
                let meta = tokio_test::block_on(extractor.parse_document(black_box(&doc))).unwrap();
                black_box(meta);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_json_pipeline, bench_default_renderers);
criterion_main!(benches);

//! Raster output: `page-<n>.png` or `page-<n>.jpg`

use super::{page_file_name, Renderer, RendererConfig};
use crate::config::RasterFormat;
use crate::error::{Error, Result};
use crate::metadata::MetaDataHandler;
use crate::pdf::PageHandle;
use async_trait::async_trait;
use image::DynamicImage;
use std::io::Cursor;

/// Encode a bitmap in the given format.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn encode_image(image: &DynamicImage, format: RasterFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    match format {
        RasterFormat::Png => image.write_to(&mut buffer, format.image_format())?,
        RasterFormat::Jpeg => {
            DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut buffer, format.image_format())?
        }
    }
    Ok(buffer.into_inner())
}

/// Rasterizes each page at its viewport scale
pub struct RasterRenderer {
    config: RendererConfig,
}

impl RasterRenderer {
    pub const NAME: &'static str = "raster";

    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }
}

#[async_trait(?Send)]
impl Renderer for RasterRenderer {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn render_page(
        &mut self,
        page: &dyn PageHandle,
        meta: &mut MetaDataHandler,
    ) -> Result<()> {
        let number = page.number();
        let viewport = self.config.viewport(page);
        let format = self.config.options.raster_format;

        let bitmap = page
            .render_bitmap(viewport.scale, self.config.options.bitmap_options())
            .await?;
        let bytes = encode_image(&bitmap, format)?;

        let file_name = page_file_name(number, format.extension());
        tokio::fs::write(self.config.output_dir.join(&file_name), bytes).await?;

        let entry = meta.page_mut(number).ok_or_else(|| {
            Error::renderer(format!("no metadata entry for page {}", number))
        })?;
        entry.attach(Self::NAME, file_name);

        tracing::debug!(
            page = number,
            width = bitmap.width(),
            height = bitmap.height(),
            "Page rasterized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([255, 0, 0, 128])))
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_image(&sample(), RasterFormat::Png).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let bytes = encode_image(&sample(), RasterFormat::Jpeg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }
}

//! Vector output: `page-<n>.svg` per page and a combined `document.svg`

use super::raster::encode_image;
use super::{page_file_name, Renderer, RendererConfig};
use crate::config::RasterFormat;
use crate::error::{Error, Result};
use crate::metadata::MetaDataHandler;
use crate::pdf::{
    Annotation, Color, DocumentHandle, FillRule, Graphic, ImageGraphic, PageHandle, PageSize,
    PathCommand, PathGraphic, TextItem, Viewport,
};
use async_trait::async_trait;
use base64::Engine;
use image::DynamicImage;
use tokio::io::AsyncWriteExt;

/// File name of the combined multi-page document
pub const DOCUMENT_FILE_NAME: &str = "document.svg";

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Vertical gap between pages in the combined document, in pixels
const PAGE_GAP: f32 = 10.0;

/// Format a coordinate with at most two decimals
fn num(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        // Avoid "-0"
        return "0".to_string();
    }
    format!("{}", rounded)
}

fn attr(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}

/// Transform from unscaled, unrotated page space to viewport space
fn page_transform(size: PageSize, scale: f32) -> String {
    let (w, h) = (num(size.width), num(size.height));
    let rotate = match size.rotation {
        90 => format!(" matrix(0 1 -1 0 {} 0)", h),
        180 => format!(" matrix(-1 0 0 -1 {} {})", w, h),
        270 => format!(" matrix(0 -1 1 0 0 {})", w),
        _ => String::new(),
    };
    format!("scale({}){}", num(scale), rotate)
}

/// Internal links point at the page anchors of the combined document, so the
/// same markup works in `page-<n>.svg` and inside `document.svg`
fn page_href(page: u32) -> String {
    format!("{}#page-{}", DOCUMENT_FILE_NAME, page)
}

fn png_data_uri(image: &DynamicImage) -> Result<String> {
    let png = encode_image(image, RasterFormat::Png)?;
    Ok(format!(
        "data:{};base64,{}",
        RasterFormat::Png.mime_type(),
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}

/// `d` attribute of a path
fn path_data(commands: &[PathCommand]) -> String {
    commands
        .iter()
        .map(|command| match *command {
            PathCommand::MoveTo { x, y } => format!("M{} {}", num(x), num(y)),
            PathCommand::LineTo { x, y } => format!("L{} {}", num(x), num(y)),
            PathCommand::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => format!(
                "C{} {} {} {} {} {}",
                num(x1),
                num(y1),
                num(x2),
                num(y2),
                num(x),
                num(y)
            ),
            PathCommand::Close => "Z".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `fill="..."` or `stroke="..."`, plus an opacity attribute for translucent colors
fn paint(property: &str, color: Option<Color>) -> String {
    match color {
        None => format!("{}=\"none\"", property),
        Some(c) if c.a < u8::MAX => format!(
            "{}=\"#{:02x}{:02x}{:02x}\" {}-opacity=\"{}\"",
            property,
            c.r,
            c.g,
            c.b,
            property,
            num(c.a as f32 / 255.0)
        ),
        Some(c) => format!("{}=\"#{:02x}{:02x}{:02x}\"", property, c.r, c.g, c.b),
    }
}

fn path_element(path: &PathGraphic) -> String {
    let mut out = format!(
        "<path d=\"{}\" {}",
        path_data(&path.commands),
        paint("fill", path.fill)
    );
    if path.fill.is_some() && path.fill_rule == FillRule::EvenOdd {
        out.push_str(" fill-rule=\"evenodd\"");
    }
    out.push(' ');
    out.push_str(&paint("stroke", path.stroke));
    if path.stroke.is_some() {
        out.push_str(&format!(" stroke-width=\"{}\"", num(path.stroke_width.max(0.01))));
    }
    out.push_str("/>\n");
    out
}

fn image_element(image: &ImageGraphic) -> Result<String> {
    let [a, b, c, d, e, f] = image.transform;
    // The inner flip puts the first image row at the top of the unit square
    Ok(format!(
        "<image width=\"1\" height=\"1\" preserveAspectRatio=\"none\" transform=\"matrix({} {} {} {} {} {}) matrix(1 0 0 -1 0 1)\" xlink:href=\"{}\"/>\n",
        a,
        b,
        c,
        d,
        num(e),
        num(f),
        png_data_uri(&image.image)?
    ))
}

/// Everything needed to draw one page
struct PageFragment {
    number: u32,
    size: PageSize,
    viewport: Viewport,
    underlay: Option<String>,
    graphics: Vec<Graphic>,
    text: Vec<TextItem>,
    annotations: Vec<Annotation>,
}

impl PageFragment {
    /// Page content as a `<g>` element, without the enclosing `<svg>`
    fn body(&self, text_visible: bool) -> Result<String> {
        let mut out = format!("<g id=\"page-{}\">\n", self.number);

        if let Some(href) = &self.underlay {
            out.push_str(&format!(
                "<image x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" xlink:href=\"{}\"/>\n",
                num(self.viewport.width),
                num(self.viewport.height),
                href
            ));
        }

        out.push_str(&format!(
            "<g transform=\"{}\">\n",
            page_transform(self.size, self.viewport.scale)
        ));

        if !self.graphics.is_empty() {
            out.push_str("<g class=\"graphics\">\n");
            for graphic in &self.graphics {
                match graphic {
                    Graphic::Path(path) => out.push_str(&path_element(path)),
                    Graphic::Image(image) => out.push_str(&image_element(image)?),
                }
            }
            out.push_str("</g>\n");
        }

        if !self.text.is_empty() {
            let fill = if text_visible {
                "fill=\"#000\""
            } else {
                "fill=\"#000\" fill-opacity=\"0\""
            };
            out.push_str(&format!("<g class=\"text\" {}>\n", fill));
            for item in &self.text {
                out.push_str(&format!(
                    "<text x=\"{}\" y=\"{}\" font-size=\"{}\" textLength=\"{}\" lengthAdjust=\"spacingAndGlyphs\" dominant-baseline=\"hanging\">{}</text>\n",
                    num(item.x),
                    num(item.y),
                    num(item.height.max(1.0)),
                    num(item.width.max(0.01)),
                    html_escape::encode_text(&item.text)
                ));
            }
            out.push_str("</g>\n");
        }

        for annotation in &self.annotations {
            let Some([x0, y0, x1, y1]) = annotation.rect else {
                continue;
            };
            let rect = format!(
                "<rect class=\"annotation {}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"none\" pointer-events=\"all\">",
                attr(&annotation.subtype),
                num(x0.min(x1)),
                num(y0.min(y1)),
                num((x1 - x0).abs()),
                num((y1 - y0).abs())
            );
            let title = annotation
                .contents
                .as_deref()
                .map(|c| format!("<title>{}</title>", html_escape::encode_text(c)))
                .unwrap_or_default();
            let href = annotation
                .url
                .clone()
                .or_else(|| annotation.dest_page.map(page_href));

            match href {
                Some(href) => out.push_str(&format!(
                    "<a xlink:href=\"{}\">{}{}</rect></a>\n",
                    attr(&href),
                    rect,
                    title
                )),
                None => out.push_str(&format!("{}{}</rect>\n", rect, title)),
            }
        }

        out.push_str("</g>\n</g>\n");
        Ok(out)
    }

    /// Standalone `page-<n>.svg`
    fn document(&self, text_visible: bool) -> Result<String> {
        let (w, h) = (num(self.viewport.width), num(self.viewport.height));
        Ok(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg xmlns=\"{}\" xmlns:xlink=\"{}\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n{}</svg>\n",
            SVG_NS,
            XLINK_NS,
            w,
            h,
            w,
            h,
            self.body(text_visible)?
        ))
    }
}

/// Turn a standalone page SVG into a nested `<svg>` placed at `y`
fn nest_page(page_svg: &str, y: f32) -> Result<String> {
    let start = page_svg
        .find("<svg ")
        .ok_or_else(|| Error::renderer("page SVG has no root element"))?;
    let rest = &page_svg[start + "<svg ".len()..];
    let mut nested = format!("<svg x=\"0\" y=\"{}\" {}", num(y), rest);
    if !nested.ends_with('\n') {
        nested.push('\n');
    }
    Ok(nested)
}

/// Size of the combined document for pages stacked with [`PAGE_GAP`]
fn stacked_size(viewports: &[Viewport]) -> (f32, f32) {
    let width = viewports.iter().map(|v| v.width).fold(0.0_f32, f32::max);
    let height = viewports.iter().map(|v| v.height).sum::<f32>()
        + PAGE_GAP * viewports.len().saturating_sub(1) as f32;
    (width, height)
}

/// Writes an SVG per page and, at the end of the run, a combined document
///
/// Paths and images become `<path>` and `<image>` elements, text becomes
/// real `<text>` elements and links become clickable areas. With the raster
/// underlay enabled the page bitmap is embedded beneath them and the text
/// is kept transparent so it stays selectable.
///
/// The renderer keeps no state between calls. `document.svg` is assembled
/// from the page files this run recorded in the metadata, one page at a time.
pub struct SvgRenderer {
    config: RendererConfig,
}

impl SvgRenderer {
    pub const NAME: &'static str = "svg";

    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    fn text_visible(&self) -> bool {
        !self.config.options.svg_raster_underlay
    }
}

#[async_trait(?Send)]
impl Renderer for SvgRenderer {
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
        let options = &self.config.options;

        let underlay = if options.svg_raster_underlay {
            let bitmap = page
                .render_bitmap(viewport.scale, options.bitmap_options())
                .await?;
            Some(png_data_uri(&bitmap)?)
        } else {
            None
        };

        let text = if options.svg_text_layer {
            page.text_content().await?
        } else {
            Vec::new()
        };

        let fragment = PageFragment {
            number,
            size: page.size(),
            viewport,
            underlay,
            graphics: page.graphics().await?,
            text,
            annotations: page.annotations().await?,
        };

        let file_name = page_file_name(number, "svg");
        tokio::fs::write(
            self.config.output_dir.join(&file_name),
            fragment.document(self.text_visible())?,
        )
        .await?;

        let entry = meta.page_mut(number).ok_or_else(|| {
            Error::renderer(format!("no metadata entry for page {}", number))
        })?;
        entry.attach(Self::NAME, file_name);

        tracing::debug!(page = number, graphics = fragment.graphics.len(), "Page SVG written");
        Ok(())
    }

    async fn render_document(
        &mut self,
        _doc: &dyn DocumentHandle,
        meta: &mut MetaDataHandler,
    ) -> Result<()> {
        let pages: Vec<(&str, Viewport)> = meta
            .pages()
            .iter()
            .filter_map(|entry| {
                entry
                    .artifacts
                    .get(Self::NAME)
                    .map(|file| (file.as_str(), entry.viewport))
            })
            .collect();
        let viewports: Vec<Viewport> = pages.iter().map(|(_, viewport)| *viewport).collect();
        let (width, height) = stacked_size(&viewports);

        let path = self.config.output_dir.join(DOCUMENT_FILE_NAME);
        let mut out = tokio::io::BufWriter::new(tokio::fs::File::create(&path).await?);
        let (w, h) = (num(width), num(height));
        out.write_all(
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg xmlns=\"{}\" xmlns:xlink=\"{}\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n",
                SVG_NS, XLINK_NS, w, h, w, h
            )
            .as_bytes(),
        )
        .await?;

        let mut y = 0.0_f32;
        for (file, viewport) in &pages {
            let page_svg = tokio::fs::read_to_string(self.config.output_dir.join(file)).await?;
            out.write_all(nest_page(&page_svg, y)?.as_bytes()).await?;
            y += viewport.height + PAGE_GAP;
        }

        out.write_all(b"</svg>\n").await?;
        out.flush().await?;

        tracing::debug!(pages = pages.len(), path = %path.display(), "SVG document written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn fragment(number: u32, rotation: i32) -> PageFragment {
        let size = PageSize {
            width: 200.0,
            height: 100.0,
            rotation,
        };
        PageFragment {
            number,
            size,
            viewport: Viewport::new(size, 2.0),
            underlay: None,
            graphics: Vec::new(),
            text: vec![TextItem {
                text: "a < b & c".to_string(),
                x: 10.0,
                y: 20.0,
                width: 30.0,
                height: 12.0,
            }],
            annotations: vec![Annotation {
                subtype: "link".to_string(),
                rect: Some([0.0, 0.0, 50.0, 10.0]),
                contents: None,
                url: None,
                dest_page: Some(2),
            }],
        }
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(918.0), "918");
        assert_eq!(num(1.23456), "1.23");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn test_page_document_escapes_text() {
        let svg = fragment(1, 0).document(true).unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("width=\"400\" height=\"200\""));
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.contains("xlink:href=\"document.svg#page-2\""));
    }

    #[test]
    fn test_rotated_page_transform() {
        let size = PageSize {
            width: 200.0,
            height: 100.0,
            rotation: 90,
        };
        assert_eq!(page_transform(size, 1.5), "scale(1.5) matrix(0 1 -1 0 100 0)");
        let svg = fragment(1, 90).document(true).unwrap();
        assert!(svg.contains("width=\"200\" height=\"400\""));
    }

    #[test]
    fn test_path_data_and_paint() {
        let path = PathGraphic {
            commands: vec![
                PathCommand::MoveTo { x: 10.0, y: 20.0 },
                PathCommand::LineTo { x: 30.5, y: 20.0 },
                PathCommand::CurveTo {
                    x1: 30.5,
                    y1: 40.0,
                    x2: 10.0,
                    y2: 40.0,
                    x: 10.0,
                    y: 20.0,
                },
                PathCommand::Close,
            ],
            fill: Some(Color {
                r: 255,
                g: 0,
                b: 0,
                a: 128,
            }),
            fill_rule: FillRule::EvenOdd,
            stroke: None,
            stroke_width: 1.0,
        };

        assert_eq!(
            path_element(&path),
            "<path d=\"M10 20 L30.5 20 C30.5 40 10 40 10 20 Z\" fill=\"#ff0000\" fill-opacity=\"0.5\" fill-rule=\"evenodd\" stroke=\"none\"/>\n"
        );
    }

    #[test]
    fn test_graphics_are_drawn_in_page_space() {
        let mut page = fragment(1, 0);
        page.graphics = vec![
            Graphic::Path(PathGraphic {
                commands: vec![
                    PathCommand::MoveTo { x: 0.0, y: 0.0 },
                    PathCommand::LineTo { x: 100.0, y: 50.0 },
                ],
                fill: None,
                fill_rule: FillRule::NonZero,
                stroke: Some(Color {
                    r: 0,
                    g: 0,
                    b: 255,
                    a: 255,
                }),
                stroke_width: 2.0,
            }),
            Graphic::Image(ImageGraphic {
                transform: [50.0, 0.0, 0.0, -25.0, 10.0, 60.0],
                image: DynamicImage::ImageRgba8(RgbaImage::new(2, 2)),
            }),
        ];

        let svg = page.document(true).unwrap();
        assert!(svg.contains("<path d=\"M0 0 L100 50\" fill=\"none\" stroke=\"#0000ff\" stroke-width=\"2\"/>"));
        assert!(svg.contains(
            "transform=\"matrix(50 0 0 -25 10 60) matrix(1 0 0 -1 0 1)\" xlink:href=\"data:image/png;base64,"
        ));
        assert!(svg.find("class=\"graphics\"") < svg.find("class=\"text\""));
    }

    #[test]
    fn test_nest_page_places_page_below_previous() {
        let page_svg = fragment(2, 0).document(false).unwrap();
        let nested = nest_page(&page_svg, 210.0).unwrap();
        assert!(nested.starts_with("<svg x=\"0\" y=\"210\" xmlns="));
        assert!(!nested.contains("<?xml"));
        assert!(nested.contains("<g id=\"page-2\">"));
        assert!(nested.contains("fill-opacity=\"0\""));

        assert!(nest_page("<g/>", 0.0).is_err());
    }

    #[test]
    fn test_stacked_size() {
        let size = PageSize {
            width: 200.0,
            height: 100.0,
            rotation: 0,
        };
        let wide = Viewport::new(size, 2.0);
        let narrow = Viewport::new(size, 1.0);
        assert_eq!(stacked_size(&[wide, narrow]), (400.0, 310.0));
        assert_eq!(stacked_size(&[]), (0.0, 0.0));
    }
}

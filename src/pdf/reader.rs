//! PDFium-backed document and page handles

use crate::error::{Error, Result};
use crate::pdf::catalog;
use crate::pdf::document::{
    Annotation, BitmapOptions, Color, Destination, DocumentHandle, FillRule, Graphic,
    ImageGraphic, OutlineItem, PageHandle, PageSize, PathCommand, PathGraphic, PdfMetaData,
    TextItem,
};
use crate::pdf::engine;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Map PDFium errors to our error type
fn map_pdfium_error(err: PdfiumError) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            Error::PasswordRequired
        }
        _ => Error::Pdfium {
            reason: format!("{}", err),
        },
    }
}

/// Convert PdfPageAnnotationType to string
fn annotation_type_to_string(ann_type: PdfPageAnnotationType) -> String {
    match ann_type {
        PdfPageAnnotationType::Text => "text",
        PdfPageAnnotationType::Link => "link",
        PdfPageAnnotationType::FreeText => "freetext",
        PdfPageAnnotationType::Line => "line",
        PdfPageAnnotationType::Square => "square",
        PdfPageAnnotationType::Circle => "circle",
        PdfPageAnnotationType::Polygon => "polygon",
        PdfPageAnnotationType::Polyline => "polyline",
        PdfPageAnnotationType::Highlight => "highlight",
        PdfPageAnnotationType::Underline => "underline",
        PdfPageAnnotationType::Squiggly => "squiggly",
        PdfPageAnnotationType::Strikeout => "strikeout",
        PdfPageAnnotationType::Stamp => "stamp",
        PdfPageAnnotationType::Caret => "caret",
        PdfPageAnnotationType::Ink => "ink",
        PdfPageAnnotationType::Popup => "popup",
        PdfPageAnnotationType::FileAttachment => "fileattachment",
        PdfPageAnnotationType::Sound => "sound",
        PdfPageAnnotationType::Movie => "movie",
        PdfPageAnnotationType::Widget => "widget",
        PdfPageAnnotationType::Screen => "screen",
        PdfPageAnnotationType::PrinterMark => "printermark",
        PdfPageAnnotationType::TrapNet => "trapnet",
        PdfPageAnnotationType::Watermark => "watermark",
        PdfPageAnnotationType::ThreeD => "threed",
        PdfPageAnnotationType::RichMedia => "richmedia",
        PdfPageAnnotationType::XfaWidget => "xfawidget",
        PdfPageAnnotationType::Redacted => "redacted",
        PdfPageAnnotationType::Unknown => "unknown",
    }
    .to_string()
}

/// Check the file header before handing bytes to the engine
pub fn check_pdf_header(data: &[u8]) -> Result<()> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }
    Ok(())
}

/// Document opened with PDFium for page access and lopdf for structure reads
pub struct PdfiumDocument {
    document: PdfDocument<'static>,
    structure: lopdf::Document,
    page_count: u32,
}

impl PdfiumDocument {
    /// Open a PDF from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::InvalidPdf {
                reason: format!("PDF not found: {}", path.display()),
            });
        }

        let data = std::fs::read(path)?;
        Self::open_bytes(data)
    }

    /// Open a PDF from bytes, installing the PDFium binding if needed
    pub fn open_bytes(data: Vec<u8>) -> Result<Self> {
        check_pdf_header(&data)?;

        let pdfium = engine::install()?;

        let structure = catalog::load(&data).map_err(|e| Error::DocumentLoad {
            reason: format!("Failed to parse document structure: {}", e),
        })?;

        let document = pdfium
            .load_pdf_from_byte_vec(data, None)
            .map_err(map_pdfium_error)?;

        let page_count = document.pages().len() as u32;
        tracing::debug!(page_count, "Document loaded");

        Ok(Self {
            document,
            structure,
            page_count,
        })
    }
}

#[async_trait(?Send)]
impl DocumentHandle for PdfiumDocument {
    fn num_pages(&self) -> u32 {
        self.page_count
    }

    async fn page<'a>(&'a self, number: u32) -> Result<Box<dyn PageHandle + 'a>> {
        if number < 1 || number > self.page_count {
            return Err(Error::PageOutOfBounds {
                page: number,
                total: self.page_count,
            });
        }

        let page = self
            .document
            .pages()
            .get((number - 1) as u16)
            .map_err(|e| Error::Pdfium {
                reason: format!("Failed to get page {}: {}", number, e),
            })?;

        Ok(Box::new(PdfiumPage::new(number, page, &self.document)))
    }

    async fn metadata(&self) -> Result<PdfMetaData> {
        catalog::metadata(&self.structure)
    }

    async fn outline(&self) -> Result<Option<Vec<OutlineItem>>> {
        catalog::outline(&self.structure)
    }

    async fn page_labels(&self) -> Result<Option<Vec<String>>> {
        catalog::page_labels(&self.structure, self.page_count)
    }

    async fn destinations(&self) -> Result<BTreeMap<String, Destination>> {
        catalog::destinations(&self.structure)
    }
}

/// Convert a PDFium color
fn color_of(color: PdfColor) -> Color {
    Color {
        r: color.red(),
        g: color.green(),
        b: color.blue(),
        a: color.alpha(),
    }
}

/// A page fetched from a [`PdfiumDocument`]
pub struct PdfiumPage<'a> {
    number: u32,
    page: PdfPage<'a>,
    document: &'a PdfDocument<'static>,
    size: PageSize,
}

impl<'a> PdfiumPage<'a> {
    fn new(number: u32, page: PdfPage<'a>, document: &'a PdfDocument<'static>) -> Self {
        let rotation = match page.rotation() {
            Ok(rot) => match rot {
                PdfPageRenderRotation::None => 0,
                PdfPageRenderRotation::Degrees90 => 90,
                PdfPageRenderRotation::Degrees180 => 180,
                PdfPageRenderRotation::Degrees270 => 270,
            },
            Err(_) => 0,
        };

        // PDFium reports the rotated size; keep the unrotated one so that
        // object coordinates and the viewport agree
        let (width, height) = (page.width().value, page.height().value);
        let (width, height) = if rotation == 90 || rotation == 270 {
            (height, width)
        } else {
            (width, height)
        };
        let size = PageSize {
            width,
            height,
            rotation,
        };

        Self {
            number,
            page,
            document,
            size,
        }
    }

    /// Outline and paint of a path object, `None` when it paints nothing
    fn path_graphic(&self, path: &PdfPagePathObject) -> Option<PathGraphic> {
        let fill_rule = match path.fill_mode().unwrap_or(PdfPathFillMode::None) {
            PdfPathFillMode::None => None,
            PdfPathFillMode::EvenOdd => Some(FillRule::EvenOdd),
            PdfPathFillMode::Winding => Some(FillRule::NonZero),
        };
        let stroked = path.is_stroked().unwrap_or(false);
        if fill_rule.is_none() && !stroked {
            return None;
        }

        let matrix = path.matrix().ok()?;
        let height = self.size.height;
        let segments = path.segments().transform(matrix);

        let mut commands = Vec::new();
        let mut controls = Vec::with_capacity(2);
        for segment in segments.iter() {
            let (x, y) = segment.point();
            let (x, y) = (x.value, height - y.value);
            match segment.segment_type() {
                PdfPathSegmentType::MoveTo => {
                    controls.clear();
                    commands.push(PathCommand::MoveTo { x, y });
                }
                PdfPathSegmentType::LineTo => {
                    controls.clear();
                    commands.push(PathCommand::LineTo { x, y });
                }
                // Two control points followed by the end point
                PdfPathSegmentType::BezierTo => {
                    if controls.len() < 2 {
                        controls.push((x, y));
                        continue;
                    }
                    let ((x1, y1), (x2, y2)) = (controls[0], controls[1]);
                    controls.clear();
                    commands.push(PathCommand::CurveTo {
                        x1,
                        y1,
                        x2,
                        y2,
                        x,
                        y,
                    });
                }
                PdfPathSegmentType::Unknown => continue,
            }
            if segment.is_close() {
                commands.push(PathCommand::Close);
            }
        }
        if commands.is_empty() {
            return None;
        }

        let fill = fill_rule
            .and_then(|_| path.fill_color().ok())
            .map(color_of);
        let stroke = stroked
            .then(|| path.stroke_color().ok())
            .flatten()
            .map(color_of);
        let scale = (matrix.a() * matrix.d() - matrix.b() * matrix.c()).abs().sqrt();
        let stroke_width = path.stroke_width().map(|w| w.value).unwrap_or(1.0) * scale;

        Some(PathGraphic {
            commands,
            fill,
            fill_rule: fill_rule.unwrap_or_default(),
            stroke,
            stroke_width,
        })
    }

    fn image_graphic(&self, image_object: &PdfPageImageObject) -> Result<ImageGraphic> {
        let matrix = image_object.matrix().map_err(map_pdfium_error)?;
        let image = image_object
            .get_processed_image(self.document)
            .or_else(|_| image_object.get_raw_image())
            .map_err(map_pdfium_error)?;

        Ok(ImageGraphic {
            transform: [
                matrix.a(),
                -matrix.b(),
                matrix.c(),
                -matrix.d(),
                matrix.e(),
                self.size.height - matrix.f(),
            ],
            image,
        })
    }

    /// Flip a PDF rect (bottom-left origin) to `[x0, y0, x1, y1]` with a top-left origin
    fn flip_rect(&self, rect: &PdfRect) -> [f32; 4] {
        let height = self.size.height;
        [
            rect.left().value,
            height - rect.top().value,
            rect.right().value,
            height - rect.bottom().value,
        ]
    }
}

#[async_trait(?Send)]
impl PageHandle for PdfiumPage<'_> {
    fn number(&self) -> u32 {
        self.number
    }

    fn size(&self) -> PageSize {
        self.size
    }

    async fn text_content(&self) -> Result<Vec<TextItem>> {
        let text = match self.page.text() {
            Ok(t) => t,
            Err(_) => return Ok(Vec::new()),
        };

        let items = text
            .segments()
            .iter()
            .filter_map(|segment| {
                let content = segment.text();
                if content.trim().is_empty() {
                    return None;
                }
                let bounds = segment.bounds();
                let [x, y, _, _] = self.flip_rect(&bounds);
                Some(TextItem {
                    text: content,
                    x,
                    y,
                    width: bounds.width().value,
                    height: bounds.height().value,
                })
            })
            .collect();

        Ok(items)
    }

    async fn annotations(&self) -> Result<Vec<Annotation>> {
        // Link targets come from the page's link collection, in the same
        // order as the link annotations they belong to.
        let mut link_targets = Vec::new();
        for link in self.page.links().iter() {
            let mut url = None;
            let mut dest_page = None;

            if let Some(action) = link.action() {
                if action.action_type() == PdfActionType::Uri {
                    if let Some(uri_action) = action.as_uri_action() {
                        url = uri_action.uri().ok();
                    }
                }
            }

            if url.is_none() {
                if let Some(dest) = link.destination() {
                    if let Ok(page_idx) = dest.page_index() {
                        dest_page = Some(page_idx as u32 + 1);
                    }
                }
            }

            link_targets.push((url, dest_page));
        }
        let mut link_targets = link_targets.into_iter();

        let mut annotations = Vec::new();
        for annotation in self.page.annotations().iter() {
            let ann_type = annotation.annotation_type();

            // Popups belong to other annotations
            if ann_type == PdfPageAnnotationType::Popup {
                continue;
            }

            let (url, dest_page) = if ann_type == PdfPageAnnotationType::Link {
                link_targets.next().unwrap_or((None, None))
            } else {
                (None, None)
            };

            annotations.push(Annotation {
                subtype: annotation_type_to_string(ann_type),
                rect: annotation.bounds().ok().map(|rect| self.flip_rect(&rect)),
                contents: annotation.contents().filter(|s| !s.is_empty()),
                url,
                dest_page,
            });
        }

        Ok(annotations)
    }

    async fn render_bitmap(&self, scale: f32, options: BitmapOptions) -> Result<DynamicImage> {
        let config = PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .render_form_data(options.render_form_data)
            .render_annotations(options.render_annotations);

        let bitmap = self
            .page
            .render_with_config(&config)
            .map_err(|e| Error::Pdfium {
                reason: format!("Failed to render page {}: {}", self.number, e),
            })?;

        Ok(bitmap.as_image())
    }

    async fn graphics(&self) -> Result<Vec<Graphic>> {
        let mut graphics = Vec::new();

        for object in self.page.objects().iter() {
            if let Some(path) = object.as_path_object() {
                if let Some(graphic) = self.path_graphic(path) {
                    graphics.push(Graphic::Path(graphic));
                }
            } else if let Some(image_object) = object.as_image_object() {
                match self.image_graphic(image_object) {
                    Ok(graphic) => graphics.push(Graphic::Image(graphic)),
                    Err(e) => {
                        tracing::debug!(page = self.number, error = %e, "Skipping unreadable image");
                    }
                }
            }
        }

        Ok(graphics)
    }
}

//! PDF drawing surface.
//!
//! The layout engine talks to the [`PdfSurface`] trait only: place text
//! cells, place raster images, start pages, move the cursor. The concrete
//! [`LopdfSurface`] turns those calls into PDF content streams with lopdf.
//!
//! All coordinates are millimetres from the top-left corner of the page.

use std::collections::HashMap;
use std::io::Write;

use chrono::{DateTime, Utc};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as LopdfDocument, Object, ObjectId, Stream, StringFormat};

use crate::error::{Error, Result};

use super::raster::RasterImage;

/// Points per millimetre.
const PT_PER_MM: f32 = 72.0 / 25.4;

/// Horizontal padding inside a cell, in mm.
const CELL_MARGIN: f32 = 1.0;

/// A4 portrait, in mm.
pub const A4: (f32, f32) = (210.0, 297.0);

/// Font face used for text cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

impl FontStyle {
    const ALL: [FontStyle; 3] = [FontStyle::Regular, FontStyle::Bold, FontStyle::Italic];

    fn resource_name(&self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
            FontStyle::Italic => "F3",
        }
    }

    fn base_font(&self) -> &'static str {
        match self {
            FontStyle::Regular => "Helvetica",
            FontStyle::Bold => "Helvetica-Bold",
            FontStyle::Italic => "Helvetica-Oblique",
        }
    }
}

/// Document-level information written when the surface is finished.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub created: DateTime<Utc>,
}

/// Primitive PDF drawing operations used by the layout engine.
pub trait PdfSurface {
    /// Page size as (width, height) in mm.
    fn page_size(&self) -> (f32, f32);

    /// Left margin in mm; line breaks return the cursor here.
    fn left_margin(&self) -> f32;

    /// Start a new page and move the cursor to its top-left margin.
    fn add_page(&mut self) -> Result<()>;

    /// Current page number (1-indexed), 0 before the first page.
    fn page_no(&self) -> u32;

    /// Select the font for subsequent cells.
    fn set_font(&mut self, style: FontStyle, size_pt: f32);

    /// Current cursor position as (x, y).
    fn position(&self) -> (f32, f32);

    /// Move the cursor.
    fn set_xy(&mut self, x: f32, y: f32);

    /// Move the cursor to the left margin at `y`; negative values are
    /// measured from the bottom edge.
    fn set_y(&mut self, y: f32) {
        let y = if y < 0.0 { self.page_size().1 + y } else { y };
        let x = self.left_margin();
        self.set_xy(x, y);
    }

    /// Draw `text` in a cell at the cursor and advance the cursor right by
    /// `width`. A width of 0 extends the cell to the right margin.
    fn cell(&mut self, width: f32, height: f32, text: &str) -> Result<()>;

    /// Draw an image with its top-left corner at (x, y). With no height the
    /// aspect ratio is kept.
    fn image(
        &mut self,
        image: &RasterImage,
        x: f32,
        y: f32,
        width: f32,
        height: Option<f32>,
    ) -> Result<()>;

    /// Return the cursor to the left margin and move it down by `height`.
    fn line_break(&mut self, height: f32) {
        let (_, y) = self.position();
        let x = self.left_margin();
        self.set_xy(x, y + height);
    }

    /// Encode the finished document.
    fn finish(self, info: &DocumentInfo) -> Result<Vec<u8>>
    where
        Self: Sized;
}

/// [`PdfSurface`] producing a PDF with lopdf.
pub struct LopdfSurface {
    width: f32,
    height: f32,
    margin: f32,
    pages: Vec<Vec<Operation>>,
    images: Vec<(String, Stream)>,
    image_index: HashMap<String, usize>,
    font: FontStyle,
    font_size: f32,
    x: f32,
    y: f32,
}

impl LopdfSurface {
    /// A4 portrait surface with 10 mm margins.
    pub fn a4() -> Self {
        Self::new(A4.0, A4.1, 10.0)
    }

    /// Surface with the given page size and margin, in mm.
    pub fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin,
            pages: Vec::new(),
            images: Vec::new(),
            image_index: HashMap::new(),
            font: FontStyle::Regular,
            font_size: 12.0,
            x: margin,
            y: margin,
        }
    }

    fn ops(&mut self) -> Result<&mut Vec<Operation>> {
        self.pages
            .last_mut()
            .ok_or_else(|| Error::Layout("no page has been started".to_string()))
    }

    fn pdf_y(&self, y: f32) -> f32 {
        (self.height - y) * PT_PER_MM
    }

    /// Register an image XObject, returning its resource name.
    fn register_image(&mut self, image: &RasterImage) -> Result<String> {
        if let Some(&idx) = self.image_index.get(&image.key) {
            return Ok(image_resource_name(idx));
        }

        let expected = image.width as usize * image.height as usize * image.color_space.components();
        if image.pixels.len() != expected {
            return Err(Error::Layout(format!(
                "image {} has {} bytes, expected {}",
                image.key,
                image.pixels.len(),
                expected
            )));
        }

        let data = compress_pixels(image, Vec::new())?;

        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => image.color_space.pdf_name(),
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };

        let idx = self.images.len();
        self.images
            .push((image.key.clone(), Stream::new(dict, data).with_compression(false)));
        self.image_index.insert(image.key.clone(), idx);
        Ok(image_resource_name(idx))
    }
}

impl Default for LopdfSurface {
    fn default() -> Self {
        Self::a4()
    }
}

impl PdfSurface for LopdfSurface {
    fn page_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn left_margin(&self) -> f32 {
        self.margin
    }

    fn add_page(&mut self) -> Result<()> {
        self.pages.push(Vec::new());
        self.x = self.margin;
        self.y = self.margin;
        Ok(())
    }

    fn page_no(&self) -> u32 {
        self.pages.len() as u32
    }

    fn set_font(&mut self, style: FontStyle, size_pt: f32) {
        self.font = style;
        self.font_size = size_pt;
    }

    fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    fn set_xy(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    fn cell(&mut self, width: f32, height: f32, text: &str) -> Result<()> {
        let width = if width == 0.0 {
            self.width - self.margin - self.x
        } else {
            width
        };

        if !text.is_empty() {
            // Vertically centred baseline.
            let font_mm = self.font_size / PT_PER_MM;
            let baseline = self.y + 0.5 * height + 0.3 * font_mm;
            let tx = (self.x + CELL_MARGIN) * PT_PER_MM;
            let ty = self.pdf_y(baseline);
            let font = self.font;
            let size = self.font_size;

            self.ops()?.extend([
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(font.resource_name().as_bytes().to_vec()), size.into()],
                ),
                Operation::new("Td", vec![tx.into(), ty.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ]);
        }

        self.x += width;
        Ok(())
    }

    fn image(
        &mut self,
        image: &RasterImage,
        x: f32,
        y: f32,
        width: f32,
        height: Option<f32>,
    ) -> Result<()> {
        let height = height.unwrap_or_else(|| image.height_for_width(width));
        let name = self.register_image(image)?;
        let bottom = self.pdf_y(y + height);

        self.ops()?.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    (width * PT_PER_MM).into(),
                    0.into(),
                    0.into(),
                    (height * PT_PER_MM).into(),
                    (x * PT_PER_MM).into(),
                    bottom.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn finish(self, info: &DocumentInfo) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(Error::Layout("document has no pages".to_string()));
        }

        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = lopdf::Dictionary::new();
        for style in FontStyle::ALL {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => style.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(style.resource_name(), font_id);
        }

        let mut xobjects = lopdf::Dictionary::new();
        for (idx, (_, stream)) in self.images.into_iter().enumerate() {
            let image_id = doc.add_object(stream);
            xobjects.set(image_resource_name(idx), image_id);
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => fonts,
            "XObject" => xobjects,
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                (self.width * PT_PER_MM).into(),
                (self.height * PT_PER_MM).into(),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(encode_win_ansi(&info.title), StringFormat::Literal),
            "Producer" => Object::string_literal(concat!("rosterpdf ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(pdf_date(&info.created)),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        doc.compress();

        let mut buf = Vec::new();
        doc.save_to(&mut buf)?;
        Ok(buf)
    }
}

fn compress_pixels<W: Write>(image: &RasterImage, sink: W) -> Result<W> {
    let mut encoder = ZlibEncoder::new(sink, Compression::default());
    encoder
        .write_all(&image.pixels)
        .and_then(|_| encoder.finish())
        .map_err(|e| Error::Layout(format!("cannot compress image {}: {}", image.key, e)))
}

fn image_resource_name(idx: usize) -> String {
    format!("Im{}", idx + 1)
}

/// Format a timestamp as a PDF date string.
pub fn pdf_date(ts: &DateTime<Utc>) -> String {
    ts.format("D:%Y%m%d%H%M%SZ").to_string()
}

/// Encode text for the standard 14 fonts (WinAnsiEncoding).
///
/// Latin-1 passes through, a few Latin Extended-A letters map to their
/// WinAnsi slots or to the base letter, anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
            'Š' => 0x8a,
            'š' => 0x9a,
            'Ž' => 0x8e,
            'ž' => 0x9e,
            'Œ' => 0x8c,
            'œ' => 0x9c,
            'Ÿ' => 0x9f,
            '€' => 0x80,
            '–' => 0x96,
            '—' => 0x97,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            'Č' | 'Ć' => b'C',
            'č' | 'ć' => b'c',
            'Đ' => 0xd0,
            'đ' => b'd',
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

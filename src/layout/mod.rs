//! Document layout engine.
//!
//! Turns an ordered list of records into a single-page tabular report: a
//! header band (logo, caption, title, QR code, column labels), one body row
//! per record, and a footer carrying the page number.
//!
//! Each call to [`LayoutEngine::build`] owns its own surface and cursor, so
//! one engine can be shared by any number of concurrent jobs.
//!
//! Rows are never moved to a new page. When a dataset has more rows than fit
//! above the bottom margin, the extra rows are still emitted (below the
//! printable area) and counted in [`Page::overflow_rows`].

mod options;
mod raster;
mod surface;

pub use options::LayoutOptions;
pub use raster::{ColorSpace, RasterImage};
pub use surface::{encode_win_ansi, pdf_date, DocumentInfo, FontStyle, LopdfSurface, PdfSurface, A4};

use chrono::Utc;

use crate::asset::AssetRef;
use crate::error::Result;
use crate::model::{Document, Header, Page, Record, Row};

/// A table column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    /// Header label
    pub label: &'static str,
    /// Width in mm
    pub width: f32,
}

/// Table columns, left to right.
pub const COLUMNS: [Column; 5] = [
    Column { label: "Name", width: 30.0 },
    Column { label: "Age", width: 10.0 },
    Column { label: "Email", width: 40.0 },
    Column { label: "Phone", width: 30.0 },
    Column { label: "Address", width: 80.0 },
];

/// Height of the column label row and of every body row, in mm.
pub const ROW_HEIGHT: f32 = 10.0;

/// Distance from the bottom edge below which rows no longer fit, in mm.
pub const BOTTOM_MARGIN: f32 = 20.0;

/// Footer position, measured up from the bottom edge, in mm.
const FOOTER_OFFSET: f32 = -15.0;

const LOGO_X: f32 = 10.0;
const LOGO_WIDTH: f32 = 30.0;
const QR_X: f32 = 180.0;
const QR_SIDE: f32 = 30.0;

/// Lays out roster documents.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    options: LayoutOptions,
}

impl LayoutEngine {
    /// Create an engine with the given options.
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Build a PDF document from `records`.
    ///
    /// `asset` is the QR code placed in the header. When it is missing or
    /// cannot be decoded the header is drawn without it and the build still
    /// succeeds.
    pub fn build(
        &self,
        records: &[Record],
        logo: &RasterImage,
        asset: Option<&AssetRef>,
        title: &str,
    ) -> Result<Document> {
        self.build_with(LopdfSurface::a4(), records, logo, asset, title)
    }

    /// Build a document on a caller-provided surface.
    pub fn build_with<S: PdfSurface>(
        &self,
        mut surface: S,
        records: &[Record],
        logo: &RasterImage,
        asset: Option<&AssetRef>,
        title: &str,
    ) -> Result<Document> {
        let qr = asset.and_then(decode_asset);
        let created = Utc::now();

        surface.add_page()?;
        let header = self.render_header(&mut surface, logo, qr.as_ref(), title)?;
        let mut page = Page::new(surface.page_no(), header);

        let limit = surface.page_size().1 - BOTTOM_MARGIN;
        for record in records {
            let (_, y) = surface.position();
            if y + ROW_HEIGHT > limit {
                page.overflow_rows += 1;
            }

            let cells = record.cells();
            for (column, text) in COLUMNS.iter().zip(cells.iter()) {
                surface.cell(column.width, ROW_HEIGHT, text)?;
            }
            surface.line_break(ROW_HEIGHT);
            page.rows.push(Row::new(cells.to_vec()));
        }

        page.footer = self.render_footer(&mut surface)?;

        let info = DocumentInfo {
            title: title.to_string(),
            created,
        };
        let data = surface.finish(&info)?;
        Ok(Document::new(title, created, vec![page], data))
    }

    fn render_header<S: PdfSurface>(
        &self,
        surface: &mut S,
        logo: &RasterImage,
        qr: Option<&RasterImage>,
        title: &str,
    ) -> Result<Header> {
        surface.set_font(FontStyle::Bold, 12.0);
        surface.image(logo, LOGO_X, 0.0, LOGO_WIDTH, None)?;
        surface.set_xy(50.0, 10.0);
        surface.cell(10.0, 0.0, &self.options.header_text)?;
        surface.line_break(20.0);

        surface.set_font(FontStyle::Bold, 16.0);
        surface.cell(40.0, 10.0, title)?;
        if let Some(qr) = qr {
            surface.image(qr, QR_X, 0.0, QR_SIDE, Some(QR_SIDE))?;
        }
        surface.line_break(12.0);

        surface.set_font(FontStyle::Regular, 8.0);
        for column in COLUMNS.iter() {
            surface.cell(column.width, ROW_HEIGHT, column.label)?;
        }
        surface.line_break(ROW_HEIGHT);

        Ok(Header {
            caption: self.options.header_text.clone(),
            title: title.to_string(),
            has_logo: true,
            has_asset: qr.is_some(),
            column_labels: COLUMNS.iter().map(|c| c.label.to_string()).collect(),
        })
    }

    fn render_footer<S: PdfSurface>(&self, surface: &mut S) -> Result<String> {
        let text = self.options.footer_for(surface.page_no());
        surface.set_y(FOOTER_OFFSET);
        surface.set_font(FontStyle::Italic, 8.0);
        surface.cell(0.0, 10.0, &text)?;
        Ok(text)
    }
}

fn decode_asset(asset: &AssetRef) -> Option<RasterImage> {
    match asset
        .png_bytes()
        .and_then(|data| RasterImage::decode("qrcode", &data))
    {
        Ok(image) => Some(image),
        Err(e) => {
            log::warn!("QR asset unusable, header drawn without it: {}", e);
            None
        }
    }
}

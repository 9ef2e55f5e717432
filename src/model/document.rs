//! Laid-out document types.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A finished report: the page model the layout engine produced plus the
/// encoded PDF bytes that get committed to storage.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Document title
    pub title: String,

    /// Creation timestamp written to the PDF info dictionary
    pub created: DateTime<Utc>,

    /// Pages in the document
    pub pages: Vec<Page>,

    /// Encoded PDF
    #[serde(skip_serializing)]
    data: Vec<u8>,
}

impl Document {
    /// Create a document from its pages and encoded bytes.
    pub fn new(title: impl Into<String>, created: DateTime<Utc>, pages: Vec<Page>, data: Vec<u8>) -> Self {
        Self {
            title: title.into(),
            created,
            pages,
            data,
        }
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&Page> {
        if page_num == 0 {
            return None;
        }
        self.pages.get((page_num - 1) as usize)
    }

    /// All body rows in rendering order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.pages.iter().flat_map(|p| p.rows.iter())
    }

    /// Total number of body rows.
    pub fn row_count(&self) -> usize {
        self.pages.iter().map(|p| p.rows.len()).sum()
    }

    /// Rows placed below the printable area, across all pages.
    pub fn overflow_rows(&self) -> usize {
        self.pages.iter().map(|p| p.overflow_rows).sum()
    }

    /// Encoded PDF bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the document, returning the encoded PDF bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// A single page of a report.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Header band
    pub header: Header,

    /// Body rows in input order
    pub rows: Vec<Row>,

    /// Footer text, carrying the page number
    pub footer: String,

    /// Number of rows that extend past the bottom margin
    pub overflow_rows: usize,
}

impl Page {
    /// Create an empty page.
    pub fn new(number: u32, header: Header) -> Self {
        Self {
            number,
            header,
            rows: Vec::new(),
            footer: String::new(),
            overflow_rows: 0,
        }
    }

    /// Check if the page has no body rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// What was placed in a page header.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Header {
    /// Small header caption next to the logo
    pub caption: String,

    /// Report title
    pub title: String,

    /// Whether the logo image was placed
    pub has_logo: bool,

    /// Whether the QR asset was placed
    pub has_asset: bool,

    /// Column labels, left to right
    pub column_labels: Vec<String>,
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// Cell texts, left to right
    pub cells: Vec<String>,
}

impl Row {
    /// Create a row from cell texts.
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Text of the first (name) column.
    pub fn name(&self) -> Option<&str> {
        self.cells.first().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut page = Page::new(1, Header::default());
        page.rows.push(Row::new(vec!["Ana".into(), "31".into()]));
        page.rows.push(Row::new(vec!["Bora".into(), "40".into()]));
        page.overflow_rows = 1;
        Document::new("Zaposleni", Utc::now(), vec![page], b"%PDF-1.5".to_vec())
    }

    #[test]
    fn test_document_counts() {
        let doc = sample();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.row_count(), 2);
        assert_eq!(doc.overflow_rows(), 1);
        assert_eq!(
            doc.rows().filter_map(Row::name).collect::<Vec<_>>(),
            vec!["Ana", "Bora"]
        );
    }

    #[test]
    fn test_get_page_is_one_indexed() {
        let doc = sample();
        assert!(doc.get_page(0).is_none());
        assert_eq!(doc.get_page(1).map(|p| p.number), Some(1));
        assert!(doc.get_page(2).is_none());
    }

    #[test]
    fn test_serialize_skips_bytes() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["pages"][0]["rows"][1]["cells"][0], "Bora");
    }
}

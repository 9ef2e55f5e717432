//! Layout configuration.

use std::path::PathBuf;

/// Options for laying out a roster report.
///
/// Page geometry is fixed (A4 portrait, millimetre units); these options
/// only cover the inputs that differ between deployments.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Logo image placed at the top-left of every header
    pub logo_path: PathBuf,

    /// Report title shown above the table
    pub title: String,

    /// Caption printed next to the logo
    pub header_text: String,

    /// Label printed before the page number in the footer
    pub footer_label: String,
}

impl LayoutOptions {
    /// Create new layout options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the logo path.
    pub fn with_logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo_path = path.into();
        self
    }

    /// Set the report title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the header caption.
    pub fn with_header_text(mut self, text: impl Into<String>) -> Self {
        self.header_text = text.into();
        self
    }

    /// Set the footer label.
    pub fn with_footer_label(mut self, label: impl Into<String>) -> Self {
        self.footer_label = label.into();
        self
    }

    /// Footer text for a page.
    pub fn footer_for(&self, page: u32) -> String {
        if self.footer_label.is_empty() {
            page.to_string()
        } else {
            format!("{} {}", self.footer_label, page)
        }
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            logo_path: PathBuf::from("assets/logo.png"),
            title: "Zaposleni".to_string(),
            header_text: "Zaposleni - Header".to_string(),
            footer_label: "Page".to_string(),
        }
    }
}

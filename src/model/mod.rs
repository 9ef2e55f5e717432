//! Data model for roster reports.
//!
//! Records flow in from a dataset, jobs name the work, and the document
//! types describe what the layout engine placed on each page alongside the
//! encoded PDF bytes.

mod document;
mod job;
mod record;

pub use document::{Document, Header, Page, Row};
pub use job::Job;
pub use record::Record;

//! Document handlers
//!
//! A handler recognises one file format and turns it into a raw structural
//! document (tables and sections, sheets, or schedule tasks). Extraction of
//! milestones from that structure happens in [`crate::extractor`].

pub mod markdown;
pub mod schedule;
pub mod spreadsheet;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use markdown::{MarkdownDocument, MarkdownHandler, Row, Section, Table};
pub use schedule::{
    BackendCapability, BackendKind, ScheduleBackend, ScheduleData, ScheduleExtraction,
    ScheduleHandler, ScheduleTask, TimelineData,
};
pub use spreadsheet::{Sheet, SpreadsheetDocument, SpreadsheetHandler};

/// Capability predicate shared by all handlers
pub trait DocumentHandler {
    /// Human readable handler name
    fn name(&self) -> &str;

    /// Lower-case extensions without the dot
    fn supported_extensions(&self) -> &[&str];

    /// Whether this handler claims the file
    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, self.supported_extensions())
    }
}

/// Case-insensitive extension check
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|candidate| ext.eq_ignore_ascii_case(candidate)))
        .unwrap_or(false)
}

/// Outcome of a structural validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

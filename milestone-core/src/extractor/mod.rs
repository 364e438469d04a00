//! Milestone extraction pipeline
//!
//! [`MilestoneExtractor`] picks the handler for a file, obtains its raw
//! structure and runs the matching per-format extraction:
//!
//! - schedule files: milestone tasks ([`schedule`])
//! - Markdown: tables, then keyword sections, then the whole text ([`document`])
//! - spreadsheets: keyword sheets only ([`document`])
//!
//! Extraction of one record never aborts its siblings; a record that cannot
//! be built is logged and dropped.

pub mod columns;
pub mod document;
pub mod schedule;
pub mod text;

use chrono::{Local, NaiveDate};
use std::fmt;
use std::path::Path;
use tracing::{error, info};

pub use columns::{CanonicalField, ColumnMapper};
pub use text::{FIELD_RULES, FieldRule, locate_entries};

use crate::config::ExtractorConfig;
use crate::error::{ExtractionError, Result};
use crate::handlers::{
    DocumentHandler, MarkdownDocument, MarkdownHandler, ScheduleExtraction, ScheduleHandler,
    SpreadsheetDocument, SpreadsheetHandler,
};
use crate::model::{DraftDefaults, Milestone, MilestoneDraft};

/// File families the dispatcher knows, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Schedule,
    Markdown,
    Spreadsheet,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schedule => write!(f, "MS Project"),
            Self::Markdown => write!(f, "Markdown"),
            Self::Spreadsheet => write!(f, "Excel"),
        }
    }
}

/// State of one extraction call
pub(crate) struct RunContext<'a> {
    pub config: &'a ExtractorConfig,
    pub today: NaiveDate,
    stamp: String,
    sequence: usize,
}

impl<'a> RunContext<'a> {
    fn new(config: &'a ExtractorConfig, today: NaiveDate) -> Self {
        Self {
            config,
            today,
            stamp: Local::now().format("%Y%m%d%H%M%S").to_string(),
            sequence: 0,
        }
    }

    #[cfg(test)]
    pub fn for_test(config: &'a ExtractorConfig, today: NaiveDate) -> Self {
        Self::new(config, today)
    }

    /// Timestamp id, unique within this call
    pub fn next_row_id(&mut self) -> String {
        self.sequence += 1;
        format!("{}-{}-{}", self.config.id_prefix, self.stamp, self.sequence)
    }

    /// Resolve a draft with this call's defaults
    pub fn build(
        &mut self,
        draft: MilestoneDraft,
        fallback_id: impl FnOnce(&mut Self) -> String,
    ) -> Milestone {
        let config = self.config;
        let defaults = DraftDefaults { today: self.today, placeholder_name: &config.placeholder_name };
        draft.build(&defaults, || fallback_id(self))
    }
}

/// Format dispatcher and entry point for milestone extraction
pub struct MilestoneExtractor {
    config: ExtractorConfig,
    markdown: MarkdownHandler,
    spreadsheet: SpreadsheetHandler,
    schedule: ScheduleHandler,
    today: Option<NaiveDate>,
}

impl MilestoneExtractor {
    /// Create an extractor; schedule backends are probed here
    pub fn new(config: ExtractorConfig) -> Self {
        let schedule = ScheduleHandler::new(&config.schedule);
        Self {
            config,
            markdown: MarkdownHandler::new(),
            spreadsheet: SpreadsheetHandler::new(),
            schedule,
            today: None,
        }
    }

    /// Replace the schedule handler, e.g. one with custom backends
    pub fn with_schedule_handler(mut self, schedule: ScheduleHandler) -> Self {
        self.schedule = schedule;
        self
    }

    /// Pin "today" instead of reading the local clock
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn schedule_handler(&self) -> &ScheduleHandler {
        &self.schedule
    }

    /// First handler claiming the file: schedule, Markdown, spreadsheet
    pub fn detect_format(&self, path: &Path) -> Option<DocumentFormat> {
        if self.schedule.can_handle(path) {
            Some(DocumentFormat::Schedule)
        } else if self.markdown.can_handle(path) {
            Some(DocumentFormat::Markdown)
        } else if self.spreadsheet.can_handle(path) {
            Some(DocumentFormat::Spreadsheet)
        } else {
            None
        }
    }

    /// Extract every milestone from one file
    ///
    /// An empty list means the file was read but holds no milestones.
    pub fn extract_milestones(&self, path: &Path) -> Result<Vec<Milestone>> {
        if !path.exists() {
            let err = ExtractionError::not_found(path);
            error!("{}", err);
            return Err(err);
        }

        info!("Extracting milestones from {}", path.display());
        let Some(format) = self.detect_format(path) else {
            let err = ExtractionError::unsupported(path);
            error!("{}", err);
            return Err(err);
        };

        let result = match format {
            DocumentFormat::Schedule => {
                self.schedule.extract_data(path).map(|data| self.extract_from_schedule(&data))
            }
            DocumentFormat::Markdown => {
                self.markdown.extract_data(path).map(|data| self.extract_from_markdown(&data))
            }
            DocumentFormat::Spreadsheet => {
                self.spreadsheet.extract_data(path).map(|data| self.extract_from_spreadsheet(&data))
            }
        };

        match result {
            Ok(milestones) => {
                info!("Extracted {} milestones from {} file {}", milestones.len(), format, path.display());
                Ok(milestones)
            }
            Err(source) => {
                let err = ExtractionError::from_handler(path, source);
                error!("{}", err);
                Err(err)
            }
        }
    }

    pub fn extract_from_markdown(&self, document: &MarkdownDocument) -> Vec<Milestone> {
        document::milestones_from_markdown(document, &mut self.run_context())
    }

    pub fn extract_from_spreadsheet(&self, document: &SpreadsheetDocument) -> Vec<Milestone> {
        document::milestones_from_spreadsheet(document, &mut self.run_context())
    }

    pub fn extract_from_schedule(&self, extraction: &ScheduleExtraction) -> Vec<Milestone> {
        schedule::milestones_from_schedule(extraction, &mut self.run_context())
    }

    /// Free-text extraction over arbitrary prose
    pub fn extract_from_text(&self, text: &str) -> Vec<Milestone> {
        text::milestones_from_text(text, &mut self.run_context())
    }

    fn run_context(&self) -> RunContext<'_> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        RunContext::new(&self.config, today)
    }
}

impl Default for MilestoneExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

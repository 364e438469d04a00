//! Core functionality for milestone-scan
//!
//! This crate reads project documents (Markdown, Excel workbooks, Microsoft
//! Project schedules) and extracts normalized [`Milestone`] records from
//! their tables, prose and schedule tasks.

pub mod config;
pub mod error;
pub mod extractor;
pub mod fields;
pub mod handlers;
pub mod model;

pub use config::{ExtractorConfig, ScheduleConfig};
pub use error::{ExtractionError, HandlerError, RecordError, Result};
pub use extractor::{DocumentFormat, MilestoneExtractor};
pub use handlers::{BackendCapability, BackendKind, ScheduleHandler, TimelineData, ValidationReport};
pub use model::{Milestone, MilestoneStatus};

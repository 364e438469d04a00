//! Microsoft Project (`.mpp`) handler
//!
//! The binary format is read through a chain of backends tried in priority
//! order. Which backends are usable is probed once, when the handler is
//! built, and recorded in a [`BackendCapability`].

pub mod backends;
pub mod mspdi;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use backends::{
    BackendKind, ComAutomationBackend, MpxjBackend, ScheduleBackend, XmlConversionBackend,
    default_backends,
};
pub use mspdi::{Assignment, PredecessorLink, ProjectInfo, Resource, ScheduleData, ScheduleTask};

use super::{DocumentHandler, ValidationReport};
use crate::config::ScheduleConfig;
use crate::error::{HandlerError, HandlerResult};

/// Which backends can be used in this process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCapability {
    pub mpxj: bool,
    pub com_automation: bool,
    pub xml_conversion: bool,
}

impl BackendCapability {
    /// Run every backend's probe
    pub fn probe(backends: &[Box<dyn ScheduleBackend>]) -> Self {
        let mut capability = Self::default();
        for backend in backends {
            let available = backend.probe();
            debug!("Backend {} available: {}", backend.kind(), available);
            capability.set(backend.kind(), available);
        }
        capability
    }

    pub fn is_available(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Mpxj => self.mpxj,
            BackendKind::ComAutomation => self.com_automation,
            BackendKind::XmlConversion => self.xml_conversion,
        }
    }

    pub fn set(&mut self, kind: BackendKind, available: bool) {
        match kind {
            BackendKind::Mpxj => self.mpxj = available,
            BackendKind::ComAutomation => self.com_automation = available,
            BackendKind::XmlConversion => self.xml_conversion = available,
        }
    }

    pub fn any(&self) -> bool {
        self.mpxj || self.com_automation || self.xml_conversion
    }

    /// Available backends in priority order
    pub fn available(&self) -> Vec<BackendKind> {
        BackendKind::ALL.into_iter().filter(|kind| self.is_available(*kind)).collect()
    }
}

/// Where a schedule extraction came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub backend: BackendKind,
    pub extracted_at: DateTime<Local>,
    pub file_path: PathBuf,
    pub file_size: u64,
}

/// Schedule data tagged with the backend that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleExtraction {
    pub data: ScheduleData,
    pub metadata: ExtractionMetadata,
}

impl ScheduleExtraction {
    /// Backend that produced the data
    pub fn backend(&self) -> BackendKind {
        self.metadata.backend
    }
}

/// A task on the critical path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineTask {
    pub unique_id: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
}

/// Predecessor to successor link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyLink {
    pub predecessor_uid: String,
    pub successor_uid: String,
    pub link_type: String,
    pub lag: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    pub task_uid: String,
    pub task_name: String,
    pub resource_name: String,
}

/// Timeline view of a schedule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineData {
    pub project_name: Option<String>,
    pub project_start: Option<NaiveDate>,
    pub project_finish: Option<NaiveDate>,
    pub critical_path: Vec<TimelineTask>,
    pub dependencies: Vec<DependencyLink>,
    pub resource_assignments: Vec<ResourceAssignment>,
}

impl TimelineData {
    pub fn from_schedule(data: &ScheduleData) -> Self {
        let critical_path = data
            .tasks
            .iter()
            .filter(|task| task.is_critical)
            .map(|task| TimelineTask {
                unique_id: task.unique_id.clone(),
                name: task.name.clone(),
                start_date: task.start_date,
                finish_date: task.finish_date,
            })
            .collect();

        let dependencies = data
            .tasks
            .iter()
            .flat_map(|task| {
                task.predecessors.iter().map(move |link| DependencyLink {
                    predecessor_uid: link.predecessor_uid.clone(),
                    successor_uid: task.unique_id.clone(),
                    link_type: link.link_type.clone(),
                    lag: link.lag,
                })
            })
            .collect();

        let resource_assignments = data
            .tasks
            .iter()
            .flat_map(|task| {
                task.resource_names.iter().map(move |resource| ResourceAssignment {
                    task_uid: task.unique_id.clone(),
                    task_name: task.name.clone(),
                    resource_name: resource.clone(),
                })
            })
            .collect();

        Self {
            project_name: data.project.name.clone(),
            project_start: data.project.start_date,
            project_finish: data.project.finish_date,
            critical_path,
            dependencies,
            resource_assignments,
        }
    }
}

/// Handler for Microsoft Project files
pub struct ScheduleHandler {
    backends: Vec<Box<dyn ScheduleBackend>>,
    capability: BackendCapability,
    small_file_bytes: u64,
    max_items: usize,
}

impl ScheduleHandler {
    /// Build the default backend chain and probe it
    pub fn new(config: &ScheduleConfig) -> Self {
        Self::with_backends(config, default_backends(config))
    }

    /// Use a custom backend chain, given in priority order
    pub fn with_backends(config: &ScheduleConfig, backends: Vec<Box<dyn ScheduleBackend>>) -> Self {
        let capability = BackendCapability::probe(&backends);
        info!("Schedule backends available: {:?}", capability.available());

        Self {
            backends,
            capability,
            small_file_bytes: config.small_file_bytes,
            max_items: config.max_items,
        }
    }

    /// Replace the probed capability record
    pub fn with_capability(mut self, capability: BackendCapability) -> Self {
        self.capability = capability;
        self
    }

    pub fn capabilities(&self) -> BackendCapability {
        self.capability
    }

    /// Try each available backend until one succeeds
    pub fn extract_data(&self, path: &Path) -> HandlerResult<ScheduleExtraction> {
        if !path.exists() {
            return Err(HandlerError::NotFound { path: path.to_path_buf() });
        }
        if !self.capability.any() {
            return Err(HandlerError::NoBackends);
        }

        let mut last_error = None;
        for backend in &self.backends {
            let kind = backend.kind();
            if !self.capability.is_available(kind) {
                continue;
            }

            debug!("Trying {} backend for {}", kind, path.display());
            match backend.extract(path) {
                Ok(data) => {
                    info!("Extracted {} tasks from {} using {}", data.tasks.len(), path.display(), kind);
                    let metadata = ExtractionMetadata {
                        backend: kind,
                        extracted_at: Local::now(),
                        file_path: path.to_path_buf(),
                        file_size: fs::metadata(path).map(|m| m.len()).unwrap_or(0),
                    };
                    return Ok(ScheduleExtraction { data, metadata });
                }
                Err(e) => {
                    warn!("{} backend failed for {}: {}", kind, path.display(), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) => Err(HandlerError::AllBackendsFailed {
                path: path.to_path_buf(),
                last: Box::new(last),
            }),
            None => Err(HandlerError::NoBackends),
        }
    }

    /// Check that a file is a readable schedule
    pub fn validate_structure(&self, path: &Path) -> ValidationReport {
        let mut report = ValidationReport::default();

        if !path.exists() {
            report.add_error(format!("File does not exist: {}", path.display()));
            return report;
        }
        if !self.can_handle(path) {
            report.add_error(format!("Not an .mpp file: {}", path.display()));
            return report;
        }

        let size = match fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                report.add_error(format!("Cannot read file metadata: {}", e));
                return report;
            }
        };
        if size == 0 {
            report.add_error("File is empty");
            return report;
        }
        if size < self.small_file_bytes {
            report.add_warning(format!("File is suspiciously small ({} bytes)", size));
        }

        if !self.capability.any() {
            report.add_error("No schedule backends are available");
            return report;
        }

        match self.extract_data(path) {
            Ok(extraction) => {
                let tasks = extraction.data.tasks.len();
                if tasks == 0 {
                    report.add_warning("No tasks found in project");
                } else if tasks > self.max_items {
                    report.add_warning(format!("Large project with {} tasks", tasks));
                }
            }
            Err(e) => report.add_error(format!("Cannot extract data: {}", e)),
        }

        report
    }

    /// Critical path, dependency links and resource assignments
    pub fn extract_timeline(&self, path: &Path) -> HandlerResult<TimelineData> {
        let extraction = self.extract_data(path)?;
        Ok(TimelineData::from_schedule(&extraction.data))
    }
}

impl DocumentHandler for ScheduleHandler {
    fn name(&self) -> &str {
        "MS Project Handler"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["mpp"]
    }
}

#[cfg(test)]
mod tests;

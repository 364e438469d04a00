//! Milestones from schedule tasks

use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

use super::RunContext;
use crate::config::ExtractorConfig;
use crate::error::RecordError;
use crate::fields::non_blank;
use crate::handlers::{ScheduleExtraction, ScheduleTask};
use crate::model::{Milestone, MilestoneDraft, MilestoneStatus};

/// Flagged, zero-duration, or named with a keyword
///
/// A task without a duration counts as zero-duration.
pub fn is_milestone_task(task: &ScheduleTask, config: &ExtractorConfig) -> bool {
    task.is_milestone
        || task.duration_hours.unwrap_or(0.0) == 0.0
        || config.mentions_keyword(&task.name)
}

/// Completion dominates the date check
pub fn task_status(task: &ScheduleTask, today: NaiveDate) -> MilestoneStatus {
    if task.percent_complete >= 100.0 {
        MilestoneStatus::Completed
    } else if task.percent_complete > 0.0 {
        MilestoneStatus::InProgress
    } else if task.finish_date.is_some_and(|finish| finish < today) {
        MilestoneStatus::Overdue
    } else {
        MilestoneStatus::Upcoming
    }
}

pub(crate) fn milestones_from_schedule(
    extraction: &ScheduleExtraction,
    ctx: &mut RunContext<'_>,
) -> Vec<Milestone> {
    let config = ctx.config;
    extraction
        .data
        .tasks
        .iter()
        .filter(|task| is_milestone_task(task, config))
        .filter_map(|task| match task_to_milestone(task, extraction, ctx) {
            Ok(milestone) => Some(milestone),
            Err(e) => {
                warn!("Failed to create milestone from task {:?}: {}", task.unique_id, e);
                None
            }
        })
        .collect()
}

fn task_to_milestone(
    task: &ScheduleTask,
    extraction: &ScheduleExtraction,
    ctx: &mut RunContext<'_>,
) -> Result<Milestone, RecordError> {
    let id = task.id.as_deref().and_then(non_blank);
    let unique_id = non_blank(&task.unique_id);
    let name = non_blank(&task.name);
    if id.is_none() && unique_id.is_none() && name.is_none() {
        return Err(RecordError::new("task has no id, unique id or name"));
    }

    let mut draft = MilestoneDraft {
        id,
        name,
        description: non_blank(&task.notes),
        target_date: task.finish_date.or(task.start_date),
        actual_date: task.actual_finish,
        status: Some(task_status(task, ctx.today)),
        owner: non_blank(&task.resource_names.join(", ")),
        dependencies: Some(task.predecessors.iter().map(|link| link.predecessor_uid.clone()).collect()),
        ..Default::default()
    };
    draft.custom_fields.insert(
        "source_file".to_string(),
        Value::String(extraction.metadata.file_path.display().to_string()),
    );
    draft
        .custom_fields
        .insert("extraction_method".to_string(), Value::String(extraction.backend().to_string()));

    let fallback = format!(
        "{}-{}",
        ctx.config.id_prefix,
        unique_id.unwrap_or_else(|| "unknown".to_string())
    );
    Ok(ctx.build(draft, |_| fallback))
}

//! Microsoft Project XML (MSPDI) reader
//!
//! Every schedule backend ends up with an MSPDI rendition of the `.mpp`
//! file; this module turns that XML into [`ScheduleData`].

use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex_utils::duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{HandlerError, HandlerResult};
use crate::fields::parse_date;

/// Project-level header fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
}

/// Dependency on an earlier task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredecessorLink {
    pub predecessor_uid: String,
    /// FF, FS, SF or SS
    pub link_type: String,
    /// Lag in tenths of a minute, as stored by Project
    pub lag: i64,
}

/// A task row of the schedule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTask {
    pub unique_id: String,
    pub id: Option<String>,
    pub name: String,
    pub notes: String,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub actual_finish: Option<NaiveDate>,
    pub duration_hours: Option<f64>,
    pub percent_complete: f64,
    pub is_milestone: bool,
    pub is_critical: bool,
    pub predecessors: Vec<PredecessorLink>,
    pub resource_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub unique_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub task_uid: String,
    pub resource_uid: String,
}

/// Everything read from one schedule file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleData {
    pub project: ProjectInfo,
    pub tasks: Vec<ScheduleTask>,
    pub resources: Vec<Resource>,
    pub assignments: Vec<Assignment>,
}

/// Parse an MSPDI document
pub fn parse_mspdi(xml: &str) -> HandlerResult<ScheduleData> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut data = ScheduleData::default();
    let mut seen_project = false;

    // Stack to track element hierarchy
    let mut element_stack: Vec<String> = Vec::new();
    let mut task: Option<ScheduleTask> = None;
    let mut link: Option<PredecessorLink> = None;
    let mut resource: Option<Resource> = None;
    let mut assignment: Option<Assignment> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                let parent = element_stack.last().map(String::as_str);

                match (parent, name.as_str()) {
                    (None, "Project") => seen_project = true,
                    (Some("Tasks"), "Task") => task = Some(ScheduleTask::default()),
                    (Some("Task"), "PredecessorLink") => link = Some(PredecessorLink::default()),
                    (Some("Resources"), "Resource") => resource = Some(Resource::default()),
                    (Some("Assignments"), "Assignment") => assignment = Some(Assignment::default()),
                    _ => {}
                }
                element_stack.push(name);
            }
            Event::Text(e) => {
                let text = e.unescape()?.trim().to_string();
                apply_text(
                    &element_stack,
                    text,
                    &mut data.project,
                    task.as_mut(),
                    link.as_mut(),
                    resource.as_mut(),
                    assignment.as_mut(),
                );
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).trim().to_string();
                apply_text(
                    &element_stack,
                    text,
                    &mut data.project,
                    task.as_mut(),
                    link.as_mut(),
                    resource.as_mut(),
                    assignment.as_mut(),
                );
            }
            Event::End(_) => {
                let Some(name) = element_stack.pop() else {
                    continue;
                };

                match name.as_str() {
                    "PredecessorLink" => {
                        if let (Some(done), Some(owner)) = (link.take(), task.as_mut()) {
                            owner.predecessors.push(done);
                        }
                    }
                    "Task" => {
                        if let Some(done) = task.take() {
                            // UID 0 is the project summary row
                            if done.unique_id != "0" {
                                data.tasks.push(done);
                            }
                        }
                    }
                    "Resource" => {
                        if let Some(done) = resource.take() {
                            data.resources.push(done);
                        }
                    }
                    "Assignment" => {
                        if let Some(done) = assignment.take() {
                            data.assignments.push(done);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_project {
        return Err(HandlerError::malformed("not a Microsoft Project XML document"));
    }

    attach_resource_names(&mut data);
    debug!(
        "Parsed MSPDI: {} tasks, {} resources, {} assignments",
        data.tasks.len(),
        data.resources.len(),
        data.assignments.len()
    );
    Ok(data)
}

fn apply_text(
    stack: &[String],
    text: String,
    project: &mut ProjectInfo,
    task: Option<&mut ScheduleTask>,
    link: Option<&mut PredecessorLink>,
    resource: Option<&mut Resource>,
    assignment: Option<&mut Assignment>,
) {
    if text.is_empty() || stack.len() < 2 {
        return;
    }
    let field = stack[stack.len() - 1].as_str();
    let parent = stack[stack.len() - 2].as_str();

    match parent {
        "Project" if stack.len() == 2 => match field {
            "Name" | "Title" => {
                if project.name.is_none() {
                    project.name = Some(text);
                }
            }
            "StartDate" => project.start_date = parse_date(&text),
            "FinishDate" => project.finish_date = parse_date(&text),
            _ => {}
        },
        "Task" => {
            if let Some(task) = task {
                apply_task_field(task, field, text);
            }
        }
        "PredecessorLink" => {
            if let Some(link) = link {
                match field {
                    "PredecessorUID" => link.predecessor_uid = text,
                    "Type" => link.link_type = link_type_code(&text).to_string(),
                    "LinkLag" => link.lag = text.parse().unwrap_or(0),
                    _ => {}
                }
            }
        }
        "Resource" => {
            if let Some(resource) = resource {
                match field {
                    "UID" => resource.unique_id = text,
                    "Name" => resource.name = text,
                    _ => {}
                }
            }
        }
        "Assignment" => {
            if let Some(assignment) = assignment {
                match field {
                    "TaskUID" => assignment.task_uid = text,
                    "ResourceUID" => assignment.resource_uid = text,
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn apply_task_field(task: &mut ScheduleTask, field: &str, text: String) {
    match field {
        "UID" => task.unique_id = text,
        "ID" => task.id = Some(text),
        "Name" => task.name = text,
        "Notes" => task.notes = text,
        "Start" => task.start_date = parse_date(&text),
        "Finish" => task.finish_date = parse_date(&text),
        "ActualFinish" => task.actual_finish = parse_date(&text),
        "Duration" => task.duration_hours = task_duration(&task.unique_id, &text),
        "PercentComplete" => task.percent_complete = text.parse().unwrap_or(0.0),
        "Milestone" => task.is_milestone = is_truthy(&text),
        "Critical" => task.is_critical = is_truthy(&text),
        _ => {}
    }
}

/// Hours of a task `Duration`; unreadable text leaves the duration unknown
fn task_duration(uid: &str, text: &str) -> Option<f64> {
    let hours = duration::hours(text);
    if hours.is_none() && !text.trim().is_empty() {
        debug!("Task {} has unreadable duration '{}', treating it as unknown", uid, text);
    }
    hours
}

fn is_truthy(text: &str) -> bool {
    matches!(text.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn link_type_code(text: &str) -> &'static str {
    match text {
        "0" => "FF",
        "2" => "SF",
        "3" => "SS",
        _ => "FS",
    }
}

fn attach_resource_names(data: &mut ScheduleData) {
    let names: HashMap<&str, &str> = data
        .resources
        .iter()
        .map(|r| (r.unique_id.as_str(), r.name.as_str()))
        .collect();

    let mut by_task: HashMap<&str, Vec<String>> = HashMap::new();
    for assignment in &data.assignments {
        if let Some(name) = names.get(assignment.resource_uid.as_str()) {
            if !name.is_empty() {
                by_task.entry(assignment.task_uid.as_str()).or_default().push(name.to_string());
            }
        }
    }

    for task in &mut data.tasks {
        if let Some(resource_names) = by_task.remove(task.unique_id.as_str()) {
            task.resource_names = resource_names;
        }
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_PROJECT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Project xmlns="http://schemas.microsoft.com/project">
    <Name>Website Relaunch</Name>
    <StartDate>2025-01-06T08:00:00</StartDate>
    <FinishDate>2025-06-30T17:00:00</FinishDate>
    <Tasks>
        <Task>
            <UID>0</UID>
            <ID>0</ID>
            <Name>Website Relaunch</Name>
            <Duration>PT960H0M0S</Duration>
        </Task>
        <Task>
            <UID>1</UID>
            <ID>1</ID>
            <Name>Kickoff</Name>
            <Duration>PT0H0M0S</Duration>
            <Start>2025-01-06T08:00:00</Start>
            <Finish>2025-01-06T08:00:00</Finish>
            <Milestone>1</Milestone>
            <PercentComplete>100</PercentComplete>
            <ActualFinish>2025-01-06T08:00:00</ActualFinish>
            <Notes>Sponsor &amp; team present</Notes>
        </Task>
        <Task>
            <UID>2</UID>
            <ID>2</ID>
            <Name>Build pages</Name>
            <Duration>PT320H0M0S</Duration>
            <Start>2025-01-07T08:00:00</Start>
            <Finish>2025-03-03T17:00:00</Finish>
            <Milestone>0</Milestone>
            <PercentComplete>40</PercentComplete>
            <Critical>1</Critical>
            <PredecessorLink>
                <PredecessorUID>1</PredecessorUID>
                <Type>1</Type>
                <LinkLag>0</LinkLag>
            </PredecessorLink>
        </Task>
        <Task>
            <UID>3</UID>
            <ID>3</ID>
            <Name>Go-Live</Name>
            <Duration>PT0H0M0S</Duration>
            <Start>2025-06-30T17:00:00</Start>
            <Finish>2025-06-30T17:00:00</Finish>
            <Milestone>1</Milestone>
            <PercentComplete>0</PercentComplete>
            <Critical>1</Critical>
            <PredecessorLink>
                <PredecessorUID>2</PredecessorUID>
                <Type>3</Type>
                <LinkLag>4800</LinkLag>
            </PredecessorLink>
        </Task>
    </Tasks>
    <Resources>
        <Resource>
            <UID>1</UID>
            <Name>Alice</Name>
        </Resource>
        <Resource>
            <UID>2</UID>
            <Name>Bob</Name>
        </Resource>
    </Resources>
    <Assignments>
        <Assignment>
            <TaskUID>3</TaskUID>
            <ResourceUID>1</ResourceUID>
        </Assignment>
        <Assignment>
            <TaskUID>3</TaskUID>
            <ResourceUID>2</ResourceUID>
        </Assignment>
    </Assignments>
</Project>
"#;

//! Canonical milestone model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Milestone status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    Upcoming,
    InProgress,
    Completed,
    Overdue,
    Cancelled,
}

impl MilestoneStatus {
    /// Parse free-form status text; anything unrecognised is `Upcoming`
    pub fn parse_or_default(value: &str) -> Self {
        let normalized = value.to_lowercase().replace(['_', '-'], " ");
        let has = |terms: &[&str]| terms.iter().any(|term| normalized.contains(term));

        if has(&["completed", "done", "finished"]) {
            Self::Completed
        } else if has(&["in progress", "active", "working"]) {
            Self::InProgress
        } else if has(&["overdue", "late", "delayed"]) {
            Self::Overdue
        } else if has(&["cancelled", "canceled", "dropped"]) {
            Self::Cancelled
        } else {
            Self::Upcoming
        }
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upcoming => write!(f, "Upcoming"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Completed => write!(f, "Completed"),
            Self::Overdue => write!(f, "Overdue"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A dated project checkpoint normalized from a source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// Identifier, synthesized when the source has none
    pub id: String,

    pub name: String,

    pub description: String,

    /// Always set; unparseable input resolves to the extraction date
    pub target_date: NaiveDate,

    pub actual_date: Option<NaiveDate>,

    pub status: MilestoneStatus,

    /// Free-text category, empty when unknown
    pub milestone_type: String,

    /// Owner or joined list of owners, empty when unknown
    pub owner: String,

    pub approver: String,

    /// Identifiers of prerequisite milestones or tasks, in source order
    pub dependencies: Vec<String>,

    /// Format-specific extras such as extraction provenance
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

impl Milestone {
    /// Create a milestone with defaults for everything but the identity and date
    pub fn new(id: impl Into<String>, name: impl Into<String>, target_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            target_date,
            actual_date: None,
            status: MilestoneStatus::default(),
            milestone_type: String::new(),
            owner: String::new(),
            approver: String::new(),
            dependencies: Vec::new(),
            custom_fields: BTreeMap::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MilestoneStatus::Completed
    }

    /// A completed milestone is never overdue
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed() && today > self.target_date
    }

    pub fn days_until_target(&self, today: NaiveDate) -> i64 {
        (self.target_date - today).num_days()
    }

    /// Actual minus target, in days
    pub fn schedule_variance_days(&self) -> Option<i64> {
        self.actual_date.map(|actual| (actual - self.target_date).num_days())
    }
}

/// Partially known milestone fields gathered by an extractor
///
/// Every field is optional; `build` applies the defaults so that the
/// resulting `Milestone` always has an id, a name, a target date, a status
/// and a (possibly empty) dependency list.
#[derive(Debug, Clone, Default)]
pub struct MilestoneDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub actual_date: Option<NaiveDate>,
    pub status: Option<MilestoneStatus>,
    pub milestone_type: Option<String>,
    pub owner: Option<String>,
    pub approver: Option<String>,
    pub dependencies: Option<Vec<String>>,
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

/// Values used for fields a draft leaves empty
#[derive(Debug, Clone)]
pub struct DraftDefaults<'a> {
    pub today: NaiveDate,
    pub placeholder_name: &'a str,
}

impl MilestoneDraft {
    /// Resolve the draft; `fallback_id` is only invoked when no id was found
    pub fn build(self, defaults: &DraftDefaults<'_>, fallback_id: impl FnOnce() -> String) -> Milestone {
        Milestone {
            id: non_empty(self.id).unwrap_or_else(fallback_id),
            name: non_empty(self.name).unwrap_or_else(|| defaults.placeholder_name.to_string()),
            description: self.description.unwrap_or_default(),
            target_date: self.target_date.unwrap_or(defaults.today),
            actual_date: self.actual_date,
            status: self.status.unwrap_or_default(),
            milestone_type: self.milestone_type.unwrap_or_default(),
            owner: self.owner.unwrap_or_default(),
            approver: self.approver.unwrap_or_default(),
            dependencies: self.dependencies.unwrap_or_default(),
            custom_fields: self.custom_fields,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn defaults(today: NaiveDate) -> DraftDefaults<'static> {
        DraftDefaults { today, placeholder_name: "Untitled Milestone" }
    }

    #[test]
    fn test_status_parse_or_default() {
        assert_eq!(MilestoneStatus::parse_or_default("Completed"), MilestoneStatus::Completed);
        assert_eq!(MilestoneStatus::parse_or_default("done"), MilestoneStatus::Completed);
        assert_eq!(MilestoneStatus::parse_or_default("In_Progress"), MilestoneStatus::InProgress);
        assert_eq!(MilestoneStatus::parse_or_default("in-progress"), MilestoneStatus::InProgress);
        assert_eq!(MilestoneStatus::parse_or_default("Delayed"), MilestoneStatus::Overdue);
        assert_eq!(MilestoneStatus::parse_or_default("canceled"), MilestoneStatus::Cancelled);
        assert_eq!(MilestoneStatus::parse_or_default("on hold"), MilestoneStatus::Upcoming);
        assert_eq!(MilestoneStatus::parse_or_default(""), MilestoneStatus::Upcoming);
    }

    #[test]
    fn test_empty_draft_resolves_defaults() {
        let today = date(2025, 1, 10);
        let milestone = MilestoneDraft::default().build(&defaults(today), || "MS-1".to_string());

        assert_eq!(milestone.id, "MS-1");
        assert_eq!(milestone.name, "Untitled Milestone");
        assert_eq!(milestone.target_date, today);
        assert_eq!(milestone.status, MilestoneStatus::Upcoming);
        assert!(milestone.dependencies.is_empty());
        assert!(milestone.description.is_empty());
    }

    #[test]
    fn test_blank_id_uses_fallback() {
        let draft = MilestoneDraft { id: Some("   ".to_string()), ..Default::default() };
        let milestone = draft.build(&defaults(date(2025, 1, 1)), || "MS-fallback".to_string());
        assert_eq!(milestone.id, "MS-fallback");
    }

    #[test]
    fn test_fallback_not_called_when_id_present() {
        let draft = MilestoneDraft { id: Some("M1".to_string()), ..Default::default() };
        let milestone = draft.build(&defaults(date(2025, 1, 1)), || panic!("fallback used"));
        assert_eq!(milestone.id, "M1");
    }

    #[test]
    fn test_overdue_and_variance() {
        let mut milestone = Milestone::new("M1", "Go-Live", date(2025, 6, 30));
        assert!(milestone.is_overdue(date(2025, 7, 1)));
        assert!(!milestone.is_overdue(date(2025, 6, 30)));
        assert_eq!(milestone.days_until_target(date(2025, 6, 20)), 10);
        assert_eq!(milestone.schedule_variance_days(), None);

        milestone.status = MilestoneStatus::Completed;
        milestone.actual_date = Some(date(2025, 7, 3));
        assert!(!milestone.is_overdue(date(2025, 8, 1)));
        assert_eq!(milestone.schedule_variance_days(), Some(3));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&MilestoneStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}

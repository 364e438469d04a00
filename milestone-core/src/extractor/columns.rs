//! Table column mapping
//!
//! Headers are matched to canonical milestone fields by case-insensitive
//! substring search against a synonym list per field.

use indexmap::IndexMap;
use std::fmt;

use super::RunContext;
use crate::error::RecordError;
use crate::fields::{non_blank, parse_dependencies, parse_optional_date, parse_status};
use crate::handlers::Row;
use crate::model::{Milestone, MilestoneDraft};

/// Milestone attributes a column can feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    MilestoneId,
    Name,
    Description,
    TargetDate,
    ActualDate,
    Status,
    Owner,
    MilestoneType,
    Dependencies,
    Approver,
}

impl CanonicalField {
    /// Match order: a header goes to the first field whose synonyms it contains
    pub const ALL: [CanonicalField; 10] = [
        Self::MilestoneId,
        Self::Name,
        Self::Description,
        Self::TargetDate,
        Self::ActualDate,
        Self::Status,
        Self::Owner,
        Self::MilestoneType,
        Self::Dependencies,
        Self::Approver,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::MilestoneId => "milestone_id",
            Self::Name => "name",
            Self::Description => "description",
            Self::TargetDate => "target_date",
            Self::ActualDate => "actual_date",
            Self::Status => "status",
            Self::Owner => "owner",
            Self::MilestoneType => "milestone_type",
            Self::Dependencies => "dependencies",
            Self::Approver => "approver",
        }
    }

    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            Self::MilestoneId => &["id", "milestone id"],
            Self::Name => &["name", "title", "milestone name"],
            Self::Description => &["description", "detail", "desc"],
            Self::TargetDate => &["target", "due", "deadline", "target date"],
            Self::ActualDate => &["actual", "actual date", "completion date"],
            Self::Status => &["status", "state"],
            Self::Owner => &["owner", "responsible", "assigned"],
            Self::MilestoneType => &["type", "category", "milestone type"],
            Self::Dependencies => &["dependencies", "depends on", "prereq"],
            Self::Approver => &["approval", "approver"],
        }
    }

    fn matches(&self, header_lower: &str) -> bool {
        self.synonyms().iter().any(|synonym| header_lower.contains(synonym))
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Canonical field to originating header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapper {
    mapping: IndexMap<CanonicalField, String>,
}

impl ColumnMapper {
    /// Map headers to fields
    ///
    /// Each header binds at most one field, the first it matches. A field
    /// already bound by an earlier header is never rebound.
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut mapping = IndexMap::new();

        for header in headers {
            let header = header.as_ref();
            let lower = header.trim().to_lowercase();
            if lower.is_empty() {
                continue;
            }

            if let Some(field) = CanonicalField::ALL.into_iter().find(|field| field.matches(&lower)) {
                mapping.entry(field).or_insert_with(|| header.to_string());
            }
        }

        Self { mapping }
    }

    pub fn header_for(&self, field: CanonicalField) -> Option<&str> {
        self.mapping.get(&field).map(String::as_str)
    }

    /// Mapping keyed by field name, in binding order
    pub fn as_named(&self) -> IndexMap<&'static str, &str> {
        self.mapping.iter().map(|(field, header)| (field.key(), header.as_str())).collect()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Raw value of a field in a row
    ///
    /// Unmapped fields fall back to the first row key containing the field
    /// name. Blank values count as missing.
    pub fn value<'r>(&self, row: &'r Row, field: CanonicalField) -> Option<&'r str> {
        let raw = match self.header_for(field) {
            Some(header) => row.get(header).map(String::as_str),
            None => row
                .iter()
                .find(|(key, _)| key.to_lowercase().contains(field.key()))
                .map(|(_, value)| value.as_str()),
        };

        raw.map(str::trim).filter(|value| !value.is_empty())
    }

    /// Convert one row into a milestone
    pub(crate) fn row_to_milestone(
        &self,
        row: &Row,
        ctx: &mut RunContext<'_>,
    ) -> Result<Milestone, RecordError> {
        if row.values().all(|value| value.trim().is_empty()) {
            return Err(RecordError::new("row has no values"));
        }

        let get = |field| self.value(row, field);
        let draft = MilestoneDraft {
            id: get(CanonicalField::MilestoneId).and_then(non_blank),
            name: get(CanonicalField::Name).and_then(non_blank),
            description: get(CanonicalField::Description).and_then(non_blank),
            target_date: parse_optional_date(get(CanonicalField::TargetDate)),
            actual_date: parse_optional_date(get(CanonicalField::ActualDate)),
            status: Some(parse_status(get(CanonicalField::Status))),
            milestone_type: get(CanonicalField::MilestoneType).and_then(non_blank),
            owner: get(CanonicalField::Owner).and_then(non_blank),
            approver: get(CanonicalField::Approver).and_then(non_blank),
            dependencies: Some(get(CanonicalField::Dependencies).map(parse_dependencies).unwrap_or_default()),
            ..Default::default()
        };

        Ok(ctx.build(draft, |ctx| ctx.next_row_id()))
    }
}

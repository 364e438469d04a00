//! Free-text milestone blocks
//!
//! Prose is cut into blocks, blocks that look like milestones are kept, and
//! each kept block is read through a table of labelled-field rules.

use once_cell::sync::Lazy;
use regex::Regex;
use regex_utils::{blocks, dates, fields};
use tracing::{debug, warn};

use super::RunContext;
use crate::config::ExtractorConfig;
use crate::error::RecordError;
use crate::fields::{non_blank, parse_date, parse_dependencies};
use crate::model::{Milestone, MilestoneDraft, MilestoneStatus};

/// One labelled-field extraction: the first capture group of `pattern` is
/// handed to `apply`
pub struct FieldRule {
    pub field: &'static str,
    pub pattern: &'static Lazy<Regex>,
    pub apply: fn(&str, &mut MilestoneDraft),
}

/// Rules run in order; the two id rules give label precedence over header form
pub static FIELD_RULES: [FieldRule; 8] = [
    FieldRule { field: "milestone_id", pattern: &fields::LABELLED_ID, apply: set_id },
    FieldRule { field: "milestone_id", pattern: &fields::HEADER_ID, apply: set_id },
    FieldRule { field: "target_date", pattern: &fields::TARGET_DATE, apply: set_target_date },
    FieldRule { field: "status", pattern: &fields::STATUS, apply: set_status },
    FieldRule { field: "owner", pattern: &fields::OWNER, apply: set_owner },
    FieldRule { field: "dependencies", pattern: &fields::DEPENDENCIES, apply: set_dependencies },
    FieldRule { field: "milestone_type", pattern: &fields::MILESTONE_TYPE, apply: set_milestone_type },
    FieldRule { field: "approver", pattern: &fields::APPROVER, apply: set_approver },
];

fn set_id(value: &str, draft: &mut MilestoneDraft) {
    if draft.id.is_none() {
        draft.id = non_blank(value);
    }
}

fn set_target_date(value: &str, draft: &mut MilestoneDraft) {
    draft.target_date = parse_date(value);
}

fn set_status(value: &str, draft: &mut MilestoneDraft) {
    draft.status = Some(MilestoneStatus::parse_or_default(value));
}

fn set_owner(value: &str, draft: &mut MilestoneDraft) {
    draft.owner = first_line(value);
}

fn set_dependencies(value: &str, draft: &mut MilestoneDraft) {
    draft.dependencies = Some(parse_dependencies(value));
}

fn set_milestone_type(value: &str, draft: &mut MilestoneDraft) {
    draft.milestone_type = first_line(value);
}

fn set_approver(value: &str, draft: &mut MilestoneDraft) {
    draft.approver = first_line(value);
}

fn first_line(value: &str) -> Option<String> {
    value.lines().next().and_then(non_blank)
}

/// Candidate milestone blocks, in document order
///
/// A block qualifies when it mentions a keyword or carries a date-shaped
/// substring.
pub fn locate_entries<'t>(text: &'t str, config: &ExtractorConfig) -> Vec<&'t str> {
    blocks::split(text)
        .into_iter()
        .filter(|block| config.mentions_keyword(block) || dates::contains_date_shape(block))
        .collect()
}

/// Run every rule against a block
pub fn apply_rules(block: &str, draft: &mut MilestoneDraft) {
    for rule in &FIELD_RULES {
        if let Some(value) = fields::capture(rule.pattern, block) {
            debug!("Rule {} matched '{}'", rule.field, value);
            (rule.apply)(value, draft);
        }
    }
}

/// Name from the first non-blank line, minus any `Milestone X:` style label
fn block_name(block: &str, config: &ExtractorConfig) -> Option<String> {
    let line = block.lines().map(str::trim).find(|line| !line.is_empty())?;
    let name: String = line.chars().take(config.name_max_chars).collect();

    match name.split_once(':') {
        Some((_, rest)) if config.mentions_keyword(&name) => non_blank(rest),
        _ => non_blank(&name),
    }
}

/// Parse one candidate block
pub(crate) fn parse_block(block: &str, ctx: &mut RunContext<'_>) -> Result<Milestone, RecordError> {
    let block = block.trim();
    if block.is_empty() {
        return Err(RecordError::new("empty text block"));
    }

    let mut draft = MilestoneDraft {
        name: block_name(block, ctx.config),
        description: Some(block.to_string()),
        ..Default::default()
    };
    apply_rules(block, &mut draft);

    let fallback = format!("{}-{}", ctx.config.id_prefix, block.split_whitespace().count());
    Ok(ctx.build(draft, |_| fallback))
}

/// Locate and parse every milestone block in a text
pub(crate) fn milestones_from_text(text: &str, ctx: &mut RunContext<'_>) -> Vec<Milestone> {
    locate_entries(text, ctx.config)
        .into_iter()
        .filter_map(|block| match parse_block(block, ctx) {
            Ok(milestone) => Some(milestone),
            Err(e) => {
                warn!("Failed to create milestone from text entry: {}", e);
                None
            }
        })
        .collect()
}

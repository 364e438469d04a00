//! Table, section and sheet extraction

use tracing::{debug, warn};

use super::RunContext;
use super::columns::ColumnMapper;
use super::text::milestones_from_text;
use crate::config::ExtractorConfig;
use crate::handlers::{MarkdownDocument, Row, Sheet, SpreadsheetDocument, Table};
use crate::model::Milestone;

/// Tables first, then keyword sections, then the whole text
///
/// A later tier only runs when every earlier tier produced nothing.
pub(crate) fn milestones_from_markdown(
    document: &MarkdownDocument,
    ctx: &mut RunContext<'_>,
) -> Vec<Milestone> {
    let mut milestones = Vec::new();
    for table in &document.tables {
        milestones.extend(milestones_from_table(table, ctx));
    }
    if !milestones.is_empty() {
        return milestones;
    }

    debug!("No table milestones, scanning {} sections", document.sections.len());
    for section in &document.sections {
        if ctx.config.mentions_keyword(&section.content) {
            milestones.extend(milestones_from_text(&section.content, ctx));
        }
    }
    if !milestones.is_empty() {
        return milestones;
    }

    debug!("No section milestones, scanning raw content");
    milestones_from_text(&document.raw_content, ctx)
}

pub(crate) fn milestones_from_table(table: &Table, ctx: &mut RunContext<'_>) -> Vec<Milestone> {
    let mapper = ColumnMapper::new(&table.headers);
    rows_to_milestones(&mapper, table.rows.iter().cloned(), ctx)
}

/// Only sheets whose name or header row mention a keyword are read
pub(crate) fn milestones_from_spreadsheet(
    document: &SpreadsheetDocument,
    ctx: &mut RunContext<'_>,
) -> Vec<Milestone> {
    let mut milestones = Vec::new();
    for sheet in &document.sheets {
        if is_milestone_sheet(sheet, ctx.config) {
            milestones.extend(milestones_from_sheet(sheet, ctx));
        } else {
            debug!("Skipping sheet '{}'", sheet.name);
        }
    }
    milestones
}

pub fn is_milestone_sheet(sheet: &Sheet, config: &ExtractorConfig) -> bool {
    config.mentions_keyword(&sheet.name)
        || sheet.headers().iter().any(|header| config.mentions_keyword(header))
}

fn milestones_from_sheet(sheet: &Sheet, ctx: &mut RunContext<'_>) -> Vec<Milestone> {
    let headers = sheet.headers();
    let mapper = ColumnMapper::new(headers);

    let rows = sheet.data.iter().skip(1).map(|cells| {
        headers
            .iter()
            .enumerate()
            .map(|(idx, header)| (header.clone(), cells.get(idx).cloned().unwrap_or_default()))
            .collect::<Row>()
    });

    rows_to_milestones(&mapper, rows, ctx)
}

fn rows_to_milestones(
    mapper: &ColumnMapper,
    rows: impl Iterator<Item = Row>,
    ctx: &mut RunContext<'_>,
) -> Vec<Milestone> {
    rows.filter_map(|row| match mapper.row_to_milestone(&row, ctx) {
        Ok(milestone) => Some(milestone),
        Err(e) => {
            warn!("Failed to create milestone from row {:?}: {}", row, e);
            None
        }
    })
    .collect()
}

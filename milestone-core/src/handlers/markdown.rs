//! Markdown document handler

use indexmap::IndexMap;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use std::fs;
use std::mem;
use std::path::Path;
use tracing::{debug, info};

use super::DocumentHandler;
use crate::error::{HandlerError, HandlerResult};

/// One table row, header to cell value in column order
pub type Row = IndexMap<String, String>;

/// A table with its header row and data rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// Heading-delimited section; content includes nested subsections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub level: usize,
    pub content: String,
}

/// Structural view of a Markdown file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkdownDocument {
    pub title: Option<String>,
    pub tables: Vec<Table>,
    pub sections: Vec<Section>,
    pub raw_content: String,
}

#[derive(Debug)]
struct HeadingMark {
    level: usize,
    title: String,
    start: usize,
    end: usize,
}

/// Handler for `.md` / `.markdown` files
#[derive(Debug, Default)]
pub struct MarkdownHandler;

impl MarkdownHandler {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a Markdown file
    pub fn extract_data(&self, path: &Path) -> HandlerResult<MarkdownDocument> {
        if !path.exists() {
            return Err(HandlerError::NotFound { path: path.to_path_buf() });
        }

        let bytes = fs::read(path)?;
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(err) => {
                debug!("{} is not valid UTF-8, decoding lossily", path.display());
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };

        let document = self.parse(&content);
        info!(
            "Parsed {}: {} tables, {} sections",
            path.display(),
            document.tables.len(),
            document.sections.len()
        );
        Ok(document)
    }

    /// Parse Markdown text into tables and hierarchical sections
    pub fn parse(&self, content: &str) -> MarkdownDocument {
        let parser = Parser::new_ext(content, Options::ENABLE_TABLES).into_offset_iter();

        let mut headings: Vec<HeadingMark> = Vec::new();
        let mut heading_level: Option<usize> = None;
        let mut heading_text = String::new();

        let mut tables = Vec::new();
        let mut headers: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut current_row: Vec<String> = Vec::new();
        let mut cell = String::new();
        let mut in_cell = false;

        for (event, range) in parser {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    heading_level = Some(level as usize);
                    heading_text.clear();
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(level) = heading_level.take() {
                        headings.push(HeadingMark {
                            level,
                            title: heading_text.trim().to_string(),
                            start: range.start,
                            end: range.end,
                        });
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    if heading_level.is_some() {
                        heading_text.push_str(&text);
                    }
                    if in_cell {
                        cell.push_str(&text);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if in_cell {
                        cell.push(' ');
                    }
                }
                Event::Start(Tag::Table(_)) => {
                    headers.clear();
                    rows.clear();
                }
                Event::Start(Tag::TableHead) | Event::Start(Tag::TableRow) => {
                    current_row.clear();
                }
                Event::End(TagEnd::TableHead) => {
                    headers = mem::take(&mut current_row);
                }
                Event::End(TagEnd::TableRow) => {
                    rows.push(mem::take(&mut current_row));
                }
                Event::Start(Tag::TableCell) => {
                    in_cell = true;
                    cell.clear();
                }
                Event::End(TagEnd::TableCell) => {
                    in_cell = false;
                    current_row.push(cell.trim().to_string());
                }
                Event::End(TagEnd::Table) => {
                    if let Some(table) = build_table(&headers, &rows) {
                        tables.push(table);
                    }
                }
                _ => {}
            }
        }

        let title = headings.iter().find(|h| h.level == 1).map(|h| h.title.clone());
        let sections = build_sections(content, &headings);

        MarkdownDocument { title, tables, sections, raw_content: content.to_string() }
    }
}

impl DocumentHandler for MarkdownHandler {
    fn name(&self) -> &str {
        "Markdown Handler"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }
}

fn build_table(headers: &[String], rows: &[Vec<String>]) -> Option<Table> {
    if headers.is_empty() || rows.is_empty() {
        return None;
    }

    let rows = rows
        .iter()
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| (header.clone(), cells.get(idx).cloned().unwrap_or_default()))
                .collect::<Row>()
        })
        .collect();

    Some(Table { headers: headers.to_vec(), rows })
}

/// A section ends where the next heading of the same or a higher level starts
fn build_sections(content: &str, headings: &[HeadingMark]) -> Vec<Section> {
    headings
        .iter()
        .enumerate()
        .map(|(idx, heading)| {
            let end = headings[idx + 1..]
                .iter()
                .find(|next| next.level <= heading.level)
                .map(|next| next.start)
                .unwrap_or(content.len());
            let body = content.get(heading.end..end).unwrap_or_default();

            Section {
                title: heading.title.clone(),
                level: heading.level,
                content: body.trim().to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const ROADMAP: &str = r#"# Product Roadmap

Intro paragraph.

## Milestones

| ID | Name | Target Date | Status |
|----|------|-------------|--------|
| M1 | Go-Live | 2025-06-30 | Completed |
| M2 | `Beta` Release | 2025-09-01 | Upcoming |

### Notes

Some notes.

## Risks

None yet.
"#;

    #[test]
    fn test_parse_tables() {
        let document = MarkdownHandler::new().parse(ROADMAP);

        assert_eq!(document.tables.len(), 1);
        let table = &document.tables[0];
        assert_eq!(table.headers, vec!["ID", "Name", "Target Date", "Status"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["Name"], "Go-Live");
        assert_eq!(table.rows[1]["Name"], "Beta Release");
    }

    #[test]
    fn test_parse_sections_are_hierarchical() {
        let document = MarkdownHandler::new().parse(ROADMAP);

        assert_eq!(document.title.as_deref(), Some("Product Roadmap"));
        let titles: Vec<_> = document.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Product Roadmap", "Milestones", "Notes", "Risks"]);

        let milestones = &document.sections[1];
        assert_eq!(milestones.level, 2);
        assert!(milestones.content.contains("Go-Live"));
        assert!(milestones.content.contains("Some notes."));
        assert!(!milestones.content.contains("None yet."));

        let root = &document.sections[0];
        assert!(root.content.contains("None yet."));
    }

    #[test]
    fn test_parse_without_headings() {
        let document = MarkdownHandler::new().parse("just text\n\nmore text");
        assert!(document.sections.is_empty());
        assert!(document.tables.is_empty());
        assert_eq!(document.raw_content, "just text\n\nmore text");
    }

    #[test]
    fn test_can_handle() {
        let handler = MarkdownHandler::new();
        assert!(handler.can_handle(Path::new("roadmap.md")));
        assert!(handler.can_handle(Path::new("ROADMAP.Markdown")));
        assert!(!handler.can_handle(Path::new("roadmap.txt")));
    }

    #[test]
    fn test_extract_missing_file() {
        let result = MarkdownHandler::new().extract_data(&PathBuf::from("/no/such/file.md"));
        assert!(matches!(result, Err(HandlerError::NotFound { .. })));
    }
}

//! Spreadsheet handler
//!
//! Uses the calamine crate for reading Excel and OpenDocument workbooks.

use calamine::{Data, Range, Reader, open_workbook_auto};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use super::DocumentHandler;
use crate::error::{HandlerError, HandlerResult};

/// A named sheet as a grid of rendered cells; `data[0]` is the header row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub data: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, data: Vec<Vec<String>>) -> Self {
        Self { name: name.into(), data }
    }

    pub fn headers(&self) -> &[String] {
        self.data.first().map(Vec::as_slice).unwrap_or_default()
    }
}

/// All sheets of a workbook, in workbook order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpreadsheetDocument {
    pub sheets: Vec<Sheet>,
}

/// Handler for `.xlsx`, `.xls`, `.xlsm` and `.ods` workbooks
#[derive(Debug, Default)]
pub struct SpreadsheetHandler;

impl SpreadsheetHandler {
    pub fn new() -> Self {
        Self
    }

    /// Read every sheet of the workbook
    pub fn extract_data(&self, path: &Path) -> HandlerResult<SpreadsheetDocument> {
        if !path.exists() {
            return Err(HandlerError::NotFound { path: path.to_path_buf() });
        }

        let mut workbook = open_workbook_auto(path)?;
        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in sheet_names {
            match workbook.worksheet_range(&name) {
                Ok(range) => sheets.push(Sheet::new(name, render_range(&range))),
                Err(e) => warn!("Skipping unreadable sheet '{}': {}", name, e),
            }
        }

        info!("Read {} sheets from {}", sheets.len(), path.display());
        Ok(SpreadsheetDocument { sheets })
    }
}

impl DocumentHandler for SpreadsheetHandler {
    fn name(&self) -> &str {
        "Excel Handler"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["xlsx", "xls", "xlsm", "ods"]
    }
}

fn render_range(range: &Range<Data>) -> Vec<Vec<String>> {
    range.rows().map(|row| row.iter().map(cell_to_string).collect()).collect()
}

/// Convert a cell value to a string
pub(crate) fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.date().format("%Y-%m-%d").to_string(),
            None => dt.to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Minimal `.xlsx` writer for tests: inline strings plus date-styled serials
#[cfg(test)]
pub(crate) mod testing {
    use std::io::Write;
    use std::path::Path;
    use zip::write::SimpleFileOptions;

    pub(crate) enum Cell<'a> {
        Text(&'a str),
        /// Excel serial day, written with the built-in `m/d/yyyy` format
        Date(f64),
    }

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#;

    const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

    fn column_letter(idx: usize) -> char {
        (b'A' + idx as u8) as char
    }

    fn sheet_xml(rows: &[Vec<Cell<'_>>]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (r, row) in rows.iter().enumerate() {
            xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, cell) in row.iter().enumerate() {
                let reference = format!("{}{}", column_letter(c), r + 1);
                match cell {
                    Cell::Text(text) => xml.push_str(&format!(
                        r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        reference, text
                    )),
                    Cell::Date(serial) => {
                        xml.push_str(&format!(r#"<c r="{}" s="1"><v>{}</v></c>"#, reference, serial))
                    }
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }

    /// Write a workbook whose sheets appear in the given order
    pub(crate) fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<Cell<'_>>>)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        let mut workbook = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
        );
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (idx, (name, _)) in sheets.iter().enumerate() {
            let n = idx + 1;
            workbook.push_str(&format!(r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#, name, n, n));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                n, n
            ));
        }
        workbook.push_str("</sheets></workbook>");
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#,
            sheets.len() + 1
        ));

        let mut entries = vec![
            ("[Content_Types].xml".to_string(), CONTENT_TYPES.to_string()),
            ("_rels/.rels".to_string(), ROOT_RELS.to_string()),
            ("xl/workbook.xml".to_string(), workbook),
            ("xl/_rels/workbook.xml.rels".to_string(), rels),
            ("xl/styles.xml".to_string(), STYLES.to_string()),
        ];
        for (idx, (_, rows)) in sheets.iter().enumerate() {
            entries.push((format!("xl/worksheets/sheet{}.xml", idx + 1), sheet_xml(rows)));
        }

        for (name, body) in entries {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
}

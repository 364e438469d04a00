//! Regex utilities for milestone-scan
//! Extracted to a separate crate for compilation optimization

use once_cell::sync::Lazy;
use regex::Regex;

/// Date-shaped substrings used to spot milestones that carry no keyword
pub mod dates {
    use super::*;

    pub static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}").expect("Invalid regex pattern")
    });

    /// Check whether text contains something that looks like a numeric date
    pub fn contains_date_shape(text: &str) -> bool {
        DATE_SHAPE.is_match(text)
    }
}

/// Splitting free text into blocks
pub mod blocks {
    use super::*;

    /// Blank-line runs, or a whole line of 3+ `-` or `=` characters (LF or CRLF)
    pub static DELIMITER: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)\n\s*\n|^[ \t]*(?:-{3,}|={3,})[ \t]*\r?$")
            .expect("Invalid regex pattern")
    });

    /// Split text on delimiters, dropping blocks that are blank after trimming
    pub fn split(text: &str) -> Vec<&str> {
        DELIMITER
            .split(text)
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .collect()
    }
}

/// Labelled fields inside a free-text milestone block
pub mod fields {
    use super::*;

    /// `ID: M1` or `Milestone ID: M1`
    pub static LABELLED_ID: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(?:milestone[ \t]*id|id)[ \t]*[:=][ \t]*([A-Za-z0-9_-]+)")
            .expect("Invalid regex pattern")
    });

    /// `Milestone M1:` header form
    pub static HEADER_ID: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\bmilestone[ \t]+([A-Za-z0-9_-]+)[ \t]*:").expect("Invalid regex pattern")
    });

    pub static TARGET_DATE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?i)(?:target\s*date|due|deadline|date)[:=\s]*(\d{4}[-/]\d{1,2}[-/]\d{1,2}|\d{1,2}[-/]\d{1,2}[-/]\d{2,4})",
        )
        .expect("Invalid regex pattern")
    });

    pub static STATUS: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?i)(?:status|state)[:=\s]*(upcoming|in[_\s-]progress|completed|overdue|cancelled|canceled)",
        )
        .expect("Invalid regex pattern")
    });

    /// Greedy over letters, whitespace and commas; callers cut at the first newline
    pub static OWNER: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)(?:owner|responsible|assigned\s*to)[:=\s]*([A-Za-z\s,]+)")
            .expect("Invalid regex pattern")
    });

    pub static DEPENDENCIES: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?i)(?:dependencies|depends?\s*on|prerequisites?)[:=\s]*([A-Za-z0-9_,\s-]+?)(?:\n|$)",
        )
        .expect("Invalid regex pattern")
    });

    pub static MILESTONE_TYPE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(?:type|category)[ \t]*[:=][ \t]*([A-Za-z][A-Za-z \t]*)")
            .expect("Invalid regex pattern")
    });

    pub static APPROVER: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(?:approver|approval)[ \t]*[:=][ \t]*([A-Za-z][A-Za-z \t]*)")
            .expect("Invalid regex pattern")
    });

    /// First capture group of `pattern` in `text`
    pub fn capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
        pattern.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str())
    }
}

/// Delimited lists such as dependency cells
pub mod lists {
    use super::*;

    pub static SEPARATOR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[,;|\n]").expect("Invalid regex pattern"));
}

/// ISO-8601 durations as written by project-schedule XML (`PT8H0M0S`)
pub mod duration {
    use super::*;

    pub static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"^P(?:(\d+(?:\.\d+)?)D)?(?:T(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
        )
        .expect("Invalid regex pattern")
    });

    /// Convert an ISO-8601 duration to hours; days count as 24 hours
    pub fn hours(text: &str) -> Option<f64> {
        let caps = ISO_DURATION.captures(text.trim())?;
        let part = |idx: usize| -> f64 {
            caps.get(idx).and_then(|m| m.as_str().parse::<f64>().ok()).unwrap_or(0.0)
        };

        Some(part(1) * 24.0 + part(2) + part(3) / 60.0 + part(4) / 3600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_shape_detection() {
        assert!(dates::contains_date_shape("Launch on 3/15/2025"));
        assert!(dates::contains_date_shape("due 15-03-25"));
        assert!(!dates::contains_date_shape("Launch in Q3"));
        // ISO dates have a four-digit lead, the shape only looks for short fields
        assert!(!dates::contains_date_shape("2025"));
    }

    #[test]
    fn test_block_split() {
        let text = "First block\nstill first\n\n\nSecond block\n---\nThird block\n===\nFourth";
        let blocks = blocks::split(text);
        assert_eq!(blocks, vec!["First block\nstill first", "Second block", "Third block", "Fourth"]);
    }

    #[test]
    fn test_block_split_separator_after_blank_line() {
        assert_eq!(blocks::split("A\n\n---\nB"), vec!["A", "B"]);
        assert_eq!(blocks::split("A\n\n===\n\nB"), vec!["A", "B"]);
    }

    #[test]
    fn test_block_split_consecutive_separators() {
        assert_eq!(blocks::split("A\n---\n===\nB"), vec!["A", "B"]);
        assert_eq!(blocks::split("---\nA\n-----\n"), vec!["A"]);
    }

    #[test]
    fn test_block_split_crlf() {
        let blocks = blocks::split("Milestone A: alpha\r\n---\r\nMilestone B: beta\r\n\r\nC");
        assert_eq!(blocks, vec!["Milestone A: alpha", "Milestone B: beta", "C"]);
    }

    #[test]
    fn test_block_split_keeps_inline_dashes() {
        assert_eq!(blocks::split("Phase --- one").len(), 1);
    }

    #[test]
    fn test_block_split_keeps_short_dashes() {
        let blocks = blocks::split("- item one\n- item two");
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_labelled_id_capture() {
        assert_eq!(fields::capture(&fields::LABELLED_ID, "Milestone ID: M-42"), Some("M-42"));
        assert_eq!(fields::capture(&fields::LABELLED_ID, "id = alpha_1"), Some("alpha_1"));
        assert_eq!(fields::capture(&fields::LABELLED_ID, "Milestone M9: Beta"), None);
        assert_eq!(fields::capture(&fields::HEADER_ID, "Milestone M9: Beta"), Some("M9"));
    }

    #[test]
    fn test_target_date_capture() {
        assert_eq!(
            fields::capture(&fields::TARGET_DATE, "Target Date: 2025-09-01"),
            Some("2025-09-01")
        );
        assert_eq!(fields::capture(&fields::TARGET_DATE, "Due 03/15/2025"), Some("03/15/2025"));
    }

    #[test]
    fn test_dependencies_stop_at_newline() {
        let text = "Depends on: M1, M2\nOwner: Alice";
        assert_eq!(fields::capture(&fields::DEPENDENCIES, text), Some("M1, M2"));
    }

    #[test]
    fn test_iso_duration_hours() {
        assert_eq!(duration::hours("PT0H0M0S"), Some(0.0));
        assert_eq!(duration::hours("PT8H0M0S"), Some(8.0));
        assert_eq!(duration::hours("PT7H30M0S"), Some(7.5));
        assert_eq!(duration::hours("P1D"), Some(24.0));
        assert_eq!(duration::hours("eight hours"), None);
    }
}

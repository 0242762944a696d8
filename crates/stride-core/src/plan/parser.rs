//! Plan CSV parser.
//!
//! Turns the text of a plan file into an ordered list of [`PlanDay`]s:
//! - Blank lines are dropped; the first remaining line is the header.
//! - Header cells are normalised (lower-case, alphanumerics only) and
//!   mapped to column indices.
//! - Each target field is looked up by header name and falls back to a
//!   fixed position when the header does not name it.
//!
//! Parsing never fails. Short or empty input produces an empty plan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::csv::parse_csv_line;
use super::types::PlanDay;

/// Errors from reading a plan file. Parsing itself cannot fail.
#[derive(Debug, Error)]
pub enum PlanLoadError {
    #[error("failed to read plan file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where one target field lives: its normalised header name and the
/// column to use when the header row does not contain that name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub fallback: usize,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, fallback: usize) -> Self {
        Self {
            name: name.into(),
            fallback,
        }
    }
}

/// Column mapping for every [`PlanDay`] field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanColumns {
    pub date: ColumnSpec,
    pub day: ColumnSpec,
    pub main_workout: ColumnSpec,
    pub abs_focus: ColumnSpec,
    pub plank_focus: ColumnSpec,
    pub lower_back: ColumnSpec,
}

impl Default for PlanColumns {
    fn default() -> Self {
        Self {
            date: ColumnSpec::new("date", 0),
            day: ColumnSpec::new("day", 1),
            main_workout: ColumnSpec::new("mainworkout", 2),
            abs_focus: ColumnSpec::new("absfocus", 3),
            plank_focus: ColumnSpec::new("plankfocus", 4),
            lower_back: ColumnSpec::new("lowerback", 5),
        }
    }
}

/// Normalise a header cell: lower-case and keep only alphanumerics.
///
/// `"Main Workout"` becomes `"mainworkout"`, `"Lower-Back"` becomes
/// `"lowerback"`.
pub fn normalize_header(cell: &str) -> String {
    cell.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Header-aware plan parser.
#[derive(Debug, Clone, Default)]
pub struct PlanParser {
    columns: PlanColumns,
}

impl PlanParser {
    pub fn new(columns: PlanColumns) -> Self {
        Self { columns }
    }

    /// Parse plan text into days, in file order.
    pub fn parse(&self, content: &str) -> Vec<PlanDay> {
        let lines: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if lines.len() < 2 {
            debug!(lines = lines.len(), "plan has no data rows");
            return Vec::new();
        }

        let header: HashMap<String, usize> = parse_csv_line(lines[0])
            .iter()
            .enumerate()
            .map(|(index, cell)| (normalize_header(cell), index))
            .collect();

        let days: Vec<PlanDay> = lines[1..]
            .iter()
            .map(|row| {
                let fields = parse_csv_line(row);
                let cell = |spec: &ColumnSpec| {
                    let index = header.get(&spec.name).copied().unwrap_or(spec.fallback);
                    fields.get(index).cloned().unwrap_or_default()
                };
                PlanDay {
                    date: cell(&self.columns.date),
                    day: cell(&self.columns.day),
                    main_workout: cell(&self.columns.main_workout),
                    plank_focus: cell(&self.columns.plank_focus),
                    abs_focus: cell(&self.columns.abs_focus),
                    lower_back: cell(&self.columns.lower_back),
                }
            })
            .collect();

        debug!(days = days.len(), "parsed plan");
        days
    }
}

/// Parse plan text with the default column mapping.
pub fn parse_plan(content: &str) -> Vec<PlanDay> {
    PlanParser::default().parse(content)
}

/// Read and parse a plan file, reporting I/O failures.
pub fn read_plan(path: impl AsRef<Path>) -> Result<Vec<PlanDay>, PlanLoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| PlanLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_plan(&content))
}

/// Read and parse a plan file. An unreadable file yields an empty plan.
pub fn load_plan(path: impl AsRef<Path>) -> Vec<PlanDay> {
    match read_plan(path) {
        Ok(days) => days,
        Err(e) => {
            warn!(error = %e, "using an empty plan");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = "\
Date,Day,Main Workout,Abs Focus,Plank Focus,Lower Back
2026-01-05,Mon,\"Strength: Squats, Bench\",Crunches,Side plank,\"Bird dog, Bridge\"
2026-01-06,Tue,Run 5k,Leg raises,Front plank,
";

    #[test]
    fn parses_rows_after_header() {
        let days = parse_plan(PLAN);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2026-01-05");
        assert_eq!(days[0].day, "Mon");
        assert_eq!(days[0].main_workout, "Strength: Squats, Bench");
        assert_eq!(days[0].abs_focus, "Crunches");
        assert_eq!(days[0].plank_focus, "Side plank");
        assert_eq!(days[0].lower_back, "Bird dog, Bridge");
        assert_eq!(days[1].lower_back, "");
    }

    #[test]
    fn empty_input_yields_no_days() {
        assert!(parse_plan("").is_empty());
    }

    #[test]
    fn header_only_yields_no_days() {
        assert!(parse_plan("header-only-line").is_empty());
    }

    #[test]
    fn blank_lines_are_not_days() {
        let text = "\n\ndate,day\n\n   \nJan 5,Mon\n\n\nJan 6,Tue\n\n";
        let days = parse_plan(text);
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].date, "Jan 6");
    }

    #[test]
    fn row_count_is_non_blank_lines_minus_header() {
        let text = "h\na\nb\n\nc\n";
        assert_eq!(parse_plan(text).len(), 3);
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let text = "date,day,mainworkout\r\nJan 5,Mon,Run\r\nJan 6,Tue,Rest\r\n";
        let days = parse_plan(text);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].main_workout, "Run");
        assert_eq!(days[1].day, "Tue");
    }

    #[test]
    fn reordered_header_is_honoured() {
        let days = parse_plan("day,date,mainworkout\nMon,2026-01-05,Run");
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, "2026-01-05");
        assert_eq!(days[0].day, "Mon");
        assert_eq!(days[0].main_workout, "Run");
        // absfocus is not in the header and column 3 does not exist.
        assert_eq!(days[0].abs_focus, "");
    }

    #[test]
    fn unknown_header_falls_back_to_position() {
        let days = parse_plan("a,b,c,d,e,f\nJan 5,Mon,Run,Crunches,Plank,Bridge");
        assert_eq!(days[0].date, "Jan 5");
        assert_eq!(days[0].day, "Mon");
        assert_eq!(days[0].main_workout, "Run");
        assert_eq!(days[0].abs_focus, "Crunches");
        assert_eq!(days[0].plank_focus, "Plank");
        assert_eq!(days[0].lower_back, "Bridge");
    }

    #[test]
    fn short_rows_fill_missing_cells_with_empty_strings() {
        let days = parse_plan("date,day,mainworkout,absfocus\nJan 5");
        assert_eq!(days[0].date, "Jan 5");
        assert_eq!(days[0].day, "");
        assert_eq!(days[0].main_workout, "");
        assert_eq!(days[0].abs_focus, "");
    }

    #[test]
    fn custom_columns_are_used() {
        let columns = PlanColumns {
            main_workout: ColumnSpec::new("session", 9),
            ..PlanColumns::default()
        };
        let parser = PlanParser::new(columns);
        let days = parser.parse("date,day,session\nJan 5,Mon,Swim");
        assert_eq!(days[0].main_workout, "Swim");
    }

    #[test]
    fn normalize_header_strips_punctuation_and_case() {
        assert_eq!(normalize_header("Main Workout"), "mainworkout");
        assert_eq!(normalize_header(" Lower-Back "), "lowerback");
        assert_eq!(normalize_header("ABS_focus!"), "absfocus");
    }

    #[test]
    fn duplicate_identities_are_kept() {
        let days = parse_plan("date,day\nJan 5,Mon\nJan 5,Mon");
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].id(), days[1].id());
    }

    #[test]
    fn reparsing_is_deterministic() {
        assert_eq!(parse_plan(PLAN), parse_plan(PLAN));
    }

    #[test]
    fn read_plan_reports_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = read_plan(tmp.path().join("missing.csv")).unwrap_err();
        assert!(
            matches!(err, PlanLoadError::Io { .. }),
            "expected Io error, got: {err}"
        );
    }

    #[test]
    fn load_plan_treats_missing_file_as_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(load_plan(tmp.path().join("missing.csv")).is_empty());
    }

    #[test]
    fn load_plan_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plan.csv");
        std::fs::write(&path, PLAN).unwrap();
        assert_eq!(load_plan(&path).len(), 2);
    }
}

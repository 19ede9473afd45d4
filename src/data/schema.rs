//! Schema Normalization Module
//! Turns a parsed CSV table into fully populated `EducationRecord`s.
//!
//! Base columns are required. The three derived columns are passed through
//! when the source already carries them and computed here otherwise, so no
//! record leaves this module with a "maybe present" metric.

use log::{debug, warn};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Cursor;
use thiserror::Error;

pub const PROVINCE: &str = "Province";
pub const TOTAL_ENROLMENT: &str = "Total Enrolment";
pub const GIRLS_ENROLLED: &str = "Girls Enrolled";
pub const TOTAL_TEACHERS: &str = "Total Teachers";
pub const FEMALE_TEACHERS: &str = "Female Teachers";
pub const STUDENT_TEACHER_RATIO: &str = "Student–Teacher Ratio";
pub const PCT_GIRLS_ENROLLED: &str = "% Girls Enrolled";
pub const PCT_FEMALE_TEACHERS: &str = "% Female Teachers";

/// Spellings accepted for the ratio header. Some exports flatten the en dash.
const STUDENT_TEACHER_RATIO_ALIASES: [&str; 2] =
    [STUDENT_TEACHER_RATIO, "Student-Teacher Ratio"];

/// Cell texts read as missing, the same set pandas' `read_csv` treats as NA.
const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Dataset is empty")]
    Empty,
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("Row {row}: missing value for '{column}'")]
    MissingValue { column: &'static str, row: usize },
    #[error("Row {row}: invalid value '{value}' for '{column}'")]
    InvalidValue {
        column: &'static str,
        row: usize,
        value: String,
    },
    #[error("Row {row}: {part} ({part_value}) exceeds {whole} ({whole_value})")]
    InconsistentCounts {
        row: usize,
        part: &'static str,
        part_value: u64,
        whole: &'static str,
        whole_value: u64,
    },
    #[error("Province '{0}' appears more than once")]
    DuplicateProvince(String),
}

/// What to do when the same province shows up on several rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep every row; lookups use the first one.
    #[default]
    FirstMatch,
    /// Fail the load.
    Reject,
}

/// How strictly subset counts are checked against their totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Reject the whole dataset.
    #[default]
    Strict,
    /// Log a warning and keep the row. Percentages may then exceed 100.
    Lenient,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub duplicate_policy: DuplicatePolicy,
    pub validation: ValidationMode,
}

/// One province-year observation with every metric resolved.
///
/// A derived metric is `None` when its denominator is zero (or when a
/// pre-computed source cell is empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationRecord {
    pub province: String,
    pub total_enrolment: u64,
    pub girls_enrolled: u64,
    pub total_teachers: u64,
    pub female_teachers: u64,
    pub student_teacher_ratio: Option<f64>,
    pub pct_girls_enrolled: Option<f64>,
    pub pct_female_teachers: Option<f64>,
}

impl EducationRecord {
    /// Build a record from base counts, computing all derived metrics.
    pub fn from_counts(
        province: impl Into<String>,
        total_enrolment: u64,
        girls_enrolled: u64,
        total_teachers: u64,
        female_teachers: u64,
    ) -> Self {
        Self {
            province: province.into(),
            total_enrolment,
            girls_enrolled,
            total_teachers,
            female_teachers,
            student_teacher_ratio: ratio(total_enrolment, total_teachers),
            pct_girls_enrolled: percentage(girls_enrolled, total_enrolment),
            pct_female_teachers: percentage(female_teachers, total_teachers),
        }
    }
}

/// Round to two decimals, ties to even (matches numpy's `round`).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// `numerator / denominator` rounded to two decimals; `None` on a zero denominator.
pub fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(round2(numerator as f64 / denominator as f64))
}

/// `part / whole * 100` rounded to two decimals; `None` when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    Some(round2(part as f64 / whole as f64 * 100.0))
}

/// Which derived columns came from the source rather than being computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivedColumns {
    pub student_teacher_ratio: bool,
    pub pct_girls_enrolled: bool,
    pub pct_female_teachers: bool,
}

/// Parse raw bytes as a header-first CSV table.
pub fn parse_csv(bytes: Vec<u8>) -> Result<DataFrame, ParseError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ParseError::Empty);
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    Ok(df)
}

/// Resolved column handles for one table.
struct Columns<'a> {
    province: &'a Column,
    total_enrolment: &'a Column,
    girls_enrolled: &'a Column,
    total_teachers: &'a Column,
    female_teachers: &'a Column,
    student_teacher_ratio: Option<&'a Column>,
    pct_girls_enrolled: Option<&'a Column>,
    pct_female_teachers: Option<&'a Column>,
}

impl<'a> Columns<'a> {
    fn resolve(df: &'a DataFrame) -> Result<Self, ParseError> {
        let required = |name: &'static str| {
            find_column(df, &[name]).ok_or(ParseError::MissingColumn(name))
        };

        Ok(Self {
            province: required(PROVINCE)?,
            total_enrolment: required(TOTAL_ENROLMENT)?,
            girls_enrolled: required(GIRLS_ENROLLED)?,
            total_teachers: required(TOTAL_TEACHERS)?,
            female_teachers: required(FEMALE_TEACHERS)?,
            student_teacher_ratio: find_column(df, &STUDENT_TEACHER_RATIO_ALIASES),
            pct_girls_enrolled: find_column(df, &[PCT_GIRLS_ENROLLED]),
            pct_female_teachers: find_column(df, &[PCT_FEMALE_TEACHERS]),
        })
    }

    fn derived(&self) -> DerivedColumns {
        DerivedColumns {
            student_teacher_ratio: self.student_teacher_ratio.is_some(),
            pct_girls_enrolled: self.pct_girls_enrolled.is_some(),
            pct_female_teachers: self.pct_female_teachers.is_some(),
        }
    }
}

/// Header lookup tolerant of stray whitespace around names.
fn find_column<'a>(df: &'a DataFrame, aliases: &[&str]) -> Option<&'a Column> {
    df.get_columns()
        .iter()
        .find(|col| aliases.iter().any(|alias| col.name().trim() == *alias))
}

/// Normalize a parsed table into records, in source row order.
pub fn normalize(
    df: &DataFrame,
    options: NormalizeOptions,
) -> Result<(Vec<EducationRecord>, DerivedColumns), ParseError> {
    let columns = Columns::resolve(df)?;
    let derived = columns.derived();
    debug!(
        "Derived columns present in source: ratio={}, girls={}, female_teachers={}",
        derived.student_teacher_ratio, derived.pct_girls_enrolled, derived.pct_female_teachers
    );

    let records = (0..df.height())
        .into_par_iter()
        .map(|row| normalize_row(&columns, row, options.validation))
        .collect::<Result<Vec<_>, ParseError>>()?;

    check_duplicates(&records, options.duplicate_policy)?;

    Ok((records, derived))
}

fn normalize_row(
    columns: &Columns<'_>,
    row: usize,
    validation: ValidationMode,
) -> Result<EducationRecord, ParseError> {
    let province = province_cell(columns.province, row)?;
    let total_enrolment = count_cell(columns.total_enrolment, TOTAL_ENROLMENT, row)?;
    let girls_enrolled = count_cell(columns.girls_enrolled, GIRLS_ENROLLED, row)?;
    let total_teachers = count_cell(columns.total_teachers, TOTAL_TEACHERS, row)?;
    let female_teachers = count_cell(columns.female_teachers, FEMALE_TEACHERS, row)?;

    check_subset(
        row,
        (GIRLS_ENROLLED, girls_enrolled),
        (TOTAL_ENROLMENT, total_enrolment),
        validation,
    )?;
    check_subset(
        row,
        (FEMALE_TEACHERS, female_teachers),
        (TOTAL_TEACHERS, total_teachers),
        validation,
    )?;

    let student_teacher_ratio = match columns.student_teacher_ratio {
        Some(col) => metric_cell(col, STUDENT_TEACHER_RATIO, row)?,
        None => ratio(total_enrolment, total_teachers),
    };
    let pct_girls_enrolled = match columns.pct_girls_enrolled {
        Some(col) => metric_cell(col, PCT_GIRLS_ENROLLED, row)?,
        None => percentage(girls_enrolled, total_enrolment),
    };
    let pct_female_teachers = match columns.pct_female_teachers {
        Some(col) => metric_cell(col, PCT_FEMALE_TEACHERS, row)?,
        None => percentage(female_teachers, total_teachers),
    };

    Ok(EducationRecord {
        province,
        total_enrolment,
        girls_enrolled,
        total_teachers,
        female_teachers,
        student_teacher_ratio,
        pct_girls_enrolled,
        pct_female_teachers,
    })
}

fn check_subset(
    row: usize,
    (part, part_value): (&'static str, u64),
    (whole, whole_value): (&'static str, u64),
    validation: ValidationMode,
) -> Result<(), ParseError> {
    if part_value <= whole_value {
        return Ok(());
    }

    let err = ParseError::InconsistentCounts {
        row,
        part,
        part_value,
        whole,
        whole_value,
    };
    match validation {
        ValidationMode::Strict => Err(err),
        ValidationMode::Lenient => {
            warn!("{}", err);
            Ok(())
        }
    }
}

fn check_duplicates(
    records: &[EducationRecord],
    policy: DuplicatePolicy,
) -> Result<(), ParseError> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.province.as_str()) {
            match policy {
                DuplicatePolicy::Reject => {
                    return Err(ParseError::DuplicateProvince(record.province.clone()))
                }
                DuplicatePolicy::FirstMatch => warn!(
                    "Province '{}' appears more than once; the first row wins",
                    record.province
                ),
            }
        }
    }
    Ok(())
}

fn province_cell(col: &Column, row: usize) -> Result<String, ParseError> {
    let missing = ParseError::MissingValue {
        column: PROVINCE,
        row,
    };
    let name = match col.get(row)? {
        AnyValue::Null => return Err(missing),
        AnyValue::String(s) => s.trim().to_string(),
        AnyValue::StringOwned(s) => s.trim().to_string(),
        other => other.to_string().trim_matches('"').trim().to_string(),
    };
    if name.is_empty() || is_na(&name) {
        return Err(missing);
    }
    Ok(name)
}

/// Read a cell as a number. `Ok(None)` for an empty cell.
fn number_cell(
    col: &Column,
    column: &'static str,
    row: usize,
) -> Result<Option<f64>, ParseError> {
    let invalid = |value: String| ParseError::InvalidValue { column, row, value };

    match col.get(row)? {
        AnyValue::Null => Ok(None),
        AnyValue::String(s) => parse_number(s).map_err(invalid),
        AnyValue::StringOwned(s) => parse_number(s.as_str()).map_err(invalid),
        other => other
            .extract::<f64>()
            .map(Some)
            .ok_or_else(|| invalid(other.to_string())),
    }
}

fn is_na(text: &str) -> bool {
    NA_TOKENS.contains(&text)
}

/// Textual numbers may carry thousands separators or a trailing percent sign.
/// NA markers read as an empty cell.
fn parse_number(raw: &str) -> Result<Option<f64>, String> {
    if is_na(raw.trim()) {
        return Ok(None);
    }
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned.parse::<f64>().map(Some).map_err(|_| raw.to_string())
}

fn count_cell(col: &Column, column: &'static str, row: usize) -> Result<u64, ParseError> {
    let value = number_cell(col, column, row)?.ok_or(ParseError::MissingValue { column, row })?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(ParseError::InvalidValue {
            column,
            row,
            value: value.to_string(),
        });
    }
    Ok(value as u64)
}

fn metric_cell(
    col: &Column,
    column: &'static str,
    row: usize,
) -> Result<Option<f64>, ParseError> {
    Ok(number_cell(col, column, row)?.filter(|v| v.is_finite()))
}

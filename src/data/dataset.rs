//! In-memory education dataset.

use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use super::schema::{
    DerivedColumns, EducationRecord, FEMALE_TEACHERS, GIRLS_ENROLLED, PCT_FEMALE_TEACHERS,
    PCT_GIRLS_ENROLLED, PROVINCE, STUDENT_TEACHER_RATIO, TOTAL_ENROLMENT, TOTAL_TEACHERS,
};

/// Immutable, ordered collection of province records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EducationDataset {
    records: Vec<EducationRecord>,
    derived_in_source: DerivedColumns,
}

impl EducationDataset {
    pub fn new(records: Vec<EducationRecord>) -> Self {
        Self {
            records,
            derived_in_source: DerivedColumns::default(),
        }
    }

    pub(crate) fn with_derived(records: Vec<EducationRecord>, derived: DerivedColumns) -> Self {
        Self {
            records,
            derived_in_source: derived,
        }
    }

    pub fn records(&self) -> &[EducationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Which derived columns were read from the source instead of computed.
    pub fn derived_in_source(&self) -> DerivedColumns {
        self.derived_in_source
    }

    /// First record for `province`, if any.
    pub fn find(&self, province: &str) -> Option<&EducationRecord> {
        self.records.iter().find(|r| r.province == province)
    }

    /// Distinct province names, sorted.
    pub fn provinces(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.province.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Rebuild a DataFrame with the source column names, derived columns included.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let rs = &self.records;
        DataFrame::new(vec![
            Column::new(
                PROVINCE.into(),
                rs.iter().map(|r| r.province.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                TOTAL_ENROLMENT.into(),
                rs.iter().map(|r| r.total_enrolment).collect::<Vec<_>>(),
            ),
            Column::new(
                GIRLS_ENROLLED.into(),
                rs.iter().map(|r| r.girls_enrolled).collect::<Vec<_>>(),
            ),
            Column::new(
                TOTAL_TEACHERS.into(),
                rs.iter().map(|r| r.total_teachers).collect::<Vec<_>>(),
            ),
            Column::new(
                FEMALE_TEACHERS.into(),
                rs.iter().map(|r| r.female_teachers).collect::<Vec<_>>(),
            ),
            Column::new(
                STUDENT_TEACHER_RATIO.into(),
                rs.iter()
                    .map(|r| r.student_teacher_ratio)
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                PCT_GIRLS_ENROLLED.into(),
                rs.iter().map(|r| r.pct_girls_enrolled).collect::<Vec<_>>(),
            ),
            Column::new(
                PCT_FEMALE_TEACHERS.into(),
                rs.iter().map(|r| r.pct_female_teachers).collect::<Vec<_>>(),
            ),
        ])
    }

    /// Write the full table, derived columns included, as CSV.
    pub fn write_csv(&self, path: &Path) -> PolarsResult<()> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EducationDataset {
        EducationDataset::new(vec![
            EducationRecord::from_counts("Takeo", 900, 430, 30, 12),
            EducationRecord::from_counts("Battambang", 800, 400, 0, 0),
            EducationRecord::from_counts("Kandal", 700, 350, 35, 20),
            EducationRecord::from_counts("Battambang", 1, 1, 1, 1),
        ])
    }

    #[test]
    fn provinces_are_sorted_and_unique() {
        assert_eq!(sample().provinces(), vec!["Battambang", "Kandal", "Takeo"]);
    }

    #[test]
    fn find_returns_first_match() {
        let ds = sample();
        assert_eq!(ds.find("Battambang").unwrap().total_enrolment, 800);
        assert!(ds.find("Pailin").is_none());
    }

    #[test]
    fn dataframe_keeps_nulls_for_undefined_metrics() {
        let df = sample().to_dataframe().unwrap();
        assert_eq!(df.height(), 4);
        assert_eq!(df.width(), 8);
        let ratio = df.column(STUDENT_TEACHER_RATIO).unwrap();
        assert_eq!(ratio.null_count(), 1);
    }
}

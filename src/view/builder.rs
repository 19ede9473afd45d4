//! Province View Builder
//! Pulls one province out of the dataset and shapes it for display.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::data::{EducationDataset, EducationRecord};

pub const TOTAL_ENROLLED_LABEL: &str = "Total Enrolled";
pub const GIRLS_ENROLLED_LABEL: &str = "Girls Enrolled";
pub const TOTAL_TEACHERS_LABEL: &str = "Total Teachers";
pub const FEMALE_TEACHERS_LABEL: &str = "Female Teachers";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("Province '{province}' not found in dataset")]
    NotFound { province: String },
}

/// One labelled bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub label: &'static str,
    pub value: u64,
}

impl SeriesPoint {
    pub fn new(label: &'static str, value: u64) -> Self {
        Self { label, value }
    }
}

/// Metrics and comparison series for a single province.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceView {
    pub province: String,
    pub pct_girls_enrolled: Option<f64>,
    pub pct_female_teachers: Option<f64>,
    pub student_teacher_ratio: Option<f64>,
    pub enrollment_series: [SeriesPoint; 2],
    pub staffing_series: [SeriesPoint; 2],
}

impl ProvinceView {
    fn from_record(record: &EducationRecord) -> Self {
        Self {
            province: record.province.clone(),
            pct_girls_enrolled: record.pct_girls_enrolled,
            pct_female_teachers: record.pct_female_teachers,
            student_teacher_ratio: record.student_teacher_ratio,
            enrollment_series: [
                SeriesPoint::new(TOTAL_ENROLLED_LABEL, record.total_enrolment),
                SeriesPoint::new(GIRLS_ENROLLED_LABEL, record.girls_enrolled),
            ],
            staffing_series: [
                SeriesPoint::new(TOTAL_TEACHERS_LABEL, record.total_teachers),
                SeriesPoint::new(FEMALE_TEACHERS_LABEL, record.female_teachers),
            ],
        }
    }

    pub fn girls_enrolled_display(&self) -> MetricDisplay {
        MetricDisplay::Percent(self.pct_girls_enrolled)
    }

    pub fn female_teachers_display(&self) -> MetricDisplay {
        MetricDisplay::Percent(self.pct_female_teachers)
    }

    pub fn ratio_display(&self) -> MetricDisplay {
        MetricDisplay::Plain(self.student_teacher_ratio)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Formats a metric the way the dashboard shows it; undefined metrics read "n/a".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricDisplay {
    Percent(Option<f64>),
    Plain(Option<f64>),
}

impl fmt::Display for MetricDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricDisplay::Percent(Some(v)) => write!(f, "{:?}%", v),
            MetricDisplay::Plain(Some(v)) => write!(f, "{:?}", v),
            MetricDisplay::Percent(None) | MetricDisplay::Plain(None) => f.write_str("n/a"),
        }
    }
}

/// Stateless province lookups over a loaded dataset.
pub struct ViewBuilder;

impl ViewBuilder {
    /// Province names for the selector, sorted and deduplicated.
    pub fn list_provinces(dataset: &EducationDataset) -> Vec<String> {
        dataset.provinces()
    }

    /// Build the view for `province` from its first matching record.
    pub fn build_view(
        dataset: &EducationDataset,
        province: &str,
    ) -> Result<ProvinceView, ViewError> {
        dataset
            .find(province)
            .map(ProvinceView::from_record)
            .ok_or_else(|| ViewError::NotFound {
                province: province.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_display_matches_dashboard_format() {
        assert_eq!(MetricDisplay::Percent(Some(48.0)).to_string(), "48.0%");
        assert_eq!(MetricDisplay::Percent(Some(47.63)).to_string(), "47.63%");
        assert_eq!(MetricDisplay::Plain(Some(20.0)).to_string(), "20.0");
        assert_eq!(MetricDisplay::Plain(None).to_string(), "n/a");
    }

    #[test]
    fn view_serializes_series_labels() {
        let dataset = EducationDataset::new(vec![EducationRecord::from_counts(
            "Kep", 200, 101, 8, 5,
        )]);
        let view = ViewBuilder::build_view(&dataset, "Kep").unwrap();
        let json = view.to_json().unwrap();
        assert!(json.contains("\"Girls Enrolled\""));
        assert!(json.contains("\"Female Teachers\""));
        assert!(json.contains("\"student_teacher_ratio\": 25.0"));
    }
}

//! View module - per-province metrics and series

mod builder;

pub use builder::{
    MetricDisplay, ProvinceView, SeriesPoint, ViewBuilder, ViewError, FEMALE_TEACHERS_LABEL,
    GIRLS_ENROLLED_LABEL, TOTAL_ENROLLED_LABEL, TOTAL_TEACHERS_LABEL,
};

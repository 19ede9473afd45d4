//! Data module - dataset fetching, normalization and caching

mod dataset;
mod loader;
pub mod schema;
mod source;

pub use dataset::EducationDataset;
pub use loader::{DatasetCache, DatasetLoader, LoaderError};
pub use schema::{
    DerivedColumns, DuplicatePolicy, EducationRecord, NormalizeOptions, ParseError,
    ValidationMode,
};
pub use source::{
    DataSource, DataSourceError, FileSource, HttpSource, RetryingSource, StaticSource,
};

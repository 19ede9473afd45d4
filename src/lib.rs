//! Cambodia Education Dashboard
//!
//! Loads the 2020-2021 Cambodian education statistics, derives the
//! student-teacher ratio and the share of girls enrolled and female teachers,
//! and builds per-province views for the dashboard.
//!
//! ```no_run
//! use camedu_dashboard::config::DashboardConfig;
//! use camedu_dashboard::data::{DatasetCache, DatasetLoader};
//! use camedu_dashboard::view::ViewBuilder;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = DashboardConfig::default();
//!     let mut cache = DatasetCache::new(DatasetLoader::from_config(&config), config.cache_ttl());
//!
//!     let dataset = cache.get()?;
//!     for province in ViewBuilder::list_provinces(&dataset) {
//!         let view = ViewBuilder::build_view(&dataset, &province)?;
//!         println!("{}: {}", province, view.girls_enrolled_display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod charts;
pub mod config;
pub mod data;
pub mod view;

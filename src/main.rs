//! Cambodia Education Dashboard
//!
//! Desktop viewer for provincial enrollment and staffing indicators.

mod gui;

use anyhow::Context;
use camedu_dashboard::config::{DashboardConfig, CONFIG_FILE_NAME};
use camedu_dashboard::data::{DatasetCache, DatasetLoader};
use eframe::egui;
use gui::DashboardApp;
use std::path::Path;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DashboardConfig::load_or_default(Path::new(CONFIG_FILE_NAME))?;
    log::debug!("Config: {:?}", config);

    // The cache owns the dataset and moves into the app
    let cache = DatasetCache::new(DatasetLoader::from_config(&config), config.cache_ttl());

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 860.0])
            .with_min_inner_size([1000.0, 640.0])
            .with_title("Cambodia Education Dashboard"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Cambodia Education Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, cache)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
    .context("running dashboard window")
}

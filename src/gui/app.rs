//! Dashboard Main Application
//! Main window with control panel and province viewer.

use anyhow::Context as _;
use camedu_dashboard::charts::StaticChartRenderer;
use camedu_dashboard::data::{DatasetCache, EducationDataset};
use camedu_dashboard::view::{ProvinceView, ViewBuilder, ViewError};
use egui::SidePanel;
use log::{error, info};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};

const PNG_WIDTH: u32 = 1400;
const PNG_HEIGHT: u32 = 500;

/// Dataset loading result from background thread
enum LoadResult {
    Complete(Arc<EducationDataset>),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    cache: Arc<Mutex<DatasetCache>>,
    dataset: Option<Arc<EducationDataset>>,
    view: Option<ProvinceView>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async dataset loading
    load_rx: Option<Receiver<LoadResult>>,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, cache: DatasetCache) -> Self {
        let mut app = Self::with_cache(cache);
        app.start_loading();
        app
    }

    fn with_cache(cache: DatasetCache) -> Self {
        Self {
            control_panel: ControlPanel::new(cache.describe_source()),
            cache: Arc::new(Mutex::new(cache)),
            dataset: None,
            view: None,
            chart_viewer: ChartViewer::new(),
            load_rx: None,
        }
    }

    fn is_loading(&self) -> bool {
        self.load_rx.is_some()
    }

    /// Load (or reuse) the dataset on a background thread.
    fn start_loading(&mut self) {
        if self.is_loading() {
            return;
        }

        self.control_panel.is_busy = true;
        self.control_panel.set_status("Loading dataset...");

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        let cache = Arc::clone(&self.cache);
        thread::spawn(move || {
            let result = match lock_cache(&cache).get() {
                Ok(dataset) => LoadResult::Complete(dataset),
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for dataset loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(dataset)) => self.apply_dataset(dataset),
            Ok(LoadResult::Error(message)) => self.apply_load_failure(&message),
            Err(TryRecvError::Empty) => {
                self.load_rx = Some(rx);
            }
            Err(TryRecvError::Disconnected) => {
                self.apply_load_failure("loader thread stopped");
            }
        }
    }

    fn apply_dataset(&mut self, dataset: Arc<EducationDataset>) {
        self.control_panel.is_busy = false;
        self.control_panel
            .update_provinces(ViewBuilder::list_provinces(&dataset));
        self.control_panel
            .set_status(format!("Loaded {} provinces", dataset.len()));
        self.dataset = Some(dataset);
        self.rebuild_view();
    }

    /// A failed load leaves nothing to show or export.
    fn apply_load_failure(&mut self, message: &str) {
        error!("Dataset load failed: {}", message);
        self.dataset = None;
        self.view = None;
        self.control_panel.is_busy = false;
        self.control_panel.update_provinces(Vec::new());
        self.control_panel.set_error(format!("Error: {}", message));
    }

    /// Rebuild the province view for the current selection.
    fn rebuild_view(&mut self) {
        let (Some(dataset), Some(province)) = (&self.dataset, &self.control_panel.selected) else {
            self.view = None;
            return;
        };

        match ViewBuilder::build_view(dataset, province) {
            Ok(view) => self.view = Some(view),
            Err(ViewError::NotFound { province }) => {
                self.view = None;
                self.control_panel.selected = None;
                self.control_panel.set_error(format!(
                    "Province '{}' not found, please select another",
                    province
                ));
            }
        }
    }

    fn handle_reload(&mut self) {
        // The loader thread holds the lock until its fetch returns
        if self.is_loading() {
            return;
        }
        lock_cache(&self.cache).invalidate();
        self.start_loading();
    }

    fn handle_export_csv(&mut self) {
        let Some(dataset) = self.dataset.clone() else {
            return;
        };
        let Some(path) = save_dialog("CSV", "csv", "cambodia_education.csv") else {
            return; // User cancelled
        };

        let result = dataset
            .write_csv(&path)
            .with_context(|| format!("writing {}", path.display()));
        self.report_export(result, &path);
    }

    fn handle_export_json(&mut self) {
        let Some(view) = self.view.clone() else {
            return;
        };
        let Some(path) = save_dialog("JSON", "json", &format!("{}.json", view.province)) else {
            return;
        };

        let result = view
            .to_json()
            .context("serializing view")
            .and_then(|json| {
                std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))
            });
        self.report_export(result, &path);
    }

    fn handle_export_png(&mut self) {
        let Some(view) = self.view.clone() else {
            return;
        };
        let Some(path) = save_dialog("PNG Image", "png", &format!("{}.png", view.province)) else {
            return;
        };

        let result = StaticChartRenderer::save_view_png(&view, &path, PNG_WIDTH, PNG_HEIGHT)
            .with_context(|| format!("rendering {}", path.display()));
        let ok = result.is_ok();
        self.report_export(result, &path);

        if ok {
            if let Err(e) = open::that(&path) {
                error!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    fn report_export(&mut self, result: anyhow::Result<()>, path: &std::path::Path) {
        match result {
            Ok(()) => {
                info!("Exported {}", path.display());
                self.control_panel
                    .set_status(format!("Exported {}", path.display()));
            }
            Err(e) => {
                error!("Export failed: {:#}", e);
                self.control_panel
                    .set_error(format!("Export error: {:#}", e));
            }
        }
    }
}

/// A loader thread that panicked must not take the cache down with it.
fn lock_cache(cache: &Mutex<DatasetCache>) -> MutexGuard<'_, DatasetCache> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

fn save_dialog(filter: &str, extension: &str, file_name: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(filter, &[extension])
        .set_file_name(file_name)
        .save_file()
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading() {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui, self.view.is_some());

                    match action {
                        ControlPanelAction::ProvinceChanged => self.rebuild_view(),
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::ExportCsv => self.handle_export_csv(),
                        ControlPanelAction::ExportJson => self.handle_export_json(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Province view
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer
                .show(ui, self.view.as_ref(), self.dataset.as_deref());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camedu_dashboard::data::{DataSource, DataSourceError, DatasetLoader, NormalizeOptions};
    use std::collections::VecDeque;
    use std::time::{Duration, Instant};

    const CSV: &str = "Province,Total Enrolment,Girls Enrolled,Total Teachers,Female Teachers
Phnom Penh,1000,480,50,30
Takeo,90000,43500,2100,1050
";

    enum Step {
        Serve,
        Fail,
        Panic,
    }

    /// Plays back a fixed sequence of fetch outcomes, then keeps serving.
    struct Scripted {
        steps: Mutex<VecDeque<Step>>,
    }

    impl DataSource for Scripted {
        fn fetch(&self) -> Result<Vec<u8>, DataSourceError> {
            let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Serve);
            match step {
                Step::Serve => Ok(CSV.as_bytes().to_vec()),
                Step::Fail => Err(DataSourceError::Status {
                    url: "https://example.invalid/data.csv".to_string(),
                    status: 404,
                }),
                Step::Panic => panic!("loader blew up"),
            }
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn app_with(steps: Vec<Step>) -> DashboardApp {
        let source = Scripted {
            steps: Mutex::new(steps.into()),
        };
        let loader = DatasetLoader::new(Box::new(source), NormalizeOptions::default());
        DashboardApp::with_cache(DatasetCache::new(loader, None))
    }

    fn wait_for_load(app: &mut DashboardApp) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while app.is_loading() {
            assert!(Instant::now() < deadline, "load did not finish");
            app.check_load_results();
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn successful_load_selects_first_province() {
        let mut app = app_with(vec![Step::Serve]);
        app.start_loading();
        wait_for_load(&mut app);

        assert!(!app.control_panel.is_busy);
        assert_eq!(app.control_panel.selected.as_deref(), Some("Phnom Penh"));
        assert_eq!(app.view.as_ref().map(|v| v.province.as_str()), Some("Phnom Penh"));
    }

    #[test]
    fn failed_reload_clears_previous_dataset() {
        let mut app = app_with(vec![Step::Serve, Step::Fail]);
        app.start_loading();
        wait_for_load(&mut app);
        assert!(app.dataset.is_some());

        app.handle_reload();
        wait_for_load(&mut app);

        assert!(app.dataset.is_none());
        assert!(app.view.is_none());
        assert!(app.control_panel.provinces.is_empty());
        assert_eq!(app.control_panel.selected, None);
        assert!(app.control_panel.is_error);
        assert!(!app.control_panel.is_busy);
    }

    #[test]
    fn reload_works_after_loader_thread_panics() {
        let mut app = app_with(vec![Step::Panic]);
        app.start_loading();
        wait_for_load(&mut app);
        assert!(app.control_panel.is_error);
        assert!(app.dataset.is_none());

        app.handle_reload();
        wait_for_load(&mut app);

        assert!(!app.control_panel.is_error);
        assert_eq!(app.dataset.as_ref().map(|d| d.len()), Some(2));
        assert!(app.view.is_some());
    }

    #[test]
    fn missing_selection_clears_view_and_asks_again() {
        let mut app = app_with(vec![Step::Serve]);
        app.start_loading();
        wait_for_load(&mut app);
        assert!(app.view.is_some());

        app.control_panel.selected = Some("Atlantis".to_string());
        app.rebuild_view();

        assert!(app.view.is_none());
        assert_eq!(app.control_panel.selected, None);
        assert!(app.control_panel.is_error);
        assert!(app.control_panel.status.contains("Atlantis"));
        assert!(app.dataset.is_some());
    }
}

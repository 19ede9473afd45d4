//! Chart Viewer Widget
//! Central panel: headline, metric cards, the two breakdown charts and the
//! optional full-dataset table.

use camedu_dashboard::charts::{ChartPlotter, ENROLLMENT_TITLE, STAFFING_TITLE};
use camedu_dashboard::data::EducationDataset;
use camedu_dashboard::view::{MetricDisplay, ProvinceView};
use egui::{Color32, RichText, ScrollArea};

const CHART_HEIGHT: f32 = 320.0;
const CARD_SPACING: f32 = 12.0;

const INTRO: &str = "This dashboard visualizes key public education indicators from Cambodia. \
It highlights gender-based enrollment, teacher distribution, and staffing ratios across provinces.";

/// Renders whatever the app currently has to show.
#[derive(Default)]
pub struct ChartViewer;

impl ChartViewer {
    pub fn new() -> Self {
        Self
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        view: Option<&ProvinceView>,
        dataset: Option<&EducationDataset>,
    ) {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading(
                    RichText::new("📘 Cambodia Education Equality Dashboard (2020–2021)")
                        .size(24.0)
                        .strong(),
                );
                ui.add_space(4.0);
                ui.label(INTRO);
                ui.add_space(12.0);

                match view {
                    Some(view) => Self::draw_view(ui, view),
                    None => {
                        ui.add_space(40.0);
                        ui.vertical_centered(|ui| {
                            ui.label(RichText::new("No Data").size(20.0).color(Color32::GRAY));
                        });
                    }
                }

                if let Some(dataset) = dataset {
                    ui.add_space(16.0);
                    ui.collapsing("📂 Show full dataset", |ui| {
                        Self::draw_dataset_table(ui, dataset);
                    });
                }

                ui.add_space(16.0);
                ui.separator();
                ui.label(
                    RichText::new("Dashboard by @Bur3hani • Data from github.com/bur3hani/camedu")
                        .size(11.0)
                        .color(Color32::GRAY),
                );
            });
    }

    fn draw_view(ui: &mut egui::Ui, view: &ProvinceView) {
        // Summary metrics
        ui.columns(3, |cols| {
            Self::draw_metric(&mut cols[0], "👧 % Girls Enrolled", view.girls_enrolled_display());
            Self::draw_metric(
                &mut cols[1],
                "👩‍🏫 % Female Teachers",
                view.female_teachers_display(),
            );
            Self::draw_metric(&mut cols[2], "📚 Student–Teacher Ratio", view.ratio_display());
        });

        ui.add_space(CARD_SPACING * 2.0);
        ui.label(
            RichText::new(format!(
                "📊 Enrollment & Staffing Breakdown for {}",
                view.province
            ))
            .size(18.0)
            .strong(),
        );
        ui.add_space(CARD_SPACING);

        // Two charts side by side
        ui.columns(2, |cols| {
            cols[0].label(RichText::new(ENROLLMENT_TITLE).size(14.0).strong());
            ChartPlotter::draw_enrollment_chart(&mut cols[0], view, CHART_HEIGHT);
            cols[1].label(RichText::new(STAFFING_TITLE).size(14.0).strong());
            ChartPlotter::draw_staffing_chart(&mut cols[1], view, CHART_HEIGHT);
        });
    }

    fn draw_metric(ui: &mut egui::Ui, label: &str, value: MetricDisplay) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(8.0)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(label).size(13.0).color(Color32::GRAY));
                ui.label(RichText::new(value.to_string()).size(26.0).strong());
            });
    }

    fn draw_dataset_table(ui: &mut egui::Ui, dataset: &EducationDataset) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ScrollArea::horizontal().show(ui, |ui| {
                    egui::Grid::new("full_dataset")
                        .striped(true)
                        .min_col_width(70.0)
                        .spacing([12.0, 4.0])
                        .show(ui, |ui| {
                            for header in [
                                "Province",
                                "Total Enrolment",
                                "Girls Enrolled",
                                "Total Teachers",
                                "Female Teachers",
                                "Student–Teacher Ratio",
                                "% Girls Enrolled",
                                "% Female Teachers",
                            ] {
                                ui.label(RichText::new(header).strong().size(11.0));
                            }
                            ui.end_row();

                            for r in dataset.records() {
                                ui.label(RichText::new(&r.province).size(11.0));
                                ui.label(RichText::new(r.total_enrolment.to_string()).size(11.0));
                                ui.label(RichText::new(r.girls_enrolled.to_string()).size(11.0));
                                ui.label(RichText::new(r.total_teachers.to_string()).size(11.0));
                                ui.label(RichText::new(r.female_teachers.to_string()).size(11.0));
                                ui.label(
                                    RichText::new(
                                        MetricDisplay::Plain(r.student_teacher_ratio).to_string(),
                                    )
                                    .size(11.0),
                                );
                                ui.label(
                                    RichText::new(
                                        MetricDisplay::Plain(r.pct_girls_enrolled).to_string(),
                                    )
                                    .size(11.0),
                                );
                                ui.label(
                                    RichText::new(
                                        MetricDisplay::Plain(r.pct_female_teachers).to_string(),
                                    )
                                    .size(11.0),
                                );
                                ui.end_row();
                            }
                        });
                });
            });
    }
}

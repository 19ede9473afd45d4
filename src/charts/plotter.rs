//! Chart Plotter Module
//! Interactive bar charts for a province view, drawn with egui_plot.

use egui::Color32;
use egui_plot::{Bar, BarChart, Plot};

use crate::view::{ProvinceView, SeriesPoint};

/// Bar colours for the enrollment chart (seaborn "Set2").
pub const ENROLLMENT_PALETTE: [Color32; 2] = [
    Color32::from_rgb(102, 194, 165), // Teal
    Color32::from_rgb(252, 141, 98),  // Salmon
];

/// Bar colours for the staffing chart (seaborn "Set3").
pub const STAFFING_PALETTE: [Color32; 2] = [
    Color32::from_rgb(141, 211, 199), // Mint
    Color32::from_rgb(190, 186, 218), // Lavender
];

pub const ENROLLMENT_TITLE: &str = "Enrollment Breakdown";
pub const STAFFING_TITLE: &str = "Teacher Breakdown";

const BAR_WIDTH: f64 = 0.6;

/// Draws the province comparison charts.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Enrollment chart: total vs girls.
    pub fn draw_enrollment_chart(ui: &mut egui::Ui, view: &ProvinceView, height: f32) {
        Self::draw_bar_chart(
            ui,
            &format!("enrollment_{}", view.province),
            &view.enrollment_series,
            ENROLLMENT_PALETTE,
            height,
        );
    }

    /// Staffing chart: total vs female teachers.
    pub fn draw_staffing_chart(ui: &mut egui::Ui, view: &ProvinceView, height: f32) {
        Self::draw_bar_chart(
            ui,
            &format!("staffing_{}", view.province),
            &view.staffing_series,
            STAFFING_PALETTE,
            height,
        );
    }

    /// Vertical bars at x = 0, 1, ... labelled with the series labels.
    fn draw_bar_chart(
        ui: &mut egui::Ui,
        id: &str,
        series: &[SeriesPoint],
        palette: [Color32; 2],
        height: f32,
    ) {
        let labels: Vec<&'static str> = series.iter().map(|p| p.label).collect();

        let bars: Vec<Bar> = series
            .iter()
            .enumerate()
            .map(|(i, point)| {
                Bar::new(i as f64, point.value as f64)
                    .width(BAR_WIDTH)
                    .fill(palette[i % palette.len()])
                    .name(point.label)
            })
            .collect();

        Plot::new(id)
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .show_x(false)
            .include_y(0.0)
            .include_x(-0.5)
            .include_x(series.len() as f64 - 0.5)
            .y_axis_label("Count")
            .x_grid_spacer(|_input| {
                (0..2)
                    .map(|i| egui_plot::GridMark {
                        value: i as f64,
                        step_size: 1.0,
                    })
                    .collect()
            })
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if idx >= 0.0 && (idx as usize) < labels.len() && (mark.value - idx).abs() < 1e-6 {
                    labels[idx as usize].to_string()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars));
            });
    }
}

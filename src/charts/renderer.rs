//! Static Chart Renderer
//! Renders the enrollment and staffing charts side by side into a PNG.
//!
//! Layout:
//! 1. Title: "Enrollment & Staffing Breakdown for {province}"
//! 2. Left: Enrollment Breakdown (total vs girls)
//! 3. Right: Teacher Breakdown (total vs female)

use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

use crate::charts::plotter::{
    ENROLLMENT_PALETTE, ENROLLMENT_TITLE, STAFFING_PALETTE, STAFFING_TITLE,
};
use crate::view::{ProvinceView, SeriesPoint};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn to_rgb(color: egui::Color32) -> RGBColor {
    RGBColor(color.r(), color.g(), color.b())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render both charts for `view` and encode them as PNG bytes.
    pub fn render_view_to_png(
        view: &ProvinceView,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let mut buffer = vec![0u8; Self::buffer_len(width, height)?];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let title = format!("Enrollment & Staffing Breakdown for {}", view.province);
            let root = root
                .titled(&title, ("sans-serif", 26).into_font())
                .map_err(draw_err)?;

            let panels = root.split_evenly((1, 2));
            Self::draw_bars(
                &panels[0],
                ENROLLMENT_TITLE,
                &view.enrollment_series,
                ENROLLMENT_PALETTE.map(to_rgb),
            )?;
            Self::draw_bars(
                &panels[1],
                STAFFING_TITLE,
                &view.staffing_series,
                STAFFING_PALETTE.map(to_rgb),
            )?;

            root.present().map_err(draw_err)?;
        }

        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Draw("image buffer size mismatch".to_string()))?;

        let mut png = Vec::new();
        DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }

    /// Render and write straight to `path`.
    pub fn save_view_png(
        view: &ProvinceView,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let png = Self::render_view_to_png(view, width, height)?;
        std::fs::write(path, png)?;
        Ok(())
    }

    fn draw_bars<DB: DrawingBackend>(
        area: &DrawingArea<DB, plotters::coord::Shift>,
        title: &str,
        series: &[SeriesPoint; 2],
        palette: [RGBColor; 2],
    ) -> Result<(), RenderError> {
        let y_max = Self::y_upper_bound(series);

        let mut chart = ChartBuilder::on(area)
            .caption(title, ("sans-serif", 20).into_font())
            .margin(15)
            .x_label_area_size(35)
            .y_label_area_size(70)
            .build_cartesian_2d((0u32..1u32).into_segmented(), 0u64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => series
                    .get(*i as usize)
                    .map(|p| p.label.to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()
            .map_err(draw_err)?;

        for (i, point) in series.iter().enumerate() {
            let color = palette[i % palette.len()];
            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(color.filled())
                        .margin(25)
                        .data(std::iter::once((i as u32, point.value))),
                )
                .map_err(draw_err)?;
        }

        Ok(())
    }

    /// Top of the y axis: the largest bar plus 10% headroom, never zero.
    pub fn y_upper_bound(series: &[SeriesPoint]) -> u64 {
        let max = series.iter().map(|p| p.value).max().unwrap_or(0);
        max.saturating_add(max / 10).max(1)
    }

    /// Bytes needed for an RGB bitmap of the given size.
    fn buffer_len(width: u32, height: u32) -> Result<usize, RenderError> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(3))
            .ok_or_else(|| RenderError::Draw(format!("image size {width}x{height} is too large")))
    }
}

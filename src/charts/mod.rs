//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::{
    ChartPlotter, ENROLLMENT_PALETTE, ENROLLMENT_TITLE, STAFFING_PALETTE, STAFFING_TITLE,
};
pub use renderer::{RenderError, StaticChartRenderer};

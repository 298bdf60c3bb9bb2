//! Charts module - Section drawing

mod plotter;

pub use plotter::{ChartPlotter, ACCENT_COLOR, WARNING_COLOR};

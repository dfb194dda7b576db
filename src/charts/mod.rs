//! Charts module - chart data and static rendering

mod plotter;
mod renderer;

pub use plotter::{ChartData, ChartPlotter, ChartSeries, NOT_ENOUGH_DATA};
pub use renderer::{BarRect, ChartError, StaticChartRenderer};

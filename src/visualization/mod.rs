/// Chart generation for assessment results
///
/// Four Plotly documents are written per assessment: feature importance,
/// input radar, risk gauge and input distribution.

pub mod charts;
pub mod colors;
pub mod renderer;

pub use renderer::{ChartKind, ChartPaths, ChartRenderer, ChartRequest, STATIC_PREFIX};

//! Heatmap rendering: report model + self-contained HTML output.

pub mod html;

pub use html::render_heatmap_html;

use serde::Serialize;

/// Everything the renderer draws, already binned.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapReport {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub colormap: String,
    pub square: bool,
    /// Shared colour scale maximum for every panel.
    pub vmax: u64,
    pub panels: Vec<Panel>,
}

/// One sub-plot.
#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub title: String,
    /// Left edge of each time bucket.
    pub x_ticks: Vec<String>,
    /// Left edge of each latency bucket.
    pub y_ticks: Vec<String>,
    /// `counts[latency][time]`
    pub counts: Vec<Vec<u64>>,
    pub rows: usize,
}

//! The `plot` command: filtered rows -> binned grids -> HTML heatmap.

use crate::Result;
use crate::filter::{FilterChain, FilterConfig};
use crate::heatmap::{Binner, Condition, Grid, HeatmapConfig};
use crate::render::{HeatmapReport, Panel, render_heatmap_html};
use crate::report::Reporter;
use crate::summary;
use crate::trace::columns::{COMMAND, DEVICE_ID, IO_TYPE, PROCESS_ID};
use crate::trace::{Row, TraceParser};
use anyhow::Context;
use std::fs;
use std::path::PathBuf;

pub const TITLE: &str = "block i/o traced by iosnoop";

#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub data: PathBuf,
    pub filters: FilterConfig,
    /// Axis settings; its `base_date` also drives the parser.
    pub heatmap: HeatmapConfig,
    /// Extra panels, one per condition, below the unfiltered one.
    pub conditions: Vec<Condition>,
    pub colormap: String,
    pub square: bool,
    pub output: PathBuf,
}

/// Returns the written file, or `None` when no row survived the filters.
pub fn plot(config: &PlotConfig, reporter: &dyn Reporter) -> Result<Option<PathBuf>> {
    let parser = TraceParser::open(&config.data, config.heatmap.base_date, reporter)?;
    let chain = FilterChain::from_config(&config.filters);
    let rows: Vec<Row> = chain
        .select(parser)
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("parse {}", config.data.display()))?;

    if rows.is_empty() {
        reporter.info("no rows, so heatmap will not create");
        return Ok(None);
    }

    summary::show_unique_values(&rows, reporter);

    let report = build_report(&rows, config, reporter)?;
    let html = render_heatmap_html(&report)?;
    fs::write(&config.output, html)
        .with_context(|| format!("write heatmap {}", config.output.display()))?;
    reporter.info(&format!("wrote heatmap to {}", config.output.display()));

    Ok(Some(config.output.clone()))
}

/// Bin `rows` (and each condition's subset, against the same axes).
pub fn build_report(
    rows: &[Row],
    config: &PlotConfig,
    reporter: &dyn Reporter,
) -> Result<HeatmapReport> {
    let binner = Binner::new(rows, &config.heatmap, reporter)?;
    let x_ticks = time_ticks(&binner);
    let y_ticks: Vec<String> = binner.latency_buckets().edges()[..binner.latency_buckets().len()]
        .iter()
        .map(|e| fmt_edge(*e))
        .collect();

    let panel = |title: String, grid: Grid, rows: usize| Panel {
        title,
        x_ticks: x_ticks.clone(),
        y_ticks: y_ticks.clone(),
        counts: grid.counts().to_vec(),
        rows,
    };

    let normal = binner.bin(rows);
    reporter.debug(&binner.describe(&normal));
    let vmax = normal.max_count();
    let mut panels = vec![panel("Normal".to_string(), normal, rows.len())];

    for condition in &config.conditions {
        let subset: Vec<&Row> = rows.iter().filter(|r| condition.matches(r)).collect();
        if subset.is_empty() {
            reporter.warn(&format!("no data with condition: {}", condition));
            continue;
        }
        let grid = binner.bin(subset.iter().copied());
        reporter.debug(&binner.describe(&grid));
        panels.push(panel(condition.to_string(), grid, subset.len()));
    }

    let x_label = match config.heatmap.base_date {
        None => "time (second)".to_string(),
        Some(base) => format!("time (second)\n{}", base.format("%Y-%m-%d")),
    };

    Ok(HeatmapReport {
        title: title(&config.filters),
        x_label,
        y_label: "latency (millisecond)".to_string(),
        colormap: config.colormap.clone(),
        square: config.square,
        vmax,
        panels,
    })
}

/// Plot title, listing the active command/device/pid/type filters.
pub fn title(filters: &FilterConfig) -> String {
    let mut filtered = Vec::new();
    if !filters.commands.is_empty() {
        filtered.push(format!("{}: {}", COMMAND, filters.commands.join(", ")));
    }
    if let Some(device) = &filters.device {
        filtered.push(format!("{}: {}", DEVICE_ID, device));
    }
    if !filters.pids.is_empty() {
        let pids: Vec<String> = filters.pids.iter().map(|p| p.to_string()).collect();
        filtered.push(format!("{}: {}", PROCESS_ID, pids.join(", ")));
    }
    if !filters.types.is_empty() {
        filtered.push(format!("{}: {}", IO_TYPE, filters.types.join(", ")));
    }

    if filtered.is_empty() {
        TITLE.to_string()
    } else {
        format!("{}, filtered by {}", TITLE, filtered.join(", "))
    }
}

fn time_ticks(binner: &Binner) -> Vec<String> {
    let axis = binner.time_axis();
    (0..axis.buckets.len())
        .map(|i| match axis.local_edge(i) {
            Some(t) => t.format("%H:%M:%S").to_string(),
            None => fmt_edge(axis.buckets.edges()[i]),
        })
        .collect()
}

/// Bucket edge label: at most three decimals, at least one.
fn fmt_edge(v: f64) -> String {
    let s = format!("{:.3}", v);
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

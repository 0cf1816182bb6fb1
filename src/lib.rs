//! Parse and visualize iosnoop block I/O traces.
//!
//! Pipeline: trace text -> [`trace::TraceParser`] -> [`filter::FilterChain`]
//! -> CSV export ([`export`]) or latency/time binning ([`heatmap`]) rendered
//! as an HTML heatmap ([`render`]).

pub mod error;
pub mod export;
pub mod filter;
pub mod heatmap;
pub mod plot;
pub mod render;
pub mod report;
pub mod summary;
pub mod trace;
pub mod util;

pub type Result<T> = anyhow::Result<T>;

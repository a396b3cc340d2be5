//! chartgrid: coordinate and layout engine for interactive financial charts.
//!
//! The crate owns the hard, non-painting half of a charting library: mapping
//! an irregular multi-series time axis onto a continuous logical-index space,
//! allocating vertical space among stacked panes, resolving autoscale price
//! ranges and anchoring markers. Pixel painting and input handling belong to
//! the embedding application.

pub mod core;
pub mod error;
pub mod extensions;
pub mod model;
pub mod telemetry;

pub use error::{ChartError, ChartResult};
pub use model::ChartModel;

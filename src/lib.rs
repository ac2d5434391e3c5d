//! chartlite: a lightweight core for interactive financial charts.
//!
//! The crate owns the two subsystems a chart host cannot easily replace:
//! a multi-series, time-indexed data layer that answers every mutation
//! with a minimal delta, and a coalescing invalidation scheduler that
//! turns those deltas into one draw pass per frame. Rendering, layout,
//! and input decoding stay with the host behind the `PanePainter` seam.

pub mod chart;
pub mod data;
pub mod delegate;
pub mod error;
pub mod model;
pub mod telemetry;
pub mod time;

pub use chart::ChartCore;
pub use error::{ChartError, ChartResult};

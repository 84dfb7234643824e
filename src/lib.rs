//! chart-axes: data indexing and coordinate mapping for time-series charts.
//!
//! This crate covers the model layer of an interactive charting widget: a
//! multi-series data layer merging observations onto one shared logical axis,
//! price and time scales with bidirectional value/pixel mapping, tick mark
//! placement for both axes, and kinetic scrolling support.

pub mod error;
pub mod model;
pub mod telemetry;

pub use error::{AxisError, AxisResult};
pub use model::{DataLayer, PriceScale, TimeScale};

use thiserror::Error;

pub type AxisResult<T> = Result<T, AxisError>;

#[derive(Debug, Error)]
pub enum AxisError {
    /// Malformed calendar-day input. Raised before any mutation takes place.
    #[error("invalid time format: {0}")]
    InvalidFormat(String),

    /// Out-of-order incremental update or a non-ascending series.
    /// Raised before any mutation takes place.
    #[error("out-of-order data: {0}")]
    OutOfOrder(String),

    /// Caller-side integration bug, e.g. removing a source that was never
    /// registered on a scale or an out-of-range margin configuration.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

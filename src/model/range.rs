/// Dense integer position on the time axis shared by all series.
pub type TimePointIndex = i64;

/// Inclusive interval over an ordered scalar.
///
/// Construction does not validate ordering; an interval with
/// `left > right` reports itself as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeImpl<T: Copy + PartialOrd> {
    left: T,
    right: T,
}

impl<T: Copy + PartialOrd> RangeImpl<T> {
    #[must_use]
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    #[must_use]
    pub fn left(self) -> T {
        self.left
    }

    #[must_use]
    pub fn right(self) -> T {
        self.right
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.left > self.right
    }

    #[must_use]
    pub fn contains(self, value: T) -> bool {
        self.left <= value && value <= self.right
    }

    #[must_use]
    pub fn equals(self, other: Self) -> bool {
        self.left == other.left && self.right == other.right
    }
}

/// Inclusive integer index interval used by visible-window queries.
pub type StrictRange = RangeImpl<TimePointIndex>;

impl StrictRange {
    #[must_use]
    pub fn count(self) -> f64 {
        (self.right() - self.left() + 1) as f64
    }
}

/// Possibly fractional logical window, produced while a drag is in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

impl LogicalRange {
    #[must_use]
    pub fn left(self) -> f64 {
        self.from
    }

    #[must_use]
    pub fn right(self) -> f64 {
        self.to
    }

    #[must_use]
    pub fn width(self) -> f64 {
        self.to - self.from
    }

    #[must_use]
    pub fn to_strict(self) -> StrictRange {
        StrictRange::new(
            self.from.floor() as TimePointIndex,
            self.to.ceil() as TimePointIndex,
        )
    }
}

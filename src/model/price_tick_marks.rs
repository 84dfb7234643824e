use crate::error::{AxisError, AxisResult};

const TICK_SPAN_EPSILON: f64 = 1e-14;
const TICK_DENSITY: f64 = 2.5;

fn greater_or_equal(x1: f64, x2: f64, epsilon: f64) -> bool {
    x2 - x1 <= epsilon
}

fn equal(x1: f64, x2: f64, epsilon: f64) -> bool {
    (x1 - x2).abs() < epsilon
}

fn is_base_decimal(base: u64) -> bool {
    if base == 0 {
        return false;
    }
    let mut rest = base;
    while rest > 1 {
        if rest % 10 != 0 {
            return false;
        }
        rest /= 10;
    }
    true
}

/// Repeatedly divides a power-of-ten span by a cyclic divisor sequence until
/// it respects a density budget yet stays no smaller than the scale's minimum
/// representable movement.
#[derive(Debug, Clone)]
pub struct PriceTickSpanCalculator {
    base: u64,
    integral_dividers: Vec<f64>,
    fractional_dividers: Vec<f64>,
}

impl PriceTickSpanCalculator {
    pub fn new(base: u64, integral_dividers: Vec<f64>) -> AxisResult<Self> {
        let fractional_dividers = if is_base_decimal(base) {
            vec![2.0, 2.5, 2.0]
        } else {
            let mut dividers = Vec::new();
            let mut rest = base;
            while rest != 1 {
                if rest % 2 == 0 {
                    dividers.push(2.0);
                    rest /= 2;
                } else if rest % 5 == 0 {
                    dividers.push(2.0);
                    dividers.push(2.5);
                    rest /= 5;
                } else {
                    return Err(AxisError::InvalidData(format!(
                        "price tick base {base} is not factorable into 2s and 5s"
                    )));
                }
                if dividers.len() > 100 {
                    return Err(AxisError::InvalidData(format!(
                        "price tick base {base} produces a degenerate divider sequence"
                    )));
                }
            }
            dividers
        };
        Ok(Self {
            base,
            integral_dividers,
            fractional_dividers,
        })
    }

    #[must_use]
    pub fn tick_span(&self, high: f64, low: f64, max_tick_span: f64) -> f64 {
        let min_movement = if self.base == 0 {
            0.0
        } else {
            1.0 / self.base as f64
        };

        let mut result = 10f64.powf((high - low).log10().ceil().max(0.0));
        let mut index = 0usize;
        let mut c = self.integral_dividers[0];
        loop {
            let larger_than_min_movement = greater_or_equal(result, min_movement, TICK_SPAN_EPSILON)
                && result > min_movement + TICK_SPAN_EPSILON;
            let larger_than_budget = greater_or_equal(result, max_tick_span * c, TICK_SPAN_EPSILON);
            let larger_than_one = greater_or_equal(result, 1.0, TICK_SPAN_EPSILON);
            if !(larger_than_min_movement && larger_than_budget && larger_than_one) {
                break;
            }
            result /= c;
            index += 1;
            c = self.integral_dividers[index % self.integral_dividers.len()];
        }

        if result <= min_movement + TICK_SPAN_EPSILON {
            result = min_movement;
        }
        result = result.max(1.0);

        if !self.fractional_dividers.is_empty() && equal(result, 1.0, TICK_SPAN_EPSILON) {
            index = 0;
            c = self.fractional_dividers[0];
            while greater_or_equal(result, max_tick_span * c, TICK_SPAN_EPSILON)
                && result > min_movement + TICK_SPAN_EPSILON
            {
                result /= c;
                index += 1;
                c = self.fractional_dividers[index % self.fractional_dividers.len()];
            }
        }

        result
    }
}

/// A chosen price-axis tick: the logical-space value and its pixel position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceMark {
    pub logical: f64,
    pub coord: f64,
}

/// Chooses the price-axis increment for a `[low, high]` logical span.
///
/// Tries three phase-shifted x2/x2.5 divisor sequences and keeps the smallest
/// span that still respects the pixel density budget.
pub fn price_tick_span(
    high: f64,
    low: f64,
    base: u64,
    scale_height: f64,
    tick_mark_height: f64,
) -> AxisResult<f64> {
    if high < low {
        return Err(AxisError::InvariantViolation(
            "price tick span requires high >= low".to_owned(),
        ));
    }
    if scale_height <= 0.0 {
        return Err(AxisError::InvalidData(
            "price tick span requires a positive scale height".to_owned(),
        ));
    }
    if high == low {
        // A degenerate span selects the minimum movement directly.
        return Ok(if base == 0 { 1.0 } else { 1.0 / base as f64 });
    }

    let max_tick_span = (high - low) * tick_mark_height / scale_height;
    let calculators = [
        PriceTickSpanCalculator::new(base, vec![2.0, 2.5, 2.0])?,
        PriceTickSpanCalculator::new(base, vec![2.0, 2.0, 2.5])?,
        PriceTickSpanCalculator::new(base, vec![2.5, 2.0, 2.0])?,
    ];
    let span = calculators
        .iter()
        .map(|calculator| calculator.tick_span(high, low, max_tick_span))
        .fold(f64::INFINITY, f64::min);
    Ok(span)
}

/// Builds collision-free price marks over a scale of `scale_height` pixels.
///
/// `coordinate_to_logical`/`logical_to_coordinate` are the enclosing scale's
/// already-resolved converters; `edge_margin` drops marks within half a label
/// height of the top/bottom edge when "entire labels only" is configured.
pub fn rebuild_price_marks(
    scale_height: f64,
    tick_mark_label_height: f64,
    base: u64,
    is_log: bool,
    edge_margin: f64,
    coordinate_to_logical: impl Fn(f64) -> f64,
    logical_to_coordinate: impl Fn(f64) -> f64,
) -> AxisResult<Vec<PriceMark>> {
    let tick_mark_height = (tick_mark_label_height * TICK_DENSITY).ceil();
    let bottom = coordinate_to_logical(scale_height - 1.0);
    let top = coordinate_to_logical(0.0);

    let high = bottom.max(top);
    let low = bottom.min(top);
    if high == low || !high.is_finite() || !low.is_finite() {
        return Ok(Vec::new());
    }

    let min_coord = edge_margin;
    let max_coord = scale_height - 1.0 - edge_margin;

    let mut span = price_tick_span(high, low, base, scale_height, tick_mark_height)?;
    let mut offset = high % span;
    if offset < 0.0 {
        offset += span;
    }

    let mut marks = Vec::new();
    let mut prev_coord: Option<f64> = None;
    let mut logical = high - offset;
    while logical > low {
        let coord = logical_to_coordinate(logical);
        let overlaps = prev_coord
            .is_some_and(|prev| (coord - prev).abs() < tick_mark_height);
        if !overlaps && coord >= min_coord && coord <= max_coord {
            marks.push(PriceMark { logical, coord });
            prev_coord = Some(coord);
        }
        if is_log {
            // Log scales compress downward, so the admissible span changes as
            // the walk descends.
            span = price_tick_span(logical, low, base, scale_height, tick_mark_height)?;
        }
        logical -= span;
        if span <= 0.0 || !span.is_finite() {
            break;
        }
    }

    Ok(marks)
}

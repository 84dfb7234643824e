use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{AxisError, AxisResult};

use super::price_tick_marks::rebuild_price_marks;
use super::range::StrictRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriceScaleMode {
    #[default]
    Normal,
    Logarithmic,
    Percentage,
    IndexedTo100,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceScaleState {
    pub auto_scale: bool,
    pub is_inverted: bool,
    pub mode: PriceScaleMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceScaleStateChange {
    pub auto_scale: Option<bool>,
    pub is_inverted: Option<bool>,
    pub mode: Option<PriceScaleMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceScaleMargins {
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceScaleOptions {
    pub auto_scale: bool,
    pub mode: PriceScaleMode,
    pub invert_scale: bool,
    pub scale_margins: PriceScaleMargins,
    pub entire_text_only: bool,
}

impl Default for PriceScaleOptions {
    fn default() -> Self {
        Self {
            auto_scale: true,
            mode: PriceScaleMode::Normal,
            invert_scale: false,
            scale_margins: PriceScaleMargins {
                top: 0.2,
                bottom: 0.1,
            },
            entire_text_only: false,
        }
    }
}

/// `[min, max]` price interval, possibly already transformed into the active
/// mode's logical space. Replaced wholesale per recompute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    min: f64,
    max: f64,
}

impl PriceRange {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn min(self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(self) -> f64 {
        self.max
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.max - self.min
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.min == self.max || self.min.is_nan() || self.max.is_nan() || self.min > self.max
    }

    #[must_use]
    pub fn merge(self, other: PriceRange) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn scale_around_center(&mut self, coeff: f64) {
        if !coeff.is_finite() || self.length() == 0.0 {
            return;
        }
        let center = (self.max + self.min) * 0.5;
        self.max = center + (self.max - center) * coeff;
        self.min = center + (self.min - center) * coeff;
    }

    pub fn shift(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.max += delta;
        self.min += delta;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScaleMargins {
    /// Extra pixels requested above the merged range.
    pub above: f64,
    /// Extra pixels requested below the merged range.
    pub below: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScaleInfo {
    pub price_range: Option<PriceRange>,
    pub margins: Option<AutoScaleMargins>,
}

/// A series-like contributor to autoscale aggregation. Ranges are reported in
/// raw price space; the scale transforms them into the active mode's space.
pub trait AutoScaleSource {
    fn visible(&self) -> bool;
    fn first_value(&self) -> Option<f64>;
    fn autoscale_info(&self, visible_bars: StrictRange) -> Option<AutoScaleInfo>;
    fn min_move(&self) -> f64 {
        1.0
    }
}

/// Raw-space snapshot of one source's autoscale contribution, taken at
/// invalidation time so the deferred merge needs no live source access.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScaleCandidate {
    pub visible: bool,
    pub first_value: Option<f64>,
    pub price_range: Option<PriceRange>,
    pub margins: Option<AutoScaleMargins>,
}

impl AutoScaleCandidate {
    #[must_use]
    pub fn from_source(source: &dyn AutoScaleSource, visible_bars: StrictRange) -> Self {
        let info = source.autoscale_info(visible_bars);
        Self {
            visible: source.visible(),
            first_value: source.first_value(),
            price_range: info.and_then(|info| info.price_range),
            margins: info.and_then(|info| info.margins),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LogFormula {
    logical_offset: f64,
    coord_offset: f64,
}

impl Default for LogFormula {
    fn default() -> Self {
        Self {
            logical_offset: 4.0,
            coord_offset: 0.0001,
        }
    }
}

/// Price -> mode-space transform and its inverse, resolved once per recompute
/// and applied uniformly — never branched per point.
#[derive(Clone, Copy)]
struct PriceTransform {
    to_logical: fn(f64, f64, LogFormula) -> f64,
    from_logical: fn(f64, f64, LogFormula) -> f64,
}

impl PriceTransform {
    fn for_mode(mode: PriceScaleMode) -> Self {
        match mode {
            PriceScaleMode::Normal => Self {
                to_logical: |price, _, _| price,
                from_logical: |logical, _, _| logical,
            },
            PriceScaleMode::Logarithmic => Self {
                to_logical: |price, _, formula| to_log(price, formula),
                from_logical: |logical, _, formula| from_log(logical, formula),
            },
            PriceScaleMode::Percentage => Self {
                to_logical: |price, base, _| to_percent(price, base),
                from_logical: |logical, base, _| from_percent(logical, base),
            },
            PriceScaleMode::IndexedTo100 => Self {
                to_logical: |price, base, _| to_indexed_to_100(price, base),
                from_logical: |logical, base, _| from_indexed_to_100(logical, base),
            },
        }
    }

    fn range_to_logical(&self, range: PriceRange, base: f64, formula: LogFormula) -> PriceRange {
        PriceRange::new(
            (self.to_logical)(range.min(), base, formula),
            (self.to_logical)(range.max(), base, formula),
        )
    }
}

/// Two-state recompute lifecycle; every read funnels through one
/// `make_sure_valid` entry point so independent flags cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeValidity {
    Dirty,
    Clean,
}

/// A labeled, positioned price-axis tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceAxisMark {
    pub price: f64,
    pub coord: f64,
    pub label: String,
}

/// Value <-> pixel engine for one price axis.
///
/// Converts under four mutually exclusive modes, aggregates autoscale ranges
/// across heterogeneous sources, and generates collision-free tick marks.
#[derive(Debug, Clone)]
pub struct PriceScale {
    id: String,
    options: PriceScaleOptions,
    height: f64,
    internal_height_cache: Option<f64>,
    price_range: Option<PriceRange>,
    price_range_snapshot: Option<PriceRange>,
    validity: RangeValidity,
    invalidated_for_range: Option<StrictRange>,
    candidates: Vec<AutoScaleCandidate>,
    source_ids: Vec<String>,
    is_custom_price_range: bool,
    margin_above: f64,
    margin_below: f64,
    scale_start_point: Option<f64>,
    scroll_start_point: Option<f64>,
    log_formula: LogFormula,
    min_move_override: Option<f64>,
    first_value: Option<f64>,
}

impl PriceScale {
    #[must_use]
    pub fn new(id: impl Into<String>, options: PriceScaleOptions) -> Self {
        Self {
            id: id.into(),
            options,
            height: 0.0,
            internal_height_cache: None,
            price_range: None,
            price_range_snapshot: None,
            validity: RangeValidity::Dirty,
            invalidated_for_range: None,
            candidates: Vec::new(),
            source_ids: Vec::new(),
            is_custom_price_range: false,
            margin_above: 0.0,
            margin_below: 0.0,
            scale_start_point: None,
            scroll_start_point: None,
            log_formula: LogFormula::default(),
            min_move_override: None,
            first_value: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn options(&self) -> PriceScaleOptions {
        self.options
    }

    pub fn apply_options(&mut self, options: PriceScaleOptions) -> AxisResult<()> {
        if !(0.0..=1.0).contains(&options.scale_margins.top) {
            return Err(AxisError::InvariantViolation(
                "price scale top margin must be in [0,1]".to_owned(),
            ));
        }
        if !(0.0..=1.0).contains(&options.scale_margins.bottom) {
            return Err(AxisError::InvariantViolation(
                "price scale bottom margin must be in [0,1]".to_owned(),
            ));
        }
        if options.scale_margins.top + options.scale_margins.bottom > 1.0 {
            return Err(AxisError::InvariantViolation(
                "sum of price scale margins must be <= 1".to_owned(),
            ));
        }
        let mode_change = PriceScaleStateChange {
            auto_scale: Some(options.auto_scale),
            is_inverted: Some(options.invert_scale),
            mode: Some(options.mode),
        };
        self.options = PriceScaleOptions {
            mode: self.options.mode,
            auto_scale: self.options.auto_scale,
            invert_scale: self.options.invert_scale,
            ..options
        };
        self.set_mode(mode_change);
        self.invalidate_internal_height_cache();
        Ok(())
    }

    /// Registers a data source on this scale. Removal of a source that was
    /// never registered is an integration bug and fails loudly.
    pub fn register_source(&mut self, source_id: impl Into<String>) {
        let source_id = source_id.into();
        if !self.source_ids.contains(&source_id) {
            self.source_ids.push(source_id);
        }
    }

    pub fn remove_source(&mut self, source_id: &str) -> AxisResult<()> {
        let Some(position) = self.source_ids.iter().position(|id| id == source_id) else {
            return Err(AxisError::InvariantViolation(format!(
                "source '{source_id}' is not registered on price scale '{}'",
                self.id
            )));
        };
        self.source_ids.remove(position);
        self.validity = RangeValidity::Dirty;
        Ok(())
    }

    #[must_use]
    pub fn source_ids(&self) -> &[String] {
        &self.source_ids
    }

    #[must_use]
    pub fn mode(&self) -> PriceScaleState {
        PriceScaleState {
            auto_scale: self.options.auto_scale,
            is_inverted: self.options.invert_scale,
            mode: self.options.mode,
        }
    }

    pub fn set_mode(&mut self, change: PriceScaleStateChange) {
        let old_mode = self.mode();
        if let Some(auto_scale) = change.auto_scale {
            self.options.auto_scale = auto_scale;
        }
        if let Some(mode) = change.mode {
            self.options.mode = mode;
            if matches!(
                mode,
                PriceScaleMode::Percentage | PriceScaleMode::IndexedTo100
            ) {
                // Relative modes are meaningless without a data-driven range.
                self.options.auto_scale = true;
            }
            self.validity = RangeValidity::Dirty;
        }
        // Stored ranges live in mode space; convert across a log boundary.
        if old_mode.mode == PriceScaleMode::Logarithmic && self.options.mode != old_mode.mode {
            if let Some(raw) = convert_price_range_from_log(self.price_range, self.log_formula) {
                self.price_range = Some(raw);
            } else {
                self.options.auto_scale = true;
            }
        }
        if self.options.mode == PriceScaleMode::Logarithmic && self.options.mode != old_mode.mode {
            self.price_range = convert_price_range_to_log(self.price_range, self.log_formula);
        }
        if let Some(inverted) = change.is_inverted {
            self.options.invert_scale = inverted;
        }
    }

    #[must_use]
    pub fn is_auto_scale(&self) -> bool {
        self.options.auto_scale
    }

    #[must_use]
    pub fn is_log(&self) -> bool {
        self.options.mode == PriceScaleMode::Logarithmic
    }

    #[must_use]
    pub fn is_percentage(&self) -> bool {
        self.options.mode == PriceScaleMode::Percentage
    }

    #[must_use]
    pub fn is_indexed_to_100(&self) -> bool {
        self.options.mode == PriceScaleMode::IndexedTo100
    }

    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.options.invert_scale
    }

    pub fn set_height(&mut self, value: f64) {
        if (self.height - value).abs() <= f64::EPSILON {
            return;
        }
        self.height = value;
        self.invalidate_internal_height_cache();
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Usable pixel height: total height minus configured margins.
    #[must_use]
    pub fn internal_height(&mut self) -> f64 {
        if let Some(cached) = self.internal_height_cache {
            return cached;
        }
        let value = self.height - self.top_margin_px() - self.bottom_margin_px();
        self.internal_height_cache = Some(value);
        value
    }

    #[must_use]
    pub fn price_range(&mut self) -> Option<PriceRange> {
        self.make_sure_valid();
        self.price_range
    }

    pub fn set_price_range(&mut self, range: Option<PriceRange>) {
        if self.price_range == range {
            return;
        }
        self.price_range = range;
    }

    pub fn set_custom_price_range(&mut self, range: Option<PriceRange>) {
        self.set_price_range(range);
        self.is_custom_price_range = range.is_some();
    }

    #[must_use]
    pub fn is_custom_price_range(&self) -> bool {
        self.is_custom_price_range
    }

    /// The scale is empty when it has no usable pixel height or no valid
    /// range; all coordinate queries on an empty scale return 0.
    #[must_use]
    pub fn is_empty(&mut self) -> bool {
        self.make_sure_valid();
        self.height == 0.0
            || self.internal_height() <= 0.0
            || self.price_range.is_none_or(|range| range.is_empty())
    }

    pub fn set_min_move_override(&mut self, min_move: Option<f64>) {
        self.min_move_override = min_move;
    }

    #[must_use]
    pub fn min_move(&self) -> f64 {
        self.min_move_override.unwrap_or(1.0)
    }

    /// First visible source's first value; relative modes use it as the
    /// reference the transform is anchored to.
    #[must_use]
    pub fn first_value(&mut self) -> Option<f64> {
        self.make_sure_valid();
        self.first_value
    }

    /// Stores the autoscale contributions for `visible_bars` and defers the
    /// merge until the next read.
    pub fn invalidate_sources_for_range(
        &mut self,
        visible_bars: StrictRange,
        candidates: Vec<AutoScaleCandidate>,
    ) {
        self.invalidated_for_range = Some(visible_bars);
        self.candidates = candidates;
        self.validity = RangeValidity::Dirty;
    }

    /// Convenience wrapper snapshotting candidates from live sources.
    pub fn recalculate_price_range(
        &mut self,
        visible_bars: StrictRange,
        sources: &[&dyn AutoScaleSource],
    ) {
        let candidates = sources
            .iter()
            .map(|source| AutoScaleCandidate::from_source(*source, visible_bars))
            .collect();
        self.invalidate_sources_for_range(visible_bars, candidates);
    }

    pub fn price_to_coordinate(&mut self, price: f64, base_value: f64) -> AxisResult<f64> {
        self.make_sure_valid();
        if self.is_empty() {
            return Ok(0.0);
        }
        let transform = PriceTransform::for_mode(self.options.mode);
        let logical = (transform.to_logical)(price, base_value, self.log_formula);
        self.logical_to_coordinate(logical)
    }

    pub fn coordinate_to_price(&mut self, coordinate: f64, base_value: f64) -> AxisResult<f64> {
        self.make_sure_valid();
        if self.is_empty() {
            return Ok(0.0);
        }
        let transform = PriceTransform::for_mode(self.options.mode);
        let logical = self.coordinate_to_logical(coordinate)?;
        Ok((transform.from_logical)(logical, base_value, self.log_formula))
    }

    /// Builds labeled tick marks for the current range. `label_height` is the
    /// rendered label's pixel height; `format` renders a raw price.
    pub fn marks(
        &mut self,
        label_height: f64,
        format: impl Fn(f64) -> String,
    ) -> AxisResult<Vec<PriceAxisMark>> {
        self.make_sure_valid();
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let range = self
            .price_range
            .ok_or_else(|| AxisError::InvalidData("price range is not available".to_owned()))?;

        let transform = PriceTransform::for_mode(self.options.mode);
        let base_value = self.first_value.unwrap_or(0.0);
        let height = self.height;
        let internal_height = self.internal_height();
        let bottom_margin = self.bottom_margin_px();
        let inverted = self.is_inverted();
        let formula = self.log_formula;

        let logical_to_coordinate = move |logical: f64| {
            let inv = bottom_margin + (internal_height - 1.0) * (logical - range.min()) / range.length();
            if inverted { inv } else { height - 1.0 - inv }
        };
        let coordinate_to_logical = move |coordinate: f64| {
            let inv = if inverted { coordinate } else { height - 1.0 - coordinate };
            range.min() + range.length() * ((inv - bottom_margin) / (internal_height - 1.0))
        };

        let edge_margin = if self.options.entire_text_only {
            label_height / 2.0
        } else {
            0.0
        };
        let base = price_format_base(self.min_move_for_mode());
        let marks = rebuild_price_marks(
            self.height,
            label_height,
            base,
            self.is_log(),
            edge_margin,
            coordinate_to_logical,
            logical_to_coordinate,
        )?;

        Ok(marks
            .into_iter()
            .map(|mark| {
                let price = (transform.from_logical)(mark.logical, base_value, formula);
                PriceAxisMark {
                    price,
                    coord: mark.coord,
                    label: format(price),
                }
            })
            .collect())
    }

    pub fn logical_to_coordinate(&mut self, logical: f64) -> AxisResult<f64> {
        self.make_sure_valid();
        if self.is_empty() {
            return Ok(0.0);
        }
        let range = self
            .price_range
            .ok_or_else(|| AxisError::InvalidData("price range is not available".to_owned()))?;
        let inv_coordinate = self.bottom_margin_px()
            + (self.internal_height() - 1.0) * (logical - range.min()) / range.length();
        Ok(self.inverted_coordinate(inv_coordinate))
    }

    pub fn coordinate_to_logical(&mut self, coordinate: f64) -> AxisResult<f64> {
        self.make_sure_valid();
        if self.is_empty() {
            return Ok(0.0);
        }
        let range = self
            .price_range
            .ok_or_else(|| AxisError::InvalidData("price range is not available".to_owned()))?;
        let inv_coordinate = self.inverted_coordinate(coordinate);
        Ok(range.min()
            + range.length()
                * ((inv_coordinate - self.bottom_margin_px()) / (self.internal_height() - 1.0)))
    }

    pub fn start_scale(&mut self, x: f64) {
        if self.is_percentage() || self.is_indexed_to_100() {
            return;
        }
        if self.scale_start_point.is_some() || self.price_range_snapshot.is_some() {
            return;
        }
        if self.is_empty() {
            return;
        }
        self.scale_start_point = Some(self.height - x);
        self.price_range_snapshot = self.price_range;
    }

    pub fn scale_to(&mut self, mut x: f64) {
        if self.is_percentage() || self.is_indexed_to_100() {
            return;
        }
        let Some(scale_start) = self.scale_start_point else {
            return;
        };
        self.options.auto_scale = false;
        x = (self.height - x).max(0.0);
        let mut coeff = (scale_start + (self.height - 1.0) * 0.2) / (x + (self.height - 1.0) * 0.2);
        coeff = coeff.max(0.1);
        if let Some(mut range) = self.price_range_snapshot {
            range.scale_around_center(coeff);
            self.price_range = Some(range);
        }
    }

    pub fn end_scale(&mut self) {
        if self.is_percentage() || self.is_indexed_to_100() {
            return;
        }
        self.scale_start_point = None;
        self.price_range_snapshot = None;
    }

    pub fn start_scroll(&mut self, x: f64) {
        if self.options.auto_scale {
            return;
        }
        if self.scroll_start_point.is_some() || self.price_range_snapshot.is_some() {
            return;
        }
        if self.is_empty() {
            return;
        }
        self.scroll_start_point = Some(x);
        self.price_range_snapshot = self.price_range;
    }

    pub fn scroll_to(&mut self, x: f64) {
        if self.options.auto_scale {
            return;
        }
        let Some(scroll_start) = self.scroll_start_point else {
            return;
        };
        let Some(current_range) = self.price_range else {
            return;
        };
        let mut pixel_delta = x - scroll_start;
        if self.is_inverted() {
            pixel_delta = -pixel_delta;
        }
        let price_units_per_pixel = current_range.length() / (self.internal_height() - 1.0);
        if let Some(mut snapshot) = self.price_range_snapshot {
            snapshot.shift(pixel_delta * price_units_per_pixel);
            self.price_range = Some(snapshot);
        }
    }

    pub fn end_scroll(&mut self) {
        if self.options.auto_scale {
            return;
        }
        self.scroll_start_point = None;
        self.price_range_snapshot = None;
    }

    /// Runs the deferred autoscale merge at most once per invalidation cycle.
    fn make_sure_valid(&mut self) {
        if self.validity == RangeValidity::Clean {
            return;
        }
        self.validity = RangeValidity::Clean;
        self.recalculate_price_range_impl();
    }

    fn recalculate_price_range_impl(&mut self) {
        if self.is_custom_price_range && !self.options.auto_scale {
            return;
        }
        if self.invalidated_for_range.is_none() {
            return;
        }

        // Resolved once for the whole pass; every candidate range goes through
        // the same transform.
        let transform = PriceTransform::for_mode(self.options.mode);

        let mut price_range: Option<PriceRange> = None;
        let mut margin_above: f64 = 0.0;
        let mut margin_below: f64 = 0.0;
        let mut first_value: Option<f64> = None;

        for candidate in &self.candidates {
            if !candidate.visible {
                continue;
            }
            let Some(candidate_first_value) = candidate.first_value else {
                continue;
            };
            if first_value.is_none() {
                first_value = Some(candidate_first_value);
            }
            let Some(source_range) = candidate.price_range else {
                continue;
            };
            let source_range =
                transform.range_to_logical(source_range, candidate_first_value, self.log_formula);
            price_range = Some(match price_range {
                Some(acc) => acc.merge(source_range),
                None => source_range,
            });
            if let Some(margins) = candidate.margins {
                margin_above = margin_above.max(margins.above);
                margin_below = margin_below.max(margins.below);
            }
        }
        self.first_value = first_value;

        if (margin_above - self.margin_above).abs() > f64::EPSILON
            || (margin_below - self.margin_below).abs() > f64::EPSILON
        {
            self.margin_above = margin_above;
            self.margin_below = margin_below;
            self.invalidate_internal_height_cache();
        }

        if let Some(mut range) = price_range {
            if (range.min() - range.max()).abs() <= f64::EPSILON {
                // A flat series must never collapse the axis: widen by five
                // minimum increments per side, in raw space when logarithmic.
                let extend = 5.0 * self.min_move_for_mode();
                if self.is_log()
                    && let Some(raw) = convert_price_range_from_log(Some(range), self.log_formula)
                {
                    range = raw;
                }
                range = PriceRange::new(range.min() - extend, range.max() + extend);
                if self.is_log()
                    && let Some(log_range) =
                        convert_price_range_to_log(Some(range), self.log_formula)
                {
                    range = log_range;
                }
            }

            if self.is_log()
                && let Some(raw) = convert_price_range_from_log(Some(range), self.log_formula)
            {
                let new_formula = log_formula_for_price_range(Some(raw));
                if !log_formulas_are_same(new_formula, self.log_formula) {
                    trace!(scale = %self.id, "log formula recomputed for new visible span");
                    self.log_formula = new_formula;
                    if let Some(log_range) = convert_price_range_to_log(Some(raw), new_formula) {
                        range = log_range;
                    }
                    if let Some(snapshot_raw) =
                        convert_price_range_from_log(self.price_range_snapshot, new_formula)
                    {
                        self.price_range_snapshot =
                            convert_price_range_to_log(Some(snapshot_raw), new_formula);
                    }
                }
            }
            self.price_range = Some(range);
        } else if self.price_range.is_none() {
            // Neutral default keeps the scale numerically well-defined when
            // autoscale finds no contributing data.
            self.price_range = Some(PriceRange::new(-0.5, 0.5));
            self.log_formula = log_formula_for_price_range(None);
        }
    }

    fn min_move_for_mode(&self) -> f64 {
        if self.is_percentage() || self.is_indexed_to_100() {
            0.01
        } else {
            self.min_move()
        }
    }

    fn invalidate_internal_height_cache(&mut self) {
        self.internal_height_cache = None;
    }

    fn inverted_coordinate(&self, coordinate: f64) -> f64 {
        if self.is_inverted() {
            coordinate
        } else {
            self.height - 1.0 - coordinate
        }
    }

    fn top_margin_px(&self) -> f64 {
        if self.is_inverted() {
            self.options.scale_margins.bottom * self.height + self.margin_below
        } else {
            self.options.scale_margins.top * self.height + self.margin_above
        }
    }

    fn bottom_margin_px(&self) -> f64 {
        if self.is_inverted() {
            self.options.scale_margins.top * self.height + self.margin_above
        } else {
            self.options.scale_margins.bottom * self.height + self.margin_below
        }
    }
}

fn price_format_base(min_move: f64) -> u64 {
    if min_move <= 0.0 || !min_move.is_finite() {
        return 0;
    }
    let base = (1.0 / min_move).round();
    if base < 1.0 { 1 } else { base as u64 }
}

fn from_percent(value: f64, base_value: f64) -> f64 {
    let value = if base_value < 0.0 { -value } else { value };
    (value / 100.0) * base_value + base_value
}

fn to_percent(value: f64, base_value: f64) -> f64 {
    let result = 100.0 * (value - base_value) / base_value;
    if base_value < 0.0 { -result } else { result }
}

fn from_indexed_to_100(value: f64, base_value: f64) -> f64 {
    let mut value = value - 100.0;
    if base_value < 0.0 {
        value = -value;
    }
    (value / 100.0) * base_value + base_value
}

fn to_indexed_to_100(value: f64, base_value: f64) -> f64 {
    let result = 100.0 * (value - base_value) / base_value + 100.0;
    if base_value < 0.0 { -result } else { result }
}

fn to_log(price: f64, formula: LogFormula) -> f64 {
    let magnitude = price.abs();
    if magnitude < 1e-15 {
        return 0.0;
    }
    let value = (magnitude + formula.coord_offset).log10() + formula.logical_offset;
    if price < 0.0 { -value } else { value }
}

fn from_log(logical: f64, formula: LogFormula) -> f64 {
    let magnitude = logical.abs();
    if magnitude < 1e-15 {
        return 0.0;
    }
    let value = 10f64.powf(magnitude - formula.logical_offset) - formula.coord_offset;
    if logical < 0.0 { -value } else { value }
}

fn convert_price_range_to_log(range: Option<PriceRange>, formula: LogFormula) -> Option<PriceRange> {
    range.map(|r| PriceRange::new(to_log(r.min(), formula), to_log(r.max(), formula)))
}

fn convert_price_range_from_log(
    range: Option<PriceRange>,
    formula: LogFormula,
) -> Option<PriceRange> {
    range.map(|r| PriceRange::new(from_log(r.min(), formula), from_log(r.max(), formula)))
}

/// The default formula keeps ordinary ranges stable; only spans below one
/// unit get a shifted offset so small values stay distinguishable.
fn log_formula_for_price_range(range: Option<PriceRange>) -> LogFormula {
    let default = LogFormula::default();
    let Some(range) = range else {
        return default;
    };
    let diff = (range.max() - range.min()).abs();
    if !(1e-15..1.0).contains(&diff) {
        return default;
    }
    let digits = diff.log10().abs().ceil();
    let logical_offset = default.logical_offset + digits;
    let coord_offset = 1.0 / 10f64.powf(logical_offset);
    LogFormula {
        logical_offset,
        coord_offset,
    }
}

fn log_formulas_are_same(left: LogFormula, right: LogFormula) -> bool {
    (left.logical_offset - right.logical_offset).abs() <= f64::EPSILON
        && (left.coord_offset - right.coord_offset).abs() <= f64::EPSILON
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{AxisError, AxisResult};

use super::range::{LogicalRange, StrictRange, TimePointIndex};
use super::tick_marks::{FormattedLabelsCache, TickMarks};
use super::time_data::{TickMarkWeight, TimePoint, TimeScalePoint};

const MIN_VISIBLE_BARS_COUNT: f64 = 2.0;
const LABELS_CACHE_CAPACITY: usize = 100;

/// Formats a time-axis label for a point of the given significance.
pub type TimeLabelFormatter = Box<dyn Fn(TimePoint, TickMarkWeight) -> String>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScaleOptions {
    pub right_offset: f64,
    pub bar_spacing: f64,
    pub min_bar_spacing: f64,
    pub fix_left_edge: bool,
    pub fix_right_edge: bool,
    pub lock_visible_time_range_on_resize: bool,
    pub right_bar_stays_on_scroll: bool,
}

impl Default for TimeScaleOptions {
    fn default() -> Self {
        Self {
            right_offset: 0.0,
            bar_spacing: 6.0,
            min_bar_spacing: 0.5,
            fix_left_edge: false,
            fix_right_edge: false,
            lock_visible_time_range_on_resize: false,
            right_bar_stays_on_scroll: false,
        }
    }
}

/// Gesture-start snapshot; interactive updates derive new values from this
/// state plus the total pointer delta, never delta-on-delta.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TransitionState {
    bar_spacing: f64,
    right_offset: f64,
}

/// A labeled, positioned time-axis tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxisMark {
    pub index: TimePointIndex,
    pub time: TimePoint,
    pub weight: TickMarkWeight,
    pub coord: f64,
    pub label: String,
}

/// Logical-index <-> pixel engine, parameterized by bar spacing (pixels per
/// index step) and right offset (index slots between the last data point and
/// the view's right edge).
pub struct TimeScale {
    options: TimeScaleOptions,
    width: f64,
    base_index_or_null: Option<TimePointIndex>,
    right_offset: f64,
    points: Vec<TimeScalePoint>,
    bar_spacing: f64,
    scroll_start_point: Option<f64>,
    scale_start_point: Option<f64>,
    common_transition_start_state: Option<TransitionState>,
    visible_range: Option<LogicalRange>,
    visible_range_invalidated: bool,
    tick_marks: TickMarks,
    labels_cache: FormattedLabelsCache,
}

impl std::fmt::Debug for TimeScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeScale")
            .field("width", &self.width)
            .field("bar_spacing", &self.bar_spacing)
            .field("right_offset", &self.right_offset)
            .field("points", &self.points.len())
            .finish()
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::new(TimeScaleOptions::default())
    }
}

impl TimeScale {
    #[must_use]
    pub fn new(options: TimeScaleOptions) -> Self {
        Self {
            width: 0.0,
            base_index_or_null: None,
            right_offset: options.right_offset,
            points: Vec::new(),
            bar_spacing: options.bar_spacing,
            scroll_start_point: None,
            scale_start_point: None,
            common_transition_start_state: None,
            visible_range: None,
            visible_range_invalidated: true,
            tick_marks: TickMarks::new(),
            labels_cache: FormattedLabelsCache::new(
                Box::new(default_time_label),
                LABELS_CACHE_CAPACITY,
            ),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> TimeScaleOptions {
        self.options
    }

    pub fn apply_options(&mut self, options: TimeScaleOptions) -> AxisResult<()> {
        self.options = options;
        if self.options.fix_left_edge {
            self.do_fix_left_edge()?;
        }
        if self.options.fix_right_edge {
            self.do_fix_right_edge();
        }
        self.set_bar_spacing(self.options.bar_spacing)?;
        self.set_right_offset(self.options.right_offset)?;
        Ok(())
    }

    /// Replaces the pluggable label formatter hook and drops cached labels.
    pub fn set_label_formatter(&mut self, formatter: TimeLabelFormatter) {
        self.labels_cache = FormattedLabelsCache::new(formatter, LABELS_CACHE_CAPACITY);
    }

    pub fn set_width(&mut self, new_width: f64) -> AxisResult<()> {
        if !new_width.is_finite() || new_width <= 0.0 {
            return Err(AxisError::InvalidData(
                "time scale width must be finite and > 0".to_owned(),
            ));
        }
        if (self.width - new_width).abs() <= f64::EPSILON {
            return Ok(());
        }

        let previous_visible_range = self.visible_logical_range();
        let old_width = self.width;
        self.width = new_width;
        self.visible_range_invalidated = true;

        if self.options.lock_visible_time_range_on_resize && old_width > 0.0 {
            // Keep the same logical window visible by rescaling spacing.
            self.bar_spacing = self.bar_spacing * new_width / old_width;
        }

        if self.options.fix_left_edge
            && let Some(range) = previous_visible_range
            && range.left() <= 0.0
        {
            let delta = old_width - new_width;
            self.right_offset -= (delta / self.bar_spacing).round() + 1.0;
            self.visible_range_invalidated = true;
        }

        self.correct_bar_spacing();
        self.correct_offset();
        Ok(())
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.points.is_empty() || self.base_index_or_null.is_none()
    }

    #[must_use]
    pub fn has_points(&self) -> bool {
        !self.points.is_empty()
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Installs the denormalized shared-axis points produced by the data
    /// layer; tick buckets are rebuilt from `first_changed_index` only.
    pub fn set_points(&mut self, points: Vec<TimeScalePoint>, first_changed_index: TimePointIndex) {
        self.tick_marks.set_points(&points, first_changed_index);
        self.points = points;
        self.visible_range_invalidated = true;
        self.correct_offset();
    }

    #[must_use]
    pub fn time_at(&self, index: TimePointIndex) -> Option<TimePoint> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.points.get(index))
            .map(|point| point.time)
    }

    pub fn set_base_index(&mut self, base_index: Option<TimePointIndex>) -> AxisResult<()> {
        self.base_index_or_null = base_index;
        self.visible_range_invalidated = true;
        self.correct_offset();
        self.do_fix_left_edge()?;
        Ok(())
    }

    #[must_use]
    pub fn base_index(&self) -> TimePointIndex {
        self.base_index_or_null.unwrap_or(0)
    }

    #[must_use]
    pub fn right_offset(&self) -> f64 {
        self.right_offset
    }

    pub fn set_right_offset(&mut self, offset: f64) -> AxisResult<()> {
        if !offset.is_finite() {
            return Err(AxisError::InvalidData(
                "time scale right offset must be finite".to_owned(),
            ));
        }
        self.right_offset = offset;
        self.visible_range_invalidated = true;
        self.correct_offset();
        Ok(())
    }

    #[must_use]
    pub fn bar_spacing(&self) -> f64 {
        self.bar_spacing
    }

    pub fn set_bar_spacing(&mut self, new_bar_spacing: f64) -> AxisResult<()> {
        if !new_bar_spacing.is_finite() || new_bar_spacing <= 0.0 {
            return Err(AxisError::InvalidData(
                "time scale bar spacing must be finite and > 0".to_owned(),
            ));
        }
        self.bar_spacing = new_bar_spacing;
        self.correct_bar_spacing();
        self.correct_offset();
        self.visible_range_invalidated = true;
        Ok(())
    }

    pub fn restore_default(&mut self) -> AxisResult<()> {
        self.visible_range_invalidated = true;
        self.set_bar_spacing(self.options.bar_spacing)?;
        self.set_right_offset(self.options.right_offset)
    }

    pub fn set_visible_range(&mut self, strict_range: StrictRange) -> AxisResult<()> {
        if self.width <= 0.0 {
            return Err(AxisError::InvalidData(
                "cannot set visible range before width".to_owned(),
            ));
        }
        let length = strict_range.count();
        if !length.is_finite() || length <= 0.0 {
            return Err(AxisError::InvalidData(
                "visible strict range must be non-empty".to_owned(),
            ));
        }
        self.set_bar_spacing(self.width / length)?;
        self.right_offset = strict_range.right() as f64 - self.base_index() as f64;
        self.correct_offset();
        self.visible_range_invalidated = true;
        Ok(())
    }

    pub fn set_logical_range(&mut self, range: LogicalRange) -> AxisResult<()> {
        self.set_visible_range(StrictRange::new(
            range.from as TimePointIndex,
            range.to as TimePointIndex,
        ))
    }

    pub fn fit_content(&mut self) -> AxisResult<()> {
        let (Some(first), Some(last)) = (self.first_index(), self.last_index()) else {
            return Ok(());
        };
        self.set_visible_range(StrictRange::new(
            first,
            last + self.options.right_offset as TimePointIndex,
        ))
    }

    pub fn index_to_coordinate(&self, index: TimePointIndex) -> AxisResult<f64> {
        if self.is_empty() {
            return Ok(0.0);
        }
        let base_index = self.base_index() as f64;
        let delta_from_right = base_index + self.right_offset - index as f64;
        Ok(self.width - (delta_from_right + 0.5) * self.bar_spacing - 1.0)
    }

    pub fn coordinate_to_index(&self, x: f64) -> AxisResult<TimePointIndex> {
        Ok(self.coordinate_to_float_index(x)?.ceil() as TimePointIndex)
    }

    pub fn coordinate_to_float_index(&self, x: f64) -> AxisResult<f64> {
        if !x.is_finite() {
            return Err(AxisError::InvalidData(
                "coordinate must be finite".to_owned(),
            ));
        }
        if self.bar_spacing <= 0.0 {
            return Err(AxisError::InvalidData(
                "bar spacing must be > 0".to_owned(),
            ));
        }
        let delta_from_right = (self.width - 1.0 - x) / self.bar_spacing;
        let index = self.base_index() as f64 + self.right_offset - delta_from_right;
        // Floating error correction to six decimal digits before rounding.
        Ok((index * 1_000_000.0).round() / 1_000_000.0)
    }

    /// Adjusts spacing by `scale / 10` of the current spacing; unless the
    /// right bar is pinned, the index under `zoom_point` stays under it.
    pub fn zoom(&mut self, zoom_point: f64, scale: f64) -> AxisResult<()> {
        if self.is_empty() || !scale.is_finite() || scale == 0.0 {
            return Ok(());
        }
        let clamped_zoom_point = zoom_point.clamp(1.0, self.width);
        let float_index_at_zoom_point = self.coordinate_to_float_index(clamped_zoom_point)?;
        let bar_spacing = self.bar_spacing;
        self.set_bar_spacing(bar_spacing + scale * (bar_spacing / 10.0))?;
        if !self.options.right_bar_stays_on_scroll {
            let corrected = self.right_offset
                + (float_index_at_zoom_point - self.coordinate_to_float_index(clamped_zoom_point)?);
            self.set_right_offset(corrected)?;
        }
        Ok(())
    }

    pub fn start_scale(&mut self, x: f64) {
        if self.scroll_start_point.is_some() {
            self.end_scroll();
        }
        if self.scale_start_point.is_some() || self.common_transition_start_state.is_some() {
            return;
        }
        if self.is_empty() {
            return;
        }
        self.scale_start_point = Some(x);
        self.save_common_transition_start_state();
    }

    pub fn scale_to(&mut self, x: f64) -> AxisResult<()> {
        let Some(start_state) = self.common_transition_start_state else {
            return Ok(());
        };
        let Some(scale_start) = self.scale_start_point else {
            return Ok(());
        };
        let start_length_from_right = (self.width - x).clamp(0.0, self.width);
        let current_length_from_right = (self.width - scale_start).clamp(0.0, self.width);
        if start_length_from_right == 0.0 || current_length_from_right == 0.0 {
            return Ok(());
        }
        self.set_bar_spacing(
            start_state.bar_spacing * start_length_from_right / current_length_from_right,
        )
    }

    pub fn end_scale(&mut self) {
        if self.scale_start_point.is_none() {
            return;
        }
        self.scale_start_point = None;
        self.clear_common_transition_start_state();
    }

    pub fn start_scroll(&mut self, x: f64) {
        if self.scroll_start_point.is_some() || self.common_transition_start_state.is_some() {
            return;
        }
        if self.is_empty() {
            return;
        }
        self.scroll_start_point = Some(x);
        self.save_common_transition_start_state();
    }

    pub fn scroll_to(&mut self, x: f64) {
        let Some(scroll_start_point) = self.scroll_start_point else {
            return;
        };
        let shift_in_logical = (scroll_start_point - x) / self.bar_spacing;
        let start = self
            .common_transition_start_state
            .unwrap_or(TransitionState {
                bar_spacing: self.bar_spacing,
                right_offset: self.right_offset,
            });
        self.right_offset = start.right_offset + shift_in_logical;
        self.visible_range_invalidated = true;
        self.correct_offset();
    }

    pub fn end_scroll(&mut self) {
        if self.scroll_start_point.is_none() {
            return;
        }
        self.scroll_start_point = None;
        self.clear_common_transition_start_state();
    }

    pub fn visible_logical_range(&mut self) -> Option<LogicalRange> {
        self.update_visible_range();
        self.visible_range
    }

    pub fn visible_strict_range(&mut self) -> Option<StrictRange> {
        self.update_visible_range();
        self.visible_range.map(LogicalRange::to_strict)
    }

    /// Decimated, labeled, pixel-positioned tick marks for the visible
    /// window. `max_label_width` is the widest rendered label in pixels.
    pub fn marks(&mut self, max_label_width: f64) -> AxisResult<Vec<TimeAxisMark>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let Some(visible) = self.visible_strict_range() else {
            return Ok(Vec::new());
        };
        let spacing = self.bar_spacing;
        let candidates = self.tick_marks.build(spacing, max_label_width).to_vec();

        let mut marks = Vec::with_capacity(candidates.len());
        for tick in candidates {
            if !visible.contains(tick.index) {
                continue;
            }
            let coord = self.index_to_coordinate(tick.index)?;
            let label = self.labels_cache.label(tick.time, tick.weight);
            marks.push(TimeAxisMark {
                index: tick.index,
                time: tick.time,
                weight: tick.weight,
                coord,
                label,
            });
        }
        Ok(marks)
    }

    #[must_use]
    pub fn first_index(&self) -> Option<TimePointIndex> {
        if self.points.is_empty() { None } else { Some(0) }
    }

    #[must_use]
    pub fn last_index(&self) -> Option<TimePointIndex> {
        if self.points.is_empty() {
            None
        } else {
            Some(self.points.len() as TimePointIndex - 1)
        }
    }

    fn update_visible_range(&mut self) {
        if !self.visible_range_invalidated {
            return;
        }
        self.visible_range_invalidated = false;
        if self.is_empty() {
            self.visible_range = None;
            return;
        }
        let bars_length = self.width / self.bar_spacing;
        let right_border = self.right_offset + self.base_index() as f64;
        self.visible_range = Some(LogicalRange {
            from: right_border - bars_length + 1.0,
            to: right_border,
        });
    }

    fn correct_bar_spacing(&mut self) {
        let min = self.min_bar_spacing();
        let max = self.max_bar_spacing();
        let clamped = self.bar_spacing.clamp(min, max);
        if (clamped - self.bar_spacing).abs() > f64::EPSILON {
            trace!(
                from = self.bar_spacing,
                to = clamped,
                "bar spacing clamped to constraints"
            );
            self.bar_spacing = clamped;
            self.visible_range_invalidated = true;
        }
    }

    fn min_bar_spacing(&self) -> f64 {
        // With both edges fixed the series must exactly fill the view.
        if self.options.fix_left_edge && self.options.fix_right_edge && !self.points.is_empty() {
            return self.width / self.points.len() as f64;
        }
        self.options.min_bar_spacing
    }

    fn max_bar_spacing(&self) -> f64 {
        self.width * 0.5
    }

    fn min_right_offset(&self) -> Option<f64> {
        let first = self.first_index()?;
        let base = self.base_index_or_null?;
        let bars_estimation = if self.options.fix_left_edge {
            self.width / self.bar_spacing
        } else {
            MIN_VISIBLE_BARS_COUNT.min(self.points.len() as f64)
        };
        Some(first as f64 - base as f64 - 1.0 + bars_estimation)
    }

    fn max_right_offset(&self) -> f64 {
        if self.options.fix_right_edge {
            0.0
        } else {
            self.width / self.bar_spacing - MIN_VISIBLE_BARS_COUNT.min(self.points.len() as f64)
        }
    }

    fn correct_offset(&mut self) {
        if let Some(min_right_offset) = self.min_right_offset()
            && self.right_offset < min_right_offset
        {
            self.right_offset = min_right_offset;
            self.visible_range_invalidated = true;
        }
        let max_right_offset = self.max_right_offset();
        if self.right_offset > max_right_offset {
            self.right_offset = max_right_offset;
            self.visible_range_invalidated = true;
        }
    }

    fn do_fix_left_edge(&mut self) -> AxisResult<()> {
        if !self.options.fix_left_edge {
            return Ok(());
        }
        let Some(first) = self.first_index() else {
            return Ok(());
        };
        let Some(visible) = self.visible_strict_range() else {
            return Ok(());
        };
        let delta = visible.left() - first;
        if delta < 0 {
            let left_edge_offset = self.right_offset - delta as f64 - 1.0;
            self.set_right_offset(left_edge_offset)?;
        }
        self.correct_bar_spacing();
        Ok(())
    }

    fn do_fix_right_edge(&mut self) {
        self.correct_offset();
        self.correct_bar_spacing();
    }

    fn save_common_transition_start_state(&mut self) {
        self.common_transition_start_state = Some(TransitionState {
            bar_spacing: self.bar_spacing,
            right_offset: self.right_offset,
        });
    }

    fn clear_common_transition_start_state(&mut self) {
        self.common_transition_start_state = None;
    }
}

fn default_time_label(time: TimePoint, weight: TickMarkWeight) -> String {
    let datetime: DateTime<Utc> = time.to_datetime();
    let format = match weight {
        TickMarkWeight::Year => "%Y",
        TickMarkWeight::Month => "%b '%y",
        TickMarkWeight::Day => "%d %b",
        TickMarkWeight::Hour1
        | TickMarkWeight::Hour3
        | TickMarkWeight::Hour6
        | TickMarkWeight::Hour12
        | TickMarkWeight::Minute1
        | TickMarkWeight::Minute5
        | TickMarkWeight::Minute30 => "%H:%M",
        TickMarkWeight::Second | TickMarkWeight::LessThanSecond => "%H:%M:%S",
    };
    datetime.format(format).to_string()
}

#[cfg(test)]
mod tests {
    use super::{TimeScale, TimeScaleOptions};
    use crate::model::time_data::{TickMarkWeight, TimePoint, TimeScalePoint};

    fn minute_points(count: usize) -> Vec<TimeScalePoint> {
        (0..count)
            .map(|i| TimeScalePoint {
                time: TimePoint::from_timestamp(1_609_459_200 + i as i64 * 60),
                weight: if i == 0 {
                    TickMarkWeight::Year
                } else {
                    TickMarkWeight::Minute1
                },
            })
            .collect()
    }

    fn scale_with_points(width: f64, count: usize) -> TimeScale {
        let mut time_scale = TimeScale::new(TimeScaleOptions::default());
        time_scale.set_width(width).expect("width");
        time_scale.set_points(minute_points(count), 0);
        time_scale
            .set_base_index(Some(count as i64 - 1))
            .expect("base");
        time_scale
    }

    #[test]
    fn index_coordinate_round_trip_matches_formula() {
        let mut time_scale = scale_with_points(1000.0, 200);
        time_scale.set_right_offset(0.0).expect("offset");
        time_scale.set_bar_spacing(6.0).expect("spacing");

        let x = time_scale
            .index_to_coordinate(199)
            .expect("index_to_coordinate");
        assert!((x - (1000.0 - 0.5 * 6.0 - 1.0)).abs() <= 1e-9);

        let logical = time_scale
            .coordinate_to_float_index(x)
            .expect("coordinate_to_float_index");
        assert!((logical - 198.5).abs() <= 1e-9);
    }

    #[test]
    fn zoom_preserves_anchor_when_right_bar_does_not_stay() {
        let mut time_scale = scale_with_points(800.0, 100);
        time_scale.set_bar_spacing(5.0).expect("spacing");
        let anchor = 400.0;
        let before = time_scale
            .coordinate_to_float_index(anchor)
            .expect("anchor-before");
        time_scale.zoom(anchor, 0.5).expect("zoom");
        let after = time_scale
            .coordinate_to_float_index(anchor)
            .expect("anchor-after");
        assert!((before - after).abs() <= 1e-6);
    }

    #[test]
    fn visible_strict_range_spans_full_view_at_zero_offset() {
        let mut time_scale = scale_with_points(500.0, 50);
        time_scale.set_bar_spacing(10.0).expect("spacing");
        time_scale.set_right_offset(0.0).expect("offset");

        let range = time_scale.visible_strict_range().expect("range");
        assert_eq!(range.left(), 0);
        assert_eq!(range.right(), 49);
    }

    #[test]
    fn bar_spacing_is_clamped_to_half_width() {
        let mut time_scale = scale_with_points(400.0, 100);
        time_scale.set_bar_spacing(500.0).expect("spacing");
        assert!(time_scale.bar_spacing() <= 200.0);
    }

    #[test]
    fn both_edges_fixed_force_series_to_fill_view() {
        let mut time_scale = TimeScale::new(TimeScaleOptions {
            fix_left_edge: true,
            fix_right_edge: true,
            ..Default::default()
        });
        time_scale.set_width(500.0).expect("width");
        time_scale.set_points(minute_points(100), 0);
        time_scale.set_base_index(Some(99)).expect("base");
        time_scale.set_bar_spacing(0.6).expect("spacing");
        // min spacing forced to width / point_count
        assert!((time_scale.bar_spacing() - 5.0).abs() <= 1e-9);
    }

    #[test]
    fn fixed_right_edge_clamps_right_offset_to_zero() {
        let mut time_scale = TimeScale::new(TimeScaleOptions {
            fix_right_edge: true,
            ..Default::default()
        });
        time_scale.set_width(500.0).expect("width");
        time_scale.set_points(minute_points(100), 0);
        time_scale.set_base_index(Some(99)).expect("base");

        time_scale.set_right_offset(10.0).expect("offset");
        assert_eq!(time_scale.right_offset(), 0.0);

        // Negative offsets (scrolling into history) stay legal.
        time_scale.set_right_offset(-5.0).expect("offset");
        assert_eq!(time_scale.right_offset(), -5.0);
    }

    #[test]
    fn scroll_derives_from_start_state_not_deltas() {
        let mut time_scale = scale_with_points(800.0, 100);
        time_scale.set_bar_spacing(8.0).expect("spacing");
        time_scale.set_right_offset(0.0).expect("offset");

        time_scale.start_scroll(400.0);
        let offset_before = time_scale.right_offset();
        // Many intermediate positions; final state depends only on the total
        // delta.
        for x in (250..400).rev().step_by(10) {
            time_scale.scroll_to(x as f64);
        }
        time_scale.scroll_to(240.0);
        time_scale.end_scroll();
        assert!((time_scale.right_offset() - (offset_before + 160.0 / 8.0)).abs() <= 1e-9);
    }

    #[test]
    fn marks_are_within_visible_range_and_labeled() {
        let mut time_scale = scale_with_points(500.0, 50);
        time_scale.set_bar_spacing(10.0).expect("spacing");
        time_scale.set_right_offset(0.0).expect("offset");

        let marks = time_scale.marks(40.0).expect("marks");
        assert!(!marks.is_empty());
        let visible = time_scale.visible_strict_range().expect("visible");
        for mark in &marks {
            assert!(visible.contains(mark.index));
            assert!(!mark.label.is_empty());
        }
        // 40px labels at 10px spacing: at least 4 slots between kept marks.
        for pair in marks.windows(2) {
            assert!(pair[1].index - pair[0].index >= 4);
        }
    }

    #[test]
    fn lock_visible_time_range_on_resize_rescales_spacing() {
        let mut time_scale = TimeScale::new(TimeScaleOptions {
            lock_visible_time_range_on_resize: true,
            ..Default::default()
        });
        time_scale.set_width(500.0).expect("width");
        time_scale.set_points(minute_points(200), 0);
        time_scale.set_base_index(Some(199)).expect("base");
        time_scale.set_bar_spacing(10.0).expect("spacing");
        time_scale.set_right_offset(0.0).expect("offset");

        let range_before = time_scale.visible_logical_range().expect("before");
        time_scale.set_width(1000.0).expect("resize");
        let range_after = time_scale.visible_logical_range().expect("after");
        assert!((range_before.width() - range_after.width()).abs() <= 1e-9);
    }
}

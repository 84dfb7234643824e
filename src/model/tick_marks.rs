use std::collections::{BTreeMap, HashMap, VecDeque};

use super::range::TimePointIndex;
use super::time_data::{TickMarkWeight, TimePoint, TimeScalePoint, UtcTimestamp};

/// One time-axis tick candidate. The full set is replaced together whenever
/// the shared axis changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickMark {
    pub index: TimePointIndex,
    pub time: TimePoint,
    pub weight: TickMarkWeight,
}

#[derive(Debug, Clone)]
struct MarksCache {
    marks: Vec<TickMark>,
    max_indexes_per_mark: i64,
}

/// Buckets axis points by calendar significance and selects a non-overlapping
/// subset, favoring semantically important boundaries.
#[derive(Debug, Clone, Default)]
pub struct TickMarks {
    marks_by_weight: BTreeMap<TickMarkWeight, Vec<TickMark>>,
    cache: Option<MarksCache>,
}

impl TickMarks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-buckets points from `first_changed_index` onward; earlier buckets
    /// survive untouched.
    pub fn set_points(&mut self, points: &[TimeScalePoint], first_changed_index: TimePointIndex) {
        self.cache = None;
        for bucket in self.marks_by_weight.values_mut() {
            bucket.retain(|mark| mark.index < first_changed_index);
        }
        self.marks_by_weight.retain(|_, bucket| !bucket.is_empty());

        let start = usize::try_from(first_changed_index.max(0)).unwrap_or(0);
        for (offset, point) in points.iter().enumerate().skip(start) {
            self.marks_by_weight
                .entry(point.weight)
                .or_default()
                .push(TickMark {
                    index: offset as TimePointIndex,
                    time: point.time,
                    weight: point.weight,
                });
        }
    }

    /// Selects marks such that adjacent kept labels are at least
    /// `ceil(max_label_width / spacing)` index slots apart, processing weight
    /// tiers from most to least significant.
    pub fn build(&mut self, spacing: f64, max_label_width: f64) -> &[TickMark] {
        let max_indexes_per_mark = (max_label_width / spacing).ceil() as i64;
        let stale = self
            .cache
            .as_ref()
            .is_none_or(|cache| cache.max_indexes_per_mark != max_indexes_per_mark);
        if stale {
            self.cache = Some(MarksCache {
                marks: self.build_marks_impl(max_indexes_per_mark),
                max_indexes_per_mark,
            });
        }
        match &self.cache {
            Some(cache) => &cache.marks,
            None => &[],
        }
    }

    fn build_marks_impl(&self, max_indexes_per_mark: i64) -> Vec<TickMark> {
        let mut marks: Vec<TickMark> = Vec::new();

        for bucket in self.marks_by_weight.values().rev() {
            let prev_marks = marks;
            marks = Vec::with_capacity(prev_marks.len() + bucket.len());
            let mut prev_pointer = 0;
            let mut left_index = i64::MIN;
            let mut right_index = i64::MAX;

            for mark in bucket {
                let current_index = mark.index;
                // Advance past already-kept higher-significance marks to the
                // left of the candidate; the next one bounds it on the right.
                while prev_pointer < prev_marks.len() {
                    let last = prev_marks[prev_pointer];
                    if last.index < current_index {
                        prev_pointer += 1;
                        marks.push(last);
                        left_index = last.index;
                        right_index = i64::MAX;
                    } else {
                        right_index = last.index;
                        break;
                    }
                }
                let clear_right = right_index == i64::MAX
                    || right_index - current_index >= max_indexes_per_mark;
                let clear_left = left_index == i64::MIN
                    || current_index - left_index >= max_indexes_per_mark;
                if clear_right && clear_left {
                    marks.push(*mark);
                    left_index = current_index;
                }
            }

            marks.extend_from_slice(&prev_marks[prev_pointer..]);
        }

        marks
    }
}

/// Bounded formatted-label cache keyed by timestamp and weight, so unchanged
/// points never pay for label formatting twice.
pub struct FormattedLabelsCache {
    format: Box<dyn Fn(TimePoint, TickMarkWeight) -> String>,
    labels: HashMap<(UtcTimestamp, TickMarkWeight), String>,
    insertion_order: VecDeque<(UtcTimestamp, TickMarkWeight)>,
    capacity: usize,
}

impl std::fmt::Debug for FormattedLabelsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormattedLabelsCache")
            .field("len", &self.labels.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl FormattedLabelsCache {
    #[must_use]
    pub fn new(format: Box<dyn Fn(TimePoint, TickMarkWeight) -> String>, capacity: usize) -> Self {
        Self {
            format,
            labels: HashMap::new(),
            insertion_order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn label(&mut self, time: TimePoint, weight: TickMarkWeight) -> String {
        let key = (time.timestamp, weight);
        if let Some(label) = self.labels.get(&key) {
            return label.clone();
        }
        if self.labels.len() >= self.capacity
            && let Some(oldest) = self.insertion_order.pop_front()
        {
            self.labels.remove(&oldest);
        }
        let label = (self.format)(time, weight);
        self.labels.insert(key, label.clone());
        self.insertion_order.push_back(key);
        label
    }

    /// Drops all cached labels, e.g. when the formatter hook changes.
    pub fn clear(&mut self) {
        self.labels.clear();
        self.insertion_order.clear();
    }
}

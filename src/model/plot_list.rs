use std::collections::HashMap;

use super::range::TimePointIndex;
use super::time_data::{PlotRow, PlotRowValueIndex};

/// Number of logical-index slots covered by one memoized min/max chunk.
const CHUNK_SIZE: i64 = 30;

/// Lookup behavior when no row exists exactly at the queried index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchDirection {
    None,
    NearestLeft,
    NearestRight,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    fn merge(self, other: MinMax) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Ordered, index-keyed row storage for one series.
///
/// Rows are a sparse subset of valid shared-axis slots, sorted by logical
/// index. Ranged min/max queries memoize per-chunk extrema so a warm query
/// costs at most two partial chunk scans plus the cached interior.
#[derive(Debug, Clone, Default)]
pub struct PlotList {
    rows: Vec<PlotRow>,
    min_max_cache: HashMap<(PlotRowValueIndex, i64), Option<MinMax>>,
}

impl PlotList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all content and clears caches.
    pub fn set_data(&mut self, rows: Vec<PlotRow>) {
        self.rows = rows;
        self.min_max_cache.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn first(&self) -> Option<&PlotRow> {
        self.rows.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&PlotRow> {
        self.rows.last()
    }

    #[must_use]
    pub fn rows(&self) -> &[PlotRow] {
        &self.rows
    }

    #[must_use]
    pub fn row_at(&self, position: usize) -> Option<&PlotRow> {
        self.rows.get(position)
    }

    /// Finds the row at `index`, or the nearest one in `direction`.
    #[must_use]
    pub fn search(&self, index: TimePointIndex, direction: MismatchDirection) -> Option<&PlotRow> {
        let position = self.rows.partition_point(|row| row.index < index);
        if let Some(row) = self.rows.get(position)
            && row.index == index
        {
            return Some(row);
        }
        match direction {
            MismatchDirection::None => None,
            MismatchDirection::NearestLeft => {
                if position == 0 {
                    None
                } else {
                    self.rows.get(position - 1)
                }
            }
            MismatchDirection::NearestRight => self.rows.get(position),
        }
    }

    /// Value of `plot` at `index`, honoring the mismatch direction.
    #[must_use]
    pub fn value_at(
        &self,
        index: TimePointIndex,
        plot: PlotRowValueIndex,
        direction: MismatchDirection,
    ) -> Option<f64> {
        self.search(index, direction).map(|row| row.value(plot))
    }

    /// True min/max of `plots` over the inclusive index range `[start, end]`.
    ///
    /// The index space is partitioned into fixed-size chunks. Fully covered
    /// chunks are computed once and memoized; the query composes a left
    /// boundary partial scan, the cached interior, and a right boundary
    /// partial scan. When the range fits inside one chunk the interior is
    /// empty and a single partial scan covers it.
    pub fn min_max_on_range_cached(
        &mut self,
        start: TimePointIndex,
        end: TimePointIndex,
        plots: &[PlotRowValueIndex],
    ) -> Option<MinMax> {
        if start > end || self.rows.is_empty() {
            return None;
        }
        let mut result: Option<MinMax> = None;
        for &plot in plots {
            if let Some(partial) = self.min_max_on_range_cached_impl(start, end, plot) {
                result = Some(match result {
                    Some(acc) => acc.merge(partial),
                    None => partial,
                });
            }
        }
        result
    }

    /// Uncached variant, used by tests as the reference implementation.
    #[must_use]
    pub fn min_max_on_range(
        &self,
        start: TimePointIndex,
        end: TimePointIndex,
        plots: &[PlotRowValueIndex],
    ) -> Option<MinMax> {
        let mut result: Option<MinMax> = None;
        for &plot in plots {
            if let Some(partial) = self.scan_min_max(start, end, plot) {
                result = Some(match result {
                    Some(acc) => acc.merge(partial),
                    None => partial,
                });
            }
        }
        result
    }

    fn min_max_on_range_cached_impl(
        &mut self,
        start: TimePointIndex,
        end: TimePointIndex,
        plot: PlotRowValueIndex,
    ) -> Option<MinMax> {
        // Whole chunks strictly inside [start, end]; both partial scans clamp
        // to the query bounds, so a sub-chunk query degenerates to one scan.
        let first_full_chunk = start.div_euclid(CHUNK_SIZE)
            + i64::from(start.rem_euclid(CHUNK_SIZE) != 0);
        let last_full_chunk = (end + 1).div_euclid(CHUNK_SIZE) - 1;

        let mut result: Option<MinMax> = None;
        let merge = |partial: Option<MinMax>, acc: &mut Option<MinMax>| {
            if let Some(partial) = partial {
                *acc = Some(match *acc {
                    Some(existing) => existing.merge(partial),
                    None => partial,
                });
            }
        };

        if first_full_chunk > last_full_chunk {
            merge(self.scan_min_max(start, end, plot), &mut result);
            return result;
        }

        let interior_start = first_full_chunk * CHUNK_SIZE;
        let interior_end = (last_full_chunk + 1) * CHUNK_SIZE - 1;
        if start < interior_start {
            merge(self.scan_min_max(start, interior_start - 1, plot), &mut result);
        }
        for chunk in first_full_chunk..=last_full_chunk {
            let cached = match self.min_max_cache.get(&(plot, chunk)) {
                Some(cached) => *cached,
                None => {
                    let computed =
                        self.scan_min_max(chunk * CHUNK_SIZE, (chunk + 1) * CHUNK_SIZE - 1, plot);
                    self.min_max_cache.insert((plot, chunk), computed);
                    computed
                }
            };
            merge(cached, &mut result);
        }
        if end > interior_end {
            merge(self.scan_min_max(interior_end + 1, end, plot), &mut result);
        }
        result
    }

    fn scan_min_max(
        &self,
        start: TimePointIndex,
        end: TimePointIndex,
        plot: PlotRowValueIndex,
    ) -> Option<MinMax> {
        let from = self.rows.partition_point(|row| row.index < start);
        let mut result: Option<MinMax> = None;
        for row in &self.rows[from..] {
            if row.index > end {
                break;
            }
            let value = row.value(plot);
            if !value.is_finite() {
                continue;
            }
            result = Some(match result {
                Some(acc) => MinMax {
                    min: acc.min.min(value),
                    max: acc.max.max(value),
                },
                None => MinMax {
                    min: value,
                    max: value,
                },
            });
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::{MismatchDirection, PlotList, PlotRow, PlotRowValueIndex};
    use crate::model::time_data::TimePoint;

    fn row(index: i64, value: f64) -> PlotRow {
        PlotRow {
            index,
            time: TimePoint::from_timestamp(index * 60),
            value: [value; 4],
            color: None,
        }
    }

    fn sample_list() -> PlotList {
        let mut list = PlotList::new();
        list.set_data(vec![row(0, 10.0), row(2, 30.0), row(5, 5.0), row(9, 42.0)]);
        list
    }

    #[test]
    fn search_exact_and_nearest() {
        let list = sample_list();
        assert_eq!(
            list.search(2, MismatchDirection::None).map(|r| r.index),
            Some(2)
        );
        assert_eq!(list.search(3, MismatchDirection::None), None);
        assert_eq!(
            list.search(3, MismatchDirection::NearestLeft)
                .map(|r| r.index),
            Some(2)
        );
        assert_eq!(
            list.search(3, MismatchDirection::NearestRight)
                .map(|r| r.index),
            Some(5)
        );
        assert_eq!(list.search(-1, MismatchDirection::NearestLeft), None);
        assert_eq!(list.search(10, MismatchDirection::NearestRight), None);
    }

    #[test]
    fn min_max_over_partial_range() {
        let mut list = sample_list();
        let min_max = list
            .min_max_on_range_cached(2, 5, &[PlotRowValueIndex::Close])
            .expect("range has rows");
        assert_eq!(min_max.min, 5.0);
        assert_eq!(min_max.max, 30.0);
    }

    #[test]
    fn cached_query_matches_reference_across_chunk_boundary() {
        let mut list = PlotList::new();
        list.set_data((0..200).map(|i| row(i, (i * 7 % 83) as f64)).collect());
        for (start, end) in [(0, 199), (29, 31), (30, 59), (15, 150), (31, 31)] {
            let cold = list.min_max_on_range(start, end, &[PlotRowValueIndex::High]);
            let cached = list.min_max_on_range_cached(start, end, &[PlotRowValueIndex::High]);
            let warm = list.min_max_on_range_cached(start, end, &[PlotRowValueIndex::High]);
            assert_eq!(cold, cached, "range [{start}, {end}]");
            assert_eq!(cached, warm, "range [{start}, {end}]");
        }
    }

    #[test]
    fn set_data_invalidates_cache() {
        let mut list = sample_list();
        let before = list.min_max_on_range_cached(0, 9, &[PlotRowValueIndex::Low]);
        assert!(before.is_some());
        list.set_data(vec![row(0, 1.0)]);
        let after = list
            .min_max_on_range_cached(0, 9, &[PlotRowValueIndex::Low])
            .expect("row present");
        assert_eq!(after.min, 1.0);
        assert_eq!(after.max, 1.0);
    }
}

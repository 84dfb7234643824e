use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{AxisError, AxisResult};

use super::range::TimePointIndex;
use super::time_data::{
    Color, PlotRow, SeriesTime, TickMarkWeight, TimePoint, TimeScalePoint, UtcTimestamp,
    weight_by_time,
};

/// Opaque handle identifying one data series across the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesId(pub u32);

impl std::fmt::Display for SeriesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "series-{}", self.0)
    }
}

/// One incoming observation, before it is bound to a shared-axis slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesDataRow {
    pub time: SeriesTime,
    pub value: [f64; 4],
    pub color: Option<Color>,
}

impl SeriesDataRow {
    /// Single-value row; the value is repeated across all four slots.
    #[must_use]
    pub fn single(time: SeriesTime, value: f64) -> Self {
        Self {
            time,
            value: [value; 4],
            color: None,
        }
    }

    #[must_use]
    pub fn ohlc(time: SeriesTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            value: [open, high, low, close],
            color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SlotValue {
    value: [f64; 4],
    color: Option<Color>,
}

/// One shared-axis slot: exclusively owned by the data layer and addressed
/// by its position in the arena. Dependent structures receive denormalized
/// copies, never references.
#[derive(Debug, Clone)]
struct TimePointSlot {
    time: TimePoint,
    weight: TickMarkWeight,
    mappings: IndexMap<SeriesId, SlotValue>,
}

/// Per-series outcome of a data layer mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesChanges {
    /// The series' resulting row sequence, re-indexed against the new axis.
    pub rows: Vec<PlotRow>,
    /// True when the change is a pure rightward append, enabling cheap
    /// "new bar" effects downstream.
    pub appended_to_right: bool,
}

/// Minimal-diff descriptor of one data layer mutation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataUpdateResponse {
    /// Index of the last shared-axis slot, if any.
    pub base_index: Option<TimePointIndex>,
    /// First structurally changed index; callers invalidate from here only.
    /// `None` when the shared axis itself is untouched.
    pub first_changed_index: Option<TimePointIndex>,
    /// Full denormalized axis sequence, present only when the axis changed.
    pub time_scale_points: Option<Vec<TimeScalePoint>>,
    pub series: IndexMap<SeriesId, SeriesChanges>,
}

/// Merges every series' time points into one sorted, gap-free logical-index
/// sequence and produces minimal-diff update descriptors.
#[derive(Debug, Clone, Default)]
pub struct DataLayer {
    slots: Vec<TimePointSlot>,
    index_by_timestamp: HashMap<UtcTimestamp, usize>,
    series_last_timestamp: IndexMap<SeriesId, UtcTimestamp>,
}

impl DataLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn series_ids(&self) -> Vec<SeriesId> {
        self.series_last_timestamp.keys().copied().collect()
    }

    #[must_use]
    pub fn time_at(&self, index: TimePointIndex) -> Option<TimePoint> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.slots.get(index))
            .map(|slot| slot.time)
    }

    /// Current row sequence of `series` against the shared axis.
    #[must_use]
    pub fn series_rows(&self, series: SeriesId) -> Vec<PlotRow> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.mappings.get(&series).map(|slot_value| PlotRow {
                    index: index as TimePointIndex,
                    time: slot.time,
                    value: slot_value.value,
                    color: slot_value.color,
                })
            })
            .collect()
    }

    /// Replaces a series' full data set.
    ///
    /// All-or-nothing: time conversion and ordering are validated before any
    /// mutation. Returns a minimal-diff descriptor whose
    /// `first_changed_index` lets callers invalidate from the first
    /// structurally changed slot only.
    pub fn set_series_data(
        &mut self,
        series: SeriesId,
        rows: Vec<SeriesDataRow>,
    ) -> AxisResult<DataUpdateResponse> {
        let converted = convert_and_validate(&rows)?;

        let old_axis: Vec<UtcTimestamp> = self.slots.iter().map(|slot| slot.time.timestamp).collect();
        let old_series_timestamps: Vec<UtcTimestamp> = self
            .slots
            .iter()
            .filter(|slot| slot.mappings.contains_key(&series))
            .map(|slot| slot.time.timestamp)
            .collect();

        let only_series = self.series_last_timestamp.is_empty()
            || (self.series_last_timestamp.len() == 1
                && self.series_last_timestamp.contains_key(&series));

        if only_series {
            // Single-series case: clear and rebuild in one O(n) pass.
            trace!(%series, rows = converted.len(), "single-series full rebuild");
            self.slots = converted
                .iter()
                .map(|(time, slot_value)| TimePointSlot {
                    time: *time,
                    weight: TickMarkWeight::Year,
                    mappings: IndexMap::from([(series, *slot_value)]),
                })
                .collect();
        } else {
            for slot in &mut self.slots {
                slot.mappings.swap_remove(&series);
            }
            // Cleanup pass: purge slots no series maps anymore.
            self.slots.retain(|slot| !slot.mappings.is_empty());
            for (time, slot_value) in &converted {
                match self
                    .slots
                    .binary_search_by_key(&time.timestamp, |slot| slot.time.timestamp)
                {
                    Ok(position) => {
                        self.slots[position].mappings.insert(series, *slot_value);
                    }
                    Err(position) => {
                        self.slots.insert(
                            position,
                            TimePointSlot {
                                time: *time,
                                weight: TickMarkWeight::Year,
                                mappings: IndexMap::from([(series, *slot_value)]),
                            },
                        );
                    }
                }
            }
        }

        if converted.is_empty() {
            self.series_last_timestamp.swap_remove(&series);
        } else {
            let last = converted[converted.len() - 1].0.timestamp;
            self.series_last_timestamp.insert(series, last);
        }

        let new_axis: Vec<UtcTimestamp> = self.slots.iter().map(|slot| slot.time.timestamp).collect();
        let membership_changed = old_axis != new_axis;
        let first_changed_index = if membership_changed {
            let first_diff = old_axis
                .iter()
                .zip(&new_axis)
                .position(|(old, new)| old != new)
                .unwrap_or_else(|| old_axis.len().min(new_axis.len()));
            Some(first_diff as TimePointIndex)
        } else {
            None
        };

        if let Some(first_changed) = first_changed_index {
            self.rebuild_index_lookup();
            self.fill_weights_from(first_changed as usize);
        } else if only_series {
            // The fast path rebuilt the slots wholesale with placeholder
            // weights even though the axis membership is unchanged.
            self.fill_weights_from(0);
        }

        let new_series_timestamps: Vec<UtcTimestamp> =
            converted.iter().map(|(time, _)| time.timestamp).collect();
        let appended_to_right = new_series_timestamps.len() >= old_series_timestamps.len()
            && new_series_timestamps[..old_series_timestamps.len()] == old_series_timestamps[..];

        debug!(
            %series,
            points = self.slots.len(),
            membership_changed,
            ?first_changed_index,
            "series data replaced"
        );

        let mut response = DataUpdateResponse {
            base_index: self.base_index(),
            first_changed_index,
            time_scale_points: membership_changed.then(|| self.time_scale_points()),
            series: IndexMap::new(),
        };
        if membership_changed {
            // Indices may have shifted for every series.
            for other in self.series_ids() {
                let appended = if other == series { appended_to_right } else { false };
                response.series.insert(
                    other,
                    SeriesChanges {
                        rows: self.series_rows(other),
                        appended_to_right: appended,
                    },
                );
            }
            if !response.series.contains_key(&series) {
                response.series.insert(
                    series,
                    SeriesChanges {
                        rows: Vec::new(),
                        appended_to_right,
                    },
                );
            }
        } else {
            response.series.insert(
                series,
                SeriesChanges {
                    rows: self.series_rows(series),
                    appended_to_right,
                },
            );
        }
        Ok(response)
    }

    /// Appends or overwrites a single point.
    ///
    /// Fails with `OutOfOrder` (and no mutation) when the row's timestamp is
    /// strictly earlier than the series' latest stored timestamp. An existing
    /// timestamp is overwritten in place without an axis rebuild; a new one
    /// is inserted in order with weights recomputed only around the insertion
    /// point.
    pub fn update_series_data(
        &mut self,
        series: SeriesId,
        row: SeriesDataRow,
    ) -> AxisResult<DataUpdateResponse> {
        let time = TimePoint::from_series_time(row.time)?;
        if let Some(&last) = self.series_last_timestamp.get(&series)
            && time.timestamp < last
        {
            return Err(AxisError::OutOfOrder(format!(
                "cannot update {series} with timestamp {} older than the last stored {last}",
                time.timestamp
            )));
        }

        let slot_value = SlotValue {
            value: row.value,
            color: row.color,
        };

        let (first_changed_index, axis_changed) =
            match self.index_by_timestamp.get(&time.timestamp) {
                Some(&position) => {
                    // Amortized O(1) in-place overwrite, no axis rebuild.
                    self.slots[position].mappings.insert(series, slot_value);
                    (None, false)
                }
                None => {
                    let position = self
                        .slots
                        .partition_point(|slot| slot.time.timestamp < time.timestamp);
                    self.slots.insert(
                        position,
                        TimePointSlot {
                            time,
                            weight: TickMarkWeight::Year,
                            mappings: IndexMap::from([(series, slot_value)]),
                        },
                    );
                    for (index, slot) in self.slots.iter().enumerate().skip(position) {
                        self.index_by_timestamp.insert(slot.time.timestamp, index);
                    }
                    // Only the inserted point and the neighbor whose
                    // predecessor changed need fresh weights.
                    self.reweigh_at(position);
                    self.reweigh_at(position + 1);
                    (Some(position as TimePointIndex), true)
                }
            };

        self.series_last_timestamp.insert(series, time.timestamp);

        trace!(%series, timestamp = time.timestamp, axis_changed, "single point update");

        let mut response = DataUpdateResponse {
            base_index: self.base_index(),
            first_changed_index,
            time_scale_points: axis_changed.then(|| self.time_scale_points()),
            series: IndexMap::new(),
        };
        if axis_changed {
            for other in self.series_ids() {
                response.series.insert(
                    other,
                    SeriesChanges {
                        rows: self.series_rows(other),
                        appended_to_right: other == series
                            && first_changed_index
                                .is_some_and(|changed| changed == self.slots.len() as i64 - 1),
                    },
                );
            }
        } else {
            response.series.insert(
                series,
                SeriesChanges {
                    rows: self.series_rows(series),
                    appended_to_right: true,
                },
            );
        }
        Ok(response)
    }

    /// Removing a series is a full assignment of the empty set.
    pub fn remove_series(&mut self, series: SeriesId) -> AxisResult<DataUpdateResponse> {
        self.set_series_data(series, Vec::new())
    }

    #[must_use]
    pub fn base_index(&self) -> Option<TimePointIndex> {
        if self.slots.is_empty() {
            None
        } else {
            Some(self.slots.len() as TimePointIndex - 1)
        }
    }

    /// Denormalized copies of every axis slot, safe to hand to the time
    /// scale without sharing ownership.
    #[must_use]
    pub fn time_scale_points(&self) -> Vec<TimeScalePoint> {
        self.slots
            .iter()
            .map(|slot| TimeScalePoint {
                time: slot.time,
                weight: slot.weight,
            })
            .collect()
    }

    fn rebuild_index_lookup(&mut self) {
        self.index_by_timestamp.clear();
        for (index, slot) in self.slots.iter().enumerate() {
            self.index_by_timestamp.insert(slot.time.timestamp, index);
        }
    }

    fn fill_weights_from(&mut self, start: usize) {
        for index in start..self.slots.len() {
            self.reweigh_at(index);
        }
    }

    fn reweigh_at(&mut self, index: usize) {
        if index >= self.slots.len() {
            return;
        }
        // A series start is always a period boundary.
        let weight = if index == 0 {
            TickMarkWeight::Year
        } else {
            weight_by_time(self.slots[index].time, self.slots[index - 1].time)
        };
        self.slots[index].weight = weight;
    }
}

/// Converts incoming rows with one converter chosen from the first row's
/// shape and checks strict ascending order. Pure: performed in full before
/// any mutation so failures leave the layer untouched.
fn convert_and_validate(rows: &[SeriesDataRow]) -> AxisResult<Vec<(TimePoint, SlotValue)>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let expect_business_day = matches!(first.time, SeriesTime::BusinessDay(_));

    let mut converted = Vec::with_capacity(rows.len());
    let mut prev_timestamp: Option<UtcTimestamp> = None;
    for row in rows {
        if matches!(row.time, SeriesTime::BusinessDay(_)) != expect_business_day {
            return Err(AxisError::InvalidFormat(
                "mixing business-day and timestamp rows within one call is not supported"
                    .to_owned(),
            ));
        }
        let time = TimePoint::from_series_time(row.time)?;
        if let Some(prev) = prev_timestamp
            && time.timestamp <= prev
        {
            return Err(AxisError::OutOfOrder(format!(
                "series data must be strictly ascending: {} follows {prev}",
                time.timestamp
            )));
        }
        prev_timestamp = Some(time.timestamp);
        converted.push((
            time,
            SlotValue {
                value: row.value,
                color: row.color,
            },
        ));
    }
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::{DataLayer, SeriesDataRow, SeriesId};
    use crate::model::time_data::{BusinessDay, SeriesTime};

    fn rows(timestamps: &[i64]) -> Vec<SeriesDataRow> {
        timestamps
            .iter()
            .map(|&t| SeriesDataRow::single(SeriesTime::Timestamp(t), t as f64))
            .collect()
    }

    #[test]
    fn two_series_interleave_onto_one_axis() {
        let mut layer = DataLayer::new();
        let a = SeriesId(1);
        let b = SeriesId(2);
        layer.set_series_data(a, rows(&[100, 200, 300])).expect("a");
        let response = layer.set_series_data(b, rows(&[150, 250])).expect("b");

        assert_eq!(layer.point_count(), 5);
        let a_indices: Vec<i64> = layer.series_rows(a).iter().map(|r| r.index).collect();
        let b_indices: Vec<i64> = layer.series_rows(b).iter().map(|r| r.index).collect();
        assert_eq!(a_indices, vec![0, 2, 4]);
        assert_eq!(b_indices, vec![1, 3]);
        assert_eq!(response.base_index, Some(4));

        let points = response.time_scale_points.expect("axis changed");
        let timestamps: Vec<i64> = points.iter().map(|p| p.time.timestamp).collect();
        assert_eq!(timestamps, vec![100, 150, 200, 250, 300]);
    }

    #[test]
    fn replacing_values_without_membership_change_keeps_axis() {
        let mut layer = DataLayer::new();
        let a = SeriesId(1);
        let b = SeriesId(2);
        layer.set_series_data(a, rows(&[100, 200])).expect("a");
        layer.set_series_data(b, rows(&[100, 200])).expect("b");

        let mut replacement = rows(&[100, 200]);
        replacement[0].value = [9.0; 4];
        let response = layer.set_series_data(b, replacement).expect("b again");
        assert_eq!(response.first_changed_index, None);
        assert!(response.time_scale_points.is_none());
        assert_eq!(response.series.len(), 1);
        assert_eq!(response.series[&b].rows[0].value[0], 9.0);
    }

    #[test]
    fn rightward_append_is_flagged() {
        let mut layer = DataLayer::new();
        let a = SeriesId(1);
        layer.set_series_data(a, rows(&[100, 200])).expect("initial");
        let response = layer
            .set_series_data(a, rows(&[100, 200, 300]))
            .expect("extended");
        assert!(response.series[&a].appended_to_right);
        assert_eq!(response.first_changed_index, Some(2));

        let response = layer
            .set_series_data(a, rows(&[50, 100, 200, 300]))
            .expect("prepended");
        assert!(!response.series[&a].appended_to_right);
        assert_eq!(response.first_changed_index, Some(0));
    }

    #[test]
    fn out_of_order_update_fails_without_mutation() {
        let mut layer = DataLayer::new();
        let a = SeriesId(1);
        layer.set_series_data(a, rows(&[100, 200, 300])).expect("a");
        let snapshot = layer.time_scale_points();
        let snapshot_rows = layer.series_rows(a);

        let result = layer.update_series_data(
            a,
            SeriesDataRow::single(SeriesTime::Timestamp(250), 1.0),
        );
        assert!(result.is_err());
        assert_eq!(layer.time_scale_points(), snapshot);
        assert_eq!(layer.series_rows(a), snapshot_rows);
    }

    #[test]
    fn update_at_existing_timestamp_overwrites_in_place() {
        let mut layer = DataLayer::new();
        let a = SeriesId(1);
        let b = SeriesId(2);
        layer.set_series_data(a, rows(&[100, 200])).expect("a");
        layer.set_series_data(b, rows(&[150])).expect("b");

        // b updates onto a's existing slot: no axis rebuild.
        let response = layer
            .update_series_data(b, SeriesDataRow::single(SeriesTime::Timestamp(200), 7.0))
            .expect("update");
        assert!(response.time_scale_points.is_none());
        assert_eq!(response.first_changed_index, None);
        assert_eq!(layer.point_count(), 3);
        let b_rows = &response.series[&SeriesId(2)].rows;
        assert_eq!(b_rows.len(), 2);
        assert_eq!(b_rows[1].index, 2);
        assert_eq!(b_rows[1].value[3], 7.0);
    }

    #[test]
    fn update_with_new_timestamp_inserts_in_order() {
        let mut layer = DataLayer::new();
        let a = SeriesId(1);
        let b = SeriesId(2);
        layer.set_series_data(a, rows(&[100, 300])).expect("a");
        layer.set_series_data(b, rows(&[100])).expect("b");

        let response = layer
            .update_series_data(b, SeriesDataRow::single(SeriesTime::Timestamp(200), 2.0))
            .expect("insert");
        assert_eq!(layer.point_count(), 3);
        assert_eq!(response.first_changed_index, Some(1));
        assert!(response.time_scale_points.is_some());
        // a's rows were re-indexed by the insertion.
        let a_indices: Vec<i64> = response.series[&a].rows.iter().map(|r| r.index).collect();
        assert_eq!(a_indices, vec![0, 2]);
    }

    #[test]
    fn remove_series_purges_exclusive_slots() {
        let mut layer = DataLayer::new();
        let a = SeriesId(1);
        let b = SeriesId(2);
        layer.set_series_data(a, rows(&[100, 200, 300])).expect("a");
        layer.set_series_data(b, rows(&[150, 250])).expect("b");

        let response = layer.remove_series(b).expect("remove");
        assert_eq!(layer.point_count(), 3);
        assert_eq!(response.series[&b].rows.len(), 0);
        let a_indices: Vec<i64> = layer.series_rows(a).iter().map(|r| r.index).collect();
        assert_eq!(a_indices, vec![0, 1, 2]);
    }

    #[test]
    fn mixing_time_shapes_in_one_call_is_rejected() {
        let mut layer = DataLayer::new();
        let a = SeriesId(1);
        let mixed = vec![
            SeriesDataRow::single(SeriesTime::Timestamp(100), 1.0),
            SeriesDataRow::single(
                SeriesTime::BusinessDay(BusinessDay {
                    year: 2021,
                    month: 1,
                    day: 2,
                }),
                2.0,
            ),
        ];
        assert!(layer.set_series_data(a, mixed).is_err());
        assert_eq!(layer.point_count(), 0);
    }

    #[test]
    fn malformed_business_day_fails_before_any_mutation() {
        let mut layer = DataLayer::new();
        let a = SeriesId(1);
        let bad = vec![
            SeriesDataRow::single(
                SeriesTime::BusinessDay(BusinessDay {
                    year: 2021,
                    month: 1,
                    day: 2,
                }),
                1.0,
            ),
            SeriesDataRow::single(
                SeriesTime::BusinessDay(BusinessDay {
                    year: 2021,
                    month: 2,
                    day: 30,
                }),
                2.0,
            ),
        ];
        assert!(layer.set_series_data(a, bad).is_err());
        assert_eq!(layer.point_count(), 0);
        assert!(layer.series_ids().is_empty());
    }

    #[test]
    fn non_ascending_full_assignment_is_rejected() {
        let mut layer = DataLayer::new();
        let a = SeriesId(1);
        assert!(layer.set_series_data(a, rows(&[100, 100])).is_err());
        assert!(layer.set_series_data(a, rows(&[200, 100])).is_err());
        assert_eq!(layer.point_count(), 0);
    }
}

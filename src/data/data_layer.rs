use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ChartError, ChartResult};
use crate::time::{
    TickMarkWeight, TimeConverter, TimePoint, TimePointIndex, TimeScalePoint, UserTime,
    UtcTimestamp, fill_weights_from, string_to_business_day,
};

use super::items::SeriesDataItem;
use super::plot_row::{PlotRow, SeriesRow, create_series_row};
use super::series::{Series, SeriesId};

/// Per-timestamp record aggregating every series' row at that timestamp.
///
/// Owned solely by the timestamp-keyed map; the sorted sequence refers to
/// it by timestamp, so the two access routes can never hold stale state.
#[derive(Debug, Clone)]
struct TimePointData {
    index: TimePointIndex,
    time_point: TimePoint,
    original_time: UserTime,
    mapping: IndexMap<SeriesId, SeriesRow>,
}

impl TimePointData {
    fn new(time_point: TimePoint, original_time: UserTime) -> Self {
        // Index 0 is provisional; the reconciliation pass assigns the real
        // one before any row leaves the layer.
        Self {
            index: 0,
            time_point,
            original_time,
            mapping: IndexMap::new(),
        }
    }

    fn assign_index(&mut self, index: TimePointIndex) {
        self.index = index;
        for row in self.mapping.values_mut() {
            row.set_index(index);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesUpdateInfo {
    /// True when the edit touched the current tail or appended to the
    /// right of it, so consumers may keep their scroll position.
    pub last_bar_updated_or_new_bars_added_to_the_right: bool,
}

/// Change description for one series inside a `DataUpdateResponse`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesChanges {
    pub data: Vec<PlotRow>,
    pub info: Option<SeriesUpdateInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeScaleChanges {
    pub base_index: Option<TimePointIndex>,
    /// Snapshot of the sorted time points; present iff the shared time
    /// scale changed.
    pub points: Option<Vec<TimeScalePoint>>,
    /// First position at which the new sorted points diverge from the old;
    /// absent when the time scale is unchanged.
    pub first_changed_point_index: Option<TimePointIndex>,
}

/// Delta record returned by every data-layer mutation. Consumers treat it
/// as an immutable snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUpdateResponse {
    pub series: IndexMap<SeriesId, SeriesChanges>,
    pub time_scale: TimeScaleChanges,
}

/// Debug view of one shared time point, for assertions in tests and
/// tooling.
#[derive(Debug, Clone, PartialEq)]
pub struct TimePointSnapshot {
    pub timestamp: UtcTimestamp,
    pub index: TimePointIndex,
    pub rows: Vec<RowSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSnapshot {
    pub series: SeriesId,
    pub index: TimePointIndex,
    pub whitespace: bool,
}

/// Time-indexed, multi-series ingestion and merging engine.
///
/// Maintains the globally sorted set of time points shared across all
/// series, assigns a dense index to every point, and answers each mutation
/// with the minimal correct delta.
#[derive(Debug, Default)]
pub struct DataLayer {
    point_data_by_time: HashMap<UtcTimestamp, TimePointData>,
    sorted_points: Vec<TimeScalePoint>,
    series_rows: IndexMap<SeriesId, Vec<PlotRow>>,
    series_last_time: HashMap<SeriesId, TimePoint>,
}

impl DataLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the series' whole dataset.
    ///
    /// Input must be strictly ascending by time and shaped for the series
    /// kind; violations surface as `UnorderedInput` / `InvalidData` before
    /// any state changes.
    pub fn set_series_data(
        &mut self,
        series: Series,
        mut items: Vec<SeriesDataItem>,
    ) -> ChartResult<DataUpdateResponse> {
        let prepared = prepare_items(series, &mut items)?;

        let prev_span = self.series_rows.get(&series.id()).and_then(|rows| {
            match (rows.first(), rows.last()) {
                (Some(first), Some(last)) => {
                    Some((first.time.timestamp, last.time.timestamp))
                }
                _ => None,
            }
        });

        let mut needs_cleanup = false;
        let mut time_scale_affected = false;

        if self.series_rows.contains_key(&series.id()) {
            if self.series_rows.len() == 1 {
                // Sole series: wiping the whole map beats walking it.
                self.point_data_by_time.clear();
                time_scale_affected = true;
            } else {
                for point in self.point_data_by_time.values_mut() {
                    if point.mapping.shift_remove(&series.id()).is_some() {
                        time_scale_affected = true;
                    }
                }
                needs_cleanup = true;
            }
        }

        let mut new_rows: Vec<SeriesRow> = Vec::with_capacity(items.len());
        for (item, (time, original_time)) in items.iter().zip(&prepared) {
            let point = self
                .point_data_by_time
                .entry(time.timestamp)
                .or_insert_with(|| {
                    time_scale_affected = true;
                    TimePointData::new(*time, original_time.clone())
                });
            let row =
                create_series_row(series.kind(), *time, point.index, item, original_time.clone())?;
            point.mapping.insert(series.id(), row.clone());
            new_rows.push(row);
        }

        if needs_cleanup {
            self.point_data_by_time
                .retain(|_, point| !point.mapping.is_empty());
        }

        if let Some(last_row) = new_rows.last() {
            self.series_last_time.insert(series.id(), last_row.time());
            let value_rows = new_rows
                .iter()
                .filter_map(|row| row.as_data().cloned())
                .collect();
            self.series_rows.insert(series.id(), value_rows);
        } else {
            self.series_rows.shift_remove(&series.id());
            self.series_last_time.remove(&series.id());
        }

        let mut first_changed = None;
        if time_scale_affected {
            first_changed = self.replace_time_scale_points();
            self.resync_series_row_indexes(UtcTimestamp::MIN);
        }

        let info = prev_span.and_then(|(prev_first, prev_last)| {
            let rows = self.series_rows.get(&series.id())?;
            let first = rows.first()?;
            let last = rows.last()?;
            Some(SeriesUpdateInfo {
                last_bar_updated_or_new_bars_added_to_the_right: last.time.timestamp >= prev_last
                    && first.time.timestamp >= prev_first,
            })
        });

        debug!(
            series = series.id().raw(),
            items = items.len(),
            time_scale_affected,
            "set series data"
        );
        Ok(self.update_response(series.id(), first_changed, info))
    }

    /// Single-point update: append, edit at the tail, or introduce one new
    /// time point. Never earlier than the series' last time.
    pub fn update_series_data(
        &mut self,
        series: Series,
        item: SeriesDataItem,
    ) -> ChartResult<DataUpdateResponse> {
        if !self.series_rows.contains_key(&series.id()) {
            return Err(ChartError::UnknownSeries(series.id()));
        }
        if !item.matches(series.kind()) {
            return Err(ChartError::InvalidData(format!(
                "item shape does not match {:?} series",
                series.kind()
            )));
        }

        let original_time = item.time().clone();
        let mut item = item;
        *item.time_mut() = string_to_business_day(item.time().clone())?;
        let converter = TimeConverter::select(item.time());
        let time = converter.convert(item.time())?;

        if let Some(last) = self.series_last_time.get(&series.id())
            && time.timestamp < last.timestamp
        {
            return Err(ChartError::UpdateOutOfOrder {
                last: last.timestamp,
                new: time.timestamp,
            });
        }

        let affects_time_scale = !self.point_data_by_time.contains_key(&time.timestamp);
        let insertion = if affects_time_scale {
            self.point_data_by_time
                .insert(time.timestamp, TimePointData::new(time, original_time.clone()));
            // The splice is the acknowledged in-place exception to the
            // rebuild-on-replace rule; indexes are resynced before the
            // response leaves the layer.
            let insertion = self
                .sorted_points
                .partition_point(|point| point.time.timestamp < time.timestamp);
            self.sorted_points.insert(
                insertion,
                TimeScalePoint {
                    time_weight: TickMarkWeight::default(),
                    time,
                    original_time: original_time.clone(),
                },
            );
            for index in insertion..self.sorted_points.len() {
                let timestamp = self.sorted_points[index].time.timestamp;
                self.assign_index_at(timestamp, index as TimePointIndex);
            }
            fill_weights_from(&mut self.sorted_points, insertion);
            self.resync_series_row_indexes(time.timestamp);
            Some(insertion)
        } else {
            None
        };

        let row = {
            let point = self
                .point_data_by_time
                .get_mut(&time.timestamp)
                .ok_or_else(|| {
                    ChartError::InvalidData("time point vanished during update".to_owned())
                })?;
            let row = create_series_row(series.kind(), time, point.index, &item, original_time)?;
            point.mapping.insert(series.id(), row.clone());
            row
        };
        self.update_last_series_row(series.id(), &row);

        let info = Some(SeriesUpdateInfo {
            last_bar_updated_or_new_bars_added_to_the_right: !row.is_whitespace(),
        });

        trace!(
            series = series.id().raw(),
            timestamp = time.timestamp,
            new_point = affects_time_scale,
            "update series data"
        );
        Ok(self.update_response(
            series.id(),
            insertion,
            info,
        ))
    }

    /// Equivalent to `set_series_data(series, vec![])`.
    pub fn remove_series(&mut self, series: Series) -> ChartResult<DataUpdateResponse> {
        self.set_series_data(series, Vec::new())
    }

    /// Maximum last-row index across all non-empty series.
    #[must_use]
    pub fn base_index(&self) -> Option<TimePointIndex> {
        self.series_rows
            .values()
            .filter_map(|rows| rows.last())
            .map(|row| row.index)
            .max()
    }

    #[must_use]
    pub fn sorted_time_points(&self) -> &[TimeScalePoint] {
        &self.sorted_points
    }

    #[must_use]
    pub fn series_rows(&self, series: SeriesId) -> Option<&[PlotRow]> {
        self.series_rows.get(&series).map(Vec::as_slice)
    }

    #[must_use]
    pub fn series_last_time(&self, series: SeriesId) -> Option<TimePoint> {
        self.series_last_time.get(&series).copied()
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.sorted_points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted_points.is_empty()
    }

    /// Sorted-order view of every time point and its per-series rows. A
    /// snapshot shorter than `point_count` means the two access routes
    /// disagree, which is itself an invariant violation.
    #[must_use]
    pub fn point_snapshot(&self) -> Vec<TimePointSnapshot> {
        self.sorted_points
            .iter()
            .filter_map(|point| {
                self.point_data_by_time
                    .get(&point.time.timestamp)
                    .map(|data| TimePointSnapshot {
                        timestamp: point.time.timestamp,
                        index: data.index,
                        rows: data
                            .mapping
                            .iter()
                            .map(|(series, row)| RowSnapshot {
                                series: *series,
                                index: row.index(),
                                whitespace: row.is_whitespace(),
                            })
                            .collect(),
                    })
            })
            .collect()
    }

    pub fn destroy(&mut self) {
        self.point_data_by_time.clear();
        self.sorted_points.clear();
        self.series_rows.clear();
        self.series_last_time.clear();
    }

    /// Rebuilds the sorted sequence from the timestamp map, preserving
    /// prefix weights, and resyncs dense indexes from the first divergence
    /// into every mapped row.
    fn replace_time_scale_points(&mut self) -> Option<usize> {
        let mut new_points: Vec<TimeScalePoint> = self
            .point_data_by_time
            .values()
            .map(|point| TimeScalePoint {
                time_weight: TickMarkWeight::default(),
                time: point.time_point,
                original_time: point.original_time.clone(),
            })
            .collect();
        new_points.sort_by_key(|point| point.time.timestamp);

        let mut first_changed = None;
        let common = self.sorted_points.len().min(new_points.len());
        for index in 0..common {
            let old_timestamp = self.sorted_points[index].time.timestamp;
            let new_timestamp = new_points[index].time.timestamp;
            if old_timestamp != new_timestamp {
                first_changed = Some(index);
                break;
            }
            // Matching prefix keeps its weight. The index is resynced
            // anyway: a wholesale wipe recreates point records with
            // provisional indexes even when the timestamps are identical.
            new_points[index].time_weight = self.sorted_points[index].time_weight;
            self.assign_index_at(new_timestamp, index as TimePointIndex);
        }

        if first_changed.is_none() && self.sorted_points.len() != new_points.len() {
            first_changed = Some(common);
        }

        let Some(start) = first_changed else {
            self.sorted_points = new_points;
            return None;
        };

        for index in start..new_points.len() {
            let timestamp = new_points[index].time.timestamp;
            self.assign_index_at(timestamp, index as TimePointIndex);
        }
        fill_weights_from(&mut new_points, start);
        self.sorted_points = new_points;
        Some(start)
    }

    fn assign_index_at(&mut self, timestamp: UtcTimestamp, index: TimePointIndex) {
        if let Some(point) = self.point_data_by_time.get_mut(&timestamp) {
            point.assign_index(index);
        }
    }

    /// Pushes reconciled indexes back into the per-series row lists for
    /// every row at or after `from`.
    fn resync_series_row_indexes(&mut self, from: UtcTimestamp) {
        let Self {
            point_data_by_time,
            series_rows,
            ..
        } = self;
        for rows in series_rows.values_mut() {
            let start = rows.partition_point(|row| row.time.timestamp < from);
            for row in &mut rows[start..] {
                if let Some(point) = point_data_by_time.get(&row.time.timestamp) {
                    row.index = point.index;
                }
            }
        }
    }

    /// Tail maintenance of the per-series list: whitespace at the tail
    /// pops the trailing row, a value at the tail timestamp replaces it,
    /// a value beyond the tail pushes.
    fn update_last_series_row(&mut self, series: SeriesId, row: &SeriesRow) {
        let rows = self.series_rows.entry(series).or_default();
        let last_timestamp = rows.last().map(|last| last.time.timestamp);
        match row {
            SeriesRow::Data(data) => {
                if last_timestamp.is_none_or(|last| data.time.timestamp > last) {
                    rows.push(data.clone());
                } else {
                    let last_position = rows.len() - 1;
                    rows[last_position] = data.clone();
                }
            }
            SeriesRow::Whitespace(_) => {
                if last_timestamp.is_some_and(|last| row.time().timestamp <= last) {
                    rows.pop();
                }
            }
        }
        self.series_last_time.insert(series, row.time());
    }

    fn update_response(
        &self,
        updated: SeriesId,
        first_changed: Option<usize>,
        info: Option<SeriesUpdateInfo>,
    ) -> DataUpdateResponse {
        let mut series = IndexMap::new();
        if let Some(first_changed) = first_changed {
            for (id, rows) in &self.series_rows {
                series.insert(
                    *id,
                    SeriesChanges {
                        data: rows.clone(),
                        info: (*id == updated).then_some(info).flatten(),
                    },
                );
            }
            // A wiped series has no row-list entry anymore but its
            // consumers still need to observe the empty state.
            if !self.series_rows.contains_key(&updated) {
                series.insert(
                    updated,
                    SeriesChanges {
                        data: Vec::new(),
                        info,
                    },
                );
            }
            DataUpdateResponse {
                series,
                time_scale: TimeScaleChanges {
                    base_index: self.base_index(),
                    points: Some(self.sorted_points.clone()),
                    first_changed_point_index: Some(first_changed as TimePointIndex),
                },
            }
        } else {
            let data = self
                .series_rows
                .get(&updated)
                .cloned()
                .unwrap_or_default();
            series.insert(updated, SeriesChanges { data, info });
            DataUpdateResponse {
                series,
                time_scale: TimeScaleChanges {
                    base_index: self.base_index(),
                    points: None,
                    first_changed_point_index: None,
                },
            }
        }
    }
}

/// Saves original times, rewrites string times to business days, resolves
/// the per-dataset converter, and order-checks the whole batch up front so
/// a bad item cannot leave the layer partially rebound.
fn prepare_items(
    series: Series,
    items: &mut [SeriesDataItem],
) -> ChartResult<Vec<(TimePoint, UserTime)>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let mut originals = Vec::with_capacity(items.len());
    for item in items.iter_mut() {
        if !item.matches(series.kind()) {
            return Err(ChartError::InvalidData(format!(
                "item shape does not match {:?} series",
                series.kind()
            )));
        }
        originals.push(item.time().clone());
        *item.time_mut() = string_to_business_day(item.time().clone())?;
    }

    let converter = TimeConverter::select(items[0].time());
    let mut prepared = Vec::with_capacity(items.len());
    let mut previous: Option<UtcTimestamp> = None;
    for (index, (item, original_time)) in items.iter().zip(originals).enumerate() {
        let time = converter.convert(item.time())?;
        if let Some(previous) = previous
            && time.timestamp <= previous
        {
            return Err(ChartError::UnorderedInput {
                index,
                timestamp: time.timestamp,
                previous,
            });
        }
        previous = Some(time.timestamp);
        prepared.push((time, original_time));
    }
    Ok(prepared)
}

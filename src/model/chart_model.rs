use indexmap::IndexMap;
use tracing::debug;

use crate::data::{
    DataLayer, DataUpdateResponse, PlotRow, Series, SeriesDataItem, SeriesId, SeriesType,
};
use crate::delegate::Delegate;
use crate::error::{ChartError, ChartResult};

use super::invalidate_mask::{
    InvalidateMask, InvalidationLevel, PaneInvalidation, TimeScaleInvalidation,
};
use super::pane::{Pane, PriceScaleSide};
use super::price_scale::{AutoScaleInfo, PriceRange, PriceScaleOptions};
use super::time_scale::{LogicalRange, StrictRange, TimeScale, TimeScaleOptions};

#[derive(Debug, Clone, Copy)]
struct SeriesBinding {
    kind: SeriesType,
    pane_index: usize,
}

/// Owner of the data layer, the series registry, the time scale, and the
/// pane list.
///
/// Every mutation applies the data layer's response and enqueues an
/// invalidation mask; rendering effects become observable no earlier than
/// the next frame, when the paint scheduler drains the mask.
#[derive(Debug)]
pub struct ChartModel {
    data_layer: DataLayer,
    series: IndexMap<SeriesId, SeriesBinding>,
    series_data: IndexMap<SeriesId, Vec<PlotRow>>,
    next_series_id: u64,
    time_scale: TimeScale,
    panes: Vec<Pane>,
    pending_invalidation: Option<InvalidateMask>,
    destroyed: Delegate<()>,
    is_destroyed: bool,
}

impl Default for ChartModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartModel {
    #[must_use]
    pub fn new() -> Self {
        Self::with_time_scale_options(TimeScaleOptions::default())
    }

    #[must_use]
    pub fn with_time_scale_options(options: TimeScaleOptions) -> Self {
        Self {
            data_layer: DataLayer::new(),
            series: IndexMap::new(),
            series_data: IndexMap::new(),
            next_series_id: 0,
            time_scale: TimeScale::new(options),
            panes: vec![Pane::new(
                PriceScaleOptions::default(),
                PriceScaleOptions::default(),
            )],
            pending_invalidation: Some(InvalidateMask::full()),
            destroyed: Delegate::new(),
            is_destroyed: false,
        }
    }

    #[must_use]
    pub fn time_scale(&self) -> &TimeScale {
        &self.time_scale
    }

    #[must_use]
    pub fn time_scale_mut(&mut self) -> &mut TimeScale {
        &mut self.time_scale
    }

    #[must_use]
    pub fn panes(&self) -> &[Pane] {
        &self.panes
    }

    #[must_use]
    pub fn data_layer(&self) -> &DataLayer {
        &self.data_layer
    }

    #[must_use]
    pub fn series_rows(&self, series: SeriesId) -> Option<&[PlotRow]> {
        self.series_data.get(&series).map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.is_destroyed
    }

    /// Handle to the destroyed notification; fires exactly once.
    #[must_use]
    pub fn destroyed(&self) -> Delegate<()> {
        self.destroyed.clone()
    }

    pub fn set_width(&mut self, width: f64) -> ChartResult<()> {
        self.ensure_alive()?;
        self.time_scale.set_width(width)?;
        self.full_update();
        Ok(())
    }

    pub fn add_pane(&mut self) -> ChartResult<usize> {
        self.ensure_alive()?;
        self.panes.push(Pane::new(
            PriceScaleOptions::default(),
            PriceScaleOptions::default(),
        ));
        self.full_update();
        Ok(self.panes.len() - 1)
    }

    pub fn add_series(&mut self, kind: SeriesType) -> ChartResult<Series> {
        self.add_series_to_pane(kind, 0, PriceScaleSide::Right)
    }

    pub fn add_series_to_pane(
        &mut self,
        kind: SeriesType,
        pane_index: usize,
        price_side: PriceScaleSide,
    ) -> ChartResult<Series> {
        self.ensure_alive()?;
        if pane_index >= self.panes.len() {
            return Err(ChartError::InvalidData(format!(
                "pane {pane_index} does not exist"
            )));
        }
        let id = SeriesId::new(self.next_series_id);
        self.next_series_id += 1;
        self.series.insert(id, SeriesBinding { kind, pane_index });
        self.panes[pane_index].assign_series(id, price_side);
        self.series_data.insert(id, Vec::new());
        self.full_update();
        debug!(series = id.raw(), ?kind, pane_index, "add series");
        Ok(Series::new(id, kind))
    }

    pub fn set_series_data(
        &mut self,
        series: Series,
        items: Vec<SeriesDataItem>,
    ) -> ChartResult<()> {
        self.ensure_alive()?;
        self.ensure_owned(series)?;
        validate_item_values(&items)?;
        let response = self.data_layer.set_series_data(series, items)?;
        self.apply_data_update(series.id(), &response);
        Ok(())
    }

    pub fn update_series_data(
        &mut self,
        series: Series,
        item: SeriesDataItem,
    ) -> ChartResult<()> {
        self.ensure_alive()?;
        self.ensure_owned(series)?;
        validate_item_values(std::slice::from_ref(&item))?;
        let response = self.data_layer.update_series_data(series, item)?;
        self.apply_data_update(series.id(), &response);
        Ok(())
    }

    pub fn remove_series(&mut self, series: Series) -> ChartResult<()> {
        self.ensure_alive()?;
        self.ensure_owned(series)?;
        let response = self.data_layer.remove_series(series)?;
        self.apply_data_update(series.id(), &response);
        if let Some(binding) = self.series.shift_remove(&series.id())
            && let Some(pane) = self.panes.get_mut(binding.pane_index)
        {
            pane.remove_series(series.id());
        }
        self.series_data.shift_remove(&series.id());
        self.full_update();
        debug!(series = series.id().raw(), "remove series");
        Ok(())
    }

    /// Recomputes the auto-scaled price ranges of one pane from the rows
    /// visible on the time scale.
    pub fn auto_scale_pane(&mut self, pane_index: usize) {
        let Some(visible) = self.time_scale.visible_strict_range() else {
            return;
        };
        let Some(pane) = self.panes.get(pane_index) else {
            return;
        };

        let mut computed = Vec::new();
        for side in [PriceScaleSide::Left, PriceScaleSide::Right] {
            if !pane.price_scale(side).is_auto_scale() {
                continue;
            }
            let mut merged: Option<PriceRange> = None;
            for series in pane.series_on(side) {
                let Some(rows) = self.series_data.get(&series) else {
                    continue;
                };
                if let Some(range) = rows_price_range(rows, visible) {
                    merged = Some(merged.map_or(range, |acc| acc.merge(range)));
                }
            }
            if let Some(range) = merged {
                computed.push((side, range));
            }
        }

        for (side, range) in computed {
            self.panes[pane_index]
                .price_scale_mut(side)
                .apply_autoscale_info(AutoScaleInfo {
                    price_range: Some(range),
                    margins: None,
                });
        }
    }

    /// Maps queued time-scale mutations onto the scale, in queue order.
    pub fn apply_time_scale_invalidations(&mut self, mask: &InvalidateMask) -> ChartResult<()> {
        for invalidation in mask.time_scale_invalidations() {
            match invalidation {
                TimeScaleInvalidation::FitContent => self.time_scale.fit_content()?,
                TimeScaleInvalidation::ApplyRange(range) => {
                    self.time_scale.set_logical_range(range)?;
                }
                TimeScaleInvalidation::ApplyBarSpacing(spacing) => {
                    self.time_scale.set_bar_spacing(spacing)?;
                }
                TimeScaleInvalidation::ApplyRightOffset(offset) => {
                    self.time_scale.set_right_offset(offset)?;
                }
                TimeScaleInvalidation::Reset => self.time_scale.restore_default()?,
            }
        }
        Ok(())
    }

    pub fn fit_content(&mut self) -> ChartResult<()> {
        self.enqueue_time_scale(InvalidateMask::set_fit_content)
    }

    pub fn set_target_logical_range(&mut self, range: LogicalRange) -> ChartResult<()> {
        self.enqueue_time_scale(|mask| mask.apply_range(range))
    }

    pub fn set_bar_spacing(&mut self, bar_spacing: f64) -> ChartResult<()> {
        self.enqueue_time_scale(|mask| mask.set_bar_spacing(bar_spacing))
    }

    pub fn set_right_offset(&mut self, right_offset: f64) -> ChartResult<()> {
        self.enqueue_time_scale(|mask| mask.set_right_offset(right_offset))
    }

    pub fn reset_time_scale(&mut self) -> ChartResult<()> {
        self.enqueue_time_scale(InvalidateMask::reset_time_scale)
    }

    /// Zooms immediately around the anchor and queues the resulting
    /// spacing and offset so the next frame repaints with them.
    pub fn zoom_time_scale(&mut self, zoom_point: f64, scale: f64) -> ChartResult<()> {
        self.ensure_alive()?;
        self.time_scale.zoom(zoom_point, scale)?;
        let mut mask = InvalidateMask::light();
        mask.set_bar_spacing(self.time_scale.bar_spacing());
        mask.set_right_offset(self.time_scale.right_offset());
        self.invalidate(mask);
        Ok(())
    }

    pub fn invalidate(&mut self, mask: InvalidateMask) {
        if let Some(pending) = &mut self.pending_invalidation {
            pending.merge(&mask);
        } else {
            self.pending_invalidation = Some(mask);
        }
    }

    #[must_use]
    pub fn pending_invalidation(&self) -> Option<&InvalidateMask> {
        self.pending_invalidation.as_ref()
    }

    pub fn take_pending_invalidation(&mut self) -> Option<InvalidateMask> {
        self.pending_invalidation.take()
    }

    pub fn full_update(&mut self) {
        self.invalidate(InvalidateMask::full());
    }

    pub fn light_update(&mut self) {
        self.invalidate(InvalidateMask::light());
    }

    pub fn cursor_update(&mut self) {
        self.invalidate(InvalidateMask::new(InvalidationLevel::Cursor));
    }

    /// Drops all state, fires the destroyed notification once, and makes
    /// every subsequent operation fail with `Destroyed`.
    pub fn destroy(&mut self) {
        if self.is_destroyed {
            return;
        }
        self.is_destroyed = true;
        self.pending_invalidation = None;
        self.data_layer.destroy();
        self.series.clear();
        self.series_data.clear();
        self.destroyed.fire(&());
        self.destroyed.destroy();
        debug!("chart model destroyed");
    }

    fn ensure_alive(&self) -> ChartResult<()> {
        if self.is_destroyed {
            Err(ChartError::Destroyed)
        } else {
            Ok(())
        }
    }

    fn ensure_owned(&self, series: Series) -> ChartResult<()> {
        match self.series.get(&series.id()) {
            Some(binding) if binding.kind == series.kind() => Ok(()),
            Some(_) => Err(ChartError::InvalidData(
                "series handle kind does not match the registered series".to_owned(),
            )),
            None => Err(ChartError::UnknownSeries(series.id())),
        }
    }

    fn enqueue_time_scale(&mut self, mutate: impl FnOnce(&mut InvalidateMask)) -> ChartResult<()> {
        self.ensure_alive()?;
        let mut mask = InvalidateMask::light();
        mutate(&mut mask);
        self.invalidate(mask);
        Ok(())
    }

    fn apply_data_update(&mut self, updated: SeriesId, response: &DataUpdateResponse) {
        let time_scale_changed = response.time_scale.points.is_some();
        if let Some(points) = &response.time_scale.points {
            self.time_scale
                .update(points.clone(), response.time_scale.base_index);
        } else {
            self.time_scale.set_base_index(response.time_scale.base_index);
        }
        for (id, changes) in &response.series {
            self.series_data.insert(*id, changes.data.clone());
        }

        let mut mask = if time_scale_changed {
            InvalidateMask::full()
        } else {
            InvalidateMask::light()
        };
        if let Some(binding) = self.series.get(&updated) {
            mask.invalidate_pane(
                binding.pane_index,
                PaneInvalidation::autoscaled(mask.full_invalidation()),
            );
        }
        self.invalidate(mask);
    }
}

fn rows_price_range(rows: &[PlotRow], visible: StrictRange) -> Option<PriceRange> {
    let start = rows.partition_point(|row| row.index < visible.left());
    let end = rows.partition_point(|row| row.index <= visible.right());
    PriceRange::covering(&rows[start..end])
}

fn validate_item_values(items: &[SeriesDataItem]) -> ChartResult<()> {
    for (position, item) in items.iter().enumerate() {
        match item {
            SeriesDataItem::SingleValue(single) if !single.value.is_finite() => {
                return Err(ChartError::InvalidData(format!(
                    "item {position}: value must be finite"
                )));
            }
            SeriesDataItem::Ohlc(ohlc) if !ohlc.is_well_formed() => {
                return Err(ChartError::InvalidData(format!(
                    "item {position}: malformed OHLC bar"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

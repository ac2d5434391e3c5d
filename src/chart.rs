use tracing::debug;

use crate::data::{Series, SeriesDataItem, SeriesType};
use crate::delegate::{Delegate, SubscriptionId};
use crate::error::ChartResult;
use crate::model::{
    ChartModel, LogicalRange, PaintScheduler, PanePainter, PriceScaleSide, TimeScaleOptions,
};

/// Owner binding the chart model, the paint scheduler, and the host's
/// painter.
///
/// The host supplies the frame clock: after any call here it checks
/// `needs_frame()` and, when true, arranges for `on_frame()` to run at the
/// next frame boundary. All activity stays on the calling thread.
#[derive(Debug)]
pub struct ChartCore<P: PanePainter> {
    model: ChartModel,
    scheduler: PaintScheduler,
    painter: P,
    frame_needed: bool,
}

impl<P: PanePainter> ChartCore<P> {
    #[must_use]
    pub fn new(painter: P) -> Self {
        Self::with_time_scale_options(painter, TimeScaleOptions::default())
    }

    #[must_use]
    pub fn with_time_scale_options(painter: P, options: TimeScaleOptions) -> Self {
        let mut core = Self {
            model: ChartModel::with_time_scale_options(options),
            scheduler: PaintScheduler::new(),
            painter,
            frame_needed: false,
        };
        // A fresh model carries a full invalidation for the first frame.
        core.pump();
        core
    }

    #[must_use]
    pub fn model(&self) -> &ChartModel {
        &self.model
    }

    #[must_use]
    pub fn painter(&self) -> &P {
        &self.painter
    }

    /// Whether the host must schedule an `on_frame` call.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.frame_needed
    }

    /// Runs one frame: drains the coalesced mask, applies queued
    /// time-scale mutations and auto-scale, and paints.
    pub fn on_frame(&mut self) {
        self.frame_needed = self.scheduler.on_frame(&mut self.model, &mut self.painter);
    }

    pub fn set_width(&mut self, width: f64) -> ChartResult<()> {
        self.model.set_width(width)?;
        self.pump();
        Ok(())
    }

    pub fn add_pane(&mut self) -> ChartResult<usize> {
        let pane_index = self.model.add_pane()?;
        self.pump();
        Ok(pane_index)
    }

    pub fn add_series(&mut self, kind: SeriesType) -> ChartResult<Series> {
        let series = self.model.add_series(kind)?;
        self.pump();
        Ok(series)
    }

    pub fn add_series_to_pane(
        &mut self,
        kind: SeriesType,
        pane_index: usize,
        price_side: PriceScaleSide,
    ) -> ChartResult<Series> {
        let series = self.model.add_series_to_pane(kind, pane_index, price_side)?;
        self.pump();
        Ok(series)
    }

    pub fn set_series_data(
        &mut self,
        series: Series,
        items: Vec<SeriesDataItem>,
    ) -> ChartResult<()> {
        self.model.set_series_data(series, items)?;
        self.pump();
        Ok(())
    }

    pub fn update_series_data(&mut self, series: Series, item: SeriesDataItem) -> ChartResult<()> {
        self.model.update_series_data(series, item)?;
        self.pump();
        Ok(())
    }

    pub fn remove_series(&mut self, series: Series) -> ChartResult<()> {
        self.model.remove_series(series)?;
        self.pump();
        Ok(())
    }

    pub fn fit_content(&mut self) -> ChartResult<()> {
        self.model.fit_content()?;
        self.pump();
        Ok(())
    }

    pub fn set_logical_range(&mut self, range: LogicalRange) -> ChartResult<()> {
        self.model.set_target_logical_range(range)?;
        self.pump();
        Ok(())
    }

    pub fn set_bar_spacing(&mut self, bar_spacing: f64) -> ChartResult<()> {
        self.model.set_bar_spacing(bar_spacing)?;
        self.pump();
        Ok(())
    }

    pub fn set_right_offset(&mut self, right_offset: f64) -> ChartResult<()> {
        self.model.set_right_offset(right_offset)?;
        self.pump();
        Ok(())
    }

    pub fn reset_time_scale(&mut self) -> ChartResult<()> {
        self.model.reset_time_scale()?;
        self.pump();
        Ok(())
    }

    pub fn zoom(&mut self, zoom_point: f64, scale: f64) -> ChartResult<()> {
        self.model.zoom_time_scale(zoom_point, scale)?;
        self.pump();
        Ok(())
    }

    pub fn subscribe_destroyed(&self, callback: impl Fn(&()) + 'static) -> SubscriptionId {
        self.destroyed_delegate().subscribe_with(callback, None, true)
    }

    /// Cancels any pending frame, clears the model, and fires the
    /// destroyed notification. Further operations fail with `Destroyed`.
    pub fn destroy(&mut self) {
        self.scheduler.cancel();
        self.frame_needed = false;
        self.model.destroy();
        debug!("chart core destroyed");
    }

    fn destroyed_delegate(&self) -> Delegate<()> {
        self.model.destroyed()
    }

    /// Moves whatever the model enqueued into the scheduler.
    fn pump(&mut self) {
        if let Some(mask) = self.model.take_pending_invalidation()
            && self.scheduler.invalidate(mask)
        {
            self.frame_needed = true;
        }
    }
}

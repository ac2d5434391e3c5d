use tracing::{trace, warn};

use crate::error::ChartResult;

use super::chart_model::ChartModel;
use super::invalidate_mask::{InvalidateMask, InvalidationLevel, PaneInvalidation};

/// Rendering seam the scheduler drives once per frame. Implementations are
/// opaque to the core; failures are clamped to the frame that raised them.
pub trait PanePainter {
    /// Synchronizes pane surfaces with the model's pane list. Called on
    /// full invalidation only, before anything else in the frame.
    fn sync_panes(&mut self, pane_count: usize) -> ChartResult<()>;

    /// Repaints one pane at its effective level for this frame.
    fn paint_pane(&mut self, pane_index: usize, invalidation: PaneInvalidation) -> ChartResult<()>;

    /// Repaints the time axis. Called on full invalidation only, after the
    /// panes.
    fn paint_time_axis(&mut self) -> ChartResult<()>;
}

/// Coalesces invalidation masks between frames and drains them in a single
/// pass per frame boundary.
///
/// `invalidate` may be called any number of times in one tick; the masks
/// merge and exactly one paint happens on the next frame. The snapshot is
/// taken before the drain, so work enqueued during the drain belongs to
/// the next frame (except for the single-level full re-entry described on
/// `on_frame`).
#[derive(Debug, Default)]
pub struct PaintScheduler {
    pending: Option<InvalidateMask>,
    frame_requested: bool,
}

impl PaintScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `mask` into the pending one. Returns true when the host must
    /// arm its frame clock: exactly once per quiet period.
    pub fn invalidate(&mut self, mask: InvalidateMask) -> bool {
        match &mut self.pending {
            Some(pending) => pending.merge(&mask),
            None => self.pending = Some(mask),
        }
        if self.frame_requested {
            false
        } else {
            self.frame_requested = true;
            true
        }
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancels the armed frame and drops any pending work.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.frame_requested = false;
    }

    /// Drains the pending mask: on `Full` syncs pane surfaces, on
    /// `Full | Light` applies queued time-scale mutations in list order
    /// followed by per-pane auto-scale, then paints every pane. The time
    /// axis repaints on `Full` only.
    ///
    /// If a new `Full` mask accumulated in the model while updates were
    /// being applied, it is merged into the frame and the update step runs
    /// once more before painting; deeper accumulation waits for the next
    /// frame. Returns true when another frame must be armed.
    pub fn on_frame(&mut self, model: &mut ChartModel, painter: &mut dyn PanePainter) -> bool {
        self.frame_requested = false;
        let Some(mut mask) = self.pending.take() else {
            return false;
        };

        let level = mask.full_invalidation();
        trace!(?level, "drain invalidation mask");

        if level == InvalidationLevel::Full
            && let Err(err) = painter.sync_panes(model.panes().len())
        {
            warn!(error = %err, "pane sync failed for this frame");
        }

        if level >= InvalidationLevel::Light {
            Self::apply_updates(model, &mask);

            if let Some(accumulated) = model.take_pending_invalidation() {
                if accumulated.full_invalidation() == InvalidationLevel::Full {
                    let mut reentry = accumulated;
                    reentry.merge(&mask);
                    Self::apply_updates(model, &reentry);
                    mask = reentry;
                } else {
                    model.invalidate(accumulated);
                }
            }
        }

        for pane_index in 0..model.panes().len() {
            let invalidation = mask.invalidation_for_pane(pane_index);
            if let Err(err) = painter.paint_pane(pane_index, invalidation) {
                warn!(pane_index, error = %err, "pane paint failed for this frame");
            }
        }
        if mask.full_invalidation() == InvalidationLevel::Full
            && let Err(err) = painter.paint_time_axis()
        {
            warn!(error = %err, "time axis paint failed for this frame");
        }

        if model.pending_invalidation().is_some() {
            self.frame_requested = true;
            true
        } else {
            false
        }
    }

    fn apply_updates(model: &mut ChartModel, mask: &InvalidateMask) {
        if let Err(err) = model.apply_time_scale_invalidations(mask) {
            warn!(error = %err, "time-scale invalidation failed, continuing frame");
        }
        for (pane_index, invalidation) in mask.explicit_pane_invalidations() {
            if invalidation.auto_scale {
                model.auto_scale_pane(pane_index);
            }
        }
    }
}

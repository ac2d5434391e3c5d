use std::collections::BTreeMap;

use smallvec::SmallVec;

use super::LogicalRange;

/// Coarse rank of how much redraw a frame needs. Levels only ever
/// escalate when requests meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum InvalidationLevel {
    #[default]
    None,
    Cursor,
    Light,
    Full,
}

/// Damage recorded against a single pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaneInvalidation {
    pub level: InvalidationLevel,
    pub auto_scale: bool,
}

impl PaneInvalidation {
    #[must_use]
    pub const fn at(level: InvalidationLevel) -> Self {
        Self {
            level,
            auto_scale: false,
        }
    }

    #[must_use]
    pub const fn autoscaled(level: InvalidationLevel) -> Self {
        Self {
            level,
            auto_scale: true,
        }
    }

    fn absorb(&mut self, other: Self) {
        self.level = self.level.max(other.level);
        self.auto_scale |= other.auto_scale;
    }
}

/// One queued time-scale mutation, in the order the scale will see it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeScaleInvalidation {
    FitContent,
    ApplyRange(LogicalRange),
    ApplyBarSpacing(f64),
    ApplyRightOffset(f64),
    Reset,
}

/// Whole-view mutations. At most one survives per mask: each one decides
/// the entire visible window, so it makes anything queued before it moot.
#[derive(Debug, Clone, Copy, PartialEq)]
enum WindowAction {
    FitContent,
    ApplyRange(LogicalRange),
    Reset,
}

/// Incremental mutations; they stack in arrival order behind the window
/// action.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ScaleTweak {
    BarSpacing(f64),
    RightOffset(f64),
}

/// Coalescing invalidation state between two frames.
///
/// A mask accumulates a global redraw level, per-pane damage, and the
/// time-scale mutations queued for the next frame. The queue splits into
/// one optional window action (fit-content, an explicit range, or a
/// reset, each of which replaces whatever was queued before it) and a
/// tail of spacing/offset tweaks appended behind it. `merge` replays
/// another mask's queue under the same rules, so coalescing any number
/// of masks behaves exactly like issuing their requests in sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidateMask {
    level: InvalidationLevel,
    pane_damage: BTreeMap<usize, PaneInvalidation>,
    window: Option<WindowAction>,
    tweaks: SmallVec<[ScaleTweak; 2]>,
}

impl InvalidateMask {
    #[must_use]
    pub fn new(level: InvalidationLevel) -> Self {
        Self {
            level,
            pane_damage: BTreeMap::new(),
            window: None,
            tweaks: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn full() -> Self {
        Self::new(InvalidationLevel::Full)
    }

    #[must_use]
    pub fn light() -> Self {
        Self::new(InvalidationLevel::Light)
    }

    #[must_use]
    pub fn cursor() -> Self {
        Self::new(InvalidationLevel::Cursor)
    }

    /// The level every pane is at least invalidated to.
    #[must_use]
    pub fn full_invalidation(&self) -> InvalidationLevel {
        self.level
    }

    pub fn invalidate_pane(&mut self, pane_index: usize, invalidation: PaneInvalidation) {
        self.pane_damage
            .entry(pane_index)
            .or_default()
            .absorb(invalidation);
    }

    /// Effective damage of one pane: its own entry raised to the global
    /// level. Panes without an entry never auto-scale.
    #[must_use]
    pub fn invalidation_for_pane(&self, pane_index: usize) -> PaneInvalidation {
        let mut effective = self
            .pane_damage
            .get(&pane_index)
            .copied()
            .unwrap_or_default();
        effective.level = effective.level.max(self.level);
        effective
    }

    #[must_use]
    pub fn explicit_pane_invalidations(&self) -> Vec<(usize, PaneInvalidation)> {
        self.pane_damage
            .iter()
            .map(|(pane_index, damage)| (*pane_index, *damage))
            .collect()
    }

    /// Queued time-scale mutations in application order: the surviving
    /// window action first, tweaks behind it.
    pub fn time_scale_invalidations(&self) -> impl Iterator<Item = TimeScaleInvalidation> + '_ {
        let window = self.window.map(|action| match action {
            WindowAction::FitContent => TimeScaleInvalidation::FitContent,
            WindowAction::ApplyRange(range) => TimeScaleInvalidation::ApplyRange(range),
            WindowAction::Reset => TimeScaleInvalidation::Reset,
        });
        window
            .into_iter()
            .chain(self.tweaks.iter().map(|tweak| match tweak {
                ScaleTweak::BarSpacing(spacing) => TimeScaleInvalidation::ApplyBarSpacing(*spacing),
                ScaleTweak::RightOffset(offset) => TimeScaleInvalidation::ApplyRightOffset(*offset),
            }))
    }

    pub fn set_fit_content(&mut self) {
        self.replace_window(WindowAction::FitContent);
    }

    pub fn apply_range(&mut self, range: LogicalRange) {
        self.replace_window(WindowAction::ApplyRange(range));
    }

    pub fn reset_time_scale(&mut self) {
        self.replace_window(WindowAction::Reset);
    }

    pub fn set_bar_spacing(&mut self, spacing: f64) {
        self.tweaks.push(ScaleTweak::BarSpacing(spacing));
    }

    pub fn set_right_offset(&mut self, offset: f64) {
        self.tweaks.push(ScaleTweak::RightOffset(offset));
    }

    /// Folds `other` into this mask as if its requests had been issued
    /// here, in their original order.
    pub fn merge(&mut self, other: &InvalidateMask) {
        if let Some(window) = other.window {
            self.replace_window(window);
        }
        self.tweaks.extend(other.tweaks.iter().copied());
        self.level = self.level.max(other.level);
        for (pane_index, damage) in &other.pane_damage {
            self.invalidate_pane(*pane_index, *damage);
        }
    }

    fn replace_window(&mut self, action: WindowAction) {
        // Tweaks queued so far targeted a window this action throws away;
        // only tweaks issued after it may survive.
        self.window = Some(action);
        self.tweaks.clear();
    }
}

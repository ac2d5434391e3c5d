use crate::error::{ChartError, ChartResult};
use crate::time::{TimePointIndex, TimeScalePoint};

const MIN_VISIBLE_BARS_COUNT: f64 = 2.0;

/// Continuous range over logical bar positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

impl LogicalRange {
    #[must_use]
    pub fn left(self) -> f64 {
        self.from
    }

    #[must_use]
    pub fn right(self) -> f64 {
        self.to
    }
}

/// Inclusive integer range over time-point indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictRange {
    left: TimePointIndex,
    right: TimePointIndex,
}

impl StrictRange {
    #[must_use]
    pub fn new(left: TimePointIndex, right: TimePointIndex) -> Self {
        Self { left, right }
    }

    #[must_use]
    pub fn left(self) -> TimePointIndex {
        self.left
    }

    #[must_use]
    pub fn right(self) -> TimePointIndex {
        self.right
    }

    #[must_use]
    pub fn count(self) -> f64 {
        (self.right - self.left + 1) as f64
    }

    #[must_use]
    pub fn contains(self, index: TimePointIndex) -> bool {
        self.left <= index && index <= self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScaleOptions {
    pub right_offset: f64,
    pub bar_spacing: f64,
    pub min_bar_spacing: f64,
    pub max_bar_spacing: f64,
}

impl Default for TimeScaleOptions {
    fn default() -> Self {
        Self {
            right_offset: 0.0,
            bar_spacing: 6.0,
            min_bar_spacing: 0.5,
            max_bar_spacing: 0.0,
        }
    }
}

/// Zoomable horizontal scale over the shared sorted time points.
///
/// The point list itself is owned by the data layer; this model installs
/// the snapshots it receives and derives the visible logical range from
/// width, bar spacing, and right offset.
#[derive(Debug, Clone)]
pub struct TimeScale {
    options: TimeScaleOptions,
    width: f64,
    base_index_or_null: Option<TimePointIndex>,
    right_offset: f64,
    points: Vec<TimeScalePoint>,
    bar_spacing: f64,
    visible_range: Option<LogicalRange>,
    visible_range_invalidated: bool,
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
            visible_range: None,
            visible_range_invalidated: true,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> TimeScaleOptions {
        self.options
    }

    pub fn apply_options(&mut self, options: TimeScaleOptions) -> ChartResult<()> {
        self.options = options;
        self.set_bar_spacing(self.options.bar_spacing)?;
        self.set_right_offset(self.options.right_offset)
    }

    pub fn set_width(&mut self, new_width: f64) -> ChartResult<()> {
        if !new_width.is_finite() || new_width <= 0.0 {
            return Err(ChartError::InvalidData(
                "time scale width must be finite and > 0".to_owned(),
            ));
        }
        if (self.width - new_width).abs() <= f64::EPSILON {
            return Ok(());
        }
        self.width = new_width;
        self.visible_range_invalidated = true;
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
    pub fn points(&self) -> &[TimeScalePoint] {
        &self.points
    }

    /// Installs a point snapshot received from the data layer.
    pub fn update(&mut self, points: Vec<TimeScalePoint>, base_index: Option<TimePointIndex>) {
        self.points = points;
        self.base_index_or_null = base_index;
        self.visible_range_invalidated = true;
        self.correct_offset();
    }

    pub fn set_base_index(&mut self, base_index: Option<TimePointIndex>) {
        self.base_index_or_null = base_index;
        self.visible_range_invalidated = true;
        self.correct_offset();
    }

    #[must_use]
    pub fn base_index(&self) -> TimePointIndex {
        self.base_index_or_null.unwrap_or(0)
    }

    #[must_use]
    pub fn right_offset(&self) -> f64 {
        self.right_offset
    }

    pub fn set_right_offset(&mut self, offset: f64) -> ChartResult<()> {
        if !offset.is_finite() {
            return Err(ChartError::InvalidData(
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

    pub fn set_bar_spacing(&mut self, new_bar_spacing: f64) -> ChartResult<()> {
        if !new_bar_spacing.is_finite() || new_bar_spacing <= 0.0 {
            return Err(ChartError::InvalidData(
                "time scale bar spacing must be finite and > 0".to_owned(),
            ));
        }
        self.bar_spacing = new_bar_spacing;
        self.correct_bar_spacing();
        self.correct_offset();
        self.visible_range_invalidated = true;
        Ok(())
    }

    /// Returns spacing and offset to their configured defaults.
    pub fn restore_default(&mut self) -> ChartResult<()> {
        self.visible_range_invalidated = true;
        self.set_bar_spacing(self.options.bar_spacing)?;
        self.set_right_offset(self.options.right_offset)
    }

    pub fn set_visible_range(&mut self, range: StrictRange) -> ChartResult<()> {
        if self.width <= 0.0 {
            return Err(ChartError::InvalidData(
                "cannot set visible range before width".to_owned(),
            ));
        }
        let length = range.count();
        if !length.is_finite() || length <= 0.0 {
            return Err(ChartError::InvalidData(
                "visible strict range must be non-empty".to_owned(),
            ));
        }
        self.set_bar_spacing(self.width / length)?;
        self.right_offset = range.right() as f64 - self.base_index() as f64;
        self.correct_offset();
        self.visible_range_invalidated = true;
        Ok(())
    }

    pub fn set_logical_range(&mut self, range: LogicalRange) -> ChartResult<()> {
        let strict = StrictRange::new(range.from as TimePointIndex, range.to as TimePointIndex);
        self.set_visible_range(strict)
    }

    /// Fits every point into the viewport, keeping the configured right
    /// offset as padding. No-op before the first layout pass.
    pub fn fit_content(&mut self) -> ChartResult<()> {
        let (Some(first), Some(last)) = (self.first_index(), self.last_index()) else {
            return Ok(());
        };
        if self.width <= 0.0 {
            return Ok(());
        }
        let padded_right = last + self.options.right_offset.ceil() as TimePointIndex;
        self.set_visible_range(StrictRange::new(first, padded_right))?;
        self.right_offset = self.options.right_offset;
        self.visible_range_invalidated = true;
        self.correct_offset();
        Ok(())
    }

    pub fn index_to_coordinate(&self, index: TimePointIndex) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let base_index = self.base_index() as f64;
        let delta_from_right = base_index + self.right_offset - index as f64;
        self.width - (delta_from_right + 0.5) * self.bar_spacing - 1.0
    }

    pub fn coordinate_to_index(&self, x: f64) -> ChartResult<TimePointIndex> {
        Ok(self.coordinate_to_float_index(x)?.ceil() as TimePointIndex)
    }

    pub fn coordinate_to_float_index(&self, x: f64) -> ChartResult<f64> {
        if !x.is_finite() {
            return Err(ChartError::InvalidData(
                "coordinate must be finite".to_owned(),
            ));
        }
        if self.bar_spacing <= 0.0 {
            return Err(ChartError::InvalidData(
                "bar spacing must be > 0".to_owned(),
            ));
        }
        let delta_from_right = (self.width - 1.0 - x) / self.bar_spacing;
        let index = self.base_index() as f64 + self.right_offset - delta_from_right;
        Ok((index * 1_000_000.0).round() / 1_000_000.0)
    }

    /// Zooms around an anchor coordinate, keeping the bar under the anchor
    /// in place.
    pub fn zoom(&mut self, zoom_point: f64, scale: f64) -> ChartResult<()> {
        if self.is_empty() || !scale.is_finite() || scale == 0.0 {
            return Ok(());
        }
        let clamped_zoom_point = zoom_point.clamp(1.0, self.width);
        let float_index_at_zoom_point = self.coordinate_to_float_index(clamped_zoom_point)?;
        let bar_spacing = self.bar_spacing;
        self.set_bar_spacing(bar_spacing + scale * (bar_spacing / 10.0))?;
        let corrected = self.right_offset
            + (float_index_at_zoom_point - self.coordinate_to_float_index(clamped_zoom_point)?);
        self.set_right_offset(corrected)
    }

    pub fn visible_logical_range(&mut self) -> Option<LogicalRange> {
        self.update_visible_range();
        self.visible_range
    }

    pub fn visible_strict_range(&mut self) -> Option<StrictRange> {
        self.update_visible_range();
        self.visible_range.map(|range| {
            StrictRange::new(
                range.left().floor() as TimePointIndex,
                range.right().ceil() as TimePointIndex,
            )
        })
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
        let left_border = right_border - bars_length + 1.0;
        self.visible_range = Some(LogicalRange {
            from: left_border,
            to: right_border,
        });
    }

    fn correct_bar_spacing(&mut self) {
        let clamped = self
            .bar_spacing
            .clamp(self.options.min_bar_spacing, self.max_bar_spacing());
        if (clamped - self.bar_spacing).abs() > f64::EPSILON {
            self.bar_spacing = clamped;
            self.visible_range_invalidated = true;
        }
    }

    fn max_bar_spacing(&self) -> f64 {
        if self.options.max_bar_spacing > 0.0 {
            self.options.max_bar_spacing
        } else {
            (self.width * 0.5).max(self.options.min_bar_spacing)
        }
    }

    fn min_right_offset(&self) -> Option<f64> {
        let first = self.first_index()?;
        let base = self.base_index_or_null?;
        let bars_estimation = MIN_VISIBLE_BARS_COUNT.min(self.points.len() as f64);
        Some(first as f64 - base as f64 - 1.0 + bars_estimation)
    }

    fn max_right_offset(&self) -> f64 {
        if self.bar_spacing <= 0.0 || self.width <= 0.0 {
            return 0.0;
        }
        self.width / self.bar_spacing - MIN_VISIBLE_BARS_COUNT.min(self.points.len() as f64)
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
}

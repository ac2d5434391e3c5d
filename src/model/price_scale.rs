use crate::data::PlotRow;
use crate::error::{ChartError, ChartResult};

/// Closed interval on a pane's price axis.
///
/// Ranges are built from the rows a pane currently shows (`covering`)
/// and widened or moved by the scale operations. A NaN anywhere poisons
/// the range into the degenerate state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    low: f64,
    high: f64,
}

impl PriceRange {
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Vertical extent of one row: its low/high value slots, which for
    /// single-value series both hold the scalar.
    #[must_use]
    pub fn from_row(row: &PlotRow) -> Self {
        Self {
            low: row.value.low(),
            high: row.value.high(),
        }
    }

    /// Smallest range covering every row, or `None` for an empty set.
    #[must_use]
    pub fn covering<'a>(rows: impl IntoIterator<Item = &'a PlotRow>) -> Option<Self> {
        rows.into_iter()
            .map(Self::from_row)
            .reduce(|merged, next| merged.merge(next))
    }

    #[must_use]
    pub const fn low(self) -> f64 {
        self.low
    }

    #[must_use]
    pub const fn high(self) -> f64 {
        self.high
    }

    #[must_use]
    pub fn span(self) -> f64 {
        self.high - self.low
    }

    /// Zero-height or NaN-poisoned; such a range cannot be displayed
    /// without widening first.
    #[must_use]
    pub fn is_degenerate(self) -> bool {
        !(self.span() > 0.0)
    }

    /// Union with another range.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            low: self.low.min(other.low),
            high: self.high.max(other.high),
        }
    }

    /// Stretches (or squeezes) the range around its midpoint.
    pub fn scale_around_center(&mut self, coeff: f64) {
        if !coeff.is_finite() {
            return;
        }
        let center = self.low.midpoint(self.high);
        let half_span = (self.high - center) * coeff;
        self.low = center - half_span;
        self.high = center + half_span;
    }

    /// Moves the whole range by `delta`.
    pub fn shift(&mut self, delta: f64) {
        if delta.is_finite() {
            self.low += delta;
            self.high += delta;
        }
    }
}

/// Extra space a source wants above and below its rows, in price units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScaleMargins {
    pub above: f64,
    pub below: f64,
}

impl AutoScaleMargins {
    #[must_use]
    pub fn pad(self, range: PriceRange) -> PriceRange {
        PriceRange::new(range.low() - self.below, range.high() + self.above)
    }
}

/// Autoscale request computed from the visible rows of a pane's series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScaleInfo {
    pub price_range: Option<PriceRange>,
    pub margins: Option<AutoScaleMargins>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceScaleMargins {
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceScaleOptions {
    pub auto_scale: bool,
    pub scale_margins: PriceScaleMargins,
}

impl Default for PriceScaleOptions {
    fn default() -> Self {
        Self {
            auto_scale: true,
            scale_margins: PriceScaleMargins {
                top: 0.2,
                bottom: 0.1,
            },
        }
    }
}

/// Vertical scale of one pane side.
#[derive(Debug, Clone)]
pub struct PriceScale {
    id: String,
    options: PriceScaleOptions,
    height: f64,
    price_range: Option<PriceRange>,
}

impl PriceScale {
    #[must_use]
    pub fn new(id: impl Into<String>, options: PriceScaleOptions) -> Self {
        Self {
            id: id.into(),
            options,
            height: 0.0,
            price_range: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn options(&self) -> PriceScaleOptions {
        self.options
    }

    pub fn apply_options(&mut self, options: PriceScaleOptions) -> ChartResult<()> {
        if !(0.0..=1.0).contains(&options.scale_margins.top) {
            return Err(ChartError::InvalidData(
                "price scale top margin must be in [0,1]".to_owned(),
            ));
        }
        if !(0.0..=1.0).contains(&options.scale_margins.bottom) {
            return Err(ChartError::InvalidData(
                "price scale bottom margin must be in [0,1]".to_owned(),
            ));
        }
        if options.scale_margins.top + options.scale_margins.bottom > 1.0 {
            return Err(ChartError::InvalidData(
                "sum of price scale margins must be <= 1".to_owned(),
            ));
        }
        self.options = options;
        Ok(())
    }

    #[must_use]
    pub fn is_auto_scale(&self) -> bool {
        self.options.auto_scale
    }

    pub fn set_height(&mut self, height: f64) {
        self.height = height;
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn price_range(&self) -> Option<PriceRange> {
        self.price_range
    }

    pub fn set_price_range(&mut self, range: PriceRange) {
        self.price_range = Some(range);
    }

    /// Applies an autoscale result: pads the raw extent by the explicit
    /// autoscale margins, or by the configured scale margins as a share
    /// of the span. Degenerate extents are widened around their center
    /// first.
    pub fn apply_autoscale_info(&mut self, info: AutoScaleInfo) {
        let Some(mut range) = info.price_range else {
            return;
        };
        if range.is_degenerate() {
            range = widen_degenerate(range);
        }
        let margins = info.margins.unwrap_or(AutoScaleMargins {
            above: range.span() * self.options.scale_margins.top,
            below: range.span() * self.options.scale_margins.bottom,
        });
        self.price_range = Some(margins.pad(range));
    }
}

fn widen_degenerate(range: PriceRange) -> PriceRange {
    let center = range.low();
    let half_span = if center == 0.0 {
        0.5
    } else {
        center.abs() * 0.05
    };
    PriceRange::new(center - half_span, center + half_span)
}

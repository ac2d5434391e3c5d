use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};
use crate::time::UserTime;

use super::series::SeriesType;

/// Per-row color override carried through to the renderer untouched.
pub type Color = String;

/// Single scalar sample for area, baseline, line, and histogram series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleValueItem {
    pub time: UserTime,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl SingleValueItem {
    #[must_use]
    pub fn new(time: UserTime, value: f64) -> Self {
        Self {
            time,
            value,
            color: None,
        }
    }

    pub fn from_decimal(time: DateTime<Utc>, value: Decimal) -> ChartResult<Self> {
        Ok(Self::new(
            UserTime::Timestamp(time.timestamp()),
            decimal_to_f64(value, "value")?,
        ))
    }
}

/// OHLC sample for bar and candlestick series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcItem {
    pub time: UserTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wick_color: Option<Color>,
}

impl OhlcItem {
    #[must_use]
    pub fn new(time: UserTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            color: None,
            border_color: None,
            wick_color: None,
        }
    }

    pub fn from_decimal(
        time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> ChartResult<Self> {
        Ok(Self::new(
            UserTime::Timestamp(time.timestamp()),
            decimal_to_f64(open, "open")?,
            decimal_to_f64(high, "high")?,
            decimal_to_f64(low, "low")?,
            decimal_to_f64(close, "close")?,
        ))
    }

    /// All values finite and low ≤ open, close ≤ high.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.low <= self.high
            && self.open >= self.low
            && self.open <= self.high
            && self.close >= self.low
            && self.close <= self.high
    }
}

/// One input datum: a typed payload, or a whitespace gap that occupies a
/// slot on the shared time scale without contributing a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesDataItem {
    Ohlc(OhlcItem),
    SingleValue(SingleValueItem),
    Whitespace { time: UserTime },
}

impl SeriesDataItem {
    #[must_use]
    pub fn time(&self) -> &UserTime {
        match self {
            Self::Ohlc(item) => &item.time,
            Self::SingleValue(item) => &item.time,
            Self::Whitespace { time } => time,
        }
    }

    pub(crate) fn time_mut(&mut self) -> &mut UserTime {
        match self {
            Self::Ohlc(item) => &mut item.time,
            Self::SingleValue(item) => &mut item.time,
            Self::Whitespace { time } => time,
        }
    }

    /// Whether the payload shape fits a series of the given kind.
    /// Whitespace fits every kind.
    #[must_use]
    pub fn matches(&self, kind: SeriesType) -> bool {
        match self {
            Self::Whitespace { .. } => true,
            Self::SingleValue(_) => kind.is_single_value(),
            Self::Ohlc(_) => !kind.is_single_value(),
        }
    }
}

fn decimal_to_f64(value: Decimal, field_name: &str) -> ChartResult<f64> {
    value.to_f64().ok_or_else(|| {
        ChartError::InvalidData(format!("{field_name} cannot be represented as f64"))
    })
}

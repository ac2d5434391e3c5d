use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};
use crate::time::{TimePoint, TimePointIndex, UserTime};

use super::items::{Color, SeriesDataItem};
use super::series::SeriesType;

/// OHLC quadruple with a uniform shape across all series kinds;
/// single-value series store the scalar in all four slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotValue([f64; 4]);

impl PlotValue {
    #[must_use]
    pub const fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self([open, high, low, close])
    }

    #[must_use]
    pub const fn from_scalar(value: f64) -> Self {
        Self([value; 4])
    }

    #[must_use]
    pub const fn open(self) -> f64 {
        self.0[0]
    }

    #[must_use]
    pub const fn high(self) -> f64 {
        self.0[1]
    }

    #[must_use]
    pub const fn low(self) -> f64 {
        self.0[2]
    }

    #[must_use]
    pub const fn close(self) -> f64 {
        self.0[3]
    }
}

/// Normalized per-series, per-time datum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotRow {
    pub index: TimePointIndex,
    pub time: TimePoint,
    pub value: PlotValue,
    pub original_time: UserTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wick_color: Option<Color>,
}

/// A slot on the shared time scale at which this series has no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhitespaceRow {
    pub index: TimePointIndex,
    pub time: TimePoint,
    pub original_time: UserTime,
}

/// A series' datum at one shared time point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SeriesRow {
    Data(PlotRow),
    Whitespace(WhitespaceRow),
}

impl SeriesRow {
    #[must_use]
    pub fn index(&self) -> TimePointIndex {
        match self {
            Self::Data(row) => row.index,
            Self::Whitespace(row) => row.index,
        }
    }

    #[must_use]
    pub fn time(&self) -> TimePoint {
        match self {
            Self::Data(row) => row.time,
            Self::Whitespace(row) => row.time,
        }
    }

    #[must_use]
    pub fn original_time(&self) -> &UserTime {
        match self {
            Self::Data(row) => &row.original_time,
            Self::Whitespace(row) => &row.original_time,
        }
    }

    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace(_))
    }

    #[must_use]
    pub fn as_data(&self) -> Option<&PlotRow> {
        match self {
            Self::Data(row) => Some(row),
            Self::Whitespace(_) => None,
        }
    }

    pub(crate) fn set_index(&mut self, index: TimePointIndex) {
        match self {
            Self::Data(row) => row.index = index,
            Self::Whitespace(row) => row.index = index,
        }
    }
}

/// Builds the row for a series of `kind` at `(time, index)`.
///
/// The whitespace guard runs first: a payload without open and value slots
/// yields a whitespace row no matter the kind. Which per-item colors
/// survive depends on the kind; area and baseline rows never carry one.
pub fn create_series_row(
    kind: SeriesType,
    time: TimePoint,
    index: TimePointIndex,
    item: &SeriesDataItem,
    original_time: UserTime,
) -> ChartResult<SeriesRow> {
    match item {
        SeriesDataItem::Whitespace { .. } => Ok(SeriesRow::Whitespace(WhitespaceRow {
            index,
            time,
            original_time,
        })),
        SeriesDataItem::SingleValue(single) => {
            let color = match kind {
                SeriesType::Line | SeriesType::Histogram => single.color.clone(),
                SeriesType::Area | SeriesType::Baseline => None,
                SeriesType::Bar | SeriesType::Candlestick => {
                    return Err(mismatch(kind, "single-value"));
                }
            };
            Ok(SeriesRow::Data(PlotRow {
                index,
                time,
                value: PlotValue::from_scalar(single.value),
                original_time,
                color,
                border_color: None,
                wick_color: None,
            }))
        }
        SeriesDataItem::Ohlc(ohlc) => {
            let (border_color, wick_color) = match kind {
                SeriesType::Bar => (None, None),
                SeriesType::Candlestick => (ohlc.border_color.clone(), ohlc.wick_color.clone()),
                _ => return Err(mismatch(kind, "OHLC")),
            };
            Ok(SeriesRow::Data(PlotRow {
                index,
                time,
                value: PlotValue::new(ohlc.open, ohlc.high, ohlc.low, ohlc.close),
                original_time,
                color: ohlc.color.clone(),
                border_color,
                wick_color,
            }))
        }
    }
}

fn mismatch(kind: SeriesType, payload: &str) -> ChartError {
    ChartError::InvalidData(format!("{payload} item on a {kind:?} series"))
}

#[cfg(test)]
mod tests {
    use super::{PlotValue, SeriesRow, create_series_row};
    use crate::data::items::{OhlcItem, SeriesDataItem, SingleValueItem};
    use crate::data::series::SeriesType;
    use crate::error::ChartError;
    use crate::time::{TimePoint, UserTime};

    fn at(timestamp: i64) -> TimePoint {
        TimePoint {
            timestamp,
            business_day: None,
        }
    }

    fn colored_value(value: f64) -> SeriesDataItem {
        SeriesDataItem::SingleValue(SingleValueItem {
            time: UserTime::Timestamp(0),
            value,
            color: Some("#26a69a".to_owned()),
        })
    }

    #[test]
    fn single_value_fills_all_four_slots() {
        let row = create_series_row(
            SeriesType::Line,
            at(0),
            3,
            &colored_value(10.5),
            UserTime::Timestamp(0),
        )
        .expect("line row");
        let data = row.as_data().expect("value-bearing");
        assert_eq!(data.value, PlotValue::from_scalar(10.5));
        assert_eq!(data.index, 3);
        assert_eq!(data.color.as_deref(), Some("#26a69a"));
    }

    #[test]
    fn area_and_baseline_drop_per_item_color() {
        for kind in [SeriesType::Area, SeriesType::Baseline] {
            let row = create_series_row(kind, at(0), 0, &colored_value(1.0), UserTime::Timestamp(0))
                .expect("row");
            assert!(row.as_data().expect("data").color.is_none());
        }
    }

    #[test]
    fn candlestick_keeps_all_colors_and_bar_keeps_body_color_only() {
        let item = SeriesDataItem::Ohlc(OhlcItem {
            time: UserTime::Timestamp(0),
            open: 10.0,
            high: 12.0,
            low: 9.0,
            close: 11.0,
            color: Some("#ef5350".to_owned()),
            border_color: Some("#b71c1c".to_owned()),
            wick_color: Some("#880e4f".to_owned()),
        });

        let candle = create_series_row(
            SeriesType::Candlestick,
            at(0),
            0,
            &item,
            UserTime::Timestamp(0),
        )
        .expect("candle");
        let candle = candle.as_data().expect("data");
        assert!(candle.border_color.is_some() && candle.wick_color.is_some());

        let bar = create_series_row(SeriesType::Bar, at(0), 0, &item, UserTime::Timestamp(0))
            .expect("bar");
        let bar = bar.as_data().expect("data");
        assert_eq!(bar.color.as_deref(), Some("#ef5350"));
        assert!(bar.border_color.is_none() && bar.wick_color.is_none());
    }

    #[test]
    fn whitespace_guard_bypasses_every_factory() {
        let item = SeriesDataItem::Whitespace {
            time: UserTime::Timestamp(0),
        };
        for kind in [
            SeriesType::Bar,
            SeriesType::Candlestick,
            SeriesType::Area,
            SeriesType::Baseline,
            SeriesType::Line,
            SeriesType::Histogram,
        ] {
            let row = create_series_row(kind, at(5), 2, &item, UserTime::Timestamp(5))
                .expect("whitespace row");
            assert!(matches!(row, SeriesRow::Whitespace(_)));
            assert_eq!(row.index(), 2);
        }
    }

    #[test]
    fn mismatched_payload_is_rejected() {
        let err = create_series_row(
            SeriesType::Candlestick,
            at(0),
            0,
            &colored_value(1.0),
            UserTime::Timestamp(0),
        )
        .expect_err("single value on candlestick");
        assert!(matches!(err, ChartError::InvalidData(_)));
    }
}

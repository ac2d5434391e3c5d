use thiserror::Error;

use crate::data::SeriesId;
use crate::time::UtcTimestamp;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("wrong time variant: expected {expected}")]
    WrongTimeType { expected: &'static str },

    #[error(
        "series data must be sorted strictly ascending by time: \
         item {index} has timestamp {timestamp} after {previous}"
    )]
    UnorderedInput {
        index: usize,
        timestamp: UtcTimestamp,
        previous: UtcTimestamp,
    },

    #[error("cannot update oldest data: last time={last}, new time={new}")]
    UpdateOutOfOrder { last: UtcTimestamp, new: UtcTimestamp },

    #[error("unknown series: {0:?}")]
    UnknownSeries(SeriesId),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("chart has been destroyed")]
    Destroyed,
}

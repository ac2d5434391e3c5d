mod data_layer;
mod items;
mod plot_row;
mod series;

pub use data_layer::{
    DataLayer, DataUpdateResponse, RowSnapshot, SeriesChanges, SeriesUpdateInfo,
    TimePointSnapshot, TimeScaleChanges,
};
pub use items::{Color, OhlcItem, SeriesDataItem, SingleValueItem};
pub use plot_row::{PlotRow, PlotValue, SeriesRow, WhitespaceRow, create_series_row};
pub use series::{Series, SeriesId, SeriesType};

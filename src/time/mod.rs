mod tick_weight;
mod time_point;

pub use tick_weight::{TickMarkWeight, fill_weights_from, weight_by_time};
pub use time_point::{
    BusinessDay, TimeConverter, TimePoint, TimePointIndex, TimeScalePoint, UserTime, UtcTimestamp,
    parse_date_string, string_to_business_day,
};

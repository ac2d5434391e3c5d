mod chart_model;
mod invalidate_mask;
mod pane;
mod price_scale;
mod scheduler;
mod time_scale;

pub use chart_model::ChartModel;
pub use invalidate_mask::{
    InvalidateMask, InvalidationLevel, PaneInvalidation, TimeScaleInvalidation,
};
pub use pane::{Pane, PriceScaleSide};
pub use price_scale::{
    AutoScaleInfo, AutoScaleMargins, PriceRange, PriceScale, PriceScaleMargins, PriceScaleOptions,
};
pub use scheduler::{PaintScheduler, PanePainter};
pub use time_scale::{LogicalRange, StrictRange, TimeScale, TimeScaleOptions};

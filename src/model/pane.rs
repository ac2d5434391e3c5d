use indexmap::IndexMap;

use crate::data::SeriesId;

use super::price_scale::{PriceScale, PriceScaleOptions};

/// Which of a pane's two price axes a series is priced against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceScaleSide {
    Left,
    Right,
}

/// One horizontal band of the chart: a left and a right price scale plus
/// the series assigned to each.
#[derive(Debug, Clone)]
pub struct Pane {
    left_price_scale: PriceScale,
    right_price_scale: PriceScale,
    series_sides: IndexMap<SeriesId, PriceScaleSide>,
}

impl Pane {
    #[must_use]
    pub fn new(left_options: PriceScaleOptions, right_options: PriceScaleOptions) -> Self {
        Self {
            left_price_scale: PriceScale::new("left", left_options),
            right_price_scale: PriceScale::new("right", right_options),
            series_sides: IndexMap::new(),
        }
    }

    pub fn assign_series(&mut self, series: SeriesId, side: PriceScaleSide) {
        self.series_sides.insert(series, side);
    }

    pub fn remove_series(&mut self, series: SeriesId) {
        self.series_sides.shift_remove(&series);
    }

    #[must_use]
    pub fn has_series(&self, series: SeriesId) -> bool {
        self.series_sides.contains_key(&series)
    }

    /// Series priced against the given side, in assignment order.
    #[must_use]
    pub fn series_on(&self, side: PriceScaleSide) -> Vec<SeriesId> {
        self.series_sides
            .iter()
            .filter(|(_, assigned)| **assigned == side)
            .map(|(series, _)| *series)
            .collect()
    }

    #[must_use]
    pub fn price_scale(&self, side: PriceScaleSide) -> &PriceScale {
        match side {
            PriceScaleSide::Left => &self.left_price_scale,
            PriceScaleSide::Right => &self.right_price_scale,
        }
    }

    pub fn price_scale_mut(&mut self, side: PriceScaleSide) -> &mut PriceScale {
        match side {
            PriceScaleSide::Left => &mut self.left_price_scale,
            PriceScaleSide::Right => &mut self.right_price_scale,
        }
    }

    pub fn set_height(&mut self, height: f64) {
        self.left_price_scale.set_height(height);
        self.right_price_scale.set_height(height);
    }
}

#[cfg(test)]
mod tests {
    use super::{Pane, PriceScaleSide};
    use crate::data::SeriesId;
    use crate::model::PriceScaleOptions;

    #[test]
    fn pane_tracks_series_per_side() {
        let mut pane = Pane::new(PriceScaleOptions::default(), PriceScaleOptions::default());
        pane.assign_series(SeriesId::new(1), PriceScaleSide::Right);
        pane.assign_series(SeriesId::new(2), PriceScaleSide::Left);
        pane.assign_series(SeriesId::new(3), PriceScaleSide::Right);

        assert_eq!(
            pane.series_on(PriceScaleSide::Right),
            vec![SeriesId::new(1), SeriesId::new(3)]
        );
        assert_eq!(pane.series_on(PriceScaleSide::Left), vec![SeriesId::new(2)]);

        pane.remove_series(SeriesId::new(1));
        assert!(!pane.has_series(SeriesId::new(1)));
        assert_eq!(pane.series_on(PriceScaleSide::Right), vec![SeriesId::new(3)]);
    }

    #[test]
    fn pane_creates_left_right_price_scales() {
        let pane = Pane::new(PriceScaleOptions::default(), PriceScaleOptions::default());
        assert_eq!(pane.price_scale(PriceScaleSide::Left).id(), "left");
        assert_eq!(pane.price_scale(PriceScaleSide::Right).id(), "right");
    }
}

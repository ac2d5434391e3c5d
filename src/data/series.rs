use serde::{Deserialize, Serialize};

/// Kind tag of a series; decides the row factory and the item shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesType {
    Bar,
    Candlestick,
    Area,
    Baseline,
    Line,
    Histogram,
}

impl SeriesType {
    /// Whether items of this kind carry a single scalar per bar.
    #[must_use]
    pub const fn is_single_value(self) -> bool {
        matches!(
            self,
            Self::Area | Self::Baseline | Self::Line | Self::Histogram
        )
    }
}

/// Identity key of a series inside the data layer.
///
/// Ids are handed out monotonically and never reused, so they stand in for
/// object identity as plain map keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SeriesId(u64);

impl SeriesId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque series handle passed to data-layer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Series {
    id: SeriesId,
    kind: SeriesType,
}

impl Series {
    #[must_use]
    pub const fn new(id: SeriesId, kind: SeriesType) -> Self {
        Self { id, kind }
    }

    #[must_use]
    pub const fn id(self) -> SeriesId {
        self.id
    }

    #[must_use]
    pub const fn kind(self) -> SeriesType {
        self.kind
    }
}

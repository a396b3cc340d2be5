pub mod pane;
pub mod price_range;
pub mod primitives;
pub mod series;
pub mod time;
pub mod time_scale;

pub use pane::{DEFAULT_MIN_PANE_HEIGHT, PaneEntry, PaneId, PaneLayout, PaneRegion};
pub use price_range::{
    AutoscaleInfo, AutoscaleInfoProvider, PriceRange, PriceRangeConfig, SeriesRangeSource,
    resolve_pane_price_range,
};
pub use series::{
    DataPoint, SeriesId, SeriesKind, SeriesOptions, SeriesOptionsUpdate, SeriesStore,
};
pub use time::TimePoint;
pub use time_scale::{
    LogicalRange, TimeScale, TimeScaleOptions, TimeScaleOptionsUpdate,
};

pub mod markers;

pub use markers::{
    MarkerPlacementConfig, MarkerPosition, MarkerShape, PlacedMarker, SeriesMarker,
    place_series_markers,
};

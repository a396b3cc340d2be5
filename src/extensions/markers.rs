use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::TimePoint;
use crate::core::pane::PaneRegion;
use crate::core::price_range::PriceRange;
use crate::core::series::SeriesStore;
use crate::core::time_scale::TimeScale;
use crate::error::{ChartError, ChartResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerPosition {
    AboveBar,
    BelowBar,
    InBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerShape {
    Circle,
    Square,
    ArrowUp,
    ArrowDown,
}

/// Caller-attached annotation anchored to a time value; the time is not
/// required to coincide with any data point of the host series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMarker {
    pub time: TimePoint,
    pub position: MarkerPosition,
    pub shape: MarkerShape,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerPlacementConfig {
    pub marker_size_px: f64,
    pub vertical_offset_px: f64,
}

impl Default for MarkerPlacementConfig {
    fn default() -> Self {
        Self {
            marker_size_px: 8.0,
            vertical_offset_px: 6.0,
        }
    }
}

impl MarkerPlacementConfig {
    fn validate(self) -> ChartResult<Self> {
        for (value, name) in [
            (self.marker_size_px, "marker_size_px"),
            (self.vertical_offset_px, "vertical_offset_px"),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ChartError::InvalidData(format!(
                    "marker config `{name}` must be finite and > 0"
                )));
            }
        }
        Ok(self)
    }
}

/// A marker resolved to chart coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedMarker {
    pub time: TimePoint,
    pub logical_index: f64,
    pub x: f64,
    pub y: f64,
    pub price: f64,
    pub position: MarkerPosition,
    pub shape: MarkerShape,
    pub color: String,
}

/// Resolves a host series' markers against the global time axis.
///
/// The X anchor comes from the whole chart's axis (fractional between
/// entries, extrapolated past the edges), so a marker placed in a gap of the
/// host series still lands where another series establishes the axis. The Y
/// anchor comes from the host series: the exact point at the marker time,
/// else the nearest at-or-before, else the nearest at-or-after; with an empty
/// host the pane's price-range midpoint is used. Output is ordered by X.
pub fn place_series_markers(
    markers: &[SeriesMarker],
    host: &SeriesStore,
    time_scale: &TimeScale,
    pane_range: PriceRange,
    pane_region: PaneRegion,
    config: MarkerPlacementConfig,
) -> ChartResult<Vec<PlacedMarker>> {
    let config = config.validate()?;
    if markers.is_empty() {
        return Ok(Vec::new());
    }

    let mut placed = Vec::with_capacity(markers.len());
    for marker in markers {
        let Some(logical_index) = time_scale.time_to_float_index(marker.time) else {
            // No global axis entries yet: nothing to anchor against.
            continue;
        };
        let x = time_scale.index_to_coordinate(logical_index);
        let price = resolve_marker_price(marker, host, pane_range);
        let base_y = price_to_pixel(price, pane_range, pane_region);
        let y = match marker.position {
            MarkerPosition::AboveBar => base_y - config.vertical_offset_px,
            MarkerPosition::BelowBar => base_y + config.vertical_offset_px,
            MarkerPosition::InBar => base_y,
        };
        placed.push(PlacedMarker {
            time: marker.time,
            logical_index,
            x,
            y,
            price,
            position: marker.position,
            shape: marker.shape,
            color: marker.color.clone(),
        });
    }

    placed.sort_by_key(|marker| OrderedFloat(marker.x));
    Ok(placed)
}

fn resolve_marker_price(
    marker: &SeriesMarker,
    host: &SeriesStore,
    pane_range: PriceRange,
) -> f64 {
    let anchor = host
        .point_at(marker.time)
        .or_else(|| host.nearest_at_or_before(marker.time))
        .or_else(|| host.nearest_at_or_after(marker.time));
    let Some(point) = anchor else {
        return pane_range.midpoint();
    };
    match marker.position {
        MarkerPosition::AboveBar => point.max_value(),
        MarkerPosition::BelowBar => point.min_value(),
        MarkerPosition::InBar => point.main_value(),
    }
}

fn price_to_pixel(price: f64, range: PriceRange, region: PaneRegion) -> f64 {
    let span = range.span();
    if span <= 0.0 {
        return region.top + region.height() * 0.5;
    }
    region.top + (range.max_value - price) / span * region.height()
}

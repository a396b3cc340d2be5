use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::core::TimePoint;
use crate::core::pane::{PaneEntry, PaneId, PaneLayout, PaneRegion};
use crate::core::price_range::{
    AutoscaleInfoProvider, PriceRange, PriceRangeConfig, SeriesRangeSource,
    resolve_pane_price_range,
};
use crate::core::series::{
    DataPoint, SeriesId, SeriesKind, SeriesOptions, SeriesOptionsUpdate, SeriesStore,
};
use crate::core::time_scale::{LogicalRange, TimeScale, TimeScaleOptions, TimeScaleOptionsUpdate};
use crate::error::{ChartError, ChartResult};
use crate::extensions::markers::{
    MarkerPlacementConfig, PlacedMarker, SeriesMarker, place_series_markers,
};

use super::invalidation::{InvalidateMask, InvalidationLevel, PaneInvalidation};

#[derive(Debug)]
struct SeriesSlot {
    store: SeriesStore,
    pane: PaneId,
    markers: Vec<SeriesMarker>,
    global_indices: Vec<usize>,
}

/// Explicitly constructed handle owning all state of one chart: the shared
/// time scale, the pane stack, every series store and its markers.
///
/// All mutation entry points are synchronous; internal state (axis union,
/// indices, layout, ranges) is consistent by the time they return, so callers
/// may read back immediately. Each mutation merges into a single pending
/// [`InvalidateMask`]; painting is the deferred second phase and is dropped
/// with the model if it never runs.
#[derive(Debug)]
pub struct ChartModel {
    width: f64,
    height: f64,
    time_scale: TimeScale,
    layout: PaneLayout,
    series: IndexMap<SeriesId, SeriesSlot>,
    next_series_id: u64,
    price_range_config: PriceRangeConfig,
    marker_config: MarkerPlacementConfig,
    axis_dirty: bool,
    pending_invalidation: Option<InvalidateMask>,
}

impl ChartModel {
    pub fn new(width: f64, height: f64) -> ChartResult<Self> {
        if !width.is_finite() || width <= 0.0 || !height.is_finite() || height <= 0.0 {
            return Err(ChartError::InvalidData(
                "chart size must be finite and > 0".to_owned(),
            ));
        }
        let mut time_scale = TimeScale::new(TimeScaleOptions::default())?;
        time_scale.set_width(width)?;
        Ok(Self {
            width,
            height,
            time_scale,
            layout: PaneLayout::new(height),
            series: IndexMap::new(),
            next_series_id: 0,
            price_range_config: PriceRangeConfig::default(),
            marker_config: MarkerPlacementConfig::default(),
            axis_dirty: false,
            pending_invalidation: Some(InvalidateMask::full()),
        })
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Live resize from the container-size provider.
    pub fn set_size(&mut self, width: f64, height: f64) -> ChartResult<()> {
        if !width.is_finite() || width <= 0.0 || !height.is_finite() || height <= 0.0 {
            return Err(ChartError::InvalidData(
                "chart size must be finite and > 0".to_owned(),
            ));
        }
        self.width = width;
        self.height = height;
        self.time_scale.set_width(width)?;
        self.layout.set_total_height(height);
        self.invalidate(InvalidateMask::full());
        Ok(())
    }

    // ---- series ---------------------------------------------------------

    /// Creates a series on the given pane, growing the pane stack on demand.
    pub fn add_series(
        &mut self,
        kind: SeriesKind,
        options: SeriesOptions,
        pane_index: usize,
    ) -> SeriesId {
        while self.layout.panes().len() <= pane_index {
            let _ = self.layout.add_pane(None);
        }
        // Stack growth is bounded by pane_index, so the lookup cannot miss.
        let pane = self
            .layout
            .pane_id_at(pane_index)
            .unwrap_or(PaneId::new(0));

        let series_id = SeriesId::new(self.next_series_id);
        self.next_series_id = self.next_series_id.saturating_add(1);
        self.series.insert(
            series_id,
            SeriesSlot {
                store: SeriesStore::new(kind, options),
                pane,
                markers: Vec::new(),
                global_indices: Vec::new(),
            },
        );
        self.layout.attach_series(pane, series_id);
        self.invalidate(InvalidateMask::full());
        series_id
    }

    /// Removes a series and its markers. Unknown ids are a silent no-op.
    pub fn remove_series(&mut self, series_id: SeriesId) -> bool {
        if self.series.shift_remove(&series_id).is_none() {
            trace!(series = series_id.raw(), "remove of unknown series ignored");
            return false;
        }
        self.layout.detach_series(series_id);
        self.axis_dirty = true;
        self.invalidate(InvalidateMask::full());
        true
    }

    /// Replaces a series' data wholesale.
    ///
    /// Ordering violations are rejected before mutation; the previously
    /// rendered data stays untouched. A removed series id is a silent no-op.
    pub fn set_series_data(
        &mut self,
        series_id: SeriesId,
        points: Vec<DataPoint>,
    ) -> ChartResult<()> {
        let Some(slot) = self.series.get_mut(&series_id) else {
            trace!(series = series_id.raw(), "set_data on unknown series ignored");
            return Ok(());
        };
        let count = points.len();
        slot.store.set_data(points)?;
        debug!(series = series_id.raw(), count, "series data replaced");

        let pane = slot.pane;
        self.axis_dirty = true;
        self.invalidate_pane_by_id(pane, InvalidationLevel::Full, true);
        Ok(())
    }

    /// Merges partial series options; the new defaults apply retroactively to
    /// points without explicit overrides at the next render.
    pub fn apply_series_options(&mut self, series_id: SeriesId, update: SeriesOptionsUpdate) -> bool {
        let Some(slot) = self.series.get_mut(&series_id) else {
            return false;
        };
        slot.store.apply_options(update);
        let pane = slot.pane;
        self.invalidate_pane_by_id(pane, InvalidationLevel::Light, false);
        true
    }

    pub fn set_autoscale_provider(
        &mut self,
        series_id: SeriesId,
        provider: Option<Box<dyn AutoscaleInfoProvider>>,
    ) -> bool {
        let Some(slot) = self.series.get_mut(&series_id) else {
            return false;
        };
        slot.store.set_autoscale_provider(provider);
        let pane = slot.pane;
        self.invalidate_pane_by_id(pane, InvalidationLevel::Light, true);
        true
    }

    #[must_use]
    pub fn series(&self, series_id: SeriesId) -> Option<&SeriesStore> {
        self.series.get(&series_id).map(|slot| &slot.store)
    }

    #[must_use]
    pub fn series_pane(&self, series_id: SeriesId) -> Option<PaneId> {
        self.series.get(&series_id).map(|slot| slot.pane)
    }

    // ---- markers --------------------------------------------------------

    /// Attaches an ordered marker list to a host series; their lifetime is
    /// bound to that series. Unknown ids are a silent no-op.
    pub fn set_markers(&mut self, series_id: SeriesId, markers: Vec<SeriesMarker>) -> bool {
        let Some(slot) = self.series.get_mut(&series_id) else {
            trace!(series = series_id.raw(), "markers for unknown series ignored");
            return false;
        };
        slot.markers = markers;
        let pane = slot.pane;
        self.invalidate_pane_by_id(pane, InvalidationLevel::Light, false);
        true
    }

    #[must_use]
    pub fn markers(&self, series_id: SeriesId) -> Option<&[SeriesMarker]> {
        self.series.get(&series_id).map(|slot| slot.markers.as_slice())
    }

    /// Resolves a host series' markers to chart coordinates against the
    /// global axis and the host pane's current price range.
    pub fn placed_markers(&mut self, series_id: SeriesId) -> ChartResult<Vec<PlacedMarker>> {
        self.ensure_axis();
        let Some(slot) = self.series.get(&series_id) else {
            return Ok(Vec::new());
        };
        let pane = slot.pane;
        let range = self.resolved_pane_price_range(pane);
        let Some(region) = self
            .layout
            .regions()
            .into_iter()
            .find(|region| region.pane_id == pane)
        else {
            return Ok(Vec::new());
        };
        // Re-borrow: resolving the range above needed the whole series table.
        let Some(slot) = self.series.get(&series_id) else {
            return Ok(Vec::new());
        };
        place_series_markers(
            &slot.markers,
            &slot.store,
            &self.time_scale,
            range,
            region,
            self.marker_config,
        )
    }

    // ---- time scale -----------------------------------------------------

    #[must_use]
    pub fn time_scale_options(&self) -> TimeScaleOptions {
        self.time_scale.options()
    }

    pub fn apply_time_scale_options(&mut self, update: TimeScaleOptionsUpdate) -> ChartResult<()> {
        self.ensure_axis();
        self.time_scale.apply_options(update)?;
        let mut mask = InvalidateMask::light();
        if let Some(spacing) = update.bar_spacing {
            mask.set_bar_spacing(spacing);
        }
        if let Some(offset) = update.right_offset {
            mask.set_right_offset(offset);
        }
        self.invalidate(mask);
        Ok(())
    }

    pub fn set_visible_logical_range(&mut self, range: LogicalRange) -> ChartResult<()> {
        self.ensure_axis();
        self.time_scale.set_visible_logical_range(range)?;
        let mut mask = InvalidateMask::light();
        mask.apply_range(range);
        self.invalidate(mask);
        Ok(())
    }

    pub fn fit_content(&mut self) -> ChartResult<()> {
        self.ensure_axis();
        self.time_scale.fit_content()?;
        let mut mask = InvalidateMask::light();
        mask.set_fit_content();
        self.invalidate(mask);
        Ok(())
    }

    pub fn zoom(&mut self, zoom_point: f64, scale: f64) -> ChartResult<()> {
        self.ensure_axis();
        self.time_scale.zoom(zoom_point, scale)?;
        self.invalidate(InvalidateMask::light());
        Ok(())
    }

    pub fn visible_logical_range(&mut self) -> LogicalRange {
        self.ensure_axis();
        self.time_scale.visible_logical_range()
    }

    /// Shared time axis, with the union rebuilt if any series changed.
    pub fn time_scale(&mut self) -> &TimeScale {
        self.ensure_axis();
        &self.time_scale
    }

    // ---- panes ----------------------------------------------------------

    #[must_use]
    pub fn panes(&self) -> &[PaneEntry] {
        self.layout.panes()
    }

    #[must_use]
    pub fn pane_regions(&self) -> Vec<PaneRegion> {
        self.layout.regions()
    }

    pub fn add_pane(&mut self, at_index: Option<usize>) -> PaneId {
        let pane_id = self.layout.add_pane(at_index);
        self.invalidate(InvalidateMask::full());
        pane_id
    }

    /// Removes a pane together with its series and markers. Unknown ids and
    /// the last remaining pane are silent no-ops.
    pub fn remove_pane(&mut self, pane_id: PaneId) -> bool {
        if !self.layout.contains(pane_id) {
            return false;
        }
        let orphaned: Vec<SeriesId> = self
            .series
            .iter()
            .filter(|(_, slot)| slot.pane == pane_id)
            .map(|(id, _)| *id)
            .collect();
        if !self.layout.remove_pane(pane_id) {
            return false;
        }
        for series_id in orphaned {
            self.series.shift_remove(&series_id);
            self.layout.detach_series(series_id);
        }
        self.axis_dirty = true;
        self.invalidate(InvalidateMask::full());
        true
    }

    /// Phase one of the layout commit: heights are consistent when this
    /// returns; the pending mask drives the paint phase later.
    pub fn set_pane_height(&mut self, pane_id: PaneId, pixels: f64) -> bool {
        if !self.layout.set_height(pane_id, pixels) {
            trace!(pane = pane_id.raw(), "set_height on unknown pane ignored");
            return false;
        }
        self.invalidate(InvalidateMask::full());
        true
    }

    pub fn set_pane_height_at(&mut self, pane_index: usize, pixels: f64) -> bool {
        match self.layout.pane_id_at(pane_index) {
            Some(pane_id) => self.set_pane_height(pane_id, pixels),
            None => false,
        }
    }

    // ---- price ranges ---------------------------------------------------

    /// Visible price range of a pane: union extrema of its series' visible
    /// points, with per-series provider overrides. `None` for unknown panes.
    pub fn pane_price_range(&mut self, pane_id: PaneId) -> Option<PriceRange> {
        if !self.layout.contains(pane_id) {
            return None;
        }
        self.ensure_axis();
        Some(self.resolved_pane_price_range(pane_id))
    }

    // ---- render scheduling ----------------------------------------------

    pub fn invalidate(&mut self, mask: InvalidateMask) {
        if let Some(pending) = &mut self.pending_invalidation {
            pending.merge(&mask);
        } else {
            self.pending_invalidation = Some(mask);
        }
    }

    #[must_use]
    pub fn pending_invalidation(&self) -> Option<&InvalidateMask> {
        self.pending_invalidation.as_ref()
    }

    /// Drains the coalesced render request at the next paint opportunity.
    pub fn take_pending_invalidation(&mut self) -> Option<InvalidateMask> {
        self.pending_invalidation.take()
    }

    // ---- internals ------------------------------------------------------

    fn invalidate_pane_by_id(&mut self, pane_id: PaneId, level: InvalidationLevel, auto_scale: bool) {
        let Some(pane_index) = self.layout.index_of(pane_id) else {
            return;
        };
        let mut mask = InvalidateMask::new(level);
        mask.invalidate_pane(pane_index, PaneInvalidation { level, auto_scale });
        self.invalidate(mask);
    }

    fn resolved_pane_price_range(&self, pane_id: PaneId) -> PriceRange {
        let visible = self.time_scale.visible_logical_range();
        let sources: Vec<SeriesRangeSource<'_>> = self
            .series
            .values()
            .filter(|slot| slot.pane == pane_id)
            .map(|slot| SeriesRangeSource {
                store: &slot.store,
                global_indices: &slot.global_indices,
            })
            .collect();
        resolve_pane_price_range(&sources, visible, &self.price_range_config)
    }

    /// Lazily rebuilds the global axis union and the per-series
    /// back-references after series mutations, never on every query.
    fn ensure_axis(&mut self) {
        if !self.axis_dirty {
            return;
        }
        self.axis_dirty = false;

        let mut union: Vec<TimePoint> = self
            .series
            .values()
            .flat_map(|slot| slot.store.times())
            .collect();
        union.sort_by_key(|point| point.epoch_seconds());
        union.dedup_by_key(|point| point.epoch_seconds());

        for slot in self.series.values_mut() {
            let mut indices = Vec::with_capacity(slot.store.points().len());
            let mut cursor = 0usize;
            for point in slot.store.points() {
                let target = point.time().epoch_seconds();
                while union[cursor].epoch_seconds() < target {
                    cursor += 1;
                }
                indices.push(cursor);
            }
            slot.global_indices = indices;
        }

        debug!(points = union.len(), "global time axis rebuilt");
        self.time_scale.set_points(union);
    }
}

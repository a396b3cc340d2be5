use serde::{Deserialize, Serialize};

use crate::core::TimePoint;
use crate::error::{ChartError, ChartResult};

/// Real-valued window on the logical index axis, `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

impl LogicalRange {
    pub fn new(from: f64, to: f64) -> ChartResult<Self> {
        if !from.is_finite() || !to.is_finite() || from > to {
            return Err(ChartError::InvalidData(
                "logical range bounds must be finite with from <= to".to_owned(),
            ));
        }
        Ok(Self { from, to })
    }

    #[must_use]
    pub fn span(self) -> f64 {
        self.to - self.from
    }

    #[must_use]
    pub fn contains(self, index: f64) -> bool {
        self.from <= index && index <= self.to
    }
}

/// Full time-scale configuration with defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeScaleOptions {
    pub bar_spacing: f64,
    pub min_bar_spacing: f64,
    pub max_bar_spacing: f64,
    pub right_offset: f64,
}

impl Default for TimeScaleOptions {
    fn default() -> Self {
        Self {
            bar_spacing: 6.0,
            min_bar_spacing: 0.5,
            max_bar_spacing: 50.0,
            right_offset: 0.0,
        }
    }
}

impl TimeScaleOptions {
    fn validate(self) -> ChartResult<Self> {
        if !self.min_bar_spacing.is_finite() || self.min_bar_spacing <= 0.0 {
            return Err(ChartError::InvalidData(
                "min bar spacing must be finite and > 0".to_owned(),
            ));
        }
        if !self.max_bar_spacing.is_finite() || self.max_bar_spacing < self.min_bar_spacing {
            return Err(ChartError::InvalidData(
                "max bar spacing must be finite and >= min bar spacing".to_owned(),
            ));
        }
        if !self.bar_spacing.is_finite() || self.bar_spacing <= 0.0 {
            return Err(ChartError::InvalidData(
                "bar spacing must be finite and > 0".to_owned(),
            ));
        }
        if !self.right_offset.is_finite() || self.right_offset < 0.0 {
            return Err(ChartError::InvalidData(
                "right offset must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }

    fn merged(self, update: TimeScaleOptionsUpdate) -> Self {
        Self {
            bar_spacing: update.bar_spacing.unwrap_or(self.bar_spacing),
            min_bar_spacing: update.min_bar_spacing.unwrap_or(self.min_bar_spacing),
            max_bar_spacing: update.max_bar_spacing.unwrap_or(self.max_bar_spacing),
            right_offset: update.right_offset.unwrap_or(self.right_offset),
        }
    }
}

/// Partial option bag: only fields present in the input are replaced.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeScaleOptionsUpdate {
    pub bar_spacing: Option<f64>,
    pub min_bar_spacing: Option<f64>,
    pub max_bar_spacing: Option<f64>,
    pub right_offset: Option<f64>,
}

/// Mapping between time values, logical indices and pixel x-coordinates.
///
/// The logical axis is the sorted, deduplicated union of every series' time
/// values; each entry occupies one integer index. The visible window is
/// tracked through `right_edge` (the logical index at the right border) plus
/// the current bar spacing, and is clamped to
/// `[first_index, last_index + right_offset]` on every read.
#[derive(Debug, Clone)]
pub struct TimeScale {
    options: TimeScaleOptions,
    width: f64,
    points: Vec<TimePoint>,
    bar_spacing: f64,
    right_edge: f64,
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::new(TimeScaleOptions::default()).unwrap_or(Self {
            options: TimeScaleOptions::default(),
            width: 0.0,
            points: Vec::new(),
            bar_spacing: TimeScaleOptions::default().bar_spacing,
            right_edge: 0.0,
        })
    }
}

impl TimeScale {
    pub fn new(options: TimeScaleOptions) -> ChartResult<Self> {
        let options = options.validate()?;
        Ok(Self {
            width: 0.0,
            points: Vec::new(),
            bar_spacing: options.bar_spacing,
            right_edge: options.right_offset,
            options,
        })
    }

    #[must_use]
    pub fn options(&self) -> TimeScaleOptions {
        self.options
    }

    /// Merges a partial option bag and re-establishes the spacing and window
    /// invariants. A requested spacing outside `[min, max]` is corrected
    /// silently, never rejected.
    pub fn apply_options(&mut self, update: TimeScaleOptionsUpdate) -> ChartResult<()> {
        self.options = self.options.merged(update).validate()?;
        if let Some(requested) = update.bar_spacing {
            if !requested.is_finite() || requested <= 0.0 {
                return Err(ChartError::InvalidData(
                    "bar spacing must be finite and > 0".to_owned(),
                ));
            }
            self.bar_spacing = requested;
        }
        if update.right_offset.is_some()
            && let Some(last) = self.last_index()
        {
            self.right_edge = last + self.options.right_offset;
        }
        self.correct_bar_spacing();
        self.correct_right_edge();
        Ok(())
    }

    pub fn set_width(&mut self, new_width: f64) -> ChartResult<()> {
        if !new_width.is_finite() || new_width <= 0.0 {
            return Err(ChartError::InvalidData(
                "time scale width must be finite and > 0".to_owned(),
            ));
        }
        self.width = new_width;
        self.correct_bar_spacing();
        self.correct_right_edge();
        Ok(())
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Replaces the global axis. Points must be sorted and unique; the caller
    /// (the chart model) builds the union across series.
    pub fn set_points(&mut self, points: Vec<TimePoint>) {
        self.points = points;
        if let Some(last) = self.last_index() {
            self.right_edge = last + self.options.right_offset;
        } else {
            self.right_edge = self.options.right_offset;
        }
        self.correct_bar_spacing();
        self.correct_right_edge();
    }

    #[must_use]
    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() || self.width <= 0.0
    }

    #[must_use]
    pub fn first_index(&self) -> Option<f64> {
        if self.points.is_empty() { None } else { Some(0.0) }
    }

    #[must_use]
    pub fn last_index(&self) -> Option<f64> {
        if self.points.is_empty() {
            None
        } else {
            Some(self.points.len() as f64 - 1.0)
        }
    }

    #[must_use]
    pub fn bar_spacing(&self) -> f64 {
        self.bar_spacing
    }

    /// Sets the visible window, clamped to `[first, last + right_offset]`.
    ///
    /// Bar spacing is derived from the clamped window and the pixel width,
    /// then re-clamped to the configured bounds; reading the range back
    /// afterwards returns the corrected values, not the requested ones.
    pub fn set_visible_logical_range(&mut self, range: LogicalRange) -> ChartResult<()> {
        if !range.from.is_finite() || !range.to.is_finite() {
            return Err(ChartError::InvalidData(
                "logical range bounds must be finite".to_owned(),
            ));
        }
        if self.is_empty() {
            return Ok(());
        }

        let max_right = self.max_right_edge();
        let from = range.from.clamp(0.0, max_right);
        let to = range.to.clamp(0.0, max_right);
        let span = to - from;
        if span > 0.0 {
            self.bar_spacing = self.width / span;
        } else {
            // Degenerate window (single-point axis or zero-span request):
            // fall back to the configured default instead of dividing by zero.
            self.bar_spacing = self.options.bar_spacing;
        }
        self.correct_bar_spacing();
        self.right_edge = to;
        self.correct_right_edge();
        Ok(())
    }

    /// Shows the whole axis plus the configured right offset.
    pub fn fit_content(&mut self) -> ChartResult<()> {
        let Some(last) = self.last_index() else {
            return Ok(());
        };
        self.set_visible_logical_range(LogicalRange {
            from: 0.0,
            to: last + self.options.right_offset,
        })
    }

    /// The window currently rendered, clamped on every read.
    #[must_use]
    pub fn visible_logical_range(&self) -> LogicalRange {
        let (from, to) = self.window();
        LogicalRange { from, to }
    }

    /// Converts a logical index to a pixel x-coordinate.
    ///
    /// An empty axis yields the identity transform.
    #[must_use]
    pub fn index_to_coordinate(&self, index: f64) -> f64 {
        if self.is_empty() {
            return index;
        }
        let (from, _) = self.window();
        (index - from) * self.bar_spacing
    }

    /// Inverse of [`Self::index_to_coordinate`] up to floating-point tolerance.
    #[must_use]
    pub fn coordinate_to_index(&self, x: f64) -> f64 {
        if self.is_empty() {
            return x;
        }
        let (from, _) = self.window();
        from + x / self.bar_spacing
    }

    /// Programmatic zoom around a pixel anchor; the spacing step follows the
    /// usual wheel gesture scaling and is clamped like every other path.
    pub fn zoom(&mut self, zoom_point: f64, scale: f64) -> ChartResult<()> {
        if !zoom_point.is_finite() || !scale.is_finite() {
            return Err(ChartError::InvalidData(
                "zoom point and scale must be finite".to_owned(),
            ));
        }
        if self.is_empty() || scale == 0.0 {
            return Ok(());
        }
        let anchor_px = zoom_point.clamp(0.0, self.width);
        let anchor_index = self.coordinate_to_index(anchor_px);
        self.bar_spacing += scale * (self.bar_spacing / 10.0);
        self.correct_bar_spacing();
        let drifted = self.coordinate_to_index(anchor_px);
        self.right_edge += anchor_index - drifted;
        self.correct_right_edge();
        Ok(())
    }

    /// Exact position of a time value on the global axis.
    #[must_use]
    pub fn index_of(&self, time: TimePoint) -> Option<usize> {
        self.points
            .binary_search_by_key(&time.epoch_seconds(), |point| point.epoch_seconds())
            .ok()
    }

    /// Fractional logical index of an arbitrary time value.
    ///
    /// Interpolates linearly between neighbouring axis entries; beyond either
    /// edge it extrapolates using the first (respectively last) entry
    /// interval. With a single-entry axis the index clamps to `0.0`. Returns
    /// `None` only when the axis has no entries at all.
    #[must_use]
    pub fn time_to_float_index(&self, time: TimePoint) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        if self.points.len() == 1 {
            return Some(0.0);
        }

        let target = time.epoch_seconds();
        let position = self
            .points
            .partition_point(|point| point.epoch_seconds() < target);

        let (left, right) = if position == 0 {
            (0usize, 1usize)
        } else if position == self.points.len() {
            (self.points.len() - 2, self.points.len() - 1)
        } else {
            if self.points[position].epoch_seconds() == target {
                return Some(position as f64);
            }
            (position - 1, position)
        };

        let left_seconds = self.points[left].epoch_seconds() as f64;
        let right_seconds = self.points[right].epoch_seconds() as f64;
        let interval = right_seconds - left_seconds;
        if interval <= 0.0 {
            return Some(left as f64);
        }
        Some(left as f64 + (target as f64 - left_seconds) / interval)
    }

    fn max_right_edge(&self) -> f64 {
        self.last_index().unwrap_or(0.0) + self.options.right_offset
    }

    fn window(&self) -> (f64, f64) {
        if self.is_empty() {
            return (0.0, 0.0);
        }
        let bars = self.width / self.bar_spacing;
        let to = self.right_edge.clamp(0.0, self.max_right_edge());
        let from = (to - bars).max(0.0);
        (from.min(to), to)
    }

    fn correct_bar_spacing(&mut self) {
        let clamped = self
            .bar_spacing
            .clamp(self.options.min_bar_spacing, self.options.max_bar_spacing);
        if clamped != self.bar_spacing {
            self.bar_spacing = clamped;
        }
    }

    fn correct_right_edge(&mut self) {
        let max_right = self.max_right_edge();
        if self.right_edge > max_right {
            self.right_edge = max_right;
        }
        if self.right_edge < 0.0 {
            self.right_edge = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LogicalRange, TimeScale, TimeScaleOptions, TimeScaleOptionsUpdate};
    use crate::core::TimePoint;

    fn axis(n: i64) -> Vec<TimePoint> {
        (0..n)
            .map(|i| TimePoint::UnixSeconds(1_546_300_800 + i * 86_400))
            .collect()
    }

    #[test]
    fn empty_axis_uses_identity_transforms() {
        let scale = TimeScale::default();
        assert_eq!(scale.index_to_coordinate(3.5), 3.5);
        assert_eq!(scale.coordinate_to_index(120.0), 120.0);
        let range = scale.visible_logical_range();
        assert_eq!((range.from, range.to), (0.0, 0.0));
    }

    #[test]
    fn coordinate_transforms_are_inverse() {
        let mut scale = TimeScale::new(TimeScaleOptions::default()).expect("options");
        scale.set_width(1000.0).expect("width");
        scale.set_points(axis(200));
        scale
            .set_visible_logical_range(LogicalRange {
                from: 50.0,
                to: 150.0,
            })
            .expect("range");

        let x = scale.index_to_coordinate(99.25);
        assert!((scale.coordinate_to_index(x) - 99.25).abs() <= 1e-9);
    }

    #[test]
    fn requested_spacing_below_minimum_reads_back_as_minimum() {
        let mut scale = TimeScale::new(TimeScaleOptions::default()).expect("options");
        scale.set_width(800.0).expect("width");
        scale.set_points(axis(100));
        scale
            .apply_options(TimeScaleOptionsUpdate {
                bar_spacing: Some(0.01),
                ..TimeScaleOptionsUpdate::default()
            })
            .expect("apply");
        assert_eq!(scale.bar_spacing(), scale.options().min_bar_spacing);
    }

    #[test]
    fn single_point_axis_falls_back_to_default_spacing() {
        let mut scale = TimeScale::new(TimeScaleOptions::default()).expect("options");
        scale.set_width(640.0).expect("width");
        scale.set_points(axis(1));
        scale.fit_content().expect("fit");
        assert_eq!(scale.bar_spacing(), TimeScaleOptions::default().bar_spacing);
    }

    #[test]
    fn float_index_interpolates_and_extrapolates() {
        let mut scale = TimeScale::new(TimeScaleOptions::default()).expect("options");
        scale.set_width(500.0).expect("width");
        scale.set_points(vec![
            TimePoint::UnixSeconds(100),
            TimePoint::UnixSeconds(200),
            TimePoint::UnixSeconds(400),
        ]);

        let mid = scale
            .time_to_float_index(TimePoint::UnixSeconds(300))
            .expect("mid");
        assert!((mid - 1.5).abs() <= 1e-9);

        let before = scale
            .time_to_float_index(TimePoint::UnixSeconds(0))
            .expect("before");
        assert!((before + 1.0).abs() <= 1e-9);

        let after = scale
            .time_to_float_index(TimePoint::UnixSeconds(500))
            .expect("after");
        assert!((after - 2.5).abs() <= 1e-9);
    }
}

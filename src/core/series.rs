use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::TimePoint;
use crate::core::price_range::AutoscaleInfoProvider;
use crate::core::primitives::{datetime_to_time_point, decimal_to_f64};
use crate::error::{ChartError, ChartResult};

/// Stable handle of a series within one chart model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesKind {
    Line,
    Area,
    Bar,
    Candlestick,
    Histogram,
}

/// One sample of a series.
///
/// The wire shape matches the external schemas: either
/// `{time, open, high, low, close, color?}` or `{time, value, color?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataPoint {
    Ohlc {
        time: TimePoint,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    Value {
        time: TimePoint,
        value: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
}

impl DataPoint {
    pub fn single(time: impl Into<TimePoint>, value: f64) -> ChartResult<Self> {
        if !value.is_finite() {
            return Err(ChartError::InvalidData(
                "point value must be finite".to_owned(),
            ));
        }
        Ok(Self::Value {
            time: time.into(),
            value,
            color: None,
        })
    }

    /// Builds a validated OHLC point.
    ///
    /// Invariants:
    /// - all values are finite
    /// - `low <= high`
    /// - `open` and `close` are within `[low, high]`
    pub fn ohlc(
        time: impl Into<TimePoint>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> ChartResult<Self> {
        if !open.is_finite() || !high.is_finite() || !low.is_finite() || !close.is_finite() {
            return Err(ChartError::InvalidData(
                "ohlc values must be finite".to_owned(),
            ));
        }
        if low > high {
            return Err(ChartError::InvalidData(
                "ohlc low must be <= high".to_owned(),
            ));
        }
        if open < low || open > high || close < low || close > high {
            return Err(ChartError::InvalidData(
                "ohlc open/close must be within low/high range".to_owned(),
            ));
        }
        Ok(Self::Ohlc {
            time: time.into(),
            open,
            high,
            low,
            close,
            color: None,
        })
    }

    /// Converts strongly-typed temporal/decimal input into a validated sample.
    pub fn single_from_decimal(time: DateTime<Utc>, price: Decimal) -> ChartResult<Self> {
        Self::single(datetime_to_time_point(time), decimal_to_f64(price, "price")?)
    }

    #[must_use]
    pub fn with_color(mut self, new_color: impl Into<String>) -> Self {
        match &mut self {
            Self::Ohlc { color, .. } | Self::Value { color, .. } => *color = Some(new_color.into()),
        }
        self
    }

    #[must_use]
    pub fn time(&self) -> TimePoint {
        match self {
            Self::Ohlc { time, .. } | Self::Value { time, .. } => *time,
        }
    }

    #[must_use]
    pub fn color(&self) -> Option<&str> {
        match self {
            Self::Ohlc { color, .. } | Self::Value { color, .. } => color.as_deref(),
        }
    }

    /// Main value: `close` for OHLC points, the value otherwise.
    #[must_use]
    pub fn main_value(&self) -> f64 {
        match self {
            Self::Ohlc { close, .. } => *close,
            Self::Value { value, .. } => *value,
        }
    }

    #[must_use]
    pub fn min_value(&self) -> f64 {
        match self {
            Self::Ohlc { low, .. } => *low,
            Self::Value { value, .. } => *value,
        }
    }

    #[must_use]
    pub fn max_value(&self) -> f64 {
        match self {
            Self::Ohlc { high, .. } => *high,
            Self::Value { value, .. } => *value,
        }
    }

    fn validate(&self) -> ChartResult<()> {
        match *self {
            Self::Ohlc {
                open,
                high,
                low,
                close,
                ..
            } => {
                Self::ohlc(self.time(), open, high, low, close)?;
            }
            Self::Value { value, .. } => {
                Self::single(self.time(), value)?;
            }
        }
        Ok(())
    }
}

/// Series-level style defaults, resolved against per-point overrides at
/// render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesOptions {
    pub color: String,
    pub line_width: f64,
    pub price_line_visible: bool,
    pub last_value_visible: bool,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            color: "#2962ff".to_owned(),
            line_width: 1.0,
            price_line_visible: true,
            last_value_visible: true,
        }
    }
}

/// Partial option bag: only fields present in the input are replaced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeriesOptionsUpdate {
    pub color: Option<String>,
    pub line_width: Option<f64>,
    pub price_line_visible: Option<bool>,
    pub last_value_visible: Option<bool>,
}

/// Ordered per-series storage with binary-search lookup and render-time
/// style resolution.
pub struct SeriesStore {
    kind: SeriesKind,
    options: SeriesOptions,
    points: Vec<DataPoint>,
    autoscale_provider: Option<Box<dyn AutoscaleInfoProvider>>,
}

impl fmt::Debug for SeriesStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesStore")
            .field("kind", &self.kind)
            .field("options", &self.options)
            .field("points", &self.points.len())
            .field("autoscale_provider", &self.autoscale_provider.is_some())
            .finish()
    }
}

impl SeriesStore {
    #[must_use]
    pub fn new(kind: SeriesKind, options: SeriesOptions) -> Self {
        Self {
            kind,
            options,
            points: Vec::new(),
            autoscale_provider: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    #[must_use]
    pub fn options(&self) -> &SeriesOptions {
        &self.options
    }

    pub fn apply_options(&mut self, update: SeriesOptionsUpdate) {
        if let Some(color) = update.color {
            self.options.color = color;
        }
        if let Some(line_width) = update.line_width {
            self.options.line_width = line_width;
        }
        if let Some(visible) = update.price_line_visible {
            self.options.price_line_visible = visible;
        }
        if let Some(visible) = update.last_value_visible {
            self.options.last_value_visible = visible;
        }
    }

    pub fn set_autoscale_provider(&mut self, provider: Option<Box<dyn AutoscaleInfoProvider>>) {
        self.autoscale_provider = provider;
    }

    #[must_use]
    pub fn autoscale_provider(&self) -> Option<&dyn AutoscaleInfoProvider> {
        self.autoscale_provider.as_deref()
    }

    /// Replaces the whole point sequence.
    ///
    /// Times must be strictly ascending and unique; a violation is rejected
    /// before any mutation, leaving the prior data untouched.
    pub fn set_data(&mut self, points: Vec<DataPoint>) -> ChartResult<()> {
        for point in &points {
            point.validate()?;
        }
        for pair in points.windows(2) {
            if pair[1].time() <= pair[0].time() {
                return Err(ChartError::InvalidData(
                    "series times must be strictly ascending and unique".to_owned(),
                ));
            }
        }
        self.points = points;
        Ok(())
    }

    #[must_use]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn times(&self) -> impl Iterator<Item = TimePoint> + '_ {
        self.points.iter().map(DataPoint::time)
    }

    /// Exact lookup, O(log n).
    #[must_use]
    pub fn point_at(&self, time: TimePoint) -> Option<&DataPoint> {
        self.points
            .binary_search_by_key(&time.epoch_seconds(), |point| {
                point.time().epoch_seconds()
            })
            .ok()
            .map(|index| &self.points[index])
    }

    #[must_use]
    pub fn nearest_at_or_before(&self, time: TimePoint) -> Option<&DataPoint> {
        let upper = self
            .points
            .partition_point(|point| point.time().epoch_seconds() <= time.epoch_seconds());
        self.points[..upper].last()
    }

    #[must_use]
    pub fn nearest_at_or_after(&self, time: TimePoint) -> Option<&DataPoint> {
        let lower = self
            .points
            .partition_point(|point| point.time().epoch_seconds() < time.epoch_seconds());
        self.points.get(lower)
    }

    /// Render-time style resolution: a point without an explicit color takes
    /// the series default, so later default changes affect it retroactively.
    #[must_use]
    pub fn resolved_color<'a>(&'a self, point: &'a DataPoint) -> &'a str {
        point.color().unwrap_or(&self.options.color)
    }
}

#[cfg(test)]
mod tests {
    use super::{DataPoint, SeriesKind, SeriesOptions, SeriesStore};
    use crate::core::TimePoint;

    fn store_with(points: Vec<DataPoint>) -> SeriesStore {
        let mut store = SeriesStore::new(SeriesKind::Line, SeriesOptions::default());
        store.set_data(points).expect("valid data");
        store
    }

    #[test]
    fn lookup_hits_exact_and_nearest_points() {
        let store = store_with(vec![
            DataPoint::single(10_i64, 1.0).expect("p0"),
            DataPoint::single(20_i64, 2.0).expect("p1"),
            DataPoint::single(40_i64, 3.0).expect("p2"),
        ]);

        assert!(store.point_at(TimePoint::UnixSeconds(20)).is_some());
        assert!(store.point_at(TimePoint::UnixSeconds(30)).is_none());

        let before = store
            .nearest_at_or_before(TimePoint::UnixSeconds(30))
            .expect("before");
        assert_eq!(before.time(), TimePoint::UnixSeconds(20));

        let after = store
            .nearest_at_or_after(TimePoint::UnixSeconds(30))
            .expect("after");
        assert_eq!(after.time(), TimePoint::UnixSeconds(40));

        assert!(store.nearest_at_or_before(TimePoint::UnixSeconds(5)).is_none());
        assert!(store.nearest_at_or_after(TimePoint::UnixSeconds(50)).is_none());
    }

    #[test]
    fn rejects_ohlc_outside_low_high_bounds() {
        assert!(DataPoint::ohlc(0_i64, 5.0, 4.0, 1.0, 2.0).is_err());
        assert!(DataPoint::ohlc(0_i64, 2.0, 4.0, 5.0, 3.0).is_err());
    }

    #[test]
    fn data_point_schemas_round_trip_through_json() {
        let ohlc: DataPoint =
            serde_json::from_str(r#"{"time":1556877600,"open":1.0,"high":2.0,"low":0.5,"close":1.5}"#)
                .expect("ohlc");
        assert_eq!(ohlc.max_value(), 2.0);

        let value: DataPoint =
            serde_json::from_str(r#"{"time":"2019-05-22","value":35,"color":"red"}"#)
                .expect("value");
        assert_eq!(value.color(), Some("red"));
        assert_eq!(
            value.time(),
            TimePoint::business_day(2019, 5, 22).expect("day")
        );
    }
}

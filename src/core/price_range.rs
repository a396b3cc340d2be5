use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::series::SeriesStore;
use crate::core::time_scale::LogicalRange;
use crate::error::{ChartError, ChartResult};

/// Visible value range of a pane, `min_value <= max_value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min_value: f64,
    pub max_value: f64,
}

impl PriceRange {
    pub fn new(min_value: f64, max_value: f64) -> ChartResult<Self> {
        if !min_value.is_finite() || !max_value.is_finite() || min_value > max_value {
            return Err(ChartError::InvalidData(
                "price range must be finite with min <= max".to_owned(),
            ));
        }
        Ok(Self {
            min_value,
            max_value,
        })
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min_value: self.min_value.min(other.min_value),
            max_value: self.max_value.max(other.max_value),
        }
    }

    #[must_use]
    pub fn midpoint(self) -> f64 {
        (self.min_value + self.max_value) * 0.5
    }

    #[must_use]
    pub fn span(self) -> f64 {
        self.max_value - self.min_value
    }
}

/// Payload returned by an autoscale capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoscaleInfo {
    pub price_range: PriceRange,
}

/// Narrow, synchronous capability letting a series replace its computed
/// visible extrema wholesale. Invoked per resolver pass, never stored beyond
/// the call that needed it.
pub trait AutoscaleInfoProvider {
    fn autoscale_info(&self) -> ChartResult<AutoscaleInfo>;
}

impl<F> AutoscaleInfoProvider for F
where
    F: Fn() -> ChartResult<AutoscaleInfo>,
{
    fn autoscale_info(&self) -> ChartResult<AutoscaleInfo> {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRangeConfig {
    /// Range reported for a pane with zero visible points in all its series.
    pub empty_pane_range: PriceRange,
}

impl Default for PriceRangeConfig {
    fn default() -> Self {
        Self {
            empty_pane_range: PriceRange {
                min_value: 0.0,
                max_value: 100.0,
            },
        }
    }
}

/// One series' input to the pane resolver: its store plus the global logical
/// index of each of its points, maintained by the chart model alongside the
/// axis union.
pub struct SeriesRangeSource<'a> {
    pub store: &'a SeriesStore,
    pub global_indices: &'a [usize],
}

/// Computes a pane's visible price range.
///
/// Each series contributes either its provider's range (which replaces the
/// computed extrema entirely) or the extrema of its points inside `visible`.
/// A provider that fails or returns a malformed range degrades to the
/// computed path with a warning; it never aborts the pass.
pub fn resolve_pane_price_range(
    sources: &[SeriesRangeSource<'_>],
    visible: LogicalRange,
    config: &PriceRangeConfig,
) -> PriceRange {
    let mut resolved: Option<PriceRange> = None;

    for source in sources {
        let contribution = match source.store.autoscale_provider() {
            Some(provider) => match provider.autoscale_info() {
                Ok(info) if is_well_formed(info.price_range) => Some(info.price_range),
                Ok(info) => {
                    warn!(
                        min = info.price_range.min_value,
                        max = info.price_range.max_value,
                        "autoscale provider returned a malformed range; using computed extrema"
                    );
                    visible_extrema(source, visible)
                }
                Err(error) => {
                    warn!(%error, "autoscale provider failed; using computed extrema");
                    visible_extrema(source, visible)
                }
            },
            None => visible_extrema(source, visible),
        };

        if let Some(range) = contribution {
            resolved = Some(match resolved {
                Some(current) => current.union(range),
                None => range,
            });
        }
    }

    resolved.unwrap_or(config.empty_pane_range)
}

fn is_well_formed(range: PriceRange) -> bool {
    range.min_value.is_finite()
        && range.max_value.is_finite()
        && range.min_value <= range.max_value
}

fn visible_extrema(source: &SeriesRangeSource<'_>, visible: LogicalRange) -> Option<PriceRange> {
    let first = visible.from.floor();
    let last = visible.to.ceil();

    let mut extrema: Option<PriceRange> = None;
    for (point, global_index) in source.store.points().iter().zip(source.global_indices) {
        let index = *global_index as f64;
        if index < first || index > last {
            continue;
        }
        let point_range = PriceRange {
            min_value: point.min_value(),
            max_value: point.max_value(),
        };
        extrema = Some(match extrema {
            Some(current) => current.union(point_range),
            None => point_range,
        });
    }
    extrema
}

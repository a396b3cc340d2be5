use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::series::SeriesId;

pub const DEFAULT_MIN_PANE_HEIGHT: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaneId(u32);

impl PaneId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct PaneEntry {
    id: PaneId,
    height: f64,
    series: SmallVec<[SeriesId; 4]>,
}

impl PaneEntry {
    #[must_use]
    pub fn id(&self) -> PaneId {
        self.id
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn series(&self) -> &[SeriesId] {
        &self.series
    }
}

/// Drawing region assigned to a pane, in chart pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneRegion {
    pub pane_id: PaneId,
    pub top: f64,
    pub bottom: f64,
}

impl PaneRegion {
    #[must_use]
    pub fn height(self) -> f64 {
        (self.bottom - self.top).max(0.0)
    }
}

/// Vertical stack of panes sharing the chart height.
///
/// After every mutation `sum(pane.height) == total_height` holds, with the
/// floating-point remainder absorbed by a peer pane in the same call; there
/// is no deferred convergence.
#[derive(Debug, Clone)]
pub struct PaneLayout {
    panes: Vec<PaneEntry>,
    total_height: f64,
    min_pane_height: f64,
    next_id: u32,
}

impl PaneLayout {
    #[must_use]
    pub fn new(total_height: f64) -> Self {
        let total_height = if total_height.is_finite() {
            total_height.max(0.0)
        } else {
            0.0
        };
        Self {
            panes: vec![PaneEntry {
                id: PaneId::new(0),
                height: total_height,
                series: SmallVec::new(),
            }],
            total_height,
            min_pane_height: DEFAULT_MIN_PANE_HEIGHT,
            next_id: 1,
        }
    }

    #[must_use]
    pub fn with_min_pane_height(mut self, min_pane_height: f64) -> Self {
        if min_pane_height.is_finite() && min_pane_height >= 0.0 {
            self.min_pane_height = min_pane_height;
        }
        self
    }

    #[must_use]
    pub fn panes(&self) -> &[PaneEntry] {
        &self.panes
    }

    #[must_use]
    pub fn total_height(&self) -> f64 {
        self.total_height
    }

    #[must_use]
    pub fn contains(&self, pane_id: PaneId) -> bool {
        self.index_of(pane_id).is_some()
    }

    #[must_use]
    pub fn index_of(&self, pane_id: PaneId) -> Option<usize> {
        self.panes.iter().position(|pane| pane.id == pane_id)
    }

    #[must_use]
    pub fn pane_id_at(&self, index: usize) -> Option<PaneId> {
        self.panes.get(index).map(|pane| pane.id)
    }

    /// Inserts an empty pane at the given stack position (append by default)
    /// and gives it an equal share of the height, shrinking the others
    /// proportionally.
    pub fn add_pane(&mut self, at_index: Option<usize>) -> PaneId {
        let pane_id = PaneId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let count = self.panes.len() as f64;
        let share = self.total_height / (count + 1.0);
        if self.total_height > 0.0 {
            let keep = (self.total_height - share) / self.total_height;
            for pane in &mut self.panes {
                pane.height *= keep;
            }
        }

        let index = at_index.unwrap_or(self.panes.len()).min(self.panes.len());
        self.panes.insert(
            index,
            PaneEntry {
                id: pane_id,
                height: share,
                series: SmallVec::new(),
            },
        );
        self.absorb_remainder(index);
        pane_id
    }

    /// Removes a pane, returning its height to the remaining panes
    /// proportionally. Removing an unknown pane or the last remaining pane
    /// is a no-op.
    pub fn remove_pane(&mut self, pane_id: PaneId) -> bool {
        if self.panes.len() <= 1 {
            return false;
        }
        let Some(index) = self.index_of(pane_id) else {
            return false;
        };
        let removed = self.panes.remove(index);

        let remaining: f64 = self.panes.iter().map(|pane| pane.height).sum();
        if remaining > 0.0 {
            let grow = (remaining + removed.height) / remaining;
            for pane in &mut self.panes {
                pane.height *= grow;
            }
        } else if !self.panes.is_empty() {
            let equal = self.total_height / self.panes.len() as f64;
            for pane in &mut self.panes {
                pane.height = equal;
            }
        }
        self.absorb_remainder(0);
        true
    }

    /// Sets a pane's height, clamped so neither the pane itself nor the
    /// aggregate of its peers can fall below the configured minimum; the
    /// remaining height is redistributed proportionally to the peers' prior
    /// share. Returns `false` for an unknown pane.
    pub fn set_height(&mut self, pane_id: PaneId, pixels: f64) -> bool {
        let Some(index) = self.index_of(pane_id) else {
            return false;
        };
        if !pixels.is_finite() {
            return false;
        }
        if self.panes.len() == 1 {
            self.panes[0].height = self.total_height;
            return true;
        }

        let peers_min = self.min_pane_height * (self.panes.len() - 1) as f64;
        let upper = (self.total_height - peers_min).max(self.min_pane_height);
        let target = pixels.clamp(self.min_pane_height.min(upper), upper);

        let prior_peer_sum = self.total_height - self.panes[index].height;
        let remaining = self.total_height - target;
        self.panes[index].height = target;

        if prior_peer_sum > 0.0 {
            let factor = remaining / prior_peer_sum;
            for (i, pane) in self.panes.iter_mut().enumerate() {
                if i != index {
                    pane.height *= factor;
                }
            }
        } else {
            let equal = remaining / (self.panes.len() - 1) as f64;
            for (i, pane) in self.panes.iter_mut().enumerate() {
                if i != index {
                    pane.height = equal.max(0.0);
                }
            }
        }
        self.absorb_remainder(index);
        true
    }

    /// Resizes the whole stack, rescaling every pane proportionally.
    pub fn set_total_height(&mut self, pixels: f64) {
        let pixels = if pixels.is_finite() {
            pixels.max(0.0)
        } else {
            return;
        };
        let old_total = self.total_height;
        self.total_height = pixels;

        if old_total > 0.0 {
            let factor = pixels / old_total;
            for pane in &mut self.panes {
                pane.height *= factor;
            }
        } else {
            let equal = pixels / self.panes.len() as f64;
            for pane in &mut self.panes {
                pane.height = equal;
            }
        }
        self.absorb_remainder(0);
    }

    pub fn attach_series(&mut self, pane_id: PaneId, series_id: SeriesId) -> bool {
        let Some(index) = self.index_of(pane_id) else {
            return false;
        };
        if !self.panes[index].series.contains(&series_id) {
            self.panes[index].series.push(series_id);
        }
        true
    }

    pub fn detach_series(&mut self, series_id: SeriesId) -> bool {
        for pane in &mut self.panes {
            if let Some(position) = pane.series.iter().position(|id| *id == series_id) {
                pane.series.remove(position);
                return true;
            }
        }
        false
    }

    /// Pixel regions of the stack, top to bottom; the last region ends
    /// exactly at `total_height`.
    #[must_use]
    pub fn regions(&self) -> Vec<PaneRegion> {
        let mut regions = Vec::with_capacity(self.panes.len());
        let mut cursor = 0.0;
        let last_index = self.panes.len().saturating_sub(1);
        for (index, pane) in self.panes.iter().enumerate() {
            let bottom = if index == last_index {
                self.total_height
            } else {
                (cursor + pane.height).min(self.total_height)
            };
            regions.push(PaneRegion {
                pane_id: pane.id,
                top: cursor,
                bottom,
            });
            cursor = bottom;
        }
        regions
    }

    #[must_use]
    pub fn height_sum(&self) -> f64 {
        self.panes.iter().map(|pane| pane.height).sum()
    }

    // Assigns the floating-point remainder to a peer of `protected` so the
    // height sum matches the total exactly within this call.
    fn absorb_remainder(&mut self, protected: usize) {
        if self.panes.len() == 1 {
            self.panes[0].height = self.total_height;
            return;
        }
        let absorber = if protected == self.panes.len() - 1 {
            protected - 1
        } else {
            self.panes.len() - 1
        };
        for _ in 0..2 {
            let sum = self.height_sum();
            let diff = self.total_height - sum;
            if diff == 0.0 {
                break;
            }
            self.panes[absorber].height = (self.panes[absorber].height + diff).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PaneLayout;

    #[test]
    fn new_layout_assigns_full_height_to_single_pane() {
        let layout = PaneLayout::new(600.0);
        assert_eq!(layout.panes().len(), 1);
        assert_eq!(layout.panes()[0].height(), 600.0);
        assert_eq!(layout.height_sum(), 600.0);
    }

    #[test]
    fn add_and_remove_preserve_exact_height_sum() {
        let mut layout = PaneLayout::new(600.0);
        let second = layout.add_pane(None);
        let _third = layout.add_pane(Some(1));
        assert_eq!(layout.panes().len(), 3);
        assert_eq!(layout.height_sum(), 600.0);

        assert!(layout.remove_pane(second));
        assert_eq!(layout.panes().len(), 2);
        assert_eq!(layout.height_sum(), 600.0);
        assert!(!layout.remove_pane(second));
    }

    #[test]
    fn set_height_clamps_to_minimum_for_peers() {
        let mut layout = PaneLayout::new(300.0).with_min_pane_height(30.0);
        let second = layout.add_pane(None);
        let third = layout.add_pane(None);

        assert!(layout.set_height(second, 1000.0));
        assert_eq!(layout.height_sum(), 300.0);

        let heights: Vec<f64> = layout.panes().iter().map(|pane| pane.height()).collect();
        let second_index = layout.index_of(second).expect("second index");
        assert!((heights[second_index] - 240.0).abs() <= 1e-9);
        assert!(heights.iter().all(|height| *height >= 0.0));
        assert!(layout.contains(third));
    }

    #[test]
    fn regions_tile_the_full_chart_height() {
        let mut layout = PaneLayout::new(450.0);
        let _ = layout.add_pane(None);
        let regions = layout.regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].top, 0.0);
        assert_eq!(regions[1].bottom, 450.0);
        assert!((regions[0].height() + regions[1].height() - 450.0).abs() <= 1e-9);
    }
}

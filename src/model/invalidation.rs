use std::collections::BTreeMap;

use crate::core::time_scale::LogicalRange;

/// How much of a pane (or the chart) the next paint must redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum InvalidationLevel {
    #[default]
    None = 0,
    Cursor = 1,
    Light = 2,
    Full = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaneInvalidation {
    pub level: InvalidationLevel,
    pub auto_scale: bool,
}

/// Time-scale state change recorded for the paint phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeScaleInvalidation {
    FitContent,
    ApplyRange(LogicalRange),
    ApplyBarSpacing(f64),
    ApplyRightOffset(f64),
    Reset,
}

/// Coalesced render request.
///
/// Every mutation inside one scheduling turn merges into the model's single
/// pending mask; the host drains it at the next paint opportunity, observing
/// the second phase of the layout/paint commit.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidateMask {
    invalidated_panes: BTreeMap<usize, PaneInvalidation>,
    global_level: InvalidationLevel,
    time_scale_invalidations: Vec<TimeScaleInvalidation>,
}

impl InvalidateMask {
    #[must_use]
    pub fn new(global_level: InvalidationLevel) -> Self {
        Self {
            invalidated_panes: BTreeMap::new(),
            global_level,
            time_scale_invalidations: Vec::new(),
        }
    }

    #[must_use]
    pub fn full() -> Self {
        Self::new(InvalidationLevel::Full)
    }

    #[must_use]
    pub fn light() -> Self {
        Self::new(InvalidationLevel::Light)
    }

    #[must_use]
    pub fn full_invalidation(&self) -> InvalidationLevel {
        self.global_level
    }

    pub fn invalidate_pane(&mut self, pane_index: usize, invalidation: PaneInvalidation) {
        let merged = if let Some(previous) = self.invalidated_panes.get(&pane_index) {
            PaneInvalidation {
                level: previous.level.max(invalidation.level),
                auto_scale: previous.auto_scale || invalidation.auto_scale,
            }
        } else {
            invalidation
        };
        self.invalidated_panes.insert(pane_index, merged);
    }

    #[must_use]
    pub fn invalidation_for_pane(&self, pane_index: usize) -> PaneInvalidation {
        if let Some(pane) = self.invalidated_panes.get(&pane_index) {
            PaneInvalidation {
                level: self.global_level.max(pane.level),
                auto_scale: pane.auto_scale,
            }
        } else {
            PaneInvalidation {
                level: self.global_level,
                auto_scale: false,
            }
        }
    }

    #[must_use]
    pub fn time_scale_invalidations(&self) -> &[TimeScaleInvalidation] {
        &self.time_scale_invalidations
    }

    pub fn set_fit_content(&mut self) {
        self.time_scale_invalidations = vec![TimeScaleInvalidation::FitContent];
    }

    pub fn apply_range(&mut self, range: LogicalRange) {
        self.time_scale_invalidations = vec![TimeScaleInvalidation::ApplyRange(range)];
    }

    pub fn set_bar_spacing(&mut self, spacing: f64) {
        self.time_scale_invalidations
            .push(TimeScaleInvalidation::ApplyBarSpacing(spacing));
    }

    pub fn set_right_offset(&mut self, offset: f64) {
        self.time_scale_invalidations
            .push(TimeScaleInvalidation::ApplyRightOffset(offset));
    }

    pub fn reset_time_scale(&mut self) {
        self.time_scale_invalidations = vec![TimeScaleInvalidation::Reset];
    }

    pub fn merge(&mut self, other: &InvalidateMask) {
        for invalidation in &other.time_scale_invalidations {
            match *invalidation {
                TimeScaleInvalidation::FitContent => self.set_fit_content(),
                TimeScaleInvalidation::ApplyRange(range) => self.apply_range(range),
                TimeScaleInvalidation::ApplyBarSpacing(spacing) => self.set_bar_spacing(spacing),
                TimeScaleInvalidation::ApplyRightOffset(offset) => self.set_right_offset(offset),
                TimeScaleInvalidation::Reset => self.reset_time_scale(),
            }
        }
        self.global_level = self.global_level.max(other.global_level);
        for (pane_index, pane) in &other.invalidated_panes {
            self.invalidate_pane(*pane_index, *pane);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InvalidateMask, InvalidationLevel, PaneInvalidation, TimeScaleInvalidation};
    use crate::core::time_scale::LogicalRange;

    #[test]
    fn pane_invalidation_merges_level_and_autoscale() {
        let mut mask = InvalidateMask::new(InvalidationLevel::None);
        mask.invalidate_pane(
            1,
            PaneInvalidation {
                level: InvalidationLevel::Cursor,
                auto_scale: false,
            },
        );
        mask.invalidate_pane(
            1,
            PaneInvalidation {
                level: InvalidationLevel::Light,
                auto_scale: true,
            },
        );
        let result = mask.invalidation_for_pane(1);
        assert_eq!(result.level, InvalidationLevel::Light);
        assert!(result.auto_scale);
    }

    #[test]
    fn fit_content_replaces_previous_time_scale_invalidations() {
        let mut mask = InvalidateMask::light();
        mask.set_bar_spacing(8.0);
        mask.apply_range(LogicalRange {
            from: 10.0,
            to: 20.0,
        });
        mask.set_fit_content();
        assert_eq!(
            mask.time_scale_invalidations(),
            &[TimeScaleInvalidation::FitContent]
        );
    }

    #[test]
    fn merge_keeps_stronger_global_level_and_combines_panes() {
        let mut first = InvalidateMask::new(InvalidationLevel::Cursor);
        let mut second = InvalidateMask::new(InvalidationLevel::Light);
        second.invalidate_pane(
            0,
            PaneInvalidation {
                level: InvalidationLevel::Light,
                auto_scale: true,
            },
        );
        first.merge(&second);
        assert_eq!(first.full_invalidation(), InvalidationLevel::Light);
        assert!(first.invalidation_for_pane(0).auto_scale);
    }
}

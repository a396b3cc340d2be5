pub mod chart_model;
pub mod invalidation;

pub use chart_model::ChartModel;
pub use invalidation::{
    InvalidateMask, InvalidationLevel, PaneInvalidation, TimeScaleInvalidation,
};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::core::TimePoint;
use crate::error::{ChartError, ChartResult};

pub fn datetime_to_time_point(time: DateTime<Utc>) -> TimePoint {
    TimePoint::UnixSeconds(time.timestamp())
}

pub fn decimal_to_f64(value: Decimal, field: &str) -> ChartResult<f64> {
    value
        .to_f64()
        .filter(|converted| converted.is_finite())
        .ok_or_else(|| ChartError::InvalidData(format!("{field} is not representable as f64")))
}

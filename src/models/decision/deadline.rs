use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Allowed review/revision windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum DurationDays {
    Days7,
    #[default]
    Days14,
    Days21,
    Days30,
    Days45,
    Days60,
}

impl DurationDays {
    pub const ALL: [DurationDays; 6] = [
        DurationDays::Days7,
        DurationDays::Days14,
        DurationDays::Days21,
        DurationDays::Days30,
        DurationDays::Days45,
        DurationDays::Days60,
    ];

    pub fn days(&self) -> u32 {
        match self {
            DurationDays::Days7 => 7,
            DurationDays::Days14 => 14,
            DurationDays::Days21 => 21,
            DurationDays::Days30 => 30,
            DurationDays::Days45 => 45,
            DurationDays::Days60 => 60,
        }
    }
}

impl TryFrom<u32> for DurationDays {
    type Error = AppError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        DurationDays::ALL
            .into_iter()
            .find(|d| d.days() == days)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "durationDays must be one of 7, 14, 21, 30, 45, 60 (got {days})"
                ))
            })
    }
}

impl From<DurationDays> for u32 {
    fn from(d: DurationDays) -> Self {
        d.days()
    }
}

/// Absolute deadline `decision_time + days * 86400s`.
pub fn compute_deadline(decision_time: DateTime<Utc>, duration: DurationDays) -> DateTime<Utc> {
    decision_time + Duration::seconds(i64::from(duration.days()) * SECONDS_PER_DAY)
}

use std::{fmt, str::FromStr};

use chrono::{DateTime, TimeDelta, Utc};

use crate::errors::ModelError;

/// A month is always 30 days; calendar months are not modelled.
pub const DAYS_PER_MONTH: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Day,
    Month,
}

impl DurationUnit {
    fn suffix(self) -> &'static str {
        match self {
            DurationUnit::Day => "day",
            DurationUnit::Month => "mon",
        }
    }
}

/// Subscription length as written by callers: `7day`, `2mon`, `1MON`.
///
/// The amount is a positive integer; zero and negative amounts are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PremiumDuration {
    pub amount: u32,
    pub unit: DurationUnit,
}

impl PremiumDuration {
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let invalid = || ModelError::InvalidDuration(input.to_string());
        let lowered = input.trim().to_ascii_lowercase();

        let (digits, unit) = if let Some(d) = lowered.strip_suffix("day") {
            (d, DurationUnit::Day)
        } else if let Some(d) = lowered.strip_suffix("mon") {
            (d, DurationUnit::Month)
        } else {
            return Err(invalid());
        };

        let amount = digits.trim().parse::<u32>().map_err(|_| invalid())?;
        if amount == 0 {
            return Err(invalid());
        }
        Ok(Self { amount, unit })
    }

    pub fn days(&self) -> i64 {
        match self.unit {
            DurationUnit::Day => i64::from(self.amount),
            DurationUnit::Month => i64::from(self.amount) * DAYS_PER_MONTH,
        }
    }

    /// Length as a [`TimeDelta`]; `None` when it exceeds chrono's range.
    pub fn as_time_delta(&self) -> Option<TimeDelta> {
        TimeDelta::try_days(self.days())
    }

    /// Expiry instant for a subscription starting at `start`.
    pub fn expiry_from(&self, start: DateTime<Utc>) -> Result<DateTime<Utc>, ModelError> {
        self.as_time_delta()
            .and_then(|delta| start.checked_add_signed(delta))
            .ok_or_else(|| ModelError::InvalidDuration(self.to_string()))
    }
}

impl FromStr for PremiumDuration {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PremiumDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::CareError;
use crate::models::{CaregiverProfile, CredentialCategory};

/// Hours per day assumed when a request does not say
pub const DEFAULT_HOURS_PER_DAY: i64 = 4;

/// Flat fallback rate used when committing a booking for a caregiver with
/// no rate of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatDefaultRate(pub i64);

impl Default for FlatDefaultRate {
    fn default() -> Self {
        Self(4500)
    }
}

/// Per-credential fallback rates used when displaying ranked caregivers
///
/// Not reconciled with [`FlatDefaultRate`]: a caregiver without a rate can
/// be displayed at one price and booked at another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryDefaultRate {
    pub rn: i64,
    pub lpn: i64,
    pub cna: i64,
    pub hha: i64,
}

impl Default for CategoryDefaultRate {
    fn default() -> Self {
        Self {
            rn: 11000,
            lpn: 9000,
            cna: 7000,
            hha: 6000,
        }
    }
}

impl CategoryDefaultRate {
    pub fn for_category(&self, category: CredentialCategory) -> i64 {
        match category {
            CredentialCategory::Rn => self.rn,
            CredentialCategory::Lpn => self.lpn,
            CredentialCategory::Cna => self.cna,
            CredentialCategory::Hha => self.hha,
        }
    }

    /// Rate shown for a caregiver: their own, else the category default
    pub fn display_rate(&self, caregiver: &CaregiverProfile) -> i64 {
        caregiver
            .hourly_rate_cents
            .unwrap_or_else(|| self.for_category(caregiver.category))
    }

    /// True when any category default differs from the flat booking default
    pub fn diverges_from(&self, flat: FlatDefaultRate) -> bool {
        [self.rn, self.lpn, self.cna, self.hha]
            .iter()
            .any(|rate| *rate != flat.0)
    }
}

/// Committed terms for a proposed engagement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementTerms {
    pub hourly_rate_cents: i64,
    pub total_hours: Decimal,
    pub total_price_cents: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Compute rate, duration and price for `hours` at `hourly_rate_cents`
///
/// The price is `hours * rate`, kept exact in decimal and rounded half away
/// from zero to a whole cent. The session ends
/// `hours * 60` minutes after `start_time`.
pub fn price_engagement(
    hours: Decimal,
    hourly_rate_cents: i64,
    start_time: DateTime<Utc>,
) -> Result<EngagementTerms, CareError> {
    if hours <= Decimal::ZERO {
        return Err(CareError::Validation(format!("hours must be positive, got {hours}")));
    }
    if hours > Decimal::from(24) {
        return Err(CareError::Validation(format!(
            "hours per day cannot exceed 24, got {hours}"
        )));
    }
    if hourly_rate_cents < 0 {
        return Err(CareError::Validation(format!(
            "hourly rate cannot be negative, got {hourly_rate_cents}"
        )));
    }

    let total_price_cents = hours
        .checked_mul(Decimal::from(hourly_rate_cents))
        .map(|total| total.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|total| total.to_i64())
        .ok_or_else(|| CareError::Validation("total price out of range".to_string()))?;

    let seconds = (hours * Decimal::from(3600))
        .round()
        .to_i64()
        .ok_or_else(|| CareError::Validation("duration out of range".to_string()))?;

    Ok(EngagementTerms {
        hourly_rate_cents,
        total_hours: hours.normalize(),
        total_price_cents,
        start_time,
        end_time: start_time + Duration::seconds(seconds),
    })
}

/// Applies the booking-time defaults before pricing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingCalculator {
    flat_default: FlatDefaultRate,
    default_hours: Decimal,
}

impl PricingCalculator {
    pub fn new(flat_default: FlatDefaultRate, default_hours: Decimal) -> Self {
        Self {
            flat_default,
            default_hours,
        }
    }

    pub fn flat_default(&self) -> FlatDefaultRate {
        self.flat_default
    }

    /// Price an engagement, filling absent hours and rate from the defaults
    pub fn price(
        &self,
        hours_per_day: Option<Decimal>,
        hourly_rate_cents: Option<i64>,
        start_time: DateTime<Utc>,
    ) -> Result<EngagementTerms, CareError> {
        price_engagement(
            hours_per_day.unwrap_or(self.default_hours),
            hourly_rate_cents.unwrap_or(self.flat_default.0),
            start_time,
        )
    }
}

impl Default for PricingCalculator {
    fn default() -> Self {
        Self::new(FlatDefaultRate::default(), Decimal::from(DEFAULT_HOURS_PER_DAY))
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CareError;

/// Index 0 of the 0-6 day-of-week convention. Every slot, formatter and
/// query in the crate counts days from Sunday.
pub const WEEK_START: Weekday = Weekday::Sunday;

/// Minutes in a day; slot bounds live in `0..=MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Coarse severity tag derived from mobility and task signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AcuityTag {
    High,
    Medium,
    Low,
}

impl AcuityTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcuityTag::High => "HIGH",
            AcuityTag::Medium => "MEDIUM",
            AcuityTag::Low => "LOW",
        }
    }
}

impl FromStr for AcuityTag {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Ok(AcuityTag::High),
            "MEDIUM" => Ok(AcuityTag::Medium),
            "LOW" => Ok(AcuityTag::Low),
            other => Err(CareError::Validation(format!("unknown acuity tag: {other}"))),
        }
    }
}

/// Whether a care request still accepts implicit merges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CareRequestStatus {
    Open,
    Closed,
}

impl CareRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CareRequestStatus::Open => "open",
            CareRequestStatus::Closed => "closed",
        }
    }
}

impl FromStr for CareRequestStatus {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(CareRequestStatus::Open),
            "closed" => Ok(CareRequestStatus::Closed),
            other => Err(CareError::Validation(format!("unknown request status: {other}"))),
        }
    }
}

/// A household's submitted care needs (the intake)
///
/// `acuity` is private so it can only change through [`CareRequest::refresh_acuity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub who_needs_care: String,
    pub age: Option<u16>,
    pub mobility: Option<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
    pub hours_per_day: Option<Decimal>,
    pub postal_code: Option<String>,
    pub time_window: Option<String>,
    pub(crate) acuity: Option<AcuityTag>,
    pub status: CareRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CareRequest {
    /// Start an empty open request for `requester_id`
    pub fn new(requester_id: Uuid, who_needs_care: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester_id,
            who_needs_care: who_needs_care.into(),
            age: None,
            mobility: None,
            tasks: Vec::new(),
            hours_per_day: None,
            postal_code: None,
            time_window: None,
            acuity: None,
            status: CareRequestStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn acuity(&self) -> Option<AcuityTag> {
        self.acuity
    }

    /// Recompute the acuity tag from the current mobility and task fields
    pub fn refresh_acuity(&mut self) {
        self.acuity = crate::core::acuity::classify_acuity(self.mobility.as_deref(), &self.tasks);
    }

    pub fn is_open(&self) -> bool {
        self.status == CareRequestStatus::Open
    }
}

/// Caregiver credential category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CredentialCategory {
    Rn,
    Lpn,
    Cna,
    Hha,
}

impl CredentialCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialCategory::Rn => "RN",
            CredentialCategory::Lpn => "LPN",
            CredentialCategory::Cna => "CNA",
            CredentialCategory::Hha => "HHA",
        }
    }
}

impl FromStr for CredentialCategory {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RN" => Ok(CredentialCategory::Rn),
            "LPN" => Ok(CredentialCategory::Lpn),
            "CNA" => Ok(CredentialCategory::Cna),
            "HHA" => Ok(CredentialCategory::Hha),
            other => Err(CareError::Validation(format!(
                "unknown credential category: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(VerificationStatus::Pending),
            "approved" => Ok(VerificationStatus::Approved),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(CareError::Validation(format!(
                "unknown verification status: {other}"
            ))),
        }
    }
}

/// Day of week, numbered from [`WEEK_START`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn index(self) -> u8 {
        (self as u8 + 7 - WEEK_START as u8) % 7
    }

    pub fn from_index(index: u8) -> Result<Self, CareError> {
        if index > 6 {
            return Err(CareError::Validation(format!(
                "day of week must be 0-6, got {index}"
            )));
        }
        Ok(Self::ALL[((index + WEEK_START as u8) % 7) as usize])
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sun",
            Weekday::Monday => "Mon",
            Weekday::Tuesday => "Tue",
            Weekday::Wednesday => "Wed",
            Weekday::Thursday => "Thu",
            Weekday::Friday => "Fri",
            Weekday::Saturday => "Sat",
        }
    }
}

impl TryFrom<u8> for Weekday {
    type Error = CareError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Weekday::from_index(value)
    }
}

impl From<Weekday> for u8 {
    fn from(day: Weekday) -> Self {
        day.index()
    }
}

/// A weekly availability window. Overlapping slots are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub day_of_week: Weekday,
    pub start_minute: u16,
    pub end_minute: u16,
}

impl AvailabilitySlot {
    pub fn new(day_index: u8, start_minute: u16, end_minute: u16) -> Result<Self, CareError> {
        let day_of_week = Weekday::from_index(day_index)?;
        if end_minute > MINUTES_PER_DAY {
            return Err(CareError::Validation(format!(
                "slot end {end_minute} is past the end of the day"
            )));
        }
        if start_minute >= end_minute {
            return Err(CareError::Validation(format!(
                "slot start {start_minute} must precede end {end_minute}"
            )));
        }
        Ok(Self {
            day_of_week,
            start_minute,
            end_minute,
        })
    }
}

impl fmt::Display for AvailabilitySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}-{:02}:{:02}",
            self.day_of_week.short_name(),
            self.start_minute / 60,
            self.start_minute % 60,
            self.end_minute / 60,
            self.end_minute % 60
        )
    }
}

/// Caregiver profile with credentials, skills and weekly availability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaregiverProfile {
    pub id: Uuid,
    /// Owning caregiver account; bookings require one
    pub account_id: Option<Uuid>,
    pub display_name: Option<String>,
    pub category: CredentialCategory,
    pub years_experience: Option<u16>,
    /// Hourly rate in cents; `None` means a default policy applies
    pub hourly_rate_cents: Option<i64>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub verification: VerificationStatus,
    pub postal_code: Option<String>,
    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
}

impl CaregiverProfile {
    pub fn is_approved(&self) -> bool {
        self.verification == VerificationStatus::Approved
    }
}

/// Booking status domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Declined,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Accepted => "ACCEPTED",
            BookingStatus::Declined => "DECLINED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Declined | BookingStatus::Completed | BookingStatus::Cancelled
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(BookingStatus::Pending),
            "ACCEPTED" => Ok(BookingStatus::Accepted),
            "DECLINED" => Ok(BookingStatus::Declined),
            "COMPLETED" => Ok(BookingStatus::Completed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            _ => Err(CareError::Validation(format!("unknown booking status: {s}"))),
        }
    }
}

/// A committed engagement between a requester and a caregiver
///
/// Rate and price are frozen at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub care_request_id: Uuid,
    pub requester_id: Uuid,
    pub caregiver_profile_id: Uuid,
    pub caregiver_account_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_hours: Decimal,
    pub hourly_rate_cents: i64,
    pub total_price_cents: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role supplied by the session layer alongside the actor id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Requester,
    Caregiver,
    System,
}

/// Authenticated actor identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn requester(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Requester,
        }
    }

    pub fn caregiver(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Caregiver,
        }
    }

    pub fn system() -> Self {
        Self {
            id: Uuid::nil(),
            role: Role::System,
        }
    }
}

/// Which slice of bookings a caregiver wants to see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingScope {
    Pending,
    #[default]
    Upcoming,
}

impl FromStr for BookingScope {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingScope::Pending),
            "upcoming" => Ok(BookingScope::Upcoming),
            other => Err(CareError::Validation(format!("unknown booking scope: {other}"))),
        }
    }
}

/// Display label for a fitness score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchLabel {
    High,
    Medium,
    Low,
}

/// Ranked caregiver entry returned to requesters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCaregiver {
    pub caregiver_profile_id: Uuid,
    pub account_id: Option<Uuid>,
    pub display_name: Option<String>,
    pub category: CredentialCategory,
    pub years_experience: Option<u16>,
    /// Profile rate, or the category default when the profile has none
    pub hourly_rate_cents: i64,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub match_score: u8,
    pub match_label: MatchLabel,
    /// Ordinal nearness used for tie-breaking; not a distance in any unit
    #[serde(skip_serializing, default)]
    pub proximity: u32,
}

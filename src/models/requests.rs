use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Partial intake submission; absent fields keep their stored values
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IntakeSubmission {
    #[validate(length(min = 1, max = 200))]
    pub who_needs_care: Option<String>,
    #[validate(range(max = 130))]
    pub age: Option<u16>,
    #[validate(length(max = 500))]
    pub mobility: Option<String>,
    pub tasks: Option<Vec<String>>,
    pub hours_per_day: Option<Decimal>,
    #[validate(length(min = 1, max = 10))]
    #[serde(alias = "zip")]
    pub postal_code: Option<String>,
    #[validate(length(max = 100))]
    #[serde(alias = "timeSlot")]
    pub time_window: Option<String>,
}

/// Request to commit to a caregiver for an open care request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(alias = "intakeId")]
    pub care_request_id: Uuid,
    pub caregiver_profile_id: Uuid,
}

/// Request to change a booking's status
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransitionBookingRequest {
    #[validate(length(min = 1))]
    pub status: String,
}

/// Query for the caller's booking list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBookingsQuery {
    pub scope: Option<String>,
}

/// Query for ranked caregivers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchesQuery {
    #[serde(alias = "intakeId")]
    pub care_request_id: Option<Uuid>,
}

/// Caregiver sign-up details relevant to matching
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCaregiverRequest {
    #[validate(length(min = 1, max = 200))]
    pub display_name: Option<String>,
    #[validate(length(min = 2, max = 3))]
    #[serde(alias = "licenseType")]
    pub category: String,
    #[validate(range(min = 1))]
    pub hourly_rate_cents: Option<i64>,
}

/// One availability window as submitted by a caregiver
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlotInput {
    #[validate(range(max = 6))]
    pub day_of_week: u8,
    #[validate(range(max = 1440))]
    #[serde(alias = "startMinutes")]
    pub start_minute: u16,
    #[validate(range(max = 1440))]
    #[serde(alias = "endMinutes")]
    pub end_minute: u16,
}

/// Caregiver profile submission
///
/// `availability`, when present, replaces every stored slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CaregiverProfileUpdate {
    #[validate(range(max = 70))]
    pub years_experience: Option<u16>,
    /// New rate for future bookings; existing bookings keep theirs
    #[validate(range(min = 1))]
    pub hourly_rate_cents: Option<i64>,
    pub skills: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    #[validate(length(min = 1, max = 10))]
    #[serde(alias = "zip")]
    pub postal_code: Option<String>,
    #[validate(nested)]
    #[serde(alias = "availabilitySlots")]
    pub availability: Option<Vec<AvailabilitySlotInput>>,
}

/// Full replacement of a caregiver's weekly availability
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ReplaceAvailabilityRequest {
    #[validate(nested)]
    pub slots: Vec<AvailabilitySlotInput>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intake_accepts_legacy_field_names() {
        let json = r#"{"whoNeedsCare":"Dad","zip":"10001","timeSlot":"mornings","hoursPerDay":6}"#;
        let submission: IntakeSubmission = serde_json::from_str(json).unwrap();

        assert_eq!(submission.postal_code.as_deref(), Some("10001"));
        assert_eq!(submission.time_window.as_deref(), Some("mornings"));
        assert_eq!(submission.hours_per_day, Some(Decimal::from(6)));
        assert!(submission.validate().is_ok());
    }

    #[test]
    fn test_intake_rejects_implausible_age() {
        let submission = IntakeSubmission {
            age: Some(200),
            ..Default::default()
        };
        assert!(submission.validate().is_err());
    }

    #[test]
    fn test_profile_update_rejects_non_positive_rate() {
        let update: CaregiverProfileUpdate =
            serde_json::from_str(r#"{"hourlyRateCents":0}"#).unwrap();
        assert!(update.validate().is_err());

        let update: CaregiverProfileUpdate =
            serde_json::from_str(r#"{"hourlyRateCents":5200}"#).unwrap();
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_slot_input_validation() {
        let slot = AvailabilitySlotInput {
            day_of_week: 7,
            start_minute: 0,
            end_minute: 60,
        };
        assert!(slot.validate().is_err());
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{Booking, CareRequest, CaregiverProfile, RankedCaregiver};

/// Response for the matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchesResponse {
    pub caregivers: Vec<RankedCaregiver>,
    pub care_request_id: Option<Uuid>,
    pub total_candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeResponse {
    pub intake: Option<CareRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub booking: Booking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingsResponse {
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaregiverProfileResponse {
    pub profile: CaregiverProfile,
    /// Slots rendered as e.g. "Mon 09:00-17:00"
    pub availability: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepriceResponse {
    pub updated: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

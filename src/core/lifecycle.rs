use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::pricing::EngagementTerms;
use crate::error::CareError;
use crate::models::{Actor, Booking, BookingStatus, CareRequest, CaregiverProfile, Role};

/// An authorized status change, checked against the state the caller saw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub booking_id: Uuid,
    pub from: BookingStatus,
    pub to: BookingStatus,
}

/// Build a new PENDING booking with the given committed terms
///
/// Fails with `NotFound` when the caregiver profile has no owning account.
pub fn open_booking(
    request: &CareRequest,
    caregiver: &CaregiverProfile,
    terms: EngagementTerms,
    now: DateTime<Utc>,
) -> Result<Booking, CareError> {
    let caregiver_account_id = caregiver
        .account_id
        .ok_or_else(|| CareError::NotFound("caregiver".to_string()))?;

    Ok(Booking {
        id: Uuid::new_v4(),
        care_request_id: request.id,
        requester_id: request.requester_id,
        caregiver_profile_id: caregiver.id,
        caregiver_account_id,
        start_time: terms.start_time,
        end_time: terms.end_time,
        total_hours: terms.total_hours,
        hourly_rate_cents: terms.hourly_rate_cents,
        total_price_cents: terms.total_price_cents,
        status: BookingStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

/// Whether the status graph has an edge from `from` to `to`
///
/// PENDING -> ACCEPTED | DECLINED | CANCELLED
/// ACCEPTED -> COMPLETED | CANCELLED
pub fn is_valid_edge(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;

    matches!(
        (from, to),
        (Pending, Accepted)
            | (Pending, Declined)
            | (Pending, Cancelled)
            | (Accepted, Completed)
            | (Accepted, Cancelled)
    )
}

/// Roles permitted to drive a booking into `to`
fn may_drive(role: Role, to: BookingStatus) -> bool {
    match to {
        BookingStatus::Accepted | BookingStatus::Declined | BookingStatus::Completed => {
            role == Role::Caregiver
        }
        BookingStatus::Cancelled => matches!(role, Role::Requester | Role::System),
        BookingStatus::Pending => false,
    }
}

/// Check that `actor` may move `booking` to `to`
///
/// Ownership and role are checked before the status graph, so a caller
/// outside the booking always gets `Authorization` whatever the current state.
pub fn authorize_transition(
    booking: &Booking,
    actor: &Actor,
    to: BookingStatus,
) -> Result<Transition, CareError> {
    let owns = match actor.role {
        Role::Caregiver => booking.caregiver_account_id == actor.id,
        Role::Requester => booking.requester_id == actor.id,
        Role::System => true,
    };

    if !owns {
        return Err(CareError::Authorization(
            "only the booking's own participants may change its status".to_string(),
        ));
    }

    if !may_drive(actor.role, to) {
        return Err(CareError::Authorization(format!(
            "a {:?} cannot move a booking to {}",
            actor.role, to
        )));
    }

    if !is_valid_edge(booking.status, to) {
        return Err(CareError::Validation(format!(
            "cannot move a booking from {} to {}",
            booking.status, to
        )));
    }

    Ok(Transition {
        booking_id: booking.id,
        from: booking.status,
        to,
    })
}

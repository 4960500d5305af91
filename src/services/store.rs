use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{AvailabilitySlot, Booking, BookingStatus, CareRequest, CaregiverProfile};

/// Whose bookings to list, and in which order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingFilter {
    /// All of a requester's bookings, newest start time first
    Requester(Uuid),
    /// A caregiver account's bookings in one status, oldest start time first
    Caregiver { account_id: Uuid, status: BookingStatus },
}

/// Persistence collaborator for the care engine
///
/// Implementations must give read-your-write consistency per record.
/// `update_booking_status` is a conditional write: it must fail with
/// [`StoreError::StaleState`] rather than overwrite when the stored status
/// is not `expected`.
#[async_trait]
pub trait CareStore: Send + Sync {
    /// Most recently created open request of a requester
    async fn open_care_request(&self, requester_id: Uuid) -> Result<Option<CareRequest>, StoreError>;

    async fn care_request(&self, id: Uuid) -> Result<Option<CareRequest>, StoreError>;

    /// Insert or update by id, leaving `status` untouched
    ///
    /// Fails with [`StoreError::StaleState`] when the stored request is no
    /// longer open, or when inserting would give the requester a second
    /// open request.
    async fn save_care_request(&self, request: &CareRequest) -> Result<(), StoreError>;

    async fn caregiver(&self, id: Uuid) -> Result<Option<CaregiverProfile>, StoreError>;

    async fn caregiver_by_account(&self, account_id: Uuid) -> Result<Option<CaregiverProfile>, StoreError>;

    async fn caregivers(&self) -> Result<Vec<CaregiverProfile>, StoreError>;

    /// Insert or update by id, including availability
    async fn save_caregiver(&self, profile: &CaregiverProfile) -> Result<(), StoreError>;

    /// Replace every availability slot of a profile
    async fn replace_availability(
        &self,
        profile_id: Uuid,
        slots: &[AvailabilitySlot],
    ) -> Result<(), StoreError>;

    /// Persist a new booking and close its source request, all or nothing
    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError>;

    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    /// Set status to `next` only if it is still `expected`
    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking, StoreError>;

    async fn bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    AvailabilitySlot, Booking, BookingStatus, CareRequest, CareRequestStatus, CaregiverProfile,
};
use crate::services::store::{BookingFilter, CareStore};

#[derive(Default)]
struct Tables {
    care_requests: HashMap<Uuid, CareRequest>,
    caregivers: HashMap<Uuid, CaregiverProfile>,
    bookings: HashMap<Uuid, Booking>,
}

/// In-process store backed by a single lock over all tables
///
/// Each operation holds the lock for its whole read-check-write, which makes
/// the conditional booking update and the booking insert atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CareStore for MemoryStore {
    async fn open_care_request(&self, requester_id: Uuid) -> Result<Option<CareRequest>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .care_requests
            .values()
            .filter(|r| r.requester_id == requester_id && r.status == CareRequestStatus::Open)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn care_request(&self, id: Uuid) -> Result<Option<CareRequest>, StoreError> {
        Ok(self.tables.read().await.care_requests.get(&id).cloned())
    }

    async fn save_care_request(&self, request: &CareRequest) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        match tables.care_requests.get(&request.id) {
            Some(stored) if stored.status != CareRequestStatus::Open => {
                return Err(StoreError::StaleState {
                    expected: CareRequestStatus::Open.as_str().to_string(),
                    found: stored.status.as_str().to_string(),
                });
            }
            Some(_) => {}
            None => {
                let competing = tables.care_requests.values().any(|r| {
                    r.requester_id == request.requester_id && r.status == CareRequestStatus::Open
                });
                if competing {
                    return Err(StoreError::StaleState {
                        expected: "no open request".to_string(),
                        found: format!("open request for requester {}", request.requester_id),
                    });
                }
            }
        }

        // Status only changes through insert_booking
        let mut stored = request.clone();
        if let Some(existing) = tables.care_requests.get(&request.id) {
            stored.status = existing.status;
        }
        tables.care_requests.insert(request.id, stored);
        Ok(())
    }

    async fn caregiver(&self, id: Uuid) -> Result<Option<CaregiverProfile>, StoreError> {
        Ok(self.tables.read().await.caregivers.get(&id).cloned())
    }

    async fn caregiver_by_account(&self, account_id: Uuid) -> Result<Option<CaregiverProfile>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .caregivers
            .values()
            .find(|c| c.account_id == Some(account_id))
            .cloned())
    }

    async fn caregivers(&self) -> Result<Vec<CaregiverProfile>, StoreError> {
        let tables = self.tables.read().await;
        let mut all: Vec<CaregiverProfile> = tables.caregivers.values().cloned().collect();
        // HashMap order is arbitrary; keep ranking input deterministic
        all.sort_by_key(|c| c.id);
        Ok(all)
    }

    async fn save_caregiver(&self, profile: &CaregiverProfile) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .caregivers
            .insert(profile.id, profile.clone());
        Ok(())
    }

    async fn replace_availability(
        &self,
        profile_id: Uuid,
        slots: &[AvailabilitySlot],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .caregivers
            .get_mut(&profile_id)
            .ok_or_else(|| StoreError::Missing(format!("caregiver profile {profile_id}")))?;
        profile.availability = slots.to_vec();
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let request = tables
            .care_requests
            .get_mut(&booking.care_request_id)
            .ok_or_else(|| StoreError::Missing(format!("care request {}", booking.care_request_id)))?;
        request.status = CareRequestStatus::Closed;
        request.updated_at = booking.created_at;
        tables.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking, StoreError> {
        let mut tables = self.tables.write().await;
        let booking = tables
            .bookings
            .get_mut(&id)
            .ok_or_else(|| StoreError::Missing(format!("booking {id}")))?;

        if booking.status != expected {
            return Err(StoreError::StaleState {
                expected: expected.to_string(),
                found: booking.status.to_string(),
            });
        }

        booking.status = next;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| match filter {
                BookingFilter::Requester(requester_id) => b.requester_id == requester_id,
                BookingFilter::Caregiver { account_id, status } => {
                    b.caregiver_account_id == account_id && b.status == status
                }
            })
            .cloned()
            .collect();

        match filter {
            BookingFilter::Requester(_) => bookings.sort_by(|a, b| b.start_time.cmp(&a.start_time)),
            BookingFilter::Caregiver { .. } => bookings.sort_by(|a, b| a.start_time.cmp(&b.start_time)),
        }

        Ok(bookings)
    }
}

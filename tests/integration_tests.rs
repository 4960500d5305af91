// Integration tests for CareMatch service flows over the in-memory store

use async_trait::async_trait;
use carematch::core::{CategoryDefaultRate, Matcher, PricingCalculator};
use carematch::error::{CareError, ErrorKind, StoreError};
use carematch::models::{
    Actor, AvailabilitySlot, Booking, BookingScope, BookingStatus, CareRequest, CaregiverProfile,
    CaregiverProfileUpdate, CredentialCategory, IntakeSubmission, VerificationStatus,
};
use carematch::services::{BookingFilter, CareService, CareStore, MemoryStore};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

fn create_test_service() -> (CareService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = CareService::new(
        store.clone(),
        Matcher::default(),
        PricingCalculator::default(),
    );
    (service, store)
}

fn create_test_submission(tasks: &[&str]) -> IntakeSubmission {
    IntakeSubmission {
        who_needs_care: Some("Mother".to_string()),
        age: Some(82),
        mobility: Some("uses a walker".to_string()),
        tasks: Some(tasks.iter().map(|t| t.to_string()).collect()),
        hours_per_day: Some(Decimal::from(3)),
        postal_code: Some("10001".to_string()),
        time_window: Some("mornings".to_string()),
    }
}

fn create_test_caregiver(
    account: Uuid,
    skills: &[&str],
    postal_code: &str,
    rate: Option<i64>,
) -> CaregiverProfile {
    CaregiverProfile {
        id: Uuid::new_v4(),
        account_id: Some(account),
        display_name: Some(format!("Caregiver {}", &account.to_string()[..8])),
        category: CredentialCategory::Hha,
        years_experience: Some(2),
        hourly_rate_cents: rate,
        skills: skills.iter().map(|s| s.to_string()).collect(),
        languages: vec![],
        verification: VerificationStatus::Approved,
        postal_code: Some(postal_code.to_string()),
        availability: vec![],
    }
}

#[tokio::test]
async fn test_upsert_merges_into_open_request() {
    let (service, _) = create_test_service();
    let requester = Actor::requester(Uuid::new_v4());

    let first = service
        .upsert_care_request(&requester, create_test_submission(&["meals"]))
        .await
        .unwrap();

    let amended = service
        .upsert_care_request(
            &requester,
            IntakeSubmission {
                tasks: Some(vec!["bathing".to_string(), " Bathing ".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(first.id, amended.id);
    assert_eq!(amended.who_needs_care, "Mother");
    assert_eq!(amended.postal_code.as_deref(), Some("10001"));
    assert_eq!(amended.tasks, vec!["bathing".to_string()]);
    assert_eq!(amended.acuity().map(|a| a.as_str()), Some("HIGH"));
}

#[tokio::test]
async fn test_only_requesters_submit_intake() {
    let (service, _) = create_test_service();
    let caregiver = Actor::caregiver(Uuid::new_v4());

    let err = service
        .upsert_care_request(&caregiver, create_test_submission(&[]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[tokio::test]
async fn test_ranking_orders_by_score_then_proximity() {
    let (service, store) = create_test_service();
    let requester = Actor::requester(Uuid::new_v4());
    service
        .upsert_care_request(&requester, create_test_submission(&["meals", "laundry"]))
        .await
        .unwrap();

    let strong = create_test_caregiver(Uuid::new_v4(), &["meals", "laundry"], "94105", None);
    let tied_far = create_test_caregiver(Uuid::new_v4(), &["meals"], "94105", None);
    let tied_near = create_test_caregiver(Uuid::new_v4(), &["meals"], "10002", None);
    for caregiver in [&tied_far, &strong, &tied_near] {
        store.save_caregiver(caregiver).await.unwrap();
    }

    let found = service.rank_for_request(&requester, None).await.unwrap();
    let order: Vec<Uuid> = found
        .result
        .matches
        .iter()
        .map(|m| m.caregiver_profile_id)
        .collect();

    assert_eq!(order, vec![strong.id, tied_near.id, tied_far.id]);
    assert_eq!(found.result.total_candidates, 3);
    // no own rate, so the HHA display default applies
    assert_eq!(
        found.result.matches[0].hourly_rate_cents,
        CategoryDefaultRate::default().hha
    );
}

#[tokio::test]
async fn test_ranking_is_capped() {
    let (service, store) = create_test_service();
    let requester = Actor::requester(Uuid::new_v4());
    service
        .upsert_care_request(&requester, create_test_submission(&["meals"]))
        .await
        .unwrap();

    for _ in 0..8 {
        store
            .save_caregiver(&create_test_caregiver(Uuid::new_v4(), &["meals"], "10001", None))
            .await
            .unwrap();
    }

    let found = service.rank_for_request(&requester, None).await.unwrap();
    assert_eq!(found.result.matches.len(), 5);
    assert_eq!(found.result.total_candidates, 8);
}

#[tokio::test]
async fn test_ranking_without_request_is_empty() {
    let (service, _) = create_test_service();
    let found = service
        .rank_for_request(&Actor::requester(Uuid::new_v4()), None)
        .await
        .unwrap();

    assert!(found.care_request_id.is_none());
    assert!(found.result.matches.is_empty());
}

#[tokio::test]
async fn test_booking_freezes_price_and_closes_request() {
    let (service, store) = create_test_service();
    let requester = Actor::requester(Uuid::new_v4());
    let caregiver_account = Uuid::new_v4();

    let request = service
        .upsert_care_request(&requester, create_test_submission(&["meals"]))
        .await
        .unwrap();
    let caregiver = create_test_caregiver(caregiver_account, &["meals"], "10001", Some(5000));
    store.save_caregiver(&caregiver).await.unwrap();

    let booking = service
        .create_booking(&requester, request.id, caregiver.id)
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.hourly_rate_cents, 5000);
    assert_eq!(booking.total_price_cents, 15000);
    assert_eq!(booking.caregiver_account_id, caregiver_account);
    assert!(service.open_care_request(&requester).await.unwrap().is_none());

    // later rate changes never touch a committed booking
    let repriced = service
        .update_caregiver_profile(
            &Actor::caregiver(caregiver_account),
            CaregiverProfileUpdate {
                hourly_rate_cents: Some(9900),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(repriced.hourly_rate_cents, Some(9900));

    let stored = service.booking(&requester, booking.id).await.unwrap();
    assert_eq!(stored.hourly_rate_cents, 5000);
    assert_eq!(stored.total_price_cents, 15000);

    // new bookings pick up the new rate
    let next_requester = Actor::requester(Uuid::new_v4());
    let next_request = service
        .upsert_care_request(&next_requester, create_test_submission(&["meals"]))
        .await
        .unwrap();
    let next = service
        .create_booking(&next_requester, next_request.id, caregiver.id)
        .await
        .unwrap();
    assert_eq!(next.hourly_rate_cents, 9900);
    assert_eq!(next.total_price_cents, 29700);
}

#[tokio::test]
async fn test_profile_update_rejects_non_positive_rate() {
    let (service, store) = create_test_service();
    let account = Uuid::new_v4();
    store
        .save_caregiver(&create_test_caregiver(account, &[], "10001", Some(5000)))
        .await
        .unwrap();

    let err = service
        .update_caregiver_profile(
            &Actor::caregiver(account),
            CaregiverProfileUpdate {
                hourly_rate_cents: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    let stored = service.caregiver_profile(&Actor::caregiver(account)).await.unwrap();
    assert_eq!(stored.hourly_rate_cents, Some(5000));
}

#[tokio::test]
async fn test_reprice_by_category_keeps_booked_prices() {
    let (service, store) = create_test_service();
    let requester = Actor::requester(Uuid::new_v4());
    let rates = CategoryDefaultRate::default();

    let request = service
        .upsert_care_request(&requester, create_test_submission(&[]))
        .await
        .unwrap();
    let cheap = create_test_caregiver(Uuid::new_v4(), &[], "10001", Some(2500));
    let settled = create_test_caregiver(Uuid::new_v4(), &[], "10001", Some(rates.hha));
    store.save_caregiver(&cheap).await.unwrap();
    store.save_caregiver(&settled).await.unwrap();
    let booking = service
        .create_booking(&requester, request.id, cheap.id)
        .await
        .unwrap();

    let err = service
        .reprice_by_category(&requester, &rates)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let updated = service
        .reprice_by_category(&Actor::system(), &rates)
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let profile = store.caregiver(cheap.id).await.unwrap().unwrap();
    assert_eq!(profile.hourly_rate_cents, Some(rates.hha));

    let stored = service.booking(&requester, booking.id).await.unwrap();
    assert_eq!(stored.hourly_rate_cents, 2500);
    assert_eq!(stored.total_price_cents, 7500);
}

/// Store whose open-request read is immediately followed by a booking
/// that closes the request, as if a second caller committed in between.
struct BookingRaceStore {
    inner: MemoryStore,
}

#[async_trait]
impl CareStore for BookingRaceStore {
    async fn open_care_request(&self, requester_id: Uuid) -> Result<Option<CareRequest>, StoreError> {
        let snapshot = self.inner.open_care_request(requester_id).await?;
        if let Some(request) = &snapshot {
            let start = Utc::now();
            self.inner
                .insert_booking(&Booking {
                    id: Uuid::new_v4(),
                    care_request_id: request.id,
                    requester_id,
                    caregiver_profile_id: Uuid::new_v4(),
                    caregiver_account_id: Uuid::new_v4(),
                    start_time: start,
                    end_time: start,
                    total_hours: Decimal::from(4),
                    hourly_rate_cents: 4500,
                    total_price_cents: 18000,
                    status: BookingStatus::Pending,
                    created_at: start,
                    updated_at: start,
                })
                .await?;
        }
        Ok(snapshot)
    }

    async fn care_request(&self, id: Uuid) -> Result<Option<CareRequest>, StoreError> {
        self.inner.care_request(id).await
    }

    async fn save_care_request(&self, request: &CareRequest) -> Result<(), StoreError> {
        self.inner.save_care_request(request).await
    }

    async fn caregiver(&self, id: Uuid) -> Result<Option<CaregiverProfile>, StoreError> {
        self.inner.caregiver(id).await
    }

    async fn caregiver_by_account(&self, account_id: Uuid) -> Result<Option<CaregiverProfile>, StoreError> {
        self.inner.caregiver_by_account(account_id).await
    }

    async fn caregivers(&self) -> Result<Vec<CaregiverProfile>, StoreError> {
        self.inner.caregivers().await
    }

    async fn save_caregiver(&self, profile: &CaregiverProfile) -> Result<(), StoreError> {
        self.inner.save_caregiver(profile).await
    }

    async fn replace_availability(
        &self,
        profile_id: Uuid,
        slots: &[AvailabilitySlot],
    ) -> Result<(), StoreError> {
        self.inner.replace_availability(profile_id, slots).await
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        self.inner.insert_booking(booking).await
    }

    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        self.inner.booking(id).await
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking, StoreError> {
        self.inner.update_booking_status(id, expected, next).await
    }

    async fn bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>, StoreError> {
        self.inner.bookings(filter).await
    }
}

#[tokio::test]
async fn test_upsert_racing_a_booking_conflicts_instead_of_reopening() {
    let requester = Actor::requester(Uuid::new_v4());
    let memory = MemoryStore::new();
    let first = CareRequest::new(requester.id, "Mother", Utc::now());
    memory.save_care_request(&first).await.unwrap();

    let store = Arc::new(BookingRaceStore { inner: memory });
    let service = CareService::new(store.clone(), Matcher::default(), PricingCalculator::default());

    let err = service
        .upsert_care_request(
            &requester,
            IntakeSubmission {
                mobility: Some("walker".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(store.inner.open_care_request(requester.id).await.unwrap().is_none());
    let stored = store.inner.care_request(first.id).await.unwrap().unwrap();
    assert!(!stored.is_open());
    assert!(stored.mobility.is_none());
}

#[tokio::test]
async fn test_booking_without_rate_uses_flat_default() {
    let (service, store) = create_test_service();
    let requester = Actor::requester(Uuid::new_v4());

    let request = service
        .upsert_care_request(
            &requester,
            IntakeSubmission {
                who_needs_care: Some("Dad".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let caregiver = create_test_caregiver(Uuid::new_v4(), &[], "10001", None);
    store.save_caregiver(&caregiver).await.unwrap();

    let booking = service
        .create_booking(&requester, request.id, caregiver.id)
        .await
        .unwrap();

    assert_eq!(booking.hourly_rate_cents, 4500);
    assert_eq!(booking.total_hours, Decimal::from(4));
    assert_eq!(booking.total_price_cents, 18000);
}

#[tokio::test]
async fn test_foreign_request_is_not_found() {
    let (service, store) = create_test_service();
    let owner = Actor::requester(Uuid::new_v4());
    let stranger = Actor::requester(Uuid::new_v4());

    let request = service
        .upsert_care_request(&owner, create_test_submission(&[]))
        .await
        .unwrap();
    let caregiver = create_test_caregiver(Uuid::new_v4(), &[], "10001", None);
    store.save_caregiver(&caregiver).await.unwrap();

    let err = service
        .create_booking(&stranger, request.id, caregiver.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CareError::NotFound(_)));

    let err = service
        .create_booking(&owner, request.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, CareError::NotFound(_)));
}

#[tokio::test]
async fn test_transition_ownership_and_graph() {
    let (service, store) = create_test_service();
    let requester = Actor::requester(Uuid::new_v4());
    let owner = Actor::caregiver(Uuid::new_v4());
    let outsider = Actor::caregiver(Uuid::new_v4());

    let request = service
        .upsert_care_request(&requester, create_test_submission(&["meals"]))
        .await
        .unwrap();
    let caregiver = create_test_caregiver(owner.id, &["meals"], "10001", None);
    store.save_caregiver(&caregiver).await.unwrap();
    let booking = service
        .create_booking(&requester, request.id, caregiver.id)
        .await
        .unwrap();

    let accepted = service
        .transition_booking(booking.id, &owner, "ACCEPTED")
        .await
        .unwrap();
    assert_eq!(accepted.status, BookingStatus::Accepted);

    let err = service
        .transition_booking(booking.id, &outsider, "ACCEPTED")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    // requesters cannot accept on the caregiver's behalf
    let err = service
        .transition_booking(booking.id, &requester, "DECLINED")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let err = service
        .transition_booking(booking.id, &owner, "DECLINED")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let completed = service
        .transition_booking(booking.id, &owner, "completed")
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    let err = service
        .transition_booking(booking.id, &requester, "CANCELLED")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_unknown_status_and_missing_booking() {
    let (service, _) = create_test_service();
    let caregiver = Actor::caregiver(Uuid::new_v4());

    let err = service
        .transition_booking(Uuid::new_v4(), &caregiver, "ARCHIVED")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = service
        .transition_booking(Uuid::new_v4(), &caregiver, "ACCEPTED")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_system_actor_can_cancel() {
    let (service, store) = create_test_service();
    let requester = Actor::requester(Uuid::new_v4());

    let request = service
        .upsert_care_request(&requester, create_test_submission(&[]))
        .await
        .unwrap();
    let caregiver = create_test_caregiver(Uuid::new_v4(), &[], "10001", None);
    store.save_caregiver(&caregiver).await.unwrap();
    let booking = service
        .create_booking(&requester, request.id, caregiver.id)
        .await
        .unwrap();

    let cancelled = service
        .transition_booking(booking.id, &Actor::system(), "CANCELLED")
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_caregiver_listing_scopes() {
    let (service, store) = create_test_service();
    let owner = Actor::caregiver(Uuid::new_v4());
    let caregiver = create_test_caregiver(owner.id, &[], "10001", None);
    store.save_caregiver(&caregiver).await.unwrap();

    let mut booking_ids = Vec::new();
    for _ in 0..3 {
        let requester = Actor::requester(Uuid::new_v4());
        let request = service
            .upsert_care_request(&requester, create_test_submission(&[]))
            .await
            .unwrap();
        let booking = service
            .create_booking(&requester, request.id, caregiver.id)
            .await
            .unwrap();
        booking_ids.push(booking.id);
    }

    service
        .transition_booking(booking_ids[0], &owner, "ACCEPTED")
        .await
        .unwrap();

    let pending = service.list_bookings(&owner, BookingScope::Pending).await.unwrap();
    let upcoming = service.list_bookings(&owner, BookingScope::Upcoming).await.unwrap();

    assert_eq!(pending.len(), 2);
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, booking_ids[0]);
    assert!(pending.windows(2).all(|w| w[0].start_time <= w[1].start_time));

    let err = service
        .list_bookings(&Actor::system(), BookingScope::Pending)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[tokio::test]
async fn test_booking_visibility_is_limited_to_participants() {
    let (service, store) = create_test_service();
    let requester = Actor::requester(Uuid::new_v4());
    let request = service
        .upsert_care_request(&requester, create_test_submission(&[]))
        .await
        .unwrap();
    let caregiver = create_test_caregiver(Uuid::new_v4(), &[], "10001", None);
    store.save_caregiver(&caregiver).await.unwrap();
    let booking = service
        .create_booking(&requester, request.id, caregiver.id)
        .await
        .unwrap();

    let err = service
        .booking(&Actor::requester(Uuid::new_v4()), booking.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let seen = service
        .booking(&Actor::caregiver(caregiver.account_id.unwrap()), booking.id)
        .await
        .unwrap();
    assert_eq!(seen.id, booking.id);
}

#[tokio::test]
async fn test_caregiver_profile_lifecycle() {
    let (service, _) = create_test_service();
    let account = Actor::caregiver(Uuid::new_v4());

    let registered = service
        .register_caregiver(&account, CredentialCategory::Lpn, Some("Ana".to_string()), None)
        .await
        .unwrap();
    assert_eq!(registered.verification, VerificationStatus::Pending);

    let err = service
        .register_caregiver(&account, CredentialCategory::Lpn, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let updated = service
        .update_caregiver_profile(
            &account,
            CaregiverProfileUpdate {
                years_experience: Some(6),
                skills: Some(vec!["Meals".to_string(), "meals".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.skills, vec!["Meals".to_string()]);
    assert_eq!(updated.verification, VerificationStatus::Approved);

    let slots = vec![AvailabilitySlot::new(1, 540, 1020).unwrap()];
    service.replace_availability(&account, slots.clone()).await.unwrap();

    let stored = service.caregiver_profile(&account).await.unwrap();
    assert_eq!(stored.availability, slots);
    assert_eq!(stored.years_experience, Some(6));
}

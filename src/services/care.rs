use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{
    authorize_transition, intake::normalize_tasks, merge_submission, open_booking,
    CategoryDefaultRate, MatchResult, Matcher, PricingCalculator,
};
use crate::error::{CareError, StoreError};
use crate::models::{
    Actor, AvailabilitySlot, Booking, BookingScope, BookingStatus, CareRequest, CaregiverProfile,
    CaregiverProfileUpdate, CredentialCategory, IntakeSubmission, Role, VerificationStatus,
};
use crate::services::store::{BookingFilter, CareStore};

/// Ranked caregivers together with the request they were ranked for
#[derive(Debug)]
pub struct RequestMatches {
    pub care_request_id: Option<Uuid>,
    pub result: MatchResult,
}

/// Entry point for every engine operation
///
/// Each call fetches what it needs from the store, runs the pure core
/// logic, and persists the outcome. Nothing is retried here.
#[derive(Clone)]
pub struct CareService {
    store: Arc<dyn CareStore>,
    matcher: Matcher,
    pricing: PricingCalculator,
}

impl CareService {
    pub fn new(store: Arc<dyn CareStore>, matcher: Matcher, pricing: PricingCalculator) -> Self {
        Self {
            store,
            matcher,
            pricing,
        }
    }

    pub fn store(&self) -> &Arc<dyn CareStore> {
        &self.store
    }

    /// Create or merge into the requester's open care request
    pub async fn upsert_care_request(
        &self,
        actor: &Actor,
        submission: IntakeSubmission,
    ) -> Result<CareRequest, CareError> {
        require_role(actor, Role::Requester, "submit care requests")?;

        let existing = self.store.open_care_request(actor.id).await?;
        let is_new = existing.is_none();
        let request = merge_submission(existing, actor.id, submission, Utc::now())?;
        self.store
            .save_care_request(&request)
            .await
            .map_err(|e| match e {
                StoreError::StaleState { .. } => CareError::Conflict(
                    "care request was booked or replaced while this update was in flight".to_string(),
                ),
                other => CareError::Storage(other),
            })?;

        tracing::info!(
            "{} care request {} for requester {} (acuity: {:?})",
            if is_new { "Created" } else { "Updated" },
            request.id,
            actor.id,
            request.acuity()
        );

        Ok(request)
    }

    /// The requester's open care request, if any
    pub async fn open_care_request(&self, actor: &Actor) -> Result<Option<CareRequest>, CareError> {
        require_role(actor, Role::Requester, "view care requests")?;
        Ok(self.store.open_care_request(actor.id).await?)
    }

    /// Rank every caregiver for one of the requester's care requests
    ///
    /// Uses `care_request_id` when it belongs to the requester, otherwise
    /// their open request. With neither, the result is empty.
    pub async fn rank_for_request(
        &self,
        actor: &Actor,
        care_request_id: Option<Uuid>,
    ) -> Result<RequestMatches, CareError> {
        require_role(actor, Role::Requester, "view matches")?;

        let explicit = match care_request_id {
            Some(id) => self
                .store
                .care_request(id)
                .await?
                .filter(|r| r.requester_id == actor.id),
            None => None,
        };

        let request = match explicit {
            Some(request) => Some(request),
            None => self.store.open_care_request(actor.id).await?,
        };

        let Some(request) = request else {
            return Ok(RequestMatches {
                care_request_id: None,
                result: MatchResult {
                    matches: Vec::new(),
                    total_candidates: 0,
                },
            });
        };

        let caregivers = self.store.caregivers().await?;
        let result = self.matcher.rank_caregivers(&request, &caregivers);

        tracing::info!(
            "Returning {} matches for request {} (from {} caregivers)",
            result.matches.len(),
            request.id,
            result.total_candidates
        );

        Ok(RequestMatches {
            care_request_id: Some(request.id),
            result,
        })
    }

    /// Commit to a caregiver for one of the requester's care requests
    ///
    /// Rate and price are computed here and frozen into the booking.
    pub async fn create_booking(
        &self,
        actor: &Actor,
        care_request_id: Uuid,
        caregiver_profile_id: Uuid,
    ) -> Result<Booking, CareError> {
        require_role(actor, Role::Requester, "create bookings")?;

        let request = self
            .store
            .care_request(care_request_id)
            .await?
            .filter(|r| r.requester_id == actor.id)
            .ok_or_else(|| CareError::NotFound("care request".to_string()))?;

        let caregiver = self
            .store
            .caregiver(caregiver_profile_id)
            .await?
            .filter(|c| c.account_id.is_some())
            .ok_or_else(|| CareError::NotFound("caregiver".to_string()))?;

        let now = Utc::now();
        let terms = self
            .pricing
            .price(request.hours_per_day, caregiver.hourly_rate_cents, now)?;
        let booking = open_booking(&request, &caregiver, terms, now)?;

        self.store.insert_booking(&booking).await?;

        tracing::info!(
            "Created booking {} for request {} with caregiver {} ({} cents)",
            booking.id,
            request.id,
            caregiver.id,
            booking.total_price_cents
        );

        Ok(booking)
    }

    /// Move a booking to `target_status` on behalf of `actor`
    ///
    /// The write is conditioned on the status read here; if another caller
    /// changed it in between, this fails with `Conflict`.
    pub async fn transition_booking(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        target_status: &str,
    ) -> Result<Booking, CareError> {
        let target: BookingStatus = target_status.parse()?;

        let booking = self
            .store
            .booking(booking_id)
            .await?
            .ok_or_else(|| CareError::NotFound("booking".to_string()))?;

        let transition = match authorize_transition(&booking, actor, target) {
            Ok(transition) => transition,
            Err(e) => {
                tracing::warn!(
                    "Rejected transition of booking {} to {} by {:?} {}: {}",
                    booking_id,
                    target,
                    actor.role,
                    actor.id,
                    e
                );
                return Err(e);
            }
        };

        let updated = self
            .store
            .update_booking_status(transition.booking_id, transition.from, transition.to)
            .await
            .map_err(|e| match e {
                StoreError::StaleState { expected, found } => CareError::Conflict(
                    format!("booking moved from {expected} to {found} before this update"),
                ),
                other => CareError::Storage(other),
            })?;

        tracing::info!(
            "Booking {} moved {} -> {} by {}",
            updated.id,
            transition.from,
            transition.to,
            actor.id
        );

        Ok(updated)
    }

    /// Fetch a booking visible to `actor`
    pub async fn booking(&self, actor: &Actor, booking_id: Uuid) -> Result<Booking, CareError> {
        self.store
            .booking(booking_id)
            .await?
            .filter(|b| match actor.role {
                Role::Requester => b.requester_id == actor.id,
                Role::Caregiver => b.caregiver_account_id == actor.id,
                Role::System => false,
            })
            .ok_or_else(|| CareError::NotFound("booking".to_string()))
    }

    /// List bookings for the actor
    ///
    /// Caregivers see PENDING (`Pending` scope) or ACCEPTED (`Upcoming`)
    /// bookings, soonest first. Requesters see all of theirs, latest first,
    /// and the scope is ignored.
    pub async fn list_bookings(&self, actor: &Actor, scope: BookingScope) -> Result<Vec<Booking>, CareError> {
        let filter = match actor.role {
            Role::Caregiver => BookingFilter::Caregiver {
                account_id: actor.id,
                status: match scope {
                    BookingScope::Pending => BookingStatus::Pending,
                    BookingScope::Upcoming => BookingStatus::Accepted,
                },
            },
            Role::Requester => BookingFilter::Requester(actor.id),
            Role::System => {
                return Err(CareError::Authorization(
                    "system actors have no booking list".to_string(),
                ))
            }
        };

        Ok(self.store.bookings(filter).await?)
    }

    /// Create the caregiver profile for a caregiver account
    pub async fn register_caregiver(
        &self,
        actor: &Actor,
        category: CredentialCategory,
        display_name: Option<String>,
        hourly_rate_cents: Option<i64>,
    ) -> Result<CaregiverProfile, CareError> {
        require_role(actor, Role::Caregiver, "register caregiver profiles")?;

        if self.store.caregiver_by_account(actor.id).await?.is_some() {
            return Err(CareError::Validation(
                "a caregiver profile already exists for this account".to_string(),
            ));
        }
        if matches!(hourly_rate_cents, Some(rate) if rate <= 0) {
            return Err(CareError::Validation("hourly rate must be positive".to_string()));
        }

        let profile = CaregiverProfile {
            id: Uuid::new_v4(),
            account_id: Some(actor.id),
            display_name,
            category,
            years_experience: None,
            hourly_rate_cents,
            skills: Vec::new(),
            languages: Vec::new(),
            verification: VerificationStatus::Pending,
            postal_code: None,
            availability: Vec::new(),
        };

        self.store.save_caregiver(&profile).await?;

        tracing::info!("Registered {} caregiver profile {}", category.as_str(), profile.id);

        Ok(profile)
    }

    /// The caller's own caregiver profile
    pub async fn caregiver_profile(&self, actor: &Actor) -> Result<CaregiverProfile, CareError> {
        require_role(actor, Role::Caregiver, "view caregiver profiles")?;

        self.store
            .caregiver_by_account(actor.id)
            .await?
            .ok_or_else(|| CareError::NotFound("caregiver profile".to_string()))
    }

    /// Merge a profile submission into the caller's caregiver profile
    ///
    /// A supplied availability list replaces every stored slot. Submitting
    /// the profile marks it approved; document checks are simulated.
    pub async fn update_caregiver_profile(
        &self,
        actor: &Actor,
        update: CaregiverProfileUpdate,
    ) -> Result<CaregiverProfile, CareError> {
        let mut profile = self.caregiver_profile(actor).await?;

        let availability = update
            .availability
            .map(|slots| {
                slots
                    .into_iter()
                    .map(|s| AvailabilitySlot::new(s.day_of_week, s.start_minute, s.end_minute))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        if matches!(update.hourly_rate_cents, Some(rate) if rate <= 0) {
            return Err(CareError::Validation("hourly rate must be positive".to_string()));
        }

        if let Some(years) = update.years_experience {
            profile.years_experience = Some(years);
        }
        if let Some(rate) = update.hourly_rate_cents {
            profile.hourly_rate_cents = Some(rate);
        }
        if let Some(skills) = update.skills {
            profile.skills = normalize_tasks(skills);
        }
        if let Some(languages) = update.languages {
            profile.languages = normalize_tasks(languages);
        }
        if let Some(postal_code) = update.postal_code {
            profile.postal_code = Some(postal_code.trim().to_string());
        }
        if let Some(slots) = availability {
            profile.availability = slots;
        }
        profile.verification = VerificationStatus::Approved;

        self.store.save_caregiver(&profile).await?;

        tracing::info!(
            "Updated caregiver profile {} ({} skills, {} slots)",
            profile.id,
            profile.skills.len(),
            profile.availability.len()
        );

        Ok(profile)
    }

    /// Set every caregiver's rate to the category rate for their credential
    ///
    /// Only system actors may reprice. Profiles already at their category
    /// rate are left alone. Returns how many profiles changed. Bookings keep
    /// the rate they were created with.
    pub async fn reprice_by_category(
        &self,
        actor: &Actor,
        rates: &CategoryDefaultRate,
    ) -> Result<usize, CareError> {
        require_role(actor, Role::System, "reprice caregivers")?;

        let mut updated = 0;
        for mut profile in self.store.caregivers().await? {
            let rate = rates.for_category(profile.category);
            if profile.hourly_rate_cents == Some(rate) {
                tracing::debug!(
                    "Skipping caregiver {} ({}), already at {} cents",
                    profile.id,
                    profile.category.as_str(),
                    rate
                );
                continue;
            }

            tracing::info!(
                "Repricing caregiver {} ({}) from {:?} to {} cents",
                profile.id,
                profile.category.as_str(),
                profile.hourly_rate_cents,
                rate
            );
            profile.hourly_rate_cents = Some(rate);
            self.store.save_caregiver(&profile).await?;
            updated += 1;
        }

        Ok(updated)
    }

    /// Category rates used for display, and by default for repricing
    pub fn display_rates(&self) -> &CategoryDefaultRate {
        self.matcher.display_rates()
    }

    /// Replace a caregiver's availability wholesale
    pub async fn replace_availability(
        &self,
        actor: &Actor,
        slots: Vec<AvailabilitySlot>,
    ) -> Result<CaregiverProfile, CareError> {
        let mut profile = self.caregiver_profile(actor).await?;

        self.store.replace_availability(profile.id, &slots).await?;
        profile.availability = slots;

        Ok(profile)
    }
}

fn require_role(actor: &Actor, role: Role, action: &str) -> Result<(), CareError> {
    if actor.role != role {
        return Err(CareError::Authorization(format!(
            "only {:?} accounts may {action}",
            role
        )));
    }
    Ok(())
}

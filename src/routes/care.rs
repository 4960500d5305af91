use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    Actor, AvailabilitySlot, BookingResponse, BookingScope, BookingsResponse,
    CaregiverProfile, CaregiverProfileResponse, CaregiverProfileUpdate, CreateBookingRequest,
    CredentialCategory, HealthResponse, IntakeResponse, IntakeSubmission, ListBookingsQuery,
    MatchesQuery, MatchesResponse, RegisterCaregiverRequest, ReplaceAvailabilityRequest,
    RepriceResponse, TransitionBookingRequest,
};
use crate::routes::{ApiError, AppState};

/// Configure all care-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/intake", web::post().to(submit_intake))
        .route("/intake", web::get().to(get_intake))
        .route("/matches", web::get().to(get_matches))
        .route("/bookings", web::post().to(create_booking))
        .route("/bookings", web::get().to(list_bookings))
        .route("/bookings/{id}", web::get().to(get_booking))
        .route("/bookings/{id}", web::patch().to(transition_booking))
        .route("/caregivers/profile", web::post().to(register_caregiver))
        .route("/caregivers/profile", web::get().to(get_caregiver_profile))
        .route("/caregivers/profile", web::patch().to(update_caregiver_profile))
        .route("/caregivers/availability", web::put().to(replace_availability))
        .route("/caregivers/reprice", web::post().to(reprice_caregivers));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = state.service.store().health_check().await.unwrap_or(false);

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Submit or amend the caller's care request
///
/// POST /api/v1/intake
///
/// Request body (every field optional on amendment):
/// ```json
/// {
///   "whoNeedsCare": "Mom",
///   "age": 82,
///   "mobility": "uses walker",
///   "tasks": ["meals", "bathing"],
///   "hoursPerDay": 4,
///   "postalCode": "10001",
///   "timeWindow": "mornings"
/// }
/// ```
async fn submit_intake(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<IntakeSubmission>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let request = state.service.upsert_care_request(&actor, req.into_inner()).await?;

    Ok(HttpResponse::Ok().json(IntakeResponse {
        intake: Some(request),
    }))
}

/// The caller's open care request, or `null`
async fn get_intake(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    let intake = state.service.open_care_request(&actor).await?;
    Ok(HttpResponse::Ok().json(IntakeResponse { intake }))
}

/// Ranked caregivers
///
/// GET /api/v1/matches?careRequestId={id}
async fn get_matches(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<MatchesQuery>,
) -> Result<HttpResponse, ApiError> {
    let found = state
        .service
        .rank_for_request(&actor, query.care_request_id)
        .await?;

    Ok(HttpResponse::Ok().json(MatchesResponse {
        caregivers: found.result.matches,
        care_request_id: found.care_request_id,
        total_candidates: found.result.total_candidates,
    }))
}

/// Book a caregiver
///
/// POST /api/v1/bookings
///
/// Request body:
/// ```json
/// { "careRequestId": "uuid", "caregiverProfileId": "uuid" }
/// ```
async fn create_booking(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, ApiError> {
    let booking = state
        .service
        .create_booking(&actor, req.care_request_id, req.caregiver_profile_id)
        .await?;

    Ok(HttpResponse::Created().json(BookingResponse { booking }))
}

/// GET /api/v1/bookings?scope=pending|upcoming
async fn list_bookings(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<ListBookingsQuery>,
) -> Result<HttpResponse, ApiError> {
    let scope = match query.scope.as_deref() {
        Some(raw) => raw.parse::<BookingScope>()?,
        None => BookingScope::default(),
    };

    let bookings = state.service.list_bookings(&actor, scope).await?;
    Ok(HttpResponse::Ok().json(BookingsResponse { bookings }))
}

async fn get_booking(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let booking = state.service.booking(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(BookingResponse { booking }))
}

/// Move a booking through its lifecycle
///
/// PATCH /api/v1/bookings/{id}
///
/// Request body:
/// ```json
/// { "status": "ACCEPTED" }
/// ```
async fn transition_booking(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
    req: web::Json<TransitionBookingRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let booking = state
        .service
        .transition_booking(path.into_inner(), &actor, &req.status)
        .await?;

    Ok(HttpResponse::Ok().json(BookingResponse { booking }))
}

/// POST /api/v1/caregivers/profile
async fn register_caregiver(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<RegisterCaregiverRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();
    let category: CredentialCategory = req.category.parse()?;

    let profile = state
        .service
        .register_caregiver(&actor, category, req.display_name, req.hourly_rate_cents)
        .await?;

    Ok(HttpResponse::Created().json(profile_response(profile)))
}

async fn get_caregiver_profile(
    state: web::Data<AppState>,
    actor: Actor,
) -> Result<HttpResponse, ApiError> {
    let profile = state.service.caregiver_profile(&actor).await?;
    Ok(HttpResponse::Ok().json(profile_response(profile)))
}

/// PATCH /api/v1/caregivers/profile
async fn update_caregiver_profile(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<CaregiverProfileUpdate>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let profile = state
        .service
        .update_caregiver_profile(&actor, req.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(profile_response(profile)))
}

/// Replace every availability slot
///
/// PUT /api/v1/caregivers/availability
///
/// Request body:
/// ```json
/// { "slots": [{ "dayOfWeek": 1, "startMinute": 540, "endMinute": 1020 }] }
/// ```
async fn replace_availability(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<ReplaceAvailabilityRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let slots = req
        .slots
        .iter()
        .map(|s| AvailabilitySlot::new(s.day_of_week, s.start_minute, s.end_minute))
        .collect::<Result<Vec<_>, _>>()?;

    let profile = state.service.replace_availability(&actor, slots).await?;
    Ok(HttpResponse::Ok().json(profile_response(profile)))
}

/// Reset every caregiver to the configured category rate
///
/// POST /api/v1/caregivers/reprice (system actors only)
async fn reprice_caregivers(
    state: web::Data<AppState>,
    actor: Actor,
) -> Result<HttpResponse, ApiError> {
    let rates = *state.service.display_rates();
    let updated = state.service.reprice_by_category(&actor, &rates).await?;
    Ok(HttpResponse::Ok().json(RepriceResponse { updated }))
}

fn profile_response(profile: CaregiverProfile) -> CaregiverProfileResponse {
    let availability = profile.availability.iter().map(ToString::to_string).collect();
    CaregiverProfileResponse {
        profile,
        availability,
    }
}

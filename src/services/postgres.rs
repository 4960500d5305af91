use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    AcuityTag, AvailabilitySlot, Booking, BookingStatus, CareRequest, CareRequestStatus,
    CaregiverProfile, CredentialCategory, VerificationStatus,
};
use crate::services::store::{BookingFilter, CareStore};

const CARE_REQUEST_COLUMNS: &str = "id, requester_id, who_needs_care, age, mobility, tasks, \
    hours_per_day, postal_code, time_window, acuity, status, created_at, updated_at";

/// Partial unique index allowing one open request per requester
const OPEN_REQUEST_CONSTRAINT: &str = "uq_care_requests_open_requester";

const CAREGIVER_COLUMNS: &str = "id, account_id, display_name, category, years_experience, \
    hourly_rate_cents, skills, languages, verification, postal_code";

const BOOKING_COLUMNS: &str = "id, care_request_id, requester_id, caregiver_profile_id, \
    caregiver_account_id, start_time, end_time, total_hours, hourly_rate_cents, \
    total_price_cents, status, created_at, updated_at";

/// PostgreSQL-backed store
///
/// Status transitions are a single `UPDATE ... WHERE status = $expected`,
/// so two racing callers cannot both win.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a store from settings, filling unset pool options with defaults
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    async fn load_availability(&self, profile_ids: &[Uuid]) -> Result<Vec<(Uuid, AvailabilitySlot)>, StoreError> {
        let query = r#"
            SELECT caregiver_profile_id, day_of_week, start_minute, end_minute
            FROM availability_slots
            WHERE caregiver_profile_id = ANY($1)
            ORDER BY caregiver_profile_id, day_of_week, start_minute
        "#;

        let rows = sqlx::query(query).bind(profile_ids).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<(Uuid, AvailabilitySlot), StoreError> {
                let profile_id: Uuid = row.try_get("caregiver_profile_id")?;
                let slot = AvailabilitySlot::new(
                    narrow(row.try_get::<i16, _>("day_of_week")?, "day_of_week")?,
                    narrow(row.try_get::<i32, _>("start_minute")?, "start_minute")?,
                    narrow(row.try_get::<i32, _>("end_minute")?, "end_minute")?,
                )
                .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                Ok((profile_id, slot))
            })
            .collect()
    }

    async fn with_availability(&self, mut profiles: Vec<CaregiverProfile>) -> Result<Vec<CaregiverProfile>, StoreError> {
        let ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();
        let slots = self.load_availability(&ids).await?;

        for profile in &mut profiles {
            profile.availability = slots
                .iter()
                .filter(|(id, _)| *id == profile.id)
                .map(|(_, slot)| *slot)
                .collect();
        }

        Ok(profiles)
    }

    async fn write_availability(
        tx: &mut Transaction<'_, Postgres>,
        profile_id: Uuid,
        slots: &[AvailabilitySlot],
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM availability_slots WHERE caregiver_profile_id = $1")
            .bind(profile_id)
            .execute(&mut **tx)
            .await?;

        for slot in slots {
            sqlx::query(
                r#"
                INSERT INTO availability_slots (caregiver_profile_id, day_of_week, start_minute, end_minute)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(profile_id)
            .bind(slot.day_of_week.index() as i16)
            .bind(slot.start_minute as i32)
            .bind(slot.end_minute as i32)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl CareStore for PostgresStore {
    async fn open_care_request(&self, requester_id: Uuid) -> Result<Option<CareRequest>, StoreError> {
        let query = format!(
            "SELECT {CARE_REQUEST_COLUMNS} FROM care_requests \
             WHERE requester_id = $1 AND status = 'open' \
             ORDER BY created_at DESC LIMIT 1"
        );

        let row = sqlx::query(&query)
            .bind(requester_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(care_request_from_row).transpose()
    }

    async fn care_request(&self, id: Uuid) -> Result<Option<CareRequest>, StoreError> {
        let query = format!("SELECT {CARE_REQUEST_COLUMNS} FROM care_requests WHERE id = $1");

        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;

        row.as_ref().map(care_request_from_row).transpose()
    }

    async fn save_care_request(&self, request: &CareRequest) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO care_requests
                (id, requester_id, who_needs_care, age, mobility, tasks, hours_per_day,
                 postal_code, time_window, acuity, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                who_needs_care = EXCLUDED.who_needs_care,
                age = EXCLUDED.age,
                mobility = EXCLUDED.mobility,
                tasks = EXCLUDED.tasks,
                hours_per_day = EXCLUDED.hours_per_day,
                postal_code = EXCLUDED.postal_code,
                time_window = EXCLUDED.time_window,
                acuity = EXCLUDED.acuity,
                updated_at = EXCLUDED.updated_at
            WHERE care_requests.status = 'open'
        "#;

        let result = sqlx::query(query)
            .bind(request.id)
            .bind(request.requester_id)
            .bind(&request.who_needs_care)
            .bind(request.age.map(i32::from))
            .bind(&request.mobility)
            .bind(&request.tasks)
            .bind(request.hours_per_day)
            .bind(&request.postal_code)
            .bind(&request.time_window)
            .bind(request.acuity().map(|a| a.as_str()))
            .bind(request.status.as_str())
            .bind(request.created_at)
            .bind(request.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.constraint() == Some(OPEN_REQUEST_CONSTRAINT) => {
                    StoreError::StaleState {
                        expected: "no open request".to_string(),
                        found: format!("open request for requester {}", request.requester_id),
                    }
                }
                other => StoreError::SqlxError(other),
            })?;

        // The upsert skips rows that were closed after the caller read them
        if result.rows_affected() == 0 {
            return Err(StoreError::StaleState {
                expected: CareRequestStatus::Open.as_str().to_string(),
                found: CareRequestStatus::Closed.as_str().to_string(),
            });
        }

        tracing::debug!("Saved care request {}", request.id);

        Ok(())
    }

    async fn caregiver(&self, id: Uuid) -> Result<Option<CaregiverProfile>, StoreError> {
        let query = format!("SELECT {CAREGIVER_COLUMNS} FROM caregiver_profiles WHERE id = $1");

        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        let Some(profile) = row.as_ref().map(caregiver_from_row).transpose()? else {
            return Ok(None);
        };

        Ok(self.with_availability(vec![profile]).await?.pop())
    }

    async fn caregiver_by_account(&self, account_id: Uuid) -> Result<Option<CaregiverProfile>, StoreError> {
        let query = format!("SELECT {CAREGIVER_COLUMNS} FROM caregiver_profiles WHERE account_id = $1");

        let row = sqlx::query(&query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(profile) = row.as_ref().map(caregiver_from_row).transpose()? else {
            return Ok(None);
        };

        Ok(self.with_availability(vec![profile]).await?.pop())
    }

    async fn caregivers(&self) -> Result<Vec<CaregiverProfile>, StoreError> {
        let query = format!("SELECT {CAREGIVER_COLUMNS} FROM caregiver_profiles ORDER BY id");

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        let profiles = rows
            .iter()
            .map(caregiver_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        self.with_availability(profiles).await
    }

    async fn save_caregiver(&self, profile: &CaregiverProfile) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO caregiver_profiles
                (id, account_id, display_name, category, years_experience, hourly_rate_cents,
                 skills, languages, verification, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                account_id = EXCLUDED.account_id,
                display_name = EXCLUDED.display_name,
                category = EXCLUDED.category,
                years_experience = EXCLUDED.years_experience,
                hourly_rate_cents = EXCLUDED.hourly_rate_cents,
                skills = EXCLUDED.skills,
                languages = EXCLUDED.languages,
                verification = EXCLUDED.verification,
                postal_code = EXCLUDED.postal_code
            "#,
        )
        .bind(profile.id)
        .bind(profile.account_id)
        .bind(&profile.display_name)
        .bind(profile.category.as_str())
        .bind(profile.years_experience.map(i32::from))
        .bind(profile.hourly_rate_cents)
        .bind(&profile.skills)
        .bind(&profile.languages)
        .bind(profile.verification.as_str())
        .bind(&profile.postal_code)
        .execute(&mut *tx)
        .await?;

        Self::write_availability(&mut tx, profile.id, &profile.availability).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn replace_availability(
        &self,
        profile_id: Uuid,
        slots: &[AvailabilitySlot],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM caregiver_profiles WHERE id = $1 FOR UPDATE")
            .bind(profile_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::Missing(format!("caregiver profile {profile_id}")));
        }

        Self::write_availability(&mut tx, profile_id, slots).await?;

        tx.commit().await?;

        tracing::debug!("Replaced availability for {} with {} slots", profile_id, slots.len());

        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let closed = sqlx::query(
            "UPDATE care_requests SET status = 'closed', updated_at = $2 WHERE id = $1",
        )
        .bind(booking.care_request_id)
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await?;

        if closed.rows_affected() == 0 {
            return Err(StoreError::Missing(format!("care request {}", booking.care_request_id)));
        }

        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, care_request_id, requester_id, caregiver_profile_id, caregiver_account_id,
                 start_time, end_time, total_hours, hourly_rate_cents, total_price_cents,
                 status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(booking.id)
        .bind(booking.care_request_id)
        .bind(booking.requester_id)
        .bind(booking.caregiver_profile_id)
        .bind(booking.caregiver_account_id)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.total_hours)
        .bind(booking.hourly_rate_cents)
        .bind(booking.total_price_cents)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");

        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking, StoreError> {
        let query = format!(
            "UPDATE bookings SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {BOOKING_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(next.as_str())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return booking_from_row(&row);
        }

        // Nothing matched: either the booking is gone or someone moved it first
        match self.booking(id).await? {
            Some(current) => Err(StoreError::StaleState {
                expected: expected.to_string(),
                found: current.status.to_string(),
            }),
            None => Err(StoreError::Missing(format!("booking {id}"))),
        }
    }

    async fn bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let rows = match filter {
            BookingFilter::Requester(requester_id) => {
                let query = format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings \
                     WHERE requester_id = $1 ORDER BY start_time DESC"
                );
                sqlx::query(&query)
                    .bind(requester_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            BookingFilter::Caregiver { account_id, status } => {
                let query = format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings \
                     WHERE caregiver_account_id = $1 AND status = $2 ORDER BY start_time ASC"
                );
                sqlx::query(&query)
                    .bind(account_id)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(booking_from_row).collect()
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn care_request_from_row(row: &PgRow) -> Result<CareRequest, StoreError> {
    let acuity: Option<String> = row.try_get("acuity")?;
    let status: String = row.try_get("status")?;
    let age: Option<i32> = row.try_get("age")?;

    Ok(CareRequest {
        id: row.try_get("id")?,
        requester_id: row.try_get("requester_id")?,
        who_needs_care: row.try_get("who_needs_care")?,
        age: age.map(|a| narrow(a, "age")).transpose()?,
        mobility: row.try_get("mobility")?,
        tasks: row.try_get("tasks")?,
        hours_per_day: row.try_get("hours_per_day")?,
        postal_code: row.try_get("postal_code")?,
        time_window: row.try_get("time_window")?,
        acuity: acuity.as_deref().map(parse_column::<AcuityTag>).transpose()?,
        status: parse_column::<CareRequestStatus>(&status)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn caregiver_from_row(row: &PgRow) -> Result<CaregiverProfile, StoreError> {
    let category: String = row.try_get("category")?;
    let verification: String = row.try_get("verification")?;
    let years: Option<i32> = row.try_get("years_experience")?;

    Ok(CaregiverProfile {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        display_name: row.try_get("display_name")?,
        category: parse_column::<CredentialCategory>(&category)?,
        years_experience: years.map(|y| narrow(y, "years_experience")).transpose()?,
        hourly_rate_cents: row.try_get("hourly_rate_cents")?,
        skills: row.try_get("skills")?,
        languages: row.try_get("languages")?,
        verification: parse_column::<VerificationStatus>(&verification)?,
        postal_code: row.try_get("postal_code")?,
        availability: Vec::new(),
    })
}

fn booking_from_row(row: &PgRow) -> Result<Booking, StoreError> {
    let status: String = row.try_get("status")?;

    Ok(Booking {
        id: row.try_get("id")?,
        care_request_id: row.try_get("care_request_id")?,
        requester_id: row.try_get("requester_id")?,
        caregiver_profile_id: row.try_get("caregiver_profile_id")?,
        caregiver_account_id: row.try_get("caregiver_account_id")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        total_hours: row.try_get("total_hours")?,
        hourly_rate_cents: row.try_get("hourly_rate_cents")?,
        total_price_cents: row.try_get("total_price_cents")?,
        status: parse_column::<BookingStatus>(&status)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn parse_column<T>(value: &str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn narrow<S, T>(value: S, column: &str) -> Result<T, StoreError>
where
    S: Copy + std::fmt::Display,
    T: TryFrom<S>,
{
    T::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} out of range: {value}")))
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::CareError;
use crate::models::{CareRequest, IntakeSubmission};

/// Merge a submission into the requester's open care request
///
/// A present field overwrites, an absent field keeps the stored value.
/// Without an open request a new one is started, which needs
/// `who_needs_care`. Acuity is recomputed from the merged fields.
pub fn merge_submission(
    existing: Option<CareRequest>,
    requester_id: Uuid,
    submission: IntakeSubmission,
    now: DateTime<Utc>,
) -> Result<CareRequest, CareError> {
    let mut request = match existing {
        Some(request) => {
            if !request.is_open() {
                return Err(CareError::Validation(
                    "care request is closed for further changes".to_string(),
                ));
            }
            request
        }
        None => {
            let who = submission
                .who_needs_care
                .as_deref()
                .map(str::trim)
                .filter(|who| !who.is_empty())
                .ok_or_else(|| CareError::Validation("whoNeedsCare is required".to_string()))?;
            CareRequest::new(requester_id, who, now)
        }
    };

    if let Some(who) = submission.who_needs_care.map(|w| w.trim().to_string()) {
        if !who.is_empty() {
            request.who_needs_care = who;
        }
    }
    if let Some(age) = submission.age {
        request.age = Some(age);
    }
    if let Some(mobility) = submission.mobility {
        request.mobility = Some(mobility);
    }
    if let Some(tasks) = submission.tasks {
        request.tasks = normalize_tasks(tasks);
    }
    if let Some(hours) = submission.hours_per_day {
        request.hours_per_day = Some(validate_hours(hours)?);
    }
    if let Some(postal_code) = submission.postal_code {
        request.postal_code = Some(postal_code.trim().to_string());
    }
    if let Some(window) = submission.time_window {
        request.time_window = Some(window);
    }

    request.refresh_acuity();
    request.updated_at = now;

    Ok(request)
}

/// Trim, drop blanks and de-duplicate case-insensitively, keeping the
/// first spelling seen
pub fn normalize_tasks(tasks: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tasks
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

fn validate_hours(hours: Decimal) -> Result<Decimal, CareError> {
    if hours <= Decimal::ZERO || hours > Decimal::from(24) {
        return Err(CareError::Validation(format!(
            "hoursPerDay must be within (0, 24], got {hours}"
        )));
    }
    Ok(hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AcuityTag;

    fn submission() -> IntakeSubmission {
        IntakeSubmission {
            who_needs_care: Some("Mother".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_request_requires_who_needs_care() {
        let err = merge_submission(None, Uuid::new_v4(), IntakeSubmission::default(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CareError::Validation(_)));
    }

    #[test]
    fn test_absent_fields_preserve_prior_values() {
        let requester = Uuid::new_v4();
        let first = merge_submission(
            None,
            requester,
            IntakeSubmission {
                mobility: Some("walker".to_string()),
                postal_code: Some("10001".to_string()),
                hours_per_day: Some(Decimal::from(6)),
                ..submission()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(first.acuity(), Some(AcuityTag::Medium));

        let second = merge_submission(
            Some(first.clone()),
            requester,
            IntakeSubmission {
                tasks: Some(vec!["Bathing".to_string()]),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.who_needs_care, "Mother");
        assert_eq!(second.mobility.as_deref(), Some("walker"));
        assert_eq!(second.postal_code.as_deref(), Some("10001"));
        assert_eq!(second.hours_per_day, Some(Decimal::from(6)));
        // Recomputed from merged fields, not just the new submission
        assert_eq!(second.acuity(), Some(AcuityTag::High));
    }

    #[test]
    fn test_closed_request_is_not_merged() {
        let mut request = merge_submission(None, Uuid::new_v4(), submission(), Utc::now()).unwrap();
        request.status = crate::models::CareRequestStatus::Closed;

        let err = merge_submission(Some(request), Uuid::new_v4(), submission(), Utc::now()).unwrap_err();
        assert!(matches!(err, CareError::Validation(_)));
    }

    #[test]
    fn test_rejects_out_of_range_hours() {
        let err = merge_submission(
            None,
            Uuid::new_v4(),
            IntakeSubmission {
                hours_per_day: Some(Decimal::from(25)),
                ..submission()
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CareError::Validation(_)));
    }

    #[test]
    fn test_tasks_are_deduplicated() {
        let tasks = normalize_tasks(vec![
            "Meals".to_string(),
            "meals ".to_string(),
            " ".to_string(),
            "Laundry".to_string(),
        ]);
        assert_eq!(tasks, vec!["Meals", "Laundry"]);
    }
}

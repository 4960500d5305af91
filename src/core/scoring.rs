use std::collections::HashSet;

use crate::models::{AcuityTag, CareRequest, CaregiverProfile, MatchLabel};

/// Points per caregiver skill that matches a requested task. Not capped
/// per match; only the final total is clamped.
pub const TASK_MATCH_POINTS: u32 = 12;
pub const EXPERIENCE_POINTS_PER_YEAR: u32 = 3;
pub const EXPERIENCE_CAP: u32 = 20;
pub const HIGH_ACUITY_POINTS: u32 = 5;
pub const MEDIUM_ACUITY_POINTS: u32 = 3;
pub const VERIFIED_POINTS: u32 = 10;
pub const MAX_SCORE: u32 = 100;

pub const HIGH_LABEL_THRESHOLD: u8 = 70;
pub const MEDIUM_LABEL_THRESHOLD: u8 = 40;

/// Calculate a fitness score (0-100) for a caregiver against a care request
///
/// Scoring formula:
/// score = min(100,
///     12 * matching_skills +              # case-insensitive skill/task overlap
///     min(3 * years_experience, 20) +     # experience, if known
///     acuity_bonus +                      # HIGH 5, MEDIUM 3
///     10 if verification approved
/// )
pub fn score_caregiver(request: &CareRequest, caregiver: &CaregiverProfile) -> u8 {
    let tasks: HashSet<String> = request
        .tasks
        .iter()
        .map(|t| t.trim().to_lowercase())
        .collect();

    let matching_skills = caregiver
        .skills
        .iter()
        .filter(|skill| tasks.contains(&skill.trim().to_lowercase()))
        .count() as u32;

    let mut score = matching_skills.saturating_mul(TASK_MATCH_POINTS);

    if let Some(years) = caregiver.years_experience {
        score = score.saturating_add((years as u32 * EXPERIENCE_POINTS_PER_YEAR).min(EXPERIENCE_CAP));
    }

    score = score.saturating_add(match request.acuity() {
        Some(AcuityTag::High) => HIGH_ACUITY_POINTS,
        Some(AcuityTag::Medium) => MEDIUM_ACUITY_POINTS,
        Some(AcuityTag::Low) | None => 0,
    });

    if caregiver.is_approved() {
        score = score.saturating_add(VERIFIED_POINTS);
    }

    score.min(MAX_SCORE) as u8
}

impl MatchLabel {
    /// Map a score to its display label
    pub fn from_score(score: u8) -> Self {
        if score >= HIGH_LABEL_THRESHOLD {
            MatchLabel::High
        } else if score >= MEDIUM_LABEL_THRESHOLD {
            MatchLabel::Medium
        } else {
            MatchLabel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchLabel::High => "High",
            MatchLabel::Medium => "Medium",
            MatchLabel::Low => "Low",
        }
    }
}

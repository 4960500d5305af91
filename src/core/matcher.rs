use crate::core::{
    pricing::CategoryDefaultRate,
    proximity::estimate_distance,
    scoring::score_caregiver,
};
use crate::models::{CareRequest, CaregiverProfile, MatchLabel, RankedCaregiver};

/// Number of caregivers returned for a request
pub const DEFAULT_RESULT_CAP: usize = 5;

/// Result of ranking caregivers against one request
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<RankedCaregiver>,
    pub total_candidates: usize,
}

/// Ranks caregivers for a care request
///
/// Every caregiver is scored; results are ordered by score (descending),
/// then by postal-code proximity (ascending), then truncated to the cap.
/// Proximity only breaks ties and never changes a score.
#[derive(Debug, Clone)]
pub struct Matcher {
    result_cap: usize,
    display_rates: CategoryDefaultRate,
}

impl Matcher {
    pub fn new(result_cap: usize, display_rates: CategoryDefaultRate) -> Self {
        Self {
            result_cap,
            display_rates,
        }
    }

    pub fn display_rates(&self) -> &CategoryDefaultRate {
        &self.display_rates
    }

    pub fn result_cap(&self) -> usize {
        self.result_cap
    }

    /// Score, order and cap `caregivers` for `request`
    pub fn rank_caregivers(&self, request: &CareRequest, caregivers: &[CaregiverProfile]) -> MatchResult {
        let total_candidates = caregivers.len();

        let mut ranked: Vec<RankedCaregiver> = caregivers
            .iter()
            .map(|caregiver| {
                let score = score_caregiver(request, caregiver);

                RankedCaregiver {
                    caregiver_profile_id: caregiver.id,
                    account_id: caregiver.account_id,
                    display_name: caregiver.display_name.clone(),
                    category: caregiver.category,
                    years_experience: caregiver.years_experience,
                    hourly_rate_cents: self.display_rates.display_rate(caregiver),
                    skills: caregiver.skills.clone(),
                    languages: caregiver.languages.clone(),
                    match_score: score,
                    match_label: MatchLabel::from_score(score),
                    proximity: estimate_distance(
                        request.postal_code.as_deref(),
                        caregiver.postal_code.as_deref(),
                    ),
                }
            })
            .collect();

        // Stable sort keeps input order among exact ties
        ranked.sort_by(|a, b| {
            b.match_score
                .cmp(&a.match_score)
                .then_with(|| a.proximity.cmp(&b.proximity))
        });

        ranked.truncate(self.result_cap);

        tracing::debug!(
            "Ranked {} caregivers for request {}, returning {}",
            total_candidates,
            request.id,
            ranked.len()
        );

        MatchResult {
            matches: ranked,
            total_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_RESULT_CAP, CategoryDefaultRate::default())
    }
}

// Core algorithm exports
pub mod acuity;
pub mod intake;
pub mod lifecycle;
pub mod matcher;
pub mod pricing;
pub mod proximity;
pub mod scoring;

pub use acuity::classify_acuity;
pub use intake::merge_submission;
pub use lifecycle::{authorize_transition, is_valid_edge, open_booking, Transition};
pub use matcher::{MatchResult, Matcher};
pub use pricing::{price_engagement, CategoryDefaultRate, EngagementTerms, FlatDefaultRate, PricingCalculator};
pub use proximity::estimate_distance;
pub use scoring::score_caregiver;

//! CareMatch - care request intake, caregiver matching and booking engine
//!
//! This library holds the domain model, the pure matching/pricing/lifecycle
//! logic, the storage seam with its in-memory and PostgreSQL backends, and
//! the HTTP surface that exposes them.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{classify_acuity, estimate_distance, score_caregiver, Matcher, PricingCalculator};
pub use error::{CareError, ErrorKind, StoreError};
pub use models::{Actor, Booking, BookingStatus, CareRequest, CaregiverProfile, RankedCaregiver, Role};
pub use services::{CareService, CareStore, MemoryStore};

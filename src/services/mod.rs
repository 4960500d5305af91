// Service exports
pub mod care;
pub mod memory;
pub mod postgres;
pub mod store;

pub use care::{CareService, RequestMatches};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::{BookingFilter, CareStore};

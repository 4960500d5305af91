// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AcuityTag, Actor, AvailabilitySlot, Booking, BookingScope, BookingStatus, CareRequest,
    CareRequestStatus, CaregiverProfile, CredentialCategory, MatchLabel, RankedCaregiver, Role,
    VerificationStatus, Weekday, MINUTES_PER_DAY, WEEK_START,
};
pub use requests::{
    AvailabilitySlotInput, CaregiverProfileUpdate, CreateBookingRequest, IntakeSubmission,
    ListBookingsQuery, MatchesQuery, RegisterCaregiverRequest, ReplaceAvailabilityRequest,
    TransitionBookingRequest,
};
pub use responses::{
    BookingResponse, BookingsResponse, CaregiverProfileResponse, ErrorResponse, HealthResponse,
    IntakeResponse, MatchesResponse, RepriceResponse,
};

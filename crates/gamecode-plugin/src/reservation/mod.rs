//! Reservation storage: pending custom game code creations keyed by client.

pub mod store;

pub use store::{
    Reservation, ReservationId, ReservationStore, DEFAULT_RESERVATION_TTL,
    MAX_RESERVATION_TTL,
};

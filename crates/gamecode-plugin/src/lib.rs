//! gamecode-plugin: Custom game code reservations for a game server worker.
//!
//! A client that asks to create a room is disconnected and asked to join
//! again with a code of its own choosing. Its requested settings wait in a
//! [`ReservationStore`] keyed by client fingerprint until the join arrives,
//! the client cancels, or the reservation expires.

pub mod bridge;
pub mod config;
pub mod host;
pub mod plugin;
pub mod reservation;

pub use bridge::{BeforeCreateEvent, BeforeJoinEvent, EventBridge, JoinOutcome};
pub use config::PluginConfig;
pub use host::{ClientConnection, MemoryConnection, MemoryRoom, MemoryWorker, Worker};
pub use plugin::{CustomGameCodePlugin, PLUGIN_NAME};
pub use reservation::{Reservation, ReservationId, ReservationStore};

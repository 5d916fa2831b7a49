//! gamecode-core: Shared types for custom game code reservations.
//!
//! Provides the game code codec (4-letter V1 and 6-letter V2 codes),
//! client identity and fingerprint derivation, and the common error type.

pub mod code;
pub mod error;
pub mod identity;

// Re-export commonly used items at crate root.
pub use code::{GameCode, CANCEL_CODE};
pub use error::{GamecodeError, GamecodeResult};
pub use identity::{fingerprint, ClientInfo, Fingerprint, ModInfo};

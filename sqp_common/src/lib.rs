mod cents;

pub mod helpers;
pub mod op;
mod secret;
pub mod snapshot;

pub use cents::{Cents, CentsConversionError, BASIS_POINTS};
pub use secret::Secret;
pub use snapshot::{GameSnapshot, GameStatus, SnapshotError};

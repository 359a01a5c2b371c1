//! Roster engine.
//!
//! Owns the persisted roster of authorized identities and the feed
//! reconciliation logic. Every public operation runs as its own
//! short-lived database transaction; nothing here talks to the chat
//! platform.

pub use error::EngineError;
pub use ops::{Engine, EngineBuilder};
pub use roster::Model as RosterEntry;
pub use sync::{Candidate, Change, ChangeKind, FeedRow};

mod error;
mod ops;
pub mod roster;
mod sync;

type ResultEngine<T> = Result<T, EngineError>;

//! Bot-level error taxonomy.
//!
//! Feed fetch failures skip the whole sync invocation; permission
//! failures are reported back to the caller; everything else bubbles
//! up to the dispatch loop, which logs it.

use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("feed fetch failed: {0}")]
    FeedFetch(String),
    #[error("missing required role \"{0}\"")]
    PermissionDenied(String),
    #[error(transparent)]
    Engine(#[from] engine::EngineError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

//! Process-wide message evaluation cache.
//!
//! Parsed messages remember their crypto evaluation (signature and
//! encryption state). Any command that imports, receives or signs keys makes
//! those evaluations stale, so it must call [`ParseCache::invalidate`] after
//! the mutating call returns and before its result reaches the caller.

use serde::{Deserialize, Serialize};

/// Which cached evaluations to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheScope {
    /// Only evaluations that involved OpenPGP/MIME content.
    PgpMime,
    /// Everything.
    All,
}

impl std::fmt::Display for CacheScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PgpMime => write!(f, "pgpmime"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Invalidation contract for the shared parse cache.
pub trait ParseCache: Send + Sync {
    /// Drop every cached evaluation in `scope`.
    fn invalidate(&self, scope: CacheScope);
}

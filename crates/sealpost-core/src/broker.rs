//! Scoped outbound network access.
//!
//! Any fetch of remote key material happens while a [`ConnectionGuard`] is
//! alive. The guard releases its capability when dropped, whether the fetch
//! succeeded, failed, or unwound.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A kind of outbound connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetCapability {
    /// Plain or TLS HTTP requests to arbitrary hosts.
    OutgoingHttp,
}

impl std::fmt::Display for NetCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutgoingHttp => write!(f, "outgoing_http"),
        }
    }
}

/// Errors from the connection broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The capability is disabled by policy.
    #[error("outbound capability '{0}' is not permitted")]
    NotPermitted(NetCapability),
}

/// Grants outbound network capabilities according to policy.
#[derive(Debug, Default)]
pub struct ConnectionBroker {
    allowed: HashSet<NetCapability>,
    active: AtomicUsize,
}

impl ConnectionBroker {
    /// Create a broker permitting exactly `allowed`.
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = NetCapability>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            active: AtomicUsize::new(0),
        }
    }

    /// A broker that refuses everything.
    #[must_use]
    pub fn offline() -> Self {
        Self::default()
    }

    /// Acquire every capability in `need` for the lifetime of the guard.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::NotPermitted`] for the first capability the
    /// policy does not allow; nothing is acquired in that case.
    pub fn acquire(&self, need: &[NetCapability]) -> Result<ConnectionGuard<'_>, BrokerError> {
        if let Some(denied) = need.iter().find(|c| !self.allowed.contains(c)) {
            return Err(BrokerError::NotPermitted(*denied));
        }
        self.active.fetch_add(1, Ordering::SeqCst);
        debug!(capabilities = ?need, "outbound capability acquired");
        Ok(ConnectionGuard {
            broker: self,
            held: need.to_vec(),
        })
    }

    /// Number of guards currently alive.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Holds outbound capabilities until dropped.
#[derive(Debug)]
pub struct ConnectionGuard<'a> {
    broker: &'a ConnectionBroker,
    held: Vec<NetCapability>,
}

impl ConnectionGuard<'_> {
    /// Capabilities held by this guard.
    #[must_use]
    pub fn capabilities(&self) -> &[NetCapability] {
        &self.held
    }
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        let _ = self
            .broker
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            });
        debug!(capabilities = ?self.held, "outbound capability released");
    }
}

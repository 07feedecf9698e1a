//! Fetching key material by URL.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use sealpost_core::{ConnectionBroker, NetCapability};
use tracing::debug;
use url::Url;

use crate::error::{CommandError, CommandResult};

/// Retrieves armored key material from a URL.
pub trait KeyFetcher: Send + Sync {
    /// Fetch the body at `url`.
    ///
    /// # Errors
    ///
    /// Fails if the URL is unusable, outbound HTTP is not permitted, or the
    /// transfer fails.
    fn fetch(&self, url: &str) -> CommandResult<Vec<u8>>;
}

/// Blocking HTTP(S) fetcher gated by a [`ConnectionBroker`].
pub struct HttpKeyFetcher {
    broker: Arc<ConnectionBroker>,
    timeout: Duration,
    max_bytes: u64,
}

impl HttpKeyFetcher {
    /// Create a fetcher.
    #[must_use]
    pub fn new(broker: Arc<ConnectionBroker>, timeout: Duration, max_bytes: u64) -> Self {
        Self {
            broker,
            timeout,
            max_bytes,
        }
    }
}

impl KeyFetcher for HttpKeyFetcher {
    fn fetch(&self, raw: &str) -> CommandResult<Vec<u8>> {
        let url = parse_key_url(raw)?;
        let _guard = self.broker.acquire(&[NetCapability::OutgoingHttp])?;
        debug!(url = %url, "fetching key");

        let fetch_err = |source| CommandError::Fetch {
            url: raw.to_owned(),
            source,
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(fetch_err)?;
        let response = client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(fetch_err)?;

        let mut body = Vec::new();
        response
            .take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|source| CommandError::FetchRead {
                url: raw.to_owned(),
                source,
            })?;
        if u64::try_from(body.len()).unwrap_or(u64::MAX) > self.max_bytes {
            return Err(CommandError::FetchTooLarge {
                url: raw.to_owned(),
                limit: self.max_bytes,
            });
        }
        Ok(body)
    }
}

/// Accept only absolute `http` and `https` URLs.
fn parse_key_url(raw: &str) -> CommandResult<Url> {
    let url = Url::parse(raw).map_err(|e| CommandError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CommandError::InvalidUrl {
            url: raw.to_owned(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

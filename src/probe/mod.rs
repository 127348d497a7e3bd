//! Availability prober
//!
//! Polls a freshly provisioned HTTP endpoint until it answers with anything
//! below 500 or the attempt budget runs out. Newly created web apps answer
//! 403/404 while they warm up; those count as reachable. Only transport
//! failures and 5xx responses trigger a retry, so a permanently
//! misconfigured app that keeps returning 404 also counts as reachable.
//!
//! The wait between attempts is fixed. It does not grow.

mod transport;

pub use transport::{
    HttpTransport, ProbeResponse, Sleeper, ThreadSleeper, Transport, TransportError,
};

use reqwest::Url;
use serde::Serialize;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Attempt budget and fixed wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    max_attempts: u32,
    interval: Duration,
}

impl ProbePolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::InvalidPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            interval,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Longest time a probe can spend sleeping.
    pub fn worst_case_wait(&self) -> Duration {
        self.interval * (self.max_attempts - 1)
    }
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Outcome of one probe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub succeeded: bool,
    /// Most recent status code observed, if any request got a response
    pub last_status: Option<u16>,
    pub attempts: u32,
    /// Only set on success: whether the accepted response came over TLS
    pub secure_transport: Option<bool>,
}

/// `[100, 500)` means the endpoint is up, even if it is not serving yet.
pub fn is_available_status(status: u16) -> bool {
    (100..500).contains(&status)
}

pub struct Prober<T, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
}

impl Prober<HttpTransport, ThreadSleeper> {
    pub fn http() -> Result<Self> {
        Ok(Self::new(HttpTransport::new()?, ThreadSleeper))
    }
}

impl<T: Transport, S: Sleeper> Prober<T, S> {
    pub fn new(transport: T, sleeper: S) -> Self {
        Self { transport, sleeper }
    }

    /// Poll `url` under `policy`. Never fails; see [`ProbeResult::succeeded`].
    pub fn probe(&self, url: &Url, policy: &ProbePolicy) -> ProbeResult {
        let max = policy.max_attempts();
        let mut last_status = None;

        for attempt in 1..=max {
            match self.transport.get(url) {
                Ok(response) => {
                    last_status = Some(response.status);
                    if is_available_status(response.status) {
                        tracing::info!(
                            status = response.status,
                            attempt,
                            "endpoint {url} is accessible (status {})",
                            response.status
                        );
                        return ProbeResult {
                            succeeded: true,
                            last_status,
                            attempts: attempt,
                            secure_transport: Some(response.is_secure()),
                        };
                    }
                    tracing::debug!(status = response.status, attempt, "server error from {url}");
                }
                Err(e) => {
                    tracing::debug!(attempt, "request to {url} failed: {e}");
                }
            }

            if attempt < max {
                tracing::info!(
                    "attempt {attempt}/{max} failed to access {url}, retrying in {:?}...",
                    policy.interval()
                );
                self.sleeper.sleep(policy.interval());
            }
        }

        tracing::warn!("failed to access {url} after {max} attempts");
        ProbeResult {
            succeeded: false,
            last_status,
            attempts: max,
            secure_transport: None,
        }
    }
}

//! Shared blocking HTTP client and the retry policy applied to every
//! outbound call.
//!
//! All GitHub and Notion requests go through [`send_with_retry`], so they share
//! one timeout and one backoff schedule. Only transport failures are retried;
//! any HTTP status, including 5xx, is returned to the caller as-is. A timeout
//! is retried only for [`Replay::Safe`] requests.

use anyhow::{Context, Result};
use std::time::Duration;

/// User-Agent sent with every request. GitHub rejects requests without one.
pub const USER_AGENT: &str = concat!("github-daily-report/", env!("CARGO_PKG_VERSION"));

/// Timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Backoff schedule for transient transport errors (in seconds).
/// Total wait: 1 + 2 + 4 = 7 seconds over four attempts.
const RETRY_DELAYS: &[u64] = &[1, 2, 4];

/// Delays between attempts. An empty schedule means a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delays: RETRY_DELAYS.iter().map(|s| Duration::from_secs(*s)).collect(),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self { delays: Vec::new() }
    }

    pub fn with_delays(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }
}

/// Build the blocking client used for all API calls.
pub fn build_client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build HTTP client")
}

/// Which transport failures a request may be sent again after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// Reads: retry on connection errors and timeouts.
    Safe,
    /// Writes that create or append: retry only when the connection was never
    /// established.
    ConnectOnly,
}

impl Replay {
    fn allows(self, err: &reqwest::Error) -> bool {
        match self {
            Replay::Safe => err.is_timeout() || err.is_connect(),
            Replay::ConnectOnly => err.is_connect(),
        }
    }
}

/// Send a request built by `build`, retrying the transport errors `replay`
/// allows according to `policy`.
///
/// The builder closure runs once per attempt because a
/// `reqwest::blocking::RequestBuilder` is consumed by `send`.
pub fn send_with_retry<F>(
    policy: &RetryPolicy,
    replay: Replay,
    url: &str,
    mut build: F,
) -> Result<reqwest::blocking::Response>
where
    F: FnMut() -> reqwest::blocking::RequestBuilder,
{
    let mut attempt = 0usize;
    loop {
        crate::output::verbose(&format!("request {url} (attempt {})", attempt + 1));
        match build().send() {
            Ok(resp) => return Ok(resp),
            Err(err) if replay.allows(&err) && attempt < policy.delays.len() => {
                let delay = policy.delays[attempt];
                crate::output::verbose(&format!(
                    "transient error for {url}: {err}; retrying in {}s",
                    delay.as_secs()
                ));
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to connect to {url}"));
            }
        }
    }
}

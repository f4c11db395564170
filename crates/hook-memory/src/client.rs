//! Blocking HTTP client for the memoryd store API.
//!
//! One client per hook run: connect, a handful of writes, close. Timeouts
//! are sized for loopback latency so a wedged daemon cannot eat the
//! caller's budget.

use crate::learning::Learning;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Store client errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure (connect, send, HTTP status)
    #[error("store request failed: {0}")]
    Transport(#[from] ureq::Error),

    /// Response body did not decode
    #[error("store response malformed: {0}")]
    Malformed(#[from] std::io::Error),
}

/// Structured write response from the store.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteOutcome {
    /// Application-level rejection reason, if any
    #[serde(default)]
    pub error: Option<String>,
}

/// Connected client for one hook run.
#[derive(Debug)]
pub struct StoreClient {
    agent: ureq::Agent,
    base_url: String,
}

impl StoreClient {
    /// Connect to the store at `base_url` and verify it responds.
    pub fn connect(base_url: &str) -> Result<Self, StoreError> {
        let agent = ureq::builder()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build();
        let base_url = base_url.trim_end_matches('/').to_string();

        agent.get(&format!("{base_url}/health")).call()?;
        Ok(Self { agent, base_url })
    }

    /// Write one record of the given kind.
    ///
    /// A `WriteOutcome` carrying an `error` is an application-level
    /// rejection, not a transport fault; the caller decides how loudly to
    /// complain.
    pub fn write(&self, kind: &str, learning: &Learning) -> Result<WriteOutcome, StoreError> {
        let response = self
            .agent
            .post(&format!("{}/api/{kind}", self.base_url))
            .send_json(learning)?;
        Ok(response.into_json()?)
    }

    /// Release the connection pool.
    ///
    /// Dropping the client has the same effect; the explicit form exists
    /// so callers can surface close-time faults if they care to.
    pub fn close(self) -> Result<(), StoreError> {
        Ok(())
    }
}

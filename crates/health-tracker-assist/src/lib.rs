//! Outbound services for the health tracker.
//!
//! - [`client`]: chat assistant and vitals extraction over an OpenAI-style API
//! - [`notify`]: SMS medication reminders over a Twilio-style API
//! - [`prompts`], [`extraction`]: prompt building and reply parsing, no I/O
//!
//! Nothing returned from here is trusted. Extracted vitals come back as a
//! range-checked [`VitalsHint`](health_tracker_core::models::VitalsHint) that
//! can only prefill an entry form.

pub mod client;
pub mod extraction;
pub mod notify;
pub mod prompts;

pub use client::*;
pub use extraction::*;
pub use notify::*;
pub use prompts::*;

use thiserror::Error;

/// Errors from outbound calls and reply parsing.
#[derive(Error, Debug)]
pub enum AssistError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Service not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for AssistError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AssistError::Timeout(e.to_string())
        } else {
            AssistError::Http(e.to_string())
        }
    }
}

pub type AssistResult<T> = Result<T, AssistError>;

/// Fail with `Status` unless the response is 2xx.
pub(crate) async fn ensure_success(response: reqwest::Response) -> AssistResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "Upstream call failed");
    Err(AssistError::Status {
        status: status.as_u16(),
        body,
    })
}

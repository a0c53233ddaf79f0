//! Netlify deploy API client.
//!
//! Uploads a zipped site to Netlify's deploy-creation endpoint and polls
//! the deploy-status endpoint until the deployment is live. Async HTTP via
//! `reqwest` with Bearer token authentication.

pub mod client;
pub mod poll;
pub mod types;

pub use client::Client;
pub use poll::{DEFAULT_POLL_INTERVAL, PollPolicy, poll_until_ready};
pub use types::DeploymentHandle;

/// Errors from the Netlify client.
#[derive(Debug, thiserror::Error)]
pub enum NetlifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid API token")]
    InvalidToken,

    #[error("cancelled")]
    Cancelled,

    #[error("deploy not ready after {attempts} poll attempts")]
    PollBudgetExhausted { attempts: u32 },
}

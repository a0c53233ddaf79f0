//! Deploy readiness polling.
//!
//! Repeatedly queries the deploy-status endpoint until the provider
//! reports `"ready"`. Transient failures (transport errors, unparsable
//! bodies, unknown states) are non-terminal: log, wait, try again.

use std::time::Duration;

use sitedrop_report::{ReportEvent, send_event};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::NetlifyError;
use crate::client::Client;
use crate::types::DeploymentHandle;

/// Delay between consecutive status requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// The only terminal deploy state.
const STATE_READY: &str = "ready";

/// Bounds for a poll loop.
///
/// The default matches the provider's eventual-consistency model: poll
/// every second with no attempt limit. Callers that need a bound set
/// `max_attempts`.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

/// Polls the deploy status until it reaches `"ready"`.
///
/// Attempts are strictly sequential: one GET, then `policy.interval` of
/// sleep, regardless of what the response looked like. Transport errors
/// and malformed bodies are treated as "still pending"; each one is
/// logged and surfaced as a diagnostic [`ReportEvent::Error`] so a stuck
/// deployment stays observable. Returns when ready, when `cancel` fires,
/// or when a bounded policy runs out of attempts.
pub async fn poll_until_ready(
    client: &Client,
    handle: &DeploymentHandle,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    events_tx: &mpsc::Sender<ReportEvent>,
) -> Result<(), NetlifyError> {
    let mut attempts: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(NetlifyError::Cancelled);
        }

        attempts += 1;
        match client.deploy_state(&handle.id).await {
            Ok(Some(state)) if state == STATE_READY => {
                info!(deploy_id = %handle.id, attempts, "deploy ready");
                return Ok(());
            }
            Ok(Some(state)) => {
                trace!(deploy_id = %handle.id, %state, "deploy not ready");
            }
            Ok(None) => {
                debug!(deploy_id = %handle.id, "status response not recognized; still waiting");
                send_event(
                    events_tx,
                    ReportEvent::error(
                        "Deploy status unreadable",
                        format!("deploy {}: response had no usable state", handle.id),
                    ),
                )
                .await;
            }
            Err(e) => {
                warn!(deploy_id = %handle.id, error = %e, "status request failed; still waiting");
                send_event(
                    events_tx,
                    ReportEvent::error("Deploy status request failed", e.to_string()),
                )
                .await;
            }
        }

        if let Some(max) = policy.max_attempts
            && attempts >= max
        {
            return Err(NetlifyError::PollBudgetExhausted { attempts });
        }

        tokio::select! {
            _ = tokio::time::sleep(policy.interval) => {}
            _ = cancel.cancelled() => return Err(NetlifyError::Cancelled),
        }
    }
}

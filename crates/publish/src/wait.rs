//! Bounded predicate polling.

use std::time::Duration;

use tokio::time::Instant;

/// Checks `condition` every `interval` until it holds or `timeout`
/// elapses. Returns whether the condition was observed true.
///
/// The deploy poll loop deliberately does not use this: readiness polling
/// is unbounded by default and bounded through `PollPolicy` instead.
pub async fn wait_until<F>(mut condition: F, timeout: Duration, interval: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;

    loop {
        if condition() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

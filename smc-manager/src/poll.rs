//! A small reusable "try, then sleep" polling primitive, grounded on
//! `original_source/demos/block_loop.py`'s fixed-interval loop. Shared by
//! the sender's refund watchdog and the recipient's deadline-preempted
//! payment wait (§5 suspension points (b)/(c)/(d)).

use std::future::Future;
use std::time::Duration;

/// The sender's refund watchdog back-off (§4.4).
pub const REFUND_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The recipient's bounded wait on the next payment frame, so the
/// deadline timer gets CPU between messages (§5 suspension point (d)).
pub const PAYMENT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Calls `attempt` repeatedly until it returns `Some(_)`, sleeping
/// `interval` between calls that return `None`.
pub async fn poll_until<F, Fut, T>(interval: Duration, mut attempt: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    loop {
        if let Some(value) = attempt().await {
            return value;
        }
        tokio::time::sleep(interval).await;
    }
}

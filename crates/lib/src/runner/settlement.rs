use std::{future::Future, time::Duration};
use tokio::time::{sleep, Instant};

use crate::error::SuiteError;

/// Polls `predicate` until it returns `true`, sleeping `poll_interval`
/// between attempts. Fails with [`SuiteError::SettlementTimeout`] once
/// `max_wait` has elapsed without the predicate holding.
///
/// Errors from the predicate abort the wait immediately.
pub async fn await_settlement<F, Fut>(
    what: &str,
    mut predicate: F,
    max_wait: Duration,
    poll_interval: Duration,
) -> Result<(), SuiteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, SuiteError>>,
{
    let started = Instant::now();

    loop {
        if predicate().await? {
            tracing::debug!("{what} settled after {:?}", started.elapsed());
            return Ok(());
        }

        let waited = started.elapsed();
        if waited >= max_wait {
            return Err(SuiteError::SettlementTimeout { what: what.to_string(), waited });
        }

        sleep(poll_interval.min(max_wait - waited)).await;
    }
}

//! Polling controller
//!
//! One timer per screen. The first refresh fires as soon as the client is
//! ready; after that the screen ticks at its configured interval while it is
//! visible. Becoming visible again fires one refresh immediately and
//! restarts the interval. Ticks go through the same hooks as manual
//! refreshes, so a scheduled tick never stacks on top of a user action.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::PollConfig;
use crate::infrastructure::runtime::fetcher::{DataFetcher, RefreshOutcome};
use crate::infrastructure::runtime::liveness::Liveness;

/// What a poller keeps fresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Stats and the recent transaction list
    Global,
    Account(String),
    TransactionDetail(String),
}

impl Screen {
    pub fn period(&self, poll: &PollConfig) -> Duration {
        let secs = match self {
            Screen::Global => poll.global_secs,
            Screen::Account(_) | Screen::TransactionDetail(_) => poll.detail_secs,
        };
        Duration::from_secs(secs.max(1))
    }
}

/// A running poller. Dropping it stops future ticks and discards responses
/// to ticks already dispatched.
pub struct PollHandle {
    visible: watch::Sender<bool>,
    liveness: Liveness,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Foreground or background the screen.
    pub fn set_visible(&self, visible: bool) {
        self.visible.send_if_modified(|current| {
            let changed = *current != visible;
            *current = visible;
            changed
        });
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    pub fn liveness(&self) -> &Liveness {
        &self.liveness
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.liveness.kill();
        self.task.abort();
    }
}

/// Start polling `screen`. Must be called inside a Tokio runtime.
pub fn spawn_poller(fetcher: Arc<DataFetcher>, screen: Screen) -> PollHandle {
    let (visible, visible_rx) = watch::channel(true);
    let liveness = Liveness::new();
    log::debug!("starting poller for {screen:?}");
    let task = tokio::spawn(run(fetcher, screen, visible_rx, liveness.clone()));
    PollHandle {
        visible,
        liveness,
        task,
    }
}

async fn run(
    fetcher: Arc<DataFetcher>,
    screen: Screen,
    mut visible: watch::Receiver<bool>,
    liveness: Liveness,
) {
    let ctx = Arc::clone(fetcher.context());
    let retry = ctx.config().retry_on_failure;
    let retry_delay = ctx.config().retry_delay();
    let period = screen.period(&ctx.config().poll);
    let mut ready = ctx.ready();

    // Nothing to poll until a client exists
    loop {
        if *ready.borrow_and_update() {
            break;
        }
        if retry && ctx.client().is_ok() {
            break;
        }
        tokio::select! {
            _ = ready.changed() => {}
            _ = tokio::time::sleep(retry_delay), if retry => {
                log::debug!("retrying client initialization");
            }
        }
    }
    ready.mark_unchanged();

    loop {
        while !*visible.borrow_and_update() {
            if visible.changed().await.is_err() {
                return;
            }
        }

        dispatch(&fetcher, &screen, &liveness);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => dispatch(&fetcher, &screen, &liveness),
                changed = visible.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !*visible.borrow_and_update() {
                        log::debug!("{screen:?} hidden, pausing");
                        break;
                    }
                }
                changed = ready.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if *ready.borrow_and_update() {
                        dispatch(&fetcher, &screen, &liveness);
                        ticker.reset();
                    }
                }
            }
        }
    }
}

/// Spawned so that stopping the poller never cancels a request in flight.
fn dispatch(fetcher: &Arc<DataFetcher>, screen: &Screen, liveness: &Liveness) {
    let fetcher = Arc::clone(fetcher);
    let screen = screen.clone();
    let liveness = liveness.clone();
    tokio::spawn(async move { tick(&fetcher, &screen, &liveness).await });
}

async fn tick(fetcher: &DataFetcher, screen: &Screen, liveness: &Liveness) {
    match screen {
        Screen::Global => {
            let outcome = fetcher.refresh_blockchain_data_for(liveness).await;
            let config = fetcher.context().config();
            if matches!(outcome, RefreshOutcome::Failed(_)) && config.retry_on_failure {
                tokio::time::sleep(config.retry_delay()).await;
                if liveness.is_alive() {
                    fetcher.refresh_blockchain_data_for(liveness).await;
                }
            }
        }
        Screen::Account(address) => {
            if let Err(err) = fetcher.refresh_account(address, liveness).await {
                log::debug!("account poll failed: {err}");
            }
        }
        Screen::TransactionDetail(hash) => {
            if let Err(err) = fetcher.refresh_transaction(hash, liveness).await {
                log::debug!("transaction poll failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_screens_poll_faster() {
        let poll = PollConfig::default();
        assert_eq!(Screen::Global.period(&poll), Duration::from_secs(30));
        assert_eq!(
            Screen::Account("0x1".into()).period(&poll),
            Duration::from_secs(10)
        );
        assert_eq!(
            Screen::TransactionDetail("0x1".into()).period(&poll),
            Duration::from_secs(10)
        );
    }
}

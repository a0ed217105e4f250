//! Cancellable countdown ticker feeding a game's mailbox.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::trace;

/// Running ticker task tagged with a generation number.
///
/// Each tick is delivered as `make(generation)`; receivers compare the
/// generation against the ticker they currently own and drop anything else.
#[derive(Debug)]
pub struct Countdown {
    generation: u64,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Spawn a ticker that sends one message per `period`, starting one period from now.
    ///
    /// The ticker holds only a weak sender so it never keeps the mailbox alive on
    /// its own, and stops once the mailbox is gone.
    pub fn start<T, F>(generation: u64, period: Duration, tx: mpsc::WeakSender<T>, make: F) -> Self
    where
        T: Send + 'static,
        F: Fn(u64) -> T + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let Some(tx) = tx.upgrade() else {
                    break;
                };
                if tx.send(make(generation)).await.is_err() {
                    break;
                }
                trace!(generation, "countdown tick sent");
            }
        });

        Self { generation, handle }
    }

    /// Generation this ticker stamps on its messages.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the ticker and wait until its task has fully ended.
    pub async fn cancel(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

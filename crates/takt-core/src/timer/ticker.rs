//! Background tick loop for a shared [`TimerEngine`].
//!
//! One tokio task per running countdown. Every interval it locks the engine,
//! stops if the engine is no longer running, and otherwise ticks. Pausing or
//! cancelling the engine is therefore observed within one interval; the
//! cancellation token stops the loop without touching the engine at all.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::engine::{TimerEngine, TimerState};
use crate::events::Event;

pub type SharedTimer = Arc<Mutex<TimerEngine>>;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Why the tick loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerExit {
    /// The countdown reached zero.
    Expired,
    /// The engine was paused, cancelled or completed by someone else.
    Stopped,
    /// The token was cancelled.
    Cancelled,
}

pub struct Ticker {
    token: CancellationToken,
    handle: JoinHandle<TickerExit>,
}

impl Ticker {
    /// Spawn the loop on the current tokio runtime.
    pub fn spawn(engine: SharedTimer, interval: Duration) -> Self {
        let token = CancellationToken::new();
        let child = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = child.cancelled() => return TickerExit::Cancelled,
                    _ = interval.tick() => {}
                }

                let mut guard = engine.lock().await;
                if guard.state() != TimerState::Running {
                    return TickerExit::Stopped;
                }
                if let Some(Event::TimerExpired { .. }) = guard.tick() {
                    return TickerExit::Expired;
                }
            }
        });

        Self { token, handle }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the loop to end.
    pub async fn join(self) -> TickerExit {
        match self.handle.await {
            Ok(exit) => exit,
            Err(e) => {
                tracing::warn!("ticker task failed: {e}");
                TickerExit::Cancelled
            }
        }
    }
}

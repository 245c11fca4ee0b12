//! # timer
//!
//! why: followers and candidates must act when they hear nothing for a randomized while
//! relations: owned by runtime.rs, which turns firings into raft-core's Event::Timeout
//! what: ElectionTimer, TimerFired

use rand::Rng;
use raft_core::RaftConfig;
use std::ops::Range;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// A firing of the election timer, tagged with the arming it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    generation: u64,
}

/// Election timer with at most one pending timeout
///
/// every [`reset`](Self::reset) aborts the pending sleep before arming a new
/// one. a firing that was already queued when the timer was reset carries an
/// old generation and is rejected by [`fire`](Self::fire)
#[derive(Debug)]
pub struct ElectionTimer {
    range: Range<Duration>,
    tx: mpsc::UnboundedSender<TimerFired>,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl ElectionTimer {
    /// create a disarmed timer; firings arrive on the returned receiver
    ///
    /// `config` must have passed [`RaftConfig::validate`]
    pub fn new(config: &RaftConfig) -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let timer = Self {
            range: config.election_timeout_range(),
            tx,
            generation: 0,
            pending: None,
        };
        (timer, rx)
    }

    /// cancel the pending timeout and schedule a fresh randomized one
    ///
    /// must be called from within a tokio runtime
    pub fn reset(&mut self) {
        self.cancel();
        self.generation += 1;

        let timeout = self.next_timeout();
        let fired = TimerFired {
            generation: self.generation,
        };
        let tx = self.tx.clone();
        trace!(generation = self.generation, ?timeout, "election timer armed");
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            // receiver gone means the node stopped
            let _ = tx.send(fired);
        }));
    }

    /// cancel the pending timeout without scheduling another
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// whether a timeout is pending
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// accept a firing if it belongs to the current arming, disarming the timer
    pub fn fire(&mut self, fired: TimerFired) -> bool {
        if self.pending.is_none() || fired.generation != self.generation {
            trace!(generation = fired.generation, "stale timer firing dropped");
            return false;
        }
        self.pending = None;
        true
    }

    fn next_timeout(&self) -> Duration {
        let min = self.range.start.as_millis() as u64;
        let max = self.range.end.as_millis() as u64;
        if min >= max {
            return self.range.start;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..max))
    }
}

impl Drop for ElectionTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// src/signals.rs

//! Forward OS interrupts (Ctrl-C, SIGTERM) onto the completion signal channel.
//!
//! The forwarder shares the channel with the completion watcher. It only sends
//! while at least two slots are free, which leaves one slot for the watcher's
//! single `AppExited`. Extra interrupts are dropped: the orchestrator only
//! ever needs one.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::exec::{InterruptKind, RunSignal};

/// What happened to one forwarded interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarded {
    Sent,
    /// Channel too full; the slot is reserved for the watcher.
    Dropped,
    Closed,
}

/// Try to put an interrupt on the channel without taking the watcher's slot.
pub fn forward_interrupt(tx: &mpsc::Sender<RunSignal>, kind: InterruptKind) -> Forwarded {
    if tx.is_closed() {
        return Forwarded::Closed;
    }
    if tx.capacity() < 2 {
        debug!(?kind, "signal channel nearly full; dropping interrupt");
        return Forwarded::Dropped;
    }
    match tx.try_send(RunSignal::Interrupt(kind)) {
        Ok(()) => Forwarded::Sent,
        Err(mpsc::error::TrySendError::Full(_)) => Forwarded::Dropped,
        Err(mpsc::error::TrySendError::Closed(_)) => Forwarded::Closed,
    }
}

/// Spawn the background task that listens for OS interrupts.
///
/// The task ends when the channel is closed or signal listening fails.
pub fn spawn_signal_forwarder(tx: mpsc::Sender<RunSignal>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut listener = match InterruptListener::new() {
            Ok(l) => l,
            Err(e) => {
                warn!(error = %e, "failed to install signal handlers");
                return;
            }
        };

        loop {
            let kind = tokio::select! {
                kind = listener.next() => kind,
                _ = tx.closed() => break,
            };

            let Some(kind) = kind else {
                warn!("signal stream ended");
                break;
            };

            info!(?kind, "interrupt received");
            if forward_interrupt(&tx, kind) == Forwarded::Closed {
                break;
            }
        }

        debug!("signal forwarder finished");
    })
}

#[cfg(unix)]
struct InterruptListener {
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl InterruptListener {
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn next(&mut self) -> Option<InterruptKind> {
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.ok().map(|_| InterruptKind::CtrlC),
            res = self.terminate.recv() => res.map(|_| InterruptKind::Terminate),
        }
    }
}

#[cfg(not(unix))]
struct InterruptListener;

#[cfg(not(unix))]
impl InterruptListener {
    fn new() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn next(&mut self) -> Option<InterruptKind> {
        tokio::signal::ctrl_c()
            .await
            .ok()
            .map(|_| InterruptKind::CtrlC)
    }
}

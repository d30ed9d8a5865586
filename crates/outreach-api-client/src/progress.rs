//! Progress reporting over `tokio::sync::mpsc` channels.

use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Byte-level transfer progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgressEvent {
    pub bytes_sent: u64,
    pub bytes_total: u64,
}

impl TransferProgressEvent {
    /// Percentage in 0..=100; an empty payload counts as complete.
    pub fn percent(&self) -> u8 {
        if self.bytes_total == 0 {
            return 100;
        }
        let sent = self.bytes_sent.min(self.bytes_total) as u128;
        ((sent * 100) / self.bytes_total as u128) as u8
    }
}

/// Sends progress events until closed or cancelled.
///
/// The cancellation check and the send happen under one lock, and a cancelled
/// reporter drops its sender, so no event can follow an observed cancellation.
pub(crate) struct ProgressReporter<T> {
    sender: Mutex<Option<UnboundedSender<T>>>,
    cancel: CancellationToken,
}

impl<T> ProgressReporter<T> {
    pub(crate) fn new(sender: Option<UnboundedSender<T>>, cancel: CancellationToken) -> Self {
        Self {
            sender: Mutex::new(sender),
            cancel,
        }
    }

    pub(crate) fn emit(&self, event: T) {
        let mut guard = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        if self.cancel.is_cancelled() {
            guard.take();
            return;
        }
        if let Some(sender) = guard.as_ref() {
            // Receiver gone means nobody is listening; keep working.
            if sender.send(event).is_err() {
                guard.take();
            }
        }
    }

    /// Drop the sender; the receiver sees the channel end.
    pub(crate) fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
    }
}

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

use tracing::trace;

use crate::DisplayDriver;

/// Creates the single-slot channel that carries transfer-completion signals
/// from the refresh source to the frame loop.
///
/// At most one notification is pending at a time. Signals raised while one is
/// already queued are coalesced into it.
#[must_use]
pub fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    let (sender, receiver) = mpsc::sync_channel(1);
    (CompletionSender { sender }, CompletionReceiver { receiver })
}

/// Producer half, held by whatever plays the role of the panel's DMA interrupt.
#[derive(Clone, Debug)]
pub struct CompletionSender {
    sender: SyncSender<()>,
}

impl CompletionSender {
    /// Signals that a transfer segment finished.
    ///
    /// Returns `false` once the receiving frame loop has gone away.
    pub fn notify(&self) -> bool {
        match self.sender.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Disconnected(())) => false,
        }
    }
}

/// Consumer half, drained by the frame loop.
#[derive(Debug)]
pub struct CompletionReceiver {
    receiver: Receiver<()>,
}

impl CompletionReceiver {
    /// Forwards every pending signal to the display and returns how many were delivered.
    pub fn forward<D: DisplayDriver>(&self, display: &mut D) -> usize {
        let mut forwarded = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(()) => {
                    display.transfer_complete();
                    forwarded += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => {
                    if forwarded > 0 {
                        trace!(forwarded, "transfer completions forwarded");
                    }
                    return forwarded;
                }
            }
        }
    }
}

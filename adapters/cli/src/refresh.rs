//! Background thread standing in for the panel's transfer-complete interrupt.

use std::{
    io,
    thread::{self, JoinHandle},
    time::Duration,
};

use outbreak_rendering::CompletionSender;
use tracing::debug;

/// Spawns a thread that signals a finished transfer every `period`.
///
/// The thread exits once the receiving simulation has been dropped.
pub(crate) fn spawn(sender: CompletionSender, period: Duration) -> io::Result<JoinHandle<u64>> {
    thread::Builder::new()
        .name("panel-refresh".into())
        .spawn(move || {
            let mut signalled = 0;
            loop {
                thread::sleep(period);
                if !sender.notify() {
                    break;
                }
                signalled += 1;
            }
            debug!(signalled, "panel refresh stopped");
            signalled
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_core::PanelSize;
    use outbreak_rendering::{completion_channel, Framebuffer, Rgb};
    use std::time::Instant;

    #[test]
    fn signals_reach_the_display_until_receiver_is_dropped() {
        let (sender, receiver) = completion_channel();
        let handle = spawn(sender, Duration::from_millis(1)).expect("spawn refresh thread");
        let mut framebuffer = Framebuffer::new(PanelSize::new(1, 4), Rgb::BLACK);

        let deadline = Instant::now() + Duration::from_secs(5);
        while framebuffer.transfers_completed() == 0 && Instant::now() < deadline {
            let _forwarded = receiver.forward(&mut framebuffer);
            thread::sleep(Duration::from_millis(1));
        }
        assert!(framebuffer.transfers_completed() >= 1);
        drop(receiver);

        let signalled = handle.join().expect("refresh thread panicked");
        assert!(signalled >= 1);
    }
}

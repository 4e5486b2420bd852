//! SIGINT/SIGTERM handling for `serve`.

use std::io;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;

use signal_hook::consts::SIGINT;
use signal_hook::consts::SIGTERM;
use signal_hook::iterator::Signals;
use tracing::info;

pub struct SignalHandler {
    _handle: JoinHandle<()>,
}

impl SignalHandler {
    /// Sets `shutdown` and runs `on_signal` once the first signal arrives.
    pub fn setup(
        shutdown: Arc<AtomicBool>,
        on_signal: impl FnOnce() + Send + 'static,
    ) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let handle = thread::Builder::new()
            .name("signal-handler".to_string())
            .spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    info!(signal = sig, "Received signal, shutting down");
                    shutdown.store(true, Ordering::SeqCst);
                    on_signal();
                }
            })?;
        Ok(Self { _handle: handle })
    }
}

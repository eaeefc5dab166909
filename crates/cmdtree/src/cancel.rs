//! Cooperative cancellation.
//!
//! The router never interrupts a running handler. Long-running handlers poll
//! [`Cancellation::is_cancelled`] (or call
//! [`Context::check_cancelled`](crate::Context::check_cancelled)) and stop on
//! their own.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag raised once when the invocation should stop.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    /// Creates a flag that is not raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag. Every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true once the flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raises the flag on SIGINT or SIGTERM.
    ///
    /// A second signal while the flag is already raised terminates the
    /// process with exit status 1, so an unresponsive handler can still be
    /// interrupted from the terminal.
    #[cfg(unix)]
    pub fn install_signal_handlers(&self) -> io::Result<()> {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::flag;

        for signal in [SIGINT, SIGTERM] {
            // Registered first so it sees the flag before this signal sets it.
            flag::register_conditional_shutdown(signal, 1, Arc::clone(&self.flag))?;
            flag::register(signal, Arc::clone(&self.flag))?;
        }
        Ok(())
    }

    /// Signal handling is only wired up on unix targets.
    #[cfg(not(unix))]
    pub fn install_signal_handlers(&self) -> io::Result<()> {
        Ok(())
    }
}

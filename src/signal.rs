//! Ctrl+C handling.
//!
//! A single [`ShutdownHandler`] owns the process-wide shutdown flag. The
//! walker checks it between entries and every bucket comparison checks it at
//! the start of each round, so an interrupt stops all reading within one
//! block per open file.
//!
//! ```rust,no_run
//! use blockdupe::duplicates::FinderConfig;
//! use blockdupe::signal::install_handler;
//!
//! let handler = install_handler();
//! let config = FinderConfig::default().with_shutdown_flag(handler.flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True once Ctrl+C was pressed or [`ShutdownHandler::request`] was called.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request shutdown.
    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// The flag to hand to the walker and the comparators.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the Ctrl+C hook and return the handler it sets.
///
/// The hook can only be registered once per process. Later calls (several
/// `run_app` invocations in one test binary) get the registered handler back
/// with its flag cleared. If registration fails, an unhooked handler is
/// returned; it still honors [`ShutdownHandler::request`].
pub fn install_handler() -> ShutdownHandler {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return handler.clone();
    }

    let handler = ShutdownHandler::new();
    let flag = handler.flag();
    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Finishing current blocks...");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    });

    if let Err(e) = installed {
        log::debug!("Ctrl+C handler not installed: {}", e);
    }
    GLOBAL_HANDLER.get_or_init(|| handler).clone()
}

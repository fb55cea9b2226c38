// Signal handling module
//
// Supported signals:
// - SIGTERM: Shutdown
// - SIGINT:  Shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Signal handler state
#[derive(Debug, Default)]
pub struct SignalHandler {
    /// Shutdown signal (SIGTERM, SIGINT)
    pub shutdown: Arc<Notify>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Start signal handlers (Unix)
///
/// Handlers are registered before this returns.
///
/// | Signal  | Action   |
/// |---------|----------|
/// | SIGTERM | Shutdown |
/// | SIGINT  | Shutdown |
#[cfg(unix)]
pub fn start_signal_handler(handler: &SignalHandler) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let shutdown = Arc::clone(&handler.shutdown);

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => logger::log_signal("SIGTERM"),
            _ = sigint.recv() => logger::log_signal("SIGINT (Ctrl+C)"),
        }
        // notify_one stores a permit if the server loop is between polls
        shutdown.notify_one();
    });

    Ok(())
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(handler: &SignalHandler) -> std::io::Result<()> {
    let shutdown = Arc::clone(&handler.shutdown);

    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_signal("Ctrl+C");
            shutdown.notify_one();
        }
    });

    Ok(())
}

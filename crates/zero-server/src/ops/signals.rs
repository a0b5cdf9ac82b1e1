//! OS signal plumbing.
//!
//! Translates SIGINT/SIGTERM (Ctrl-C on non-unix) into
//! [`ShutdownSignal::trigger`]; everything else stays at default handling.

use tokio::task::JoinHandle;

use crate::ops::shutdown::{ShutdownSignal, Trigger};

/// Register handlers and spawn the forwarding task.
///
/// Handlers are registered before this returns, so a signal delivered right
/// after startup is not lost. The task ends after the forcing signal.
#[cfg(unix)]
pub fn install(signal: ShutdownSignal) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    let mut sigterm = unix_signal(SignalKind::terminate())?;
    let mut sigint = unix_signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                Some(()) = sigterm.recv() => "SIGTERM",
                Some(()) = sigint.recv() => "SIGINT",
                else => break,
            };
            tracing::info!(signal = name, "termination signal received");
            if signal.trigger() == Trigger::Forced {
                break;
            }
        }
    }))
}

#[cfg(not(unix))]
pub fn install(signal: ShutdownSignal) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        loop {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for Ctrl-C: {err}");
                break;
            }
            tracing::info!(signal = "ctrl-c", "termination signal received");
            if signal.trigger() == Trigger::Forced {
                break;
            }
        }
    }))
}

//! Ctrl-C handling
//!
//! The first Ctrl-C raises the run's [`Interrupt`] so imports stop at the
//! next step. A second one exits right away.

use tokio::runtime;
use wsman_vcs::Interrupt;

/// Exit status of a process killed by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Raise `interrupt` whenever the process receives Ctrl-C.
///
/// The listener runs on its own thread with a single-threaded runtime, so the
/// synchronous commands are not affected.
pub fn raise_on_ctrl_c(interrupt: &Interrupt) -> std::io::Result<()> {
    let runtime = runtime::Builder::new_current_thread().enable_io().build()?;
    let interrupt = interrupt.clone();
    std::thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || runtime.block_on(listen(interrupt)))?;
    Ok(())
}

async fn listen(interrupt: Interrupt) {
    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
            return;
        }
        if interrupt.is_raised() {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
        tracing::warn!("Interrupted, stopping after the current step");
        interrupt.raise();
    }
}

use std::time::Duration;

use tokio::sync::watch;

use crate::state::SharedState;

/// Periodically drop idle sessions until shutdown is signaled.
pub async fn sweep_sessions(
    state: SharedState,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::debug!("Session sweeper started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let before = state.sessions.len();
        state.sessions.cleanup(state.config.session_ttl);
        let dropped = before.saturating_sub(state.sessions.len());
        if dropped > 0 {
            tracing::debug!("Dropped {dropped} idle sessions");
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!("Session sweeper stopped");
}

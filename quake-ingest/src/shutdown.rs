use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;

/// Resolves on SIGINT or SIGTERM.
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    let mut sigterm = match tokio::signal::unix::signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::error!("failed to install SIGTERM handler: {}", e);
            if let Err(e) = ctrl_c.await {
                tracing::error!("failed to listen for SIGINT: {}", e);
            }
            return;
        }
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT"),
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
    }
}

/// Cancels the returned token when the process is asked to stop.
pub fn cancel_on_shutdown_signal() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        cancel.cancel();
    });
    token
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_token_stays_live_without_a_signal() {
        let token = cancel_on_shutdown_signal();
        let child = token.child_token();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!token.is_cancelled());
        assert!(!child.is_cancelled());

        token.cancel();
        assert!(child.is_cancelled());
    }
}

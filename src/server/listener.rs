use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::info;

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionSettings};

/// Pause after a failed accept. Errors such as EMFILE persist until other
/// connections close, so retrying at once would spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!(
        root = %cfg.static_files.root.display(),
        "Listening on {}",
        cfg.server.listen_addr
    );

    serve(listener, cfg.connection_settings(), cfg.server.max_connections).await
}

/// Accepts connections forever, one task each.
///
/// With `max_connections` set, accepting pauses while that many connections
/// are in flight.
pub async fn serve(
    listener: TcpListener,
    settings: Arc<ConnectionSettings>,
    max_connections: Option<usize>,
) -> anyhow::Result<()> {
    let admission = max_connections.map(|n| Arc::new(Semaphore::new(n)));

    loop {
        let permit = match &admission {
            Some(semaphore) => Some(semaphore.clone().acquire_owned().await?),
            None => None,
        };

        let (socket, peer) = accept_with_backoff(|| listener.accept()).await;
        info!("Accepted connection from {}", peer);

        let settings = settings.clone();
        tokio::spawn(async move {
            let conn = Connection::new(socket, settings);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
            drop(permit);
        });
    }
}

/// Calls `accept` until it succeeds, sleeping `ACCEPT_BACKOFF` after each
/// failure.
async fn accept_with_backoff<T, F, Fut>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                tracing::warn!("Failed to accept connection: {}", e);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn failed_accepts_back_off_before_retrying() {
        let mut attempts = 0;
        let started = Instant::now();

        let accepted = accept_with_backoff(|| {
            attempts += 1;
            let result = if attempts <= 2 {
                Err(io::Error::other("too many open files"))
            } else {
                Ok(attempts)
            };
            async move { result }
        })
        .await;

        assert_eq!(accepted, 3);
        assert!(started.elapsed() >= ACCEPT_BACKOFF * 2);
    }
}

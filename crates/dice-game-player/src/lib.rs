//! Dice Game Player Service
//!
//! One peer of a two-player dice game over HTTP: a listener for the peer's
//! messages, and a session that plays the configured rounds against it.

pub mod config;
pub mod server;

pub use config::{ConfigError, PlayerConfig};
pub use server::{create_router, AppError, ListenerState};

use dice_game_core::{GameSession, HttpTransport, Mailbox, SessionResult};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

/// Serve on `listener`, wait for the peer, and play a full session.
///
/// The listener shuts down once the session has ended.
pub async fn play(config: PlayerConfig, listener: TcpListener) -> anyhow::Result<SessionResult> {
    let inbox = Arc::new(Mailbox::new());
    let mut transport = HttpTransport::new(config.peer_url.clone(), inbox.clone());
    if let Some(token) = &config.peer_token {
        transport = transport.with_token(token.clone());
    }

    let mut session = GameSession::new(config.session_config()?, transport);

    let mut state = ListenerState::new(inbox.clone(), session.subscribe());
    if let Some(token) = &config.peer_token {
        state = state.with_token(token.clone());
    }
    let app = create_router(Arc::new(state));

    info!(
        "{} listening on http://{}",
        config.name,
        listener.local_addr()?
    );
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let result = async {
        session.transport().wait_for_peer(config.ready_timeout).await?;
        info!("{} plays {} at {}", config.name, config.peer_name, config.peer_url);
        Ok::<_, anyhow::Error>(session.run().await?)
    }
    .await;

    inbox.close();
    let _ = shutdown_tx.send(());
    server.await??;

    result
}

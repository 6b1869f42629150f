//! Dice Game Player
//!
//! Runs one peer of the game. Configure with `PLAYER_NAME`, `PEER_NAME`,
//! `PORT`, `PEER_URL`, `ROUNDS`, `STARTS`, `TIMEOUT_SECS`,
//! `READY_TIMEOUT_SECS` and `PEER_TOKEN`.

use dice_game_core::SessionResult;
use dice_game_player::{play, PlayerConfig};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PlayerConfig::from_env()?;
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    let name = config.name.clone();

    match play(config, listener).await {
        Ok(result @ SessionResult::Completed(_)) => {
            let tally = result.tally();
            info!(
                "{}: {} won, {} lost, {} tied",
                name, tally.wins, tally.losses, tally.ties
            );
            Ok(())
        }
        Ok(SessionResult::Aborted {
            round,
            accuser,
            accused,
            ..
        }) => {
            error!(
                "{}: session aborted in round {}: {} caught {} cheating",
                name, round, accuser, accused
            );
            anyhow::bail!("session aborted in round {round}")
        }
        Err(e) => {
            error!("{}: session failed: {:#}", name, e);
            Err(e)
        }
    }
}

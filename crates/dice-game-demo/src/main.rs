//! Single-process demo: Alice and Bob play over the in-memory transport.
//!
//! `ROUNDS` sets the number of rounds (default 3).

use anyhow::Context;
use dice_game_core::{GameSession, MemoryTransport, Role, SessionConfig, SessionResult};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn report(name: &str, result: &SessionResult) {
    for record in result.outcomes() {
        let peer = record
            .peer
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        info!(
            "{} round {}: {} as {}, {} vs {}",
            name, record.round, record.outcome, record.role, record.own, peer
        );
    }
    let tally = result.tally();
    match result {
        SessionResult::Completed(_) => info!(
            "{}: {} won, {} lost, {} tied",
            name, tally.wins, tally.losses, tally.ties
        ),
        SessionResult::Aborted { round, .. } => warn!("{}: aborted in round {}", name, round),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let rounds: u32 = match std::env::var("ROUNDS") {
        Ok(value) => value.parse().context("ROUNDS must be a number")?,
        Err(_) => 3,
    };

    let (a, b) = MemoryTransport::pair();
    let mut alice = GameSession::new(
        SessionConfig::new(rounds, Role::Committer).with_name("Alice"),
        a,
    );
    let mut bob = GameSession::new(
        SessionConfig::new(rounds, Role::Verifier).with_name("Bob"),
        b,
    );

    let (ra, rb) = tokio::join!(alice.run(), bob.run());
    let ra = ra.context("Alice's session failed")?;
    let rb = rb.context("Bob's session failed")?;

    report("Alice", &ra);
    report("Bob", &rb);

    if ra.is_aborted() || rb.is_aborted() {
        anyhow::bail!("a cheat was detected");
    }
    Ok(())
}

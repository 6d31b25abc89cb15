//! Parry Rush headless runner
//!
//! Plays seeded games with the scripted player and prints every telemetry event
//! as one JSON line on stdout. Logs go to stderr (`RUST_LOG=debug` for detail).

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use parry_rush::RankingBoard;
use parry_rush::audio::{AudioManager, LogBackend};
use parry_rush::platform::{LogRenderer, Platform};
use parry_rush::ranking::RankingSubmission;
use parry_rush::sim::{AutoPlayer, GameOverSummary, GamePhase, GameSession, SessionIdentity};
use parry_rush::telemetry::{TelemetryEvent, TelemetryQueue, TransportError};
use parry_rush::tuning::Tuning;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// RNG seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// JSON tuning file
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Games to play
    #[arg(long, default_value_t = 1)]
    rounds: u32,
    /// Chance the bot botches a pattern
    #[arg(long, default_value_t = 0.05)]
    miss_rate: f64,
    /// Bot reaction time (ms)
    #[arg(long, default_value_t = 180)]
    reaction_ms: u64,
    /// Host frame interval (ms)
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Give up on a game after this much engine time (ms)
    #[arg(long, default_value_t = 300_000)]
    max_ms: u64,
    /// Screen width used for pointer mapping
    #[arg(long, default_value_t = 800.0)]
    width: f32,
    /// Nickname the bot submits to the ranking board
    #[arg(long, default_value = "autoplayer")]
    nickname: String,
}

fn print_batch(batch: &[TelemetryEvent]) -> Result<(), TransportError> {
    for event in batch {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

fn play(
    session: &mut GameSession,
    bot: &mut AutoPlayer,
    platform: &mut Platform<'_>,
    cli: &Cli,
) -> u64 {
    let frame_ms = cli.frame_ms.max(1);
    let mut now = 0;
    session.start(now);
    platform.dispatch_all(session.drain_events());

    while session.phase() == GamePhase::Playing && now < cli.max_ms {
        now += frame_ms;
        session.advance(now);
        if let Some(x) = bot.decide(&session.snapshot(), now) {
            let result = session.handle_input(x, bot.screen_width(), now);
            log::debug!("t={} tap x={:.0} -> {:?}", now, x, result);
        }
        platform.dispatch_all(session.drain_events());
    }

    if session.phase() == GamePhase::Playing {
        log::warn!("Game still running at {}ms, tearing down", now);
    }
    session.teardown();
    platform.dispatch_all(session.drain_events());
    now
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let tuning = match &cli.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let seed = cli.seed.unwrap_or_else(rand::random);
    let session_id = uuid::Uuid::new_v4().to_string();
    log::info!("Parry Rush starting (seed {}, session {})", seed, session_id);

    let mut renderer = LogRenderer::default();
    let mut audio = AudioManager::new(LogBackend);
    let mut queue = TelemetryQueue::default();
    let mut board = RankingBoard::new();
    let bot_seed = seed ^ 0x9e37_79b9_7f4a_7c15;
    let mut bot = AutoPlayer::new(bot_seed, cli.reaction_ms, cli.miss_rate, cli.width);

    let mut session = GameSession::new(tuning, SessionIdentity::new(session_id.clone()), seed)?;
    for round in 1..=cli.rounds.max(1) {
        if round > 1 {
            session = session.next_game()?;
        }
        let mut navigator: Option<GameOverSummary> = None;
        let elapsed = {
            let mut platform = Platform {
                renderer: &mut renderer,
                audio: &mut audio,
                telemetry: &mut queue,
                navigator: &mut navigator,
            };
            play(&mut session, &mut bot, &mut platform, &cli)
        };

        if let Err(e) = queue.flush(print_batch) {
            log::error!("Telemetry output failed: {}", e);
        }

        let score = session.score();
        match navigator {
            Some(summary) => log::info!(
                "Round {}: score {} after {}ms ({})",
                round,
                summary.final_score,
                elapsed,
                summary.fail_reason
            ),
            None => log::info!("Round {}: score {} (stopped at {}ms)", round, score, elapsed),
        }

        let submission = RankingSubmission {
            session_id: session_id.clone(),
            nickname: cli.nickname.clone(),
            password: session_id.clone(),
            score,
        };
        match board.submit(&submission) {
            Ok(accepted) => log::debug!("Ranking accepted: {:?}", accepted),
            Err(e) => log::warn!("Ranking rejected: {}", e),
        }
    }

    for (i, entry) in board.top().iter().enumerate() {
        log::info!("#{} {} {}", i + 1, entry.nickname, entry.score);
    }
    log::info!("{} frames drawn", renderer.drawn());
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Headless runner is native only
}

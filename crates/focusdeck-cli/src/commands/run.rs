//! Foreground focus session.
//!
//! Every event is printed to stdout as one JSON line. Commands are read from
//! stdin, one per line:
//!
//! ```text
//! start | pause | toggle | reset | status | quit
//! work | short | long
//! duration <minutes> [seconds]
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use focusdeck_core::ports::FocusGuard;
use focusdeck_core::{
    Config, Database, Event, FocusBlocker, FocusSession, LiveSession, SessionPhase,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

#[derive(Args)]
pub struct RunArgs {
    /// Work length minutes (0-90); overrides the configured length
    #[arg(long)]
    minutes: Option<i64>,
    /// Work length seconds (0-59)
    #[arg(long)]
    seconds: Option<i64>,
    /// Keep history and progress in memory instead of the database
    #[arg(long)]
    memory: bool,
    /// Start the next phase automatically after each transition
    #[arg(long)]
    auto_advance: bool,
    /// Exit after this many automatic phase transitions
    #[arg(long)]
    phases: Option<u32>,
    /// Wait for a `start` command instead of starting right away
    #[arg(long)]
    paused: bool,
    #[arg(long, default_value = "1000", hide = true)]
    tick_ms: u64,
}

enum Command {
    Start,
    Pause,
    Toggle,
    Reset,
    Status,
    Quit,
    Select(SessionPhase),
    Duration(String, String),
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("empty command".into());
    };
    let command = match head.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "pause" => Command::Pause,
        "toggle" => Command::Toggle,
        "reset" => Command::Reset,
        "status" => Command::Status,
        "quit" | "exit" => Command::Quit,
        "duration" => Command::Duration(
            words.next().unwrap_or("0").to_string(),
            words.next().unwrap_or("0").to_string(),
        ),
        other => Command::Select(other.parse()?),
    };
    Ok(command)
}

fn print_event(event: &Event) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_session(args))
}

async fn run_session(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = if args.memory {
        Database::open_memory()?
    } else {
        Database::open()?
    };
    let db = Arc::new(db.with_badge_bonus(config.rewards.badge_bonus_points));
    let guard: Arc<dyn FocusGuard> = Arc::new(
        FocusBlocker::with_database(Arc::clone(&db), config.blocker.blocked_sites.clone())
            .enabled(config.blocker.enabled),
    );

    let (tx, mut rx) = broadcast::channel(64);
    let mut session = FocusSession::from_config(&config, db.clone(), db)
        .with_guard(guard)
        .with_events(tx);
    if args.auto_advance {
        session = session.with_auto_advance(true);
    }
    if args.minutes.is_some() || args.seconds.is_some() {
        session.set_custom_duration(args.minutes.unwrap_or(0), args.seconds.unwrap_or(0));
    }

    let mut live = LiveSession::with_period(session, Duration::from_millis(args.tick_ms.max(1)));
    print_event(&live.snapshot().await)?;
    if !args.paused {
        live.start().await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut transitions = 0u32;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = rx.recv() => match received {
                Ok(event) => {
                    print_event(&event)?;
                    if matches!(event, Event::PhaseEntered { .. }) {
                        transitions += 1;
                        if args.phases.is_some_and(|n| transitions >= n) {
                            break;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event output fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            line = lines.next_line(), if stdin_open => match line? {
                None => stdin_open = false,
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match parse_command(&line) {
                    Ok(Command::Start) => { live.start().await; }
                    Ok(Command::Pause) => { live.pause().await; }
                    Ok(Command::Toggle) => { live.toggle().await; }
                    Ok(Command::Reset) => { live.reset().await; }
                    Ok(Command::Status) => print_event(&live.snapshot().await)?,
                    Ok(Command::Select(phase)) => { live.select_phase(phase).await; }
                    Ok(Command::Duration(minutes, seconds)) => {
                        if live.set_custom_duration_input(&minutes, &seconds).await.is_none() {
                            eprintln!("duration unchanged");
                        }
                    }
                    Ok(Command::Quit) => break,
                    Err(e) => eprintln!("{e}"),
                },
            },
        }
    }

    live.shutdown().await;
    print_event(&live.snapshot().await)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert!(matches!(parse_command("start"), Ok(Command::Start)));
        assert!(matches!(parse_command("  PAUSE "), Ok(Command::Pause)));
        assert!(matches!(
            parse_command("long"),
            Ok(Command::Select(SessionPhase::LongBreak))
        ));
        match parse_command("duration 12") {
            Ok(Command::Duration(m, s)) => {
                assert_eq!(m, "12");
                assert_eq!(s, "0");
            }
            _ => panic!("expected duration"),
        }
        assert!(parse_command("nap").is_err());
        assert!(parse_command("").is_err());
    }
}

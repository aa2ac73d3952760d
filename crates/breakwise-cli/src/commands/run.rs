//! Reminder host.
//!
//! Owns the single [`App`] for the process, drives `tick()` from a tokio
//! interval and reads one JSON command per stdin line. Events and replies are
//! written to stdout as JSON lines. Exits on stdin EOF or Ctrl-C.

use std::time::Duration;

use breakwise_core::dispatch::observer_fn;
use breakwise_core::{App, Command, Config, Event, Surface};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

#[derive(Args)]
pub struct RunArgs {
    /// Tick interval in milliseconds (defaults to engine.tick_interval_ms)
    #[arg(long)]
    tick_ms: Option<u64>,
}

pub fn run(args: RunArgs, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(host(args, config));
    // A pending stdin read occupies a blocking thread that dropping the
    // runtime would wait on.
    rt.shutdown_background();
    result
}

async fn host(args: RunArgs, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let tick_ms = args.tick_ms.unwrap_or(config.engine.tick_interval_ms).max(1);
    let mut app = App::open(&config)?;
    app.subscribe(observer_fn(Surface::Any, print_event));
    app.boot();
    tracing::info!(tick_ms, "Reminder host started");

    let mut ticker = tokio::time::interval(Duration::from_millis(tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                app.tick();
            }
            line = lines.next_line() => match line? {
                Some(line) => handle_line(&mut app, &line),
                None => {
                    tracing::info!("stdin closed, shutting down");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        }
    }
    Ok(())
}

fn handle_line(app: &mut App, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    let command: Command = match serde_json::from_str(line) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!("Rejected command: {e}");
            println!("{}", serde_json::json!({ "type": "error", "message": e.to_string() }));
            return;
        }
    };
    if let Some(reply) = app.handle(command) {
        match serde_json::to_string(&reply) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!("Failed to encode reply: {e}"),
        }
    }
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::warn!(event = event.name(), "Failed to encode event: {e}"),
    }
}

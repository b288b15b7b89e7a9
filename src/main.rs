// src/main.rs
//
// Thin harness around the dinopilot library.
// All of the real logic lives in the lib crate (strategy, params, rl,
// runner); this binary parses CLI + env overrides, attaches to the
// browser, runs the control loop, and tears down on Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;

use dinopilot::{Config, ControlLoop, DinoGame, EventSink, GameInterface, StdoutSink};

/// Command-line arguments for the dinopilot binary.
#[derive(Parser, Debug)]
#[command(name = "dinopilot")]
struct Cli {
    /// DevTools HTTP endpoint of a running Chrome
    /// (start it with --remote-debugging-port=9222 and open chrome://dino).
    #[arg(long, default_value = "http://127.0.0.1:9222")]
    devtools_url: String,

    /// Optional tick bound; by default the loop runs until Ctrl-C.
    #[arg(long)]
    ticks: Option<u64>,

    /// Seed for the learner's stochastic pieces (sampling, probes, init).
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// Build Config from defaults, then apply CLI + env overrides.
///
/// This keeps src/config.rs as the single source of truth, while letting
/// research harnesses sweep hyperparameters via environment variables.
fn build_config_from_env_and_args(cli: &Cli) -> Config {
    let mut cfg = Config::default();

    // ---------- CLI overrides ----------

    cfg.browser.devtools_url = cli.devtools_url.clone();
    cfg.control.max_ticks = cli.ticks;
    cfg.learning.seed = cli.seed;

    // ---------- Env overrides (research knobs) ----------

    // Fixed wait between ticks.
    if let Ok(raw) = std::env::var("DINOPILOT_TICK_INTERVAL_MS") {
        if let Ok(v) = raw.parse::<u64>() {
            cfg.control.tick_interval_ms = v;
        }
    }

    // Discount used when labelling episode steps.
    if let Ok(raw) = std::env::var("DINOPILOT_DISCOUNT") {
        if let Ok(v) = raw.parse::<f64>() {
            cfg.learning.discount = v;
        }
    }

    // Training floor: buffered samples required before a fit step runs.
    if let Ok(raw) = std::env::var("DINOPILOT_TRAIN_FLOOR") {
        if let Ok(v) = raw.parse::<usize>() {
            cfg.learning.min_buffer_for_training = v;
        }
    }

    // Approximator learning rate.
    if let Ok(raw) = std::env::var("DINOPILOT_LEARNING_RATE") {
        if let Ok(v) = raw.parse::<f64>() {
            cfg.learning.learning_rate = v;
        }
    }

    cfg
}

#[tokio::main]
async fn main() -> Result<()> {
    // 0) Parse CLI args.
    let cli = Cli::parse();

    // 1) Load / build config with CLI + env overrides.
    let cfg = build_config_from_env_and_args(&cli);

    let mut sink = StdoutSink;

    // 2) Attach to the running browser and wait for the game.
    //    A browser that never becomes ready is a startup failure:
    //    propagate and exit non-zero.
    let mut game = DinoGame::connect(&cfg.browser)
        .await
        .context("attaching to browser")?;
    if let Err(err) = game.wait_ready(&cfg.browser).await {
        let _ = game.close().await;
        return Err(err);
    }

    // 3) First Space press starts the game.
    sink.note("game ready, starting");
    game.press_jump().await?;

    // 4) Run the control loop until Ctrl-C (or the tick bound).
    let mut control = ControlLoop::new(&cfg, Box::new(StdoutSink));
    tokio::select! {
        result = control.run(&mut game) => {
            let summary = result?;
            sink.note(&format!(
                "run finished: {} ticks, {} episodes, high score {}",
                summary.ticks, summary.episodes, summary.highest_score,
            ));
        }
        _ = tokio::signal::ctrl_c() => {
            sink.note("termination signal received, shutting down");
        }
    }

    // 5) Best-effort teardown; never blocks process exit.
    if let Err(err) = game.close().await {
        sink.note(&format!("teardown: {err:#}"));
    }

    Ok(())
}

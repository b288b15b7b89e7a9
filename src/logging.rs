// src/logging.rs
//
// Diagnostics sinks for dinopilot.
// - EventSink: trait used by the control loop
// - StdoutSink: console lines for interactive runs
// - NoopSink:  discards all events (tests)
//
// Write-only: nothing reads these lines back, so there is no format
// contract beyond "useful to a human watching the run".

use crate::analytics::RoundStats;
use crate::rl::learner::TrainingOutcome;
use crate::types::Decision;

/// Abstract sink for control-loop diagnostics.
pub trait EventSink {
    /// The polled score changed.
    fn score_update(&mut self, score: u32, speed: f64);

    /// Periodic obstacle/decision report (emitted on poll ticks only, to
    /// avoid drowning the console at tick rate).
    fn decision_report(&mut self, decision: &Decision, speed: f64);

    /// An episode finished: round statistics plus the training outcome.
    fn episode_end(
        &mut self,
        iteration: u64,
        final_score: u32,
        highest_score: u32,
        stats: &RoundStats,
        outcome: &TrainingOutcome,
    );

    /// A tick failed; the loop continues after backoff.
    fn tick_error(&mut self, err: &str);

    /// Free-form progress line (startup, shutdown, restarts).
    fn note(&mut self, msg: &str);
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn score_update(&mut self, _score: u32, _speed: f64) {}
    fn decision_report(&mut self, _decision: &Decision, _speed: f64) {}
    fn episode_end(
        &mut self,
        _iteration: u64,
        _final_score: u32,
        _highest_score: u32,
        _stats: &RoundStats,
        _outcome: &TrainingOutcome,
    ) {
    }
    fn tick_error(&mut self, _err: &str) {}
    fn note(&mut self, _msg: &str) {}
}

/// Console sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl EventSink for StdoutSink {
    fn score_update(&mut self, score: u32, speed: f64) {
        println!("score {score} (speed {speed:.2})");
    }

    fn decision_report(&mut self, decision: &Decision, speed: f64) {
        println!(
            "obstacle: distance={:.1} speed={speed:.2} reason={:?} jump={} [{}]",
            decision.distance, decision.reason, decision.should_jump, decision.explanation,
        );
    }

    fn episode_end(
        &mut self,
        iteration: u64,
        final_score: u32,
        highest_score: u32,
        stats: &RoundStats,
        outcome: &TrainingOutcome,
    ) {
        println!(
            "episode {iteration} over: score={final_score} high={highest_score} \
             duration={}ms obstacles={} jumps={} avg_speed={:.2} max_speed={:.2} \
             birds={:.0}% cacti={:.0}%",
            stats.duration_ms,
            stats.obstacle_count,
            stats.jump_count,
            stats.avg_speed,
            stats.max_speed,
            stats.bird_ratio * 100.0,
            stats.cactus_ratio * 100.0,
        );
        match outcome {
            TrainingOutcome::Trained { samples, loss, .. } => {
                println!("trained on {samples} samples, loss {loss:.4}");
            }
            TrainingOutcome::Skipped { reason } => {
                println!("training skipped: {reason:?}");
            }
            TrainingOutcome::Failed { error } => {
                println!("training failed: {error}");
            }
        }
    }

    fn tick_error(&mut self, err: &str) {
        eprintln!("tick error: {err}");
    }

    fn note(&mut self, msg: &str) {
        println!("{msg}");
    }
}

// src/types.rs
//
// Common shared types for the dinopilot decision engine.

use serde::Deserialize;

/// Millisecond timestamp since Unix epoch.
pub type TimestampMs = i64;

/// Canvas height assumed when the page reports none. The stock runner uses a
/// 150px-high arena; bird altitude bands are expressed relative to it.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 150.0;

/// Classified obstacle kind.
///
/// `Unknown` covers page obstacle types matching neither class; those are
/// routed to the linear fallback decision rather than the zone tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Ground,
    Aerial,
    Unknown,
}

/// One upcoming obstacle as reported by the host page.
///
/// For `Aerial` obstacles, `y` encodes flight altitude in canvas pixels
/// (smaller y = higher up).
#[derive(Debug, Clone, Deserialize)]
pub struct Obstacle {
    /// Raw obstacle type string from the page (e.g. "CACTUS_SMALL",
    /// "PTERODACTYL").
    #[serde(rename = "type", default)]
    pub type_name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Obstacle {
    /// Classify the page's type string into an [`ObstacleKind`].
    pub fn kind(&self) -> ObstacleKind {
        if self.type_name.contains("PTERODACTYL") {
            ObstacleKind::Aerial
        } else if self.type_name.contains("CACTUS") {
            ObstacleKind::Ground
        } else {
            ObstacleKind::Unknown
        }
    }
}

/// Player character state for one frame.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerState {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub jumping: bool,
}

/// Canvas dimensions of the game arena.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    /// Height with the stock-runner fallback applied.
    pub fn height_or_default(&self) -> f64 {
        if self.height > 0.0 {
            self.height
        } else {
            DEFAULT_CANVAS_HEIGHT
        }
    }
}

/// One frame's observation of the game world, produced fresh each tick.
///
/// `obstacles` is ordered nearest-first by horizontal position.
#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    pub player: PlayerState,
    pub obstacles: Vec<Obstacle>,
    pub speed: f64,
    pub canvas: CanvasSize,
}

/// Raw page state: the observation plus the host flags the control loop
/// needs for episode management.
#[derive(Debug, Clone, Deserialize)]
pub struct GameSnapshot {
    #[serde(flatten)]
    pub observation: Observation,
    pub score: u32,
    pub game_over: bool,
}

/// Which rule-engine branch produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonTag {
    /// Player is mid-jump; no decision to make.
    Airborne,
    /// No obstacle ahead of the player.
    NothingAhead,
    SmallCactus,
    LargeCactus,
    /// Bird in the lowest band (relative height > 0.8).
    LowestBird,
    /// Bird in (0.7, 0.8].
    BottomBird,
    /// Bird in (0.6, 0.7].
    MediumBottomBird,
    /// Bird in (0.5, 0.6], jumpable.
    MiddleBird,
    /// Bird in (0.5, 0.6] sitting at the jump apex; forced no-jump.
    MiddleBirdAvoid,
    /// Bird in (0.4, 0.5].
    MediumTopBird,
    /// Bird at relative height <= 0.4; unreachably high, never jump.
    HighBird,
    /// Unknown obstacle kind; linear-combination fallback.
    LinearFallback,
}

/// Pure output of the rule engine for one tick.
#[derive(Debug, Clone)]
pub struct Decision {
    pub should_jump: bool,
    pub reason: ReasonTag,
    /// Horizontal gap between the player's leading edge and the obstacle.
    pub distance: f64,
    /// Human-readable threshold calculation; diagnostic only, never read
    /// back by any component.
    pub explanation: String,
}

impl Decision {
    /// A no-jump decision with no obstacle context.
    pub fn hold(reason: ReasonTag, explanation: &str) -> Self {
        Self {
            should_jump: false,
            reason,
            distance: 0.0,
            explanation: explanation.to_string(),
        }
    }
}

// src/strategy.rs
//
// Rule engine: the pure jump/no-jump policy.
//
// This module takes a read-only observation plus the current coefficient
// table and returns a Decision. It is deliberately side-effect-free: same
// inputs always produce the same output, and nothing here mutates state or
// performs I/O. Execution (key injection) and recording happen elsewhere.

use crate::params::ParamSet;
use crate::types::{Decision, Observation, Obstacle, ObstacleKind, ReasonTag};

/// Ground obstacles below this height count as the small size class.
pub const SMALL_GROUND_HEIGHT: f64 = 50.0;

/// Scroll speed at which the speed factor starts growing past 1.
pub const SPEED_FACTOR_PIVOT: f64 = 7.0;

/// Relative canvas height of the player's jump apex; birds hovering there
/// trigger the middle-band collision-avoidance override.
const JUMP_APEX_RELATIVE: f64 = 0.55;
const APEX_PROXIMITY_PX: f64 = 10.0;
const APEX_OVERRIDE_DISTANCE: f64 = 40.0;

/// Compute the jump decision for this tick.
pub fn decide(obs: &Observation, params: &ParamSet) -> Decision {
    if obs.obstacles.is_empty() {
        return Decision::hold(ReasonTag::NothingAhead, "no obstacles");
    }
    if obs.player.jumping {
        return Decision::hold(ReasonTag::Airborne, "currently jumping");
    }

    let Some(nearest) = nearest_ahead(obs) else {
        return Decision::hold(ReasonTag::NothingAhead, "no obstacle ahead of player");
    };

    let distance = nearest.x - (obs.player.x + obs.player.width);
    let speed_factor = (obs.speed / SPEED_FACTOR_PIVOT).max(1.0);

    match nearest.kind() {
        ObstacleKind::Ground => decide_ground(nearest, distance, speed_factor, params),
        ObstacleKind::Aerial => decide_aerial(obs, nearest, distance, params),
        ObstacleKind::Unknown => decide_linear(nearest, distance, params),
    }
}

/// Nearest obstacle strictly ahead of the player's x position.
pub fn nearest_ahead(obs: &Observation) -> Option<&Obstacle> {
    obs.obstacles
        .iter()
        .filter(|o| o.x > obs.player.x)
        .min_by(|a, b| a.x.total_cmp(&b.x))
}

fn decide_ground(
    obstacle: &Obstacle,
    distance: f64,
    speed_factor: f64,
    params: &ParamSet,
) -> Decision {
    let (base, speed_trim, height_factor, reason) = if obstacle.height < SMALL_GROUND_HEIGHT {
        (
            params.small_cactus_base,
            params.small_cactus_speed_factor,
            params.small_cactus_height_factor,
            ReasonTag::SmallCactus,
        )
    } else {
        (
            params.large_cactus_base,
            params.large_cactus_speed_factor,
            params.large_cactus_height_factor,
            ReasonTag::LargeCactus,
        )
    };

    let threshold = base * speed_factor * speed_trim * height_factor;
    Decision {
        should_jump: distance < threshold,
        reason,
        distance,
        explanation: format!(
            "threshold={threshold:.1} ({base:.0}x{speed_factor:.2}x{speed_trim:.2}x{height_factor:.2})"
        ),
    }
}

/// Aerial obstacles branch into six exclusive bands by descending relative
/// height. Bands partition [0, 1] exactly at 0.4 / 0.5 / 0.6 / 0.7 / 0.8
/// (strict lower bound, inclusive upper bound), evaluated high-to-low.
fn decide_aerial(
    obs: &Observation,
    obstacle: &Obstacle,
    distance: f64,
    params: &ParamSet,
) -> Decision {
    let canvas_height = obs.canvas.height_or_default();
    let relative_height = if canvas_height > 0.0 && obstacle.y.is_finite() {
        obstacle.y / canvas_height
    } else {
        // Degenerate canvas: assume a middle-band bird.
        0.55
    };

    if relative_height > 0.8 {
        let threshold = params.lowest_bird_threshold;
        return Decision {
            should_jump: distance < threshold,
            reason: ReasonTag::LowestBird,
            distance,
            explanation: format!("threshold={threshold:.1} (fixed)"),
        };
    }

    if relative_height > 0.7 {
        let threshold = (params.bottom_bird_base + obs.speed * params.bottom_bird_speed_factor)
            .min(params.bottom_bird_max_threshold);
        return Decision {
            should_jump: distance < threshold,
            reason: ReasonTag::BottomBird,
            distance,
            explanation: format!(
                "threshold={threshold:.1} (min({:.0}, {:.0}+{:.1}x{:.1}))",
                params.bottom_bird_max_threshold,
                params.bottom_bird_base,
                obs.speed,
                params.bottom_bird_speed_factor,
            ),
        };
    }

    if relative_height > 0.6 {
        let threshold =
            params.medium_bottom_bird_base + obs.speed * params.medium_bottom_bird_speed_factor;
        return Decision {
            should_jump: distance < threshold,
            reason: ReasonTag::MediumBottomBird,
            distance,
            explanation: format!(
                "threshold={threshold:.1} ({:.0}+{:.1}x{:.1})",
                params.medium_bottom_bird_base, obs.speed, params.medium_bottom_bird_speed_factor,
            ),
        };
    }

    if relative_height > 0.5 {
        // Jumping into a bird hovering at the jump apex would put the
        // player's arc straight into it; hold instead.
        let apex = canvas_height * JUMP_APEX_RELATIVE;
        let apex_gap = (obstacle.y - apex).abs();
        if apex_gap < APEX_PROXIMITY_PX && distance < APEX_OVERRIDE_DISTANCE {
            return Decision {
                should_jump: false,
                reason: ReasonTag::MiddleBirdAvoid,
                distance,
                explanation: format!("apex gap={apex_gap:.1} < {APEX_PROXIMITY_PX:.0}"),
            };
        }

        let threshold = params.middle_bird_base + obs.speed * params.middle_bird_speed_factor;
        return Decision {
            should_jump: distance < threshold,
            reason: ReasonTag::MiddleBird,
            distance,
            explanation: format!(
                "threshold={threshold:.1} ({:.0}+{:.1}x{:.1})",
                params.middle_bird_base, obs.speed, params.middle_bird_speed_factor,
            ),
        };
    }

    if relative_height > 0.4 {
        let threshold =
            params.medium_top_bird_base + obs.speed * params.medium_top_bird_speed_factor;
        return Decision {
            should_jump: distance < threshold,
            reason: ReasonTag::MediumTopBird,
            distance,
            explanation: format!(
                "threshold={threshold:.1} ({:.0}+{:.1}x{:.1})",
                params.medium_top_bird_base, obs.speed, params.medium_top_bird_speed_factor,
            ),
        };
    }

    // Unreachably high; running under it is always safe.
    Decision {
        should_jump: false,
        reason: ReasonTag::HighBird,
        distance,
        explanation: format!("relative height={relative_height:.2} <= 0.4"),
    }
}

/// Linear-combination fallback for unknown obstacle kinds: smaller distance
/// and taller obstacle both push the combined feature below the threshold.
fn decide_linear(obstacle: &Obstacle, distance: f64, params: &ParamSet) -> Decision {
    let height_norm = obstacle.height / params.pca_height_factor;
    let distance_norm = distance / params.pca_distance_factor;
    let combined = distance_norm - params.pca_height_weight * height_norm;

    Decision {
        should_jump: combined < params.pca_threshold,
        reason: ReasonTag::LinearFallback,
        distance,
        explanation: format!(
            "{distance_norm:.2}-{:.2}x{height_norm:.2}={combined:.2} vs {:.2}",
            params.pca_height_weight, params.pca_threshold,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanvasSize, PlayerState};

    fn obs_with(obstacle: Obstacle, speed: f64, canvas_height: f64) -> Observation {
        Observation {
            player: PlayerState {
                x: 20.0,
                y: 90.0,
                width: 44.0,
                height: 47.0,
                jumping: false,
            },
            obstacles: vec![obstacle],
            speed,
            canvas: CanvasSize {
                width: 600.0,
                height: canvas_height,
            },
        }
    }

    fn cactus(x: f64, height: f64) -> Obstacle {
        Obstacle {
            type_name: "CACTUS_SMALL".to_string(),
            x,
            y: 100.0,
            width: 17.0,
            height,
        }
    }

    fn bird(x: f64, y: f64) -> Obstacle {
        Obstacle {
            type_name: "PTERODACTYL".to_string(),
            x,
            y,
            width: 46.0,
            height: 40.0,
        }
    }

    #[test]
    fn airborne_player_never_jumps() {
        let mut obs = obs_with(cactus(70.0, 30.0), 7.0, 150.0);
        obs.player.jumping = true;
        let d = decide(&obs, &ParamSet::default());
        assert!(!d.should_jump);
        assert_eq!(d.reason, ReasonTag::Airborne);
    }

    #[test]
    fn empty_horizon_holds() {
        let mut obs = obs_with(cactus(70.0, 30.0), 7.0, 150.0);
        obs.obstacles.clear();
        let d = decide(&obs, &ParamSet::default());
        assert_eq!(d.reason, ReasonTag::NothingAhead);
    }

    #[test]
    fn obstacles_behind_the_player_are_ignored() {
        let mut obs = obs_with(cactus(5.0, 30.0), 7.0, 150.0);
        obs.obstacles.push(cactus(10.0, 30.0));
        let d = decide(&obs, &ParamSet::default());
        assert_eq!(d.reason, ReasonTag::NothingAhead);
    }

    #[test]
    fn nearest_ahead_wins_over_farther_obstacles() {
        // Player front edge at 64; obstacles at 300 and 80 -> 80 is decisive.
        let mut obs = obs_with(cactus(300.0, 30.0), 7.0, 150.0);
        obs.obstacles.push(cactus(80.0, 30.0));
        let d = decide(&obs, &ParamSet::default());
        assert_eq!(d.reason, ReasonTag::SmallCactus);
        assert!(d.should_jump); // distance 16 < 36
    }

    #[test]
    fn small_cactus_reference_scenario() {
        // height=30, distance=20, speed=7 => speed factor 1,
        // threshold = 60 * 1 * 1 * 0.6 = 36 and 20 < 36 -> jump.
        let obs = obs_with(cactus(84.0, 30.0), 7.0, 150.0);
        let d = decide(&obs, &ParamSet::default());
        assert!(d.should_jump);
        assert_eq!(d.reason, ReasonTag::SmallCactus);
        assert!((d.distance - 20.0).abs() < 1e-9);
    }

    #[test]
    fn large_cactus_uses_wider_threshold() {
        // Same geometry, height 50 -> large class, threshold 54.
        let obs = obs_with(cactus(84.0 + 30.0, 50.0), 7.0, 150.0);
        let d = decide(&obs, &ParamSet::default());
        assert_eq!(d.reason, ReasonTag::LargeCactus);
        assert!(d.should_jump); // distance 50 < 54
    }

    #[test]
    fn ground_threshold_monotone_in_speed() {
        // Increasing scroll speed never shrinks the effective threshold:
        // find the largest jumping distance at each speed and check order.
        let params = ParamSet::default();
        let mut last_threshold = 0.0;
        for speed_tenths in 0..300 {
            let speed = speed_tenths as f64 * 0.1;
            let speed_factor = (speed / SPEED_FACTOR_PIVOT).max(1.0);
            let threshold = params.small_cactus_base
                * speed_factor
                * params.small_cactus_speed_factor
                * params.small_cactus_height_factor;
            assert!(threshold >= last_threshold - 1e-12);
            last_threshold = threshold;

            // Spot-check against the engine on both sides of the boundary.
            let inside = obs_with(cactus(64.0 + threshold - 0.5, 30.0), speed, 150.0);
            assert!(decide(&inside, &params).should_jump);
            let outside = obs_with(cactus(64.0 + threshold + 0.5, 30.0), speed, 150.0);
            assert!(!decide(&outside, &params).should_jump);
        }
    }

    #[test]
    fn aerial_bands_partition_unit_interval() {
        // For every relative height exactly one band fires: dense sweep.
        let params = ParamSet::default();
        for i in 0..=10_000 {
            let rel = i as f64 / 10_000.0;
            let obs = obs_with(bird(400.0, rel * 150.0), 8.0, 150.0);
            let d = decide(&obs, &params);
            let expected = if rel > 0.8 {
                ReasonTag::LowestBird
            } else if rel > 0.7 {
                ReasonTag::BottomBird
            } else if rel > 0.6 {
                ReasonTag::MediumBottomBird
            } else if rel > 0.5 {
                ReasonTag::MiddleBird
            } else if rel > 0.4 {
                ReasonTag::MediumTopBird
            } else {
                ReasonTag::HighBird
            };
            assert_eq!(d.reason, expected, "relative height {rel}");
        }
    }

    #[test]
    fn band_boundaries_are_upper_inclusive() {
        let params = ParamSet::default();
        // Exactly 0.8 belongs to the bottom band, not the lowest.
        let d = decide(&obs_with(bird(400.0, 120.0), 8.0, 150.0), &params);
        assert_eq!(d.reason, ReasonTag::BottomBird);
        // Exactly 0.4 is the high band.
        let d = decide(&obs_with(bird(400.0, 60.0), 8.0, 150.0), &params);
        assert_eq!(d.reason, ReasonTag::HighBird);
    }

    #[test]
    fn high_bird_never_jumps_regardless_of_distance() {
        // y=40, canvas=150 -> relative ~0.267.
        let params = ParamSet::default();
        for x in [65.0, 80.0, 120.0, 500.0] {
            let d = decide(&obs_with(bird(x, 40.0), 10.0, 150.0), &params);
            assert!(!d.should_jump);
            assert_eq!(d.reason, ReasonTag::HighBird);
        }
    }

    #[test]
    fn bottom_bird_threshold_is_capped() {
        let params = ParamSet::default();
        // speed 13 -> uncapped 40 + 26 = 66, capped at 60. Distance 62 holds.
        let d = decide(&obs_with(bird(64.0 + 62.0, 0.75 * 150.0), 13.0, 150.0), &params);
        assert_eq!(d.reason, ReasonTag::BottomBird);
        assert!(!d.should_jump);
        // Distance 59 jumps.
        let d = decide(&obs_with(bird(64.0 + 59.0, 0.75 * 150.0), 13.0, 150.0), &params);
        assert!(d.should_jump);
    }

    #[test]
    fn apex_hover_forces_hold_in_middle_band() {
        // canvas=150 -> apex at 82.5; y=85 is a 0.567 relative height with
        // apex gap 2.5 < 10, and distance 30 < 40 triggers the override even
        // though the generic middle-band threshold (65 + 3s) would allow it.
        let params = ParamSet::default();
        let d = decide(&obs_with(bird(64.0 + 30.0, 85.0), 8.0, 150.0), &params);
        assert!(!d.should_jump);
        assert_eq!(d.reason, ReasonTag::MiddleBirdAvoid);

        // Same bird farther out decides normally.
        let d = decide(&obs_with(bird(64.0 + 45.0, 85.0), 8.0, 150.0), &params);
        assert_eq!(d.reason, ReasonTag::MiddleBird);
        assert!(d.should_jump); // 45 < 65 + 24
    }

    #[test]
    fn unknown_kind_falls_back_to_linear_rule() {
        let obstacle = Obstacle {
            type_name: "ROCK".to_string(),
            x: 64.0 + 50.0,
            y: 100.0,
            width: 20.0,
            height: 40.0,
        };
        let d = decide(&obs_with(obstacle, 7.0, 150.0), &ParamSet::default());
        assert_eq!(d.reason, ReasonTag::LinearFallback);
        // 50/100 - 0.5 * 40/50 = 0.1 < 1.0 -> jump.
        assert!(d.should_jump);
    }

    #[test]
    fn decision_is_deterministic() {
        let obs = obs_with(bird(400.0, 110.0), 9.5, 150.0);
        let params = ParamSet::default();
        let a = decide(&obs, &params);
        let b = decide(&obs, &params);
        assert_eq!(a.should_jump, b.should_jump);
        assert_eq!(a.reason, b.reason);
        assert_eq!(a.distance, b.distance);
        assert_eq!(a.explanation, b.explanation);
    }

    #[test]
    fn missing_canvas_height_uses_stock_default() {
        // canvas height 0 -> treated as 150, so y=130 is the lowest band.
        let d = decide(&obs_with(bird(400.0, 130.0), 8.0, 0.0), &ParamSet::default());
        assert_eq!(d.reason, ReasonTag::LowestBird);
    }
}

// Decision-engine contract tests against the public API.

use dinopilot::types::{CanvasSize, PlayerState};
use dinopilot::{decide, Observation, Obstacle, ParamSet, ReasonTag};

fn observation(obstacles: Vec<Obstacle>, speed: f64, canvas_height: f64) -> Observation {
    Observation {
        player: PlayerState {
            x: 20.0,
            y: 90.0,
            width: 44.0,
            height: 47.0,
            jumping: false,
        },
        obstacles,
        speed,
        canvas: CanvasSize {
            width: 600.0,
            height: canvas_height,
        },
    }
}

fn cactus_at_distance(distance: f64, height: f64) -> Obstacle {
    Obstacle {
        // Player front edge sits at x = 64.
        type_name: "CACTUS_SMALL".to_string(),
        x: 64.0 + distance,
        y: 105.0,
        width: 17.0,
        height,
    }
}

fn bird(distance: f64, y: f64) -> Obstacle {
    Obstacle {
        type_name: "PTERODACTYL".to_string(),
        x: 64.0 + distance,
        y,
        width: 46.0,
        height: 40.0,
    }
}

/// Exactly one aerial band fires for every relative height in [0, 1]:
/// dense sweep across the unit interval, including the boundary values.
#[test]
fn aerial_bands_partition_without_gap_or_overlap() {
    let params = ParamSet::default();
    let canvas_height = 150.0;

    let aerial_reasons = [
        ReasonTag::LowestBird,
        ReasonTag::BottomBird,
        ReasonTag::MediumBottomBird,
        ReasonTag::MiddleBird,
        ReasonTag::MiddleBirdAvoid,
        ReasonTag::MediumTopBird,
        ReasonTag::HighBird,
    ];

    for i in 0..=5_000 {
        let rel = i as f64 / 5_000.0;
        let obs = observation(vec![bird(300.0, rel * canvas_height)], 8.0, canvas_height);
        let decision = decide(&obs, &params);
        assert!(
            aerial_reasons.contains(&decision.reason),
            "relative height {rel} produced non-aerial reason {:?}",
            decision.reason,
        );
    }

    // Boundary spot checks: upper bounds are inclusive.
    let at = |rel: f64| {
        let obs = observation(vec![bird(300.0, rel * canvas_height)], 8.0, canvas_height);
        decide(&obs, &params).reason
    };
    assert_eq!(at(0.85), ReasonTag::LowestBird);
    assert_eq!(at(0.8), ReasonTag::BottomBird);
    assert_eq!(at(0.7), ReasonTag::MediumBottomBird);
    assert_eq!(at(0.6), ReasonTag::MiddleBird);
    assert_eq!(at(0.5), ReasonTag::MediumTopBird);
    assert_eq!(at(0.4), ReasonTag::HighBird);
    assert_eq!(at(0.0), ReasonTag::HighBird);
}

/// Increasing scroll speed never shrinks the effective ground threshold:
/// any distance that jumps at speed s still jumps at any s' > s.
#[test]
fn ground_threshold_monotone_in_scroll_speed() {
    let params = ParamSet::default();
    let distances = [10.0, 25.0, 36.0, 48.0, 70.0, 95.0];

    for &distance in &distances {
        let mut jumped_before = false;
        for speed_steps in 0..100 {
            let speed = speed_steps as f64 * 0.25;
            let obs = observation(vec![cactus_at_distance(distance, 30.0)], speed, 150.0);
            let jumps = decide(&obs, &params).should_jump;
            if jumped_before {
                assert!(
                    jumps,
                    "distance {distance} stopped jumping when speed rose to {speed}"
                );
            }
            jumped_before = jumps;
        }
    }
}

/// Same observation + same parameters -> identical decision.
#[test]
fn decision_is_idempotent() {
    let params = ParamSet::default();
    let obs = observation(vec![bird(80.0, 110.0)], 9.0, 150.0);

    let a = decide(&obs, &params);
    let b = decide(&obs, &params);
    assert_eq!(a.should_jump, b.should_jump);
    assert_eq!(a.reason, b.reason);
    assert_eq!(a.distance, b.distance);
    assert_eq!(a.explanation, b.explanation);
}

/// Small ground obstacle at the reference geometry: threshold
/// 60 x 1 x 0.6 = 36, distance 20 -> jump.
#[test]
fn small_ground_obstacle_reference_scenario() {
    let obs = observation(vec![cactus_at_distance(20.0, 30.0)], 7.0, 150.0);
    let decision = decide(&obs, &ParamSet::default());
    assert!(decision.should_jump);
    assert_eq!(decision.reason, ReasonTag::SmallCactus);
    assert!((decision.distance - 20.0).abs() < 1e-9);
}

/// A bird at relative height <= 0.4 never triggers a jump, regardless of
/// how close it is.
#[test]
fn high_bird_never_jumps() {
    let params = ParamSet::default();
    for distance in [1.0, 10.0, 30.0, 60.0, 200.0] {
        // y = 40, canvas 150 -> relative ~0.267.
        let obs = observation(vec![bird(distance, 40.0)], 11.0, 150.0);
        let decision = decide(&obs, &params);
        assert!(!decision.should_jump, "jumped at distance {distance}");
        assert_eq!(decision.reason, ReasonTag::HighBird);
    }
}

/// Middle-band bird hovering at the jump apex forces a hold even though the
/// generic middle-band threshold would allow the jump.
#[test]
fn apex_override_beats_middle_band_threshold() {
    let params = ParamSet::default();
    // canvas 150 -> apex 82.5; y = 85 gives relative 0.567, apex gap 2.5.
    let obs = observation(vec![bird(30.0, 85.0)], 8.0, 150.0);
    let decision = decide(&obs, &params);
    assert!(!decision.should_jump);
    assert_eq!(decision.reason, ReasonTag::MiddleBirdAvoid);

    // Generic middle-band threshold 65 + 8 x 3 = 89 would have jumped.
    let threshold = params.middle_bird_base + 8.0 * params.middle_bird_speed_factor;
    assert!(30.0 < threshold);
}

// src/params.rs
//
// Adaptive parameter store.
//
// The rule engine (src/strategy.rs) reads every threshold from the current
// ParamSet, so behaviour tracks learning updates. The learning loop applies
// a multiplicative adjustment vector (one entry in [-1, 1] per parameter)
// against the *defaults*, scaled by parameter role, and every value is then
// clamped into [0.5 x default, 1.5 x default].

use std::collections::VecDeque;

/// Number of tracked coefficients.
pub const PARAM_COUNT: usize = 20;

/// Snapshots retained for observability.
pub const HISTORY_CAP: usize = 20;

/// How strongly an adjustment in [-1, 1] moves a parameter of each role.
///
/// Thresholds are the dominant behaviour lever and get the largest swing;
/// multiplicative factors are fine corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    Threshold,
    Factor,
    Weight,
}

impl ParamRole {
    pub fn adjustment_scale(self) -> f64 {
        match self {
            ParamRole::Threshold => 0.25,
            ParamRole::Factor => 0.08,
            ParamRole::Weight => 0.15,
        }
    }
}

/// The full coefficient table parameterizing the rule engine.
///
/// Grouped as: ground obstacles (2 size classes x 3), aerial obstacles
/// (6 height bands), and the linear-fallback combination.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSet {
    // ----- Ground obstacles -----
    /// Base jump distance for small ground obstacles (height < 50).
    pub small_cactus_base: f64,
    /// Multiplicative trim on the environment speed factor (small).
    pub small_cactus_speed_factor: f64,
    /// Height scaling for small ground obstacles.
    pub small_cactus_height_factor: f64,
    /// Base jump distance for large ground obstacles.
    pub large_cactus_base: f64,
    /// Multiplicative trim on the environment speed factor (large).
    pub large_cactus_speed_factor: f64,
    /// Height scaling for large ground obstacles.
    pub large_cactus_height_factor: f64,

    // ----- Aerial obstacles, by descending relative height band -----
    /// Fixed threshold for the lowest band (> 0.8); no speed scaling.
    pub lowest_bird_threshold: f64,
    /// Base threshold for the bottom band (0.7, 0.8].
    pub bottom_bird_base: f64,
    /// Speed coefficient for the bottom band.
    pub bottom_bird_speed_factor: f64,
    /// Cap on the bottom band threshold.
    pub bottom_bird_max_threshold: f64,
    /// Base threshold for the medium-bottom band (0.6, 0.7].
    pub medium_bottom_bird_base: f64,
    /// Speed coefficient for the medium-bottom band.
    pub medium_bottom_bird_speed_factor: f64,
    /// Base threshold for the middle band (0.5, 0.6].
    pub middle_bird_base: f64,
    /// Speed coefficient for the middle band.
    pub middle_bird_speed_factor: f64,
    /// Base threshold for the medium-top band (0.4, 0.5].
    pub medium_top_bird_base: f64,
    /// Speed coefficient for the medium-top band.
    pub medium_top_bird_speed_factor: f64,

    // ----- Linear fallback -----
    /// Distance normalizer.
    pub pca_distance_factor: f64,
    /// Height normalizer.
    pub pca_height_factor: f64,
    /// Weight of the height term.
    pub pca_height_weight: f64,
    /// Jump threshold on the combined feature.
    pub pca_threshold: f64,
}

impl Default for ParamSet {
    fn default() -> Self {
        Self {
            small_cactus_base: 60.0,
            small_cactus_speed_factor: 1.0,
            small_cactus_height_factor: 0.6,
            large_cactus_base: 60.0,
            large_cactus_speed_factor: 1.0,
            large_cactus_height_factor: 0.9,
            lowest_bird_threshold: 35.0,
            bottom_bird_base: 40.0,
            bottom_bird_speed_factor: 2.0,
            bottom_bird_max_threshold: 60.0,
            medium_bottom_bird_base: 55.0,
            medium_bottom_bird_speed_factor: 1.5,
            middle_bird_base: 65.0,
            middle_bird_speed_factor: 3.0,
            medium_top_bird_base: 50.0,
            medium_top_bird_speed_factor: 2.0,
            pca_distance_factor: 100.0,
            pca_height_factor: 50.0,
            pca_height_weight: 0.5,
            pca_threshold: 1.0,
        }
    }
}

impl ParamSet {
    /// Flatten into the canonical vector order used by the learning loop.
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.small_cactus_base,
            self.small_cactus_speed_factor,
            self.small_cactus_height_factor,
            self.large_cactus_base,
            self.large_cactus_speed_factor,
            self.large_cactus_height_factor,
            self.lowest_bird_threshold,
            self.bottom_bird_base,
            self.bottom_bird_speed_factor,
            self.bottom_bird_max_threshold,
            self.medium_bottom_bird_base,
            self.medium_bottom_bird_speed_factor,
            self.middle_bird_base,
            self.middle_bird_speed_factor,
            self.medium_top_bird_base,
            self.medium_top_bird_speed_factor,
            self.pca_distance_factor,
            self.pca_height_factor,
            self.pca_height_weight,
            self.pca_threshold,
        ]
    }

    /// Rebuild from the canonical vector order.
    ///
    /// Panics in debug builds if `values` has the wrong length; callers all
    /// pass vectors derived from [`PARAM_COUNT`].
    pub fn from_slice(values: &[f64]) -> Self {
        debug_assert_eq!(values.len(), PARAM_COUNT);
        Self {
            small_cactus_base: values[0],
            small_cactus_speed_factor: values[1],
            small_cactus_height_factor: values[2],
            large_cactus_base: values[3],
            large_cactus_speed_factor: values[4],
            large_cactus_height_factor: values[5],
            lowest_bird_threshold: values[6],
            bottom_bird_base: values[7],
            bottom_bird_speed_factor: values[8],
            bottom_bird_max_threshold: values[9],
            medium_bottom_bird_base: values[10],
            medium_bottom_bird_speed_factor: values[11],
            middle_bird_base: values[12],
            middle_bird_speed_factor: values[13],
            medium_top_bird_base: values[14],
            medium_top_bird_speed_factor: values[15],
            pca_distance_factor: values[16],
            pca_height_factor: values[17],
            pca_height_weight: values[18],
            pca_threshold: values[19],
        }
    }

    /// Role of each coefficient, in canonical vector order.
    pub fn roles() -> [ParamRole; PARAM_COUNT] {
        use ParamRole::{Factor, Threshold, Weight};
        [
            Threshold, // small_cactus_base
            Factor,    // small_cactus_speed_factor
            Factor,    // small_cactus_height_factor
            Threshold, // large_cactus_base
            Factor,    // large_cactus_speed_factor
            Factor,    // large_cactus_height_factor
            Threshold, // lowest_bird_threshold
            Threshold, // bottom_bird_base
            Factor,    // bottom_bird_speed_factor
            Threshold, // bottom_bird_max_threshold
            Threshold, // medium_bottom_bird_base
            Factor,    // medium_bottom_bird_speed_factor
            Threshold, // middle_bird_base
            Factor,    // middle_bird_speed_factor
            Threshold, // medium_top_bird_base
            Factor,    // medium_top_bird_speed_factor
            Factor,    // pca_distance_factor
            Factor,    // pca_height_factor
            Weight,    // pca_height_weight
            Threshold, // pca_threshold
        ]
    }
}

/// Mutable store owning the current coefficient table.
///
/// Mutated only by the learning loop at episode boundaries; read by the rule
/// engine every tick. Single-threaded by design, so no synchronization.
#[derive(Debug, Clone)]
pub struct ParamStore {
    defaults: ParamSet,
    current: ParamSet,
    history: VecDeque<ParamSet>,
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamStore {
    pub fn new() -> Self {
        Self {
            defaults: ParamSet::default(),
            current: ParamSet::default(),
            history: VecDeque::new(),
        }
    }

    /// Current coefficient table.
    pub fn get(&self) -> &ParamSet {
        &self.current
    }

    /// Reset to defaults, returning the restored table.
    pub fn reset(&mut self) -> &ParamSet {
        self.current = self.defaults.clone();
        &self.current
    }

    /// Apply a per-parameter adjustment vector (entries in [-1, 1], canonical
    /// order), then clamp each value into [0.5 x default, 1.5 x default] and
    /// snapshot the result.
    pub fn apply_adjustments(&mut self, adjustments: &[f64]) {
        let defaults = self.defaults.to_vec();
        let roles = ParamSet::roles();
        let mut next = Vec::with_capacity(PARAM_COUNT);

        for i in 0..PARAM_COUNT {
            let adj = adjustments.get(i).copied().unwrap_or(0.0);
            let default = defaults[i];
            let scale = roles[i].adjustment_scale();
            let value = default * (1.0 + adj * scale);
            next.push(value.clamp(default * 0.5, default * 1.5));
        }

        self.current = ParamSet::from_slice(&next);

        self.history.push_back(self.current.clone());
        if self.history.len() > HISTORY_CAP {
            self.history.pop_front();
        }
    }

    /// Recent parameter snapshots, oldest first.
    pub fn history(&self) -> &VecDeque<ParamSet> {
        &self.history
    }
}

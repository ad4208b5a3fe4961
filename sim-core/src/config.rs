//! Construction-time parameters of the growth algorithm.
//!
//! The tree model is 1 unit high and 2 units wide with the root at the
//! origin; every length below is expressed in those units. A TOML file only
//! needs the keys it wants to override, the rest keep their defaults.

use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a segment's width ramps toward its final width.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WidthGrowth {
    /// Add the same increment every step.
    Fixed { increment: f64 },
    /// Add `fraction * final_width` every step.
    Proportional { fraction: f64 },
}

impl WidthGrowth {
    #[inline]
    pub fn increment(&self, final_width: f64) -> f64 {
        match *self {
            WidthGrowth::Fixed { increment } => increment,
            WidthGrowth::Proportional { fraction } => fraction * final_width,
        }
    }
}

/// Whether attracted growth advances a branch's meander phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeanderPhasePolicy {
    /// Phase is frozen while following an attraction angle.
    NaturalOnly,
    /// Phase advances on every growth event.
    Always,
}

/// Which candidate wins when two segments are at exactly the same distance
/// from an attraction point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    FirstFound,
    LastFound,
}

/// Segment a new branch's direction is compared against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnReference {
    /// Direction from the previous segment to the spawning segment.
    Predecessor,
    /// Direction from the branch's first segment to the spawning segment.
    BranchBase,
}

/// Width of the parent segment a new branch's base width is derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchWidthSource {
    FinalWidth,
    CurrentWidth,
}

/// Shape of the crown region attraction points are scattered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrownShape {
    Rect,
    Oval,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Attraction points
    pub attraction_point_count: usize,
    pub influence_radius: f64,
    pub kill_radius: f64,
    pub crown_shape: CrownShape,
    pub crown_half_width: f64,
    pub crown_base_height: f64,
    pub crown_top: f64,
    /// Seed for point placement; `None` draws one from entropy.
    pub seed: Option<u64>,

    // Trunk and widths
    pub trunk_width: f64,
    pub trunk_angle: f64,
    pub trunk_attracted: bool,
    /// Trunk stops growing naturally once its width falls below this fraction of its base width.
    pub min_width_ratio: f64,
    pub width_decay_ratio: f64,
    pub segment_initial_width: f64,
    pub width_growth: WidthGrowth,

    // Growth
    pub step_length: f64,
    pub meander_amplitude_deg: f64,
    pub meander_overtone_ratio: f64,
    /// Radians added to the meander phase per growth event.
    pub meander_phase_step: f64,
    pub meander_phase: MeanderPhasePolicy,
    /// `-1` disables the check.
    pub min_vertical_growth: f64,

    // Branching
    /// `0` disables the lower bound.
    pub min_branching_angle_deg: f64,
    /// `180` disables the upper bound.
    pub max_branching_angle_deg: f64,
    pub max_branches: usize,
    pub branch_width_ratio: f64,
    pub branch_width_source: BranchWidthSource,
    pub spawn_reference: SpawnReference,

    // Nearest-segment search
    pub segment_search_stride: usize,
    pub tie_break: TieBreak,
}

impl Default for Config {
    fn default() -> Self {
        let growth_speed = 0.004;
        Self {
            attraction_point_count: 300,
            influence_radius: 0.4,
            kill_radius: 0.15,
            crown_shape: CrownShape::Rect,
            crown_half_width: 1.0,
            crown_base_height: 0.15,
            crown_top: 1.0,
            seed: None,

            trunk_width: 0.2,
            trunk_angle: PI / 2.0,
            trunk_attracted: true,
            min_width_ratio: 0.2,
            width_decay_ratio: 0.986,
            segment_initial_width: 0.03,
            width_growth: WidthGrowth::Fixed {
                increment: growth_speed * 0.4,
            },

            step_length: growth_speed * 1.4,
            meander_amplitude_deg: 15.0,
            meander_overtone_ratio: 0.8,
            meander_phase_step: PI / 60.0 * 2.5,
            meander_phase: MeanderPhasePolicy::NaturalOnly,
            min_vertical_growth: -0.4,

            min_branching_angle_deg: 8.0,
            max_branching_angle_deg: 172.0,
            max_branches: 2000,
            branch_width_ratio: 0.986,
            branch_width_source: BranchWidthSource::FinalWidth,
            spawn_reference: SpawnReference::Predecessor,

            segment_search_stride: 1,
            tie_break: TieBreak::FirstFound,
        }
    }
}

impl Config {
    /// Parses a (possibly partial) TOML document and validates the result.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Serializes the config, e.g. to write out a starting file for tuning.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason })
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let unit_ratio = |v: f64| v.is_finite() && v > 0.0 && v < 1.0;

        if !positive(self.influence_radius) {
            return invalid("influence_radius", "must be positive");
        }
        if !positive(self.kill_radius) {
            return invalid("kill_radius", "must be positive");
        }
        if self.kill_radius > self.influence_radius {
            return invalid("kill_radius", "must not exceed influence_radius");
        }
        if !positive(self.crown_half_width) {
            return invalid("crown_half_width", "must be positive");
        }
        if !(self.crown_base_height.is_finite() && self.crown_top > self.crown_base_height) {
            return invalid("crown_top", "must be above crown_base_height");
        }
        if !positive(self.trunk_width) {
            return invalid("trunk_width", "must be positive");
        }
        if !self.trunk_angle.is_finite() {
            return invalid("trunk_angle", "must be finite");
        }
        if !unit_ratio(self.min_width_ratio) {
            return invalid("min_width_ratio", "must be in (0, 1)");
        }
        if !unit_ratio(self.width_decay_ratio) {
            return invalid("width_decay_ratio", "must be in (0, 1)");
        }
        if !positive(self.branch_width_ratio) || self.branch_width_ratio > 1.0 {
            return invalid("branch_width_ratio", "must be in (0, 1]");
        }
        if !positive(self.segment_initial_width) {
            return invalid("segment_initial_width", "must be positive");
        }
        let step_ok = match self.width_growth {
            WidthGrowth::Fixed { increment } => positive(increment),
            WidthGrowth::Proportional { fraction } => positive(fraction),
        };
        if !step_ok {
            return invalid("width_growth", "increment must be positive");
        }
        if !positive(self.step_length) {
            return invalid("step_length", "must be positive");
        }
        if !(self.meander_amplitude_deg.is_finite() && self.meander_amplitude_deg >= 0.0) {
            return invalid("meander_amplitude_deg", "must be non-negative");
        }
        if !self.meander_overtone_ratio.is_finite() || !self.meander_phase_step.is_finite() {
            return invalid("meander", "parameters must be finite");
        }
        if !(-1.0..=1.0).contains(&self.min_vertical_growth) {
            return invalid("min_vertical_growth", "must be in [-1, 1]");
        }
        if !(0.0..=180.0).contains(&self.min_branching_angle_deg) {
            return invalid("min_branching_angle_deg", "must be in [0, 180]");
        }
        if !(0.0..=180.0).contains(&self.max_branching_angle_deg)
            || self.max_branching_angle_deg < self.min_branching_angle_deg
        {
            return invalid(
                "max_branching_angle_deg",
                "must be in [min_branching_angle_deg, 180]",
            );
        }
        if self.max_branches == 0 {
            return invalid("max_branches", "must allow at least the trunk");
        }
        if self.segment_search_stride == 0 {
            return invalid("segment_search_stride", "must be at least 1");
        }
        Ok(())
    }

    #[inline]
    pub fn meander_amplitude(&self) -> f64 {
        self.meander_amplitude_deg.to_radians()
    }

    /// Dot products above this mean the new branch would be nearly parallel to its parent.
    #[inline]
    pub fn max_dot_for_branching(&self) -> f64 {
        self.min_branching_angle_deg.to_radians().cos()
    }

    /// Dot products below this mean the new branch would turn back on its parent.
    #[inline]
    pub fn min_dot_for_branching(&self) -> f64 {
        self.max_branching_angle_deg.to_radians().cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_overrides_only_given_keys() {
        let cfg = Config::from_toml_str(
            r#"
            attraction_point_count = 50
            seed = 7
            tie_break = "last_found"

            [width_growth]
            mode = "proportional"
            fraction = 0.05
            "#,
        )
        .unwrap();

        assert_eq!(cfg.attraction_point_count, 50);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.tie_break, TieBreak::LastFound);
        assert_eq!(cfg.width_growth, WidthGrowth::Proportional { fraction: 0.05 });
        assert_eq!(cfg.influence_radius, Config::default().influence_radius);
    }

    #[test]
    fn example_config_file_parses() {
        let cfg = Config::from_toml_str(include_str!("../../tree.example.toml")).unwrap();
        assert_eq!(cfg.attraction_point_count, 500);
        assert_eq!(cfg.crown_shape, CrownShape::Oval);
        assert_eq!(cfg.meander_phase, MeanderPhasePolicy::NaturalOnly);
    }

    #[test]
    fn toml_roundtrip_keeps_every_field() {
        let mut cfg = Config::default();
        cfg.seed = Some(99);
        cfg.crown_shape = CrownShape::Oval;
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::from_toml_str("influence_radius = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut cfg = Config::default();
        cfg.kill_radius = cfg.influence_radius * 2.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "kill_radius", .. })
        ));

        let mut cfg = Config::default();
        cfg.width_decay_ratio = 1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.min_branching_angle_deg = 30.0;
        cfg.max_branching_angle_deg = 20.0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.segment_search_stride = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn branching_window_sentinels_disable_both_bounds() {
        let mut cfg = Config::default();
        cfg.min_branching_angle_deg = 0.0;
        cfg.max_branching_angle_deg = 180.0;
        assert!((cfg.max_dot_for_branching() - 1.0).abs() < 1e-12);
        assert!((cfg.min_dot_for_branching() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn width_growth_increment_modes() {
        assert_eq!(WidthGrowth::Fixed { increment: 0.1 }.increment(5.0), 0.1);
        assert_eq!(WidthGrowth::Proportional { fraction: 0.1 }.increment(5.0), 0.5);
    }
}

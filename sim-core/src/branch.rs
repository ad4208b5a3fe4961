//! Branches and their per-step growth state machine.
//!
//! Each step a branch is either grown once (toward an attraction angle or
//! along its own meander) or left alone. The `grew_this_step` marker makes
//! any second growth request within the same step a no-op.

use crate::config::{Config, MeanderPhasePolicy};
use crate::segment::Segment;
use crate::types::BranchId;
use crate::vector::{Vector2, unit_at};

#[derive(Clone, Debug)]
pub struct Branch {
    pub id: BranchId,
    /// Direction natural growth meanders around.
    pub base_angle: f64,
    pub base_width: f64,
    /// Final width handed to the next appended segment; only ever decays.
    pub current_width: f64,
    /// Below this the trunk stops growing unless attracted.
    pub min_width: f64,
    pub is_trunk: bool,
    /// 1 for the trunk, parent level + 1 for laterals.
    pub level: u32,
    pub segments: Vec<Segment>,
    pub meander_phase: f64,
    pub grew_this_step: bool,
}

impl Branch {
    pub fn new(
        id: BranchId,
        origin: Vector2,
        base_angle: f64,
        base_width: f64,
        is_trunk: bool,
        level: u32,
        cfg: &Config,
    ) -> Self {
        Self {
            id,
            base_angle,
            base_width,
            current_width: base_width,
            min_width: cfg.min_width_ratio * base_width,
            is_trunk,
            level,
            segments: vec![Segment::new(origin, base_width, cfg.segment_initial_width)],
            meander_phase: 0.0,
            grew_this_step: false,
        }
    }

    /// The trunk, rooted at the origin.
    pub fn trunk(id: BranchId, cfg: &Config) -> Self {
        Self::new(id, Vector2::ZERO, cfg.trunk_angle, cfg.trunk_width, true, 1, cfg)
    }

    #[inline]
    pub fn tip(&self) -> &Segment {
        &self.segments[self.segments.len() - 1]
    }

    #[inline]
    pub fn tip_index(&self) -> usize {
        self.segments.len() - 1
    }

    /// Offset from `base_angle` used for unattracted growth: the fundamental
    /// plus its first overtone at reduced amplitude.
    pub fn meander_offset(&self, cfg: &Config) -> f64 {
        let amplitude = cfg.meander_amplitude();
        self.meander_phase.sin() * amplitude
            + (2.0 * self.meander_phase).sin() * cfg.meander_overtone_ratio * amplitude
    }

    /// Appends one segment past the tip.
    ///
    /// `angle` is an absolute direction in radians; without one the branch
    /// meanders around its base angle.
    pub fn grow(&mut self, angle: Option<f64>, cfg: &Config) {
        let (segment_angle, natural) = match angle {
            Some(a) => (a, false),
            None => (self.base_angle + self.meander_offset(cfg), true),
        };

        let tip = self.tip_index();
        let pos = self.segments[tip].pos + unit_at(segment_angle) * cfg.step_length;

        // old tip loses the flag before the new segment exists
        self.segments[tip].is_tip = false;
        self.segments
            .push(Segment::new(pos, self.current_width, cfg.segment_initial_width));

        if natural || cfg.meander_phase == MeanderPhasePolicy::Always {
            self.meander_phase += cfg.meander_phase_step;
        }
        self.current_width *= cfg.width_decay_ratio;
        self.grew_this_step = true;
    }

    /// Runs this branch's growth policy for the current step.
    ///
    /// Returns `true` if a segment was appended.
    pub fn update(&mut self, angle: Option<f64>, cfg: &Config) -> bool {
        if self.grew_this_step {
            return false;
        }

        for segment in &mut self.segments {
            segment.update(&cfg.width_growth);
        }

        if angle.is_none() {
            // laterals never grow on their own, the trunk only until it thins out
            let trunk_done = self.is_trunk && self.current_width < self.min_width;
            if !self.is_trunk || trunk_done {
                return false;
            }
        }

        self.grow(angle, cfg);
        true
    }

    /// Resets the growth marker, returning whether the branch grew this step.
    pub fn clear_growth_marker(&mut self) -> bool {
        std::mem::take(&mut self.grew_this_step)
    }

    pub fn clear_assigned_points(&mut self) {
        for segment in &mut self.segments {
            segment.clear_assigned_points();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn straight_cfg() -> Config {
        let mut cfg = Config::default();
        cfg.meander_amplitude_deg = 0.0;
        cfg
    }

    fn tip_count(b: &Branch) -> usize {
        b.segments.iter().filter(|s| s.is_tip).count()
    }

    #[test]
    fn trunk_starts_with_a_single_tip_at_origin() {
        let cfg = Config::default();
        let trunk = Branch::trunk(1, &cfg);

        assert_eq!(trunk.segments.len(), 1);
        assert_eq!(trunk.tip().pos, Vector2::ZERO);
        assert!(trunk.tip().is_tip);
        assert_eq!(trunk.level, 1);
        assert!((trunk.min_width - cfg.min_width_ratio * cfg.trunk_width).abs() < 1e-12);
    }

    #[test]
    fn natural_growth_follows_base_angle_at_zero_phase() {
        let cfg = Config::default();
        let mut trunk = Branch::trunk(1, &cfg);

        assert!(trunk.update(None, &cfg));

        let tip = trunk.tip().pos;
        assert!(tip.x.abs() < 1e-12);
        assert!((tip.y - cfg.step_length).abs() < 1e-12);
        assert!((trunk.meander_phase - cfg.meander_phase_step).abs() < 1e-12);
    }

    #[test]
    fn grow_moves_tip_flag_and_decays_width() {
        let cfg = straight_cfg();
        let mut trunk = Branch::trunk(1, &cfg);

        trunk.grow(Some(0.0), &cfg);

        assert_eq!(trunk.segments.len(), 2);
        assert!(!trunk.segments[0].is_tip);
        assert!(trunk.segments[1].is_tip);
        assert_eq!(tip_count(&trunk), 1);
        // an attraction angle of exactly zero points right
        assert!((trunk.tip().pos.x - cfg.step_length).abs() < 1e-12);
        assert_eq!(trunk.segments[1].final_width, cfg.trunk_width);
        assert!((trunk.current_width - cfg.trunk_width * cfg.width_decay_ratio).abs() < 1e-12);
        assert!(trunk.grew_this_step);
    }

    #[test]
    fn at_most_one_growth_per_step() {
        let cfg = Config::default();
        let mut trunk = Branch::trunk(1, &cfg);

        assert!(trunk.update(Some(FRAC_PI_2), &cfg));
        assert!(!trunk.update(Some(FRAC_PI_2), &cfg));
        assert!(!trunk.update(None, &cfg));
        assert_eq!(trunk.segments.len(), 2);

        assert!(trunk.clear_growth_marker());
        assert!(!trunk.clear_growth_marker());
        assert!(trunk.update(None, &cfg));
        assert_eq!(trunk.segments.len(), 3);
    }

    #[test]
    fn lateral_never_grows_unattracted() {
        let cfg = Config::default();
        let mut lateral = Branch::new(2, Vector2::new(0.0, 0.5), 0.3, 0.05, false, 2, &cfg);

        assert!(!lateral.update(None, &cfg));
        assert_eq!(lateral.segments.len(), 1);
        assert!(lateral.update(Some(0.3), &cfg));
        assert_eq!(lateral.segments.len(), 2);
    }

    #[test]
    fn trunk_natural_growth_stops_below_min_width_but_attraction_continues() {
        let cfg = Config::default();
        let mut trunk = Branch::trunk(1, &cfg);

        let mut steps = 0;
        while trunk.update(None, &cfg) {
            trunk.clear_growth_marker();
            steps += 1;
            assert!(steps < 10_000);
        }
        assert!(trunk.current_width < trunk.min_width);
        let len = trunk.segments.len();

        trunk.clear_growth_marker();
        assert!(!trunk.update(None, &cfg));
        assert_eq!(trunk.segments.len(), len);

        trunk.clear_growth_marker();
        assert!(trunk.update(Some(FRAC_PI_2), &cfg));
        assert_eq!(trunk.segments.len(), len + 1);
    }

    #[test]
    fn meander_phase_policy_controls_attracted_growth() {
        let mut cfg = Config::default();
        cfg.meander_phase = MeanderPhasePolicy::NaturalOnly;
        let mut frozen = Branch::trunk(1, &cfg);
        frozen.grow(Some(1.0), &cfg);
        assert_eq!(frozen.meander_phase, 0.0);

        cfg.meander_phase = MeanderPhasePolicy::Always;
        let mut advancing = Branch::trunk(1, &cfg);
        advancing.grow(Some(1.0), &cfg);
        assert!((advancing.meander_phase - cfg.meander_phase_step).abs() < 1e-12);
    }

    #[test]
    fn segment_widths_advance_on_update_even_without_growth() {
        let cfg = Config::default();
        let mut lateral = Branch::new(2, Vector2::ZERO, 0.0, 0.1, false, 2, &cfg);
        let before = lateral.segments[0].width;

        lateral.update(None, &cfg);

        assert!(lateral.segments[0].width > before);
        assert!(lateral.segments[0].width <= lateral.segments[0].final_width);
    }
}

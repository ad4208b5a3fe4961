use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::{
    attractor::{AttractionPoint, AttractorSet},
    branch::Branch,
    config::Config,
    error::{ConfigError, TreeError},
    phases,
    types::BranchId,
    vector::Vector2,
};

/// Summary of one simulation step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Branches that appended a segment, spawned branches included.
    pub grown_branches: usize,
    pub spawned_branches: usize,
    pub dropped_spawns: usize,
    pub consumed_points: usize,
}

/// Counts reported to the presentation layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeMetrics {
    pub branches: usize,
    pub segments: usize,
    pub attraction_points: usize,
    pub steps: usize,
}

/// The growing tree together with the attraction points it feeds on.
#[derive(Debug)]
pub struct Tree {
    cfg: Config,
    branches: Vec<Branch>,
    attractors: AttractorSet,
    fully_grown: bool,
    next_branch_id: BranchId,
    steps: usize,
    seed: Option<u64>,
}

impl Tree {
    /// Creates a trunk and scatters `cfg.attraction_point_count` points over
    /// the crown, seeded from `cfg.seed` (or from entropy if unset).
    pub fn new(cfg: Config) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let seed = cfg.seed.unwrap_or_else(rand::random);
        info!(seed, points = cfg.attraction_point_count, "seeding attraction points");

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let attractors = AttractorSet::random_in_crown(&cfg, &mut rng);

        let mut tree = Self::from_parts(cfg, attractors);
        tree.seed = Some(seed);
        Ok(tree)
    }

    /// Creates a trunk with an explicit set of attraction points, each using
    /// the configured influence and kill radii.
    pub fn with_attraction_points(
        cfg: Config,
        positions: Vec<Vector2>,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let attractors =
            AttractorSet::from_positions(positions, cfg.influence_radius, cfg.kill_radius);
        Ok(Self::from_parts(cfg, attractors))
    }

    fn from_parts(cfg: Config, attractors: AttractorSet) -> Self {
        Self {
            branches: vec![Branch::trunk(1, &cfg)],
            cfg,
            attractors,
            fully_grown: false,
            next_branch_id: 2,
            steps: 0,
            seed: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn attraction_points(&self) -> &[AttractionPoint] {
        &self.attractors.points
    }

    pub fn is_fully_grown(&self) -> bool {
        self.fully_grown
    }

    /// Steps actually simulated so far; no-op calls on a grown tree are not counted.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Seed the attraction points were placed with, when the tree drew them itself.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn segment_count(&self) -> usize {
        self.branches.iter().map(|b| b.segments.len()).sum()
    }

    pub fn metrics(&self) -> TreeMetrics {
        TreeMetrics {
            branches: self.branches.len(),
            segments: self.segment_count(),
            attraction_points: self.attractors.len(),
            steps: self.steps,
        }
    }

    /// Injects a later batch of attraction points.
    ///
    /// A fully grown tree stays flagged as such; follow up with
    /// [`Tree::force_step`] to let it react to the new points.
    pub fn add_attraction_points(&mut self, batch: AttractorSet) {
        debug!(count = batch.len(), "adding attraction points");
        self.attractors.extend(batch);
    }

    /// Advances the simulation by one step. Once the tree is fully grown this
    /// does nothing and returns an empty report.
    pub fn update(&mut self) -> StepReport {
        if self.fully_grown {
            return StepReport::default();
        }
        self.force_step()
    }

    /// Runs one step regardless of the fully-grown flag, then recomputes it.
    pub fn force_step(&mut self) -> StepReport {
        phases::reset_phase(&mut self.branches);

        let attracted = phases::assignment_phase(&mut self.branches, &self.attractors, &self.cfg);
        let growth = phases::growth_phase(
            &mut self.branches,
            &attracted,
            &self.attractors,
            &self.cfg,
            &mut self.next_branch_id,
        );
        let consumed_points = phases::kill_phase(&self.branches, &mut self.attractors);
        let grown_branches = phases::advance_phase(&mut self.branches, &self.cfg);

        self.steps += 1;
        let was_grown = self.fully_grown;
        self.fully_grown = grown_branches == 0;

        let report = StepReport {
            grown_branches,
            spawned_branches: growth.spawned_branches,
            dropped_spawns: growth.dropped_spawns,
            consumed_points,
        };
        debug!(step = self.steps, ?report, "step");

        if self.fully_grown && !was_grown {
            let m = self.metrics();
            info!(
                steps = m.steps,
                branches = m.branches,
                segments = m.segments,
                attraction_points = m.attraction_points,
                "tree fully grown"
            );
        }

        report
    }

    /// Steps until the tree is fully grown.
    ///
    /// ### Returns
    /// The number of steps taken, or [`TreeError::StepLimit`] if the tree is
    /// still growing after `max_steps`.
    pub fn grow_to_completion(&mut self, max_steps: usize) -> Result<usize, TreeError> {
        let start = self.steps;
        for _ in 0..max_steps {
            if self.fully_grown {
                break;
            }
            self.update();
        }

        if self.fully_grown {
            Ok(self.steps - start)
        } else {
            Err(TreeError::StepLimit { steps: max_steps })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tree_has_trunk_and_crown_points() {
        let mut cfg = Config::default();
        cfg.seed = Some(3);
        let tree = Tree::new(cfg).unwrap();

        assert_eq!(tree.branches().len(), 1);
        assert!(tree.branches()[0].is_trunk);
        assert_eq!(tree.branches()[0].id, 1);
        assert_eq!(tree.attraction_points().len(), cfg.attraction_point_count);
        assert_eq!(tree.seed(), Some(3));
        assert!(!tree.is_fully_grown());
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut cfg = Config::default();
        cfg.step_length = 0.0;
        assert!(matches!(
            Tree::new(cfg),
            Err(ConfigError::Invalid { field: "step_length", .. })
        ));
    }

    #[test]
    fn update_is_a_no_op_once_fully_grown() {
        let tree_cfg = Config::default();
        let mut tree = Tree::with_attraction_points(tree_cfg, Vec::new()).unwrap();
        tree.grow_to_completion(10_000).unwrap();
        let steps = tree.steps();
        let segments = tree.segment_count();

        assert_eq!(tree.update(), StepReport::default());
        assert_eq!(tree.steps(), steps);
        assert_eq!(tree.segment_count(), segments);
        assert!(tree.is_fully_grown());
    }

    #[test]
    fn force_step_bypasses_flag_and_recomputes_it() {
        let cfg = Config::default();
        let mut tree = Tree::with_attraction_points(cfg, Vec::new()).unwrap();
        tree.grow_to_completion(10_000).unwrap();
        let steps = tree.steps();

        // nothing to grow toward: still fully grown
        tree.force_step();
        assert_eq!(tree.steps(), steps + 1);
        assert!(tree.is_fully_grown());

        // a point beside the trunk tip revives growth
        let tip = tree.branches()[0].tip().pos;
        tree.add_attraction_points(AttractorSet::from_positions(
            vec![tip + Vector2::new(0.3, 0.0)],
            cfg.influence_radius,
            cfg.kill_radius,
        ));
        assert!(tree.is_fully_grown());
        let report = tree.force_step();
        assert_eq!(report.grown_branches, 1);
        assert!(!tree.is_fully_grown());
    }

    #[test]
    fn grow_to_completion_reports_step_limit() {
        let cfg = Config::default();
        let mut tree = Tree::with_attraction_points(cfg, Vec::new()).unwrap();
        assert_eq!(
            tree.grow_to_completion(3),
            Err(TreeError::StepLimit { steps: 3 })
        );
        assert_eq!(tree.steps(), 3);
    }

    #[test]
    fn branch_ids_come_from_the_tree_counter() {
        let mut cfg = Config::default();
        cfg.seed = Some(11);
        let mut a = Tree::new(cfg).unwrap();
        let mut b = Tree::new(cfg).unwrap();
        a.grow_to_completion(10_000).unwrap();
        b.grow_to_completion(10_000).unwrap();

        let ids: Vec<BranchId> = a.branches().iter().map(|br| br.id).collect();
        let expected: Vec<BranchId> = (1..=ids.len() as BranchId).collect();
        assert_eq!(ids, expected);
        // independent instances do not share the counter
        assert_eq!(b.branches().len(), a.branches().len());
        assert_eq!(b.branches()[0].id, 1);
    }

    #[test]
    fn metrics_track_counts() {
        let cfg = Config::default();
        let mut tree = Tree::with_attraction_points(cfg, vec![Vector2::new(0.0, 0.9)]).unwrap();
        tree.update();
        let m = tree.metrics();

        assert_eq!(m.branches, 1);
        assert_eq!(m.segments, 2);
        assert_eq!(m.attraction_points, 1);
        assert_eq!(m.steps, 1);
    }
}

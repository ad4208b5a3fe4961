//! Per-step phases of the space-colonization growth.
//!
//! [`crate::tree::Tree::update`] runs them in this order:
//! 1. [`reset_phase`]: clear every segment's assigned points.
//! 2. [`assignment_phase`]: each attraction point claims its nearest
//!    in-range segment.
//! 3. [`growth_phase`]: attracted tips grow toward their points, attracted
//!    interior segments spawn new branches.
//! 4. [`kill_phase`]: points within kill radius of any segment are removed.
//! 5. [`advance_phase`]: every branch gets its unattracted update, and the
//!    growth markers are collected and cleared.

use tracing::trace;

use crate::{
    attractor::AttractorSet,
    branch::Branch,
    config::{BranchWidthSource, Config, SpawnReference, TieBreak},
    types::{BranchId, SegmentRef},
    vector::{Vector2, Vector2Ext},
};

/// What happened during [`growth_phase`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrowthOutcome {
    pub spawned_branches: usize,
    /// Spawns refused because the branch cap was reached.
    pub dropped_spawns: usize,
}

/// Clears the per-step assignment lists of every segment.
pub fn reset_phase(branches: &mut [Branch]) {
    for branch in branches {
        branch.clear_assigned_points();
    }
}

/// Finds the segment nearest to `pos` that lies strictly within `radius`.
///
/// Branches are scanned in order and each branch from its tip down to
/// segment 1; segment 0 is skipped because it coincides with the parent
/// segment the branch sprouted from. With [`TieBreak::FirstFound`] the first
/// candidate at the minimal distance wins, with [`TieBreak::LastFound`] the
/// last one does.
///
/// ### Returns
/// The winning segment and its distance to `pos`, or `None` if no segment is
/// in range.
pub fn nearest_segment(
    branches: &[Branch],
    pos: Vector2,
    radius: f64,
    cfg: &Config,
) -> Option<(SegmentRef, f64)> {
    let r2 = radius * radius;
    let mut best = None;
    let mut best_d2 = f64::INFINITY;

    for (bi, branch) in branches.iter().enumerate() {
        for si in (1..branch.segments.len())
            .rev()
            .step_by(cfg.segment_search_stride)
        {
            let d2 = branch.segments[si].pos.distance_squared(pos);
            if d2 >= r2 {
                continue;
            }
            let better = match cfg.tie_break {
                TieBreak::FirstFound => d2 < best_d2,
                TieBreak::LastFound => d2 <= best_d2,
            };
            if better {
                best_d2 = d2;
                best = Some(SegmentRef::new(bi, si));
            }
        }
    }

    best.map(|r| (r, best_d2.sqrt()))
}

/// Assigns every attraction point to its nearest in-range segment.
///
/// Each point is claimed by at most one segment. Points with no segment in
/// range are ignored for this step.
///
/// ### Returns
/// The attracted segments, in the order they received their first point.
pub fn assignment_phase(
    branches: &mut [Branch],
    attractors: &AttractorSet,
    cfg: &Config,
) -> Vec<SegmentRef> {
    let mut attracted = Vec::new();

    for (pid, point) in attractors.points.iter().enumerate() {
        let Some((r, _)) = nearest_segment(branches, point.pos, point.influence_radius, cfg) else {
            continue;
        };
        let segment = &mut branches[r.branch].segments[r.segment];
        if segment.assigned_points.is_empty() {
            attracted.push(r);
        }
        segment.assign(pid);
    }

    attracted
}

/// Normalized sum of the unit directions from `seg_pos` to each point.
///
/// `None` when the contributions cancel out (or every point sits exactly on
/// the segment), meaning there is no usable growth direction.
pub fn attraction_direction(
    seg_pos: Vector2,
    points: impl IntoIterator<Item = Vector2>,
) -> Option<Vector2> {
    points
        .into_iter()
        .filter_map(|p| (p - seg_pos).unit_or_none())
        .fold(Vector2::ZERO, |acc, d| acc + d)
        .unit_or_none()
}

/// Grows attracted tips and spawns branches from attracted interior segments.
///
/// New branches are collected and appended only after every attracted
/// segment was handled, so they are not processed again in the same pass.
///
/// ### Parameters
/// - `branches` - All branches of the tree; spawned branches are appended.
/// - `attracted` - Output of [`assignment_phase`].
/// - `attractors` - Point arena the segments' assignments index into.
/// - `cfg` - Growth, branching and cap parameters.
/// - `next_id` - Branch id counter owned by the tree.
pub fn growth_phase(
    branches: &mut Vec<Branch>,
    attracted: &[SegmentRef],
    attractors: &AttractorSet,
    cfg: &Config,
    next_id: &mut BranchId,
) -> GrowthOutcome {
    let mut outcome = GrowthOutcome::default();
    let mut new_branches: Vec<Branch> = Vec::new();

    for &r in attracted {
        let branch = &branches[r.branch];
        let segment = &branch.segments[r.segment];

        let points = segment
            .assigned_points
            .iter()
            .map(|&pid| attractors.points[pid].pos);
        let Some(dir) = attraction_direction(segment.pos, points) else {
            trace!(branch = branch.id, segment = r.segment, "attraction cancels out");
            continue;
        };

        // downward growth does not look natural
        if dir.y < cfg.min_vertical_growth {
            continue;
        }

        let angle = dir.polar_angle();

        if segment.is_tip {
            if branch.is_trunk && !cfg.trunk_attracted {
                continue;
            }
            branches[r.branch].update(Some(angle), cfg);
            continue;
        }

        if branches.len() + new_branches.len() >= cfg.max_branches {
            outcome.dropped_spawns += 1;
            trace!(branch = branch.id, "branch cap reached, spawn dropped");
            continue;
        }

        let reference = match cfg.spawn_reference {
            SpawnReference::Predecessor => branch.segments[r.segment - 1].pos,
            SpawnReference::BranchBase => branch.segments[0].pos,
        };
        let Some(parent_dir) = (segment.pos - reference).unit_or_none() else {
            continue;
        };

        let dot = dir.dot(parent_dir);
        let too_parallel = cfg.min_branching_angle_deg > 0.0 && dot > cfg.max_dot_for_branching();
        let too_opposite =
            cfg.max_branching_angle_deg < 180.0 && dot < cfg.min_dot_for_branching();
        if too_parallel || too_opposite {
            continue;
        }

        let parent_width = match cfg.branch_width_source {
            BranchWidthSource::FinalWidth => segment.final_width,
            BranchWidthSource::CurrentWidth => segment.width,
        };

        // first segment of the child coincides with the parent segment
        let mut child = Branch::new(
            *next_id,
            segment.pos,
            angle,
            parent_width * cfg.branch_width_ratio,
            false,
            branch.level + 1,
            cfg,
        );
        *next_id += 1;
        child.update(Some(angle), cfg);
        new_branches.push(child);
    }

    outcome.spawned_branches = new_branches.len();
    branches.append(&mut new_branches);
    outcome
}

/// Removes every attraction point that has a segment within its kill radius.
///
/// The whole arena is scanned before anything is removed.
///
/// ### Returns
/// Number of points removed.
pub fn kill_phase(branches: &[Branch], attractors: &mut AttractorSet) -> usize {
    let consumed: Vec<bool> = attractors
        .points
        .iter()
        .map(|point| {
            let k2 = point.kill_radius * point.kill_radius;
            branches
                .iter()
                .flat_map(|b| b.segments.iter())
                .any(|s| s.pos.distance_squared(point.pos) < k2)
        })
        .collect();

    attractors.retain_unconsumed(&consumed)
}

/// Gives every branch its unattracted update, then clears all growth markers.
///
/// ### Returns
/// Number of branches that grew at any point during the step.
pub fn advance_phase(branches: &mut [Branch], cfg: &Config) -> usize {
    for branch in branches.iter_mut() {
        branch.update(None, cfg);
    }

    branches
        .iter_mut()
        .map(|b| b.clear_growth_marker())
        .filter(|&grew| grew)
        .count()
}

use crate::config::{Config, CrownShape};
use crate::vector::Vector2;
use rand::Rng;

/// A stimulus the tree grows toward.
///
/// Positions never change; a point only leaves the simulation when a segment
/// grows within its `kill_radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttractionPoint {
    pub pos: Vector2,
    pub influence_radius: f64,
    pub kill_radius: f64,
}

#[derive(Clone, Debug, Default)]
pub struct AttractorSet {
    pub points: Vec<AttractionPoint>,
}

impl AttractorSet {
    pub fn from_positions(positions: Vec<Vector2>, influence_radius: f64, kill_radius: f64) -> Self {
        let points = positions
            .into_iter()
            .map(|pos| AttractionPoint {
                pos,
                influence_radius,
                kill_radius,
            })
            .collect();

        Self { points }
    }

    pub fn random_in_rect(
        center: Vector2,
        half_extents: Vector2,
        count: usize,
        cfg: &Config,
        rng: &mut impl Rng,
    ) -> Self {
        let positions = (0..count)
            .map(|_| {
                let x = rng.random_range(-half_extents.x..=half_extents.x);
                let y = rng.random_range(-half_extents.y..=half_extents.y);
                center + Vector2::new(x, y)
            })
            .collect();

        Self::from_positions(positions, cfg.influence_radius, cfg.kill_radius)
    }

    /// Uniformly scatters points inside the ellipse with the given radii.
    pub fn random_in_oval(
        center: Vector2,
        radii: Vector2,
        count: usize,
        cfg: &Config,
        rng: &mut impl Rng,
    ) -> Self {
        let positions = (0..count)
            .map(|_| {
                // sqrt keeps the density uniform over the area
                let r = rng.random::<f64>().sqrt();
                let t = rng.random_range(0.0..std::f64::consts::TAU);
                center + Vector2::new(t.cos() * r * radii.x, t.sin() * r * radii.y)
            })
            .collect();

        Self::from_positions(positions, cfg.influence_radius, cfg.kill_radius)
    }

    /// Scatters `cfg.attraction_point_count` points over the crown region.
    pub fn random_in_crown(cfg: &Config, rng: &mut impl Rng) -> Self {
        let half_height = (cfg.crown_top - cfg.crown_base_height) / 2.0;
        let center = Vector2::new(0.0, cfg.crown_base_height + half_height);
        let half_extents = Vector2::new(cfg.crown_half_width, half_height);

        match cfg.crown_shape {
            CrownShape::Rect => {
                Self::random_in_rect(center, half_extents, cfg.attraction_point_count, cfg, rng)
            }
            CrownShape::Oval => {
                Self::random_in_oval(center, half_extents, cfg.attraction_point_count, cfg, rng)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Appends a later batch of points after the existing ones.
    pub fn extend(&mut self, other: AttractorSet) {
        self.points.extend(other.points);
    }

    /// Drops every point whose flag in `consumed` is set, keeping the
    /// relative order of the survivors. Points past the end of `consumed`
    /// are kept.
    pub(crate) fn retain_unconsumed(&mut self, consumed: &[bool]) -> usize {
        debug_assert_eq!(consumed.len(), self.points.len());
        let before = self.points.len();
        let mut flags = consumed.iter();
        self.points.retain(|_| !flags.next().copied().unwrap_or(false));
        before - self.points.len()
    }
}

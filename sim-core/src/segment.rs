use crate::config::WidthGrowth;
use crate::types::PointId;
use crate::vector::Vector2;

/// One node along a branch's centerline.
#[derive(Clone, Debug)]
pub struct Segment {
    pub pos: Vector2,
    /// Width this segment ramps up to.
    pub final_width: f64,
    /// Current width, never above `final_width`.
    pub width: f64,
    /// `true` only for the last segment of its branch.
    pub is_tip: bool,
    /// Attraction points claimed by this segment in the current step.
    pub assigned_points: Vec<PointId>,
}

impl Segment {
    pub fn new(pos: Vector2, final_width: f64, initial_width: f64) -> Self {
        Self {
            pos,
            final_width,
            width: initial_width.min(final_width),
            is_tip: true,
            assigned_points: Vec::new(),
        }
    }

    /// Widens the segment by one step of `growth`, saturating at `final_width`.
    pub fn update(&mut self, growth: &WidthGrowth) {
        if self.width < self.final_width {
            self.width = (self.width + growth.increment(self.final_width)).min(self.final_width);
        }
    }

    pub fn clear_assigned_points(&mut self) {
        self.assigned_points.clear();
    }

    pub fn assign(&mut self, point: PointId) {
        self.assigned_points.push(point);
    }
}

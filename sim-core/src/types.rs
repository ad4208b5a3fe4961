/// Identifier for a [`crate::branch::Branch`].
///
/// Issued by the owning [`crate::tree::Tree`] from a monotonic counter, so
/// ids are unique within one tree and never reused.
pub type BranchId = u64;

/// Index of an attraction point in [`crate::attractor::AttractorSet::points`].
///
/// Only valid for the step in which it was handed out: attrition compacts the
/// arena at the end of every step.
pub type PointId = usize;

/// Index handle for one segment of one branch inside a tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SegmentRef {
    /// Position of the branch in `Tree::branches`.
    pub branch: usize,
    /// Position of the segment in `Branch::segments`.
    pub segment: usize,
}

impl SegmentRef {
    pub fn new(branch: usize, segment: usize) -> Self {
        Self { branch, segment }
    }
}

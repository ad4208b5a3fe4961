//! Space-colonization growth engine for a 2-D branching tree.
//!
//! A cloud of attraction points pulls nearby branch segments toward it:
//! tips extend, interior segments sprout new branches, and points close
//! enough to the wood are consumed. Stepping stops changing anything once a
//! whole step produces no growth.
//!
//! Main components:
//! - [`vector`] — 2-D vector type and helpers.
//! - [`attractor`] — attraction points and point clouds.
//! - [`segment`] — centerline nodes with growing width.
//! - [`branch`] — segment chains and their growth state machine.
//! - [`tree`] — the orchestrator driving each step.
//! - [`phases`] — the individual phases of a step.
//! - [`config`] — tunable parameters and growth policies.
//! - [`error`] — configuration and driver errors.
//! - [`types`] — shared ids and index handles.

pub mod attractor;
pub mod branch;
pub mod config;
pub mod error;
pub mod phases;
pub mod segment;
pub mod tree;
pub mod types;
pub mod vector;

pub use config::Config;
pub use error::{ConfigError, TreeError};
pub use tree::{StepReport, Tree, TreeMetrics};

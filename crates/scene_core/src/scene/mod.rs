//! Scene management
//!
//! ## Architecture
//!
//! ```text
//! Driver (input, animation, PoseSource)
//!      ↓
//! TransformHierarchy (lazy world matrices)
//!      ↓
//! CollisionSystem (broad phase → GJK)
//! ```
//!
//! [`Scene`] bundles both halves and runs them in that order once per tick.

mod hierarchy;
mod pose;
mod scene_manager;
mod transform;

pub use hierarchy::{HierarchyError, TransformHierarchy};
pub use pose::{ExternalPose, PoseBuffer, PoseSource};
pub use scene_manager::Scene;
pub use transform::{Transform, TransformDirty};

//! # Scene Core
//!
//! Transform hierarchy and convex collision detection for real-time 3D scenes.
//!
//! ## Features
//!
//! - **Transform Hierarchy**: arena of parent/child transforms with lazy,
//!   dirty-flag driven world matrices
//! - **Bounding Volumes**: cached world AABB and precheck sphere per collider
//! - **Broad Phase**: sphere and AABB rejection with layer/mask filtering
//! - **Narrow Phase**: GJK on world-space vertex sets
//! - **Pose Injection**: authoritative world poses from an external simulation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_core::prelude::*;
//!
//! let mut scene = Scene::new();
//! let cube = MeshGeometry::cube(1.0).shared();
//! let (_, a) = scene.spawn(Vec3::zeros(), cube.clone()).unwrap();
//! let (mover, b) = scene.spawn(Vec3::new(5.0, 0.0, 0.0), cube).unwrap();
//!
//! scene.hierarchy_mut().move_absolute(mover, Vec3::new(-4.0, 0.0, 0.0)).unwrap();
//! let pairs = scene.tick(&mut PoseBuffer::new());
//! assert_eq!(pairs, vec![CollisionPair::new(a, b)]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core configuration
pub mod core;
pub mod config;

pub mod foundation;
pub mod scene;
pub mod physics;

#[cfg(test)]
mod tests;

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        core::{CoreConfig, CollisionConfig, GjkConfig, Config},
        foundation::{
            collections::{ColliderHandle, TransformHandle},
            math::{Mat4, Quat, Vec3},
        },
        physics::{
            Collider, CollisionError, CollisionLayers, CollisionOutcome, CollisionPair,
            CollisionSystem, MeshGeometry, VertexSource,
        },
        scene::{HierarchyError, PoseBuffer, PoseSource, Scene, TransformHierarchy},
    };
}

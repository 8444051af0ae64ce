//! Physics module for collision detection
//!
//! Provides the collider registry with a sphere/AABB broad phase and a GJK
//! narrow phase. Collision response is left to the caller.

pub mod collision;
pub mod collision_layers;
pub mod collision_system;

pub use collision::{
    Aabb,
    BoundingSphere,
    BoundingVolume,
    Collider,
    GjkResult,
    MeshError,
    MeshGeometry,
    VertexSource,
};
pub use collision_layers::CollisionLayers;
pub use collision_system::{CollisionError, CollisionOutcome, CollisionPair, CollisionSystem};

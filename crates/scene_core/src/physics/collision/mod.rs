//! Collision geometry, bounding volumes and the GJK narrow phase
//!
//! # Architecture
//!
//! - **Model Space Storage**: meshes are stored in local coordinates and shared
//!   between colliders
//! - **Lazy World Space**: a collider transforms its mesh only after its
//!   transform's world matrix changed
//!
//! # Module Organization
//!
//! - [`mesh`] - Model-space vertex sources
//! - [`primitives`] - Spheres and boxes for the broad phase
//! - [`bounding_volume`] - Cached world bounds of one collider
//! - [`collider`] - Mesh bound to a transform
//! - [`gjk`] - Convex intersection test

pub mod bounding_volume;
pub mod collider;
pub mod gjk;
pub mod mesh;
pub mod primitives;

pub use bounding_volume::{BoundingVolume, BoundsDirty};
pub use collider::Collider;
pub use gjk::{calc_support, check_gjk_collision, do_simplex, GjkResult, Simplex};
pub use mesh::{MeshError, MeshGeometry, Positions, VertexSource};
pub use primitives::{Aabb, BoundingSphere};

//! Collider: a shared model-space mesh bound to one transform
//!
//! A collider caches its mesh transformed into world space. The cache and the
//! derived bounding volume are refreshed whenever the owning transform's world
//! matrix was recomputed since the last refresh, which covers mutations of the
//! transform itself and of any of its ancestors.

use std::sync::Arc;

use crate::foundation::collections::TransformHandle;
use crate::foundation::math::{transform_position, Vec3};
use crate::physics::collision_layers::CollisionLayers;
use crate::scene::{HierarchyError, TransformHierarchy};

use super::bounding_volume::BoundingVolume;
use super::gjk::calc_support;
use super::mesh::{MeshGeometry, VertexSource};

/// Collision geometry attached to a transform
#[derive(Debug, Clone)]
pub struct Collider {
    mesh: Arc<MeshGeometry>,
    transform: TransformHandle,
    layer: CollisionLayers,
    mask: CollisionLayers,
    bounds: BoundingVolume,
    world_vertices: Vec<Vec3>,
    seen_revision: Option<u64>,
}

impl Collider {
    /// Create a collider on the default layer that collides with everything
    pub fn new(transform: TransformHandle, mesh: Arc<MeshGeometry>) -> Self {
        Self {
            mesh,
            transform,
            layer: CollisionLayers::DEFAULT,
            mask: CollisionLayers::ALL,
            bounds: BoundingVolume::new(),
            world_vertices: Vec::new(),
            seen_revision: None,
        }
    }

    /// Set the layer this collider belongs to
    pub fn with_layer(mut self, layer: CollisionLayers) -> Self {
        self.layer = layer;
        self
    }

    /// Set the layers this collider interacts with
    pub fn with_mask(mut self, mask: CollisionLayers) -> Self {
        self.mask = mask;
        self
    }

    /// Owning transform
    pub fn transform(&self) -> TransformHandle {
        self.transform
    }

    /// Model-space mesh
    pub fn mesh(&self) -> &Arc<MeshGeometry> {
        &self.mesh
    }

    /// Collision layer
    pub fn layer(&self) -> CollisionLayers {
        self.layer
    }

    /// Collision mask
    pub fn mask(&self) -> CollisionLayers {
        self.mask
    }

    /// Whether the layer filters of both colliders allow a test
    pub fn interacts_with(&self, other: &Collider) -> bool {
        CollisionLayers::should_collide(self.layer, self.mask, other.layer, other.mask)
    }

    /// Cached bounds; only current right after [`Self::sync`]
    pub fn bounds(&self) -> &BoundingVolume {
        &self.bounds
    }

    /// Cached world-space vertices; only current right after [`Self::sync`]
    pub fn world_vertices(&self) -> &[Vec3] {
        &self.world_vertices
    }

    /// Bring the world-space vertex cache up to date with the transform
    ///
    /// Returns `true` when the cache was rebuilt, which also invalidates the
    /// bounding volume.
    pub fn sync(&mut self, hierarchy: &mut TransformHierarchy) -> Result<bool, HierarchyError> {
        let (world, revision) = hierarchy.world_matrix_with_revision(self.transform)?;
        if self.seen_revision == Some(revision) {
            return Ok(false);
        }

        self.world_vertices.clear();
        self.world_vertices.extend(
            self.mesh
                .positions()
                .map(|vertex| transform_position(&world, &vertex)),
        );
        self.bounds.mark_dirty();
        self.seen_revision = Some(revision);
        Ok(true)
    }

    /// Refresh and return the bounding-volume center
    pub fn calc_center_point(&mut self, hierarchy: &mut TransformHierarchy) -> Result<Vec3, HierarchyError> {
        self.sync(hierarchy)?;
        Ok(self.bounds.calc_center_point(&self.world_vertices))
    }

    /// Farthest world-space vertex along `direction`
    pub fn calc_support(&self, direction: &Vec3) -> Option<Vec3> {
        calc_support(&self.world_vertices, direction)
    }
}

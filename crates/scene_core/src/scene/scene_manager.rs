//! Scene - owner of the transform hierarchy and the collision system
//!
//! A tick runs in a fixed order:
//! 1. apply authoritative poses from the [`PoseSource`]
//! 2. test every candidate collider pair
//! 3. hand the colliding pairs back to the caller
//!
//! Local movement (input, animation) is applied by the caller through
//! [`Scene::hierarchy_mut`] before calling [`Scene::tick`].

use std::sync::Arc;

use crate::core::config::{ConfigError, CoreConfig};
use crate::foundation::collections::{ColliderHandle, TransformHandle};
use crate::foundation::math::Vec3;
use crate::physics::collision::{Collider, MeshGeometry};
use crate::physics::collision_system::{CollisionError, CollisionPair, CollisionSystem};

use super::hierarchy::{HierarchyError, TransformHierarchy};
use super::pose::PoseSource;

/// Transform hierarchy plus colliders, advanced one tick at a time
#[derive(Debug, Default)]
pub struct Scene {
    config: CoreConfig,
    hierarchy: TransformHierarchy,
    collisions: CollisionSystem,
    tick_count: u64,
}

impl Scene {
    /// Create a scene with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scene with a validated custom configuration
    pub fn with_config(config: CoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            collisions: CollisionSystem::new(config.collision),
            config,
            hierarchy: TransformHierarchy::new(),
            tick_count: 0,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Transform hierarchy
    pub fn hierarchy(&self) -> &TransformHierarchy {
        &self.hierarchy
    }

    /// Mutable transform hierarchy, for local movement between ticks
    pub fn hierarchy_mut(&mut self) -> &mut TransformHierarchy {
        &mut self.hierarchy
    }

    /// Collision system
    pub fn collisions(&self) -> &CollisionSystem {
        &self.collisions
    }

    /// Number of completed ticks
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Create a root transform at `position` with a collider for `mesh`
    pub fn spawn(
        &mut self,
        position: Vec3,
        mesh: Arc<MeshGeometry>,
    ) -> Result<(TransformHandle, ColliderHandle), CollisionError> {
        let transform = self.hierarchy.create_at(position);
        let attached = self.collisions.attach_mesh(&mut self.hierarchy, transform, mesh);
        match attached {
            Ok(collider) => Ok((transform, collider)),
            Err(err) => {
                // Do not leave a transform behind for a rejected collider.
                if let Err(destroy_err) = self.hierarchy.destroy(transform) {
                    log::warn!("Could not remove transform {:?} after rejected spawn: {}", transform, destroy_err);
                }
                Err(err)
            }
        }
    }

    /// Register a pre-configured collider on an existing transform
    pub fn add_collider(&mut self, collider: Collider) -> Result<ColliderHandle, CollisionError> {
        self.collisions.add_collider(&mut self.hierarchy, collider)
    }

    /// Destroy a transform together with its colliders
    ///
    /// Children of the transform become roots and keep their colliders.
    pub fn destroy(&mut self, transform: TransformHandle) -> Result<(), HierarchyError> {
        self.hierarchy.destroy(transform)?;
        let removed = self.collisions.remove_colliders_for(transform);
        log::debug!("Destroyed {:?} with {} colliders", transform, removed);
        Ok(())
    }

    /// Single pair query through the broad and narrow phase
    pub fn check_for_collision(
        &mut self,
        a: ColliderHandle,
        b: ColliderHandle,
        override_broad_phase: bool,
    ) -> Result<bool, CollisionError> {
        self.collisions
            .check_for_collision(&mut self.hierarchy, a, b, override_broad_phase)
    }

    /// Advance one tick and return the colliding pairs
    pub fn tick(&mut self, poses: &mut dyn PoseSource) -> Vec<CollisionPair> {
        let applied = self.hierarchy.apply_poses(poses);
        let pairs = self.collisions.detect_collisions(&mut self.hierarchy);
        self.tick_count += 1;

        log::trace!(
            "Tick {}: {} poses applied, {} colliding pairs",
            self.tick_count,
            applied,
            pairs.len()
        );
        pairs
    }
}

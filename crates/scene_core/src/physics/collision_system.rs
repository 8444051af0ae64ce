//! Collision query facade
//!
//! Detection is split into two phases:
//!
//! - **Broad phase**: cheap conservative rejection with the precheck spheres,
//!   optionally followed by a world-AABB overlap test. Passing the broad phase
//!   never proves a collision.
//! - **Narrow phase**: GJK on the world-space vertex sets.
//!
//! The system owns colliders but not transforms; every query borrows the
//! [`TransformHierarchy`] so stale world matrices are recomputed on demand.
//! Nothing is remembered between ticks: a query only reflects current poses.

use std::sync::Arc;

use thiserror::Error;

use crate::core::config::CollisionConfig;
use crate::foundation::collections::{ColliderHandle, SlotMap, TransformHandle};
use crate::foundation::math::Vec3;
use crate::physics::collision::{check_gjk_collision, Collider, GjkResult, MeshError, MeshGeometry, VertexSource};
use crate::scene::{HierarchyError, TransformHierarchy};

/// Errors from collision queries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollisionError {
    /// The collider handle is stale or unknown
    #[error("Collider handle {0:?} is stale or unknown")]
    StaleCollider(ColliderHandle),

    /// The collider's transform could not be read
    #[error("Transform lookup failed: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// The collider's mesh is unusable
    #[error("Invalid collider mesh: {0}")]
    Mesh(#[from] MeshError),
}

/// Collision pair representing two colliders that are colliding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair {
    /// Smaller handle of the pair
    pub collider_a: ColliderHandle,
    /// Larger handle of the pair
    pub collider_b: ColliderHandle,
}

impl CollisionPair {
    /// Create a new collision pair (always stores the smaller handle first for consistency)
    pub fn new(collider_a: ColliderHandle, collider_b: ColliderHandle) -> Self {
        if collider_a < collider_b {
            Self { collider_a, collider_b }
        } else {
            Self { collider_a: collider_b, collider_b: collider_a }
        }
    }

    /// Whether the pair involves `collider`
    pub fn contains(&self, collider: ColliderHandle) -> bool {
        self.collider_a == collider || self.collider_b == collider
    }
}

/// Detailed result of a pair query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionOutcome {
    /// The broad phase proved the pair disjoint
    BroadPhaseRejected,
    /// GJK found a separating axis
    Separated {
        /// Unit axis along which the first collider lies behind the second
        axis: Vec3,
    },
    /// GJK proved the pair overlapping or touching
    Intersecting,
    /// GJK gave up at the iteration cap
    Inconclusive,
}

impl CollisionOutcome {
    /// `true` only for a proven intersection
    pub fn is_colliding(&self) -> bool {
        matches!(self, Self::Intersecting)
    }
}

impl From<GjkResult> for CollisionOutcome {
    fn from(result: GjkResult) -> Self {
        match result {
            GjkResult::Intersecting => Self::Intersecting,
            GjkResult::Separated { axis } => Self::Separated { axis },
            GjkResult::Inconclusive => Self::Inconclusive,
        }
    }
}

/// Registry of colliders plus the broad/narrow-phase pipeline
#[derive(Debug, Default)]
pub struct CollisionSystem {
    config: CollisionConfig,
    colliders: SlotMap<ColliderHandle, Collider>,
}

impl CollisionSystem {
    /// Create an empty system
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            colliders: SlotMap::with_key(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Register a collider
    ///
    /// The collider's transform must be alive and its mesh must have vertices.
    /// World vertices and bounds are computed once here.
    pub fn add_collider(
        &mut self,
        hierarchy: &mut TransformHierarchy,
        mut collider: Collider,
    ) -> Result<ColliderHandle, CollisionError> {
        if !hierarchy.contains(collider.transform()) {
            return Err(HierarchyError::StaleHandle(collider.transform()).into());
        }
        if collider.mesh().vertex_count() == 0 {
            return Err(MeshError::Empty.into());
        }
        collider.calc_center_point(hierarchy)?;

        let transform = collider.transform();
        let handle = self.colliders.insert(collider);
        log::debug!("Registered collider {:?} on transform {:?}", handle, transform);
        Ok(handle)
    }

    /// Convenience for [`Self::add_collider`] with default layers
    pub fn attach_mesh(
        &mut self,
        hierarchy: &mut TransformHierarchy,
        transform: TransformHandle,
        mesh: Arc<MeshGeometry>,
    ) -> Result<ColliderHandle, CollisionError> {
        self.add_collider(hierarchy, Collider::new(transform, mesh))
    }

    /// Unregister a collider, returning it
    pub fn remove_collider(&mut self, handle: ColliderHandle) -> Result<Collider, CollisionError> {
        let collider = self
            .colliders
            .remove(handle)
            .ok_or(CollisionError::StaleCollider(handle))?;
        log::debug!("Removed collider {:?}", handle);
        Ok(collider)
    }

    /// Unregister every collider bound to `transform`, returning how many
    pub fn remove_colliders_for(&mut self, transform: TransformHandle) -> usize {
        let before = self.colliders.len();
        self.colliders.retain(|_, collider| collider.transform() != transform);
        before - self.colliders.len()
    }

    /// Get a collider
    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    /// Check if a collider is registered
    pub fn has_collider(&self, handle: ColliderHandle) -> bool {
        self.colliders.contains_key(handle)
    }

    /// Handles of every registered collider
    pub fn handles(&self) -> impl Iterator<Item = ColliderHandle> + '_ {
        self.colliders.keys()
    }

    /// Get the number of registered colliders
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Whether no collider is registered
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Clear all collision data
    pub fn clear(&mut self) {
        self.colliders.clear();
    }

    /// Refresh a collider's vertices and bounds, returning its center
    pub fn calc_center_point(
        &mut self,
        hierarchy: &mut TransformHierarchy,
        handle: ColliderHandle,
    ) -> Result<Vec3, CollisionError> {
        let collider = self
            .colliders
            .get_mut(handle)
            .ok_or(CollisionError::StaleCollider(handle))?;
        Ok(collider.calc_center_point(hierarchy)?)
    }

    fn pair(&self, a: ColliderHandle, b: ColliderHandle) -> Result<(&Collider, &Collider), CollisionError> {
        let first = self.colliders.get(a).ok_or(CollisionError::StaleCollider(a))?;
        let second = self.colliders.get(b).ok_or(CollisionError::StaleCollider(b))?;
        Ok((first, second))
    }

    /// Broad phase: `false` when the pair certainly does not collide
    ///
    /// `true` only means the narrow phase has to decide.
    pub fn check_broad_phase(
        &mut self,
        hierarchy: &mut TransformHierarchy,
        a: ColliderHandle,
        b: ColliderHandle,
    ) -> Result<bool, CollisionError> {
        self.calc_center_point(hierarchy, a)?;
        self.calc_center_point(hierarchy, b)?;
        let (first, second) = self.pair(a, b)?;

        if !first.bounds().sphere().intersects(&second.bounds().sphere()) {
            return Ok(false);
        }
        if self.config.broad_phase.aabb_stage && !first.bounds().aabb().intersects(&second.bounds().aabb()) {
            return Ok(false);
        }
        Ok(true)
    }

    /// Narrow phase: GJK on the current world-space vertices
    pub fn narrow_phase(
        &mut self,
        hierarchy: &mut TransformHierarchy,
        a: ColliderHandle,
        b: ColliderHandle,
    ) -> Result<GjkResult, CollisionError> {
        for handle in [a, b] {
            self.colliders
                .get_mut(handle)
                .ok_or(CollisionError::StaleCollider(handle))?
                .sync(hierarchy)?;
        }
        let (first, second) = self.pair(a, b)?;
        Ok(check_gjk_collision(first.world_vertices(), second.world_vertices(), &self.config.gjk))
    }

    /// Full pipeline with a detailed outcome
    ///
    /// With `override_broad_phase` the narrow phase always runs.
    pub fn query(
        &mut self,
        hierarchy: &mut TransformHierarchy,
        a: ColliderHandle,
        b: ColliderHandle,
        override_broad_phase: bool,
    ) -> Result<CollisionOutcome, CollisionError> {
        if !override_broad_phase && !self.check_broad_phase(hierarchy, a, b)? {
            log::trace!("Broad phase rejected {:?} / {:?}", a, b);
            return Ok(CollisionOutcome::BroadPhaseRejected);
        }

        let outcome = CollisionOutcome::from(self.narrow_phase(hierarchy, a, b)?);
        match outcome {
            CollisionOutcome::Inconclusive => log::warn!(
                "GJK hit the iteration cap ({}) for {:?} / {:?}, reporting no collision",
                self.config.gjk.max_iterations,
                a,
                b
            ),
            _ => log::trace!("Narrow phase {:?} / {:?}: {:?}", a, b, outcome),
        }
        Ok(outcome)
    }

    /// Whether two colliders intersect right now
    pub fn check_for_collision(
        &mut self,
        hierarchy: &mut TransformHierarchy,
        a: ColliderHandle,
        b: ColliderHandle,
        override_broad_phase: bool,
    ) -> Result<bool, CollisionError> {
        Ok(self.query(hierarchy, a, b, override_broad_phase)?.is_colliding())
    }

    /// Test every pair whose layers allow it, returning the colliding pairs
    ///
    /// Colliders whose transform was destroyed are skipped with a warning.
    pub fn detect_collisions(&mut self, hierarchy: &mut TransformHierarchy) -> Vec<CollisionPair> {
        let handles: Vec<ColliderHandle> = self.colliders.keys().collect();
        let mut live = Vec::with_capacity(handles.len());
        for handle in handles {
            match self.calc_center_point(hierarchy, handle) {
                Ok(_) => live.push(handle),
                Err(err) => log::warn!("Skipping collider {:?}: {}", handle, err),
            }
        }

        let mut pairs = Vec::new();
        for (index, &a) in live.iter().enumerate() {
            for &b in &live[index + 1..] {
                let allowed = match self.pair(a, b) {
                    Ok((first, second)) => first.interacts_with(second),
                    Err(_) => false,
                };
                if !allowed {
                    continue;
                }

                match self.query(hierarchy, a, b, false) {
                    Ok(outcome) if outcome.is_colliding() => pairs.push(CollisionPair::new(a, b)),
                    Ok(_) => {}
                    Err(err) => log::warn!("Collision query {:?} / {:?} failed: {}", a, b, err),
                }
            }
        }

        if !pairs.is_empty() {
            log::debug!("{} colliding pairs among {} colliders", pairs.len(), live.len());
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision_layers::CollisionLayers;

    fn create_test_scene() -> (TransformHierarchy, CollisionSystem) {
        (TransformHierarchy::new(), CollisionSystem::new(CollisionConfig::default()))
    }

    fn spawn_cube(
        hierarchy: &mut TransformHierarchy,
        system: &mut CollisionSystem,
        position: Vec3,
    ) -> ColliderHandle {
        let transform = hierarchy.create_at(position);
        system
            .attach_mesh(hierarchy, transform, MeshGeometry::cube(1.0).shared())
            .unwrap()
    }

    #[test]
    fn test_identical_cubes_collide() {
        let (mut hierarchy, mut system) = create_test_scene();
        let a = spawn_cube(&mut hierarchy, &mut system, Vec3::zeros());
        let b = spawn_cube(&mut hierarchy, &mut system, Vec3::zeros());

        assert!(system.check_broad_phase(&mut hierarchy, a, b).unwrap());
        assert!(system.check_for_collision(&mut hierarchy, a, b, false).unwrap());
    }

    #[test]
    fn test_distant_cubes_rejected_by_broad_phase() {
        let (mut hierarchy, mut system) = create_test_scene();
        let a = spawn_cube(&mut hierarchy, &mut system, Vec3::zeros());
        let b = spawn_cube(&mut hierarchy, &mut system, Vec3::new(10.0, 0.0, 0.0));

        assert!(!system.check_broad_phase(&mut hierarchy, a, b).unwrap());
        assert_eq!(
            system.query(&mut hierarchy, a, b, false).unwrap(),
            CollisionOutcome::BroadPhaseRejected
        );
        // Forcing the narrow phase gives the same answer.
        assert!(matches!(
            system.query(&mut hierarchy, a, b, true).unwrap(),
            CollisionOutcome::Separated { .. }
        ));
    }

    #[test]
    fn test_broad_phase_passes_but_gjk_separates() {
        let (mut hierarchy, mut system) = create_test_scene();
        let a = spawn_cube(&mut hierarchy, &mut system, Vec3::zeros());
        let b = spawn_cube(&mut hierarchy, &mut system, Vec3::new(2.2, 2.2, 0.0));
        let transform = system.collider(b).unwrap().transform();
        hierarchy.rotate(transform, Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_4)).unwrap();

        // The rolled cube is a diamond in XY whose AABB overlaps the corner of
        // the first cube, while the diamond itself stops short of that corner.
        assert!(system.check_broad_phase(&mut hierarchy, a, b).unwrap());
        assert!(matches!(
            system.query(&mut hierarchy, a, b, false).unwrap(),
            CollisionOutcome::Separated { .. }
        ));
    }

    #[test]
    fn test_coincident_centers_never_rejected() {
        let (mut hierarchy, mut system) = create_test_scene();
        let a = spawn_cube(&mut hierarchy, &mut system, Vec3::new(3.0, 3.0, 3.0));
        let b = spawn_cube(&mut hierarchy, &mut system, Vec3::new(3.0, 3.0, 3.0));
        let transform = system.collider(b).unwrap().transform();
        hierarchy.scale_uniform(transform, 0.01).unwrap();

        assert!(system.check_broad_phase(&mut hierarchy, a, b).unwrap());
    }

    #[test]
    fn test_moving_transform_updates_result() {
        let (mut hierarchy, mut system) = create_test_scene();
        let a = spawn_cube(&mut hierarchy, &mut system, Vec3::zeros());
        let b = spawn_cube(&mut hierarchy, &mut system, Vec3::new(10.0, 0.0, 0.0));
        assert!(!system.check_for_collision(&mut hierarchy, a, b, false).unwrap());

        let transform = system.collider(b).unwrap().transform();
        hierarchy.set_position(transform, Vec3::new(1.5, 0.0, 0.0)).unwrap();

        assert!(system.check_for_collision(&mut hierarchy, a, b, false).unwrap());
    }

    #[test]
    fn test_detect_collisions_with_layer_filtering() {
        let (mut hierarchy, mut system) = create_test_scene();
        let a = spawn_cube(&mut hierarchy, &mut system, Vec3::zeros());
        let b = spawn_cube(&mut hierarchy, &mut system, Vec3::new(1.0, 0.0, 0.0));
        let _far = spawn_cube(&mut hierarchy, &mut system, Vec3::new(50.0, 0.0, 0.0));

        let sensor_transform = hierarchy.create_at(Vec3::new(0.5, 0.0, 0.0));
        let sensor = system
            .add_collider(
                &mut hierarchy,
                Collider::new(sensor_transform, MeshGeometry::cube(0.5).shared())
                    .with_layer(CollisionLayers::SENSOR)
                    .with_mask(CollisionLayers::STATIC),
            )
            .unwrap();

        let pairs = system.detect_collisions(&mut hierarchy);

        assert_eq!(pairs, vec![CollisionPair::new(a, b)]);
        assert!(!pairs.iter().any(|pair| pair.contains(sensor)));
    }

    #[test]
    fn test_detect_collisions_skips_destroyed_transforms() {
        let (mut hierarchy, mut system) = create_test_scene();
        let a = spawn_cube(&mut hierarchy, &mut system, Vec3::zeros());
        let b = spawn_cube(&mut hierarchy, &mut system, Vec3::zeros());
        let c = spawn_cube(&mut hierarchy, &mut system, Vec3::zeros());
        hierarchy.destroy(system.collider(c).unwrap().transform()).unwrap();

        assert_eq!(system.detect_collisions(&mut hierarchy), vec![CollisionPair::new(a, b)]);
    }

    #[test]
    fn test_registration_errors() {
        let (mut hierarchy, mut system) = create_test_scene();
        let transform = hierarchy.create();

        let empty = Arc::new(MeshGeometry::Points(Vec::new()));
        assert_eq!(
            system.attach_mesh(&mut hierarchy, transform, empty),
            Err(CollisionError::Mesh(MeshError::Empty))
        );

        hierarchy.destroy(transform).unwrap();
        assert_eq!(
            system.attach_mesh(&mut hierarchy, transform, MeshGeometry::cube(1.0).shared()),
            Err(CollisionError::Hierarchy(HierarchyError::StaleHandle(transform)))
        );
    }

    #[test]
    fn test_zero_stride_mesh_rejected() {
        let (mut hierarchy, mut system) = create_test_scene();
        let transform = hierarchy.create();
        let mesh = Arc::new(MeshGeometry::Interleaved {
            data: vec![0.0; 9],
            stride: 0,
        });

        assert_eq!(
            system.attach_mesh(&mut hierarchy, transform, mesh),
            Err(CollisionError::Mesh(MeshError::Empty))
        );
        assert!(system.is_empty());
    }

    #[test]
    fn test_bounds_ready_on_registration() {
        let (mut hierarchy, mut system) = create_test_scene();
        let handle = spawn_cube(&mut hierarchy, &mut system, Vec3::new(4.0, 0.0, 0.0));
        let collider = system.collider(handle).unwrap();

        assert!(collider.bounds().dirty().is_empty());
        assert_eq!(collider.world_vertices().len(), 8);
        assert_eq!(collider.bounds().min_point(), Vec3::new(3.0, -1.0, -1.0));
        assert_eq!(collider.bounds().max_point(), Vec3::new(5.0, 1.0, 1.0));
        assert_eq!(collider.bounds().radius_squared(), 3.0);
    }

    #[test]
    fn test_remove_colliders_for_transform() {
        let (mut hierarchy, mut system) = create_test_scene();
        let transform = hierarchy.create();
        let mesh = MeshGeometry::cube(1.0).shared();
        let first = system.attach_mesh(&mut hierarchy, transform, Arc::clone(&mesh)).unwrap();
        system.attach_mesh(&mut hierarchy, transform, mesh).unwrap();

        assert_eq!(system.remove_colliders_for(transform), 2);
        assert!(system.is_empty());
        assert_eq!(
            system.remove_collider(first).unwrap_err(),
            CollisionError::StaleCollider(first)
        );
    }

    #[test]
    fn test_pair_ordering() {
        let (mut hierarchy, mut system) = create_test_scene();
        let a = spawn_cube(&mut hierarchy, &mut system, Vec3::zeros());
        let b = spawn_cube(&mut hierarchy, &mut system, Vec3::zeros());
        assert_eq!(CollisionPair::new(a, b), CollisionPair::new(b, a));
    }
}

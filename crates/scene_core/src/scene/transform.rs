//! Transform node stored in the hierarchy arena
//!
//! A [`Transform`] holds its local position, Euler rotation (with a cached
//! quaternion kept in sync), and scale, plus lazily recomputed caches for the
//! world matrix, its inverse-transpose and the local basis vectors.
//!
//! Nodes never compute their own world matrix: that requires the parent chain,
//! which lives in [`TransformHierarchy`](super::TransformHierarchy). The
//! hierarchy is also the only writer of the dirty flags.

use bitflags::bitflags;

use crate::foundation::collections::TransformHandle;
use crate::foundation::math::{
    compose_trs, euler_from_quat, inverse_transpose, quat_from_euler, Decomposed, Mat4, Quat, Vec3,
};

bitflags! {
    /// Cached values of a [`Transform`] that need recomputation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TransformDirty: u8 {
        /// World matrix and inverse-transpose
        const WORLD = 1 << 0;
        /// Forward/up/right basis vectors
        const BASIS = 1 << 1;
    }
}

/// Local forward axis (right-handed, Y-up, looking down -Z)
fn local_forward() -> Vec3 {
    -Vec3::z()
}

/// A node of the transform hierarchy
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec3,
    euler: Vec3,
    rotation: Quat,
    scale: Vec3,

    world: Mat4,
    world_inverse_transpose: Mat4,
    world_revision: u64,

    forward: Vec3,
    up: Vec3,
    right: Vec3,

    dirty: TransformDirty,

    pub(super) parent: Option<TransformHandle>,
    pub(super) children: Vec<TransformHandle>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            euler: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            world: Mat4::identity(),
            world_inverse_transpose: Mat4::identity(),
            world_revision: 0,
            forward: local_forward(),
            up: Vec3::y(),
            right: Vec3::x(),
            // Caches start valid for the identity pose of a root node.
            dirty: TransformDirty::empty(),
            parent: None,
            children: Vec::new(),
        }
    }
}

impl Transform {
    /// Local position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Accumulated local Euler angles `(pitch, yaw, roll)` in radians
    pub fn euler_angles(&self) -> Vec3 {
        self.euler
    }

    /// Local rotation quaternion, always consistent with [`Self::euler_angles`]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Local scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Parent node, if attached
    pub fn parent(&self) -> Option<TransformHandle> {
        self.parent
    }

    /// Children in attachment order
    pub fn children(&self) -> &[TransformHandle] {
        &self.children
    }

    /// Flags for caches that will be recomputed on the next read
    pub fn dirty(&self) -> TransformDirty {
        self.dirty
    }

    /// Local `T * R * S` matrix
    pub fn local_matrix(&self) -> Mat4 {
        compose_trs(&self.position, &self.rotation, &self.scale)
    }

    /// Local forward axis, recomputed from the rotation if stale
    pub fn forward(&mut self) -> Vec3 {
        self.refresh_basis();
        self.forward
    }

    /// Local up axis, recomputed from the rotation if stale
    pub fn up(&mut self) -> Vec3 {
        self.refresh_basis();
        self.up
    }

    /// Local right axis, recomputed from the rotation if stale
    pub fn right(&mut self) -> Vec3 {
        self.refresh_basis();
        self.right
    }

    fn refresh_basis(&mut self) {
        if !self.dirty.contains(TransformDirty::BASIS) {
            return;
        }
        self.forward = self.rotation * local_forward();
        self.up = self.rotation * Vec3::y();
        self.right = self.rotation * Vec3::x();
        self.dirty.remove(TransformDirty::BASIS);
    }

    pub(super) fn translate(&mut self, offset: &Vec3) {
        self.position += offset;
    }

    pub(super) fn translate_local(&mut self, offset: &Vec3) {
        self.position += self.rotation * offset;
    }

    pub(super) fn add_euler(&mut self, delta: &Vec3) {
        self.set_euler(self.euler + delta);
    }

    pub(super) fn multiply_scale(&mut self, factors: &Vec3) {
        self.scale.component_mul_assign(factors);
    }

    pub(super) fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub(super) fn set_euler(&mut self, euler: Vec3) {
        self.euler = euler;
        self.rotation = quat_from_euler(&euler);
    }

    pub(super) fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Overwrite the local values from a decomposed matrix
    ///
    /// Euler angles are re-derived from the quaternion so both stay consistent.
    pub(super) fn set_from_decomposed(&mut self, decomposed: &Decomposed) {
        self.position = decomposed.translation;
        self.rotation = decomposed.rotation;
        self.euler = euler_from_quat(&decomposed.rotation);
        self.scale = decomposed.scale;
    }

    pub(super) fn insert_dirty(&mut self, flags: TransformDirty) {
        self.dirty.insert(flags);
    }

    /// Cached world matrix; only valid while `WORLD` is clear
    pub(super) fn cached_world(&self) -> &Mat4 {
        &self.world
    }

    pub(super) fn cached_world_inverse_transpose(&self) -> &Mat4 {
        &self.world_inverse_transpose
    }

    pub(super) fn world_revision(&self) -> u64 {
        self.world_revision
    }

    /// Store a freshly composed world matrix and clear the `WORLD` flag
    pub(super) fn store_world(&mut self, world: Mat4) {
        self.world_inverse_transpose = inverse_transpose(&world).unwrap_or_else(|| {
            log::warn!("Singular world matrix, normal matrix falls back to identity");
            Mat4::identity()
        });
        self.world = world;
        self.world_revision = self.world_revision.wrapping_add(1);
        self.dirty.remove(TransformDirty::WORLD);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::HALF_PI;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_defaults() {
        let mut transform = Transform::default();
        assert_eq!(transform.local_matrix(), Mat4::identity());
        assert_eq!(transform.forward(), local_forward());
        assert!(transform.dirty().is_empty());
    }

    #[test]
    fn test_quaternion_tracks_euler() {
        let mut transform = Transform::default();
        transform.add_euler(&Vec3::new(0.0, HALF_PI, 0.0));
        transform.add_euler(&Vec3::new(0.0, HALF_PI, 0.0));

        assert_relative_eq!(transform.euler_angles().y, 2.0 * HALF_PI, epsilon = 1e-6);
        assert_relative_eq!(transform.rotation() * Vec3::x(), -Vec3::x(), epsilon = 1e-5);
    }

    #[test]
    fn test_basis_only_refreshes_when_flagged() {
        let mut transform = Transform::default();
        transform.set_euler(Vec3::new(0.0, HALF_PI, 0.0));

        // Flag not raised: stale basis is returned until the hierarchy marks it.
        assert_eq!(transform.forward(), local_forward());

        transform.insert_dirty(TransformDirty::BASIS);
        assert_relative_eq!(transform.forward(), Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(transform.right(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
        assert_relative_eq!(transform.up(), Vec3::y(), epsilon = 1e-5);
    }

    #[test]
    fn test_translate_local_follows_rotation() {
        let mut transform = Transform::default();
        transform.set_euler(Vec3::new(0.0, HALF_PI, 0.0));
        transform.translate_local(&Vec3::new(0.0, 0.0, -2.0));

        assert_relative_eq!(transform.position(), Vec3::new(-2.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_store_world_bumps_revision() {
        let mut transform = Transform::default();
        transform.insert_dirty(TransformDirty::WORLD);
        transform.store_world(Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0)));

        assert_eq!(transform.world_revision(), 1);
        assert!(!transform.dirty().contains(TransformDirty::WORLD));
    }
}

//! Authoritative pose injection
//!
//! An external simulation (a rigid-body solver, a network replica, an
//! animation player) owns the pose of some transforms. Each tick it hands over
//! world-space matrices which overwrite the hierarchy's local values.

use crate::foundation::collections::TransformHandle;
use crate::foundation::math::Mat4;

use super::hierarchy::TransformHierarchy;

/// World-space pose for one transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExternalPose {
    /// Transform receiving the pose
    pub transform: TransformHandle,
    /// World matrix to apply
    pub world: Mat4,
}

impl ExternalPose {
    /// Create a pose
    pub fn new(transform: TransformHandle, world: Mat4) -> Self {
        Self { transform, world }
    }
}

/// Producer of authoritative poses
pub trait PoseSource {
    /// Take every pose produced since the last call
    fn drain_poses(&mut self) -> Vec<ExternalPose>;
}

/// Queue of poses filled by the caller between ticks
#[derive(Debug, Default, Clone)]
pub struct PoseBuffer {
    pending: Vec<ExternalPose>,
}

impl PoseBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a pose; a later pose for the same transform wins
    pub fn push(&mut self, transform: TransformHandle, world: Mat4) {
        self.pending.push(ExternalPose::new(transform, world));
    }

    /// Number of queued poses
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl PoseSource for PoseBuffer {
    fn drain_poses(&mut self) -> Vec<ExternalPose> {
        std::mem::take(&mut self.pending)
    }
}

impl TransformHierarchy {
    /// Apply every pose from `source` in order, returning how many were applied
    ///
    /// Poses for destroyed transforms are skipped with a warning.
    pub fn apply_poses(&mut self, source: &mut dyn PoseSource) -> usize {
        let mut applied = 0;
        for pose in source.drain_poses() {
            match self.set_world_matrix(pose.transform, &pose.world) {
                Ok(()) => applied += 1,
                Err(err) => log::warn!("Skipping external pose: {}", err),
            }
        }
        if applied > 0 {
            log::trace!("Applied {} external poses", applied);
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn test_buffer_drains_in_order() {
        let mut hierarchy = TransformHierarchy::new();
        let node = hierarchy.create();

        let mut buffer = PoseBuffer::new();
        buffer.push(node, Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)));
        buffer.push(node, Mat4::new_translation(&Vec3::new(2.0, 0.0, 0.0)));
        assert_eq!(buffer.len(), 2);

        assert_eq!(hierarchy.apply_poses(&mut buffer), 2);
        assert!(buffer.is_empty());
        assert_relative_eq!(hierarchy.world_position(node).unwrap(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_stale_pose_is_skipped() {
        let mut hierarchy = TransformHierarchy::new();
        let live = hierarchy.create();
        let gone = hierarchy.create();
        hierarchy.destroy(gone).unwrap();

        let mut buffer = PoseBuffer::new();
        buffer.push(gone, Mat4::identity());
        buffer.push(live, Mat4::new_translation(&Vec3::new(0.0, 0.0, 4.0)));

        assert_eq!(hierarchy.apply_poses(&mut buffer), 1);
        assert_relative_eq!(hierarchy.world_position(live).unwrap(), Vec3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn test_pose_moves_attached_children() {
        let mut hierarchy = TransformHierarchy::new();
        let body = hierarchy.create();
        let sensor = hierarchy.create_at(Vec3::new(0.0, 1.0, 0.0));
        hierarchy.add_child(body, sensor, true).unwrap();

        let mut buffer = PoseBuffer::new();
        buffer.push(body, Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)));
        hierarchy.apply_poses(&mut buffer);

        assert_relative_eq!(
            hierarchy.world_position(sensor).unwrap(),
            Vec3::new(5.0, 1.0, 0.0),
            epsilon = 1e-6
        );
    }
}

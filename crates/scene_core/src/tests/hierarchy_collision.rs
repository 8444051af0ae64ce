//! Hierarchy mutations observed through colliders

use std::sync::Arc;

use crate::core::config::CollisionConfig;
use crate::foundation::math::{constants::HALF_PI, Vec3};
use crate::physics::{CollisionOutcome, CollisionSystem, MeshGeometry};
use crate::scene::TransformHierarchy;
use approx::assert_relative_eq;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grandchild_collider_follows_root() {
        let mut hierarchy = TransformHierarchy::new();
        let mut system = CollisionSystem::new(CollisionConfig::default());
        let cube = MeshGeometry::cube(0.5).shared();

        let root = hierarchy.create();
        let arm = hierarchy.create_at(Vec3::new(2.0, 0.0, 0.0));
        let hand = hierarchy.create_at(Vec3::new(0.0, 2.0, 0.0));
        hierarchy.add_child(root, arm, false).unwrap();
        hierarchy.add_child(arm, hand, false).unwrap();

        let hand_collider = system.attach_mesh(&mut hierarchy, hand, Arc::clone(&cube)).unwrap();
        let target = hierarchy.create_at(Vec3::new(-2.0, 2.0, 0.0));
        let target_collider = system.attach_mesh(&mut hierarchy, target, cube).unwrap();

        assert!(!system
            .check_for_collision(&mut hierarchy, hand_collider, target_collider, false)
            .unwrap());

        // Half a turn about Y swings the hand from x = +2 to x = -2.
        hierarchy.rotate(root, Vec3::new(0.0, 2.0 * HALF_PI, 0.0)).unwrap();

        assert_relative_eq!(
            system.calc_center_point(&mut hierarchy, hand_collider).unwrap(),
            Vec3::new(-2.0, 2.0, 0.0),
            epsilon = 1e-5
        );
        assert!(system
            .check_for_collision(&mut hierarchy, hand_collider, target_collider, false)
            .unwrap());
    }

    #[test]
    fn test_detached_collider_stops_following() {
        let mut hierarchy = TransformHierarchy::new();
        let mut system = CollisionSystem::new(CollisionConfig::default());
        let cube = MeshGeometry::cube(1.0).shared();

        let carrier = hierarchy.create();
        let cargo = hierarchy.create_at(Vec3::new(0.0, 3.0, 0.0));
        hierarchy.add_child(carrier, cargo, true).unwrap();
        let cargo_collider = system.attach_mesh(&mut hierarchy, cargo, Arc::clone(&cube)).unwrap();

        let wall = hierarchy.create_at(Vec3::new(10.0, 3.0, 0.0));
        let wall_collider = system.attach_mesh(&mut hierarchy, wall, cube).unwrap();

        hierarchy.remove_child(carrier, cargo).unwrap();
        hierarchy.move_absolute(carrier, Vec3::new(10.0, 0.0, 0.0)).unwrap();

        assert_eq!(
            system.query(&mut hierarchy, cargo_collider, wall_collider, false).unwrap(),
            CollisionOutcome::BroadPhaseRejected
        );
        assert_relative_eq!(
            system.calc_center_point(&mut hierarchy, cargo_collider).unwrap(),
            Vec3::new(0.0, 3.0, 0.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_scaled_parent_grows_child_bounds() {
        let mut hierarchy = TransformHierarchy::new();
        let mut system = CollisionSystem::new(CollisionConfig::default());

        let parent = hierarchy.create();
        let child = hierarchy.create();
        hierarchy.add_child(parent, child, false).unwrap();
        let collider = system
            .attach_mesh(&mut hierarchy, child, MeshGeometry::cube(1.0).shared())
            .unwrap();

        system.calc_center_point(&mut hierarchy, collider).unwrap();
        assert_relative_eq!(system.collider(collider).unwrap().bounds().radius_squared(), 3.0);

        hierarchy.scale_uniform(parent, 2.0).unwrap();
        system.calc_center_point(&mut hierarchy, collider).unwrap();
        assert_relative_eq!(
            system.collider(collider).unwrap().bounds().radius_squared(),
            12.0,
            epsilon = 1e-5
        );
    }
}

//! Handle types for the transform and collider arenas
//!
//! Both arenas are slot maps, so handles are generational: a handle to a
//! destroyed slot never aliases a newer object stored in the same slot.

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle to a node in a [`TransformHierarchy`](crate::scene::TransformHierarchy)
    pub struct TransformHandle;

    /// Stable handle to a collider registered in a [`CollisionSystem`](crate::physics::CollisionSystem)
    pub struct ColliderHandle;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_handle_is_not_reused() {
        let mut arena: SlotMap<TransformHandle, u32> = SlotMap::with_key();
        let first = arena.insert(1);
        arena.remove(first);
        let second = arena.insert(2);

        assert_ne!(first, second);
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second), Some(&2));
    }
}

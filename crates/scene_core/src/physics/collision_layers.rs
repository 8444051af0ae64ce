//! Collision layers for filtering candidate pairs
//!
//! Every collider sits on one or more layers and carries a mask of the layers
//! it wants to be tested against. A pair is only tested when each side's layer
//! is accepted by the other side's mask.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Layer bits; bits 8-31 are free for application-defined layers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionLayers: u32 {
        /// Layer of colliders created without an explicit layer
        const DEFAULT = 1 << 0;
        /// Geometry that never moves
        const STATIC = 1 << 1;
        /// Geometry driven by local movement or animation
        const DYNAMIC = 1 << 2;
        /// Geometry whose pose comes from an external simulation
        const KINEMATIC = 1 << 3;
        /// Volumes that only report overlaps
        const SENSOR = 1 << 4;
        /// Every layer, including application-defined ones
        const ALL = u32::MAX;
    }
}

impl CollisionLayers {
    /// Application-defined layer `index` (8-31)
    ///
    /// Returns `None` for indices outside the free range.
    pub fn custom(index: u32) -> Option<Self> {
        (8..32).contains(&index).then(|| Self::from_bits_retain(1 << index))
    }

    /// Check if two colliders should be tested against each other
    ///
    /// A's layer must be in B's mask and B's layer must be in A's mask.
    pub fn should_collide(layer_a: Self, mask_a: Self, layer_b: Self, mask_b: Self) -> bool {
        layer_a.intersects(mask_b) && layer_b.intersects(mask_a)
    }
}

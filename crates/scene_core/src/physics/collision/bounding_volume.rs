//! World-space bounding volume derived from a collider's vertices
//!
//! The volume is computed in three dependent stages, each cached behind its
//! own dirty flag:
//!
//! 1. min/max corner points (folded over every world-space vertex)
//! 2. half dimensions and the precheck radius (from the corners)
//! 3. center point (from the max corner and the half dimensions)
//!
//! The precheck radius is the length of the half-dimension vector, i.e. the
//! radius of the sphere circumscribing the world AABB. It is conservative, not
//! minimal.

use bitflags::bitflags;

use crate::foundation::math::Vec3;

use super::primitives::{Aabb, BoundingSphere};

bitflags! {
    /// Stages of a [`BoundingVolume`] that need recomputation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BoundsDirty: u8 {
        /// Min/max corner points
        const POINTS = 1 << 0;
        /// Half dimensions, precheck radius and center
        const HALVES = 1 << 1;
    }
}

/// Cached bounds of one collider
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingVolume {
    min_point: Vec3,
    max_point: Vec3,
    half_dimensions: Vec3,
    center: Vec3,
    radius_squared: f32,
    dirty: BoundsDirty,
}

impl Default for BoundingVolume {
    fn default() -> Self {
        Self {
            min_point: Vec3::zeros(),
            max_point: Vec3::zeros(),
            half_dimensions: Vec3::zeros(),
            center: Vec3::zeros(),
            radius_squared: 0.0,
            dirty: BoundsDirty::all(),
        }
    }
}

impl BoundingVolume {
    /// Create a volume that will be computed on first use
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages awaiting recomputation
    pub fn dirty(&self) -> BoundsDirty {
        self.dirty
    }

    /// Invalidate every stage after the vertices moved
    pub fn mark_dirty(&mut self) {
        self.dirty = BoundsDirty::all();
    }

    /// Fold the world-space vertices into min/max corners
    ///
    /// No-op while `POINTS` is clean. Every vertex contributes, including the
    /// first one.
    pub fn calc_min_max_points(&mut self, world_vertices: &[Vec3]) {
        if !self.dirty.contains(BoundsDirty::POINTS) {
            return;
        }

        let (min_point, max_point) = match world_vertices.split_first() {
            Some((first, rest)) => rest
                .iter()
                .fold((*first, *first), |(min, max), vertex| (min.inf(vertex), max.sup(vertex))),
            None => (Vec3::zeros(), Vec3::zeros()),
        };

        self.min_point = min_point;
        self.max_point = max_point;
        self.dirty.remove(BoundsDirty::POINTS);
    }

    /// Derive half dimensions and the squared precheck radius
    ///
    /// No-op while `HALVES` is clean; brings the corners up to date first.
    pub fn calc_half_dimensions(&mut self, world_vertices: &[Vec3]) {
        if !self.dirty.contains(BoundsDirty::HALVES) {
            return;
        }
        self.calc_min_max_points(world_vertices);

        self.half_dimensions = (self.max_point - self.min_point).abs() * 0.5;
        self.radius_squared = self.half_dimensions.norm_squared();
        self.center = self.max_point - self.half_dimensions;
        self.dirty.remove(BoundsDirty::HALVES);
    }

    /// Center of the volume, recomputing stale stages
    pub fn calc_center_point(&mut self, world_vertices: &[Vec3]) -> Vec3 {
        self.calc_half_dimensions(world_vertices);
        self.center
    }

    /// Minimum corner as of the last computation
    pub fn min_point(&self) -> Vec3 {
        self.min_point
    }

    /// Maximum corner as of the last computation
    pub fn max_point(&self) -> Vec3 {
        self.max_point
    }

    /// Half dimensions as of the last computation
    pub fn half_dimensions(&self) -> Vec3 {
        self.half_dimensions
    }

    /// Squared precheck radius as of the last computation
    pub fn radius_squared(&self) -> f32 {
        self.radius_squared
    }

    /// Precheck sphere as of the last computation
    pub fn sphere(&self) -> BoundingSphere {
        BoundingSphere::from_radius_squared(self.center, self.radius_squared)
    }

    /// World AABB as of the last computation
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.min_point, self.max_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube_at(offset: Vec3) -> Vec<Vec3> {
        (0..8)
            .map(|i| {
                let corner = Vec3::new(
                    if i & 1 == 0 { -1.0 } else { 1.0 },
                    if i & 2 == 0 { -1.0 } else { 1.0 },
                    if i & 4 == 0 { -1.0 } else { 1.0 },
                );
                corner + offset
            })
            .collect()
    }

    #[test]
    fn test_first_vertex_contributes() {
        // The unique minimum sits at index 0.
        let vertices = vec![
            Vec3::new(-5.0, -5.0, -5.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        let mut volume = BoundingVolume::new();
        volume.calc_min_max_points(&vertices);

        assert_eq!(volume.min_point(), Vec3::new(-5.0, -5.0, -5.0));
        assert_eq!(volume.max_point(), Vec3::new(1.0, 2.0, 1.0));
    }

    #[test]
    fn test_half_dimensions_and_radius() {
        let mut volume = BoundingVolume::new();
        let center = volume.calc_center_point(&cube_at(Vec3::new(3.0, 0.0, 0.0)));

        assert_relative_eq!(center, Vec3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(volume.half_dimensions(), Vec3::repeat(1.0));
        assert_relative_eq!(volume.radius_squared(), 3.0);
        assert!(volume.dirty().is_empty());
    }

    #[test]
    fn test_clean_volume_ignores_new_vertices() {
        let mut volume = BoundingVolume::new();
        volume.calc_center_point(&cube_at(Vec3::zeros()));

        // Without invalidation the cached values stay.
        let center = volume.calc_center_point(&cube_at(Vec3::new(10.0, 0.0, 0.0)));
        assert_relative_eq!(center, Vec3::zeros());

        volume.mark_dirty();
        let center = volume.calc_center_point(&cube_at(Vec3::new(10.0, 0.0, 0.0)));
        assert_relative_eq!(center, Vec3::new(10.0, 0.0, 0.0));
    }
}

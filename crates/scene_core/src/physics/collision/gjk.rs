//! GJK narrow phase for convex vertex sets
//!
//! Works on the Minkowski difference `A - B`: the shapes intersect exactly when
//! it contains the origin. The simplex is reduced each step to the feature
//! (vertex, edge, triangle) closest to the origin, and the next search
//! direction points from that feature toward the origin. Collinear triangles
//! and flat tetrahedra fall back to their lower-dimensional features instead of
//! producing a zero normal.
//!
//! Touching shapes count as intersecting.

use crate::core::config::GjkConfig;
use crate::foundation::math::Vec3;

/// Outcome of a GJK query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GjkResult {
    /// The shapes overlap or touch
    Intersecting,
    /// The shapes are disjoint, proven by `axis`
    Separated {
        /// Unit direction along which every point of `A - B` has a negative
        /// projection: `A` lies entirely behind `B` along it
        axis: Vec3,
    },
    /// The iteration cap was hit before either answer was proven
    Inconclusive,
}

impl GjkResult {
    /// `true` only for [`GjkResult::Intersecting`]
    pub fn is_intersecting(&self) -> bool {
        matches!(self, Self::Intersecting)
    }
}

/// Up to four support points of the Minkowski difference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simplex {
    points: [Vec3; 4],
    len: usize,
}

impl Default for Simplex {
    fn default() -> Self {
        Self {
            points: [Vec3::zeros(); 4],
            len: 0,
        }
    }
}

impl Simplex {
    /// Create an empty simplex
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from up to four points; extra points are ignored
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut simplex = Self::new();
        for point in points {
            simplex.push(*point);
        }
        simplex
    }

    /// Append a support point; a full simplex is left unchanged
    pub fn push(&mut self, point: Vec3) {
        if self.len < self.points.len() {
            self.points[self.len] = point;
            self.len += 1;
        }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the simplex has no points
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current points in insertion order
    pub fn points(&self) -> &[Vec3] {
        &self.points[..self.len]
    }

    fn contains_point(&self, point: &Vec3, tolerance_squared: f32) -> bool {
        self.points()
            .iter()
            .any(|existing| (existing - point).norm_squared() <= tolerance_squared)
    }
}

/// Farthest point along `direction`
///
/// Linear scan; on ties the first maximal point wins. `None` for an empty set.
pub fn calc_support(points: &[Vec3], direction: &Vec3) -> Option<Vec3> {
    let (first, rest) = points.split_first()?;
    let mut best = *first;
    let mut best_projection = first.dot(direction);
    for point in rest {
        let projection = point.dot(direction);
        if projection > best_projection {
            best = *point;
            best_projection = projection;
        }
    }
    Some(best)
}

fn minkowski_support(a: &[Vec3], b: &[Vec3], direction: &Vec3) -> Option<Vec3> {
    Some(calc_support(a, direction)? - calc_support(b, &-direction)?)
}

fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::zeros();
    }
    points.iter().sum::<Vec3>() / points.len() as f32
}

/// Test two world-space vertex sets for intersection of their convex hulls
pub fn check_gjk_collision(a: &[Vec3], b: &[Vec3], config: &GjkConfig) -> GjkResult {
    let tolerance_squared = config.tolerance * config.tolerance;

    let mut direction = centroid(a) - centroid(b);
    if direction.norm_squared() <= tolerance_squared {
        direction = Vec3::x();
    }

    let Some(first) = minkowski_support(a, b, &direction) else {
        log::warn!("GJK query on an empty vertex set");
        return GjkResult::Inconclusive;
    };
    let mut simplex = Simplex::new();
    simplex.push(first);
    direction = -first;

    for iteration in 0..config.max_iterations {
        if direction.norm_squared() <= tolerance_squared {
            log::trace!("GJK: origin on simplex after {} iterations", iteration);
            return GjkResult::Intersecting;
        }

        let Some(point) = minkowski_support(a, b, &direction) else {
            return GjkResult::Inconclusive;
        };

        if point.dot(&direction) < 0.0 {
            log::trace!("GJK: separating axis found after {} iterations", iteration);
            return GjkResult::Separated {
                axis: direction.normalize(),
            };
        }

        // A repeated support point that projects forward proves nothing along
        // `direction`. Restart the simplex from it.
        if simplex.contains_point(&point, tolerance_squared) {
            log::trace!("GJK: repeated support point after {} iterations, restarting", iteration);
            simplex = Simplex::from_points(&[point]);
            direction = -point;
            continue;
        }

        simplex.push(point);
        if do_simplex(&mut simplex, &mut direction, config.tolerance) {
            log::trace!("GJK: simplex encloses origin after {} iterations", iteration);
            return GjkResult::Intersecting;
        }
    }

    GjkResult::Inconclusive
}

/// Reduce the simplex to its feature closest to the origin
///
/// `direction` is set to point from that feature toward the origin. Returns
/// `true` when the origin lies inside or on the simplex.
pub fn do_simplex(simplex: &mut Simplex, direction: &mut Vec3, tolerance: f32) -> bool {
    let (closest, reduced) = match *simplex.points() {
        [a] => (a, Simplex::from_points(&[a])),
        [a, b] => closest_on_segment(a, b),
        [a, b, c] => closest_on_triangle(a, b, c),
        [a, b, c, d] => match closest_on_tetrahedron(a, b, c, d) {
            Some(feature) => feature,
            None => return true,
        },
        _ => return false,
    };

    *simplex = reduced;
    *direction = -closest;
    closest.norm_squared() <= tolerance * tolerance
}

fn closest_on_segment(a: Vec3, b: Vec3) -> (Vec3, Simplex) {
    let ab = b - a;
    let length_squared = ab.norm_squared();
    if length_squared <= f32::EPSILON * a.norm_squared().max(1.0) {
        return (b, Simplex::from_points(&[b]));
    }

    let t = (-a).dot(&ab) / length_squared;
    if t <= 0.0 {
        (a, Simplex::from_points(&[a]))
    } else if t >= 1.0 {
        (b, Simplex::from_points(&[b]))
    } else {
        (a + ab * t, Simplex::from_points(&[a, b]))
    }
}

fn closer(first: (Vec3, Simplex), second: (Vec3, Simplex)) -> (Vec3, Simplex) {
    if second.0.norm_squared() < first.0.norm_squared() {
        second
    } else {
        first
    }
}

/// Closest point of triangle `abc` to the origin (Ericson, RTCD 5.1.5)
fn closest_on_triangle(a: Vec3, b: Vec3, c: Vec3) -> (Vec3, Simplex) {
    let ab = b - a;
    let ac = c - a;

    // Collinear or coincident points have no face region.
    let normal = ab.cross(&ac);
    if normal.norm_squared() <= f32::EPSILON * ab.norm_squared() * ac.norm_squared() {
        let best = closer(closest_on_segment(a, b), closest_on_segment(b, c));
        return closer(best, closest_on_segment(a, c));
    }

    let ap = -a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, Simplex::from_points(&[a]));
    }

    let bp = -b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, Simplex::from_points(&[b]));
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, Simplex::from_points(&[a, b]));
    }

    let cp = -c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, Simplex::from_points(&[c]));
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, Simplex::from_points(&[a, c]));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, Simplex::from_points(&[b, c]));
    }

    // Face region: project the origin onto the plane.
    let closest = normal * (normal.dot(&a) / normal.norm_squared());
    (closest, Simplex::from_points(&[a, b, c]))
}

/// Closest feature of tetrahedron `abcd`, `None` when it contains the origin
fn closest_on_tetrahedron(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Option<(Vec3, Simplex)> {
    let faces = [(a, b, c, d), (a, c, d, b), (a, d, b, c), (b, d, c, a)];

    let volume = (b - a).cross(&(c - a)).dot(&(d - a));
    let scale = (b - a).norm() * (c - a).norm() * (d - a).norm();
    let flat = volume.abs() <= f32::EPSILON * scale;

    let mut best: Option<(Vec3, Simplex)> = None;
    for (p, q, r, opposite) in faces {
        // On a flat tetrahedron every face is a candidate.
        if !flat && !origin_outside_plane(p, q, r, opposite) {
            continue;
        }
        let candidate = closest_on_triangle(p, q, r);
        best = Some(match best {
            Some(current) => closer(current, candidate),
            None => candidate,
        });
    }

    // A flat tetrahedron encloses nothing, so it always reports a face.
    best
}

/// Whether the origin and `opposite` lie on different sides of plane `pqr`
fn origin_outside_plane(p: Vec3, q: Vec3, r: Vec3, opposite: Vec3) -> bool {
    let normal = (q - p).cross(&(r - p));
    let sign_origin = (-p).dot(&normal);
    let sign_opposite = (opposite - p).dot(&normal);
    sign_origin * sign_opposite < 0.0
}

//! Collision mesh geometry
//!
//! Meshes are stored in MODEL SPACE and never modified once built. Colliders
//! share them through an `Arc` and transform the vertices on demand.
//!
//! Only vertex positions matter for convex collision: GJK works on the
//! convex hull of the point set, so triangle indices are not kept.

use std::sync::Arc;

use thiserror::Error;

use crate::foundation::math::Vec3;

/// Errors building a mesh
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A mesh without vertices has no support point
    #[error("Collision mesh has no vertices")]
    Empty,

    /// Vertex stride smaller than a position
    #[error("Vertex stride {0} is smaller than the 3 floats of a position")]
    InvalidStride(usize),

    /// Buffer length is not a whole number of vertices
    #[error("Buffer of {len} floats is not a multiple of stride {stride}")]
    TruncatedBuffer {
        /// Buffer length in floats
        len: usize,
        /// Vertex stride in floats
        stride: usize,
    },

    /// Byte buffer could not be viewed as `f32`
    #[error("Byte buffer cannot be read as f32 data: {0:?}")]
    Cast(bytemuck::PodCastError),

    /// Vertex data contains NaN or infinity
    #[error("Vertex {0} has a non-finite coordinate")]
    NonFinite(usize),
}

/// Read-only access to object-space vertex positions
pub trait VertexSource {
    /// Number of vertices
    fn vertex_count(&self) -> usize;

    /// Position of the vertex at `index`, `None` past the end
    fn vertex(&self, index: usize) -> Option<Vec3>;

    /// Iterate over every position in index order
    fn positions(&self) -> Positions<'_, Self>
    where
        Self: Sized,
    {
        Positions { source: self, next: 0 }
    }
}

/// Iterator over the positions of a [`VertexSource`]
pub struct Positions<'a, S> {
    source: &'a S,
    next: usize,
}

impl<S: VertexSource> Iterator for Positions<'_, S> {
    type Item = Vec3;

    fn next(&mut self) -> Option<Vec3> {
        let vertex = self.source.vertex(self.next)?;
        self.next += 1;
        Some(vertex)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.source.vertex_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

/// Model-space geometry variants
#[derive(Debug, Clone, PartialEq)]
pub enum MeshGeometry {
    /// Explicit list of positions
    Points(Vec<Vec3>),

    /// Packed float buffer with the position in the first three floats of
    /// every `stride`-float vertex (normals, UVs etc. follow and are ignored)
    Interleaved {
        /// Raw vertex data
        data: Vec<f32>,
        /// Floats per vertex
        stride: usize,
    },

    /// Axis-aligned box centered on the origin
    Cuboid {
        /// Half size along each axis
        half_extents: Vec3,
    },
}

impl MeshGeometry {
    /// Build from a list of positions
    pub fn from_positions(positions: Vec<Vec3>) -> Result<Self, MeshError> {
        if positions.is_empty() {
            return Err(MeshError::Empty);
        }
        if let Some(index) = positions.iter().position(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(MeshError::NonFinite(index));
        }
        Ok(Self::Points(positions))
    }

    /// Build from a packed float buffer with `stride` floats per vertex
    pub fn from_interleaved(data: &[f32], stride: usize) -> Result<Self, MeshError> {
        if stride < 3 {
            return Err(MeshError::InvalidStride(stride));
        }
        if data.is_empty() {
            return Err(MeshError::Empty);
        }
        if data.len() % stride != 0 {
            return Err(MeshError::TruncatedBuffer { len: data.len(), stride });
        }
        if let Some(index) = data
            .chunks_exact(stride)
            .position(|vertex| !vertex[..3].iter().all(|c| c.is_finite()))
        {
            return Err(MeshError::NonFinite(index));
        }
        Ok(Self::Interleaved {
            data: data.to_vec(),
            stride,
        })
    }

    /// Build from raw vertex-buffer bytes holding native-endian `f32` values
    pub fn from_bytes(bytes: &[u8], stride: usize) -> Result<Self, MeshError> {
        let floats: &[f32] = bytemuck::try_cast_slice(bytes).map_err(MeshError::Cast)?;
        Self::from_interleaved(floats, stride)
    }

    /// Box with the given half extents
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Cuboid { half_extents }
    }

    /// Cube with edge length `2 * half_size`
    pub fn cube(half_size: f32) -> Self {
        Self::cuboid(Vec3::repeat(half_size))
    }

    /// Wrap in an `Arc` for sharing between colliders
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl VertexSource for MeshGeometry {
    fn vertex_count(&self) -> usize {
        match self {
            Self::Points(points) => points.len(),
            // A stride shorter than a position holds no vertices.
            Self::Interleaved { stride, .. } if *stride < 3 => 0,
            Self::Interleaved { data, stride } => data.len() / stride,
            Self::Cuboid { .. } => 8,
        }
    }

    fn vertex(&self, index: usize) -> Option<Vec3> {
        match self {
            Self::Points(points) => points.get(index).copied(),
            Self::Interleaved { stride, .. } if *stride < 3 => None,
            Self::Interleaved { data, stride } => {
                let start = index.checked_mul(*stride)?;
                let position = data.get(start..start.checked_add(3)?)?;
                Some(Vec3::new(position[0], position[1], position[2]))
            }
            Self::Cuboid { half_extents } => {
                if index >= 8 {
                    return None;
                }
                // Bit i of the index selects the sign along axis i.
                let sign = |bit: usize| -> f32 { if index & (1 << bit) == 0 { -1.0 } else { 1.0 } };
                Some(Vec3::new(
                    sign(0) * half_extents.x,
                    sign(1) * half_extents.y,
                    sign(2) * half_extents.z,
                ))
            }
        }
    }
}

//! Transform hierarchy arena
//!
//! Every [`Transform`] lives in one [`TransformHierarchy`] and is addressed by a
//! generational [`TransformHandle`]. Parent and child links are handles, so
//! destroying a node can never leave a dangling reference: stale handles are
//! simply rejected with [`HierarchyError::StaleHandle`].
//!
//! # Dirty propagation
//!
//! Every mutation marks the node and all of its descendants `WORLD` dirty.
//! Rotation changes additionally mark the node's own `BASIS` dirty. Nothing is
//! recomputed until a getter is called: [`TransformHierarchy::world_matrix`]
//! walks up to the first clean ancestor and composes back down.
//!
//! A node that is `WORLD` dirty always has an entirely dirty subtree, since a
//! node can only be cleaned after all of its ancestors were cleaned.

use thiserror::Error;

use crate::foundation::collections::{SlotMap, TransformHandle};
use crate::foundation::math::{decompose, Mat4, Vec3};

use super::transform::{Transform, TransformDirty};

/// Errors from hierarchy operations
///
/// A failed operation never modifies the hierarchy.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyError {
    /// The handle was never issued by this hierarchy or its node was destroyed
    #[error("Transform handle {0:?} is stale or unknown")]
    StaleHandle(TransformHandle),

    /// The child is already attached to this parent
    #[error("Transform {child:?} is already a child of {parent:?}")]
    AlreadyChild {
        /// Requested parent
        parent: TransformHandle,
        /// Requested child
        child: TransformHandle,
    },

    /// The child is the parent itself or one of its ancestors
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle {
        /// Requested parent
        parent: TransformHandle,
        /// Requested child
        child: TransformHandle,
    },

    /// Child index past the end of the children list
    #[error("Child index {index} out of range for {len} children")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of children
        len: usize,
    },

    /// The node is not attached to the given parent
    #[error("Transform {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Requested parent
        parent: TransformHandle,
        /// Requested child
        child: TransformHandle,
    },

    /// A parent world matrix could not be inverted
    #[error("World matrix of {0:?} is singular")]
    SingularMatrix(TransformHandle),
}

/// Arena owning every transform of a scene
#[derive(Debug, Default)]
pub struct TransformHierarchy {
    nodes: SlotMap<TransformHandle, Transform>,
}

impl TransformHierarchy {
    /// Create an empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty hierarchy with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
        }
    }

    /// Create a root node with the identity transform
    pub fn create(&mut self) -> TransformHandle {
        self.nodes.insert(Transform::default())
    }

    /// Create a root node at the given position
    pub fn create_at(&mut self, position: Vec3) -> TransformHandle {
        let handle = self.create();
        if let Some(node) = self.nodes.get_mut(handle) {
            node.set_position(position);
            node.insert_dirty(TransformDirty::WORLD);
        }
        handle
    }

    /// Destroy a node
    ///
    /// The node is detached from its parent and its children become roots
    /// (their world matrices are recomputed without the destroyed ancestor).
    pub fn destroy(&mut self, handle: TransformHandle) -> Result<(), HierarchyError> {
        let node = self.nodes.remove(handle).ok_or(HierarchyError::StaleHandle(handle))?;

        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|&child| child != handle);
            }
        }

        for &child in &node.children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = None;
            }
            self.mark_dirty(child, TransformDirty::WORLD);
        }

        log::debug!(
            "Destroyed transform {:?} ({} children orphaned)",
            handle,
            node.children.len()
        );
        Ok(())
    }

    /// Whether the handle refers to a live node
    pub fn contains(&self, handle: TransformHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the hierarchy has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Handles of all live nodes
    pub fn handles(&self) -> impl Iterator<Item = TransformHandle> + '_ {
        self.nodes.keys()
    }

    /// Read-only access to a node's local values
    pub fn get(&self, handle: TransformHandle) -> Option<&Transform> {
        self.nodes.get(handle)
    }

    /// Parent of a node
    pub fn parent(&self, handle: TransformHandle) -> Result<Option<TransformHandle>, HierarchyError> {
        Ok(self.node(handle)?.parent)
    }

    /// Children of a node in attachment order
    pub fn children(&self, handle: TransformHandle) -> Result<&[TransformHandle], HierarchyError> {
        Ok(self.node(handle)?.children())
    }

    /// Whether `ancestor` appears on the parent chain of `handle`
    pub fn is_ancestor(&self, ancestor: TransformHandle, handle: TransformHandle) -> Result<bool, HierarchyError> {
        let mut cursor = self.node(handle)?.parent;
        while let Some(current) = cursor {
            if current == ancestor {
                return Ok(true);
            }
            cursor = self.node(current)?.parent;
        }
        Ok(false)
    }

    // ------------------------------------------------------------------
    // Local mutation
    // ------------------------------------------------------------------

    /// Add an offset to the local position along the parent's axes
    pub fn move_absolute(&mut self, handle: TransformHandle, offset: Vec3) -> Result<(), HierarchyError> {
        self.node_mut(handle)?.translate(&offset);
        self.mark_dirty(handle, TransformDirty::WORLD);
        Ok(())
    }

    /// Add an offset expressed along the node's own right/up/forward axes
    pub fn move_relative(&mut self, handle: TransformHandle, offset: Vec3) -> Result<(), HierarchyError> {
        self.node_mut(handle)?.translate_local(&offset);
        self.mark_dirty(handle, TransformDirty::WORLD);
        Ok(())
    }

    /// Add `(pitch, yaw, roll)` radians to the accumulated Euler angles
    pub fn rotate(&mut self, handle: TransformHandle, delta: Vec3) -> Result<(), HierarchyError> {
        self.node_mut(handle)?.add_euler(&delta);
        self.mark_dirty(handle, TransformDirty::WORLD | TransformDirty::BASIS);
        Ok(())
    }

    /// Multiply the current scale per axis
    pub fn scale(&mut self, handle: TransformHandle, factors: Vec3) -> Result<(), HierarchyError> {
        self.node_mut(handle)?.multiply_scale(&factors);
        self.mark_dirty(handle, TransformDirty::WORLD);
        Ok(())
    }

    /// Multiply the current scale uniformly
    pub fn scale_uniform(&mut self, handle: TransformHandle, factor: f32) -> Result<(), HierarchyError> {
        self.scale(handle, Vec3::repeat(factor))
    }

    /// Overwrite the local position
    pub fn set_position(&mut self, handle: TransformHandle, position: Vec3) -> Result<(), HierarchyError> {
        self.node_mut(handle)?.set_position(position);
        self.mark_dirty(handle, TransformDirty::WORLD);
        Ok(())
    }

    /// Overwrite the local Euler angles `(pitch, yaw, roll)`
    pub fn set_rotation(&mut self, handle: TransformHandle, euler: Vec3) -> Result<(), HierarchyError> {
        self.node_mut(handle)?.set_euler(euler);
        self.mark_dirty(handle, TransformDirty::WORLD | TransformDirty::BASIS);
        Ok(())
    }

    /// Overwrite the local scale
    pub fn set_scale(&mut self, handle: TransformHandle, scale: Vec3) -> Result<(), HierarchyError> {
        self.node_mut(handle)?.set_scale(scale);
        self.mark_dirty(handle, TransformDirty::WORLD);
        Ok(())
    }

    /// Overwrite the local transform by decomposing `matrix`
    ///
    /// The matrix is split into translation, rotation and scale; the Euler
    /// angles are re-derived from the rotation.
    pub fn set_transforms_from_matrix(&mut self, handle: TransformHandle, matrix: &Mat4) -> Result<(), HierarchyError> {
        let decomposed = decompose(matrix);
        self.node_mut(handle)?.set_from_decomposed(&decomposed);
        self.mark_dirty(handle, TransformDirty::WORLD | TransformDirty::BASIS);
        Ok(())
    }

    /// Place a node at a world-space pose, whatever its parent is
    ///
    /// For roots this is [`Self::set_transforms_from_matrix`]; for attached
    /// nodes the pose is first brought into the parent's space.
    pub fn set_world_matrix(&mut self, handle: TransformHandle, world: &Mat4) -> Result<(), HierarchyError> {
        let parent = self.node(handle)?.parent;
        let local = match parent {
            Some(parent) => {
                let parent_world = self.world_matrix(parent)?;
                let inverse = parent_world
                    .try_inverse()
                    .ok_or(HierarchyError::SingularMatrix(parent))?;
                inverse * world
            }
            None => *world,
        };
        self.set_transforms_from_matrix(handle, &local)
    }

    // ------------------------------------------------------------------
    // Lazy getters
    // ------------------------------------------------------------------

    /// World matrix, recomputed along the parent chain if stale
    pub fn world_matrix(&mut self, handle: TransformHandle) -> Result<Mat4, HierarchyError> {
        self.ensure_world(handle)?;
        Ok(*self.node(handle)?.cached_world())
    }

    /// Inverse-transpose of the world matrix, for transforming normals
    pub fn world_inverse_transpose_matrix(&mut self, handle: TransformHandle) -> Result<Mat4, HierarchyError> {
        self.ensure_world(handle)?;
        Ok(*self.node(handle)?.cached_world_inverse_transpose())
    }

    /// World matrix together with a counter bumped on every recompute
    ///
    /// Consumers caching data derived from the world matrix compare the
    /// revision to detect that their cache went stale.
    pub fn world_matrix_with_revision(&mut self, handle: TransformHandle) -> Result<(Mat4, u64), HierarchyError> {
        self.ensure_world(handle)?;
        let node = self.node(handle)?;
        Ok((*node.cached_world(), node.world_revision()))
    }

    /// Revision of the current world matrix, recomputing it if stale
    pub fn world_revision(&mut self, handle: TransformHandle) -> Result<u64, HierarchyError> {
        self.world_matrix_with_revision(handle).map(|(_, revision)| revision)
    }

    /// World-space origin of the node
    pub fn world_position(&mut self, handle: TransformHandle) -> Result<Vec3, HierarchyError> {
        let world = self.world_matrix(handle)?;
        Ok(Vec3::new(world.m14, world.m24, world.m34))
    }

    /// Local forward axis
    pub fn forward(&mut self, handle: TransformHandle) -> Result<Vec3, HierarchyError> {
        Ok(self.node_mut(handle)?.forward())
    }

    /// Local up axis
    pub fn up(&mut self, handle: TransformHandle) -> Result<Vec3, HierarchyError> {
        Ok(self.node_mut(handle)?.up())
    }

    /// Local right axis
    pub fn right(&mut self, handle: TransformHandle) -> Result<Vec3, HierarchyError> {
        Ok(self.node_mut(handle)?.right())
    }

    // ------------------------------------------------------------------
    // Parenting
    // ------------------------------------------------------------------

    /// Attach `child` under `parent`
    ///
    /// With `make_relative` the child's local transform is rewritten so its
    /// world pose is unchanged by the attachment. A child attached elsewhere is
    /// detached from its old parent first.
    pub fn add_child(
        &mut self,
        parent: TransformHandle,
        child: TransformHandle,
        make_relative: bool,
    ) -> Result<(), HierarchyError> {
        self.node(parent)?;
        let old_parent = self.node(child)?.parent;

        if old_parent == Some(parent) {
            return Err(HierarchyError::AlreadyChild { parent, child });
        }
        if parent == child || self.is_ancestor(child, parent)? {
            return Err(HierarchyError::WouldCreateCycle { parent, child });
        }

        // Resolve the new local pose before touching any links so a singular
        // parent leaves the hierarchy untouched.
        let relative_pose = if make_relative {
            let child_world = self.world_matrix(child)?;
            let parent_world = self.world_matrix(parent)?;
            let inverse = parent_world
                .try_inverse()
                .ok_or(HierarchyError::SingularMatrix(parent))?;
            Some(inverse * child_world)
        } else {
            None
        };

        if let Some(old_parent) = old_parent {
            self.unlink(old_parent, child);
        }
        if let Some(local) = relative_pose {
            self.node_mut(child)?.set_from_decomposed(&decompose(&local));
        }

        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        self.mark_dirty(child, TransformDirty::WORLD | TransformDirty::BASIS);

        log::debug!("Attached {:?} under {:?} (relative: {})", child, parent, make_relative);
        Ok(())
    }

    /// Detach `child` from `parent`
    ///
    /// The child keeps its local values and becomes a root.
    pub fn remove_child(&mut self, parent: TransformHandle, child: TransformHandle) -> Result<(), HierarchyError> {
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|&candidate| candidate == child)
            .ok_or(HierarchyError::NotAChild { parent, child })?;
        self.remove_child_by_index(parent, index).map(|_| ())
    }

    /// Detach the `index`-th child of `parent`, returning its handle
    pub fn remove_child_by_index(&mut self, parent: TransformHandle, index: usize) -> Result<TransformHandle, HierarchyError> {
        let parent_node = self.node_mut(parent)?;
        let len = parent_node.children.len();
        if index >= len {
            return Err(HierarchyError::IndexOutOfRange { index, len });
        }

        let child = parent_node.children.remove(index);
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
        }
        self.mark_dirty(child, TransformDirty::WORLD);

        log::debug!("Detached {:?} from {:?}", child, parent);
        Ok(child)
    }

    /// Move `child` under `new_parent`, or make it a root with `None`
    ///
    /// Attaching keeps the world pose (see [`Self::add_child`]).
    pub fn set_parent(
        &mut self,
        child: TransformHandle,
        new_parent: Option<TransformHandle>,
    ) -> Result<(), HierarchyError> {
        let current = self.node(child)?.parent;
        match (current, new_parent) {
            (Some(current), None) => self.remove_child(current, child),
            (None, None) => Ok(()),
            (_, Some(new_parent)) => self.add_child(new_parent, child, true),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn node(&self, handle: TransformHandle) -> Result<&Transform, HierarchyError> {
        self.nodes.get(handle).ok_or(HierarchyError::StaleHandle(handle))
    }

    fn node_mut(&mut self, handle: TransformHandle) -> Result<&mut Transform, HierarchyError> {
        self.nodes.get_mut(handle).ok_or(HierarchyError::StaleHandle(handle))
    }

    fn unlink(&mut self, parent: TransformHandle, child: TransformHandle) {
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|&candidate| candidate != child);
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
        }
    }

    /// Flag `handle` with `flags` and every descendant with `WORLD`
    fn mark_dirty(&mut self, handle: TransformHandle, flags: TransformDirty) {
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        let subtree_already_dirty = node.dirty().contains(TransformDirty::WORLD);
        node.insert_dirty(flags | TransformDirty::WORLD);
        if subtree_already_dirty {
            return;
        }

        let mut stack = node.children.clone();
        while let Some(current) = stack.pop() {
            if let Some(descendant) = self.nodes.get_mut(current) {
                if descendant.dirty().contains(TransformDirty::WORLD) {
                    continue;
                }
                descendant.insert_dirty(TransformDirty::WORLD);
                stack.extend_from_slice(&descendant.children);
            }
        }
    }

    /// Recompute the world matrix of `handle` and any stale ancestors
    fn ensure_world(&mut self, handle: TransformHandle) -> Result<(), HierarchyError> {
        let mut stale_chain = Vec::new();
        let mut cursor = Some(handle);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            if !node.dirty().contains(TransformDirty::WORLD) {
                break;
            }
            stale_chain.push(current);
            cursor = node.parent;
        }

        for &current in stale_chain.iter().rev() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            let local = node.local_matrix();
            let world = match node.parent.and_then(|parent| self.nodes.get(parent)) {
                Some(parent) => parent.cached_world() * local,
                None => local,
            };
            if let Some(node) = self.nodes.get_mut(current) {
                node.store_world(world);
            }
        }

        if !stale_chain.is_empty() {
            log::trace!("Recomputed {} world matrices for {:?}", stale_chain.len(), handle);
        }
        Ok(())
    }
}

//! Hierarchical transforms
//!
//! Nodes live in an arena and point at their parent by handle, so there are
//! no ownership cycles. World values are never stored: every query walks the
//! parent chain and composes the local transforms on the way down.

use crate::foundation::collections::{SlotMap, TransformId};
use crate::foundation::logging::SCENE_TARGET;
use crate::foundation::math::{Mat4, Point3, Quat, Transform, Vec3};
use crate::scene::SceneError;

/// One node of the hierarchy
#[derive(Debug, Clone)]
pub struct TransformNode {
    /// Parent-relative position, rotation and scale
    pub local: Transform,
    parent: Option<TransformId>,
    children: Vec<TransformId>,
}

impl TransformNode {
    fn new(local: Transform) -> Self {
        Self {
            local,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Parent handle, if any
    pub fn parent(&self) -> Option<TransformId> {
        self.parent
    }

    /// Direct children in attachment order
    pub fn children(&self) -> &[TransformId] {
        &self.children
    }
}

/// Arena of transform nodes
#[derive(Debug, Default)]
pub struct TransformTree {
    nodes: SlotMap<TransformId, TransformNode>,
}

impl TransformTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root node with the given local transform
    pub fn insert(&mut self, local: Transform) -> TransformId {
        self.nodes.insert(TransformNode::new(local))
    }

    /// Remove a node
    ///
    /// Children are unparented, not removed. The node is detached from its
    /// own parent first.
    pub fn remove(&mut self, id: TransformId) -> Option<Transform> {
        let node = self.nodes.remove(id)?;

        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|c| *c != id);
        }
        for child in &node.children {
            if let Some(child) = self.nodes.get_mut(*child) {
                child.parent = None;
            }
        }

        Some(node.local)
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: TransformId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node accessor
    pub fn get(&self, id: TransformId) -> Option<&TransformNode> {
        self.nodes.get(id)
    }

    /// Local transform of a node
    pub fn local(&self, id: TransformId) -> Option<&Transform> {
        self.nodes.get(id).map(|n| &n.local)
    }

    /// Mutable local transform of a node
    pub fn local_mut(&mut self, id: TransformId) -> Option<&mut Transform> {
        self.nodes.get_mut(id).map(|n| &mut n.local)
    }

    /// Replace the local position
    pub fn set_local_position(&mut self, id: TransformId, position: Vec3) {
        if let Some(local) = self.local_mut(id) {
            local.position = position;
        }
    }

    /// Replace the local rotation
    pub fn set_local_rotation(&mut self, id: TransformId, rotation: Quat) {
        if let Some(local) = self.local_mut(id) {
            local.rotation = rotation;
        }
    }

    /// Replace the local scale
    pub fn set_local_scale(&mut self, id: TransformId, scale: Vec3) {
        if let Some(local) = self.local_mut(id) {
            local.scale = scale;
        }
    }

    /// Move a node by `offset` in its parent's space
    pub fn translate(&mut self, id: TransformId, offset: Vec3) {
        if let Some(local) = self.local_mut(id) {
            local.position += offset;
        }
    }

    /// Apply `rotation` after the node's current local rotation
    pub fn rotate(&mut self, id: TransformId, rotation: Quat) {
        if let Some(local) = self.local_mut(id) {
            local.rotation = rotation * local.rotation;
        }
    }

    /// Parent of a node
    pub fn parent(&self, id: TransformId) -> Option<TransformId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Direct children of a node (empty for unknown ids)
    pub fn children(&self, id: TransformId) -> &[TransformId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// All descendants in depth-first pre-order
    pub fn descendants(&self, id: TransformId) -> Vec<TransformId> {
        let mut out = Vec::new();
        let mut stack: Vec<TransformId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Whether `candidate` sits anywhere below `ancestor`
    pub fn is_descendant_of(&self, candidate: TransformId, ancestor: TransformId) -> bool {
        let mut cursor = self.parent(candidate);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Re-parent `child` under `new_parent`, or detach it with `None`
    ///
    /// Rejected without touching either node when the new parent is the child
    /// itself or one of its descendants.
    pub fn set_parent(
        &mut self,
        child: TransformId,
        new_parent: Option<TransformId>,
    ) -> Result<(), SceneError> {
        if !self.nodes.contains_key(child) {
            return Err(SceneError::UnknownTransform);
        }

        if let Some(parent) = new_parent {
            if !self.nodes.contains_key(parent) {
                return Err(SceneError::UnknownTransform);
            }
            if parent == child || self.is_descendant_of(parent, child) {
                log::warn!(
                    target: SCENE_TARGET,
                    "Refusing to parent transform {:?} under {:?}: would create a cycle",
                    child,
                    parent
                );
                return Err(SceneError::InvalidParent);
            }
        }

        let old_parent = self.nodes[child].parent;
        if old_parent == new_parent {
            return Ok(());
        }

        if let Some(old) = old_parent.and_then(|p| self.nodes.get_mut(p)) {
            old.children.retain(|c| *c != child);
        }
        if let Some(parent) = new_parent {
            self.nodes[parent].children.push(child);
        }
        self.nodes[child].parent = new_parent;

        Ok(())
    }

    /// Topmost ancestor (the node itself when it has no parent)
    pub fn root(&self, id: TransformId) -> TransformId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Local-to-world matrix
    ///
    /// `parent_world * T(position) * R(rotation) * S(scale)`, recomputed on
    /// every call.
    pub fn transformation(&self, id: TransformId) -> Mat4 {
        let mut matrix = Mat4::identity();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(current) else {
                break;
            };
            matrix = node.local.to_matrix() * matrix;
            cursor = node.parent;
        }
        matrix
    }

    /// Parent's local-to-world matrix (identity for roots)
    pub fn parent_transformation(&self, id: TransformId) -> Mat4 {
        self.parent(id)
            .map_or_else(Mat4::identity, |parent| self.transformation(parent))
    }

    /// World-space position
    pub fn world_position(&self, id: TransformId) -> Vec3 {
        let origin = self.transformation(id).transform_point(&Point3::origin());
        origin.coords
    }

    /// World-space rotation (product of all rotations up the chain)
    pub fn world_rotation(&self, id: TransformId) -> Quat {
        let mut rotation = Quat::identity();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(current) else {
                break;
            };
            rotation = node.local.rotation * rotation;
            cursor = node.parent;
        }
        rotation
    }

    /// World-space scale (component-wise product up the chain)
    pub fn world_scale(&self, id: TransformId) -> Vec3 {
        let mut scale = Vec3::new(1.0, 1.0, 1.0);
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(current) else {
                break;
            };
            scale = scale.component_mul(&node.local.scale);
            cursor = node.parent;
        }
        scale
    }

    /// Rotate a node so its local -Z axis points at `target` (world space)
    pub fn look_at(&mut self, id: TransformId, target: Vec3, up: Vec3) {
        let eye = self.world_position(id);
        let direction = target - eye;
        if direction.norm_squared() < f32::EPSILON {
            return;
        }

        let world = Quat::face_towards(&-direction, &up);
        let parent_rotation = self
            .parent(id)
            .map_or_else(Quat::identity, |p| self.world_rotation(p));

        if let Some(local) = self.local_mut(id) {
            local.rotation = parent_rotation.inverse() * world;
        }
    }
}

//! Hierarchical transform graph
//!
//! Nodes are stored in a slot map so external systems can hold stable,
//! copyable ids that survive unrelated insertions and removals.

use crate::foundation::math::{matrix_scale, Mat4, Quat, Transform, Vec3};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

new_key_type! {
    /// Stable identifier for a node in the scene graph
    pub struct NodeId;
}

/// Scene graph errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SceneError {
    /// A node id did not resolve to a live node
    #[error("node not found in scene graph")]
    UnknownNode,

    /// A reparenting operation would create a cycle
    #[error("reparenting would create a cycle")]
    Cycle,
}

/// A single node: local transform plus hierarchy links
#[derive(Debug)]
pub struct SceneNode {
    local: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    fn new(parent: Option<NodeId>) -> Self {
        Self {
            local: Transform::identity(),
            parent,
            children: Vec::new(),
        }
    }

    /// The node's local transform
    pub fn local_transform(&self) -> &Transform {
        &self.local
    }

    /// The node's parent, if any
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The node's children
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Hierarchical transform graph
///
/// Mutators addressed at missing nodes are silent no-ops: node removal can
/// race with systems holding ids, and a one-frame inconsistency self-heals.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
}

impl SceneGraph {
    /// Create an empty scene graph
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Add a root node with an identity transform
    pub fn add_node(&mut self) -> NodeId {
        self.nodes.insert(SceneNode::new(None))
    }

    /// Add a child node under `parent`
    pub fn add_child(&mut self, parent: NodeId) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::UnknownNode);
        }
        let id = self.nodes.insert(SceneNode::new(Some(parent)));
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Remove a node and its entire subtree
    pub fn remove_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(id) else {
            return;
        };
        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|&child| child != id);
            }
        }
        for child in node.children {
            self.remove_subtree(child);
        }
    }

    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }

    /// Move a node under a new parent (or detach it with `None`)
    pub fn set_parent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<(), SceneError> {
        if !self.nodes.contains_key(id) {
            return Err(SceneError::UnknownNode);
        }
        if let Some(parent) = new_parent {
            if !self.nodes.contains_key(parent) {
                return Err(SceneError::UnknownNode);
            }
            // Reject reparenting under the node's own subtree
            let mut ancestor = Some(parent);
            while let Some(current) = ancestor {
                if current == id {
                    return Err(SceneError::Cycle);
                }
                ancestor = self.nodes[current].parent;
            }
        }

        if let Some(old_parent) = self.nodes[id].parent {
            if let Some(old_parent_node) = self.nodes.get_mut(old_parent) {
                old_parent_node.children.retain(|&child| child != id);
            }
        }
        self.nodes[id].parent = new_parent;
        if let Some(parent) = new_parent {
            self.nodes[parent].children.push(id);
        }
        Ok(())
    }

    /// Whether a node id resolves to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Total number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Access a node
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// A node's parent, `None` when the node is a root or missing
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Whether a node exists and has a parent
    pub fn has_parent(&self, id: NodeId) -> bool {
        self.parent(id).is_some()
    }

    /// A node's local transform
    pub fn local_transform(&self, id: NodeId) -> Option<&Transform> {
        self.nodes.get(id).map(|node| &node.local)
    }

    /// Replace a node's local transform
    pub fn set_local_transform(&mut self, id: NodeId, transform: Transform) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.local = transform;
        }
    }

    /// Set a node's local position
    pub fn set_local_position(&mut self, id: NodeId, position: Vec3) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.local.position = position;
        }
    }

    /// Set a node's local rotation
    pub fn set_local_rotation(&mut self, id: NodeId, rotation: Quat) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.local.rotation = rotation;
        }
    }

    /// Set a node's local scale
    pub fn set_local_scale(&mut self, id: NodeId, scale: Vec3) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.local.scale = scale;
        }
    }

    /// Compose a node's world matrix by walking its parent chain
    ///
    /// Returns the identity matrix for missing nodes.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let Some(node) = self.nodes.get(id) else {
            return Mat4::identity();
        };
        match node.parent {
            Some(parent) => self.world_matrix(parent) * node.local.to_matrix(),
            None => node.local.to_matrix(),
        }
    }

    /// The world matrix of a node's parent
    ///
    /// `None` when the node is missing or has no parent.
    pub fn parent_world_matrix(&self, id: NodeId) -> Option<Mat4> {
        self.parent(id).map(|parent| self.world_matrix(parent))
    }

    /// A node's world-space scale, decomposed from its world matrix
    pub fn world_scale(&self, id: NodeId) -> Vec3 {
        matrix_scale(&self.world_matrix(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_add_and_remove_nodes() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node();
        let child = graph.add_child(root).unwrap();
        let grandchild = graph.add_child(child).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.parent(grandchild), Some(child));

        graph.remove_node(child);
        assert_eq!(graph.node_count(), 1);
        assert!(graph.contains(root));
        assert!(!graph.contains(grandchild));
        assert!(graph.node(root).unwrap().children().is_empty());
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node();
        let child = graph.add_child(root).unwrap();
        let grandchild = graph.add_child(child).unwrap();

        assert_eq!(
            graph.set_parent(root, Some(grandchild)),
            Err(SceneError::Cycle)
        );
        assert_eq!(graph.set_parent(root, Some(root)), Err(SceneError::Cycle));

        // Sibling moves are fine
        graph.set_parent(grandchild, Some(root)).unwrap();
        assert_eq!(graph.parent(grandchild), Some(root));
    }

    #[test]
    fn test_world_matrix_composes_parent_chain() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node();
        let child = graph.add_child(root).unwrap();

        graph.set_local_position(root, Vec3::new(10.0, 0.0, 0.0));
        graph.set_local_position(child, Vec3::new(1.0, 2.0, 3.0));

        let world = graph.world_matrix(child);
        let position = Vec3::new(world.m14, world.m24, world.m34);
        assert_relative_eq!(position, Vec3::new(11.0, 2.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_world_scale_accumulates() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node();
        let child = graph.add_child(root).unwrap();

        graph.set_local_scale(root, Vec3::new(2.0, 2.0, 2.0));
        graph.set_local_scale(child, Vec3::new(1.0, 3.0, 1.0));

        assert_relative_eq!(
            graph.world_scale(child),
            Vec3::new(2.0, 6.0, 2.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_mutators_ignore_missing_nodes() {
        let mut graph = SceneGraph::new();
        let node = graph.add_node();
        graph.remove_node(node);

        graph.set_local_position(node, Vec3::new(1.0, 1.0, 1.0));
        graph.remove_node(node);
        assert!(!graph.has_parent(node));
        assert_relative_eq!(graph.world_matrix(node), Mat4::identity());
    }
}

//=========================================================================
// Scene Graph
//=========================================================================
//
// Arena of transform nodes with id-referenced parent/child links.
//
// Architecture:
//   SceneGraph
//     └─ nodes: Vec<Node>   (index == NodeId)
//
// Invariants:
// - Every node has at most one parent
// - Parent links never form a cycle
// - `children` of a node mirror the `parent` links pointing at it
//
// Nodes are never removed individually; the whole graph is dropped with
// the scene context that owns it.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::{Mat4, Quat, Vec3};
use log::trace;

//=== Internal Dependencies ===============================================

use super::node::{CameraNode, Node, NodeId, NodeKind};
use crate::core::error::GraphError;

//=== FrameView ===========================================================

/// Camera parameters resolved for a single frame.
///
/// Computed from the graph on demand, so a camera locked onto a node
/// always aims at that node's position at the time the frame is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    /// Camera world position.
    pub eye: Vec3,

    /// World point the camera looks at.
    pub target: Vec3,

    /// Vertical field of view in radians.
    pub fov: f32,
}

//=== SceneGraph ==========================================================

/// Transform hierarchy for one scene.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Adds a root node and returns its id.
    pub fn spawn(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let node = Node::new(name, kind);
        trace!(target: "stage::graph", "Spawned node {:?} '{}'", id, node.name);
        self.nodes.push(node);
        id
    }

    /// Adds a root transform node.
    pub fn spawn_transform(&mut self, name: impl Into<String>) -> NodeId {
        self.spawn(name, NodeKind::Transform)
    }

    /// Adds a node already parented under `parent`.
    pub fn spawn_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
    ) -> Result<NodeId, GraphError> {
        self.check(parent)?;
        let id = self.spawn(name, kind);
        self.set_parent(id, Some(parent))?;
        Ok(id)
    }

    //--- Queries ----------------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds the first node with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(|index| NodeId(index as u32))
    }

    /// Returns true if `ancestor` appears on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    //--- Mutation ---------------------------------------------------------

    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> Result<(), GraphError> {
        self.node_mut(id)?.position = position;
        Ok(())
    }

    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat) -> Result<(), GraphError> {
        self.node_mut(id)?.rotation = rotation;
        Ok(())
    }

    /// Replaces the camera payload of a camera node.
    pub fn set_camera(&mut self, id: NodeId, camera: CameraNode) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        match &mut node.kind {
            NodeKind::Camera(existing) => {
                *existing = camera;
                Ok(())
            }
            _ => Err(GraphError::NotACamera(id)),
        }
    }

    /// Re-parents `child`. `None` detaches it to the root.
    ///
    /// Rejects self-parenting and any link that would close a cycle; on
    /// error the graph is unchanged.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), GraphError> {
        self.check(child)?;

        if let Some(parent) = parent {
            self.check(parent)?;
            if parent == child {
                return Err(GraphError::SelfParent(child));
            }
            if self.is_ancestor(child, parent) {
                return Err(GraphError::WouldCycle { child, parent });
            }
        }

        if let Some(old) = self.nodes[child.index()].parent.take() {
            self.nodes[old.index()].children.retain(|&c| c != child);
        }

        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(child);
        }
        self.nodes[child.index()].parent = parent;

        Ok(())
    }

    //--- Transforms -------------------------------------------------------

    /// Local-to-world matrix, walking the parent chain.
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4, GraphError> {
        let mut matrix = self.get(id)?.local_matrix();
        let mut current = self.parent(id);

        while let Some(parent) = current {
            let node = self.get(parent)?;
            matrix = node.local_matrix() * matrix;
            current = node.parent;
        }

        Ok(matrix)
    }

    pub fn world_position(&self, id: NodeId) -> Result<Vec3, GraphError> {
        Ok(self.world_matrix(id)?.transform_point3(Vec3::ZERO))
    }

    /// Resolves the view of a camera node for the current frame.
    pub fn frame_view(&self, camera: NodeId) -> Result<FrameView, GraphError> {
        let payload = *self
            .get(camera)?
            .camera()
            .ok_or(GraphError::NotACamera(camera))?;

        let world = self.world_matrix(camera)?;
        let eye = world.transform_point3(Vec3::ZERO);

        let target = match payload.locked_target {
            Some(target) => self.world_position(target)?,
            None => eye + world.transform_vector3(Vec3::NEG_Z),
        };

        Ok(FrameView {
            eye,
            target,
            fov: payload.fov,
        })
    }

    //--- Internal Helpers -------------------------------------------------

    fn get(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.node(id).ok_or(GraphError::MissingNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes.get_mut(id.index()).ok_or(GraphError::MissingNode(id))
    }

    fn check(&self, id: NodeId) -> Result<(), GraphError> {
        self.get(id).map(|_| ())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

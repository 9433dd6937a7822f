//=========================================================================
// Scene Graph Nodes
//=========================================================================
//
// Node payloads stored in the scene graph arena.
//
// Nodes reference their parent and children by `NodeId`; they never own
// each other. Ownership of every node sits with the `SceneGraph`.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::{Mat4, Quat, Vec3};

//=== Internal Dependencies ===============================================

use crate::core::bridge::MeshHandle;

//=== NodeId ==============================================================

/// Stable identifier of a node inside one scene graph.
///
/// Ids are only meaningful for the graph that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(super) u32);

impl NodeId {
    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

//=== CameraNode ==========================================================

/// Perspective camera payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraNode {
    /// Vertical field of view in radians.
    pub fov: f32,

    /// Node whose world position the camera aims at every frame.
    ///
    /// `None` means the camera looks along its own forward axis.
    pub locked_target: Option<NodeId>,
}

impl CameraNode {
    /// Field of view used by scenes that do not configure one.
    pub const DEFAULT_FOV: f32 = 0.8;

    pub fn new(fov: f32) -> Self {
        Self {
            fov,
            locked_target: None,
        }
    }

    pub fn locked_on(fov: f32, target: NodeId) -> Self {
        Self {
            fov,
            locked_target: Some(target),
        }
    }
}

impl Default for CameraNode {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FOV)
    }
}

//=== NodeKind ============================================================

/// What a node contributes to the scene besides its transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    /// Pure transform (anchors, pivots).
    Transform,

    /// Camera; see [`CameraNode`].
    Camera(CameraNode),

    /// Mesh owned by the rendering backend.
    Mesh(MeshHandle),
}

//=== Node ================================================================

/// A transform in the scene graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub(super) name: String,
    pub(super) position: Vec3,
    pub(super) rotation: Quat,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub(super) kind: NodeKind,
}

impl Node {
    pub(super) fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            parent: None,
            children: Vec::new(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position relative to the parent.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Rotation relative to the parent.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the camera payload if this node is a camera.
    pub fn camera(&self) -> Option<&CameraNode> {
        match &self.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Returns the mesh handle if this node is a mesh.
    pub fn mesh(&self) -> Option<MeshHandle> {
        match self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub(super) fn local_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

//=========================================================================
// Character Anchor
//=========================================================================
//
// World placement of the player character, the meshes built for it and
// the camera rig that follows it.
//
// Hierarchy:
//   player (anchor transform)
//     └─ outer  (collision shell, shadow caster)
//          └─ body
//               └─ visor
//
//   root (rig anchor, unparented)
//     └─ ytilt
//          └─ cam
//
// The anchor owns the asset bundle and the rig. The rig root stays out of
// the player hierarchy so the character's own rotation never swings the
// camera. Input is stored as an opaque handle for the movement
// collaborator; nothing here reads it.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use glam::Vec3;
use log::debug;

//=== Internal Dependencies ===============================================

use crate::core::bridge::{MeshHandle, RenderBackend, ShadowGeneratorHandle};
use crate::core::camera_rig::{CameraRig, RigSettings};
use crate::core::error::GraphError;
use crate::core::graph::{NodeId, NodeKind, SceneGraph};

//=== CharacterAssets =====================================================

/// Meshes produced by the character loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterAssets {
    /// Collision shell; the root of the character's mesh hierarchy.
    pub outer: MeshHandle,

    /// Visible body, parented under `outer`.
    pub body: MeshHandle,

    /// Face plate, parented under `body`.
    pub visor: MeshHandle,
}

//=== InputHandle =========================================================

/// Opaque handle from the input collaborator.
#[derive(Clone)]
pub struct InputHandle(Rc<dyn Any>);

impl InputHandle {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Recovers the concrete value for the collaborator that created it.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for InputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InputHandle(..)")
    }
}

//=== CharacterAnchor =====================================================

/// The character's root transform, its meshes and its camera rig.
#[derive(Debug)]
pub struct CharacterAnchor {
    node: NodeId,
    outer: NodeId,
    body: NodeId,
    visor: NodeId,
    assets: CharacterAssets,
    rig: CameraRig,
    input: Option<InputHandle>,
}

impl CharacterAnchor {
    /// Builds the camera rig, parents `assets` under a new `player` node and
    /// registers the outer shell with `shadow`.
    pub fn new<R>(
        graph: &mut SceneGraph,
        renderer: &mut R,
        assets: CharacterAssets,
        shadow: ShadowGeneratorHandle,
        rig: &RigSettings,
        input: Option<InputHandle>,
    ) -> Result<Self, GraphError>
    where
        R: RenderBackend + ?Sized,
    {
        let rig = CameraRig::new(graph, rig)?;

        let node = graph.spawn_transform("player");
        let outer = graph.spawn_child(node, "outer", NodeKind::Mesh(assets.outer))?;
        let body = graph.spawn_child(outer, "body", NodeKind::Mesh(assets.body))?;
        let visor = graph.spawn_child(body, "visor", NodeKind::Mesh(assets.visor))?;

        renderer.add_shadow_caster(shadow, assets.outer);

        debug!(target: "stage::character", "Character anchored with mesh {:?}", assets.outer);

        Ok(Self {
            node,
            outer,
            body,
            visor,
            assets,
            rig,
            input,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Node of the root mesh.
    pub fn mesh_node(&self) -> NodeId {
        self.outer
    }

    /// Nodes of outer, body and visor, root first.
    pub fn mesh_nodes(&self) -> [NodeId; 3] {
        [self.outer, self.body, self.visor]
    }

    pub fn assets(&self) -> &CharacterAssets {
        &self.assets
    }

    /// The follow camera built with this character.
    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn input(&self) -> Option<&InputHandle> {
        self.input.as_ref()
    }

    pub fn set_input(&mut self, input: Option<InputHandle>) {
        self.input = input;
    }

    pub fn position(&self, graph: &SceneGraph) -> Result<Vec3, GraphError> {
        graph.world_position(self.node)
    }

    pub fn set_position(&self, graph: &mut SceneGraph, position: Vec3) -> Result<(), GraphError> {
        graph.set_position(self.node, position)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

//=========================================================================
// Scene Graph
//=========================================================================
//
// Id-referenced transform hierarchy shared by cameras, character meshes
// and anchors.
//
// Architecture:
//   SceneGraph
//     └─ Node { parent: Option<NodeId>, children: Vec<NodeId>, kind }
//
//=========================================================================

//=== Module Declarations =================================================

mod node;
mod scene_graph;

//=== Public API ==========================================================

pub use node::{CameraNode, Node, NodeId, NodeKind};
pub use scene_graph::{FrameView, SceneGraph};

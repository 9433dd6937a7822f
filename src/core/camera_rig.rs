//=========================================================================
// Camera Rig
//=========================================================================
//
// Third-person camera hierarchy anchored to a follow target.
//
// Hierarchy:
//   anchor  (world position + yaw of the follow target, no parent)
//     └─ tilt    (vertical look offset only)
//          └─ camera  (pushed back along its local axis, locked on anchor)
//
// Yaw lives only on the anchor and pitch only on the tilt node, so facing
// and look angle never mix. The camera re-aims at the anchor's current
// position whenever a frame view is resolved; moving the anchor is all
// that is needed to follow.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::f32::consts::PI;

use glam::{EulerRot, Quat, Vec3};
use log::debug;

//=== Internal Dependencies ===============================================

use crate::core::error::GraphError;
use crate::core::graph::{CameraNode, NodeId, NodeKind, SceneGraph};

//=== Constants ===========================================================

/// Tilt applied at construction (Euler XYZ, radians).
pub const ORIGINAL_TILT: Vec3 = Vec3::ZERO;

//=== RigSettings =========================================================

/// Construction parameters of a [`CameraRig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigSettings {
    /// Distance from the tilt pivot back to the camera.
    pub distance: f32,

    /// Vertical field of view in radians.
    pub fov: f32,

    /// Initial tilt (Euler XYZ, radians).
    pub tilt: Vec3,
}

impl Default for RigSettings {
    fn default() -> Self {
        Self {
            distance: 30.0,
            fov: 0.47,
            tilt: ORIGINAL_TILT,
        }
    }
}

//=== CameraRig ===========================================================

/// Node ids of the anchor → tilt → camera chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraRig {
    anchor: NodeId,
    tilt: NodeId,
    camera: NodeId,
}

impl CameraRig {
    /// Builds the rig in `graph`.
    ///
    /// The anchor starts at the world origin turned half a revolution, so
    /// the camera faces the character's front rather than its back.
    pub fn new(graph: &mut SceneGraph, settings: &RigSettings) -> Result<Self, GraphError> {
        let anchor = graph.spawn_transform("root");
        graph.set_position(anchor, Vec3::ZERO)?;
        graph.set_rotation(anchor, Quat::from_rotation_y(PI))?;

        let tilt = graph.spawn_child(anchor, "ytilt", NodeKind::Transform)?;
        graph.set_rotation(tilt, tilt_rotation(settings.tilt))?;

        let camera = graph.spawn_child(
            tilt,
            "cam",
            NodeKind::Camera(CameraNode::locked_on(settings.fov, anchor)),
        )?;
        // glam cameras look down -Z, so "backward" is +Z.
        graph.set_position(camera, Vec3::Z * settings.distance)?;

        debug!(
            target: "stage::camera",
            "Camera rig built (distance: {}, fov: {})",
            settings.distance,
            settings.fov
        );

        Ok(Self { anchor, tilt, camera })
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    pub fn tilt(&self) -> NodeId {
        self.tilt
    }

    pub fn camera(&self) -> NodeId {
        self.camera
    }

    /// Moves the follow target. The camera picks it up on the next frame.
    pub fn follow(&self, graph: &mut SceneGraph, position: Vec3) -> Result<(), GraphError> {
        graph.set_position(self.anchor, position)
    }

    /// Replaces the tilt (Euler XYZ, radians). Yaw stays on the anchor.
    pub fn set_tilt(&self, graph: &mut SceneGraph, tilt: Vec3) -> Result<(), GraphError> {
        graph.set_rotation(self.tilt, tilt_rotation(tilt))
    }

    /// Checks the camera → tilt → anchor chain and the target lock.
    pub fn is_intact(&self, graph: &SceneGraph) -> bool {
        let locked = graph
            .node(self.camera)
            .and_then(|node| node.camera())
            .map(|camera| camera.locked_target == Some(self.anchor))
            .unwrap_or(false);

        locked
            && graph.parent(self.camera) == Some(self.tilt)
            && graph.parent(self.tilt) == Some(self.anchor)
            && graph.node(self.anchor).is_some_and(|node| node.parent().is_none())
    }
}

fn tilt_rotation(tilt: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, tilt.x, tilt.y, tilt.z)
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn hierarchy_is_anchor_tilt_camera() {
        let mut graph = SceneGraph::new();
        let rig = CameraRig::new(&mut graph, &RigSettings::default()).unwrap();

        assert_eq!(graph.parent(rig.camera()), Some(rig.tilt()));
        assert_eq!(graph.parent(rig.tilt()), Some(rig.anchor()));
        assert_eq!(graph.parent(rig.anchor()), None);
        assert!(rig.is_intact(&graph));
    }

    #[test]
    fn camera_sits_behind_turned_anchor() {
        let mut graph = SceneGraph::new();
        let rig = CameraRig::new(&mut graph, &RigSettings::default()).unwrap();

        let view = graph.frame_view(rig.camera()).unwrap();

        assert!(approx(view.eye, Vec3::new(0.0, 0.0, -30.0)));
        assert!(approx(view.target, Vec3::ZERO));
        assert_eq!(view.fov, 0.47);
    }

    #[test]
    fn camera_follows_anchor_without_update_calls() {
        let mut graph = SceneGraph::new();
        let rig = CameraRig::new(&mut graph, &RigSettings::default()).unwrap();

        for position in [
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(-12.5, 0.0, 4.0),
            Vec3::new(100.0, -2.0, 55.0),
        ] {
            rig.follow(&mut graph, position).unwrap();
            let view = graph.frame_view(rig.camera()).unwrap();
            assert!(approx(view.target, position));
            assert!(approx(view.eye, position + Vec3::new(0.0, 0.0, -30.0)));
        }
    }

    #[test]
    fn tilt_does_not_touch_anchor_yaw() {
        let mut graph = SceneGraph::new();
        let rig = CameraRig::new(&mut graph, &RigSettings::default()).unwrap();
        let yaw = graph.node(rig.anchor()).unwrap().rotation();

        rig.set_tilt(&mut graph, Vec3::new(0.4, 0.0, 0.0)).unwrap();

        assert_eq!(graph.node(rig.anchor()).unwrap().rotation(), yaw);
        assert_ne!(graph.node(rig.tilt()).unwrap().rotation(), Quat::IDENTITY);
        assert!(rig.is_intact(&graph));
    }

    #[test]
    fn default_tilt_is_original() {
        let mut graph = SceneGraph::new();
        let rig = CameraRig::new(&mut graph, &RigSettings::default()).unwrap();

        assert_eq!(graph.node(rig.tilt()).unwrap().rotation(), Quat::IDENTITY);
    }

    #[test]
    fn reparenting_the_camera_breaks_the_rig() {
        let mut graph = SceneGraph::new();
        let rig = CameraRig::new(&mut graph, &RigSettings::default()).unwrap();

        graph.set_parent(rig.camera(), None).unwrap();

        assert!(!rig.is_intact(&graph));
    }
}

//=========================================================================
// Scene Context
//=========================================================================
//
// One renderable scene plus its camera, overlays and (for gameplay) the
// character with its camera rig, tied to a single application state.
//
// Lifecycle:
//   Building ──attach()──> Live ──detach()──> Detached ──dispose()──> (gone)
//
// `dispose` consumes the context, so a disposed context can neither be
// rendered nor reused.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::Vec3;
use log::debug;

//=== Internal Dependencies ===============================================

use super::AppState;
use crate::core::bridge::{
    Backend, ContextId, OverlayHandle, RenderBackend, SceneHandle, ShadowGeneratorHandle,
    Subscription,
};
use crate::core::camera_rig::CameraRig;
use crate::core::character::CharacterAnchor;
use crate::core::error::GraphError;
use crate::core::graph::{FrameView, NodeId, SceneGraph};

//=== ContextPhase ========================================================

/// Where a context is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPhase {
    /// Being assembled; not visible to rendering or input.
    Building,

    /// Camera attached; the render loop draws this context.
    Live,

    /// Camera detached; about to be disposed.
    Detached,
}

//=== Gameplay ============================================================

#[derive(Debug)]
struct Gameplay {
    character: CharacterAnchor,
    shadow: ShadowGeneratorHandle,
}

//=== SceneContext ========================================================

/// Disposable bundle of scene, camera and UI for one application state.
#[derive(Debug)]
pub struct SceneContext {
    id: ContextId,
    state: AppState,
    scene: SceneHandle,
    graph: SceneGraph,
    camera: NodeId,
    overlays: Vec<OverlayHandle>,
    subscriptions: Vec<Subscription>,
    gameplay: Option<Gameplay>,
    phase: ContextPhase,
}

impl SceneContext {
    //--- Construction -----------------------------------------------------

    pub(crate) fn new(
        id: ContextId,
        state: AppState,
        scene: SceneHandle,
        graph: SceneGraph,
        camera: NodeId,
    ) -> Self {
        Self {
            id,
            state,
            scene,
            graph,
            camera,
            overlays: Vec::new(),
            subscriptions: Vec::new(),
            gameplay: None,
            phase: ContextPhase::Building,
        }
    }

    pub(crate) fn add_overlay(&mut self, overlay: OverlayHandle) {
        self.overlays.push(overlay);
    }

    pub(crate) fn add_subscription(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Installs the character; its rig camera becomes the active one.
    pub(crate) fn set_gameplay(&mut self, character: CharacterAnchor, shadow: ShadowGeneratorHandle) {
        self.camera = character.rig().camera();
        self.gameplay = Some(Gameplay { character, shadow });
    }

    //--- Accessors --------------------------------------------------------

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn scene(&self) -> SceneHandle {
        self.scene
    }

    /// The scene's active camera.
    pub fn camera(&self) -> NodeId {
        self.camera
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn overlays(&self) -> &[OverlayHandle] {
        &self.overlays
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn phase(&self) -> ContextPhase {
        self.phase
    }

    pub fn is_live(&self) -> bool {
        self.phase == ContextPhase::Live
    }

    pub fn rig(&self) -> Option<&CameraRig> {
        self.character().map(CharacterAnchor::rig)
    }

    pub fn character(&self) -> Option<&CharacterAnchor> {
        self.gameplay.as_ref().map(|g| &g.character)
    }

    pub fn shadow_generator(&self) -> Option<ShadowGeneratorHandle> {
        self.gameplay.as_ref().map(|g| g.shadow)
    }

    /// Resolves the active camera for this frame.
    pub fn frame_view(&self) -> Result<FrameView, GraphError> {
        self.graph.frame_view(self.camera)
    }

    //--- Gameplay ---------------------------------------------------------

    /// Moves the character. No-op outside gameplay contexts.
    pub fn place_character(&mut self, position: Vec3) -> Result<(), GraphError> {
        match &self.gameplay {
            Some(gameplay) => gameplay.character.set_position(&mut self.graph, position),
            None => Ok(()),
        }
    }

    /// Moves the camera rig's follow target. No-op outside gameplay contexts.
    pub fn follow(&mut self, position: Vec3) -> Result<(), GraphError> {
        match &self.gameplay {
            Some(gameplay) => gameplay.character.rig().follow(&mut self.graph, position),
            None => Ok(()),
        }
    }

    /// Sets the rig's vertical look offset. No-op outside gameplay contexts.
    pub fn set_camera_tilt(&mut self, tilt: Vec3) -> Result<(), GraphError> {
        match &self.gameplay {
            Some(gameplay) => gameplay.character.rig().set_tilt(&mut self.graph, tilt),
            None => Ok(()),
        }
    }

    //--- Lifecycle --------------------------------------------------------

    /// Connects the camera to canvas and input.
    pub(crate) fn attach<R>(&mut self, renderer: &mut R)
    where
        R: RenderBackend + ?Sized,
    {
        if self.phase == ContextPhase::Live {
            return;
        }
        renderer.attach_camera(self.scene, self.camera);
        self.phase = ContextPhase::Live;
        debug!(target: "stage::context", "Context {:?} ({:?}) attached", self.id, self.state);
    }

    /// Disconnects the camera from canvas and input.
    pub(crate) fn detach<R>(&mut self, renderer: &mut R)
    where
        R: RenderBackend + ?Sized,
    {
        if self.phase != ContextPhase::Live {
            return;
        }
        renderer.detach_camera(self.scene, self.camera);
        self.phase = ContextPhase::Detached;
        debug!(target: "stage::context", "Context {:?} ({:?}) detached", self.id, self.state);
    }

    /// Releases subscriptions, overlays and the scene.
    pub(crate) fn dispose<B>(mut self, backend: &mut B)
    where
        B: Backend + ?Sized,
    {
        self.detach(backend);

        for subscription in self.subscriptions.drain(..) {
            backend.unsubscribe(subscription);
        }
        for overlay in self.overlays.drain(..) {
            backend.dispose_overlay(overlay);
        }
        backend.dispose_scene(self.scene);

        debug!(target: "stage::context", "Context {:?} ({:?}) disposed", self.id, self.state);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bridge::{RenderBackend, UiBackend};
    use crate::core::graph::{CameraNode, NodeKind};
    use crate::headless::{BackendCall, HeadlessBackend};

    fn screen(backend: &mut HeadlessBackend) -> SceneContext {
        let scene = backend.create_scene();
        let mut graph = SceneGraph::new();
        let camera = graph.spawn("camera", NodeKind::Camera(CameraNode::default()));
        SceneContext::new(ContextId(1), AppState::Start, scene, graph, camera)
    }

    #[test]
    fn new_context_is_building() {
        let mut backend = HeadlessBackend::manual();
        let context = screen(&mut backend);

        assert_eq!(context.phase(), ContextPhase::Building);
        assert!(!context.is_live());
        assert!(context.rig().is_none());
        assert!(context.character().is_none());
    }

    #[test]
    fn attach_and_detach_toggle_camera() {
        let mut backend = HeadlessBackend::manual();
        let mut context = screen(&mut backend);
        let scene = context.scene();

        context.attach(&mut backend);
        context.attach(&mut backend);
        assert!(context.is_live());
        assert_eq!(backend.attached_scenes(), vec![scene]);

        context.detach(&mut backend);
        assert_eq!(context.phase(), ContextPhase::Detached);
        assert!(backend.attached_scenes().is_empty());
    }

    #[test]
    fn dispose_releases_everything() {
        let mut backend = HeadlessBackend::manual();
        let mut context = screen(&mut backend);
        let scene = context.scene();
        let overlay = backend.create_fullscreen_overlay(scene);
        context.add_overlay(overlay);
        context.attach(&mut backend);

        context.dispose(&mut backend);

        assert!(!backend.is_scene_alive(scene));
        assert!(backend.attached_scenes().is_empty());
        assert!(backend.journal().contains(&BackendCall::DisposeOverlay(overlay)));
    }

    #[test]
    fn gameplay_helpers_are_noops_on_screens() {
        let mut backend = HeadlessBackend::manual();
        let mut context = screen(&mut backend);

        assert!(context.place_character(Vec3::ONE).is_ok());
        assert!(context.follow(Vec3::ONE).is_ok());
        assert!(context.set_camera_tilt(Vec3::ONE).is_ok());
    }
}

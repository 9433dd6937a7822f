//=========================================================================
// Scene Factory
//=========================================================================
//
// Builds scene contexts for each application state.
//
// Screens (Start, Cutscene, Lose) get a free camera at the origin and a
// fullscreen overlay with one centred control. The game context is
// assembled from a finished pre-build: overlay with a corner control,
// shadow generator, camera rig and character.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use super::context::SceneContext;
use super::prebuild::GamePrebuild;
use super::AppState;
use crate::core::bridge::{
    Backend, ButtonStyle, ContextId, Control, ControlCollector, ControlEvent, ReadySignal,
    SceneHandle,
};
use crate::core::character::{CharacterAnchor, CharacterAssets};
use crate::core::config::StageConfig;
use crate::core::error::GraphError;
use crate::core::graph::{CameraNode, NodeKind, SceneGraph};

//=== SceneFactory ========================================================

/// Issues context ids and builds contexts against a backend.
#[derive(Debug)]
pub(crate) struct SceneFactory {
    config: StageConfig,
    controls: ControlCollector,
    next_id: u64,
}

impl SceneFactory {
    pub(crate) fn new(config: StageConfig) -> Self {
        let controls = ControlCollector::new(config.control_capacity);
        Self {
            config,
            controls,
            next_id: 0,
        }
    }

    pub(crate) fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Presses queued by the UI since the last frame.
    pub(crate) fn collect_controls(&mut self) -> Vec<ControlEvent> {
        self.controls.collect_frame()
    }

    fn next_id(&mut self) -> ContextId {
        let id = ContextId(self.next_id);
        self.next_id += 1;
        id
    }

    //--- Screens ----------------------------------------------------------

    /// Builds a screen context for `state` and returns it with the scene's
    /// ready signal.
    pub(crate) fn build_screen<B>(
        &mut self,
        state: AppState,
        backend: &mut B,
    ) -> (SceneContext, ReadySignal<()>)
    where
        B: Backend + ?Sized,
    {
        let id = self.next_id();
        let scene = backend.create_scene();

        let mut graph = SceneGraph::new();
        let camera = graph.spawn("camera", NodeKind::Camera(CameraNode::default()));

        let mut context = SceneContext::new(id, state, scene, graph, camera);
        self.add_control(&mut context, Control::offered_in(state), ButtonStyle::Centered, backend);

        debug!(target: "stage::factory", "Built {:?} screen as {:?} in {:?}", state, id, scene);

        let ready = backend.when_ready(scene);
        (context, ready)
    }

    //--- Gameplay ---------------------------------------------------------

    /// Starts loading the game scene.
    pub(crate) fn start_prebuild<B>(&mut self, backend: &mut B) -> GamePrebuild
    where
        B: Backend + ?Sized,
    {
        GamePrebuild::start(backend)
    }

    /// Turns a pre-built scene into the game context.
    ///
    /// The character is left at the origin; it is moved to the spawn point
    /// once the scene reports ready.
    pub(crate) fn assemble_game<B>(
        &mut self,
        scene: SceneHandle,
        assets: CharacterAssets,
        backend: &mut B,
    ) -> Result<(SceneContext, ReadySignal<()>), GraphError>
    where
        B: Backend + ?Sized,
    {
        let id = self.next_id();
        let mut graph = SceneGraph::new();

        let shadow = backend.create_shadow_generator(scene);
        let character = CharacterAnchor::new(
            &mut graph,
            &mut *backend,
            assets,
            shadow,
            &self.config.rig,
            self.config.input.clone(),
        )?;

        let mut context = SceneContext::new(id, AppState::Game, scene, graph, character.rig().camera());
        context.set_gameplay(character, shadow);
        self.add_control(&mut context, Control::Lose, ButtonStyle::Corner, backend);

        debug!(target: "stage::factory", "Assembled game context {:?} in {:?}", id, scene);

        let ready = backend.when_ready(scene);
        Ok((context, ready))
    }

    //--- Helpers ----------------------------------------------------------

    fn add_control<B>(
        &self,
        context: &mut SceneContext,
        control: Control,
        style: ButtonStyle,
        backend: &mut B,
    ) where
        B: Backend + ?Sized,
    {
        let overlay = backend.create_fullscreen_overlay(context.scene());
        let button = backend.create_button(overlay, control.label(), style);
        let subscription = backend.subscribe(button, self.controls.sink(context.id(), control));

        context.add_overlay(overlay);
        context.add_subscription(subscription);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

//=========================================================================
// Pending Transition
//=========================================================================
//
// A transition that has been requested but not yet committed.
//
// Steps:
//   Prebuild ──loads done──> assemble game context ──┐
//                                                    ↓
//   Screen build ─────────────────────────────> Ready (await scene ready)
//                                                    ↓
//                                          Progress::Ready(context)
//
// `advance` is called once per frame. On failure the transition releases
// whatever it built before reporting the error.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::task::Poll;

use glam::Vec3;
use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::context::SceneContext;
use super::factory::SceneFactory;
use super::prebuild::GamePrebuild;
use super::AppState;
use crate::core::bridge::{Backend, ReadySignal};
use crate::core::error::LoadError;

//=== Progress ============================================================

/// Result of advancing a transition by one frame.
#[derive(Debug)]
pub(crate) enum Progress {
    /// Still loading; keep polling.
    Waiting(PendingTransition),

    /// The new context is built and its scene is ready to commit.
    Ready(SceneContext),

    /// A load failed; everything built so far has been released.
    Failed(LoadError),
}

//=== PendingTransition ===================================================

#[derive(Debug)]
enum Step {
    Prebuild(GamePrebuild),
    Ready {
        context: SceneContext,
        ready: ReadySignal<()>,
    },
}

/// Transition towards `target` that is still loading.
#[derive(Debug)]
pub(crate) struct PendingTransition {
    target: AppState,
    spawn_point: Vec3,
    step: Step,
}

impl PendingTransition {
    /// Waits for `context`'s scene before committing.
    pub(crate) fn awaiting_ready(
        target: AppState,
        spawn_point: Vec3,
        context: SceneContext,
        ready: ReadySignal<()>,
    ) -> Self {
        Self {
            target,
            spawn_point,
            step: Step::Ready { context, ready },
        }
    }

    /// Waits for the pre-build, then assembles and waits for the game scene.
    pub(crate) fn awaiting_prebuild(spawn_point: Vec3, prebuild: GamePrebuild) -> Self {
        Self {
            target: AppState::Game,
            spawn_point,
            step: Step::Prebuild(prebuild),
        }
    }

    pub(crate) fn target(&self) -> AppState {
        self.target
    }

    /// Gives up on the transition and releases what it built.
    pub(crate) fn abandon<B>(self, backend: &mut B)
    where
        B: Backend + ?Sized,
    {
        debug!(target: "stage::transition", "Abandoning transition to {:?}", self.target);
        match self.step {
            Step::Prebuild(prebuild) => prebuild.discard(backend),
            Step::Ready { context, .. } => context.dispose(backend),
        }
    }

    /// Polls the current step and moves on as far as this frame allows.
    pub(crate) fn advance<B>(self, backend: &mut B, factory: &mut SceneFactory) -> Progress
    where
        B: Backend + ?Sized,
    {
        let Self {
            target,
            spawn_point,
            step,
        } = self;

        match step {
            Step::Prebuild(mut prebuild) => {
                if let Err(error) = prebuild.poll() {
                    prebuild.discard(backend);
                    return Progress::Failed(error);
                }

                let (scene, assets) = match prebuild.finish() {
                    Ok(parts) => parts,
                    Err(prebuild) => {
                        return Progress::Waiting(Self {
                            target,
                            spawn_point,
                            step: Step::Prebuild(prebuild),
                        })
                    }
                };

                match factory.assemble_game(scene, assets, backend) {
                    Ok((context, ready)) => {
                        debug!(target: "stage::transition", "Game context assembled, awaiting scene");
                        Self::awaiting_ready(target, spawn_point, context, ready).advance(backend, factory)
                    }
                    Err(error) => {
                        backend.dispose_scene(scene);
                        Progress::Failed(LoadError::Failed {
                            what: "game scene",
                            reason: error.to_string(),
                        })
                    }
                }
            }

            Step::Ready { mut context, mut ready } => match ready.poll() {
                Poll::Pending => Progress::Waiting(Self {
                    target,
                    spawn_point,
                    step: Step::Ready { context, ready },
                }),
                Poll::Ready(Ok(())) => match context.place_character(spawn_point) {
                    Ok(()) => Progress::Ready(context),
                    Err(error) => {
                        warn!(target: "stage::transition", "Character not placed at spawn: {}", error);
                        context.dispose(backend);
                        Progress::Failed(LoadError::Failed {
                            what: "game scene",
                            reason: error.to_string(),
                        })
                    }
                },
                Poll::Ready(Err(error)) => {
                    context.dispose(backend);
                    Progress::Failed(error)
                }
            },
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bridge::{ContextId, MeshHandle, RenderBackend};
    use crate::core::camera_rig::RigSettings;
    use crate::core::character::{CharacterAnchor, CharacterAssets};
    use crate::core::config::StageConfig;
    use crate::core::graph::{CameraNode, NodeKind, SceneGraph};
    use crate::headless::{HeadlessBackend, LoadKind};

    const SPAWN: Vec3 = Vec3::new(0.0, 3.0, 0.0);

    #[test]
    fn screen_waits_for_scene_ready() {
        let mut backend = HeadlessBackend::manual();
        let mut factory = SceneFactory::new(StageConfig::default());
        let (context, ready) = factory.build_screen(AppState::Start, &mut backend);
        let pending = PendingTransition::awaiting_ready(AppState::Start, SPAWN, context, ready);

        let pending = match pending.advance(&mut backend, &mut factory) {
            Progress::Waiting(pending) => pending,
            other => panic!("expected Waiting, got {:?}", other),
        };

        backend.resolve_kind(LoadKind::SceneReady);

        assert!(matches!(
            pending.advance(&mut backend, &mut factory),
            Progress::Ready(context) if context.state() == AppState::Start
        ));
    }

    #[test]
    fn failed_screen_releases_its_scene() {
        let mut backend = HeadlessBackend::manual();
        let mut factory = SceneFactory::new(StageConfig::default());
        let (context, ready) = factory.build_screen(AppState::Lose, &mut backend);
        let scene = context.scene();
        let pending = PendingTransition::awaiting_ready(AppState::Lose, SPAWN, context, ready);

        backend.fail_pending(LoadKind::SceneReady, "gpu lost");

        assert!(matches!(
            pending.advance(&mut backend, &mut factory),
            Progress::Failed(LoadError::Failed { .. })
        ));
        assert!(!backend.is_scene_alive(scene));
    }

    #[test]
    fn game_places_character_at_spawn_once_ready() {
        let mut backend = HeadlessBackend::manual();
        let mut factory = SceneFactory::new(StageConfig::default());
        let prebuild = GamePrebuild::start(&mut backend);
        backend.resolve_kind(LoadKind::Environment);
        backend.resolve_kind(LoadKind::Character);

        let pending = match PendingTransition::awaiting_prebuild(SPAWN, prebuild)
            .advance(&mut backend, &mut factory)
        {
            Progress::Waiting(pending) => pending,
            other => panic!("expected Waiting, got {:?}", other),
        };
        backend.resolve_kind(LoadKind::SceneReady);

        let context = match pending.advance(&mut backend, &mut factory) {
            Progress::Ready(context) => context,
            other => panic!("expected Ready, got {:?}", other),
        };

        let character = context.character().unwrap();
        assert_eq!(character.position(context.graph()).unwrap(), SPAWN);
    }

    #[test]
    fn unplaceable_character_fails_and_releases_the_scene() {
        let mut backend = HeadlessBackend::manual();
        let mut factory = SceneFactory::new(StageConfig::default());
        let scene = backend.create_scene();
        let shadow = backend.create_shadow_generator(scene);
        let assets = CharacterAssets {
            outer: MeshHandle::new(1),
            body: MeshHandle::new(2),
            visor: MeshHandle::new(3),
        };

        // Character nodes live in another graph, so placing it cannot succeed.
        let mut elsewhere = SceneGraph::new();
        let character =
            CharacterAnchor::new(&mut elsewhere, &mut backend, assets, shadow, &RigSettings::default(), None)
                .unwrap();
        let mut graph = SceneGraph::new();
        let camera = graph.spawn("camera", NodeKind::Camera(CameraNode::default()));
        let mut context = SceneContext::new(ContextId(9), AppState::Game, scene, graph, camera);
        context.set_gameplay(character, shadow);

        let ready = backend.when_ready(scene);
        backend.resolve_kind(LoadKind::SceneReady);
        let pending = PendingTransition::awaiting_ready(AppState::Game, SPAWN, context, ready);

        assert!(matches!(
            pending.advance(&mut backend, &mut factory),
            Progress::Failed(LoadError::Failed { what: "game scene", .. })
        ));
        assert!(!backend.is_scene_alive(scene));
    }

    #[test]
    fn failed_prebuild_releases_its_scene() {
        let mut backend = HeadlessBackend::manual();
        let mut factory = SceneFactory::new(StageConfig::default());
        let prebuild = GamePrebuild::start(&mut backend);
        let scene = prebuild.scene();

        backend.fail_pending(LoadKind::Character, "missing mesh");

        assert!(matches!(
            PendingTransition::awaiting_prebuild(SPAWN, prebuild).advance(&mut backend, &mut factory),
            Progress::Failed(_)
        ));
        assert!(!backend.is_scene_alive(scene));
    }
}

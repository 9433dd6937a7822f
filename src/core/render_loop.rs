//=========================================================================
// Render Loop
//=========================================================================
//
// Per-frame dispatch to the current scene context.
//
// The loop holds no scene of its own: every frame it asks the state
// machine for the current context, so a commit re-points it without any
// extra bookkeeping.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{trace, warn};

//=== Internal Dependencies ===============================================

use crate::core::bridge::{RenderBackend, SceneHandle};
use crate::core::scene::{AppState, AppStateMachine, SceneContext};

//=== RenderLoop ==========================================================

/// Renders the current context once per frame.
#[derive(Debug, Default)]
pub struct RenderLoop {
    frames: u64,
    rendered: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames dispatched, rendered or not.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames that reached the renderer.
    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    /// Renders the current context and returns its scene.
    ///
    /// Renders nothing before the first commit or while the current
    /// context is not live.
    pub fn frame<R>(&mut self, machine: &AppStateMachine, renderer: &mut R) -> Option<SceneHandle>
    where
        R: RenderBackend + ?Sized,
    {
        self.frames += 1;

        let context = machine.current()?;
        let scene = match machine.state()? {
            AppState::Start => self.render(context, renderer),
            AppState::Cutscene => self.render(context, renderer),
            AppState::Game => self.render(context, renderer),
            AppState::Lose => self.render(context, renderer),
        };

        if scene.is_some() {
            self.rendered += 1;
        }
        scene
    }

    fn render<R>(&self, context: &SceneContext, renderer: &mut R) -> Option<SceneHandle>
    where
        R: RenderBackend + ?Sized,
    {
        if !context.is_live() {
            trace!(target: "stage::render", "Skipping context {:?} ({:?})", context.id(), context.phase());
            return None;
        }

        match context.frame_view() {
            Ok(view) => {
                renderer.render_frame(context.scene(), &view);
                Some(context.scene())
            }
            Err(error) => {
                warn!(target: "stage::render", "No view for {:?}: {}", context.scene(), error);
                None
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

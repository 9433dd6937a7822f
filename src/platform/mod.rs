//=========================================================================
// Platform Subsystem
//
// Runs the stage inside a winit window.
//
// Architecture:
// ```text
//  Main Thread:
//  ┌──────────────────────────────────────┐
//  │  Winit Event Loop                    │
//  │   ├─ resumed         → create window │
//  │   │                    Stage::boot   │
//  │   ├─ Resized         → Stage::resize │
//  │   ├─ ModifiersChanged → InputProcessor
//  │   ├─ KeyboardInput / MouseInput      │
//  │   │     ↓                            │
//  │   │  Stage::handle_input             │
//  │   ├─ RedrawRequested → Stage::frame  │
//  │   │                    request_redraw│
//  │   └─ CloseRequested  → Stage::shutdown
//  └──────────────────────────────────────┘
//
//  Frame Boundary: RedrawRequested
// ```
//
// Key Design Decisions:
// - **Single thread**: The stage is tick-driven; winit owns the only loop
// - **Sticky modifiers**: Modifier state persists until changed
// - **Lazy window**: Created in `resumed()` for mobile compatibility
//
//=========================================================================

//=== Submodules ==========================================================

mod input_processor;

//=== External Crates =====================================================

use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

//=== Internal Imports ====================================================

use crate::core::bridge::Backend;
use crate::core::error::TransitionError;
use crate::core::scene::{AppState, TransitionOutcome};
use crate::stage::Stage;
use input_processor::InputProcessor;

//=== PlatformError =======================================================

/// Event loop errors. Fatal: without an event loop the stage cannot run.
#[derive(Debug)]
pub enum PlatformError {
    /// Failed to create event loop (rare, indicates OS-level issue).
    EventLoopCreation(winit::error::EventLoopError),

    /// Event loop execution error.
    EventLoopExecution(winit::error::EventLoopError),
}

//--- Trait Implementations -----------------------------------------------

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EventLoopCreation(e) => write!(f, "Event loop creation failed: {}", e),
            Self::EventLoopExecution(e) => write!(f, "Event loop error: {}", e),
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EventLoopCreation(e) | Self::EventLoopExecution(e) => Some(e),
        }
    }
}

//=== Platform ============================================================

/// Window owner and frame driver for a [`Stage`].
///
/// # Lifecycle
///
/// 1. **Construction**: `Platform::new(stage)`
/// 2. **Execution**: `platform.run()` blocks in the winit event loop
/// 3. **Boot**: first `resumed()` creates the window and boots the stage
/// 4. **Shutdown**: window close disposes every scene and exits the loop
pub struct Platform<B: Backend> {
    /// OS window handle (None until `resumed()` called).
    window: Option<Window>,

    stage: Stage<B>,

    /// Converts winit events to stage InputEvents.
    input_processor: InputProcessor,

    title: String,
}

impl<B: Backend> Platform<B> {
    //--- Construction -----------------------------------------------------

    /// Wraps `stage`. The window is created lazily in `resumed()`.
    pub fn new(stage: Stage<B>) -> Self {
        info!(target: "platform", "Platform subsystem initialized");
        Self {
            window: None,
            stage,
            input_processor: InputProcessor::new(),
            title: "Stagehand".to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn stage(&self) -> &Stage<B> {
        &self.stage
    }

    //--- Execution --------------------------------------------------------

    /// Runs the event loop until the window is closed.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the event loop cannot be created or
    /// fails while running.
    ///
    /// # Panics
    ///
    /// Panics if called off the main thread (macOS/iOS winit requirement).
    pub fn run(mut self) -> Result<(), PlatformError> {
        debug!(target: "platform", "Starting winit event loop");

        let event_loop = EventLoop::new().map_err(PlatformError::EventLoopCreation)?;

        event_loop
            .run_app(&mut self)
            .map_err(PlatformError::EventLoopExecution)
    }

    //--- Internal Helpers -------------------------------------------------

    /// Runs one stage frame and logs what it produced.
    ///
    /// A lost game pre-build is restarted right away so the cutscene's
    /// "Next" control keeps working.
    fn redraw(&mut self) {
        let report = self.stage.frame();

        match &report.outcome {
            Some(TransitionOutcome::Committed { to, .. }) => {
                if let Some(window) = &self.window {
                    window.set_title(&format!("{} ({:?})", self.title, to));
                }
            }
            Some(TransitionOutcome::Failed(error)) => {
                warn!(target: "platform", "Transition failed, staying put: {}", error);
                if matches!(error, TransitionError::LoadFailure { target: AppState::Game, .. }) {
                    self.restart_prebuild();
                }
            }
            Some(TransitionOutcome::PrebuildFailed(error)) => {
                warn!(target: "platform", "Game pre-build failed: {}", error);
                self.restart_prebuild();
            }
            None => {}
        }
    }

    fn restart_prebuild(&mut self) {
        match self.stage.restart_prebuild() {
            Ok(()) => info!(target: "platform", "Game pre-build restarted"),
            Err(e) => warn!(target: "platform", "Game pre-build not restarted: {}", e),
        }
    }

    /// Forwards a new surface size to the backend.
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!(target: "platform", "Ignoring zero-sized surface (minimized?)");
            return;
        }
        debug!(target: "platform", "Surface resized to {}x{}", width, height);
        self.stage.resize(width, height);
    }
}

//=== Winit Integration ===================================================

impl<B: Backend> ApplicationHandler for Platform<B> {
    /// Called when app becomes active (startup or mobile resume).
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Window already exists (mobile resume?)");
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(800, 600));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                info!(
                    target: "platform",
                    "Window created: {}x{} @ {}x DPI",
                    window.inner_size().width,
                    window.inner_size().height,
                    window.scale_factor()
                );
                window.request_redraw();
                self.window = Some(window);

                if let Err(e) = self.stage.boot() {
                    error!(target: "platform", "Boot failed: {}", e);
                    event_loop.exit();
                }
            }
            Err(e) => {
                error!(target: "platform", "Window creation failed: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                self.stage.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                self.resize(size.width, size.height);
            }

            WindowEvent::ModifiersChanged(state) => {
                trace!(target: "platform::input", "Modifiers changed: {:?}", state);
                self.input_processor.update_modifiers(state.state());
            }

            WindowEvent::CursorMoved { position, .. } => {
                let event = self
                    .input_processor
                    .process_mouse_move(position.x as f32, position.y as f32);
                self.stage.handle_input(&event);
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                match self.input_processor.process_key_event(key_event) {
                    Some(event) => self.stage.handle_input(&event),
                    None => trace!(target: "platform::input", "Unmapped key ignored"),
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let event = self.input_processor.process_mouse_button(*button, *state);
                self.stage.handle_input(&event);
            }

            WindowEvent::RedrawRequested => {
                self.redraw();

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessBackend, LoadKind};
    use crate::stage::StageBuilder;

    #[test]
    fn window_is_created_lazily() {
        let platform = Platform::new(StageBuilder::new().build(HeadlessBackend::manual()));

        assert!(platform.window.is_none());
        assert_eq!(platform.stage().state(), None);
    }

    #[test]
    fn redraw_drives_the_stage() {
        let mut platform = Platform::new(StageBuilder::new().build(HeadlessBackend::manual()));
        platform.stage.boot().unwrap();
        platform.stage.backend_mut().resolve_pending();

        platform.redraw();

        assert!(platform.stage().state().is_some());
        assert_eq!(platform.stage().backend().frames(), 1);
    }

    /// Boots a platform and brings it to the cutscene with the game
    /// pre-build still loading.
    fn platform_in_cutscene() -> Platform<HeadlessBackend> {
        let mut platform = Platform::new(StageBuilder::new().build(HeadlessBackend::manual()));
        platform.stage.boot().unwrap();
        platform.stage.backend_mut().resolve_pending();
        platform.redraw();
        platform.stage.request(AppState::Cutscene).unwrap();
        platform.stage.backend_mut().resolve_kind(LoadKind::SceneReady);
        platform.redraw();
        assert_eq!(platform.stage().state(), Some(AppState::Cutscene));
        platform
    }

    #[test]
    fn lost_prebuild_is_restarted() {
        let mut platform = platform_in_cutscene();

        platform.stage.backend_mut().fail_pending(LoadKind::Environment, "level missing");
        platform.redraw();

        assert!(platform.stage().machine().has_prebuild());
        assert_eq!(platform.stage().backend().pending_loads().len(), 2);
    }

    #[test]
    fn failed_game_entry_leaves_next_usable() {
        let mut platform = platform_in_cutscene();
        platform.stage.backend_mut().resolve_kind(LoadKind::Environment);
        platform.stage.backend_mut().resolve_kind(LoadKind::Character);
        platform.redraw();

        platform.stage.request(AppState::Game).unwrap();
        platform.redraw();
        platform.stage.backend_mut().fail_pending(LoadKind::SceneReady, "scene lost");
        platform.redraw();

        assert_eq!(platform.stage().state(), Some(AppState::Cutscene));
        assert!(platform.stage().machine().has_prebuild());

        platform.stage.backend_mut().resolve_pending();
        platform.redraw();
        assert!(platform.stage.backend_mut().press("Next"));
        platform.redraw();
        assert_eq!(platform.stage().machine().in_flight(), Some(AppState::Game));
    }

    #[test]
    fn resize_skips_empty_surfaces() {
        let mut platform = Platform::new(StageBuilder::new().build(HeadlessBackend::manual()));

        platform.resize(0, 600);
        assert_eq!(platform.stage().backend().surface_size(), None);

        platform.resize(1024, 768);
        assert_eq!(platform.stage().backend().surface_size(), Some((1024, 768)));
    }

    #[test]
    fn title_is_configurable() {
        let platform =
            Platform::new(StageBuilder::new().build(HeadlessBackend::manual())).with_title("Demo");
        assert_eq!(platform.title, "Demo");
    }

    #[test]
    fn platform_error_is_error_trait() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<PlatformError>();
    }
}

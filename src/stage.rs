//=========================================================================
// Stage
//
// Application facade: owns the backend, the state machine, the render
// loop and the debug overlay, and drives them one frame at a time.
//
// Architecture:
// ```text
//     StageBuilder  ──build(backend)──>  Stage  ──frame()──>  FrameReport
//         │                                │
//         ├─ with_spawn_point()            ├─ boot()         (enter Start)
//         ├─ with_rig()                    ├─ handle_input() (debug chord, UI)
//         ├─ with_control_capacity()       ├─ resize()       (surface size)
//         └─ with_input()                  └─ shutdown()
// ```
//
// Frame order: controls → transitions/pre-build → render → end_frame.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::Vec3;
use log::{info, warn};

//=== Internal Dependencies ===============================================

use crate::core::bridge::{Backend, SceneHandle};
use crate::core::camera_rig::RigSettings;
use crate::core::character::InputHandle;
use crate::core::config::StageConfig;
use crate::core::error::TransitionError;
use crate::core::input::{DebugOverlay, InputEvent};
use crate::core::render_loop::RenderLoop;
use crate::core::scene::{AppState, AppStateMachine, TransitionOutcome};

//=== StageBuilder ========================================================

/// Builder for configuring and constructing a [`Stage`].
///
/// # Default Values
///
/// - **Spawn point**: (0, 3, 0)
/// - **Rig**: distance 30, fov 0.47, zero tilt
/// - **Control capacity**: 32 presses
///
/// # Examples
///
/// ```
/// use stagehand::{HeadlessBackend, StageBuilder};
///
/// let mut stage = StageBuilder::new()
///     .with_control_capacity(8)
///     .build(HeadlessBackend::manual());
///
/// stage.boot().unwrap();
/// stage.backend_mut().resolve_pending();
/// stage.frame();
/// ```
#[derive(Debug, Clone, Default)]
pub struct StageBuilder {
    config: StageConfig,
}

impl StageBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets where the character appears when gameplay starts.
    ///
    /// # Panics
    ///
    /// Panics if any component is NaN or infinite.
    pub fn with_spawn_point(mut self, spawn_point: Vec3) -> Self {
        assert!(spawn_point.is_finite(), "Spawn point must be finite, got {}", spawn_point);
        self.config.spawn_point = spawn_point;
        self
    }

    /// Sets the gameplay camera rig.
    ///
    /// # Panics
    ///
    /// Panics if the distance is not positive or the field of view is not
    /// within (0, π).
    pub fn with_rig(mut self, rig: RigSettings) -> Self {
        assert!(rig.distance > 0.0, "Rig distance must be positive, got {}", rig.distance);
        assert!(
            rig.fov > 0.0 && rig.fov < std::f32::consts::PI,
            "Rig fov must be within (0, π), got {}",
            rig.fov
        );
        assert!(rig.tilt.is_finite(), "Rig tilt must be finite, got {}", rig.tilt);
        self.config.rig = rig;
        self
    }

    /// Sets how many UI presses can queue between frames.
    ///
    /// Presses beyond this are dropped with a warning.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_control_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Control capacity must be positive");
        self.config.control_capacity = capacity;
        self
    }

    /// Hands the input collaborator's handle to every game character.
    pub fn with_input(mut self, input: InputHandle) -> Self {
        self.config.input = Some(input);
        self
    }

    /// Builds the stage around `backend`. Nothing is shown until
    /// [`Stage::boot`].
    pub fn build<B: Backend>(self, backend: B) -> Stage<B> {
        info!(
            target: "stage",
            "Building stage (spawn: {}, rig distance: {}, controls: {})",
            self.config.spawn_point,
            self.config.rig.distance,
            self.config.control_capacity
        );

        Stage {
            backend,
            machine: AppStateMachine::new(self.config),
            render_loop: RenderLoop::new(),
            debug_overlay: DebugOverlay::new(),
        }
    }
}

//=== FrameReport =========================================================

/// What happened during one [`Stage::frame`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameReport {
    /// Transition or pre-build result that finished this frame.
    pub outcome: Option<TransitionOutcome>,

    /// Control presses that were turned down.
    pub rejected: Vec<TransitionError>,

    /// Scene that was rendered, if any.
    pub rendered: Option<SceneHandle>,
}

//=== Stage ===============================================================

/// The running application.
///
/// Create via [`StageBuilder`]; call [`Stage::frame`] once per display
/// refresh.
#[derive(Debug)]
pub struct Stage<B: Backend> {
    backend: B,
    machine: AppStateMachine,
    render_loop: RenderLoop,
    debug_overlay: DebugOverlay,
}

impl<B: Backend> Stage<B> {
    //--- Lifecycle --------------------------------------------------------

    /// Requests the Start screen.
    pub fn boot(&mut self) -> Result<(), TransitionError> {
        info!(target: "stage", "Booting");
        self.machine.enter_start(&mut self.backend)
    }

    /// Runs one frame.
    pub fn frame(&mut self) -> FrameReport {
        let rejected = self.machine.dispatch_controls(&mut self.backend);
        for error in &rejected {
            warn!(target: "stage", "Control ignored: {}", error);
        }

        let outcome = self.machine.poll(&mut self.backend);
        let rendered = self.render_loop.frame(&self.machine, &mut self.backend);
        self.backend.end_frame();

        FrameReport {
            outcome,
            rejected,
            rendered,
        }
    }

    /// Routes a keyboard or mouse event.
    ///
    /// The debug chord is consumed; everything else goes to the UI.
    pub fn handle_input(&mut self, event: &InputEvent) {
        if self.debug_overlay.handle_event(event, &mut self.backend) {
            return;
        }
        self.backend.handle_input(event);
    }

    /// Passes a new output size to the backend.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
    }

    /// Disposes every scene the stage holds.
    pub fn shutdown(&mut self) {
        self.machine.shutdown(&mut self.backend);
    }

    //--- Transitions ------------------------------------------------------

    /// Requests a transition outside of the UI controls.
    pub fn request(&mut self, target: AppState) -> Result<(), TransitionError> {
        self.machine.request(target, &mut self.backend)
    }

    /// See [`AppStateMachine::restart_prebuild`].
    pub fn restart_prebuild(&mut self) -> Result<(), TransitionError> {
        self.machine.restart_prebuild(&mut self.backend)
    }

    //--- Accessors --------------------------------------------------------

    pub fn state(&self) -> Option<AppState> {
        self.machine.state()
    }

    pub fn machine(&self) -> &AppStateMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut AppStateMachine {
        &mut self.machine
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn debug_overlay(&self) -> &DebugOverlay {
        &self.debug_overlay
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{KeyCode, Modifiers};
    use crate::headless::HeadlessBackend;

    //=====================================================================
    // StageBuilder Tests
    //=====================================================================

    #[test]
    fn builder_defaults() {
        let builder = StageBuilder::new();
        assert_eq!(builder.config.spawn_point, Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(builder.config.rig, RigSettings::default());
        assert_eq!(builder.config.control_capacity, 32);
        assert!(builder.config.input.is_none());
    }

    #[test]
    fn builder_with_spawn_point() {
        let builder = StageBuilder::new().with_spawn_point(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(builder.config.spawn_point, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    #[should_panic(expected = "Spawn point must be finite")]
    fn builder_with_spawn_point_panics_on_nan() {
        StageBuilder::new().with_spawn_point(Vec3::new(f32::NAN, 0.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "Rig distance must be positive")]
    fn builder_with_rig_panics_on_zero_distance() {
        StageBuilder::new().with_rig(RigSettings {
            distance: 0.0,
            ..RigSettings::default()
        });
    }

    #[test]
    #[should_panic(expected = "Rig fov must be within")]
    fn builder_with_rig_panics_on_negative_fov() {
        StageBuilder::new().with_rig(RigSettings {
            fov: -0.1,
            ..RigSettings::default()
        });
    }

    #[test]
    #[should_panic(expected = "Control capacity must be positive")]
    fn builder_with_control_capacity_panics_on_zero() {
        StageBuilder::new().with_control_capacity(0);
    }

    #[test]
    fn builder_chaining() {
        let builder = StageBuilder::new()
            .with_control_capacity(4)
            .with_input(InputHandle::new(()))
            .with_rig(RigSettings {
                distance: 12.0,
                ..RigSettings::default()
            });

        assert_eq!(builder.config.control_capacity, 4);
        assert_eq!(builder.config.rig.distance, 12.0);
        assert!(builder.config.input.is_some());
    }

    //=====================================================================
    // Stage Tests
    //=====================================================================

    #[test]
    fn resize_reaches_backend() {
        let mut stage = StageBuilder::new().build(HeadlessBackend::manual());

        stage.resize(1280, 720);

        assert_eq!(stage.backend().surface_size(), Some((1280, 720)));
    }

    #[test]
    fn built_stage_is_not_booted() {
        let stage = StageBuilder::new().build(HeadlessBackend::manual());
        assert_eq!(stage.state(), None);
        assert!(stage.backend().live_scenes().is_empty());
    }

    #[test]
    fn boot_then_frame_shows_start() {
        let mut stage = StageBuilder::new().build(HeadlessBackend::manual());

        stage.boot().unwrap();
        stage.backend_mut().resolve_pending();
        let report = stage.frame();

        assert!(matches!(
            report.outcome,
            Some(TransitionOutcome::Committed {
                from: None,
                to: AppState::Start,
                ..
            })
        ));
        assert_eq!(report.rendered, stage.machine().current().map(|c| c.scene()));
        assert_eq!(stage.render_loop().rendered(), 1);
    }

    #[test]
    fn debug_chord_is_consumed() {
        let mut stage = StageBuilder::new().build(HeadlessBackend::manual());

        stage.handle_input(&InputEvent::KeyDown {
            key: KeyCode::KeyI,
            modifiers: Modifiers::ALL,
        });

        assert!(stage.debug_overlay().is_visible());
        assert!(stage.backend().debug_layer_visible());
    }

    #[test]
    fn rejected_presses_are_reported() {
        let mut stage = StageBuilder::new().build(HeadlessBackend::manual());
        stage.boot().unwrap();
        stage.backend_mut().resolve_pending();
        stage.frame();

        // Two presses in one frame: the second hits the in-flight guard.
        stage.backend_mut().press("Play");
        stage.backend_mut().press("Play");
        let report = stage.frame();

        assert_eq!(
            report.rejected,
            vec![TransitionError::DoubleTransition {
                requested: AppState::Cutscene,
                in_flight: AppState::Cutscene,
            }]
        );
    }
}

//=========================================================================
// App State Machine
//=========================================================================
//
// Owns the live scene context and drives transitions between states.
//
// Transitions are requested with `enter_*` (or `request`) and advanced by
// `poll`, once per frame. At most one transition is in flight; a second
// request while one is loading is rejected.
//
// Commit order (all inside one `poll`):
//   1. hide loading curtain
//   2. detach old context
//   3. swap current context, set state
//   4. attach new context
//   5. dispose old context
//
// A failed transition disposes what it built, hides the curtain and
// leaves the current context and state untouched.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, error, info, warn};

//=== Internal Dependencies ===============================================

use super::context::SceneContext;
use super::factory::SceneFactory;
use super::prebuild::GamePrebuild;
use super::transition::{PendingTransition, Progress};
use super::AppState;
use crate::core::bridge::{Backend, ContextId, ControlEvent};
use crate::core::config::StageConfig;
use crate::core::error::{LoadError, TransitionError};

//=== TransitionOutcome ===================================================

/// Something `poll` finished this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// A transition committed; `context` is now live.
    Committed {
        from: Option<AppState>,
        to: AppState,
        context: ContextId,
    },

    /// A transition failed; the previous context is still current.
    Failed(TransitionError),

    /// The background game pre-build failed and was dropped.
    PrebuildFailed(LoadError),
}

//=== AppStateMachine =====================================================

/// The application's current state and scene context.
#[derive(Debug)]
pub struct AppStateMachine {
    state: Option<AppState>,
    current: Option<SceneContext>,
    in_flight: Option<PendingTransition>,
    prebuild: Option<GamePrebuild>,
    factory: SceneFactory,
    commits: u64,
}

impl AppStateMachine {
    pub fn new(config: StageConfig) -> Self {
        Self {
            state: None,
            current: None,
            in_flight: None,
            prebuild: None,
            factory: SceneFactory::new(config),
            commits: 0,
        }
    }

    //--- Accessors --------------------------------------------------------

    /// Current state; `None` until the first transition commits.
    pub fn state(&self) -> Option<AppState> {
        self.state
    }

    pub fn current(&self) -> Option<&SceneContext> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut SceneContext> {
        self.current.as_mut()
    }

    /// Target of the transition being loaded, if any.
    pub fn in_flight(&self) -> Option<AppState> {
        self.in_flight.as_ref().map(PendingTransition::target)
    }

    pub fn is_transitioning(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True while a game pre-build is held, finished or not.
    pub fn has_prebuild(&self) -> bool {
        self.prebuild.is_some()
    }

    /// True once the held pre-build has finished loading.
    pub fn game_ready(&self) -> bool {
        self.prebuild.as_ref().is_some_and(GamePrebuild::is_finished)
    }

    /// Number of transitions committed so far.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn config(&self) -> &StageConfig {
        self.factory.config()
    }

    //--- Transition Requests ----------------------------------------------

    pub fn enter_start<B>(&mut self, backend: &mut B) -> Result<(), TransitionError>
    where
        B: Backend + ?Sized,
    {
        self.request(AppState::Start, backend)
    }

    pub fn enter_cutscene<B>(&mut self, backend: &mut B) -> Result<(), TransitionError>
    where
        B: Backend + ?Sized,
    {
        self.request(AppState::Cutscene, backend)
    }

    /// Requires the pre-build started on cutscene entry.
    pub fn enter_game<B>(&mut self, backend: &mut B) -> Result<(), TransitionError>
    where
        B: Backend + ?Sized,
    {
        self.request(AppState::Game, backend)
    }

    pub fn enter_lose<B>(&mut self, backend: &mut B) -> Result<(), TransitionError>
    where
        B: Backend + ?Sized,
    {
        self.request(AppState::Lose, backend)
    }

    /// Starts a transition to `target`.
    ///
    /// Shows the loading curtain and begins building the new context. The
    /// transition completes in a later [`poll`](Self::poll).
    pub fn request<B>(&mut self, target: AppState, backend: &mut B) -> Result<(), TransitionError>
    where
        B: Backend + ?Sized,
    {
        if let Some(in_flight) = self.in_flight() {
            warn!(
                target: "stage::transition",
                "Rejected {:?}: transition to {:?} still loading",
                target,
                in_flight
            );
            return Err(TransitionError::DoubleTransition {
                requested: target,
                in_flight,
            });
        }

        if !AppState::permits(self.state, target) {
            warn!(target: "stage::transition", "Rejected {:?} from {:?}", target, self.state);
            return Err(TransitionError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }

        let prebuild = match target {
            AppState::Game => Some(self.prebuild.take().ok_or_else(|| {
                warn!(target: "stage::transition", "Rejected Game: no pre-build held");
                TransitionError::MissingPrebuild
            })?),
            _ => None,
        };

        info!(target: "stage::transition", "Transition {:?} -> {:?} started", self.state, target);
        backend.show_loading_curtain();

        let spawn_point = self.factory.config().spawn_point;
        let pending = match prebuild {
            Some(prebuild) => PendingTransition::awaiting_prebuild(spawn_point, prebuild),
            None => {
                let (context, ready) = self.factory.build_screen(target, backend);
                PendingTransition::awaiting_ready(target, spawn_point, context, ready)
            }
        };

        self.in_flight = Some(pending);
        Ok(())
    }

    /// Starts a fresh game pre-build after the previous one failed.
    ///
    /// Only valid on the cutscene. Does nothing if a pre-build is held.
    pub fn restart_prebuild<B>(&mut self, backend: &mut B) -> Result<(), TransitionError>
    where
        B: Backend + ?Sized,
    {
        if let Some(in_flight) = self.in_flight() {
            return Err(TransitionError::DoubleTransition {
                requested: AppState::Game,
                in_flight,
            });
        }
        if self.state != Some(AppState::Cutscene) {
            return Err(TransitionError::InvalidTransition {
                from: self.state,
                to: AppState::Game,
            });
        }
        if self.prebuild.is_none() {
            info!(target: "stage::transition", "Restarting game pre-build");
            self.prebuild = Some(self.factory.start_prebuild(backend));
        }
        Ok(())
    }

    //--- Controls ---------------------------------------------------------

    /// Turns this frame's UI presses into transition requests.
    ///
    /// Presses from contexts other than the current one are dropped.
    /// Returns the requests that were rejected.
    pub fn dispatch_controls<B>(&mut self, backend: &mut B) -> Vec<TransitionError>
    where
        B: Backend + ?Sized,
    {
        let mut rejected = Vec::new();
        for event in self.factory.collect_controls() {
            if let Err(error) = self.handle_control(event, backend) {
                rejected.push(error);
            }
        }
        rejected
    }

    fn handle_control<B>(&mut self, event: ControlEvent, backend: &mut B) -> Result<(), TransitionError>
    where
        B: Backend + ?Sized,
    {
        let current = self.current.as_ref().map(SceneContext::id);
        if current != Some(event.context) {
            debug!(
                target: "stage::control",
                "Dropped {:?} press from stale context {:?}",
                event.control,
                event.context
            );
            return Ok(());
        }

        debug!(target: "stage::control", "{:?} pressed", event.control);
        self.request(event.control.target(), backend)
    }

    //--- Polling ----------------------------------------------------------

    /// Advances the background pre-build and the in-flight transition.
    ///
    /// Returns what finished this frame. A pre-build failure is reported
    /// before the transition is polled; the transition waits a frame.
    pub fn poll<B>(&mut self, backend: &mut B) -> Option<TransitionOutcome>
    where
        B: Backend + ?Sized,
    {
        if let Some(outcome) = self.poll_prebuild(backend) {
            return Some(outcome);
        }

        let pending = self.in_flight.take()?;
        let target = pending.target();

        match pending.advance(backend, &mut self.factory) {
            Progress::Waiting(pending) => {
                self.in_flight = Some(pending);
                None
            }
            Progress::Ready(context) => Some(self.commit(target, context, backend)),
            Progress::Failed(source) => {
                backend.hide_loading_curtain();
                error!(target: "stage::transition", "Transition to {:?} failed: {}", target, source);
                Some(TransitionOutcome::Failed(TransitionError::LoadFailure {
                    target,
                    source,
                }))
            }
        }
    }

    fn poll_prebuild<B>(&mut self, backend: &mut B) -> Option<TransitionOutcome>
    where
        B: Backend + ?Sized,
    {
        let prebuild = self.prebuild.as_mut()?;
        let was_finished = prebuild.is_finished();

        match prebuild.poll() {
            Ok(true) if !was_finished => {
                info!(target: "stage::transition", "Game scene {:?} pre-built", prebuild.scene());
                None
            }
            Ok(_) => None,
            Err(error) => {
                if let Some(prebuild) = self.prebuild.take() {
                    prebuild.discard(backend);
                }
                error!(target: "stage::transition", "Game pre-build failed: {}", error);
                Some(TransitionOutcome::PrebuildFailed(error))
            }
        }
    }

    fn commit<B>(&mut self, target: AppState, mut next: SceneContext, backend: &mut B) -> TransitionOutcome
    where
        B: Backend + ?Sized,
    {
        backend.hide_loading_curtain();

        let mut previous = self.current.take();
        if let Some(previous) = previous.as_mut() {
            previous.detach(backend);
        }

        let id = next.id();
        let from = self.state.replace(target);
        next.attach(backend);
        self.current = Some(next);

        if let Some(previous) = previous {
            previous.dispose(backend);
        }
        self.commits += 1;

        if target == AppState::Cutscene {
            self.prebuild = Some(self.factory.start_prebuild(backend));
        }

        info!(target: "stage::transition", "Transition {:?} -> {:?} committed as {:?}", from, target, id);

        TransitionOutcome::Committed {
            from,
            to: target,
            context: id,
        }
    }

    //--- Shutdown ---------------------------------------------------------

    /// Disposes every context and load the machine holds.
    pub fn shutdown<B>(&mut self, backend: &mut B)
    where
        B: Backend + ?Sized,
    {
        if let Some(pending) = self.in_flight.take() {
            pending.abandon(backend);
            backend.hide_loading_curtain();
        }
        if let Some(prebuild) = self.prebuild.take() {
            prebuild.discard(backend);
        }
        if let Some(current) = self.current.take() {
            current.dispose(backend);
        }
        self.state = None;

        info!(target: "stage", "State machine shut down after {} transitions", self.commits);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bridge::SceneHandle;
    use crate::headless::{BackendCall, HeadlessBackend, LoadKind};

    fn booted() -> (AppStateMachine, HeadlessBackend) {
        let mut backend = HeadlessBackend::manual();
        let mut machine = AppStateMachine::new(StageConfig::default());
        machine.enter_start(&mut backend).unwrap();
        backend.resolve_pending();
        assert!(matches!(machine.poll(&mut backend), Some(TransitionOutcome::Committed { .. })));
        (machine, backend)
    }

    fn in_cutscene() -> (AppStateMachine, HeadlessBackend) {
        let (mut machine, mut backend) = booted();
        machine.enter_cutscene(&mut backend).unwrap();
        backend.resolve_kind(LoadKind::SceneReady);
        assert!(matches!(machine.poll(&mut backend), Some(TransitionOutcome::Committed { .. })));
        (machine, backend)
    }

    #[test]
    fn boot_commits_start() {
        let (machine, backend) = booted();

        assert_eq!(machine.state(), Some(AppState::Start));
        let current = machine.current().unwrap();
        assert!(current.is_live());
        assert_eq!(backend.attached_scenes(), vec![current.scene()]);
        assert!(!backend.curtain_visible());
    }

    #[test]
    fn state_is_unchanged_until_ready() {
        let (mut machine, mut backend) = booted();

        machine.enter_cutscene(&mut backend).unwrap();
        assert!(backend.curtain_visible());
        assert_eq!(machine.poll(&mut backend), None);
        assert_eq!(machine.state(), Some(AppState::Start));
        assert_eq!(machine.in_flight(), Some(AppState::Cutscene));
    }

    #[test]
    fn commit_detaches_before_attaching_and_disposes_last() {
        let (mut machine, mut backend) = booted();
        let old = machine.current().unwrap().scene();

        machine.enter_cutscene(&mut backend).unwrap();
        backend.resolve_kind(LoadKind::SceneReady);
        backend.clear_journal();
        machine.poll(&mut backend);
        let new = machine.current().unwrap().scene();

        let journal = backend.journal();
        let position = |call: &BackendCall| journal.iter().position(|c| c == call).unwrap();
        let hide = position(&BackendCall::HideCurtain);
        let detach = position(&BackendCall::DetachCamera(old));
        let attach = position(&BackendCall::AttachCamera(new));
        let dispose = position(&BackendCall::DisposeScene(old));

        assert!(hide < detach);
        assert!(detach < attach);
        assert!(attach < dispose);
    }

    #[test]
    fn cutscene_entry_starts_prebuild() {
        let (mut machine, mut backend) = in_cutscene();

        assert!(machine.has_prebuild());
        assert!(!machine.game_ready());

        backend.resolve_kind(LoadKind::Environment);
        backend.resolve_kind(LoadKind::Character);
        assert_eq!(machine.poll(&mut backend), None);
        assert!(machine.game_ready());
    }

    #[test]
    fn double_request_is_rejected() {
        let (mut machine, mut backend) = booted();

        machine.enter_cutscene(&mut backend).unwrap();
        let second = machine.enter_cutscene(&mut backend);

        assert_eq!(
            second,
            Err(TransitionError::DoubleTransition {
                requested: AppState::Cutscene,
                in_flight: AppState::Cutscene,
            })
        );
    }

    #[test]
    fn invalid_edge_is_rejected_without_side_effects() {
        let (mut machine, mut backend) = booted();
        backend.clear_journal();

        let result = machine.enter_lose(&mut backend);

        assert_eq!(
            result,
            Err(TransitionError::InvalidTransition {
                from: Some(AppState::Start),
                to: AppState::Lose,
            })
        );
        assert!(backend.journal().is_empty());
        assert!(!machine.is_transitioning());
    }

    #[test]
    fn failed_transition_keeps_previous_context() {
        let (mut machine, mut backend) = booted();
        let start = machine.current().unwrap().id();

        machine.enter_cutscene(&mut backend).unwrap();
        backend.fail_pending(LoadKind::SceneReady, "shader compile");

        assert!(matches!(
            machine.poll(&mut backend),
            Some(TransitionOutcome::Failed(TransitionError::LoadFailure {
                target: AppState::Cutscene,
                ..
            }))
        ));
        assert_eq!(machine.state(), Some(AppState::Start));
        assert_eq!(machine.current().unwrap().id(), start);
        assert!(machine.current().unwrap().is_live());
        assert!(!backend.curtain_visible());
        assert_eq!(backend.live_scenes().len(), 1);

        assert!(machine.enter_cutscene(&mut backend).is_ok());
    }

    /// Checks that a failed Game entry left the cutscene in charge and
    /// released the game scene.
    fn assert_cutscene_survived(
        machine: &AppStateMachine,
        backend: &HeadlessBackend,
        cutscene: SceneHandle,
        game_scene: SceneHandle,
    ) {
        assert_eq!(machine.state(), Some(AppState::Cutscene));
        assert_eq!(machine.current().map(SceneContext::scene), Some(cutscene));
        assert!(machine.current().unwrap().is_live());
        assert!(!machine.is_transitioning());
        assert!(!backend.curtain_visible());
        assert!(backend.is_scene_alive(cutscene));
        assert!(!backend.journal().contains(&BackendCall::DisposeScene(cutscene)));
        assert!(!backend.is_scene_alive(game_scene));
        assert_eq!(backend.live_scenes(), vec![cutscene]);
        assert_eq!(backend.attached_scenes(), vec![cutscene]);
        assert!(backend.violations().is_empty(), "{:?}", backend.violations());
    }

    #[test]
    fn game_scene_rejection_keeps_cutscene() {
        let (mut machine, mut backend) = in_cutscene();
        let cutscene = machine.current().unwrap().scene();
        let game_scene = machine.prebuild.as_ref().unwrap().scene();

        backend.resolve_kind(LoadKind::Environment);
        backend.resolve_kind(LoadKind::Character);
        assert_eq!(machine.poll(&mut backend), None);
        machine.enter_game(&mut backend).unwrap();
        assert_eq!(machine.poll(&mut backend), None);
        assert_eq!(machine.in_flight(), Some(AppState::Game));

        assert!(backend.fail_pending(LoadKind::SceneReady, "scene lost"));

        assert!(matches!(
            machine.poll(&mut backend),
            Some(TransitionOutcome::Failed(TransitionError::LoadFailure {
                target: AppState::Game,
                ..
            }))
        ));
        assert_cutscene_survived(&machine, &backend, cutscene, game_scene);
        assert!(!machine.has_prebuild());
    }

    #[test]
    fn prebuild_failure_under_waiting_game_keeps_cutscene() {
        let (mut machine, mut backend) = in_cutscene();
        let cutscene = machine.current().unwrap().scene();
        let game_scene = machine.prebuild.as_ref().unwrap().scene();

        machine.enter_game(&mut backend).unwrap();
        assert_eq!(machine.poll(&mut backend), None);
        assert!(!machine.has_prebuild());

        assert!(backend.fail_pending(LoadKind::Character, "corrupt mesh"));

        assert!(matches!(
            machine.poll(&mut backend),
            Some(TransitionOutcome::Failed(TransitionError::LoadFailure {
                target: AppState::Game,
                ..
            }))
        ));
        assert_cutscene_survived(&machine, &backend, cutscene, game_scene);
        assert_eq!(machine.enter_game(&mut backend), Err(TransitionError::MissingPrebuild));
    }

    #[test]
    fn failed_prebuild_blocks_game_until_restarted() {
        let (mut machine, mut backend) = in_cutscene();

        backend.fail_pending(LoadKind::Environment, "level missing");
        assert!(matches!(
            machine.poll(&mut backend),
            Some(TransitionOutcome::PrebuildFailed(_))
        ));
        assert_eq!(machine.enter_game(&mut backend), Err(TransitionError::MissingPrebuild));

        machine.restart_prebuild(&mut backend).unwrap();
        assert!(machine.enter_game(&mut backend).is_ok());
    }

    #[test]
    fn restart_prebuild_outside_cutscene_is_rejected() {
        let (mut machine, mut backend) = booted();

        assert!(matches!(
            machine.restart_prebuild(&mut backend),
            Err(TransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn stale_control_is_dropped() {
        let (mut machine, mut backend) = booted();

        machine.enter_cutscene(&mut backend).unwrap();
        assert!(backend.press("Play"));
        backend.resolve_kind(LoadKind::SceneReady);
        machine.poll(&mut backend);

        // The press was queued by the Start screen, which is gone now.
        assert!(machine.dispatch_controls(&mut backend).is_empty());
        assert!(!machine.is_transitioning());
        assert_eq!(machine.state(), Some(AppState::Cutscene));
    }

    #[test]
    fn control_press_requests_transition() {
        let (mut machine, mut backend) = booted();

        assert!(backend.press("Play"));
        assert!(machine.dispatch_controls(&mut backend).is_empty());

        assert_eq!(machine.in_flight(), Some(AppState::Cutscene));
    }

    #[test]
    fn shutdown_releases_everything() {
        let (mut machine, mut backend) = in_cutscene();
        machine.enter_game(&mut backend).unwrap();

        machine.shutdown(&mut backend);

        assert!(backend.live_scenes().is_empty());
        assert!(machine.current().is_none());
        assert!(!backend.curtain_visible());
    }
}

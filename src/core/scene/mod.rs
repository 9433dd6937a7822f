//=========================================================================
// Scene System
//=========================================================================
//
// Application states, the scene contexts that back them, and the state
// machine that swaps contexts.
//
// Architecture:
//   AppStateMachine
//     ├─ current: Option<SceneContext>      (the only live context)
//     ├─ in_flight: Option<PendingTransition>
//     ├─ prebuild: Option<GamePrebuild>     (Cutscene only)
//     └─ factory: SceneFactory              (builds new contexts)
//
// Flow (per frame):
//   controls → request() → poll() → commit: detach → swap → attach → dispose
//
//=========================================================================

//=== Module Declarations =================================================

mod context;
mod factory;
mod prebuild;
mod state_machine;
mod transition;

//=== Public API ==========================================================

pub use context::{ContextPhase, SceneContext};
pub use state_machine::{AppStateMachine, TransitionOutcome};

//=== AppState ============================================================

/// Top-level application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    /// Title screen with a "Play" control.
    Start,

    /// Story screen with a "Next" control; the game scene loads behind it.
    Cutscene,

    /// Gameplay with the character and follow camera.
    Game,

    /// Loss screen with a "Main Menu" control.
    Lose,
}

impl AppState {
    pub const ALL: [AppState; 4] = [Self::Start, Self::Cutscene, Self::Game, Self::Lose];

    /// Returns true if `to` may be entered from `from` (`None` = boot).
    ///
    /// Edges are directed: `Lose → Start` exists, `Start → Lose` does not.
    pub fn permits(from: Option<AppState>, to: AppState) -> bool {
        matches!(
            (from, to),
            (None, Self::Start)
                | (Some(Self::Lose), Self::Start)
                | (Some(Self::Start), Self::Cutscene)
                | (Some(Self::Cutscene), Self::Game)
                | (Some(Self::Game), Self::Lose)
        )
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

//=========================================================================
// Control Channel
//=========================================================================
//
// Carries UI button presses from the UI backend to the state machine.
//
// Architecture:
//   UiBackend ── ControlSink::press() ──> channel ──> ControlCollector
//                                                        ↓
//                                         AppStateMachine (per frame)
//
// Every press is stamped with the id of the context that created the
// button, so presses from a context that has since been replaced can be
// recognised and dropped.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use log::{trace, warn};

//=== Internal Dependencies ===============================================

use crate::core::scene::AppState;

//=== ContextId ===========================================================

/// Identity of one scene context. Never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub(crate) u64);

impl ContextId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

//=== Control =============================================================

/// The UI controls the application offers, one per screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Start screen: begin the cutscene.
    Play,

    /// Cutscene: advance into gameplay.
    Next,

    /// Gameplay: give up and show the loss screen.
    Lose,

    /// Loss screen: return to the start screen.
    MainMenu,
}

impl Control {
    /// Button caption.
    pub fn label(self) -> &'static str {
        match self {
            Self::Play => "Play",
            Self::Next => "Next",
            Self::Lose => "Lose",
            Self::MainMenu => "Main Menu",
        }
    }

    /// The control shown on the screen of `state`.
    pub fn offered_in(state: AppState) -> Self {
        match state {
            AppState::Start => Self::Play,
            AppState::Cutscene => Self::Next,
            AppState::Game => Self::Lose,
            AppState::Lose => Self::MainMenu,
        }
    }

    /// State the control transitions to.
    pub fn target(self) -> AppState {
        match self {
            Self::Play => AppState::Cutscene,
            Self::Next => AppState::Game,
            Self::Lose => AppState::Lose,
            Self::MainMenu => AppState::Start,
        }
    }
}

//=== ControlEvent ========================================================

/// A press of `control` on a button owned by context `context`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub context: ContextId,
    pub control: Control,
}

//=== ControlSink =========================================================

/// Handed to the UI backend with each button subscription.
///
/// The backend calls [`ControlSink::press`] whenever the button fires.
#[derive(Debug, Clone)]
pub struct ControlSink {
    sender: Sender<ControlEvent>,
    event: ControlEvent,
}

impl ControlSink {
    pub(crate) fn new(sender: Sender<ControlEvent>, context: ContextId, control: Control) -> Self {
        Self {
            sender,
            event: ControlEvent { context, control },
        }
    }

    pub fn control(&self) -> Control {
        self.event.control
    }

    pub fn context(&self) -> ContextId {
        self.event.context
    }

    /// Queues a press. Returns false if it had to be dropped.
    pub fn press(&self) -> bool {
        match self.sender.try_send(self.event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(target: "stage::control", "Control queue full, dropping {:?} press", self.event.control);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                trace!(target: "stage::control", "Control channel closed, ignoring {:?} press", self.event.control);
                false
            }
        }
    }
}

//=== ControlCollector ====================================================

/// Owns the receiving end of the control channel.
#[derive(Debug)]
pub(crate) struct ControlCollector {
    sender: Sender<ControlEvent>,
    receiver: Receiver<ControlEvent>,
    pending: Vec<ControlEvent>,
}

impl ControlCollector {
    /// Presses drained per frame before the rest wait for the next one.
    const MAX_PRESSES_PER_FRAME: usize = 16;

    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            pending: Vec::with_capacity(4),
        }
    }

    pub(crate) fn sink(&self, context: ContextId, control: Control) -> ControlSink {
        ControlSink::new(self.sender.clone(), context, control)
    }

    /// Drains queued presses for this frame (bounded to prevent starvation).
    pub(crate) fn collect_frame(&mut self) -> Vec<ControlEvent> {
        self.pending.clear();

        while self.pending.len() < Self::MAX_PRESSES_PER_FRAME {
            match self.receiver.try_recv() {
                Ok(event) => self.pending.push(event),
                // The collector holds a sender, so the channel never disconnects.
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if self.pending.len() >= Self::MAX_PRESSES_PER_FRAME {
            warn!(target: "stage::control", "Control backlog: drained {} presses this frame", self.pending.len());
        }

        std::mem::take(&mut self.pending)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

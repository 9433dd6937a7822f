//=========================================================================
// Error Types
//=========================================================================
//
// Failure taxonomy for loads, transitions and the scene graph.
//
// Every error is local to the operation that produced it. None of them
// stop the render loop; the last committed context keeps rendering.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::graph::NodeId;
use crate::core::scene::AppState;

//=== LoadError ===========================================================

/// An awaited load or ready signal rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The collaborator reported a failure.
    #[error("{what} failed to load: {reason}")]
    Failed { what: &'static str, reason: String },

    /// The resolver was dropped without ever resolving.
    #[error("{what} was abandoned before it resolved")]
    Abandoned { what: &'static str },
}

//=== TransitionError =====================================================

/// Why a transition request or an in-flight transition failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// A load awaited by the transition rejected. Nothing was committed.
    #[error("entering {target:?} failed: {source}")]
    LoadFailure {
        target: AppState,
        #[source]
        source: LoadError,
    },

    /// The requested edge does not exist in the state graph.
    #[error("cannot enter {to:?} from {}", describe(.from))]
    InvalidTransition { from: Option<AppState>, to: AppState },

    /// `Game` was requested but no pre-build is held.
    #[error("cannot enter Game: no pre-built game scene is available")]
    MissingPrebuild,

    /// Another transition is still in flight.
    #[error("transition to {requested:?} rejected: transition to {in_flight:?} in progress")]
    DoubleTransition {
        requested: AppState,
        in_flight: AppState,
    },
}

impl TransitionError {
    /// Returns true for rejections that happened before any side effect.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::LoadFailure { .. })
    }
}

fn describe(from: &Option<AppState>) -> String {
    match from {
        Some(state) => format!("{:?}", state),
        None => "boot".to_string(),
    }
}

//=== GraphError ==========================================================

/// Scene graph operation failed; the graph is left unchanged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0:?} does not exist in this scene graph")]
    MissingNode(NodeId),

    #[error("node {0:?} cannot be its own parent")]
    SelfParent(NodeId),

    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    WouldCycle { child: NodeId, parent: NodeId },

    #[error("node {0:?} is not a camera")]
    NotACamera(NodeId),
}

//=========================================================================
// Unit Tests
//=========================================================================

//=========================================================================
// Ready Signals
//=========================================================================
//
// One-shot completion channels between backends and the state machine.
//
// Architecture:
//   Backend ── Resolver<T>::resolve()/reject() ──> ReadySignal<T>::poll()
//
// A signal resolves at most once. A resolver that is dropped without
// resolving turns into `LoadError::Abandoned` on the receiving side.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::task::Poll;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use log::trace;

//=== Internal Dependencies ===============================================

use crate::core::error::LoadError;

//=== Construction ========================================================

/// Creates a connected resolver/signal pair.
///
/// `what` names the load in errors and logs ("scene", "environment", ...).
pub fn ready_signal<T>(what: &'static str) -> (Resolver<T>, ReadySignal<T>) {
    let (sender, receiver) = bounded(1);
    (
        Resolver { sender, what },
        ReadySignal { receiver, what },
    )
}

//=== Resolver ============================================================

/// Sending half of a ready signal, held by the backend.
#[derive(Debug)]
pub struct Resolver<T> {
    sender: Sender<Result<T, LoadError>>,
    what: &'static str,
}

impl<T> Resolver<T> {
    pub fn what(&self) -> &'static str {
        self.what
    }

    /// Completes the signal successfully.
    pub fn resolve(self, value: T) {
        self.send(Ok(value));
    }

    /// Completes the signal with a failure.
    pub fn reject(self, reason: impl Into<String>) {
        let error = LoadError::Failed {
            what: self.what,
            reason: reason.into(),
        };
        self.send(Err(error));
    }

    fn send(self, result: Result<T, LoadError>) {
        // A dropped receiver means the waiter already gave up on this load.
        if self.sender.send(result).is_err() {
            trace!(target: "stage::ready", "{} resolved after its waiter was dropped", self.what);
        }
    }
}

//=== ReadySignal =========================================================

/// Receiving half of a ready signal, polled once per frame.
#[derive(Debug)]
pub struct ReadySignal<T> {
    receiver: Receiver<Result<T, LoadError>>,
    what: &'static str,
}

impl<T> ReadySignal<T> {
    /// Returns a signal that is already resolved with `value`.
    pub fn resolved(what: &'static str, value: T) -> Self {
        let (resolver, signal) = ready_signal(what);
        resolver.resolve(value);
        signal
    }

    pub fn what(&self) -> &'static str {
        self.what
    }

    /// Checks for completion without blocking.
    ///
    /// Must not be polled again after it returned `Poll::Ready`.
    pub fn poll(&mut self) -> Poll<Result<T, LoadError>> {
        match self.receiver.try_recv() {
            Ok(result) => Poll::Ready(result),
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => {
                Poll::Ready(Err(LoadError::Abandoned { what: self.what }))
            }
        }
    }
}

//=== Awaited =============================================================

/// A ready signal together with its eventual value.
///
/// Lets callers poll repeatedly without tracking whether the underlying
/// signal already fired.
#[derive(Debug)]
pub(crate) enum Awaited<T> {
    Pending(ReadySignal<T>),
    Done(T),
}

impl<T> Awaited<T> {
    pub(crate) fn new(signal: ReadySignal<T>) -> Self {
        Self::Pending(signal)
    }

    /// Advances the wait. Returns `Ok(true)` once the value is available.
    pub(crate) fn poll(&mut self) -> Result<bool, LoadError> {
        if let Self::Pending(signal) = self {
            match signal.poll() {
                Poll::Pending => return Ok(false),
                Poll::Ready(Ok(value)) => *self = Self::Done(value),
                Poll::Ready(Err(error)) => return Err(error),
            }
        }
        Ok(true)
    }

    pub(crate) fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_until_resolved() {
        let (resolver, mut signal) = ready_signal::<u32>("scene");

        assert_eq!(signal.poll(), Poll::Pending);
        resolver.resolve(7);
        assert_eq!(signal.poll(), Poll::Ready(Ok(7)));
    }

    #[test]
    fn reject_carries_reason() {
        let (resolver, mut signal) = ready_signal::<()>("environment");

        resolver.reject("disk on fire");

        assert_eq!(
            signal.poll(),
            Poll::Ready(Err(LoadError::Failed {
                what: "environment",
                reason: "disk on fire".to_string(),
            }))
        );
    }

    #[test]
    fn dropped_resolver_abandons() {
        let (resolver, mut signal) = ready_signal::<()>("character");
        drop(resolver);

        assert_eq!(
            signal.poll(),
            Poll::Ready(Err(LoadError::Abandoned { what: "character" }))
        );
    }

    #[test]
    fn resolve_after_waiter_dropped_is_silent() {
        let (resolver, signal) = ready_signal::<()>("scene");
        drop(signal);
        resolver.resolve(());
    }

    #[test]
    fn already_resolved_signal() {
        let mut signal = ReadySignal::resolved("scene", "ok");
        assert_eq!(signal.poll(), Poll::Ready(Ok("ok")));
    }

    #[test]
    fn awaited_keeps_value_across_polls() {
        let (resolver, signal) = ready_signal::<u8>("scene");
        let mut awaited = Awaited::new(signal);

        assert_eq!(awaited.poll(), Ok(false));
        resolver.resolve(3);
        assert_eq!(awaited.poll(), Ok(true));
        assert_eq!(awaited.poll(), Ok(true));
        assert!(awaited.is_done());
        assert!(matches!(awaited, Awaited::Done(3)));
    }

    #[test]
    fn awaited_surfaces_failure() {
        let (resolver, signal) = ready_signal::<u8>("scene");
        let mut awaited = Awaited::new(signal);

        resolver.reject("nope");

        assert!(awaited.poll().is_err());
    }
}

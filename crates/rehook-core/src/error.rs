use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::slot::SlotKind;

/// Failures raised by the hook runtime itself.
///
/// Hooks never panic on misuse; they surface one of these through `?` so the
/// host can decide whether a broken render pass is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("hook called while no container is active")]
    NoActiveContainer,

    #[error("slot {index} misaligned: called as a {expected} hook, stored as a {found}")]
    SlotMisaligned {
        index: usize,
        expected: SlotKind,
        found: SlotKind,
    },

    #[error("slot {index} holds `{found}` but was read as `{expected}`")]
    SlotTypeMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("hook adapter returned a payload that is not a `{expected}`")]
    AdapterTypeMismatch { expected: &'static str },

    #[error("render pass called {actual} hooks; earlier passes called {expected}")]
    HookCountChanged { expected: usize, actual: usize },

    #[error("container has been torn down")]
    TornDown,
}

/// Failure of an operation wrapped by [`use_async`](crate::use_async).
pub enum AsyncError<E> {
    /// The call generation was superseded, reset, torn down, or the operation
    /// reported a cancellation. Never recorded in the hook's `error` field.
    Cancelled,
    /// Any other failure of the operation.
    Failed(Rc<E>),
}

impl<E> AsyncError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AsyncError::Cancelled)
    }

    pub fn failure(&self) -> Option<&E> {
        match self {
            AsyncError::Cancelled => None,
            AsyncError::Failed(e) => Some(e),
        }
    }
}

impl<E> Clone for AsyncError<E> {
    fn clone(&self) -> Self {
        match self {
            AsyncError::Cancelled => AsyncError::Cancelled,
            AsyncError::Failed(e) => AsyncError::Failed(e.clone()),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for AsyncError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsyncError::Cancelled => f.write_str("Cancelled"),
            AsyncError::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for AsyncError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsyncError::Cancelled => f.write_str("async operation was cancelled"),
            AsyncError::Failed(e) => write!(f, "async operation failed: {e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for AsyncError<E> {}

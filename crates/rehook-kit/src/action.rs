//! Optimistic values and pending/error tracking for user actions.

use std::cell::RefCell;
use std::fmt::Display;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use rehook_core::adapter as hooks;
use rehook_core::{HookError, SetState, spawn_local};

/// Controls returned by [`use_optimistic`].
#[derive(Clone)]
pub struct Optimistic<T> {
    current: SetState<T>,
    optimistic: SetState<Option<T>>,
}

impl<T: Clone + PartialEq + 'static> Optimistic<T> {
    /// Shows `value` until it is committed or rolled back.
    pub fn update(&self, value: T) {
        self.optimistic.set(Some(value));
    }

    /// Makes the pending optimistic value the confirmed one.
    pub fn commit(&self) {
        if let Some(value) = self.optimistic.get() {
            self.current.set(value);
            self.optimistic.set(None);
        }
    }

    /// Drops the pending optimistic value.
    pub fn rollback(&self) {
        self.optimistic.set(None);
    }
}

/// The optimistic value if one is pending, else the confirmed value.
pub fn use_optimistic<T: Clone + PartialEq + 'static>(
    initial: T,
) -> Result<(T, Optimistic<T>), HookError> {
    let (current, set_current) = hooks::use_state(|| initial)?;
    let (optimistic, set_optimistic) = hooks::use_state(|| None::<T>)?;
    Ok((
        optimistic.unwrap_or(current),
        Optimistic {
            current: set_current,
            optimistic: set_optimistic,
        },
    ))
}

type ErasedAction<T> = Rc<dyn Fn(T) -> LocalBoxFuture<'static, Result<(), String>>>;

/// Starts the action held by [`use_action_state`]. Stable across renders.
pub struct RunAction<T> {
    input: SetState<T>,
    pending: SetState<bool>,
    error: SetState<Option<String>>,
    action: Rc<RefCell<Option<ErasedAction<T>>>>,
}

impl<T> Clone for RunAction<T> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            pending: self.pending.clone(),
            error: self.error.clone(),
            action: self.action.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> RunAction<T> {
    /// Records `input`, marks the action pending and starts it. The returned
    /// future clears the pending flag and stores the failure message, if any.
    pub fn run(&self, input: T) -> LocalBoxFuture<'static, ()> {
        self.input.set(input.clone());
        self.pending.set(true);
        self.error.set(None);
        let action = self.action.borrow().clone();
        let started = action.map(|action| action(input));
        let (pending, error) = (self.pending.clone(), self.error.clone());
        async move {
            if let Some(started) = started {
                if let Err(message) = started.await {
                    log::debug!("action failed: {message}");
                    error.set(Some(message));
                }
            }
            pending.set(false);
        }
        .boxed_local()
    }

    /// [`run`](Self::run) on the installed local spawner.
    pub fn spawn(&self, input: T) -> bool {
        spawn_local(self.run(input))
    }
}

/// Render snapshot of [`use_action_state`].
pub struct ActionState<T> {
    pub input: T,
    pub pending: bool,
    pub error: Option<String>,
    pub run: RunAction<T>,
}

/// Tracks the last input, pending flag and failure message of `action`.
/// The `action` passed on the latest pass is the one `run` starts.
pub fn use_action_state<T, O, E, Fut>(
    action: impl Fn(T) -> Fut + 'static,
    initial: T,
) -> Result<ActionState<T>, HookError>
where
    T: Clone + PartialEq + 'static,
    O: 'static,
    E: Display + 'static,
    Fut: Future<Output = Result<O, E>> + 'static,
{
    let (input, set_input) = hooks::use_state(|| initial)?;
    let (pending, set_pending) = hooks::use_state(|| false)?;
    let (error, set_error) = hooks::use_state(|| None::<String>)?;
    let latest = hooks::use_ref(|| None::<ErasedAction<T>>)?;
    let erased: ErasedAction<T> = Rc::new(move |input: T| {
        action(input)
            .map(|result| {
                result.map(drop).map_err(|e| {
                    let message = e.to_string();
                    if message.is_empty() {
                        "action failed".to_string()
                    } else {
                        message
                    }
                })
            })
            .boxed_local()
    });
    *latest.borrow_mut() = Some(erased);
    Ok(ActionState {
        input,
        pending,
        error,
        run: RunAction {
            input: set_input,
            pending: set_pending,
            error: set_error,
            action: latest,
        },
    })
}

/// [`use_action_state`] under the name forms use.
pub fn use_form_state<T, O, E, Fut>(
    action: impl Fn(T) -> Fut + 'static,
    initial: T,
) -> Result<ActionState<T>, HookError>
where
    T: Clone + PartialEq + 'static,
    O: 'static,
    E: Display + 'static,
    Fut: Future<Output = Result<O, E>> + 'static,
{
    use_action_state(action, initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::future::ready;
    use rehook_core::Instance;

    #[test]
    fn optimistic_commit_and_rollback() {
        let mut instance = Instance::new(|| use_optimistic(1));
        let (shown, controls) = instance.render().unwrap();
        assert_eq!(shown, 1);

        controls.update(2);
        assert_eq!(instance.flush().unwrap().map(|(v, _)| v), Some(2));
        controls.rollback();
        assert_eq!(instance.flush().unwrap().map(|(v, _)| v), Some(1));

        controls.update(3);
        controls.commit();
        assert_eq!(instance.flush().unwrap().map(|(v, _)| v), Some(3));
        controls.rollback();
        assert!(!instance.needs_render());
    }

    #[test]
    fn action_state_records_failure() {
        let mut instance = Instance::new(|| {
            use_action_state(
                |name: String| {
                    ready(if name.is_empty() {
                        Err("name required")
                    } else {
                        Ok(name.len())
                    })
                },
                String::from("draft"),
            )
        });
        let state = instance.render().unwrap();
        assert_eq!(state.input, "draft");
        assert!(!state.pending && state.error.is_none());

        let done = state.run.run(String::new());
        let state = instance.flush().unwrap().unwrap();
        assert!(state.pending);
        assert_eq!(state.input, "");

        block_on(done);
        let state = instance.flush().unwrap().unwrap();
        assert!(!state.pending);
        assert_eq!(state.error.as_deref(), Some("name required"));

        block_on(state.run.run(String::from("ok")));
        let state = instance.flush().unwrap().unwrap();
        assert_eq!(state.error, None);
        assert_eq!(state.input, "ok");
    }

    #[test]
    fn empty_error_message_gets_a_default() {
        let mut instance = Instance::new(|| use_form_state(|_: u8| ready(Err::<(), _>("")), 0));
        let state = instance.render().unwrap();
        block_on(state.run.run(1));
        let state = instance.flush().unwrap().unwrap();
        assert_eq!(state.error.as_deref(), Some("action failed"));
    }
}

//! Race-safe wrapper around a future-returning operation.
//!
//! Every [`AsyncHandle::run`] starts a new call generation with its own id
//! and cancellation token and cancels the previous generation. A generation
//! writes hook state only if, when it settles, its id is still the latest and
//! its token was never cancelled. Stale responses are therefore discarded no
//! matter in which order the underlying futures complete.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{AbortHandle, Abortable, Aborted, LocalBoxFuture};

use crate::effects::{Dispose, use_effect};
use crate::state::{SetState, use_ref, use_state};
use crate::{AsyncError, HookError, deps, executor};

type Operation<P, T, E> = Rc<dyn Fn(P) -> LocalBoxFuture<'static, Result<T, E>>>;

/// Options for [`use_async`].
pub struct AsyncOptions<P, E> {
    /// Run once with `initial_params` when the instance mounts.
    pub immediate: bool,
    pub initial_params: Option<P>,
    /// Marks operation errors that mean "cancelled" rather than "failed".
    pub is_cancellation: Option<Rc<dyn Fn(&E) -> bool>>,
}

/// Runs once on mount with `P::default()`.
impl<P: Default, E> Default for AsyncOptions<P, E> {
    fn default() -> Self {
        Self::immediate(P::default())
    }
}

impl<P, E> AsyncOptions<P, E> {
    /// Never runs on its own; every call goes through the handle.
    pub fn manual() -> Self {
        Self {
            immediate: false,
            initial_params: None,
            is_cancellation: None,
        }
    }

    pub fn immediate(params: P) -> Self {
        Self {
            immediate: true,
            initial_params: Some(params),
            is_cancellation: None,
        }
    }

    pub fn cancel_when(mut self, is_cancellation: impl Fn(&E) -> bool + 'static) -> Self {
        self.is_cancellation = Some(Rc::new(is_cancellation));
        self
    }
}

/// Observable state of one async hook.
pub struct AsyncState<T, E> {
    pub loading: bool,
    pub data: Option<Rc<T>>,
    pub error: Option<Rc<E>>,
}

impl<T, E> Default for AsyncState<T, E> {
    fn default() -> Self {
        Self {
            loading: false,
            data: None,
            error: None,
        }
    }
}

impl<T, E> Clone for AsyncState<T, E> {
    fn clone(&self) -> Self {
        Self {
            loading: self.loading,
            data: self.data.clone(),
            error: self.error.clone(),
        }
    }
}

fn same<X>(a: &Option<Rc<X>>, b: &Option<Rc<X>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

/// Payloads compare by identity: every settled call yields a fresh `Rc`.
impl<T, E> PartialEq for AsyncState<T, E> {
    fn eq(&self, other: &Self) -> bool {
        self.loading == other.loading
            && same(&self.data, &other.data)
            && same(&self.error, &other.error)
    }
}

impl<T, E> fmt::Debug for AsyncState<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncState")
            .field("loading", &self.loading)
            .field("data", &self.data.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

#[derive(Clone)]
struct CancelToken {
    cancelled: Rc<Cell<bool>>,
    abort: AbortHandle,
}

impl CancelToken {
    fn cancel(&self) {
        self.cancelled.set(true);
        self.abort.abort();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct AsyncCore<P, T, E> {
    last_call_id: Cell<u64>,
    token: RefCell<Option<CancelToken>>,
    operation: RefCell<Operation<P, T, E>>,
    is_cancellation: RefCell<Option<Rc<dyn Fn(&E) -> bool>>>,
    state: SetState<AsyncState<T, E>>,
}

impl<P, T, E> AsyncCore<P, T, E> {
    fn cancel_active(&self) {
        if let Some(token) = self.token.borrow_mut().take() {
            token.cancel();
        }
    }

    fn classifies_as_cancellation(&self, err: &E) -> bool {
        let classify = self.is_cancellation.borrow().clone();
        classify.is_some_and(|classify| classify(err))
    }
}

/// Stable `run`/`reset` pair of one [`use_async`] call site.
pub struct AsyncHandle<P, T, E> {
    core: Rc<AsyncCore<P, T, E>>,
}

impl<P, T, E> Clone for AsyncHandle<P, T, E> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<P: 'static, T: 'static, E: 'static> AsyncHandle<P, T, E> {
    /// Starts a new generation and returns its outcome.
    ///
    /// Loading is set before this returns; the operation itself only makes
    /// progress once the returned future is polled. A failure is recorded in
    /// the hook's `error` and also returned here. A generation that was
    /// superseded or reset resolves to [`AsyncError::Cancelled`].
    pub fn run(&self, params: P) -> LocalBoxFuture<'static, Result<Rc<T>, AsyncError<E>>> {
        let core = self.core.clone();
        let call_id = core.last_call_id.get() + 1;
        core.last_call_id.set(call_id);

        let (abort, registration) = AbortHandle::new_pair();
        let token = CancelToken {
            cancelled: Rc::new(Cell::new(false)),
            abort,
        };
        if let Some(previous) = core.token.replace(Some(token.clone())) {
            log::trace!("async call {call_id} supersedes an in-flight call");
            previous.cancel();
        }

        core.state.update(|s| AsyncState {
            loading: true,
            data: s.data.clone(),
            error: None,
        });

        let operation = core.operation.borrow().clone();
        let pending = Abortable::new(operation(params), registration);

        async move {
            let outcome = pending.await;
            let latest = core.last_call_id.get() == call_id && !token.is_cancelled();
            if latest {
                core.token.borrow_mut().take();
            }
            match outcome {
                Err(Aborted) => Err(AsyncError::Cancelled),
                Ok(Ok(value)) => {
                    let value = Rc::new(value);
                    if latest {
                        core.state.set(AsyncState {
                            loading: false,
                            data: Some(value.clone()),
                            error: None,
                        });
                    }
                    Ok(value)
                }
                Ok(Err(err)) if core.classifies_as_cancellation(&err) => {
                    if latest {
                        core.state.update(|s| AsyncState {
                            loading: false,
                            data: s.data.clone(),
                            error: None,
                        });
                    }
                    Err(AsyncError::Cancelled)
                }
                Ok(Err(err)) => {
                    let err = Rc::new(err);
                    if latest {
                        log::debug!("async call {call_id} failed");
                        core.state.update(|s| AsyncState {
                            loading: false,
                            data: s.data.clone(),
                            error: Some(err.clone()),
                        });
                    }
                    Err(AsyncError::Failed(err))
                }
            }
        }
        .boxed_local()
    }

    /// Runs on the installed local spawner, discarding the outcome.
    pub fn run_detached(&self, params: P) -> bool {
        let pending = self.run(params);
        executor::spawn_local(pending.map(|_| ()).boxed_local())
    }

    /// Cancels any in-flight generation and clears all state.
    pub fn reset(&self) {
        self.core.cancel_active();
        self.core.last_call_id.set(0);
        self.core.state.set(AsyncState::default());
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }

    /// Id of the most recent generation (0 after a reset).
    pub fn last_call_id(&self) -> u64 {
        self.core.last_call_id.get()
    }
}

/// Render snapshot returned by [`use_async`].
pub struct UseAsync<P, T, E> {
    pub loading: bool,
    pub data: Option<Rc<T>>,
    pub error: Option<Rc<E>>,
    pub handle: AsyncHandle<P, T, E>,
}

impl<P: 'static, T: 'static, E: 'static> UseAsync<P, T, E> {
    pub fn run(&self, params: P) -> LocalBoxFuture<'static, Result<Rc<T>, AsyncError<E>>> {
        self.handle.run(params)
    }

    pub fn reset(&self) {
        self.handle.reset()
    }
}

impl<P, T, E> Clone for UseAsync<P, T, E> {
    fn clone(&self) -> Self {
        Self {
            loading: self.loading,
            data: self.data.clone(),
            error: self.error.clone(),
            handle: self.handle.clone(),
        }
    }
}

/// Wraps `operation` with loading/data/error state and stale-response
/// protection. The handle is stable across passes and always invokes the
/// `operation` passed on the latest pass. Any in-flight generation is
/// cancelled when the instance is torn down.
pub fn use_async<P, T, E, Fut>(
    operation: impl Fn(P) -> Fut + 'static,
    options: AsyncOptions<P, E>,
) -> Result<UseAsync<P, T, E>, HookError>
where
    P: 'static,
    T: 'static,
    E: 'static,
    Fut: Future<Output = Result<T, E>> + 'static,
{
    let operation: Operation<P, T, E> = Rc::new(move |params| operation(params).boxed_local());
    let AsyncOptions {
        immediate,
        initial_params,
        is_cancellation,
    } = options;

    let (state, set_state) = use_state(AsyncState::<T, E>::default)?;
    let core = use_ref(|| {
        Rc::new(AsyncCore {
            last_call_id: Cell::new(0),
            token: RefCell::new(None),
            operation: RefCell::new(operation.clone()),
            is_cancellation: RefCell::new(None),
            state: set_state,
        })
    })?;
    let core = core.borrow().clone();
    *core.operation.borrow_mut() = operation;
    *core.is_cancellation.borrow_mut() = is_cancellation;
    let handle = AsyncHandle { core };

    let mount = handle.clone();
    use_effect(
        move || {
            if immediate {
                match initial_params {
                    Some(params) => {
                        if !mount.run_detached(params) {
                            log::warn!("immediate async run skipped: no local spawner");
                        }
                    }
                    None => log::warn!("immediate async run requested without initial params"),
                }
            }
            let core = mount.core.clone();
            Dispose::new(move || core.cancel_active())
        },
        deps![],
    )?;

    Ok(UseAsync {
        loading: state.loading,
        data: state.data,
        error: state.error,
        handle,
    })
}

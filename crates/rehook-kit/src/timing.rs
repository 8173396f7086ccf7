//! Timer-backed hooks. All of them schedule on the host-driven queue in
//! [`timers`](crate::timers), so nothing fires until the host runs due timers.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use rehook_core::adapter as hooks;
use rehook_core::{Callback, Deps, Dispose, HookError, SetState, deps, spawn_local};
use web_time::Duration;

use crate::clock;
use crate::timers::{TimerId, clear_timer, set_interval, set_timeout};

/// Slot holding the closure passed on the latest pass. Calling it takes the
/// closure out for the duration of the call so a callback that triggers a
/// synchronous render can store its replacement.
struct LatestFn(Rc<RefCell<Option<Box<dyn FnMut()>>>>);

impl LatestFn {
    fn call(&self) {
        let taken = self.0.borrow_mut().take();
        if let Some(mut f) = taken {
            f();
            let mut slot = self.0.borrow_mut();
            if slot.is_none() {
                *slot = Some(f);
            }
        }
    }
}

fn use_latest_fn(f: impl FnMut() + 'static) -> Result<LatestFn, HookError> {
    let slot = hooks::use_ref(|| None::<Box<dyn FnMut()>>)?;
    *slot.borrow_mut() = Some(Box::new(f));
    Ok(LatestFn(slot))
}

fn cancel_on_cleanup(id: TimerId) -> Dispose {
    Dispose::new(move || {
        clear_timer(id);
    })
}

/// Calls `f` once, `delay` after mount. A changed `delay` restarts the timer.
pub fn use_timeout(f: impl FnMut() + 'static, delay: Duration) -> Result<(), HookError> {
    let latest = use_latest_fn(f)?;
    hooks::use_effect(
        move || cancel_on_cleanup(set_timeout(delay, move || latest.call())),
        deps![delay],
    )
}

/// Calls `f` every `period` while mounted. A changed `period` restarts it.
pub fn use_interval(f: impl FnMut() + 'static, period: Duration) -> Result<(), HookError> {
    let latest = use_latest_fn(f)?;
    hooks::use_effect(
        move || cancel_on_cleanup(set_interval(period, move || latest.call())),
        deps![period],
    )
}

/// `value`, updated only after it has stopped changing for `wait`.
pub fn use_debounce<T: Clone + PartialEq + 'static>(
    value: T,
    wait: Duration,
) -> Result<T, HookError> {
    let (debounced, set) = hooks::use_state(|| value.clone())?;
    let deps = deps![value.clone(), wait];
    hooks::use_effect(
        move || cancel_on_cleanup(set_timeout(wait, move || set.set(value.clone()))),
        deps,
    )?;
    Ok(debounced)
}

/// `value`, sampled at most once per `limit`.
pub fn use_throttle<T: Clone + PartialEq + 'static>(
    value: T,
    limit: Duration,
) -> Result<T, HookError> {
    let (throttled, set) = hooks::use_state(|| value.clone())?;
    let last_ran = hooks::use_ref(clock::now)?;
    let deps = deps![value.clone(), limit];
    hooks::use_effect(
        move || {
            let id = set_interval(limit, move || {
                let now = clock::now();
                let elapsed = now - *last_ran.borrow();
                if elapsed >= limit {
                    set.set(value.clone());
                    *last_ran.borrow_mut() = now;
                }
            });
            cancel_on_cleanup(id)
        },
        deps,
    )?;
    Ok(throttled)
}

/// Stable callback that postpones the latest `f` until calls stop for
/// `wait`; only the last argument is delivered. A change in `deps` or
/// teardown cancels the pending call.
pub fn use_debounce_fn<A: 'static>(
    f: impl Fn(A) + 'static,
    deps: Deps,
    wait: Duration,
) -> Result<Callback<A>, HookError> {
    let latest = hooks::use_ref(|| None::<Rc<dyn Fn(A)>>)?;
    *latest.borrow_mut() = Some(Rc::new(f));
    let wait_ref = hooks::use_ref(|| wait)?;
    *wait_ref.borrow_mut() = wait;
    let pending = hooks::use_ref(|| None::<TimerId>)?;

    let debounced = hooks::use_ref({
        let pending = pending.clone();
        move || {
            Rc::new(move |arg: A| {
                if let Some(id) = pending.borrow_mut().take() {
                    clear_timer(id);
                }
                let latest = latest.clone();
                let mut arg = Some(arg);
                let id = set_timeout(*wait_ref.borrow(), move || {
                    let f = latest.borrow().clone();
                    if let (Some(f), Some(arg)) = (f, arg.take()) {
                        f(arg);
                    }
                });
                *pending.borrow_mut() = Some(id);
            }) as Callback<A>
        }
    })?;
    let debounced = debounced.borrow().clone();

    hooks::use_effect(
        move || {
            Dispose::new(move || {
                if let Some(id) = pending.borrow_mut().take() {
                    clear_timer(id);
                }
            })
        },
        deps,
    )?;
    Ok(debounced)
}

/// Stable callback that forwards to the latest `f` at most once per `wait`;
/// calls inside the window are dropped. The window starts at mount and
/// restarts whenever `deps` change.
pub fn use_throttle_fn<A: 'static>(
    f: impl Fn(A) + 'static,
    deps: Deps,
    wait: Duration,
) -> Result<Callback<A>, HookError> {
    let latest = hooks::use_ref(|| None::<Rc<dyn Fn(A)>>)?;
    *latest.borrow_mut() = Some(Rc::new(f));
    let last = hooks::use_ref(clock::now)?;

    let throttled = hooks::use_ref({
        let last = last.clone();
        move || {
            Rc::new(move |arg: A| {
                let now = clock::now();
                if now - *last.borrow() < wait {
                    return;
                }
                *last.borrow_mut() = now;
                let f = latest.borrow().clone();
                if let Some(f) = f {
                    f(arg);
                }
            }) as Callback<A>
        }
    })?;
    let throttled = throttled.borrow().clone();

    hooks::use_effect(move || *last.borrow_mut() = clock::now(), deps)?;
    Ok(throttled)
}

/// `value`, trailing by `delay`: each change schedules the then-latest value.
pub fn use_deferred_value<T: Clone + PartialEq + 'static>(
    value: T,
    delay: Duration,
) -> Result<T, HookError> {
    let (deferred, set) = hooks::use_state(|| value.clone())?;
    let latest = hooks::use_ref(|| value.clone())?;
    let deps = deps![value.clone(), delay];
    hooks::use_effect(
        move || {
            *latest.borrow_mut() = value;
            let id = set_timeout(delay, move || set.set(latest.borrow().clone()));
            cancel_on_cleanup(id)
        },
        deps,
    )?;
    Ok(deferred)
}

/// Starts transitions for [`use_transition`].
#[derive(Clone)]
pub struct StartTransition {
    pending: SetState<bool>,
    loading: SetState<bool>,
    delay: Duration,
}

impl StartTransition {
    /// Marks the transition pending, runs `work` on the local spawner, and
    /// clears the flags `delay` after it completes.
    pub fn start(&self, work: impl Future + 'static) -> bool {
        self.loading.set(true);
        self.pending.set(true);
        let (pending, loading, delay) = (self.pending.clone(), self.loading.clone(), self.delay);
        let spawned = spawn_local(
            async move {
                work.await;
                log::trace!("transition work done, settling in {delay:?}");
                set_timeout(delay, move || {
                    pending.set(false);
                    loading.set(false);
                });
            }
            .boxed_local(),
        );
        if !spawned {
            self.pending.set(false);
            self.loading.set(false);
        }
        spawned
    }
}

/// Transition state: `(start, is_pending, is_loading)`.
pub fn use_transition(delay: Duration) -> Result<(StartTransition, bool, bool), HookError> {
    let (is_pending, pending) = hooks::use_state(|| false)?;
    let (is_loading, loading) = hooks::use_state(|| false)?;
    Ok((
        StartTransition {
            pending,
            loading,
            delay,
        },
        is_pending,
        is_loading,
    ))
}

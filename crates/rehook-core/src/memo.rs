use std::rc::Rc;

use crate::runtime::current_container;
use crate::slot::{ErasedInit, downcast_slot};
use crate::state::use_ref;
use crate::{Deps, HookError};

/// Shared, clonable callback. Its `Rc` identity is what dependency lists
/// compare (see [`Identity`](crate::Identity)).
pub type Callback<A = (), R = ()> = Rc<dyn Fn(A) -> R>;

/// Value computed on the first pass and recomputed only when a non-empty
/// `deps` changes. With empty `deps` the first value is kept for the
/// container's lifetime.
pub fn use_memo<T: Clone + 'static>(
    factory: impl FnOnce() -> T,
    deps: Deps,
) -> Result<T, HookError> {
    let value = current_container()?.memo(ErasedInit::new(factory), deps)?;
    Ok(downcast_slot::<T>(value)?.as_ref().clone())
}

/// [`use_memo`] whose value is the callback itself.
pub fn use_callback<A: 'static, R: 'static>(
    f: impl Fn(A) -> R + 'static,
    deps: Deps,
) -> Result<Callback<A, R>, HookError> {
    use_memo(move || Rc::new(f) as Callback<A, R>, deps)
}

/// Callback that keeps one identity for the container's lifetime while
/// always delegating to the `f` passed on the latest pass.
pub fn use_memoized_fn<A: 'static, R: 'static>(
    f: impl Fn(A) -> R + 'static,
) -> Result<Callback<A, R>, HookError> {
    let f: Callback<A, R> = Rc::new(f);
    let latest = use_ref(|| f.clone())?;
    *latest.borrow_mut() = f;

    let stable = use_ref(|| {
        let latest = latest.clone();
        Rc::new(move |arg: A| {
            let current = latest.borrow().clone();
            current(arg)
        }) as Callback<A, R>
    })?;
    let stable = stable.borrow().clone();
    Ok(stable)
}

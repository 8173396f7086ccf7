use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rehook_core::adapter as hooks;
use rehook_core::{Deps, Dispose, HookError, deps};
use uuid::Uuid;

/// Identifier fixed for the lifetime of the calling container.
pub fn use_id(prefix: &str) -> Result<String, HookError> {
    hooks::use_memo(|| format!("{prefix}{}", Uuid::new_v4()), deps![])
}

/// Callback that requests a rerender of the calling container.
pub fn use_rerender() -> Result<Rc<dyn Fn()>, HookError> {
    let (_, set) = hooks::use_state(|| 0u64)?;
    Ok(Rc::new(move || set.update(|tick| tick.wrapping_add(1))))
}

/// Runs `f` after every pass except the first.
pub fn use_update(f: impl FnOnce()) -> Result<(), HookError> {
    let renders = hooks::use_ref(|| 0u64)?;
    let n = {
        let mut renders = renders.borrow_mut();
        *renders += 1;
        *renders
    };
    hooks::use_effect(
        move || {
            if n > 1 {
                f();
            }
        },
        deps![n],
    )
}

/// Where [`use_imperative_handle`] publishes its handle.
pub enum HandleRef<T: ?Sized> {
    Slot(Rc<RefCell<Option<Rc<T>>>>),
    Callback(Rc<dyn Fn(Option<Rc<T>>)>),
}

impl<T: ?Sized> HandleRef<T> {
    pub fn slot() -> Self {
        Self::Slot(Rc::new(RefCell::new(None)))
    }

    pub fn assign(&self, handle: Option<Rc<T>>) {
        match self {
            Self::Slot(slot) => *slot.borrow_mut() = handle,
            Self::Callback(f) => f(handle),
        }
    }

    /// Current handle of a `Slot`; always `None` for a `Callback`.
    pub fn get(&self) -> Option<Rc<T>> {
        match self {
            Self::Slot(slot) => slot.borrow().clone(),
            Self::Callback(_) => None,
        }
    }
}

impl<T: ?Sized> Clone for HandleRef<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Slot(slot) => Self::Slot(slot.clone()),
            Self::Callback(f) => Self::Callback(f.clone()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for HandleRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot(slot) => f
                .debug_struct("HandleRef::Slot")
                .field("set", &slot.borrow().is_some())
                .finish(),
            Self::Callback(_) => f.write_str("HandleRef::Callback"),
        }
    }
}

/// Publishes `create()` to `target` when `deps` change, and clears it at
/// cleanup.
pub fn use_imperative_handle<T: 'static>(
    target: &HandleRef<T>,
    create: impl FnOnce() -> T,
    deps: Deps,
) -> Result<(), HookError> {
    let target = target.clone();
    hooks::use_effect(
        move || {
            target.assign(Some(Rc::new(create())));
            Dispose::new(move || target.assign(None))
        },
        deps,
    )
}

/// Logs `value` at debug level whenever it changes, in debug builds only.
pub fn use_debug_value<T>(value: T) -> Result<(), HookError>
where
    T: fmt::Debug + Clone + PartialEq + 'static,
{
    use_debug_value_with(value, |v| v.clone())
}

/// [`use_debug_value`] that logs `format(value)` instead of the value.
pub fn use_debug_value_with<T, D>(value: T, format: impl FnOnce(&T) -> D) -> Result<(), HookError>
where
    T: Clone + PartialEq + 'static,
    D: fmt::Debug,
{
    let deps = deps![value.clone()];
    hooks::use_effect(
        move || {
            if cfg!(debug_assertions) {
                log::debug!("debug value: {:?}", format(&value));
            }
        },
        deps,
    )
}

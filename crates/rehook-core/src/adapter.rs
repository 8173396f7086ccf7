//! Swappable hook implementations.
//!
//! Convenience hooks (see `rehook-kit`) never call the basic hooks directly.
//! They resolve their primitives through the adapter installed for the
//! current thread at call time via the typed functions in this module
//! ([`use_state`], [`use_ref`], [`use_effect`], ...). With no adapter
//! installed, or for any method an adapter does not override, the basic
//! implementation runs.
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use rehook_core::adapter::{self, HookAdapter};
//! use rehook_core::{Deps, Dispose, HookError, Instance, deps};
//!
//! /// Renders without running effects, e.g. for snapshot output.
//! struct NoEffects;
//!
//! impl HookAdapter for NoEffects {
//!     fn name(&self) -> &str {
//!         "no-effects"
//!     }
//!
//!     fn use_effect(
//!         &self,
//!         _effect: Box<dyn FnOnce() -> Option<Dispose> + '_>,
//!         _deps: Deps,
//!     ) -> Result<(), HookError> {
//!         Ok(())
//!     }
//! }
//!
//! rehook_core::use_hook_adapter(NoEffects);
//! let ran = Rc::new(Cell::new(false));
//! let flag = ran.clone();
//! let mut instance = Instance::new(move || {
//!     let flag = flag.clone();
//!     adapter::use_effect(move || flag.set(true), deps![])
//! });
//! instance.render().unwrap();
//! assert!(!ran.get());
//! rehook_core::take_hook_adapter();
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::effects::{Dispose, IntoCleanup};
use crate::memo::Callback;
use crate::runtime::{Rerender, current_container};
use crate::slot::{ErasedInit, SlotKind, downcast_slot};
use crate::state::{SetState, typed_state};
use crate::{Deps, HookError};

thread_local! {
    static ADAPTER: RefCell<Option<Rc<dyn HookAdapter>>> = const { RefCell::new(None) };
}

/// Table of primitive hook implementations.
///
/// Payloads are type-erased so the trait stays object safe. `use_state`
/// must return the `RefCell<T>` built by `init`, `use_ref` the `RefCell<T>`
/// built by `init`, and `use_memo` the `T` built by `init`; the typed
/// wrappers reject anything else with [`HookError::AdapterTypeMismatch`].
pub trait HookAdapter {
    fn name(&self) -> &str {
        "basic"
    }

    fn use_state(&self, init: ErasedInit<'_>) -> Result<(Rc<dyn Any>, Rerender), HookError> {
        basic::use_state(init)
    }

    fn use_ref(&self, init: ErasedInit<'_>) -> Result<Rc<dyn Any>, HookError> {
        basic::use_ref(init)
    }

    fn use_effect(
        &self,
        effect: Box<dyn FnOnce() -> Option<Dispose> + '_>,
        deps: Deps,
    ) -> Result<(), HookError> {
        basic::use_effect(effect, deps)
    }

    fn use_layout_effect(
        &self,
        effect: Box<dyn FnOnce() -> Option<Dispose> + '_>,
        deps: Deps,
    ) -> Result<(), HookError> {
        basic::use_layout_effect(effect, deps)
    }

    fn use_memo(&self, init: ErasedInit<'_>, deps: Deps) -> Result<Rc<dyn Any>, HookError> {
        basic::use_memo(init, deps)
    }
}

/// The built-in implementations, callable from overriding adapters.
pub mod basic {
    use super::*;

    pub fn use_state(init: ErasedInit<'_>) -> Result<(Rc<dyn Any>, Rerender), HookError> {
        let container = current_container()?;
        let cell = container.cell(SlotKind::State, init)?;
        Ok((cell, container.rerender_handle()))
    }

    pub fn use_ref(init: ErasedInit<'_>) -> Result<Rc<dyn Any>, HookError> {
        current_container()?.cell(SlotKind::Ref, init)
    }

    pub fn use_effect(
        effect: Box<dyn FnOnce() -> Option<Dispose> + '_>,
        deps: Deps,
    ) -> Result<(), HookError> {
        current_container()?.effect(SlotKind::Effect, effect, deps)
    }

    pub fn use_layout_effect(
        effect: Box<dyn FnOnce() -> Option<Dispose> + '_>,
        deps: Deps,
    ) -> Result<(), HookError> {
        current_container()?.effect(SlotKind::LayoutEffect, effect, deps)
    }

    pub fn use_memo(init: ErasedInit<'_>, deps: Deps) -> Result<Rc<dyn Any>, HookError> {
        current_container()?.memo(init, deps)
    }
}

/// Adapter with no overrides.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicAdapter;

impl HookAdapter for BasicAdapter {}

/// Installs `adapter` for this thread, returning the one it replaces.
/// Last writer wins; there is no implicit reset.
pub fn use_hook_adapter(adapter: impl HookAdapter + 'static) -> Option<Rc<dyn HookAdapter>> {
    let adapter: Rc<dyn HookAdapter> = Rc::new(adapter);
    log::debug!("hook adapter `{}` installed", adapter.name());
    ADAPTER.with(|a| a.borrow_mut().replace(adapter))
}

/// Removes the installed adapter, restoring the basic implementations.
pub fn take_hook_adapter() -> Option<Rc<dyn HookAdapter>> {
    ADAPTER.with(|a| a.borrow_mut().take())
}

pub fn current_hook_adapter() -> Rc<dyn HookAdapter> {
    ADAPTER
        .with(|a| a.borrow().clone())
        .unwrap_or_else(|| Rc::new(BasicAdapter))
}

pub fn use_state<T: Clone + PartialEq + 'static>(
    init: impl FnOnce() -> T,
) -> Result<(T, SetState<T>), HookError> {
    let (cell, rerender) =
        current_hook_adapter().use_state(ErasedInit::new(move || RefCell::new(init())))?;
    typed_state(cell, rerender)
}

pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> Result<Rc<RefCell<T>>, HookError> {
    let cell = current_hook_adapter().use_ref(ErasedInit::new(move || RefCell::new(init())))?;
    downcast_slot::<RefCell<T>>(cell)
}

pub fn use_effect<C: IntoCleanup>(effect: impl FnOnce() -> C, deps: Deps) -> Result<(), HookError> {
    current_hook_adapter().use_effect(Box::new(move || effect().into_cleanup()), deps)
}

pub fn use_layout_effect<C: IntoCleanup>(
    effect: impl FnOnce() -> C,
    deps: Deps,
) -> Result<(), HookError> {
    current_hook_adapter().use_layout_effect(Box::new(move || effect().into_cleanup()), deps)
}

pub fn use_memo<T: Clone + 'static>(
    factory: impl FnOnce() -> T,
    deps: Deps,
) -> Result<T, HookError> {
    let value = current_hook_adapter().use_memo(ErasedInit::new(factory), deps)?;
    Ok(downcast_slot::<T>(value)?.as_ref().clone())
}

pub fn use_callback<A: 'static, R: 'static>(
    f: impl Fn(A) -> R + 'static,
    deps: Deps,
) -> Result<Callback<A, R>, HookError> {
    use_memo(move || Rc::new(f) as Callback<A, R>, deps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Instance, deps};
    use std::cell::Cell;

    struct Recording {
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl HookAdapter for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn use_state(&self, init: ErasedInit<'_>) -> Result<(Rc<dyn Any>, Rerender), HookError> {
            self.calls.borrow_mut().push("state");
            basic::use_state(init)
        }

        fn use_effect(
            &self,
            effect: Box<dyn FnOnce() -> Option<Dispose> + '_>,
            deps: Deps,
        ) -> Result<(), HookError> {
            self.calls.borrow_mut().push("effect");
            basic::use_effect(effect, deps)
        }
    }

    #[test]
    fn overrides_intercept_and_defaults_fall_back() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let previous = use_hook_adapter(Recording {
            calls: calls.clone(),
        });
        assert!(previous.is_none());
        assert_eq!(current_hook_adapter().name(), "recording");

        let ran = Rc::new(Cell::new(0));
        let mut instance = Instance::new({
            let ran = ran.clone();
            move || {
                let (n, _) = use_state(|| 3)?;
                let r = use_ref(|| 0u8)?;
                let ran = ran.clone();
                use_effect(move || ran.set(ran.get() + 1), deps![])?;
                Ok((n, *r.borrow()))
            }
        });
        assert_eq!(instance.render().unwrap(), (3, 0));
        assert_eq!(instance.render().unwrap(), (3, 0));
        assert_eq!(ran.get(), 1);
        assert_eq!(*calls.borrow(), vec!["state", "effect", "state", "effect"]);

        assert!(take_hook_adapter().is_some());
        assert_eq!(current_hook_adapter().name(), "basic");
    }

    struct Lying;

    impl HookAdapter for Lying {
        fn use_ref(&self, _init: ErasedInit<'_>) -> Result<Rc<dyn Any>, HookError> {
            Ok(Rc::new(RefCell::new("not a number")))
        }
    }

    #[test]
    fn wrong_payload_is_reported() {
        use_hook_adapter(Lying);
        let mut instance = Instance::new(|| use_ref(|| 1u32).map(|_| ()));
        assert!(matches!(
            instance.render(),
            Err(HookError::AdapterTypeMismatch { .. })
        ));
        take_hook_adapter();
    }

    #[test]
    fn typed_memo_through_basic() {
        let mut instance = Instance::new(|| use_memo(|| String::from("m"), deps![1]));
        assert_eq!(instance.render().unwrap(), "m");
    }
}

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::runtime::current_container;
use crate::slot::SlotKind;
use crate::state::use_ref;
use crate::{Deps, HookError};

/// Cleanup returned by an effect. Runs at most once, however many clones
/// call [`Dispose::run`].
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_pending(&self) -> bool {
        self.0.borrow().is_some()
    }
}

impl fmt::Debug for Dispose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispose")
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Helper to build the cleanup an effect returns.
pub fn on_cleanup(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}

/// What an effect body may return.
pub trait IntoCleanup {
    fn into_cleanup(self) -> Option<Dispose>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Dispose> {
        None
    }
}

impl IntoCleanup for Dispose {
    fn into_cleanup(self) -> Option<Dispose> {
        Some(self)
    }
}

impl IntoCleanup for Option<Dispose> {
    fn into_cleanup(self) -> Option<Dispose> {
        self
    }
}

/// Runs `effect` on the first render and again whenever a non-empty `deps`
/// changes, running the previous cleanup first. With empty `deps` it runs
/// exactly once per container.
///
/// The body runs synchronously inside this call; a panic in it propagates
/// to whoever started the render pass.
pub fn use_effect<C: IntoCleanup>(effect: impl FnOnce() -> C, deps: Deps) -> Result<(), HookError> {
    current_container()?.effect(
        SlotKind::Effect,
        Box::new(move || effect().into_cleanup()),
        deps,
    )
}

/// Same diffing as [`use_effect`]. Hosts that distinguish the two schedule
/// layout effects before committing output; the runtime treats them alike.
pub fn use_layout_effect<C: IntoCleanup>(
    effect: impl FnOnce() -> C,
    deps: Deps,
) -> Result<(), HookError> {
    current_container()?.effect(
        SlotKind::LayoutEffect,
        Box::new(move || effect().into_cleanup()),
        deps,
    )
}

/// [`use_effect`] that skips the mount run and fires only on genuine
/// dependency changes.
pub fn use_update_effect(effect: impl FnOnce(), deps: Deps) -> Result<(), HookError> {
    let mounted = use_ref(|| false)?;
    use_effect(
        move || {
            if std::mem::replace(&mut *mounted.borrow_mut(), true) {
                effect();
            }
        },
        deps,
    )
}

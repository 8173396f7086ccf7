use std::rc::Rc;

use rehook_core::adapter as hooks;
use rehook_core::{HookError, SetState};

/// Setters returned by [`use_boolean`].
#[derive(Clone)]
pub struct BoolActions {
    set: SetState<bool>,
}

impl BoolActions {
    pub fn set(&self, value: bool) {
        self.set.set(value);
    }

    pub fn set_true(&self) {
        self.set.set(true);
    }

    pub fn set_false(&self) {
        self.set.set(false);
    }

    /// Flips the latest stored value.
    pub fn toggle(&self) {
        self.set.update(|v| !v);
    }
}

pub fn use_boolean(initial: bool) -> Result<(bool, BoolActions), HookError> {
    let (value, set) = hooks::use_state(|| initial)?;
    Ok((value, BoolActions { set }))
}

pub fn use_toggle(initial: bool) -> Result<(bool, Rc<dyn Fn()>), HookError> {
    let (value, actions) = use_boolean(initial)?;
    Ok((value, Rc::new(move || actions.toggle())))
}

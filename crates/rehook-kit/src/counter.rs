use rehook_core::adapter as hooks;
use rehook_core::{HookError, SetState};

/// Setters returned by [`use_counter`]. Steps apply to the latest stored
/// count, so several calls between renders accumulate.
#[derive(Clone)]
pub struct CounterActions {
    set: SetState<i64>,
    initial: i64,
    step: i64,
}

impl CounterActions {
    pub fn inc(&self) {
        let step = self.step;
        self.set.update(|n| n.saturating_add(step));
    }

    pub fn dec(&self) {
        let step = self.step;
        self.set.update(|n| n.saturating_sub(step));
    }

    pub fn reset(&self) {
        self.set.set(self.initial);
    }

    pub fn set(&self, value: i64) {
        self.set.set(value);
    }
}

pub fn use_counter(initial: i64, step: i64) -> Result<(i64, CounterActions), HookError> {
    let (count, set) = hooks::use_state(|| initial)?;
    Ok((
        count,
        CounterActions { set, initial, step },
    ))
}

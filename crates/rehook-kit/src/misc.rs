use rehook_core::adapter as hooks;
use rehook_core::HookError;

/// Keeps returning the stored value while `compare(stored, value)` holds,
/// and adopts `value` once it doesn't. Never requests a rerender.
pub fn use_memo_compare<T: Clone + 'static>(
    value: T,
    compare: impl FnOnce(&T, &T) -> bool,
) -> Result<T, HookError> {
    let stored = hooks::use_ref(|| value.clone())?;
    let same = compare(&stored.borrow(), &value);
    if !same {
        *stored.borrow_mut() = value;
    }
    let current = stored.borrow().clone();
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehook_core::Instance;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn holds_value_within_tolerance() {
        let input = Rc::new(Cell::new(1.0_f64));
        let mut instance = Instance::new({
            let input = input.clone();
            move || use_memo_compare(input.get(), |a, b| (a - b).abs() < 0.5)
        });
        assert_eq!(instance.render().unwrap(), 1.0);
        input.set(1.3);
        assert_eq!(instance.render().unwrap(), 1.0);
        input.set(1.6);
        assert_eq!(instance.render().unwrap(), 1.6);
        assert!(!instance.needs_render());
    }
}

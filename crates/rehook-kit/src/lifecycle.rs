use std::cell::RefCell;
use std::rc::Rc;

use rehook_core::adapter as hooks;
use rehook_core::{Deps, Dispose, HookError, IntoCleanup, deps};

/// Runs `f` once, on the first pass.
pub fn use_mount(f: impl FnOnce()) -> Result<(), HookError> {
    hooks::use_effect(f, deps![])
}

/// Runs `f` once at teardown. The `f` passed on the latest pass is the one
/// that runs.
pub fn use_unmount(f: impl FnOnce() + 'static) -> Result<(), HookError> {
    let latest = hooks::use_ref(|| None::<Box<dyn FnOnce()>>)?;
    *latest.borrow_mut() = Some(Box::new(f));
    hooks::use_effect(
        move || {
            Dispose::new(move || {
                let f = latest.borrow_mut().take();
                if let Some(f) = f {
                    f();
                }
            })
        },
        deps![],
    )
}

/// Same timing as [`use_unmount`]; kept as its own name for hosts that
/// separate "about to unmount" from "unmounted".
pub fn use_before_unmount(f: impl FnOnce() + 'static) -> Result<(), HookError> {
    use_unmount(f)
}

/// Like an effect, but skips the mount run. The callback's cleanup is kept
/// and runs before the next update or at teardown.
pub fn use_did_update<C: IntoCleanup>(
    callback: impl FnOnce() -> C,
    deps: Deps,
) -> Result<(), HookError> {
    let first = hooks::use_ref(|| true)?;
    hooks::use_effect(
        move || {
            if std::mem::replace(&mut *first.borrow_mut(), false) {
                return None;
            }
            callback().into_cleanup()
        },
        deps,
    )
}

/// Runs `f` once, as a layout effect.
pub fn use_layout_mount(f: impl FnOnce()) -> Result<(), HookError> {
    hooks::use_layout_effect(f, deps![])
}

/// Predicate that is `true` between mount and teardown.
pub fn use_is_mounted() -> Result<Rc<dyn Fn() -> bool>, HookError> {
    let mounted = hooks::use_ref(|| false)?;
    let flag: Rc<RefCell<bool>> = mounted.clone();
    hooks::use_effect(
        move || {
            *flag.borrow_mut() = true;
            Dispose::new(move || *flag.borrow_mut() = false)
        },
        deps![],
    )?;
    Ok(Rc::new(move || *mounted.borrow()))
}

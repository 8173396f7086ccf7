//! Where detached futures go.
//!
//! The runtime never owns an executor. Hosts install one with
//! [`set_local_spawner`] (a `futures::executor::LocalPool` spawner, a
//! `wasm-bindgen-futures` shim, ...). Hooks that need to start work outside
//! a caller's `.await`, such as an immediate async run on mount, go through
//! [`spawn_local`].

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawn, LocalSpawnExt};

thread_local! {
    static SPAWNER: RefCell<Option<Rc<dyn LocalSpawn>>> = const { RefCell::new(None) };
}

/// Installs the spawner for this thread, returning the previous one.
pub fn set_local_spawner(spawner: impl LocalSpawn + 'static) -> Option<Rc<dyn LocalSpawn>> {
    SPAWNER.with(|s| s.borrow_mut().replace(Rc::new(spawner)))
}

pub fn clear_local_spawner() -> Option<Rc<dyn LocalSpawn>> {
    SPAWNER.with(|s| s.borrow_mut().take())
}

pub fn has_local_spawner() -> bool {
    SPAWNER.with(|s| s.borrow().is_some())
}

/// Spawns `future` on the installed spawner. Returns `false` (and drops the
/// future) when none is installed or the spawner refused it.
pub fn spawn_local(future: LocalBoxFuture<'static, ()>) -> bool {
    let Some(spawner) = SPAWNER.with(|s| s.borrow().clone()) else {
        log::warn!("no local spawner installed; detached future dropped");
        return false;
    };
    match spawner.spawn_local(future) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("local spawner refused future: {err}");
            false
        }
    }
}

use std::rc::Rc;

use rehook_core::adapter as hooks;
use rehook_core::{Dispose, HookError, Identity, deps};

/// Registers a change listener with an external store and returns the
/// handle that unregisters it.
pub type Subscribe = Rc<dyn Fn(Rc<dyn Fn()>) -> Dispose>;

/// Reads the store's current snapshot.
pub type GetSnapshot<S> = Rc<dyn Fn() -> S>;

/// Mirrors an external store into hook state.
///
/// Subscribes on mount and whenever `subscribe` or `get_snapshot` changes
/// identity; each notification re-reads the snapshot, and an equal snapshot
/// requests nothing. A change that lands between the first render and the
/// subscription is picked up right after subscribing.
pub fn use_sync_external_store<S: Clone + PartialEq + 'static>(
    subscribe: Subscribe,
    get_snapshot: GetSnapshot<S>,
) -> Result<S, HookError> {
    sync_store(subscribe, get_snapshot, None)
}

/// [`use_sync_external_store`] whose first value comes from
/// `get_server_snapshot` instead of the live store.
pub fn use_sync_external_store_with_server<S: Clone + PartialEq + 'static>(
    subscribe: Subscribe,
    get_snapshot: GetSnapshot<S>,
    get_server_snapshot: GetSnapshot<S>,
) -> Result<S, HookError> {
    sync_store(subscribe, get_snapshot, Some(get_server_snapshot))
}

fn sync_store<S: Clone + PartialEq + 'static>(
    subscribe: Subscribe,
    get_snapshot: GetSnapshot<S>,
    get_server_snapshot: Option<GetSnapshot<S>>,
) -> Result<S, HookError> {
    let (state, set) = hooks::use_state(|| match &get_server_snapshot {
        Some(server) => server(),
        None => get_snapshot(),
    })?;
    let deps = deps![Identity::of(&subscribe), Identity::of(&get_snapshot)];
    hooks::use_effect(
        move || {
            let on_change: Rc<dyn Fn()> = {
                let (set, get_snapshot) = (set.clone(), get_snapshot.clone());
                Rc::new(move || set.set(get_snapshot()))
            };
            let unsubscribe = subscribe(on_change);
            set.set(get_snapshot());
            unsubscribe
        },
        deps,
    )?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehook_core::{EventBus, Instance};
    use std::cell::Cell;

    struct Store {
        value: Cell<i32>,
        changed: EventBus<()>,
    }

    impl Store {
        fn set(&self, v: i32) {
            self.value.set(v);
            self.changed.emit("change", &());
        }
    }

    fn hooks_for(store: &Rc<Store>) -> (Subscribe, GetSnapshot<i32>) {
        let bus = store.changed.clone();
        let subscribe: Subscribe = Rc::new(move |on_change: Rc<dyn Fn()>| {
            bus.subscribe("change", Rc::new(move |_: &()| on_change()))
        });
        let store = store.clone();
        let get: GetSnapshot<i32> = Rc::new(move || store.value.get());
        (subscribe, get)
    }

    #[test]
    fn follows_store_and_unsubscribes() {
        let store = Rc::new(Store {
            value: Cell::new(1),
            changed: EventBus::new(),
        });
        let (subscribe, get) = hooks_for(&store);
        let mut instance =
            Instance::new(move || use_sync_external_store(subscribe.clone(), get.clone()));
        assert_eq!(instance.render().unwrap(), 1);
        assert_eq!(store.changed.listener_count("change"), 1);

        store.set(5);
        assert_eq!(instance.flush().unwrap(), Some(5));
        store.set(5);
        assert!(!instance.needs_render());

        instance.teardown();
        assert_eq!(store.changed.listener_count("change"), 0);
    }

    #[test]
    fn server_snapshot_seeds_then_syncs() {
        let store = Rc::new(Store {
            value: Cell::new(7),
            changed: EventBus::new(),
        });
        let (subscribe, get) = hooks_for(&store);
        let server: GetSnapshot<i32> = Rc::new(|| 0);
        let mut instance = Instance::new(move || {
            use_sync_external_store_with_server(subscribe.clone(), get.clone(), server.clone())
        });
        assert_eq!(instance.render().unwrap(), 0);
        assert_eq!(instance.flush().unwrap(), Some(7));
    }
}

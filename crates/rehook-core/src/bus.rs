use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use slotmap::SlotMap;

use crate::effects::Dispose;

slotmap::new_key_type! {
    /// Handle returned by [`EventBus::on`]; pass it to [`EventBus::off`].
    pub struct ListenerId;
}

/// Named-event publish/subscribe channel.
///
/// Emission is synchronous: every listener registered for the event at the
/// time of the call has run before `emit` returns. Listeners may subscribe or
/// unsubscribe from inside a handler; such changes apply to the next emit.
pub struct EventBus<P: 'static> {
    inner: Rc<RefCell<BusInner<P>>>,
}

struct BusInner<P> {
    listeners: SlotMap<ListenerId, Listener<P>>,
    by_event: HashMap<String, Vec<ListenerId>>,
}

struct Listener<P> {
    event: String,
    handler: Rc<dyn Fn(&P)>,
}

impl<P: 'static> EventBus<P> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                listeners: SlotMap::with_key(),
                by_event: HashMap::new(),
            })),
        }
    }

    pub fn on(&self, event: &str, handler: impl Fn(&P) + 'static) -> ListenerId {
        self.on_rc(event, Rc::new(handler))
    }

    pub fn on_rc(&self, event: &str, handler: Rc<dyn Fn(&P)>) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.listeners.insert(Listener {
            event: event.to_string(),
            handler,
        });
        inner.by_event.entry(event.to_string()).or_default().push(id);
        id
    }

    /// Removes a listener; `false` if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(listener) = inner.listeners.remove(id) else {
            return false;
        };
        if let Some(ids) = inner.by_event.get_mut(&listener.event) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                inner.by_event.remove(&listener.event);
            }
        }
        true
    }

    /// Subscribes and returns the matching unsubscribe as a cleanup.
    pub fn subscribe(&self, event: &str, handler: Rc<dyn Fn(&P)>) -> Dispose {
        let id = self.on_rc(event, handler);
        let bus = self.clone();
        Dispose::new(move || {
            bus.off(id);
        })
    }

    /// Delivers `payload` to the listeners of `event` in subscription order.
    /// Returns how many listeners ran.
    pub fn emit(&self, event: &str, payload: &P) -> usize {
        let handlers: Vec<Rc<dyn Fn(&P)>> = {
            let inner = self.inner.borrow();
            inner
                .by_event
                .get(event)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| inner.listeners.get(*id))
                        .map(|l| l.handler.clone())
                        .collect()
                })
                .unwrap_or_default()
        };
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .borrow()
            .by_event
            .get(event)
            .map_or(0, |ids| ids.len())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<P: 'static> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> Clone for EventBus<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Buses compare by identity, so they can sit in a dependency list.
impl<P: 'static> PartialEq for EventBus<P> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<P: 'static> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("listeners", &inner.listeners.len())
            .field("events", &inner.by_event.len())
            .finish()
    }
}

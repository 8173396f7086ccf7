use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bus::EventBus;
use crate::effects::use_effect;
use crate::runtime::current_container;
use crate::slot::{ErasedInit, SlotKind, downcast_slot};
use crate::{HookError, deps};

/// Event emitted on a context's own bus by every provide.
pub const UPDATE_EVENT: &str = "update";

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "context-{}", self.0)
    }
}

/// Transforms applied when a context value is written and read.
pub trait ContextProxy<T> {
    /// Value actually stored when a provider writes `new` over `old`.
    fn set(&self, old: &T, new: T) -> T {
        let _ = old;
        new
    }

    /// Value handed to a subscriber reading `stored`.
    fn get(&self, stored: &T) -> T
    where
        T: Clone,
    {
        stored.clone()
    }
}

/// Content rendered under a provider: already built, or built on demand.
pub enum Children<R> {
    Ready(R),
    Deferred(Box<dyn FnOnce() -> R>),
}

impl<R> Children<R> {
    pub fn deferred(f: impl FnOnce() -> R + 'static) -> Self {
        Children::Deferred(Box::new(f))
    }

    pub fn resolve(self) -> R {
        match self {
            Children::Ready(r) => r,
            Children::Deferred(f) => f(),
        }
    }
}

impl<R> From<R> for Children<R> {
    fn from(r: R) -> Self {
        Children::Ready(r)
    }
}

/// Props form of the provider call.
pub struct ProviderProps<T, R> {
    pub value: T,
    pub children: Children<R>,
}

/// Shared value plus a dedicated update bus.
///
/// Subscribers keep their own cached copy, refreshed only by provider
/// writes to *this* context; two contexts never see each other's updates.
pub struct Context<T: 'static> {
    inner: Rc<ContextInner<T>>,
}

struct ContextInner<T: 'static> {
    id: ContextId,
    current: RefCell<T>,
    bus: EventBus<T>,
    proxy: Option<Rc<dyn ContextProxy<T>>>,
}

pub fn create_context<T: Clone + 'static>(default_value: T) -> Context<T> {
    Context::build(default_value, None)
}

pub fn create_context_with_proxy<T: Clone + 'static>(
    default_value: T,
    proxy: impl ContextProxy<T> + 'static,
) -> Context<T> {
    Context::build(default_value, Some(Rc::new(proxy)))
}

impl<T: Clone + 'static> Context<T> {
    fn build(default_value: T, proxy: Option<Rc<dyn ContextProxy<T>>>) -> Self {
        let id = ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
        log::trace!("created {id}");
        Self {
            inner: Rc::new(ContextInner {
                id,
                current: RefCell::new(default_value),
                bus: EventBus::new(),
                proxy,
            }),
        }
    }

    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// The stored value (after any proxy write transform).
    pub fn current(&self) -> T {
        self.inner.current.borrow().clone()
    }

    pub fn bus(&self) -> &EventBus<T> {
        &self.inner.bus
    }

    /// Stores `value` and notifies every subscriber before returning.
    pub fn provide(&self, value: T) {
        let stored = match &self.inner.proxy {
            Some(proxy) => proxy.set(&self.inner.current.borrow(), value),
            None => value,
        };
        *self.inner.current.borrow_mut() = stored.clone();
        let delivered = self.inner.bus.emit(UPDATE_EVENT, &stored);
        log::trace!("{} updated, {delivered} subscribers notified", self.inner.id);
    }

    /// `provider(value)(children)` form.
    pub fn provider<R>(&self, value: T) -> impl FnOnce(Children<R>) -> R + use<T, R> {
        self.provide(value);
        |children: Children<R>| children.resolve()
    }

    /// `provider(ProviderProps { value, children })` form.
    pub fn provider_props<R>(&self, props: ProviderProps<T, R>) -> R {
        self.provide(props.value);
        props.children.resolve()
    }

    fn read(&self, stored: &T) -> T {
        match &self.inner.proxy {
            Some(proxy) => proxy.get(stored),
            None => stored.clone(),
        }
    }
}

impl<T: 'static> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> PartialEq for Context<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.inner.id)
            .field("proxy", &self.inner.proxy.is_some())
            .finish()
    }
}

/// Reads `context` through this instance's cached copy.
///
/// The copy is seeded from the context's current value on the first pass and
/// afterwards changes only when a provider writes to the context, which also
/// requests a rerender of this instance.
pub fn use_context<T: Clone + 'static>(context: &Context<T>) -> Result<T, HookError> {
    let container = current_container()?;
    let cached = container.cell(
        SlotKind::Context,
        ErasedInit::new(|| RefCell::new(context.current())),
    )?;
    let cached = downcast_slot::<RefCell<T>>(cached)?;

    let bus = context.bus().clone();
    let sink = cached.clone();
    let rerender = container.rerender_handle();
    use_effect(
        move || {
            bus.subscribe(
                UPDATE_EVENT,
                Rc::new(move |value: &T| {
                    *sink.borrow_mut() = value.clone();
                    rerender.request();
                }),
            )
        },
        deps![],
    )?;

    let stored = cached.borrow().clone();
    Ok(context.read(&stored))
}

/// Event bus private to the calling instance, built once.
pub fn use_event_bus<P: 'static>() -> Result<EventBus<P>, HookError> {
    let bus = crate::state::use_ref(EventBus::<P>::new)?;
    let bus = bus.borrow().clone();
    Ok(bus)
}

/// Subscribes `handler` to `event` on `bus` while mounted. Re-subscribes when
/// the bus, the event name or the handler's identity changes.
pub fn use_emitter<P: 'static>(
    bus: &EventBus<P>,
    event: &str,
    handler: Rc<dyn Fn(&P)>,
) -> Result<(), HookError> {
    let deps = deps![
        bus.clone(),
        event.to_string(),
        crate::Identity::of(&handler)
    ];
    let bus = bus.clone();
    let event = event.to_string();
    use_effect(move || bus.subscribe(&event, handler), deps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Instance;
    use std::cell::Cell;

    #[test]
    fn provider_forms_update_current_value() {
        let ctx = create_context(1);
        let out = ctx.provider(2)(Children::from("a"));
        assert_eq!(out, "a");
        assert_eq!(ctx.current(), 2);

        let out = ctx.provider_props(ProviderProps {
            value: 3,
            children: Children::deferred(|| "b"),
        });
        assert_eq!(out, "b");
        assert_eq!(ctx.current(), 3);
    }

    #[test]
    fn ids_are_unique() {
        let a = create_context(());
        let b = create_context(());
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn subscriber_caches_until_provider_writes() {
        let ctx = create_context(String::from("light"));
        let mut instance = Instance::new({
            let ctx = ctx.clone();
            move || use_context(&ctx)
        });
        assert_eq!(instance.render().unwrap(), "light");
        assert_eq!(ctx.bus().listener_count(UPDATE_EVENT), 1);

        ctx.provide(String::from("dark"));
        assert!(instance.needs_render());
        assert_eq!(instance.flush().unwrap().as_deref(), Some("dark"));

        instance.teardown();
        assert_eq!(ctx.bus().listener_count(UPDATE_EVENT), 0);
    }

    struct Clamp;

    impl ContextProxy<i32> for Clamp {
        fn set(&self, _old: &i32, new: i32) -> i32 {
            new.clamp(0, 10)
        }

        fn get(&self, stored: &i32) -> i32 {
            stored * 100
        }
    }

    #[test]
    fn proxy_transforms_writes_and_reads() {
        let ctx = create_context_with_proxy(1, Clamp);
        let mut instance = Instance::new({
            let ctx = ctx.clone();
            move || use_context(&ctx)
        });
        assert_eq!(instance.render().unwrap(), 100);
        ctx.provide(42);
        assert_eq!(ctx.current(), 10);
        assert_eq!(instance.render().unwrap(), 1000);
    }

    #[test]
    fn emitter_resubscribes_on_handler_identity() {
        let bus = EventBus::<i32>::new();
        let total = Rc::new(Cell::new(0));
        let generation = Rc::new(Cell::new(0));
        let mut instance = Instance::new({
            let bus = bus.clone();
            let total = total.clone();
            let generation = generation.clone();
            let mut handler: Option<(u32, Rc<dyn Fn(&i32)>)> = None;
            move || {
                let g = generation.get();
                let h = match &handler {
                    Some((hg, h)) if *hg == g => h.clone(),
                    _ => {
                        let total = total.clone();
                        let h: Rc<dyn Fn(&i32)> = Rc::new(move |v| total.set(total.get() + v));
                        handler = Some((g, h.clone()));
                        h
                    }
                };
                use_emitter(&bus, "n", h)
            }
        });

        instance.render().unwrap();
        instance.render().unwrap();
        assert_eq!(bus.listener_count("n"), 1);
        bus.emit("n", &2);
        assert_eq!(total.get(), 2);

        generation.set(1);
        instance.render().unwrap();
        assert_eq!(bus.listener_count("n"), 1);
        bus.emit("n", &3);
        assert_eq!(total.get(), 5);
    }

    #[test]
    fn event_bus_is_private_and_stable() {
        let mut a = Instance::new(use_event_bus::<()>);
        let mut b = Instance::new(use_event_bus::<()>);
        let a1 = a.render().unwrap();
        let a2 = a.render().unwrap();
        let b1 = b.render().unwrap();
        assert!(a1.ptr_eq(&a2));
        assert!(!a1.ptr_eq(&b1));
    }
}

//! Reference host loop.
//!
//! An [`Instance`] owns one container and one render function and plays the
//! host's part of the contract: it activates the container around every pass,
//! coalesces rerender requests into a dirty flag, runs adoption callbacks and
//! flushes cleanups exactly once at teardown. Embedding hosts with their own
//! scheduling can drive a [`Container`] directly instead.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, join_all};

use crate::runtime::{Container, current_container};
use crate::slot::{ErasedInit, SlotKind, downcast_slot};
use crate::HookError;

/// Callback run when the host transplants an instance. The tag decides how
/// it is scheduled: every `Async` callback is awaited concurrently, then the
/// `Sync` ones run in registration order.
pub enum AdoptedCallback {
    Sync(Box<dyn FnMut()>),
    Async(Box<dyn FnMut() -> LocalBoxFuture<'static, ()>>),
}

impl AdoptedCallback {
    pub fn sync(f: impl FnMut() + 'static) -> Self {
        AdoptedCallback::Sync(Box::new(f))
    }

    pub fn asynchronous<Fut>(mut f: impl FnMut() -> Fut + 'static) -> Self
    where
        Fut: Future<Output = ()> + 'static,
    {
        AdoptedCallback::Async(Box::new(move || f().boxed_local()))
    }
}

impl fmt::Debug for AdoptedCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdoptedCallback::Sync(_) => f.write_str("AdoptedCallback::Sync"),
            AdoptedCallback::Async(_) => f.write_str("AdoptedCallback::Async"),
        }
    }
}

type AdoptedSlot = RefCell<Option<AdoptedCallback>>;

/// Calls `f` with the callback taken out of `slot`, so the callback may
/// re-render its own instance. A callback stored meanwhile wins.
fn with_taken<T>(
    slot: &AdoptedSlot,
    f: impl FnOnce(&mut AdoptedCallback) -> Option<T>,
) -> Option<T> {
    let mut callback = slot.borrow_mut().take()?;
    let out = f(&mut callback);
    let mut stored = slot.borrow_mut();
    if stored.is_none() {
        *stored = Some(callback);
    }
    out
}

/// Registers `callback` to run on adoption. Takes one slot; the callback
/// passed on the latest pass is the one that runs.
pub fn on_adopted(callback: AdoptedCallback) -> Result<(), HookError> {
    let mut callback = Some(callback);
    let slot = current_container()?.cell(
        SlotKind::Adopted,
        ErasedInit::new(|| RefCell::new(callback.take())),
    )?;
    if let Some(latest) = callback {
        *downcast_slot::<AdoptedSlot>(slot)?.borrow_mut() = Some(latest);
    }
    Ok(())
}

/// One independently rendering hook instance.
pub struct Instance<R> {
    container: Container,
    render_fn: Box<dyn FnMut() -> Result<R, HookError>>,
    dirty: Rc<Cell<bool>>,
    requests: Rc<Cell<u64>>,
    adopted: Rc<RefCell<Vec<Rc<AdoptedSlot>>>>,
}

impl<R> Instance<R> {
    pub fn new(render_fn: impl FnMut() -> Result<R, HookError> + 'static) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let requests = Rc::new(Cell::new(0));
        let container = Container::new({
            let dirty = dirty.clone();
            let requests = requests.clone();
            move || {
                dirty.set(true);
                requests.set(requests.get() + 1);
            }
        });
        Self {
            container,
            render_fn: Box::new(render_fn),
            dirty,
            requests,
            adopted: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Runs one render pass unconditionally.
    ///
    /// Requests made while the pass runs mark the instance dirty again, so
    /// a following [`flush`](Self::flush) picks them up.
    pub fn render(&mut self) -> Result<R, HookError> {
        self.dirty.set(false);
        let render_fn = &mut self.render_fn;
        self.container.render(|| render_fn())
    }

    /// Renders only if a rerender was requested since the last pass.
    pub fn flush(&mut self) -> Result<Option<R>, HookError> {
        if !self.needs_render() || self.container.is_torn_down() {
            return Ok(None);
        }
        self.render().map(Some)
    }

    pub fn needs_render(&self) -> bool {
        self.dirty.get()
    }

    /// Rerender requests received so far, before coalescing.
    pub fn rerender_requests(&self) -> u64 {
        self.requests.get()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Registers an adoption callback from outside any render pass.
    pub fn add_adopted(&self, callback: AdoptedCallback) {
        self.adopted
            .borrow_mut()
            .push(Rc::new(RefCell::new(Some(callback))));
    }

    /// Runs the adoption callbacks: async ones concurrently, then sync ones
    /// in registration order, then one rerender request.
    pub fn adopt(&self) -> LocalBoxFuture<'static, ()> {
        let mut registered: Vec<Rc<AdoptedSlot>> = self
            .container
            .cells_of(SlotKind::Adopted)
            .into_iter()
            .filter_map(|cell| downcast_slot::<AdoptedSlot>(cell).ok())
            .collect();
        registered.extend(self.adopted.borrow().iter().cloned());
        let rerender = self.container.rerender_handle();

        async move {
            let pending: Vec<_> = registered
                .iter()
                .filter_map(|slot| {
                    with_taken(slot, |callback| match callback {
                        AdoptedCallback::Async(f) => Some(f()),
                        AdoptedCallback::Sync(_) => None,
                    })
                })
                .collect();
            log::debug!(
                "adopting: {} async, {} total callbacks",
                pending.len(),
                registered.len()
            );
            join_all(pending).await;
            for slot in &registered {
                with_taken(slot, |callback| match callback {
                    AdoptedCallback::Sync(f) => Some(f()),
                    AdoptedCallback::Async(_) => None,
                });
            }
            rerender.request();
        }
        .boxed_local()
    }

    /// Flushes every cleanup in slot order. Later calls do nothing.
    pub fn teardown(&self) {
        self.container.teardown();
    }
}

impl<R> Drop for Instance<R> {
    fn drop(&mut self) {
        self.container.teardown();
    }
}

impl<R> fmt::Debug for Instance<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("container", &self.container)
            .field("dirty", &self.dirty.get())
            .field("requests", &self.requests.get())
            .finish()
    }
}

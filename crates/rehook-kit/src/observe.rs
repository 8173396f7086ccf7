//! Observer hooks over host-provided targets.
//!
//! A target is anything implementing [`Observe`]: it accepts a callback and
//! hands back the [`Dispose`] that disconnects it. Hosts wrap their own
//! visibility or layout notifications this way; [`Observable`] is a ready-made
//! target that the host feeds by hand.

use std::rc::Rc;

use rehook_core::adapter as hooks;
use rehook_core::{Dispose, EventBus, HookError, Identity, deps};

const ENTRY_EVENT: &str = "entry";

pub trait Observe {
    type Entry: 'static;

    fn observe(&self, callback: Rc<dyn Fn(&Self::Entry)>) -> Dispose;
}

/// Target whose entries are pushed with [`notify`](Observable::notify).
pub struct Observable<E: 'static> {
    bus: EventBus<E>,
}

impl<E: 'static> Observable<E> {
    pub fn new() -> Self {
        Self { bus: EventBus::new() }
    }

    /// Delivers `entry` to every connected observer; returns how many.
    pub fn notify(&self, entry: &E) -> usize {
        self.bus.emit(ENTRY_EVENT, entry)
    }

    pub fn observer_count(&self) -> usize {
        self.bus.listener_count(ENTRY_EVENT)
    }
}

impl<E: 'static> Default for Observable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Observe for Observable<E> {
    type Entry = E;

    fn observe(&self, callback: Rc<dyn Fn(&E)>) -> Dispose {
        self.bus.subscribe(ENTRY_EVENT, callback)
    }
}

fn target_dep<O: ?Sized + 'static>(target: &Option<Rc<O>>) -> Option<Identity<O>> {
    target.as_ref().map(Identity::of)
}

/// Connects `callback` to `target` while mounted. Reconnects when either
/// changes identity; a `None` target observes nothing.
pub fn use_observer<O>(
    target: Option<Rc<O>>,
    callback: Rc<dyn Fn(&O::Entry)>,
) -> Result<(), HookError>
where
    O: Observe + ?Sized + 'static,
{
    let deps = deps![target_dep(&target), Identity::of(&callback)];
    hooks::use_effect(move || target.map(|target| target.observe(callback)), deps)
}

/// Visibility entry reported by a viewport target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Intersection {
    pub is_intersecting: bool,
    pub ratio: f32,
}

/// Whether `target` last reported itself inside the viewport. `false` until
/// the first entry arrives.
pub fn use_in_viewport<O>(target: Option<Rc<O>>) -> Result<bool, HookError>
where
    O: Observe<Entry = Intersection> + ?Sized + 'static,
{
    let (in_view, set) = hooks::use_state(|| false)?;
    let deps = deps![target_dep(&target)];
    hooks::use_effect(
        move || {
            target.map(|target| {
                target.observe(Rc::new(move |entry: &Intersection| set.set(entry.is_intersecting)))
            })
        },
        deps,
    )?;
    Ok(in_view)
}

/// Size entry reported by a resize target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResizeEntry {
    pub width: f32,
    pub height: f32,
}

pub fn use_resize_observer<O>(
    target: Option<Rc<O>>,
    callback: Rc<dyn Fn(&ResizeEntry)>,
) -> Result<(), HookError>
where
    O: Observe<Entry = ResizeEntry> + ?Sized + 'static,
{
    use_observer(target, callback)
}

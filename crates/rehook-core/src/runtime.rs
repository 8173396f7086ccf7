use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::deps::{Deps, deps_changed};
use crate::effects::Dispose;
use crate::slot::{ErasedInit, Slot, SlotData, SlotKind};
use crate::HookError;

thread_local! {
    static ACTIVE: RefCell<Option<Container>> = const { RefCell::new(None) };
}

/// Per-instance slot store.
///
/// Slots are addressed by call position: the Nth hook call of a render pass
/// always refers to the Nth slot. The first completed pass fixes the number
/// of hooks; any later pass that calls more, fewer, or differently-kinded
/// hooks fails with a [`HookError`] instead of handing out a neighbour's slot.
///
/// `Container` is a cheap handle; clones share the same slots.
#[derive(Clone)]
pub struct Container {
    inner: Rc<ContainerInner>,
}

struct ContainerInner {
    slots: RefCell<Vec<Slot>>,
    cursor: Cell<usize>,
    committed: Cell<Option<usize>>,
    passes: Cell<u64>,
    torn_down: Cell<bool>,
    request_rerender: Rc<dyn Fn()>,
}

/// Asks the host for one more render pass of the container it came from.
///
/// Holds the container weakly; requests after teardown are dropped.
#[derive(Clone)]
pub struct Rerender(Rc<dyn Fn()>);

impl Rerender {
    pub fn new(request: impl Fn() + 'static) -> Self {
        Self(Rc::new(request))
    }

    pub fn request(&self) {
        (self.0)()
    }
}

impl fmt::Debug for Rerender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rerender")
    }
}

enum Claim {
    Existing(usize),
    Fresh(usize),
}

impl Container {
    pub fn new(request_rerender: impl Fn() + 'static) -> Self {
        Self {
            inner: Rc::new(ContainerInner {
                slots: RefCell::new(Vec::new()),
                cursor: Cell::new(0),
                committed: Cell::new(None),
                passes: Cell::new(0),
                torn_down: Cell::new(false),
                request_rerender: Rc::new(request_rerender),
            }),
        }
    }

    pub fn rerender_handle(&self) -> Rerender {
        let weak = Rc::downgrade(&self.inner);
        Rerender::new(move || {
            if let Some(inner) = weak.upgrade()
                && !inner.torn_down.get()
            {
                (inner.request_rerender)();
            }
        })
    }

    /// Rewinds the cursor; called once at the start of every render pass.
    pub fn reset_cursor(&self) {
        self.inner.cursor.set(0);
        let pass = self.inner.passes.get() + 1;
        self.inner.passes.set(pass);
        log::trace!("render pass {pass} begins");
    }

    /// Closes a render pass, checking that it called as many hooks as the
    /// first one did.
    pub fn finish_pass(&self) -> Result<(), HookError> {
        let actual = self.inner.cursor.get();
        match self.inner.committed.get() {
            None => {
                self.inner.committed.set(Some(actual));
                Ok(())
            }
            Some(expected) if expected == actual => Ok(()),
            Some(expected) => {
                log::warn!(
                    "render pass {} called {actual} hooks, expected {expected}",
                    self.inner.passes.get()
                );
                Err(HookError::HookCountChanged { expected, actual })
            }
        }
    }

    /// One complete render pass: activate, reset the cursor, run `f`, verify
    /// the hook count.
    pub fn render<R>(&self, f: impl FnOnce() -> Result<R, HookError>) -> Result<R, HookError> {
        with_active_container(self, || {
            self.reset_cursor();
            let output = f()?;
            self.finish_pass()?;
            log::trace!("render pass {} complete", self.inner.passes.get());
            Ok(output)
        })
    }

    /// Runs every stored cleanup in ascending slot order, exactly once.
    pub fn teardown(&self) {
        if self.inner.torn_down.replace(true) {
            return;
        }
        let cleanups: Vec<Dispose> = self
            .inner
            .slots
            .borrow_mut()
            .iter_mut()
            .filter_map(|slot| match &mut slot.data {
                SlotData::Effect { cleanup, .. } => cleanup.take(),
                _ => None,
            })
            .collect();
        log::debug!("container teardown: {} cleanups", cleanups.len());
        for cleanup in cleanups {
            cleanup.run();
        }
        let slots = std::mem::take(&mut *self.inner.slots.borrow_mut());
        drop(slots);
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.get()
    }

    /// `true` once a render pass has completed.
    pub fn is_mounted(&self) -> bool {
        self.inner.committed.get().is_some() && !self.is_torn_down()
    }

    pub fn cursor(&self) -> usize {
        self.inner.cursor.get()
    }

    pub fn slot_count(&self) -> usize {
        self.inner.slots.borrow().len()
    }

    pub fn passes(&self) -> u64 {
        self.inner.passes.get()
    }

    pub fn ptr_eq(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn claim(
        &self,
        kind: SlotKind,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Claim, HookError> {
        let inner = &self.inner;
        if inner.torn_down.get() {
            return Err(HookError::TornDown);
        }
        let index = inner.cursor.get();
        inner.cursor.set(index + 1);

        let slots = inner.slots.borrow();
        match slots.get(index) {
            Some(slot) if slot.kind != kind => {
                log::warn!(
                    "slot {index}: {kind} hook called where a {} hook ran before",
                    slot.kind
                );
                Err(HookError::SlotMisaligned {
                    index,
                    expected: kind,
                    found: slot.kind,
                })
            }
            Some(slot) if slot.type_id != type_id => Err(HookError::SlotTypeMismatch {
                index,
                expected: type_name,
                found: slot.type_name,
            }),
            Some(_) => Ok(Claim::Existing(index)),
            None => match inner.committed.get() {
                Some(expected) => Err(count_changed(expected, index + 1)),
                None => Ok(Claim::Fresh(index)),
            },
        }
    }

    fn install(&self, index: usize, slot: Slot) -> Result<(), HookError> {
        let mut slots = self.inner.slots.borrow_mut();
        if slots.len() != index {
            return Err(HookError::SlotMisaligned {
                index,
                expected: slot.kind,
                found: slots.get(index).map_or(slot.kind, |s| s.kind),
            });
        }
        slots.push(slot);
        Ok(())
    }

    /// Persistent cell slot: built from `init` on the first pass, returned
    /// as-is afterwards.
    pub(crate) fn cell(
        &self,
        kind: SlotKind,
        init: ErasedInit<'_>,
    ) -> Result<Rc<dyn Any>, HookError> {
        let (type_id, type_name) = (init.type_id, init.type_name);
        match self.claim(kind, type_id, type_name)? {
            Claim::Existing(index) => match &self.inner.slots.borrow()[index].data {
                SlotData::Cell(value) => Ok(value.clone()),
                _ => Err(HookError::SlotMisaligned {
                    index,
                    expected: kind,
                    found: kind,
                }),
            },
            Claim::Fresh(index) => {
                let value = init.build();
                self.install(
                    index,
                    Slot {
                        kind,
                        type_id,
                        type_name,
                        data: SlotData::Cell(value.clone()),
                    },
                )?;
                Ok(value)
            }
        }
    }

    /// Dependency-diffed effect slot. `run` is invoked on the first pass and
    /// whenever a non-empty `deps` differs from the previous list, after the
    /// previous cleanup.
    pub(crate) fn effect(
        &self,
        kind: SlotKind,
        run: Box<dyn FnOnce() -> Option<Dispose> + '_>,
        deps: Deps,
    ) -> Result<(), HookError> {
        match self.claim(kind, TypeId::of::<Dispose>(), "effect")? {
            Claim::Fresh(index) => {
                let cleanup = run();
                if self.is_torn_down() {
                    if let Some(cleanup) = cleanup {
                        cleanup.run();
                    }
                    return Ok(());
                }
                self.install(
                    index,
                    Slot {
                        kind,
                        type_id: TypeId::of::<Dispose>(),
                        type_name: "effect",
                        data: SlotData::Effect { deps, cleanup },
                    },
                )
            }
            Claim::Existing(index) => {
                let stale = {
                    let mut slots = self.inner.slots.borrow_mut();
                    let SlotData::Effect { deps: prev, cleanup } = &mut slots[index].data else {
                        return Err(HookError::SlotMisaligned {
                            index,
                            expected: kind,
                            found: kind,
                        });
                    };
                    if deps.is_empty() || !deps_changed(prev, &deps) {
                        return Ok(());
                    }
                    cleanup.take()
                };
                if let Some(stale) = stale {
                    stale.run();
                }
                let cleanup = run();
                let orphaned = {
                    let mut slots = self.inner.slots.borrow_mut();
                    match slots.get_mut(index).map(|slot| &mut slot.data) {
                        Some(SlotData::Effect {
                            deps: prev,
                            cleanup: stored,
                        }) => {
                            *prev = deps;
                            *stored = cleanup;
                            None
                        }
                        _ => cleanup,
                    }
                };
                // container was torn down while the effect ran
                if let Some(orphaned) = orphaned {
                    orphaned.run();
                }
                Ok(())
            }
        }
    }

    /// Dependency-diffed cached value.
    pub(crate) fn memo(&self, init: ErasedInit<'_>, deps: Deps) -> Result<Rc<dyn Any>, HookError> {
        let (type_id, type_name) = (init.type_id, init.type_name);
        match self.claim(SlotKind::Memo, type_id, type_name)? {
            Claim::Fresh(index) => {
                let value = init.build();
                self.install(
                    index,
                    Slot {
                        kind: SlotKind::Memo,
                        type_id,
                        type_name,
                        data: SlotData::Memo {
                            deps,
                            value: value.clone(),
                        },
                    },
                )?;
                Ok(value)
            }
            Claim::Existing(index) => {
                {
                    let slots = self.inner.slots.borrow();
                    let SlotData::Memo { deps: prev, value } = &slots[index].data else {
                        return Err(HookError::SlotMisaligned {
                            index,
                            expected: SlotKind::Memo,
                            found: slots[index].kind,
                        });
                    };
                    if deps.is_empty() || !deps_changed(prev, &deps) {
                        return Ok(value.clone());
                    }
                }
                let value = init.build();
                if let Some(SlotData::Memo {
                    deps: prev,
                    value: cached,
                }) = self
                    .inner
                    .slots
                    .borrow_mut()
                    .get_mut(index)
                    .map(|slot| &mut slot.data)
                {
                    *prev = deps;
                    *cached = value.clone();
                }
                Ok(value)
            }
        }
    }

    /// Payloads of every cell slot of `kind`, in slot order.
    pub(crate) fn cells_of(&self, kind: SlotKind) -> Vec<Rc<dyn Any>> {
        self.inner
            .slots
            .borrow()
            .iter()
            .filter(|slot| slot.kind == kind)
            .filter_map(|slot| match &slot.data {
                SlotData::Cell(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }
}

fn count_changed(expected: usize, actual: usize) -> HookError {
    log::warn!("render pass called at least {actual} hooks, expected {expected}");
    HookError::HookCountChanged { expected, actual }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<SlotKind> = self.inner.slots.borrow().iter().map(|s| s.kind).collect();
        f.debug_struct("Container")
            .field("slots", &kinds)
            .field("cursor", &self.inner.cursor.get())
            .field("passes", &self.inner.passes.get())
            .field("torn_down", &self.inner.torn_down.get())
            .finish()
    }
}

/// Makes `container` the active one for the duration of `f`.
///
/// The previously active container is restored on every exit path,
/// including unwinding, so nested synchronous renders of other instances
/// work.
pub fn with_active_container<R>(container: &Container, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<Container>);
    impl Drop for Restore {
        fn drop(&mut self) {
            let previous = self.0.take();
            let _ = ACTIVE.try_with(|active| *active.borrow_mut() = previous);
        }
    }

    let previous = ACTIVE.with(|active| active.borrow_mut().replace(container.clone()));
    let _restore = Restore(previous);
    f()
}

pub fn reset_cursor(container: &Container) {
    container.reset_cursor();
}

/// The container of the render pass in progress.
pub fn current_container() -> Result<Container, HookError> {
    ACTIVE
        .with(|active| active.borrow().clone())
        .ok_or(HookError::NoActiveContainer)
}

pub fn has_active_container() -> bool {
    ACTIVE.with(|active| active.borrow().is_some())
}

use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::{Rerender, current_container};
use crate::slot::{ErasedInit, SlotKind, downcast_slot};
use crate::HookError;

/// Setter half of [`use_state`].
///
/// Writes go straight to the slot, so a setter captured by a closure keeps
/// working after the render that produced it. Writing a value equal to the
/// stored one is a no-op: no write, no rerender request.
pub struct SetState<T> {
    cell: Rc<RefCell<T>>,
    rerender: Rerender,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            rerender: self.rerender.clone(),
        }
    }
}

impl<T: PartialEq> SetState<T> {
    pub(crate) fn new(cell: Rc<RefCell<T>>, rerender: Rerender) -> Self {
        Self { cell, rerender }
    }

    pub fn set(&self, next: T) {
        if *self.cell.borrow() == next {
            return;
        }
        *self.cell.borrow_mut() = next;
        self.rerender.request();
    }

    /// Computes the next value from the latest stored one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.cell.borrow());
        self.set(next);
    }

    /// Latest stored value, which may be newer than the render snapshot.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

/// Builds the typed state pair from an erased cell; shared with the adapter
/// path so both validate payloads the same way.
pub(crate) fn typed_state<T: Clone + PartialEq + 'static>(
    cell: Rc<dyn std::any::Any>,
    rerender: Rerender,
) -> Result<(T, SetState<T>), HookError> {
    let cell = downcast_slot::<RefCell<T>>(cell)?;
    let value = cell.borrow().clone();
    Ok((value, SetState::new(cell, rerender)))
}

/// Persistent value plus setter. `init` runs once, on the first pass.
pub fn use_state<T: Clone + PartialEq + 'static>(
    init: impl FnOnce() -> T,
) -> Result<(T, SetState<T>), HookError> {
    let container = current_container()?;
    let cell = container.cell(SlotKind::State, ErasedInit::new(move || RefCell::new(init())))?;
    typed_state(cell, container.rerender_handle())
}

/// Dispatch half of [`use_reducer`].
pub struct Dispatch<S, A> {
    reducer: Rc<dyn Fn(&S, A) -> S>,
    set: SetState<S>,
}

impl<S, A> Clone for Dispatch<S, A> {
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            set: self.set.clone(),
        }
    }
}

impl<S: PartialEq, A> Dispatch<S, A> {
    pub fn dispatch(&self, action: A) {
        let next = (self.reducer)(&self.set.cell.borrow(), action);
        self.set.set(next);
    }
}

/// State updated by `reducer(latest_state, action)`.
pub fn use_reducer<S, A>(
    reducer: impl Fn(&S, A) -> S + 'static,
    initial: S,
) -> Result<(S, Dispatch<S, A>), HookError>
where
    S: Clone + PartialEq + 'static,
{
    let (state, set) = use_state(move || initial)?;
    Ok((
        state,
        Dispatch {
            reducer: Rc::new(reducer),
            set,
        },
    ))
}

/// Setter half of [`use_set_state`]: applies a patch to a copy of the latest
/// state and stores the result.
pub struct MergeState<S> {
    set: SetState<S>,
}

impl<S> Clone for MergeState<S> {
    fn clone(&self) -> Self {
        Self {
            set: self.set.clone(),
        }
    }
}

impl<S: Clone + PartialEq> MergeState<S> {
    pub fn merge(&self, patch: impl FnOnce(&mut S)) {
        let mut next = self.set.cell.borrow().clone();
        patch(&mut next);
        self.set.set(next);
    }

    pub fn replace(&self, next: S) {
        self.set.set(next);
    }
}

/// Record-like state updated by partial patches.
pub fn use_set_state<S: Clone + PartialEq + 'static>(
    initial: S,
) -> Result<(S, MergeState<S>), HookError> {
    let (state, set) = use_state(move || initial)?;
    Ok((state, MergeState { set }))
}

/// Mutable box that survives across passes without triggering rerenders.
pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> Result<Rc<RefCell<T>>, HookError> {
    let init = ErasedInit::new(move || RefCell::new(init()));
    let cell = current_container()?.cell(SlotKind::Ref, init)?;
    downcast_slot::<RefCell<T>>(cell)
}

/// The `value` passed on the previous pass (`None` on the first).
pub fn use_previous<T: Clone + 'static>(value: T) -> Result<Option<T>, HookError> {
    let cell = current_container()?.cell(
        SlotKind::Previous,
        ErasedInit::new(|| RefCell::new(None::<T>)),
    )?;
    let cell = downcast_slot::<RefCell<Option<T>>>(cell)?;
    Ok(cell.replace(Some(value)))
}

/// Ref that always holds the value from the most recent pass.
pub fn use_latest<T: Clone + 'static>(value: T) -> Result<Rc<RefCell<T>>, HookError> {
    let latest = use_ref(|| value.clone())?;
    *latest.borrow_mut() = value;
    Ok(latest)
}

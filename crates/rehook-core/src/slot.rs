use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::Deps;
use crate::effects::Dispose;

/// What kind of hook owns a slot. Checked on every access so a reordered
/// hook sequence fails loudly instead of reading a neighbour's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotKind {
    State,
    Ref,
    Previous,
    Context,
    Effect,
    LayoutEffect,
    Memo,
    Adopted,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotKind::State => "state",
            SlotKind::Ref => "ref",
            SlotKind::Previous => "previous",
            SlotKind::Context => "context",
            SlotKind::Effect => "effect",
            SlotKind::LayoutEffect => "layout effect",
            SlotKind::Memo => "memo",
            SlotKind::Adopted => "adopted",
        };
        f.write_str(name)
    }
}

pub(crate) struct Slot {
    pub(crate) kind: SlotKind,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) data: SlotData,
}

pub(crate) enum SlotData {
    Cell(Rc<dyn Any>),
    Effect {
        deps: Deps,
        cleanup: Option<Dispose>,
    },
    Memo {
        deps: Deps,
        value: Rc<dyn Any>,
    },
}

/// Lazily-built, type-tagged slot payload.
///
/// The tag lets a container validate the payload type of an existing slot
/// without running the initializer.
pub struct ErasedInit<'a> {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    init: Box<dyn FnOnce() -> Rc<dyn Any> + 'a>,
}

impl<'a> ErasedInit<'a> {
    pub fn new<T: 'static>(init: impl FnOnce() -> T + 'a) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            init: Box::new(move || Rc::new(init()) as Rc<dyn Any>),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn build(self) -> Rc<dyn Any> {
        (self.init)()
    }
}

/// Downcasts a payload handed back by a [`HookAdapter`](crate::HookAdapter).
pub(crate) fn downcast_slot<T: 'static>(value: Rc<dyn Any>) -> Result<Rc<T>, crate::HookError> {
    value
        .downcast::<T>()
        .map_err(|_| crate::HookError::AdapterTypeMismatch {
            expected: std::any::type_name::<T>(),
        })
}

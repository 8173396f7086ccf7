//! Dependency lists and the diffing shared by effects and memos.
//!
//! A dependency list is compared positionally against the list passed on the
//! previous render. It counts as changed when the lengths differ or any
//! element compares unequal. Values compare with `PartialEq`; wrap an `Rc` in
//! [`Identity`] (or use [`Dep::identity`]) to compare by pointer instead, which
//! is what callbacks and event buses want.
//!
//! ```rust
//! use rehook_core::*;
//!
//! let a = deps![1, "x"];
//! let b = deps![1, "y"];
//! assert!(deps_changed(&a, &b));
//! assert!(!deps_changed(&a, &deps![1, "x"]));
//! ```

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

/// Dependency list of one effect/memo call.
pub type Deps = SmallVec<[Dep; 4]>;

trait DepValue: Any {
    fn dyn_eq(&self, other: &dyn DepValue) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: PartialEq + 'static> DepValue for T {
    fn dyn_eq(&self, other: &dyn DepValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One type-erased element of a dependency list.
pub struct Dep {
    value: Box<dyn DepValue>,
    type_name: &'static str,
}

impl Dep {
    pub fn new<T: PartialEq + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Dependency that compares by `Rc` pointer identity.
    pub fn identity<T: ?Sized + 'static>(rc: &Rc<T>) -> Self {
        Self::new(Identity(rc.clone()))
    }
}

impl PartialEq for Dep {
    fn eq(&self, other: &Self) -> bool {
        self.value.dyn_eq(&*other.value)
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dep<{}>", self.type_name)
    }
}

/// `Rc` wrapper whose equality is pointer identity.
pub struct Identity<T: ?Sized>(pub Rc<T>);

impl<T: ?Sized> Identity<T> {
    pub fn of(rc: &Rc<T>) -> Self {
        Self(rc.clone())
    }
}

impl<T: ?Sized> Clone for Identity<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized> PartialEq for Identity<T> {
    fn eq(&self, other: &Self) -> bool {
        // data pointers only
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const (),
            Rc::as_ptr(&other.0) as *const (),
        )
    }
}

/// `true` iff the lists differ in length or in any position.
pub fn deps_changed(prev: &[Dep], next: &[Dep]) -> bool {
    prev.len() != next.len() || prev.iter().zip(next).any(|(a, b)| a != b)
}

/// Builds a [`Deps`] list; every element is wrapped with [`Dep::new`].
#[macro_export]
macro_rules! deps {
    () => {
        $crate::Deps::new()
    };
    ($($dep:expr),+ $(,)?) => {{
        let mut list = $crate::Deps::new();
        $(list.push($crate::Dep::new($dep));)+
        list
    }};
}

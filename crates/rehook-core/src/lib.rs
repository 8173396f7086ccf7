//! # Containers, Hooks, and Render Passes
//!
//! Rehook lets a plain function be re-run against a persistent, per-instance
//! slot store. There are three main pieces:
//!
//! - `Container`: the ordered slots of one instance plus its render cursor
//!   and rerender callback.
//! - `with_active_container` / `Container::render`: makes one container the
//!   active one for a synchronous render pass.
//! - `use_*` hooks: each call claims the next slot of the active container.
//!
//! ## Render passes
//!
//! `Instance` is the reference host. It renders on demand and coalesces
//! rerender requests into one pending pass:
//!
//! ```rust
//! use rehook_core::*;
//!
//! let mut counter = Instance::new(|| {
//!     let (count, set_count) = use_state(|| 0)?;
//!     Ok((count, set_count))
//! });
//!
//! let (count, set_count) = counter.render().unwrap();
//! assert_eq!(count, 0);
//!
//! set_count.update(|n| n + 1);
//! set_count.update(|n| n + 1);
//! let (count, _) = counter.flush().unwrap().unwrap();
//! assert_eq!(count, 2);
//! ```
//!
//! - Hooks are order-based: the Nth call in a pass always refers to the Nth
//!   slot. Calling them conditionally is an error, reported as
//!   `HookError::SlotMisaligned` or `HookError::HookCountChanged` instead
//!   of silently reading another hook's state.
//! - Every hook returns `Result<_, HookError>`; a hook called outside a
//!   render pass fails with `HookError::NoActiveContainer`.
//!
//! ## Effects and cleanup
//!
//! `use_effect` runs its body during the pass, on the first render and
//! whenever its dependency list changes. An empty list means "on mount only":
//!
//! ```rust
//! use rehook_core::*;
//!
//! let mut view = Instance::new(|| {
//!     use_effect(
//!         || {
//!             log::info!("mounted");
//!             on_cleanup(|| log::info!("unmounted"))
//!         },
//!         deps![],
//!     )
//! });
//! view.render().unwrap();
//! view.teardown();
//! ```
//!
//! - A previous cleanup always runs before the effect runs again.
//! - At teardown every stored cleanup runs once, in slot order.
//!
//! ## Contexts and async work
//!
//! `create_context` values are shared across instances; each subscriber keeps
//! its own cached copy refreshed by `Context::provide`. `use_async` wraps a
//! future-returning operation so only the latest call generation may write
//! state.
//!
//! Convenience hooks built on top of these live in `rehook-kit` and resolve
//! their primitives through the swappable [`adapter`].

pub mod adapter;
pub mod async_op;
pub mod boundary;
pub mod bus;
pub mod context;
pub mod deps;
pub mod effects;
pub mod error;
pub mod executor;
pub mod instance;
pub mod memo;
pub mod prelude;
pub mod runtime;
pub mod slot;
pub mod state;
mod tests;

pub use adapter::{
    BasicAdapter, HookAdapter, current_hook_adapter, take_hook_adapter, use_hook_adapter,
};
pub use async_op::*;
pub use boundary::*;
pub use bus::*;
pub use context::*;
pub use deps::*;
pub use effects::*;
pub use error::*;
pub use executor::*;
pub use instance::*;
pub use memo::*;
pub use runtime::*;
pub use slot::{ErasedInit, SlotKind};
pub use state::*;

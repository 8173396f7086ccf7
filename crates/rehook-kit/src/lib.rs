//! # Convenience hooks
//!
//! Everything here is built from the primitives in `rehook_core::adapter`,
//! so the hooks follow whichever `HookAdapter` is installed on the thread:
//!
//! ```rust
//! use rehook_core::Instance;
//! use rehook_kit::*;
//!
//! let mut view = Instance::new(|| {
//!     let (count, counter) = use_counter(0, 1)?;
//!     let (open, _) = use_boolean(false)?;
//!     Ok((count, open, counter))
//! });
//!
//! let (_, _, counter) = view.render().unwrap();
//! counter.inc();
//! counter.inc();
//! let (count, open, _) = view.flush().unwrap().unwrap();
//! assert_eq!((count, open), (2, false));
//! ```
//!
//! ## Time
//!
//! Timer hooks schedule on a per-thread queue that the host drains with
//! [`run_due_timers`], and read time from the per-thread [`clock`]. Tests
//! install a [`TestClock`] and advance it:
//!
//! ```rust
//! use rehook_core::Instance;
//! use rehook_kit::*;
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use web_time::Duration;
//!
//! let clock = TestClock::new();
//! set_clock(clock.clone());
//!
//! let fired = Rc::new(Cell::new(false));
//! let mut view = Instance::new({
//!     let fired = fired.clone();
//!     move || {
//!         let fired = fired.clone();
//!         use_timeout(move || fired.set(true), Duration::from_millis(250))
//!     }
//! });
//! view.render().unwrap();
//!
//! clock.advance(Duration::from_millis(250));
//! run_due_timers();
//! assert!(fired.get());
//! ```

pub mod action;
pub mod boolean;
pub mod clock;
pub mod counter;
pub mod lifecycle;
pub mod misc;
pub mod observe;
pub mod store;
pub mod timers;
pub mod timing;
pub mod utils;

pub use action::*;
pub use boolean::*;
pub use clock::{Clock, SystemClock, TestClock, now, reset_clock, set_clock};
pub use counter::*;
pub use lifecycle::*;
pub use misc::*;
pub use observe::*;
pub use store::*;
pub use timers::*;
pub use timing::*;
pub use utils::*;

//! Host-driven timer queue.
//!
//! Timers never fire on their own. The host calls [`run_due_timers`] from its
//! loop (after sleeping until [`next_due`], on every frame, or after advancing
//! a `TestClock`), and every timer whose deadline has passed runs then.

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::SlotMap;
use web_time::{Duration, Instant};

use crate::clock;

slotmap::new_key_type! {
    pub struct TimerId;
}

type TimerFn = Rc<RefCell<dyn FnMut()>>;

struct Timer {
    due: Instant,
    period: Option<Duration>,
    seq: u64,
    callback: TimerFn,
}

#[derive(Default)]
struct Queue {
    timers: SlotMap<TimerId, Timer>,
    next_seq: u64,
}

thread_local! {
    static QUEUE: RefCell<Queue> = RefCell::new(Queue::default());
}

fn schedule(delay: Duration, period: Option<Duration>, f: impl FnMut() + 'static) -> TimerId {
    let due = clock::now() + delay;
    QUEUE.with(|q| {
        let mut q = q.borrow_mut();
        let seq = q.next_seq;
        q.next_seq += 1;
        q.timers.insert(Timer {
            due,
            period,
            seq,
            callback: Rc::new(RefCell::new(f)),
        })
    })
}

/// Runs `f` once, `delay` from now.
pub fn set_timeout(delay: Duration, f: impl FnMut() + 'static) -> TimerId {
    schedule(delay, None, f)
}

/// Runs `f` every `period`, starting one period from now.
pub fn set_interval(period: Duration, f: impl FnMut() + 'static) -> TimerId {
    schedule(period, Some(period), f)
}

/// Cancels a pending timer. `false` if it already fired or was cleared.
pub fn clear_timer(id: TimerId) -> bool {
    QUEUE.with(|q| q.borrow_mut().timers.remove(id).is_some())
}

pub fn pending_timers() -> usize {
    QUEUE.with(|q| q.borrow().timers.len())
}

/// Earliest deadline among pending timers.
pub fn next_due() -> Option<Instant> {
    QUEUE.with(|q| q.borrow().timers.values().map(|t| t.due).min())
}

/// Fires every timer due at the current clock time, in deadline order, and
/// returns how many ran. An interval fires at most once per call.
///
/// Callbacks may set or clear timers; timers they add are not considered
/// until the next call.
pub fn run_due_timers() -> usize {
    let now = clock::now();
    let mut due: Vec<(Instant, u64, TimerId)> = QUEUE.with(|q| {
        q.borrow()
            .timers
            .iter()
            .filter(|(_, t)| t.due <= now)
            .map(|(id, t)| (t.due, t.seq, id))
            .collect()
    });
    due.sort();

    let mut fired = 0;
    for (_, seq, id) in due {
        let callback = QUEUE.with(|q| {
            let mut q = q.borrow_mut();
            let timer = q.timers.get_mut(id).filter(|t| t.seq == seq)?;
            let callback = timer.callback.clone();
            let period = timer.period;
            match period {
                Some(period) => {
                    // skip missed ticks instead of bursting
                    let period = period.max(Duration::from_millis(1)).as_nanos();
                    let missed = (now - timer.due).as_nanos() / period + 1;
                    let step = u64::try_from(period.saturating_mul(missed)).unwrap_or(u64::MAX);
                    timer.due += Duration::from_nanos(step);
                }
                None => {
                    q.timers.remove(id);
                }
            }
            Some(callback)
        });
        if let Some(callback) = callback {
            (callback.borrow_mut())();
            fired += 1;
        }
    }
    if fired > 0 {
        log::trace!("{fired} timers fired");
    }
    fired
}

/// Drops every pending timer on this thread.
pub fn clear_all_timers() {
    QUEUE.with(|q| q.borrow_mut().timers.clear());
}

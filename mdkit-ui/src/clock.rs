//! Frame-driven scheduler.
//!
//! All time in the toolkit comes from [`Clock::tick`]: the host calls it once
//! per frame with the elapsed seconds. Callbacks scheduled while a tick is
//! being processed run on a later tick, never re-entrantly, so an interval
//! that re-schedules itself cannot spin inside one frame.

use std::{
    cell::RefCell,
    fmt,
    ops::ControlFlow,
    rc::{Rc, Weak},
};

use slotmap::{SlotMap, new_key_type};
use tracing::trace;

new_key_type! {
    /// Key of a scheduled callback.
    pub struct ClockEventId;
}

type ClockCallback = Rc<RefCell<dyn FnMut(f64) -> ControlFlow<()>>>;

struct Scheduled {
    deadline: f64,
    period: Option<f64>,
    seq: u64,
    armed_frame: u64,
    callback: ClockCallback,
}

#[derive(Default)]
struct ClockInner {
    time: f64,
    frame: u64,
    seq: u64,
    events: SlotMap<ClockEventId, Scheduled>,
}

/// Monotonic, single-threaded clock. Cloning yields another handle to the
/// same clock.
#[derive(Clone, Default)]
pub struct Clock {
    inner: Rc<RefCell<ClockInner>>,
}

/// Handle to a scheduled callback; cancelling is idempotent.
#[derive(Clone)]
pub struct ClockEvent {
    id: ClockEventId,
    clock: Weak<RefCell<ClockInner>>,
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Clock")
            .field("time", &inner.time)
            .field("frame", &inner.frame)
            .field("pending", &inner.events.len())
            .finish()
    }
}

impl fmt::Debug for ClockEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockEvent")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

impl ClockEvent {
    /// Removes the callback from the clock. Safe to call repeatedly.
    pub fn cancel(&self) {
        if let Some(clock) = self.clock.upgrade() {
            clock.borrow_mut().events.remove(self.id);
        }
    }

    /// Whether the callback is still scheduled.
    pub fn is_active(&self) -> bool {
        self.clock
            .upgrade()
            .is_some_and(|clock| clock.borrow().events.contains_key(self.id))
    }
}

impl Clock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds elapsed since creation.
    pub fn time(&self) -> f64 {
        self.inner.borrow().time
    }

    /// Number of processed ticks.
    pub fn frame(&self) -> u64 {
        self.inner.borrow().frame
    }

    /// Number of pending callbacks.
    pub fn pending(&self) -> usize {
        self.inner.borrow().events.len()
    }

    fn schedule(&self, delay: f64, period: Option<f64>, callback: ClockCallback) -> ClockEvent {
        let mut inner = self.inner.borrow_mut();
        inner.seq += 1;
        let scheduled = Scheduled {
            deadline: inner.time + delay.max(0.0),
            period,
            seq: inner.seq,
            armed_frame: inner.frame,
            callback,
        };
        let id = inner.events.insert(scheduled);
        ClockEvent {
            id,
            clock: Rc::downgrade(&self.inner),
        }
    }

    /// Runs `callback` once, on the first tick at or after `delay` seconds.
    /// The callback receives the tick's delta time.
    pub fn schedule_once(&self, delay: f64, callback: impl FnOnce(f64) + 'static) -> ClockEvent {
        let mut callback = Some(callback);
        self.schedule(
            delay,
            None,
            Rc::new(RefCell::new(move |dt| {
                if let Some(cb) = callback.take() {
                    cb(dt);
                }
                ControlFlow::Break(())
            })),
        )
    }

    /// Runs `callback` every `period` seconds (every tick when `period` is
    /// zero) until it returns [`ControlFlow::Break`] or is cancelled.
    pub fn schedule_interval(
        &self,
        period: f64,
        callback: impl FnMut(f64) -> ControlFlow<()> + 'static,
    ) -> ClockEvent {
        let period = period.max(0.0);
        self.schedule(period, Some(period), Rc::new(RefCell::new(callback)))
    }

    /// Advances time by `dt` seconds and runs every due callback in deadline
    /// order.
    pub fn tick(&self, dt: f64) {
        let due: Vec<(ClockEventId, ClockCallback)> = {
            let mut inner = self.inner.borrow_mut();
            inner.frame += 1;
            inner.time += dt.max(0.0);
            let now = inner.time;
            let frame = inner.frame;
            let mut due: Vec<(f64, u64, ClockEventId)> = inner
                .events
                .iter()
                .filter(|(_, ev)| ev.deadline <= now + f64::EPSILON && ev.armed_frame < frame)
                .map(|(id, ev)| (ev.deadline, ev.seq, id))
                .collect();
            due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            due.into_iter()
                .filter_map(|(_, _, id)| inner.events.get(id).map(|ev| (id, ev.callback.clone())))
                .collect()
        };
        trace!(count = due.len(), "clock tick");

        for (id, callback) in due {
            // A previous callback of this tick may have cancelled this one.
            if !self.inner.borrow().events.contains_key(id) {
                continue;
            }
            let flow = (*callback.borrow_mut())(dt);
            let mut inner = self.inner.borrow_mut();
            let now = inner.time;
            let frame = inner.frame;
            let period = inner.events.get(id).and_then(|ev| ev.period);
            match (flow, period) {
                (ControlFlow::Continue(()), Some(period)) => {
                    if let Some(ev) = inner.events.get_mut(id) {
                        ev.deadline = (ev.deadline + period).max(now);
                        ev.armed_frame = frame;
                    }
                }
                _ => {
                    inner.events.remove(id);
                }
            }
        }
    }

    /// Ticks repeatedly with a fixed step until `seconds` have elapsed.
    pub fn advance(&self, seconds: f64, step: f64) {
        let step = if step <= 0.0 { 1.0 / 60.0 } else { step };
        let mut remaining = seconds;
        while remaining > 1e-9 {
            let dt = step.min(remaining);
            self.tick(dt);
            remaining -= dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn once_fires_after_delay_only_once() {
        let clock = Clock::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        clock.schedule_once(0.5, move |_| h.set(h.get() + 1));
        clock.tick(0.25);
        assert_eq!(hits.get(), 0);
        clock.tick(0.25);
        assert_eq!(hits.get(), 1);
        clock.tick(1.0);
        assert_eq!(hits.get(), 1);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn interval_runs_until_break() {
        let clock = Clock::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        clock.schedule_interval(0.0, move |_| {
            h.set(h.get() + 1);
            if h.get() == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        for _ in 0..10 {
            clock.tick(1.0 / 60.0);
        }
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn scheduling_inside_callback_defers_to_next_tick() {
        let clock = Clock::new();
        let hits = Rc::new(Cell::new(0));
        let inner_clock = clock.clone();
        let h = hits.clone();
        clock.schedule_once(0.0, move |_| {
            let h = h.clone();
            inner_clock.schedule_once(0.0, move |_| h.set(h.get() + 1));
        });
        clock.tick(0.016);
        assert_eq!(hits.get(), 0);
        clock.tick(0.016);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn cancel_is_idempotent() {
        let clock = Clock::new();
        let event = clock.schedule_once(1.0, |_| {});
        assert!(event.is_active());
        event.cancel();
        event.cancel();
        assert!(!event.is_active());
    }
}

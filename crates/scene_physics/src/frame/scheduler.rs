//! Ordered per-frame handler registry
//!
//! Handlers execute each tick sorted ascending by an optional order key;
//! handlers without an order run after the ordered ones, in registration
//! order. Ties among ordered handlers break by registration sequence, so
//! the schedule is a stable total order.
//!
//! A tick never holds internal borrows across a handler invocation, so a
//! handler may freely start or stop itself or its peers, register new
//! handlers, or drop handles mid-tick. Stopping takes effect no later than
//! the next tick boundary and never cancels an in-flight invocation.

use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

new_key_type! {
    struct HandlerKey;
}

/// Options for registering a frame handler
#[derive(Debug, Clone)]
pub struct FrameHandlerOptions {
    /// Execution order key; lower runs earlier, unordered handlers run last
    pub order: Option<i32>,

    /// Start the handler immediately on registration
    pub autostart: bool,

    /// Whether each invocation marks the frame dirty for demand-driven
    /// renderers (see [`FrameScheduler::take_redraw_request`])
    pub invalidates_frame: bool,
}

impl Default for FrameHandlerOptions {
    fn default() -> Self {
        Self {
            order: None,
            autostart: true,
            invalidates_frame: true,
        }
    }
}

impl FrameHandlerOptions {
    /// Set the execution order key
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Configure whether the handler starts on registration
    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    /// Configure whether invocations mark the frame dirty
    pub fn with_frame_invalidation(mut self, invalidates: bool) -> Self {
        self.invalidates_frame = invalidates;
        self
    }
}

struct HandlerEntry {
    // Taken out of the slot while the callback is executing so the entry
    // stays mutable from within the callback itself.
    callback: Option<Box<dyn FnMut(f32)>>,
    order: Option<i32>,
    seq: u64,
    started: bool,
    invalidates_frame: bool,
}

#[derive(Default)]
struct SchedulerInner {
    handlers: SlotMap<HandlerKey, HandlerEntry>,
    next_seq: u64,
    paused: bool,
    redraw_requested: bool,
    schedule_dirty: bool,
    schedule: Vec<HandlerKey>,
}

impl SchedulerInner {
    fn rebuild_schedule_if_dirty(&mut self) {
        if !self.schedule_dirty {
            return;
        }
        let mut keys: Vec<_> = self
            .handlers
            .iter()
            .map(|(key, entry)| (key, entry.order, entry.seq))
            .collect();
        keys.sort_by_key(|&(_, order, seq)| (order.is_none(), order.unwrap_or(0), seq));
        self.schedule = keys.into_iter().map(|(key, _, _)| key).collect();
        self.schedule_dirty = false;
    }
}

/// Ordered registry of per-frame handlers
///
/// Created with [`FrameScheduler::new`] for environments that drive a frame
/// loop, or [`FrameScheduler::headless`] for server/test contexts where
/// registration must succeed but never execute.
pub struct FrameScheduler {
    inner: Option<Rc<RefCell<SchedulerInner>>>,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    /// Create a scheduler for an active environment
    pub fn new() -> Self {
        Self {
            inner: Some(Rc::new(RefCell::new(SchedulerInner::default()))),
        }
    }

    /// Create an inert scheduler for environments without a frame loop
    ///
    /// Registration returns a no-op handle: `start`/`stop` do nothing and
    /// `is_started` is constantly `false`. Callers never have to branch on
    /// the environment.
    pub fn headless() -> Self {
        Self { inner: None }
    }

    /// Whether this scheduler was created headless
    pub fn is_headless(&self) -> bool {
        self.inner.is_none()
    }

    /// Register a frame handler
    ///
    /// The handler receives the frame delta in seconds. Dropping the
    /// returned handle stops and unregisters the handler.
    pub fn register<F>(&self, callback: F, options: FrameHandlerOptions) -> FrameHandle
    where
        F: FnMut(f32) + 'static,
    {
        let Some(inner) = &self.inner else {
            return FrameHandle { target: None };
        };
        let key = {
            let mut guard = inner.borrow_mut();
            let seq = guard.next_seq;
            guard.next_seq += 1;
            let key = guard.handlers.insert(HandlerEntry {
                callback: Some(Box::new(callback)),
                order: options.order,
                seq,
                started: options.autostart,
                invalidates_frame: options.invalidates_frame,
            });
            guard.schedule_dirty = true;
            key
        };
        log::trace!("registered frame handler (order: {:?})", options.order);
        FrameHandle {
            target: Some((Rc::downgrade(inner), key)),
        }
    }

    /// Execute one tick, invoking every started handler in schedule order
    ///
    /// No-op while paused. Handler panics are not caught; isolating a
    /// faulty handler is the caller's concern.
    pub fn tick(&self, delta_seconds: f32) {
        let Some(inner) = &self.inner else {
            return;
        };
        let schedule = {
            let mut guard = inner.borrow_mut();
            if guard.paused {
                return;
            }
            guard.rebuild_schedule_if_dirty();
            guard.schedule.clone()
        };
        for key in schedule {
            let taken = {
                let mut guard = inner.borrow_mut();
                match guard.handlers.get_mut(key) {
                    Some(entry) if entry.started => entry
                        .callback
                        .take()
                        .map(|callback| (callback, entry.invalidates_frame)),
                    _ => None,
                }
            };
            if let Some((mut callback, invalidates)) = taken {
                callback(delta_seconds);
                let mut guard = inner.borrow_mut();
                if let Some(entry) = guard.handlers.get_mut(key) {
                    entry.callback = Some(callback);
                }
                if invalidates {
                    guard.redraw_requested = true;
                }
            }
        }
    }

    /// Suspend ticking globally
    pub fn pause(&self) {
        if let Some(inner) = &self.inner {
            inner.borrow_mut().paused = true;
        }
    }

    /// Resume ticking after [`pause`](Self::pause)
    pub fn resume(&self) {
        if let Some(inner) = &self.inner {
            inner.borrow_mut().paused = false;
        }
    }

    /// Whether the scheduler is currently paused
    pub fn is_paused(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.borrow().paused)
    }

    /// Request a redraw independently of any handler
    pub fn invalidate(&self) {
        if let Some(inner) = &self.inner {
            inner.borrow_mut().redraw_requested = true;
        }
    }

    /// Consume the pending redraw request
    ///
    /// Returns `true` when [`invalidate`](Self::invalidate) was called or a
    /// frame-invalidating handler ran since the last call.
    pub fn take_redraw_request(&self) -> bool {
        self.inner.as_ref().is_some_and(|inner| {
            let mut guard = inner.borrow_mut();
            std::mem::take(&mut guard.redraw_requested)
        })
    }

    /// Total number of registered handlers, started or not
    pub fn handler_count(&self) -> usize {
        self.inner
            .as_ref()
            .map_or(0, |inner| inner.borrow().handlers.len())
    }

    /// Number of handlers currently in the started set
    pub fn active_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| {
            inner
                .borrow()
                .handlers
                .values()
                .filter(|entry| entry.started)
                .count()
        })
    }
}

/// Lifecycle handle for a registered frame handler
///
/// Dropping the handle stops the handler and removes it from the
/// scheduler, so tying a handler's lifetime to an owning scope is
/// automatic.
pub struct FrameHandle {
    target: Option<(Weak<RefCell<SchedulerInner>>, HandlerKey)>,
}

impl FrameHandle {
    /// Add the handler to the active set; idempotent
    pub fn start(&self) {
        self.with_entry(|entry| entry.started = true);
    }

    /// Remove the handler from the active set; idempotent
    ///
    /// An invocation already in flight runs to completion; the handler
    /// will not run again starting with the next tick.
    pub fn stop(&self) {
        self.with_entry(|entry| entry.started = false);
    }

    /// Whether the handler is currently in the active set
    ///
    /// Constantly `false` for handles issued by a headless scheduler.
    pub fn is_started(&self) -> bool {
        let Some((weak, key)) = &self.target else {
            return false;
        };
        weak.upgrade().is_some_and(|inner| {
            inner
                .borrow()
                .handlers
                .get(*key)
                .is_some_and(|entry| entry.started)
        })
    }

    fn with_entry(&self, apply: impl FnOnce(&mut HandlerEntry)) {
        let Some((weak, key)) = &self.target else {
            return;
        };
        if let Some(inner) = weak.upgrade() {
            if let Some(entry) = inner.borrow_mut().handlers.get_mut(*key) {
                apply(entry);
            }
        }
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        if let Some((weak, key)) = self.target.take() {
            if let Some(inner) = weak.upgrade() {
                let mut guard = inner.borrow_mut();
                guard.handlers.remove(key);
                guard.schedule_dirty = true;
            }
        }
    }
}

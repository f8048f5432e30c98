//! Per-world physics event buffer
//!
//! Collects collision and contact-force events while the pipeline steps
//! and hands them to the dispatcher afterwards. Each world gets its own
//! queue; on world replacement the old queue is dropped with the world it
//! observed, never reused.

use rapier3d::prelude::{
    ColliderHandle, ColliderSet, CollisionEvent, ContactForceEvent, ContactPair, EventHandler,
    Real, RigidBodySet,
};
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Buffer of physics events recorded during one step
///
/// The mutexes exist only to satisfy the `Send + Sync` bound of rapier's
/// `EventHandler` trait; all access is single-threaded and no lock is held
/// across user code.
#[derive(Default)]
pub struct EventQueue {
    collision_events: Mutex<Vec<CollisionEvent>>,
    contact_force_events: Mutex<Vec<ContactForceEvent>>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the buffered collision events in engine order
    ///
    /// The callback receives both collider handles and whether the
    /// collision started (`true`) or ended (`false`). The queue is empty
    /// afterwards.
    pub fn drain_collision_events(
        &self,
        mut callback: impl FnMut(ColliderHandle, ColliderHandle, bool),
    ) {
        for event in self.take_collision_events() {
            callback(event.collider1(), event.collider2(), event.started());
        }
    }

    /// Drain the buffered contact-force events in engine order
    pub fn drain_contact_force_events(&self, mut callback: impl FnMut(&ContactForceEvent)) {
        for event in std::mem::take(&mut *lock(&self.contact_force_events)) {
            callback(&event);
        }
    }

    /// Discard everything currently buffered
    pub fn clear(&self) {
        lock(&self.collision_events).clear();
        lock(&self.contact_force_events).clear();
    }

    /// Number of buffered collision events
    pub fn collision_event_count(&self) -> usize {
        lock(&self.collision_events).len()
    }

    pub(crate) fn take_collision_events(&self) -> Vec<CollisionEvent> {
        std::mem::take(&mut *lock(&self.collision_events))
    }

    pub(crate) fn push_collision_event(&self, event: CollisionEvent) {
        lock(&self.collision_events).push(event);
    }
}

impl EventHandler for EventQueue {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.push_collision_event(event);
    }

    fn handle_contact_force_event(
        &self,
        dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        contact_pair: &ContactPair,
        total_force_magnitude: Real,
    ) {
        let event = ContactForceEvent::from_contact_pair(dt, contact_pair, total_force_magnitude);
        lock(&self.contact_force_events).push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::prelude::{ColliderBuilder, ColliderSet, CollisionEventFlags};

    fn collider_pair() -> (ColliderHandle, ColliderHandle) {
        let mut colliders = ColliderSet::new();
        let first = colliders.insert(ColliderBuilder::ball(0.5));
        let second = colliders.insert(ColliderBuilder::ball(0.5));
        (first, second)
    }

    #[test]
    fn test_drain_empties_the_queue_in_order() {
        let queue = EventQueue::new();
        let (first, second) = collider_pair();

        queue.push_collision_event(CollisionEvent::Started(
            first,
            second,
            CollisionEventFlags::empty(),
        ));
        queue.push_collision_event(CollisionEvent::Stopped(
            first,
            second,
            CollisionEventFlags::empty(),
        ));
        assert_eq!(queue.collision_event_count(), 2);

        let mut seen = Vec::new();
        queue.drain_collision_events(|h1, h2, started| seen.push((h1, h2, started)));
        assert_eq!(seen, vec![(first, second, true), (first, second, false)]);
        assert_eq!(queue.collision_event_count(), 0);

        queue.drain_collision_events(|_, _, _| panic!("queue should be empty"));
    }

    #[test]
    fn test_clear_discards_events() {
        let queue = EventQueue::new();
        let (first, second) = collider_pair();

        queue.push_collision_event(CollisionEvent::Started(
            first,
            second,
            CollisionEventFlags::empty(),
        ));
        queue.clear();
        assert_eq!(queue.collision_event_count(), 0);
    }
}

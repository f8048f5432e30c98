//! Physics event dispatch
//!
//! Runs after transform reconciliation so callbacks observe already
//! updated node transforms. Two phases per tick: sleep/wake edge
//! detection over the tracked bodies, then the collision events buffered
//! during the step, drained exactly once in engine order.
//!
//! No registry or world borrow is held across a callback invocation, so a
//! callback may unregister bodies, replace or clear callback sets
//! (including its own), or mutate the world. Records whose colliders,
//! bodies, or callback entries are already gone are skipped silently; the
//! engine may report events for entities removed in the same tick.

use crate::physics::events::{CollisionEnter, CollisionExit, ContactManifoldSummary};
use crate::physics::queue::EventQueue;
use crate::physics::{SharedRegistry, SharedWorld};
use rapier3d::prelude::{RigidBody, RigidBodyHandle};
use std::collections::HashMap;

/// Resolves buffered physics events to registered callbacks
///
/// Owns the per-body sleep-state cache used for edge detection. The cache
/// is keyed by body handle and reset when the world is replaced.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    sleep_states: HashMap<RigidBodyHandle, bool>,
}

impl EventDispatcher {
    /// Create a dispatcher with an empty sleep-state cache
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        self.sleep_states.clear();
    }

    pub(crate) fn run(
        &mut self,
        world: &SharedWorld,
        registry: &SharedRegistry,
        queue: &EventQueue,
    ) {
        self.dispatch_state_transitions(world, registry);
        Self::dispatch_collision_events(world, registry, queue);
    }

    /// Fire `on_sleep`/`on_wake` for bodies whose sleep state changed
    ///
    /// Edge detection only: steady-state ticks fire nothing, and the
    /// first observation of a handle seeds the cache silently. All
    /// tracked bodies are checked, fixed ones included.
    fn dispatch_state_transitions(&mut self, world: &SharedWorld, registry: &SharedRegistry) {
        let tracked = registry.borrow().tracked_bodies();
        self.sleep_states
            .retain(|handle, _| tracked.iter().any(|(tracked_handle, _)| tracked_handle == handle));

        for (handle, _node) in tracked {
            let sleeping = world.borrow().rigid_body(handle).map(RigidBody::is_sleeping);
            let Some(sleeping) = sleeping else {
                self.sleep_states.remove(&handle);
                continue;
            };
            match self.sleep_states.insert(handle, sleeping) {
                Some(previous) if previous != sleeping => {
                    Self::invoke_state_callback(registry, handle, !sleeping);
                }
                _ => {}
            }
        }
    }

    fn invoke_state_callback(registry: &SharedRegistry, handle: RigidBodyHandle, wake: bool) {
        let callback = registry.borrow_mut().take_state_callback(handle, wake);
        if let Some(mut callback) = callback {
            callback();
            registry
                .borrow_mut()
                .restore_state_callback(handle, wake, callback);
        }
    }

    /// Drain the collision queue and notify both sides of every record
    fn dispatch_collision_events(
        world: &SharedWorld,
        registry: &SharedRegistry,
        queue: &EventQueue,
    ) {
        for event in queue.take_collision_events() {
            let (collider1, collider2, started) =
                (event.collider1(), event.collider2(), event.started());

            let resolved = {
                let world = world.borrow();
                match (
                    world.body_of_collider(collider1),
                    world.body_of_collider(collider2),
                ) {
                    (Some(body1), Some(body2)) => {
                        let contact = if started {
                            world.contact_summary(collider1, collider2)
                        } else {
                            None
                        };
                        Some((body1, body2, contact))
                    }
                    _ => None,
                }
            };
            let Some((body1, body2, contact)) = resolved else {
                continue;
            };

            if started {
                let (manifold, flipped) =
                    contact.map_or((None, false), |(summary, flipped)| (Some(summary), flipped));
                Self::invoke_enter(registry, body1, body2, manifold.clone(), flipped);
                Self::invoke_enter(registry, body2, body1, manifold, flipped);
            } else {
                Self::invoke_exit(registry, body1, body2);
                Self::invoke_exit(registry, body2, body1);
            }
        }
    }

    fn invoke_enter(
        registry: &SharedRegistry,
        owner: RigidBodyHandle,
        target: RigidBodyHandle,
        manifold: Option<ContactManifoldSummary>,
        flipped: bool,
    ) {
        let callback = registry.borrow_mut().take_enter_callback(owner);
        if let Some(mut callback) = callback {
            let target_node = registry.borrow().node_for_body(target);
            let payload = CollisionEnter {
                target,
                target_node,
                manifold,
                flipped,
            };
            callback(&payload);
            registry.borrow_mut().restore_enter_callback(owner, callback);
        }
    }

    fn invoke_exit(registry: &SharedRegistry, owner: RigidBodyHandle, target: RigidBodyHandle) {
        let callback = registry.borrow_mut().take_exit_callback(owner);
        if let Some(mut callback) = callback {
            let target_node = registry.borrow().node_for_body(target);
            let payload = CollisionExit {
                target,
                target_node,
            };
            callback(&payload);
            registry.borrow_mut().restore_exit_callback(owner, callback);
        }
    }
}

//! Handle-to-node and handle-to-callback registries
//!
//! Three mappings mutated by mount/unmount callers and read every tick:
//! rigid-body handle to scene node, collider handle to scene node, and
//! rigid-body handle to event callback set. The registry is the single
//! writer; the stepper, reconciler, and dispatcher read through its
//! lookup methods and iterate over snapshots so entries may be removed
//! from inside callbacks invoked mid-tick.

use crate::physics::events::{
    CollisionEnterCallback, CollisionExitCallback, EventCallbackSet, StateCallback,
};
use crate::scene::NodeId;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};
use std::collections::HashMap;

/// Registry tracking which scene node a physics handle drives and which
/// callbacks are registered for it
///
/// Registering callbacks for a handle that is not (yet) tracked is
/// accepted: the set becomes live once the handle is tracked and is inert
/// otherwise. Unregistration is the caller's responsibility on teardown;
/// readers skip entries whose engine-side entity is already gone.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    body_nodes: HashMap<RigidBodyHandle, NodeId>,
    collider_nodes: HashMap<ColliderHandle, NodeId>,
    callbacks: HashMap<RigidBodyHandle, EventCallbackSet>,
}

impl HandleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a rigid body as driving `node`
    pub fn register_body(&mut self, handle: RigidBodyHandle, node: NodeId) {
        log::trace!("tracking rigid body {handle:?}");
        self.body_nodes.insert(handle, node);
    }

    /// Stop tracking a rigid body
    pub fn unregister_body(&mut self, handle: RigidBodyHandle) {
        self.body_nodes.remove(&handle);
    }

    /// Track a collider as belonging to `node`
    pub fn register_collider(&mut self, handle: ColliderHandle, node: NodeId) {
        self.collider_nodes.insert(handle, node);
    }

    /// Stop tracking a collider
    pub fn unregister_collider(&mut self, handle: ColliderHandle) {
        self.collider_nodes.remove(&handle);
    }

    /// Replace the callback set registered for a rigid body
    pub fn set_callbacks(&mut self, handle: RigidBodyHandle, callbacks: EventCallbackSet) {
        self.callbacks.insert(handle, callbacks);
    }

    /// Remove the callback set registered for a rigid body
    pub fn clear_callbacks(&mut self, handle: RigidBodyHandle) {
        self.callbacks.remove(&handle);
    }

    /// The scene node a rigid body drives, if tracked
    pub fn node_for_body(&self, handle: RigidBodyHandle) -> Option<NodeId> {
        self.body_nodes.get(&handle).copied()
    }

    /// The scene node a collider belongs to, if tracked
    pub fn node_for_collider(&self, handle: ColliderHandle) -> Option<NodeId> {
        self.collider_nodes.get(&handle).copied()
    }

    /// Whether a rigid body is tracked
    pub fn tracks_body(&self, handle: RigidBodyHandle) -> bool {
        self.body_nodes.contains_key(&handle)
    }

    /// Number of tracked rigid bodies
    pub fn body_count(&self) -> usize {
        self.body_nodes.len()
    }

    /// Number of tracked colliders
    pub fn collider_count(&self) -> usize {
        self.collider_nodes.len()
    }

    /// Snapshot of the tracked rigid bodies and their nodes
    ///
    /// Tick phases iterate over this snapshot rather than the live map so
    /// callbacks may mutate the registry mid-iteration.
    pub fn tracked_bodies(&self) -> Vec<(RigidBodyHandle, NodeId)> {
        self.body_nodes.iter().map(|(&h, &n)| (h, n)).collect()
    }

    // Callback slots are taken out for the duration of an invocation and
    // restored afterwards. Restoration is skipped when the entry was
    // removed or the slot was replaced during the invocation, so a
    // callback may clear or replace its own registration.

    pub(crate) fn take_state_callback(
        &mut self,
        handle: RigidBodyHandle,
        wake: bool,
    ) -> Option<StateCallback> {
        let set = self.callbacks.get_mut(&handle)?;
        if wake {
            set.on_wake.take()
        } else {
            set.on_sleep.take()
        }
    }

    pub(crate) fn restore_state_callback(
        &mut self,
        handle: RigidBodyHandle,
        wake: bool,
        callback: StateCallback,
    ) {
        if let Some(set) = self.callbacks.get_mut(&handle) {
            let slot = if wake { &mut set.on_wake } else { &mut set.on_sleep };
            if slot.is_none() {
                *slot = Some(callback);
            }
        }
    }

    pub(crate) fn take_enter_callback(
        &mut self,
        handle: RigidBodyHandle,
    ) -> Option<CollisionEnterCallback> {
        self.callbacks.get_mut(&handle)?.on_collision_enter.take()
    }

    pub(crate) fn restore_enter_callback(
        &mut self,
        handle: RigidBodyHandle,
        callback: CollisionEnterCallback,
    ) {
        if let Some(set) = self.callbacks.get_mut(&handle) {
            if set.on_collision_enter.is_none() {
                set.on_collision_enter = Some(callback);
            }
        }
    }

    pub(crate) fn take_exit_callback(
        &mut self,
        handle: RigidBodyHandle,
    ) -> Option<CollisionExitCallback> {
        self.callbacks.get_mut(&handle)?.on_collision_exit.take()
    }

    pub(crate) fn restore_exit_callback(
        &mut self,
        handle: RigidBodyHandle,
        callback: CollisionExitCallback,
    ) {
        if let Some(set) = self.callbacks.get_mut(&handle) {
            if set.on_collision_exit.is_none() {
                set.on_collision_exit = Some(callback);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;
    use rapier3d::prelude::{RigidBodyBuilder, RigidBodySet};

    fn test_handle() -> RigidBodyHandle {
        let mut bodies = RigidBodySet::new();
        bodies.insert(RigidBodyBuilder::dynamic())
    }

    #[test]
    fn test_register_and_unregister_body() {
        let mut scene = SceneGraph::new();
        let node = scene.add_node();
        let handle = test_handle();

        let mut registry = HandleRegistry::new();
        registry.register_body(handle, node);
        assert!(registry.tracks_body(handle));
        assert_eq!(registry.node_for_body(handle), Some(node));
        assert_eq!(registry.tracked_bodies(), vec![(handle, node)]);

        registry.unregister_body(handle);
        assert!(!registry.tracks_body(handle));
        assert_eq!(registry.body_count(), 0);
    }

    #[test]
    fn test_callbacks_for_untracked_handle_are_accepted() {
        let handle = test_handle();
        let mut registry = HandleRegistry::new();

        registry.set_callbacks(handle, EventCallbackSet::new().with_on_sleep(|| {}));
        assert!(registry.take_state_callback(handle, false).is_some());
    }

    #[test]
    fn test_taken_callback_is_restored() {
        let handle = test_handle();
        let mut registry = HandleRegistry::new();
        registry.set_callbacks(handle, EventCallbackSet::new().with_on_wake(|| {}));

        let callback = registry.take_state_callback(handle, true).unwrap();
        assert!(registry.take_state_callback(handle, true).is_none());

        registry.restore_state_callback(handle, true, callback);
        assert!(registry.take_state_callback(handle, true).is_some());
    }

    #[test]
    fn test_restore_after_clear_drops_callback() {
        let handle = test_handle();
        let mut registry = HandleRegistry::new();
        registry.set_callbacks(
            handle,
            EventCallbackSet::new().with_on_collision_enter(|_event| {}),
        );

        let callback = registry.take_enter_callback(handle).unwrap();
        registry.clear_callbacks(handle);
        registry.restore_enter_callback(handle, callback);

        assert!(registry.take_enter_callback(handle).is_none());
    }
}

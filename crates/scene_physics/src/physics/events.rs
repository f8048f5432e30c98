//! Physics event payloads and per-handle callback sets

use crate::foundation::math::Vec3;
use crate::scene::NodeId;
use rapier3d::prelude::RigidBodyHandle;

/// Callback invoked on a sleep or wake transition
pub type StateCallback = Box<dyn FnMut()>;

/// Callback invoked when a collision starts
pub type CollisionEnterCallback = Box<dyn FnMut(&CollisionEnter)>;

/// Callback invoked when a collision ends
pub type CollisionExitCallback = Box<dyn FnMut(&CollisionExit)>;

/// A single contact point copied out of the engine's contact manifold
#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    /// Contact position in the first collider's local space
    pub local_point_1: Vec3,
    /// Contact position in the second collider's local space
    pub local_point_2: Vec3,
    /// Signed distance between the contact points (negative = penetration)
    pub separation: f32,
}

/// Owned copy of the engine's first contact manifold for a collider pair
#[derive(Debug, Clone)]
pub struct ContactManifoldSummary {
    /// World-space contact normal
    pub normal: Vec3,
    /// Contact points of the manifold
    pub points: Vec<ContactPoint>,
}

/// Payload delivered to `on_collision_enter` callbacks
///
/// Both bodies of a collision record receive an independent payload with
/// the *other* body as `target`; the manifold and flipped flag are shared
/// between the two sides as provided by the engine.
#[derive(Debug, Clone)]
pub struct CollisionEnter {
    /// The other body involved in the collision
    pub target: RigidBodyHandle,
    /// The other body's scene node, when tracked
    pub target_node: Option<NodeId>,
    /// Contact manifold detail; `None` when the engine reports no pair
    /// data for the record (e.g. sensors)
    pub manifold: Option<ContactManifoldSummary>,
    /// Whether the engine stored the pair with the colliders swapped
    /// relative to the event record
    pub flipped: bool,
}

/// Payload delivered to `on_collision_exit` callbacks
///
/// No manifold is available once a contact has ended.
#[derive(Debug, Clone)]
pub struct CollisionExit {
    /// The other body involved in the collision
    pub target: RigidBodyHandle,
    /// The other body's scene node, when tracked
    pub target_node: Option<NodeId>,
}

/// Set of event callbacks registered for one rigid-body handle
///
/// All callbacks are optional; an empty set is valid and inert.
#[derive(Default)]
pub struct EventCallbackSet {
    pub(crate) on_sleep: Option<StateCallback>,
    pub(crate) on_wake: Option<StateCallback>,
    pub(crate) on_collision_enter: Option<CollisionEnterCallback>,
    pub(crate) on_collision_exit: Option<CollisionExitCallback>,
}

impl EventCallbackSet {
    /// Create an empty callback set
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke when the body falls asleep
    pub fn with_on_sleep<F: FnMut() + 'static>(mut self, callback: F) -> Self {
        self.on_sleep = Some(Box::new(callback));
        self
    }

    /// Invoke when the body wakes up
    pub fn with_on_wake<F: FnMut() + 'static>(mut self, callback: F) -> Self {
        self.on_wake = Some(Box::new(callback));
        self
    }

    /// Invoke when a collision involving the body starts
    pub fn with_on_collision_enter<F: FnMut(&CollisionEnter) + 'static>(
        mut self,
        callback: F,
    ) -> Self {
        self.on_collision_enter = Some(Box::new(callback));
        self
    }

    /// Invoke when a collision involving the body ends
    pub fn with_on_collision_exit<F: FnMut(&CollisionExit) + 'static>(
        mut self,
        callback: F,
    ) -> Self {
        self.on_collision_exit = Some(Box::new(callback));
        self
    }

    /// Whether no callback is registered at all
    pub fn is_empty(&self) -> bool {
        self.on_sleep.is_none()
            && self.on_wake.is_none()
            && self.on_collision_enter.is_none()
            && self.on_collision_exit.is_none()
    }
}

impl std::fmt::Debug for EventCallbackSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCallbackSet")
            .field("on_sleep", &self.on_sleep.is_some())
            .field("on_wake", &self.on_wake.is_some())
            .field("on_collision_enter", &self.on_collision_enter.is_some())
            .field("on_collision_exit", &self.on_collision_exit.is_some())
            .finish()
    }
}

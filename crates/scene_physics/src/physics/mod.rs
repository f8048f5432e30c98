//! Physics binding module
//!
//! Couples the scene graph to the rapier physics engine. The pieces:
//!
//! - [`PhysicsWorld`]: the rapier pipeline and body/collider/joint sets
//! - [`EventQueue`]: per-world collision event buffer, drained once per tick
//! - [`HandleRegistry`]: handle-to-node and handle-to-callback mappings,
//!   mutated by mount/unmount callers
//! - [`PhysicsStepper`]: the per-frame routine of clamped step, transform
//!   reconciliation, and event dispatch
//! - [`PhysicsBinding`]: facade wiring the above to a [`FrameScheduler`]
//!
//! [`FrameScheduler`]: crate::frame::FrameScheduler

pub mod binding;
pub mod dispatch;
pub mod events;
pub mod queue;
pub mod reconcile;
pub mod registry;
pub mod stepper;
pub mod world;

pub use binding::PhysicsBinding;
pub use dispatch::EventDispatcher;
pub use events::{
    CollisionEnter, CollisionEnterCallback, CollisionExit, CollisionExitCallback,
    ContactManifoldSummary, ContactPoint, EventCallbackSet, StateCallback,
};
pub use queue::EventQueue;
pub use registry::HandleRegistry;
pub use stepper::PhysicsStepper;
pub use world::PhysicsWorld;

use crate::scene::SceneGraph;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to the scene graph
pub type SharedSceneGraph = Rc<RefCell<SceneGraph>>;

/// Shared handle to the physics world
pub type SharedWorld = Rc<RefCell<PhysicsWorld>>;

/// Shared handle to the handle registry
pub type SharedRegistry = Rc<RefCell<HandleRegistry>>;

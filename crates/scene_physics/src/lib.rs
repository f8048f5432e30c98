//! # Scene Physics
//!
//! A binding layer that couples a hierarchical scene graph to the rapier
//! rigid-body physics engine.
//!
//! ## Features
//!
//! - **Frame Scheduling**: Ordered per-frame handler registry with
//!   start/stop lifecycle and global pause/resume
//! - **Physics Stepping**: Variable, clamped timestep driving the rapier
//!   pipeline once per frame
//! - **Transform Reconciliation**: Rigid-body poses written back into
//!   nested scene-graph nodes under arbitrary parent transforms
//! - **Physics Events**: Sleep/wake and collision enter/exit callbacks
//!   per tracked body
//! - **Headless Mode**: Inert scheduling for server/test environments
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_physics::prelude::*;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let scene = Rc::new(RefCell::new(SceneGraph::new()));
//! let binding = PhysicsBinding::with_world(Rc::clone(&scene), Vec3::new(0.0, -9.81, 0.0));
//!
//! let scheduler = FrameScheduler::new();
//! let _physics = binding.attach(&scheduler);
//!
//! let mut clock = FrameClock::new();
//! loop {
//!     scheduler.tick(clock.tick());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod frame;
pub mod physics;
pub mod scene;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, SimulationConfig},
        foundation::{
            math::{Mat4, Quat, Transform, Vec3},
            time::FrameClock,
        },
        frame::{FrameHandle, FrameHandlerOptions, FrameScheduler},
        physics::{
            CollisionEnter, CollisionExit, ContactManifoldSummary, EventCallbackSet,
            EventQueue, HandleRegistry, PhysicsBinding, PhysicsWorld,
        },
        scene::{NodeId, SceneError, SceneGraph},
    };
    pub use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};
}

//! Binding facade
//!
//! Wires a scene graph, a handle registry, and a physics stepper together
//! and exposes the surface mount/unmount callers and the host frame loop
//! interact with. Every collaborator receives its dependencies explicitly;
//! there is no ambient context.

use crate::config::SimulationConfig;
use crate::foundation::math::Vec3;
use crate::frame::{FrameHandle, FrameHandlerOptions, FrameScheduler};
use crate::physics::stepper::PhysicsStepper;
use crate::physics::world::PhysicsWorld;
use crate::physics::{SharedRegistry, SharedSceneGraph, SharedWorld};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// Couples a scene graph to a physics world
///
/// Cloneable handles to the registry and world are handed out so that
/// component-style callers (and event callbacks) can create and destroy
/// bodies and registrations at any time, including mid-tick.
pub struct PhysicsBinding {
    scene: SharedSceneGraph,
    registry: SharedRegistry,
    stepper: Rc<RefCell<PhysicsStepper>>,
}

impl PhysicsBinding {
    /// Create a binding with no world installed
    pub fn new(scene: SharedSceneGraph) -> Self {
        let registry: SharedRegistry = Rc::new(RefCell::new(crate::physics::HandleRegistry::new()));
        let stepper = Rc::new(RefCell::new(PhysicsStepper::new(
            Rc::clone(&scene),
            Rc::clone(&registry),
        )));
        Self {
            scene,
            registry,
            stepper,
        }
    }

    /// Create a binding and install a world with the given gravity
    pub fn with_world(scene: SharedSceneGraph, gravity: Vec3) -> Self {
        let binding = Self::new(scene);
        binding.install_world(PhysicsWorld::new(gravity));
        binding
    }

    /// Create a binding from a [`SimulationConfig`]
    pub fn from_config(scene: SharedSceneGraph, config: &SimulationConfig) -> Self {
        let binding = Self::with_world(scene, config.gravity_vector());
        binding
            .stepper
            .borrow_mut()
            .set_max_step_millis(config.max_step_millis);
        binding
    }

    /// Install a world, replacing any previous one (see
    /// [`PhysicsStepper::install_world`])
    ///
    /// Must not be called from inside a physics callback: the stepper is
    /// busy for the duration of a tick. Callbacks may freely mutate the
    /// world and the registry, but world replacement waits for the next
    /// frame.
    pub fn install_world(&self, world: PhysicsWorld) -> SharedWorld {
        self.stepper.borrow_mut().install_world(world)
    }

    /// Tear down the installed world
    ///
    /// Like [`install_world`](Self::install_world), not callable from
    /// inside a physics callback.
    pub fn remove_world(&self) {
        self.stepper.borrow_mut().remove_world();
    }

    /// The currently installed world, if any
    pub fn world(&self) -> Option<SharedWorld> {
        self.stepper.borrow().world()
    }

    /// The handle registry
    pub fn registry(&self) -> SharedRegistry {
        Rc::clone(&self.registry)
    }

    /// The scene graph
    pub fn scene(&self) -> SharedSceneGraph {
        Rc::clone(&self.scene)
    }

    /// Register the stepper with a frame scheduler
    ///
    /// The stepper samples its own clock rather than consuming the
    /// scheduler's delta, so a stalled frame loop is clamped at the step
    /// ceiling regardless of what the scheduler reports. Dropping the
    /// returned handle detaches physics from the loop.
    pub fn attach(&self, scheduler: &FrameScheduler) -> FrameHandle {
        let stepper = Rc::clone(&self.stepper);
        scheduler.register(
            move |_delta| stepper.borrow_mut().tick(),
            FrameHandlerOptions::default(),
        )
    }

    /// Run one physics tick immediately, outside any scheduler
    pub fn step_now(&self) {
        self.stepper.borrow_mut().tick();
    }

    /// Run one physics tick as if the current time were `now`
    pub fn step_at(&self, now: Instant) {
        self.stepper.borrow_mut().tick_at(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::events::EventCallbackSet;
    use crate::scene::SceneGraph;
    use approx::assert_relative_eq;
    use rapier3d::prelude::{ActiveEvents, ColliderBuilder, RigidBodyBuilder};
    use std::time::Duration;

    #[test]
    fn test_attached_binding_without_world_ticks_quietly() {
        let scene = Rc::new(RefCell::new(SceneGraph::new()));
        let binding = PhysicsBinding::new(Rc::clone(&scene));
        assert!(binding.world().is_none());

        let scheduler = FrameScheduler::new();
        let handle = binding.attach(&scheduler);
        assert!(handle.is_started());

        scheduler.tick(0.016);
    }

    #[test]
    fn test_full_loop_drops_ball_onto_ground() {
        let scene = Rc::new(RefCell::new(SceneGraph::new()));
        let binding = PhysicsBinding::with_world(Rc::clone(&scene), Vec3::new(0.0, -9.81, 0.0));
        let world = binding.world().unwrap();
        let registry = binding.registry();

        // Ground plane.
        let ground = world
            .borrow_mut()
            .create_rigid_body(RigidBodyBuilder::fixed());
        world
            .borrow_mut()
            .create_collider(ColliderBuilder::cuboid(20.0, 0.1, 20.0), ground);

        // Falling ball tracked by a node nested under an offset parent.
        let node = {
            let mut scene = scene.borrow_mut();
            let parent = scene.add_node();
            scene.set_local_position(parent, Vec3::new(5.0, 0.0, 0.0));
            scene.add_child(parent).unwrap()
        };
        let ball = world.borrow_mut().create_rigid_body(
            RigidBodyBuilder::dynamic().translation(Vec3::new(0.0, 3.0, 0.0)),
        );
        world.borrow_mut().create_collider(
            ColliderBuilder::ball(0.5).active_events(ActiveEvents::COLLISION_EVENTS),
            ball,
        );
        registry.borrow_mut().register_body(ball, node);

        let hits = Rc::new(RefCell::new(0));
        let hit_counter = Rc::clone(&hits);
        registry.borrow_mut().set_callbacks(
            ball,
            EventCallbackSet::new().with_on_collision_enter(move |event| {
                assert_eq!(event.target, ground);
                *hit_counter.borrow_mut() += 1;
            }),
        );

        let base = Instant::now();
        for frame in 1..=120 {
            binding.step_at(base + Duration::from_millis(16 * frame));
        }

        assert!(*hits.borrow() >= 1, "ball never reported hitting the ground");

        let ball_position = *world.borrow().rigid_body(ball).unwrap().translation();
        assert!(ball_position.y < 3.0);

        // The node's local frame accounts for the parent offset.
        let local = scene.borrow().local_transform(node).unwrap().position;
        assert_relative_eq!(local.x, ball_position.x - 5.0, epsilon = 1e-3);
    }

    #[test]
    fn test_reinstalling_world_discards_stale_state() {
        let scene = Rc::new(RefCell::new(SceneGraph::new()));
        let binding = PhysicsBinding::with_world(Rc::clone(&scene), Vec3::new(0.0, -9.81, 0.0));

        let first = binding.world().unwrap();
        let second = binding.install_world(PhysicsWorld::new(Vec3::zeros()));
        assert!(!Rc::ptr_eq(&first, &second));
        assert!(Rc::ptr_eq(&binding.world().unwrap(), &second));

        binding.remove_world();
        assert!(binding.world().is_none());
        binding.step_now();
    }
}

//! Per-frame physics stepping
//!
//! One tick advances the world by a clamped, variable timestep, then
//! reconciles tracked node transforms, then dispatches buffered events.
//! The phases run synchronously and in that order, so event callbacks
//! always observe already-updated transforms.

use crate::physics::dispatch::EventDispatcher;
use crate::physics::queue::EventQueue;
use crate::physics::world::PhysicsWorld;
use crate::physics::{reconcile, SharedRegistry, SharedSceneGraph, SharedWorld};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// Default ceiling for a single simulation step, in milliseconds
///
/// Bounds the worst-case step after a stall (e.g. a backgrounded window)
/// so the solver never takes a step large enough to tunnel bodies through
/// thin colliders.
pub const DEFAULT_MAX_STEP_MILLIS: f32 = 100.0;

fn clamp_step_millis(elapsed: f64, ceiling: f64) -> f64 {
    elapsed.min(ceiling)
}

/// Drives the physics world once per frame
///
/// Holds the world and its event queue, the wall-clock sample of the
/// previous tick, and the event dispatcher state. The scene graph and
/// handle registry are received at construction; nothing is discovered
/// ambiently.
pub struct PhysicsStepper {
    scene: SharedSceneGraph,
    registry: SharedRegistry,
    world: Option<SharedWorld>,
    queue: Option<EventQueue>,
    dispatcher: EventDispatcher,
    last_tick: Instant,
    max_step_millis: f32,
}

impl PhysicsStepper {
    /// Create a stepper with no world installed
    ///
    /// Ticks are no-ops until [`install_world`](Self::install_world) is
    /// called; initialization order is the caller's to choose.
    pub fn new(scene: SharedSceneGraph, registry: SharedRegistry) -> Self {
        Self {
            scene,
            registry,
            world: None,
            queue: None,
            dispatcher: EventDispatcher::new(),
            last_tick: Instant::now(),
            max_step_millis: DEFAULT_MAX_STEP_MILLIS,
        }
    }

    /// The currently installed world, if any
    pub fn world(&self) -> Option<SharedWorld> {
        self.world.clone()
    }

    /// The step ceiling in milliseconds
    pub fn max_step_millis(&self) -> f32 {
        self.max_step_millis
    }

    /// Override the step ceiling
    pub fn set_max_step_millis(&mut self, millis: f32) {
        self.max_step_millis = millis;
    }

    /// Install a world, replacing any previous one
    ///
    /// The previous queue and world are retired before the new queue is
    /// allocated and the world published, so a stale queue can never be
    /// stepped against the new world. The sleep-state cache is reset with
    /// them.
    pub fn install_world(&mut self, world: PhysicsWorld) -> SharedWorld {
        self.queue = None;
        self.world = None;
        self.dispatcher.reset();

        let world = Rc::new(RefCell::new(world));
        self.queue = Some(EventQueue::new());
        self.world = Some(Rc::clone(&world));
        log::debug!("physics world installed, fresh event queue allocated");
        world
    }

    /// Tear down the installed world and its queue
    pub fn remove_world(&mut self) {
        self.queue = None;
        self.world = None;
        self.dispatcher.reset();
        log::debug!("physics world removed");
    }

    /// Run one tick against the current wall clock
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Run one tick as if the current time were `now`
    ///
    /// Useful for deterministic hosts and tests. A tick with no world or
    /// queue installed is a silent no-op and does not advance the clock
    /// sample, so the first real tick after initialization is clamped
    /// like any stalled frame.
    pub fn tick_at(&mut self, now: Instant) {
        let (Some(world), Some(queue)) = (self.world.as_ref(), self.queue.as_ref()) else {
            return;
        };

        let elapsed_millis = now.saturating_duration_since(self.last_tick).as_secs_f64() * 1000.0;
        let delta_millis = clamp_step_millis(elapsed_millis, f64::from(self.max_step_millis));
        #[allow(clippy::cast_possible_truncation)]
        let dt_seconds = (delta_millis / 1000.0) as f32;

        world.borrow_mut().step(dt_seconds, queue);

        let tracked = self.registry.borrow().tracked_bodies();
        {
            let world = world.borrow();
            let mut scene = self.scene.borrow_mut();
            reconcile::sync_body_transforms(&world, &tracked, &mut scene);
        }

        self.dispatcher.run(world, &self.registry, queue);

        self.last_tick = now;
    }
}

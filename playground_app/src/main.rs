//! Physics playground
//!
//! Drops a stack of balls onto a platform while a parent rig slowly
//! rotates, demonstrating frame scheduling, physics-driven nested nodes,
//! and collision/sleep callbacks.

use rapier3d::prelude::{ActiveEvents, ColliderBuilder, RigidBodyBuilder};
use scene_physics::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

const FRAME_COUNT: u64 = 600;
const FRAME_TIME: Duration = Duration::from_millis(16);

fn main() {
    scene_physics::foundation::logging::init();
    log::info!("Starting physics playground...");

    let scene = Rc::new(RefCell::new(SceneGraph::new()));
    let binding = PhysicsBinding::from_config(Rc::clone(&scene), &SimulationConfig::default());
    let world = binding.world().expect("world installed from config");
    let registry = binding.registry();

    // Platform the balls land on.
    let platform = world
        .borrow_mut()
        .create_rigid_body(RigidBodyBuilder::fixed());
    world
        .borrow_mut()
        .create_collider(ColliderBuilder::cuboid(12.0, 0.2, 12.0), platform);

    // A slowly turning rig; the physics-driven nodes live underneath it so
    // their local transforms are reconciled against a moving parent frame.
    let rig = scene.borrow_mut().add_node();

    let mut balls = Vec::new();
    for i in 0..5 {
        let node = scene.borrow_mut().add_child(rig).expect("rig is alive");
        let height = 2.0 + 1.5 * i as f32;
        let body = world.borrow_mut().create_rigid_body(
            RigidBodyBuilder::dynamic().translation(Vec3::new(0.3 * i as f32, height, 0.0)),
        );
        let collider = world.borrow_mut().create_collider(
            ColliderBuilder::ball(0.5)
                .restitution(0.6)
                .active_events(ActiveEvents::COLLISION_EVENTS),
            body,
        );

        registry.borrow_mut().register_body(body, node);
        registry.borrow_mut().register_collider(collider, node);
        registry.borrow_mut().set_callbacks(
            body,
            EventCallbackSet::new()
                .with_on_collision_enter(move |event: &CollisionEnter| {
                    let points = event
                        .manifold
                        .as_ref()
                        .map_or(0, |manifold| manifold.points.len());
                    log::info!("ball {i} hit {:?} ({points} contact points)", event.target);
                })
                .with_on_sleep(move || log::info!("ball {i} fell asleep"))
                .with_on_wake(move || log::info!("ball {i} woke up")),
        );
        balls.push((body, node));
    }

    let scheduler = FrameScheduler::new();

    // Turn the rig ahead of the physics step each frame.
    let rig_scene = Rc::clone(&scene);
    let mut rig_angle = 0.0f32;
    let _spin = scheduler.register(
        move |delta| {
            rig_angle += 0.2 * delta;
            rig_scene
                .borrow_mut()
                .set_local_rotation(rig, Quat::from_axis_angle(&Vec3::y_axis(), rig_angle));
        },
        FrameHandlerOptions::default().with_order(0),
    );

    let _physics = binding.attach(&scheduler);

    let mut clock = FrameClock::new();
    for frame in 1..=FRAME_COUNT {
        scheduler.tick(clock.tick());

        if frame % 120 == 0 {
            let scene = scene.borrow();
            for (index, (_body, node)) in balls.iter().enumerate() {
                let world_matrix = scene.world_matrix(*node);
                log::info!(
                    "frame {frame}: ball {index} at ({:.2}, {:.2}, {:.2})",
                    world_matrix.m14,
                    world_matrix.m24,
                    world_matrix.m34
                );
            }
        }

        std::thread::sleep(FRAME_TIME);
    }

    log::info!("Playground finished after {FRAME_COUNT} frames");
}

//! Physics world wrapper around the rapier pipeline
//!
//! Owns the simulation state the binding layer steps once per frame and
//! exposes the world API mount/unmount callers use to create and destroy
//! bodies, colliders, and joints.

use crate::foundation::math::Vec3;
use crate::physics::events::{ContactManifoldSummary, ContactPoint};
use crate::physics::queue::EventQueue;
use rapier3d::prelude::{
    BroadPhase, CCDSolver, Collider, ColliderHandle, ColliderSet, GenericJoint, ImpulseJoint,
    ImpulseJointHandle, ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet,
    NarrowPhase, PhysicsPipeline, RigidBody, RigidBodyHandle, RigidBodySet,
};

/// Rigid-body simulation state for one world
///
/// One world per binding context. The sets are public so hosts can iterate
/// bodies and colliders directly; structural mutation (removal) goes
/// through the methods below because it must update the private pipeline
/// state as well.
pub struct PhysicsWorld {
    /// World gravity vector
    pub gravity: Vec3,
    /// Integration parameters; `dt` is overwritten on every step
    pub integration_parameters: IntegrationParameters,
    /// All rigid bodies of the world
    pub bodies: RigidBodySet,
    /// All colliders of the world
    pub colliders: ColliderSet,
    /// All impulse joints of the world
    pub impulse_joints: ImpulseJointSet,
    /// All multibody joints of the world
    pub multibody_joints: MultibodyJointSet,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -9.81, 0.0))
    }
}

impl PhysicsWorld {
    /// Create an empty world with the given gravity
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Advance the simulation by `dt_seconds`, recording collision events
    /// into `events`
    pub fn step(&mut self, dt_seconds: f32, events: &EventQueue) {
        self.integration_parameters.dt = dt_seconds;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            events,
        );
    }

    /// Insert a rigid body
    pub fn create_rigid_body(&mut self, body: impl Into<RigidBody>) -> RigidBodyHandle {
        self.bodies.insert(body)
    }

    /// Remove a rigid body and its attached colliders
    pub fn remove_rigid_body(&mut self, handle: RigidBodyHandle) -> Option<RigidBody> {
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        )
    }

    /// Insert a collider attached to a rigid body
    pub fn create_collider(
        &mut self,
        collider: impl Into<Collider>,
        parent: RigidBodyHandle,
    ) -> ColliderHandle {
        self.colliders
            .insert_with_parent(collider, parent, &mut self.bodies)
    }

    /// Remove a collider, waking the body it was attached to
    pub fn remove_collider(&mut self, handle: ColliderHandle) -> Option<Collider> {
        self.colliders
            .remove(handle, &mut self.island_manager, &mut self.bodies, true)
    }

    /// Insert an impulse joint between two bodies
    pub fn create_impulse_joint(
        &mut self,
        body1: RigidBodyHandle,
        body2: RigidBodyHandle,
        joint: impl Into<GenericJoint>,
        wake_up: bool,
    ) -> ImpulseJointHandle {
        self.impulse_joints.insert(body1, body2, joint, wake_up)
    }

    /// Remove an impulse joint
    pub fn remove_impulse_joint(
        &mut self,
        handle: ImpulseJointHandle,
        wake_up: bool,
    ) -> Option<ImpulseJoint> {
        self.impulse_joints.remove(handle, wake_up)
    }

    /// Look up a rigid body by handle
    pub fn rigid_body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    /// Look up a rigid body mutably by handle
    pub fn rigid_body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    /// Look up a collider by handle
    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    /// Look up a collider mutably by handle
    pub fn collider_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.colliders.get_mut(handle)
    }

    /// Resolve the rigid body a collider is attached to
    pub fn body_of_collider(&self, handle: ColliderHandle) -> Option<RigidBodyHandle> {
        self.colliders.get(handle).and_then(Collider::parent)
    }

    /// Copy out the first contact manifold for a collider pair
    ///
    /// Returns the manifold summary and whether the engine stored the pair
    /// with the colliders swapped relative to the given order. `None` when
    /// the narrow phase has no pair or the pair has no manifold.
    pub fn contact_summary(
        &self,
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    ) -> Option<(ContactManifoldSummary, bool)> {
        let pair = self.narrow_phase.contact_pair(collider1, collider2)?;
        let manifold = pair.manifolds.first()?;
        let summary = ContactManifoldSummary {
            normal: manifold.data.normal,
            points: manifold
                .points
                .iter()
                .map(|contact| ContactPoint {
                    local_point_1: contact.local_p1.coords,
                    local_point_2: contact.local_p2.coords,
                    separation: contact.dist,
                })
                .collect(),
        };
        Some((summary, pair.collider1 != collider1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::prelude::{ColliderBuilder, RigidBodyBuilder};

    #[test]
    fn test_dynamic_body_falls_under_gravity() {
        let mut world = PhysicsWorld::default();
        let queue = EventQueue::new();

        let body = world.create_rigid_body(
            RigidBodyBuilder::dynamic().translation(Vec3::new(0.0, 10.0, 0.0)),
        );
        world.create_collider(ColliderBuilder::ball(0.5), body);

        for _ in 0..30 {
            world.step(1.0 / 60.0, &queue);
        }

        let y = world.rigid_body(body).unwrap().translation().y;
        assert!(y < 10.0, "body should have fallen, y = {y}");
    }

    #[test]
    fn test_remove_rigid_body_removes_attached_collider() {
        let mut world = PhysicsWorld::default();
        let body = world.create_rigid_body(RigidBodyBuilder::dynamic());
        let collider = world.create_collider(ColliderBuilder::ball(0.5), body);

        assert_eq!(world.body_of_collider(collider), Some(body));

        world.remove_rigid_body(body);
        assert!(world.rigid_body(body).is_none());
        assert!(world.collider(collider).is_none());
    }

    #[test]
    fn test_contact_summary_for_touching_and_separated_pairs() {
        let mut world = PhysicsWorld::new(Vec3::zeros());
        let queue = EventQueue::new();

        let body_a = world.create_rigid_body(RigidBodyBuilder::dynamic());
        let collider_a = world.create_collider(ColliderBuilder::ball(0.5), body_a);
        let body_b = world.create_rigid_body(
            RigidBodyBuilder::dynamic().translation(Vec3::new(0.6, 0.0, 0.0)),
        );
        let collider_b = world.create_collider(ColliderBuilder::ball(0.5), body_b);

        let body_c = world.create_rigid_body(
            RigidBodyBuilder::dynamic().translation(Vec3::new(100.0, 0.0, 0.0)),
        );
        let collider_c = world.create_collider(ColliderBuilder::ball(0.5), body_c);

        world.step(1.0 / 60.0, &queue);

        assert!(world.contact_summary(collider_a, collider_b).is_some());
        assert!(world.contact_summary(collider_a, collider_c).is_none());
    }
}

//! Transform reconciliation
//!
//! Bodies simulate in a single global physics space, but the scene nodes
//! they drive may be nested under arbitrary parent transforms (grouping,
//! pivots). After each step, every tracked body's engine-space pose is
//! re-expressed in its node's parent frame and written into the node's
//! local transform, which is what makes physics-driven nodes composable
//! with ordinary scene-graph nesting.

use crate::foundation::math::{Mat4, Quat, Transform, Vec3};
use crate::physics::world::PhysicsWorld;
use crate::scene::{NodeId, SceneGraph};
use rapier3d::prelude::RigidBodyHandle;

/// Write engine poses back into the local transforms of tracked nodes
///
/// Entries are skipped, never failed, when the body is missing from the
/// world, sleeping, or fixed, or when the node is missing or has no parent
/// frame to express a relative transform against. Losing a parent to
/// concurrent teardown in the same tick is tolerated the same way.
pub(crate) fn sync_body_transforms(
    world: &PhysicsWorld,
    tracked: &[(RigidBodyHandle, NodeId)],
    scene: &mut SceneGraph,
) {
    for &(handle, node) in tracked {
        let Some(body) = world.rigid_body(handle) else {
            continue;
        };
        if body.is_sleeping() || body.is_fixed() {
            continue;
        }
        let Some(parent_world) = scene.parent_world_matrix(node) else {
            continue;
        };
        // The engine does not model non-uniform scale, so the node's
        // current world scale is captured and carried through unchanged.
        let world_scale = scene.world_scale(node);
        let Some(local) = engine_to_local(body.translation(), body.rotation(), &world_scale, &parent_world)
        else {
            continue;
        };
        scene.set_local_position(node, local.position);
        scene.set_local_rotation(node, local.rotation);
        // Local scale is left untouched.
    }
}

/// Re-express an engine-space pose in a parent-local frame
///
/// Composes translation + rotation + captured world scale into a matrix,
/// applies the inverse of the parent world matrix, and decomposes the
/// result. `None` when the parent matrix is singular.
pub(crate) fn engine_to_local(
    translation: &Vec3,
    rotation: &Quat,
    world_scale: &Vec3,
    parent_world: &Mat4,
) -> Option<Transform> {
    let parent_inverse = parent_world.try_inverse()?;
    let engine_matrix = Transform::from_parts(*translation, *rotation, *world_scale).to_matrix();
    Some(Transform::from_matrix(&(parent_inverse * engine_matrix)))
}

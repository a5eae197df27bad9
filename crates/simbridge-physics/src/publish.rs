//! Publishing of per-step body state into a host-owned buffer.

use bytemuck::{Pod, Zeroable};
use nalgebra::{Isometry3, Vector3};
use rapier3d::dynamics::RigidBodyHandle;

use crate::id::ActorId;
use crate::pose::{quat_to_xyzw, vec_to_array};

/// State of one active dynamic actor after a step.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct StepResultRecord {
    /// Actor id, or 0 for bodies the registry does not track.
    pub id: u32,
    /// World position.
    pub position: [f32; 3],
    /// World orientation as `[x, y, z, w]`.
    pub orientation: [f32; 4],
    /// Linear velocity.
    pub linear_velocity: [f32; 3],
    /// Angular velocity.
    pub angular_velocity: [f32; 3],
}

/// A body the engine moved during the last step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveTransform {
    /// Engine body.
    pub body: RigidBodyHandle,
    /// World pose after the step.
    pub pose: Isometry3<f32>,
    /// Linear velocity after the step.
    pub linear_velocity: Vector3<f32>,
    /// Angular velocity after the step.
    pub angular_velocity: Vector3<f32>,
}

/// Write one record per active transform into `out`, in engine order.
///
/// Stops when either the active set or `out` is exhausted and returns the
/// number of records written, which never exceeds `out.len()`. Unresolved
/// bodies are still published, with id [`ActorId::UNTRACKED`].
pub fn publish<F>(active: &[ActiveTransform], resolve: F, out: &mut [StepResultRecord]) -> usize
where
    F: Fn(RigidBodyHandle) -> Option<ActorId>,
{
    let mut written = 0;
    for (slot, transform) in out.iter_mut().zip(active) {
        let id = resolve(transform.body).unwrap_or(ActorId::UNTRACKED);
        *slot = StepResultRecord {
            id: id.get(),
            position: vec_to_array(&transform.pose.translation.vector),
            orientation: quat_to_xyzw(&transform.pose.rotation),
            linear_velocity: vec_to_array(&transform.linear_velocity),
            angular_velocity: vec_to_array(&transform.angular_velocity),
        };
        written += 1;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion};
    use rapier3d::dynamics::{RigidBodyBuilder, RigidBodySet};

    fn transforms(bodies: &mut RigidBodySet, count: usize) -> Vec<ActiveTransform> {
        (0..count)
            .map(|i| ActiveTransform {
                body: bodies.insert(RigidBodyBuilder::dynamic().build()),
                pose: Isometry3::from_parts(
                    Translation3::new(i as f32, 0.0, 1.0),
                    UnitQuaternion::identity(),
                ),
                linear_velocity: Vector3::new(0.0, 0.0, -(i as f32)),
                angular_velocity: Vector3::zeros(),
            })
            .collect()
    }

    #[test]
    fn test_preserves_engine_order() {
        let mut bodies = RigidBodySet::new();
        let active = transforms(&mut bodies, 3);
        let ids: Vec<_> = active.iter().map(|t| t.body).collect();
        let resolve = |h: RigidBodyHandle| ids.iter().position(|b| *b == h).map(|i| ActorId(10 + i as u32));

        let mut out = [StepResultRecord::default(); 8];
        assert_eq!(publish(&active, resolve, &mut out), 3);
        assert_eq!(out[0].id, 10);
        assert_eq!(out[2].id, 12);
        assert_eq!(out[2].position, [2.0, 0.0, 1.0]);
        assert_eq!(out[2].orientation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(out[2].linear_velocity, [0.0, 0.0, -2.0]);
        assert_eq!(out[3], StepResultRecord::default());
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut bodies = RigidBodySet::new();
        let active = transforms(&mut bodies, 5);
        let mut out = [StepResultRecord::default(); 2];
        assert_eq!(publish(&active, |_| Some(ActorId(1)), &mut out), 2);

        let mut empty: [StepResultRecord; 0] = [];
        assert_eq!(publish(&active, |_| Some(ActorId(1)), &mut empty), 0);
    }

    #[test]
    fn test_unresolved_written_as_zero() {
        let mut bodies = RigidBodySet::new();
        let active = transforms(&mut bodies, 2);
        let tracked = active[1].body;
        let mut out = [StepResultRecord::default(); 2];
        let written = publish(
            &active,
            |h: RigidBodyHandle| (h == tracked).then_some(ActorId(9)),
            &mut out,
        );
        assert_eq!(written, 2);
        assert_eq!(out[0].id, 0);
        assert_eq!(out[0].position, [0.0, 0.0, 1.0]);
        assert_eq!(out[1].id, 9);
    }
}

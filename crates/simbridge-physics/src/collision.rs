//! Per-step collision accumulation.
//!
//! The engine hands over one [`ContactPairEvent`] per colliding pair after
//! every step. [`CollisionSink`] keeps the points of pairs that started or
//! kept touching, up to a fixed capacity, until the host drains them.

use bytemuck::{Pod, Zeroable};
use rapier3d::dynamics::RigidBodyHandle;

use crate::id::ActorId;

/// One contact point, as reported to the host.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CollisionRecord {
    /// First actor of the pair.
    pub actor1: u32,
    /// Second actor of the pair.
    pub actor2: u32,
    /// World-space contact position.
    pub position: [f32; 3],
    /// World-space contact normal.
    pub normal: [f32; 3],
    /// Signed separation; negative while penetrating.
    pub penetration: f32,
}

/// Touch transition of a pair during the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchState {
    /// The pair started touching this step.
    Found,
    /// The pair was already touching and still is.
    Persists,
    /// The pair stopped touching this step.
    Lost,
}

/// A contact point extracted from the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactPoint {
    /// World-space position.
    pub position: [f32; 3],
    /// World-space normal.
    pub normal: [f32; 3],
    /// Signed separation.
    pub separation: f32,
}

/// Contacts between two colliders after a step.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactPairEvent {
    /// Body owning the first collider, if any.
    pub body1: Option<RigidBodyHandle>,
    /// Body owning the second collider, if any.
    pub body2: Option<RigidBodyHandle>,
    /// Touch transition.
    pub touch: TouchState,
    /// Extracted contact points.
    pub points: Vec<ContactPoint>,
}

/// Fixed-capacity store of the collisions seen during one step.
#[derive(Debug)]
pub struct CollisionSink {
    records: Vec<CollisionRecord>,
    count: usize,
}

impl CollisionSink {
    /// Create a sink that holds at most `capacity` records per step.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: vec![CollisionRecord::zeroed(); capacity],
            count: 0,
        }
    }

    /// Maximum records kept per step.
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Records written since the last drain.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether nothing has been written since the last drain.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Change the capacity. Pending records are discarded.
    pub fn resize(&mut self, capacity: usize) {
        self.records = vec![CollisionRecord::zeroed(); capacity];
        self.count = 0;
    }

    /// Accumulate a batch of contact pairs.
    ///
    /// Only pairs that started or kept touching are recorded, and only when
    /// both bodies resolve to tracked actors. Points beyond capacity are
    /// dropped without error.
    pub fn on_contact_pairs<F>(&mut self, pairs: &[ContactPairEvent], resolve: F)
    where
        F: Fn(RigidBodyHandle) -> Option<ActorId>,
    {
        for pair in pairs {
            if pair.touch == TouchState::Lost {
                continue;
            }
            let actor1 = pair.body1.and_then(&resolve);
            let actor2 = pair.body2.and_then(&resolve);
            let (Some(actor1), Some(actor2)) = (actor1, actor2) else {
                continue;
            };

            for point in &pair.points {
                if self.count >= self.records.len() {
                    return;
                }
                self.records[self.count] = CollisionRecord {
                    actor1: actor1.get(),
                    actor2: actor2.get(),
                    position: point.position,
                    normal: point.normal,
                    penetration: point.separation,
                };
                self.count += 1;
            }
        }
    }

    /// Hand out the records of the finished step and start the next one
    /// empty.
    pub fn drain(&mut self) -> &[CollisionRecord] {
        let count = std::mem::take(&mut self.count);
        &self.records[..count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::dynamics::{RigidBodyBuilder, RigidBodySet};

    fn point(x: f32) -> ContactPoint {
        ContactPoint {
            position: [x, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            separation: -0.01,
        }
    }

    struct Fixture {
        a: RigidBodyHandle,
        b: RigidBodyHandle,
        untracked: RigidBodyHandle,
    }

    impl Fixture {
        fn new() -> Self {
            let mut bodies = RigidBodySet::new();
            Self {
                a: bodies.insert(RigidBodyBuilder::dynamic().build()),
                b: bodies.insert(RigidBodyBuilder::dynamic().build()),
                untracked: bodies.insert(RigidBodyBuilder::fixed().build()),
            }
        }

        fn resolve(&self, handle: RigidBodyHandle) -> Option<ActorId> {
            if handle == self.a {
                Some(ActorId(1))
            } else if handle == self.b {
                Some(ActorId(2))
            } else {
                None
            }
        }

        fn pair(&self, touch: TouchState, points: usize) -> ContactPairEvent {
            ContactPairEvent {
                body1: Some(self.a),
                body2: Some(self.b),
                touch,
                points: (0..points).map(|i| point(i as f32)).collect(),
            }
        }
    }

    #[test]
    fn test_records_found_and_persisting_pairs() {
        let fx = Fixture::new();
        let mut sink = CollisionSink::with_capacity(8);
        let pairs = vec![
            fx.pair(TouchState::Found, 2),
            fx.pair(TouchState::Persists, 1),
            fx.pair(TouchState::Lost, 3),
        ];
        sink.on_contact_pairs(&pairs, |h| fx.resolve(h));

        let records = sink.drain();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].actor1, 1);
        assert_eq!(records[0].actor2, 2);
        assert_eq!(records[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(records[2].penetration, -0.01);
    }

    #[test]
    fn test_skips_untracked_pairs() {
        let fx = Fixture::new();
        let mut sink = CollisionSink::with_capacity(8);
        let mut ground = fx.pair(TouchState::Found, 2);
        ground.body2 = Some(fx.untracked);
        let mut parentless = fx.pair(TouchState::Found, 2);
        parentless.body1 = None;
        sink.on_contact_pairs(&[ground, parentless], |h| fx.resolve(h));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_truncates_at_capacity() {
        let fx = Fixture::new();
        let mut sink = CollisionSink::with_capacity(4);
        let pairs = vec![fx.pair(TouchState::Found, 3), fx.pair(TouchState::Found, 3)];
        sink.on_contact_pairs(&pairs, |h| fx.resolve(h));
        assert_eq!(sink.len(), 4);

        // Further batches in the same step write nothing.
        sink.on_contact_pairs(&pairs, |h| fx.resolve(h));
        assert_eq!(sink.drain().len(), 4);
    }

    #[test]
    fn test_second_drain_is_empty() {
        let fx = Fixture::new();
        let mut sink = CollisionSink::with_capacity(4);
        sink.on_contact_pairs(&[fx.pair(TouchState::Found, 2)], |h| fx.resolve(h));
        assert_eq!(sink.drain().len(), 2);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn test_zero_capacity() {
        let fx = Fixture::new();
        let mut sink = CollisionSink::with_capacity(0);
        sink.on_contact_pairs(&[fx.pair(TouchState::Found, 2)], |h| fx.resolve(h));
        assert!(sink.drain().is_empty());
    }
}

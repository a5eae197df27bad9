//! Id-keyed stores of live entities and joints.

use std::collections::HashMap;

use nalgebra::Isometry3;
use parking_lot::Mutex;
use rapier3d::dynamics::ImpulseJointHandle;
use tracing::debug;

use crate::engine::RapierEngine;
use crate::entity::{EntityKind, RigidEntity};
use crate::error::{BridgeError, Result};
use crate::id::{ActorId, JointId};

/// The actors of one scene, each behind its own lock.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    actors: HashMap<ActorId, Mutex<RigidEntity>>,
}

impl EntityRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an actor in the engine and register it under `id`.
    pub fn create(
        &mut self,
        engine: &mut RapierEngine,
        id: ActorId,
        kind: EntityKind,
        pose: Isometry3<f32>,
    ) -> Result<&Mutex<RigidEntity>> {
        if self.actors.contains_key(&id) {
            return Err(BridgeError::DuplicateActor(id));
        }
        let body = engine.create_body(id, kind, pose);
        debug!(actor = %id, ?kind, "created actor");
        Ok(self
            .actors
            .entry(id)
            .or_insert_with(|| Mutex::new(RigidEntity::new(id, kind, body))))
    }

    /// Actor registered under `id`.
    pub fn lookup(&self, id: ActorId) -> Option<&Mutex<RigidEntity>> {
        self.actors.get(&id)
    }

    /// Actor registered under `id`, without locking.
    pub fn lookup_mut(&mut self, id: ActorId) -> Option<&mut RigidEntity> {
        self.actors.get_mut(&id).map(|m| m.get_mut())
    }

    /// Unregister an actor and take its body out of the engine, waking
    /// whatever it was touching.
    pub fn remove(&mut self, engine: &mut RapierEngine, id: ActorId) -> Result<RigidEntity> {
        let entity = self
            .actors
            .remove(&id)
            .ok_or(BridgeError::ActorNotFound(id))?
            .into_inner();
        engine.remove_body(entity.body());
        debug!(
            actor = %entity.id(),
            kind = ?entity.kind(),
            shapes = entity.shape_count(),
            "removed actor"
        );
        Ok(entity)
    }

    /// Whether an actor is registered under `id`.
    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Number of registered actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Whether no actor is registered.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

/// A registered joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointRecord {
    /// Joint id.
    pub id: JointId,
    /// First actor, or [`ActorId::UNTRACKED`] for the world frame.
    pub actor1: ActorId,
    /// Second actor, or [`ActorId::UNTRACKED`] for the world frame.
    pub actor2: ActorId,
    /// Engine joint.
    pub handle: ImpulseJointHandle,
}

/// The joints of one scene.
#[derive(Debug, Default)]
pub struct JointRegistry {
    joints: HashMap<JointId, JointRecord>,
}

impl JointRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a joint. Fails if the id is taken.
    pub fn insert(&mut self, record: JointRecord) -> Result<()> {
        if self.joints.contains_key(&record.id) {
            return Err(BridgeError::DuplicateJoint(record.id));
        }
        self.joints.insert(record.id, record);
        Ok(())
    }

    /// Whether a joint is registered under `id`.
    pub fn contains(&self, id: JointId) -> bool {
        self.joints.contains_key(&id)
    }

    /// Joint registered under `id`.
    pub fn lookup(&self, id: JointId) -> Option<&JointRecord> {
        self.joints.get(&id)
    }

    /// Unregister a joint.
    pub fn remove(&mut self, id: JointId) -> Result<JointRecord> {
        self.joints.remove(&id).ok_or(BridgeError::JointNotFound(id))
    }

    /// Number of registered joints.
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Whether no joint is registered.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

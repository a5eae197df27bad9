//! Actor aggregates.
//!
//! An aggregate groups actors under one id so the host can manage them as a
//! unit. Rapier has no broad-phase aggregates, so this is bookkeeping only.

use std::collections::{BTreeSet, HashMap};

use crate::error::{BridgeError, Result};
use crate::id::{ActorId, AggregateId};

/// A bounded group of actors.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    id: AggregateId,
    max_actors: usize,
    members: BTreeSet<ActorId>,
}

impl Aggregate {
    /// Empty aggregate holding at most `max_actors`.
    pub fn new(id: AggregateId, max_actors: usize) -> Self {
        Self {
            id,
            max_actors,
            members: BTreeSet::new(),
        }
    }

    /// Aggregate id.
    pub fn id(&self) -> AggregateId {
        self.id
    }

    /// Capacity.
    pub fn max_actors(&self) -> usize {
        self.max_actors
    }

    /// Members, ascending.
    pub fn members(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.members.iter().copied()
    }

    /// Whether `actor` is a member.
    pub fn contains(&self, actor: ActorId) -> bool {
        self.members.contains(&actor)
    }

    /// Add a member. Re-adding an existing member is a no-op.
    pub fn add(&mut self, actor: ActorId) -> Result<()> {
        if self.members.contains(&actor) {
            return Ok(());
        }
        if self.members.len() >= self.max_actors {
            return Err(BridgeError::AggregateFull(self.id));
        }
        self.members.insert(actor);
        Ok(())
    }

    /// Remove a member; returns whether it was present.
    pub fn remove(&mut self, actor: ActorId) -> bool {
        self.members.remove(&actor)
    }
}

/// The aggregates of one scene.
#[derive(Debug, Default)]
pub struct AggregateRegistry {
    aggregates: HashMap<AggregateId, Aggregate>,
}

impl AggregateRegistry {
    /// Register a new aggregate.
    pub fn create(&mut self, id: AggregateId, max_actors: usize) -> Result<()> {
        if self.aggregates.contains_key(&id) {
            return Err(BridgeError::DuplicateAggregate(id));
        }
        self.aggregates.insert(id, Aggregate::new(id, max_actors));
        Ok(())
    }

    /// Aggregate registered under `id`.
    pub fn get(&self, id: AggregateId) -> Result<&Aggregate> {
        self.aggregates
            .get(&id)
            .ok_or(BridgeError::AggregateNotFound(id))
    }

    /// Mutable aggregate registered under `id`.
    pub fn get_mut(&mut self, id: AggregateId) -> Result<&mut Aggregate> {
        self.aggregates
            .get_mut(&id)
            .ok_or(BridgeError::AggregateNotFound(id))
    }

    /// Unregister an aggregate. Its members stay in the scene.
    pub fn remove(&mut self, id: AggregateId) -> Result<Aggregate> {
        self.aggregates
            .remove(&id)
            .ok_or(BridgeError::AggregateNotFound(id))
    }

    /// Drop `actor` from every aggregate.
    pub fn forget_actor(&mut self, actor: ActorId) {
        for aggregate in self.aggregates.values_mut() {
            aggregate.remove(actor);
        }
    }

    /// Whether there are no aggregates.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }
}

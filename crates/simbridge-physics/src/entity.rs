//! Rigid entities and their shapes.

use std::cmp::Ordering;
use std::collections::HashMap;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use rapier3d::dynamics::RigidBodyHandle;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::RapierEngine;
use crate::error::{BridgeError, Result};
use crate::id::{ActorId, ShapeId};
use crate::shape::{ShapeGeometry, ShapeMaterial, ShapeRecord};

/// Whether an entity is moved by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Fixed in place; has no meaningful mass.
    Static,
    /// Simulated body.
    Dynamic,
}

/// A registered rigid body with its shapes.
#[derive(Debug)]
pub struct RigidEntity {
    id: ActorId,
    kind: EntityKind,
    body: RigidBodyHandle,
    name: String,
    shapes: HashMap<ShapeId, ShapeRecord>,
    mass_updates: usize,
}

impl RigidEntity {
    /// Wrap a body already created in the engine.
    pub(crate) fn new(id: ActorId, kind: EntityKind, body: RigidBodyHandle) -> Self {
        Self {
            id,
            kind,
            body,
            name: String::new(),
            shapes: HashMap::new(),
            mass_updates: 0,
        }
    }

    /// Actor id.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Static or dynamic.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Whether the entity is simulated.
    pub fn is_dynamic(&self) -> bool {
        self.kind == EntityKind::Dynamic
    }

    /// Engine body.
    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the entity.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Shape with the given id.
    pub fn shape(&self, id: ShapeId) -> Option<&ShapeRecord> {
        self.shapes.get(&id)
    }

    /// Ids of all attached shapes, ascending.
    pub fn shape_ids(&self) -> Vec<ShapeId> {
        let mut ids: Vec<ShapeId> = self.shapes.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of attached shapes.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// How many times mass and inertia have been recomputed.
    pub fn mass_updates(&self) -> usize {
        self.mass_updates
    }

    /// Attach a new shape and recompute mass.
    pub fn add_shape(
        &mut self,
        engine: &mut RapierEngine,
        shape_id: ShapeId,
        geometry: &ShapeGeometry,
        material: &ShapeMaterial,
        density: f32,
        default_density: f32,
    ) -> Result<()> {
        if self.shapes.contains_key(&shape_id) {
            return Err(BridgeError::DuplicateShape {
                actor: self.id,
                shape: shape_id,
            });
        }
        let shape = geometry.to_shared_shape()?;
        let collider = engine.attach_collider(self.body, shape, material, density.max(0.0));
        self.shapes
            .insert(shape_id, ShapeRecord::new(shape_id, collider, density));
        debug!(actor = %self.id, shape = %shape_id, "attached shape");

        self.recompute_mass(engine, default_density);
        Ok(())
    }

    /// Detach a shape if present. Mass is recomputed either way.
    pub fn detach_shape(
        &mut self,
        engine: &mut RapierEngine,
        shape_id: ShapeId,
        default_density: f32,
    ) -> Option<ShapeRecord> {
        let removed = self.shapes.remove(&shape_id);
        if let Some(record) = &removed {
            engine.detach_collider(record.collider());
            debug!(actor = %self.id, shape = %record.id(), "detached shape");
        }
        self.recompute_mass(engine, default_density);
        removed
    }

    /// Change one shape's density and recompute mass.
    pub fn set_shape_density(
        &mut self,
        engine: &mut RapierEngine,
        shape_id: ShapeId,
        density: f32,
        default_density: f32,
    ) -> Result<()> {
        let actor = self.id;
        let record = self
            .shapes
            .get_mut(&shape_id)
            .ok_or(BridgeError::ShapeNotFound {
                actor,
                shape: shape_id,
            })?;
        if !record.set_density(density) {
            return Err(BridgeError::InvalidDensity(density));
        }
        self.recompute_mass(engine, default_density);
        Ok(())
    }

    /// Set every shape to the same density and recompute once.
    pub fn set_density(
        &mut self,
        engine: &mut RapierEngine,
        density: f32,
        default_density: f32,
    ) -> Result<()> {
        if !self.is_dynamic() {
            return Err(BridgeError::NotDynamic(self.id));
        }
        if density < 0.0 {
            return Err(BridgeError::InvalidDensity(density));
        }
        for record in self.shapes.values_mut() {
            record.set_density(density);
        }
        self.recompute_mass(engine, default_density);
        Ok(())
    }

    /// Push shape densities to the engine and refresh mass and inertia.
    ///
    /// Densities are listed in the engine's collider order. Non-positive
    /// densities fall back to `default_density`. Static entities and
    /// entities without shapes are left alone.
    pub fn recompute_mass(&mut self, engine: &mut RapierEngine, default_density: f32) {
        self.mass_updates += 1;
        if !self.is_dynamic() || self.shapes.is_empty() {
            return;
        }

        let by_collider: HashMap<_, f32> = self
            .shapes
            .values()
            .map(|s| (s.collider(), s.density()))
            .collect();
        let densities: Vec<f32> = engine
            .body_colliders(self.body)
            .iter()
            .map(|c| match by_collider.get(c) {
                Some(d) if *d > 0.0 => *d,
                _ => default_density,
            })
            .collect();

        engine.update_mass_and_inertia(self.body, &densities);
    }

    /// Total mass. Always 0 for static entities.
    pub fn mass(&self, engine: &RapierEngine) -> f32 {
        if self.is_dynamic() {
            engine.mass(self.body)
        } else {
            0.0
        }
    }

    /// Override the total mass.
    pub fn set_mass(&mut self, engine: &mut RapierEngine, mass: f32) -> Result<()> {
        if !self.is_dynamic() {
            return Err(BridgeError::NotDynamic(self.id));
        }
        if !engine.set_mass_and_update_inertia(self.body, mass) {
            return Err(BridgeError::InvalidMass(mass));
        }
        Ok(())
    }

    /// World pose.
    pub fn pose(&self, engine: &RapierEngine) -> Isometry3<f32> {
        engine.pose(self.body).unwrap_or_else(Isometry3::identity)
    }

    /// Move the entity, keeping its orientation.
    pub fn set_position(&mut self, engine: &mut RapierEngine, position: Vector3<f32>) {
        let mut pose = self.pose(engine);
        pose.translation = Translation3::from(position);
        engine.set_pose(self.body, pose);
    }

    /// Rotate the entity, keeping its position.
    pub fn set_rotation(&mut self, engine: &mut RapierEngine, rotation: UnitQuaternion<f32>) {
        let mut pose = self.pose(engine);
        pose.rotation = rotation;
        engine.set_pose(self.body, pose);
    }

    /// Replace position and orientation together.
    pub fn set_transformation(&mut self, engine: &mut RapierEngine, pose: Isometry3<f32>) {
        engine.set_pose(self.body, pose);
    }

    /// Linear velocity; zero for static entities.
    pub fn linear_velocity(&self, engine: &RapierEngine) -> Vector3<f32> {
        engine
            .velocities(self.body)
            .map(|(linear, _)| linear)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Angular velocity; zero for static entities.
    pub fn angular_velocity(&self, engine: &RapierEngine) -> Vector3<f32> {
        engine
            .velocities(self.body)
            .map(|(_, angular)| angular)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Set the linear velocity of a dynamic entity.
    pub fn set_linear_velocity(&mut self, engine: &mut RapierEngine, v: Vector3<f32>) -> Result<()> {
        if !self.is_dynamic() {
            return Err(BridgeError::NotDynamic(self.id));
        }
        engine.set_linear_velocity(self.body, v);
        Ok(())
    }

    /// Set the angular velocity of a dynamic entity.
    pub fn set_angular_velocity(&mut self, engine: &mut RapierEngine, v: Vector3<f32>) -> Result<()> {
        if !self.is_dynamic() {
            return Err(BridgeError::NotDynamic(self.id));
        }
        engine.set_angular_velocity(self.body, v);
        Ok(())
    }

    /// Apply a force for the next step.
    pub fn add_force(&mut self, engine: &mut RapierEngine, force: Vector3<f32>) -> Result<()> {
        if !self.is_dynamic() {
            return Err(BridgeError::NotDynamic(self.id));
        }
        engine.add_force(self.body, force);
        Ok(())
    }

    /// Turn scene gravity on or off for this entity.
    pub fn enable_gravity(&mut self, engine: &mut RapierEngine, enabled: bool) -> Result<()> {
        if !self.is_dynamic() {
            return Err(BridgeError::NotDynamic(self.id));
        }
        engine.enable_gravity(self.body, enabled);
        Ok(())
    }
}

impl PartialEq for RigidEntity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RigidEntity {}

impl PartialOrd for RigidEntity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RigidEntity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

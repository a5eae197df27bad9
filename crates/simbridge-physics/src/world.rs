//! The physics world the host drives.
//!
//! [`PhysicsWorld`] owns one optional scene behind a world-level
//! read/write lock. Structural changes (actors, shapes, mass, joints,
//! aggregates) take the write lock. Per-actor pose and velocity access and
//! the step itself take the read lock; the step then holds the engine lock
//! until results are drained.

use nalgebra::Vector3;
use parking_lot::{Mutex, RwLock};
use rapier3d::dynamics::RigidBodyHandle;
use rapier3d::geometry::ColliderHandle;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::AggregateRegistry;
use crate::collision::{CollisionRecord, CollisionSink};
use crate::engine::RapierEngine;
use crate::entity::{EntityKind, RigidEntity};
use crate::error::{BridgeError, Result};
use crate::id::{ActorId, AggregateId, JointId, ShapeId};
use crate::joints::{AxisLimits, D6JointDesc};
use crate::pose::{array_to_vec, isometry, quat_from_xyzw, quat_to_xyzw, vec_to_array};
use crate::publish::{publish, StepResultRecord};
use crate::registry::{EntityRegistry, JointRecord, JointRegistry};
use crate::settings::WorldSettings;
use crate::shape::{ShapeGeometry, ShapeMaterial};

/// Request to create an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorDesc {
    /// Actor id.
    pub id: ActorId,
    /// Static or dynamic.
    pub kind: EntityKind,
    /// Initial world position.
    #[serde(default)]
    pub position: [f32; 3],
    /// Initial orientation as `[x, y, z, w]`.
    #[serde(default = "identity_xyzw")]
    pub rotation: [f32; 4],
    /// Display name.
    #[serde(default)]
    pub name: String,
}

fn identity_xyzw() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl ActorDesc {
    /// Actor at the origin with identity orientation.
    pub fn new(id: ActorId, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            position: [0.0; 3],
            rotation: identity_xyzw(),
            name: String::new(),
        }
    }

    /// Set the initial position.
    pub fn at(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }
}

/// Request to attach a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDesc {
    /// Geometry.
    pub geometry: ShapeGeometry,
    /// Surface material.
    #[serde(default)]
    pub material: ShapeMaterial,
    /// Density; negative values are stored as 0.
    pub density: f32,
}

impl ShapeDesc {
    /// Shape with the default material.
    pub fn new(geometry: ShapeGeometry, density: f32) -> Self {
        Self {
            geometry,
            material: ShapeMaterial::default(),
            density,
        }
    }
}

/// Request to create a joint.
///
/// An actor id of 0, or one that is not registered, attaches that side to
/// the world frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointDesc {
    /// Joint id.
    pub id: JointId,
    /// First actor.
    pub actor1: ActorId,
    /// Second actor.
    pub actor2: ActorId,
    /// Joint frame position relative to the first actor.
    pub frame1_position: [f32; 3],
    /// Joint frame orientation relative to the first actor.
    pub frame1_rotation: [f32; 4],
    /// Joint frame position relative to the second actor.
    pub frame2_position: [f32; 3],
    /// Joint frame orientation relative to the second actor.
    pub frame2_rotation: [f32; 4],
    /// Per-axis limits.
    pub limits: AxisLimits,
}

/// Records written by one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepCounts {
    /// Step results written.
    pub updates: usize,
    /// Collision records written.
    pub collisions: usize,
}

struct Scene {
    engine: Mutex<RapierEngine>,
    actors: EntityRegistry,
    joints: JointRegistry,
    aggregates: AggregateRegistry,
    collisions: Mutex<CollisionSink>,
    ground_plane: Option<ColliderHandle>,
}

impl Scene {
    fn new(settings: &WorldSettings) -> Self {
        Self {
            engine: Mutex::new(RapierEngine::new(settings)),
            actors: EntityRegistry::new(),
            joints: JointRegistry::new(),
            aggregates: AggregateRegistry::default(),
            collisions: Mutex::new(CollisionSink::with_capacity(settings.max_collisions)),
            ground_plane: None,
        }
    }

    /// Entity and engine, both borrowed from an exclusively held scene.
    fn split(&mut self, id: ActorId) -> Result<(&mut RigidEntity, &mut RapierEngine)> {
        let entity = self
            .actors
            .lookup_mut(id)
            .ok_or(BridgeError::ActorNotFound(id))?;
        Ok((entity, self.engine.get_mut()))
    }

    fn joint_side(&mut self, id: ActorId) -> (ActorId, Option<RigidBodyHandle>) {
        if id == ActorId::UNTRACKED {
            return (ActorId::UNTRACKED, None);
        }
        match self.actors.lookup_mut(id) {
            Some(entity) => (id, Some(entity.body())),
            None => {
                debug!(actor = %id, "joint side not registered, using world frame");
                (ActorId::UNTRACKED, None)
            }
        }
    }
}

/// A physics world with at most one live scene.
pub struct PhysicsWorld {
    settings: WorldSettings,
    scene: RwLock<Option<Scene>>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(WorldSettings::default())
    }
}

impl PhysicsWorld {
    /// Create a world. No scene exists until [`create_scene`](Self::create_scene).
    pub fn new(settings: WorldSettings) -> Self {
        Self {
            settings,
            scene: RwLock::new(None),
        }
    }

    /// Settings the world was created with.
    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    fn with_scene<T>(&self, op: &'static str, f: impl FnOnce(&Scene) -> Result<T>) -> Result<T> {
        let guard = self.scene.read();
        guard
            .as_ref()
            .ok_or(BridgeError::NotInitialized)
            .and_then(f)
            .inspect_err(|e| warn!(op, error = %e, "physics request failed"))
    }

    fn with_scene_mut<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Scene) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.scene.write();
        guard
            .as_mut()
            .ok_or(BridgeError::NotInitialized)
            .and_then(f)
            .inspect_err(|e| warn!(op, error = %e, "physics request failed"))
    }

    /// Run `f` on one actor with its lock and the engine lock held.
    fn with_actor<T>(
        &self,
        op: &'static str,
        id: ActorId,
        f: impl FnOnce(&mut RigidEntity, &mut RapierEngine) -> Result<T>,
    ) -> Result<T> {
        self.with_scene(op, |scene| {
            let entity = scene
                .actors
                .lookup(id)
                .ok_or(BridgeError::ActorNotFound(id))?;
            let mut entity = entity.lock();
            let mut engine = scene.engine.lock();
            f(&mut entity, &mut engine)
        })
    }

    // Scene lifecycle

    /// Create the scene.
    pub fn create_scene(&self) -> Result<()> {
        let mut guard = self.scene.write();
        if guard.is_some() {
            warn!("scene already initialized");
            return Err(BridgeError::AlreadyInitialized);
        }
        *guard = Some(Scene::new(&self.settings));
        info!(gravity = ?self.settings.gravity, "scene created");
        Ok(())
    }

    /// Drop the scene with every actor, joint and aggregate in it.
    pub fn release_scene(&self) -> Result<()> {
        let released = self.scene.write().take();
        match released {
            Some(scene) => {
                info!(
                    actors = scene.actors.len(),
                    bodies = scene.engine.lock().body_count(),
                    "scene released"
                );
                Ok(())
            }
            None => {
                warn!("release requested without a scene");
                Err(BridgeError::NotInitialized)
            }
        }
    }

    /// Whether a scene exists.
    pub fn is_initialized(&self) -> bool {
        self.scene.read().is_some()
    }

    // Actors

    /// Create an actor.
    pub fn create_actor(&self, desc: &ActorDesc) -> Result<()> {
        self.with_scene_mut("create_actor", |scene| {
            let engine = scene.engine.get_mut();
            let pose = isometry(desc.position, desc.rotation);
            let entity = scene.actors.create(engine, desc.id, desc.kind, pose)?;
            entity.lock().set_name(desc.name.clone());
            Ok(())
        })
    }

    /// Create an actor with one shape in a single request.
    ///
    /// If the shape cannot be built the actor is not created.
    pub fn create_actor_with_shape(
        &self,
        desc: &ActorDesc,
        shape_id: ShapeId,
        shape: &ShapeDesc,
    ) -> Result<()> {
        let default_density = self.settings.default_density;
        self.with_scene_mut("create_actor_with_shape", |scene| {
            if scene.actors.contains(desc.id) {
                return Err(BridgeError::DuplicateActor(desc.id));
            }
            shape.geometry.to_shared_shape()?;

            let engine = scene.engine.get_mut();
            let pose = isometry(desc.position, desc.rotation);
            scene.actors.create(engine, desc.id, desc.kind, pose)?;
            let (entity, engine) = scene.split(desc.id)?;
            entity.set_name(desc.name.clone());
            entity.add_shape(
                engine,
                shape_id,
                &shape.geometry,
                &shape.material,
                shape.density,
                default_density,
            )
        })
    }

    /// Remove an actor, waking anything it was touching.
    pub fn remove_actor(&self, id: ActorId) -> Result<()> {
        self.with_scene_mut("remove_actor", |scene| {
            scene.actors.remove(scene.engine.get_mut(), id)?;
            scene.aggregates.forget_actor(id);
            Ok(())
        })
    }

    /// Whether an actor is registered under `id`.
    pub fn has_actor(&self, id: ActorId) -> bool {
        self.scene
            .read()
            .as_ref()
            .is_some_and(|scene| scene.actors.contains(id))
    }

    /// Number of registered actors.
    pub fn actor_count(&self) -> Result<usize> {
        self.with_scene("actor_count", |scene| Ok(scene.actors.len()))
    }

    /// Rename an actor.
    pub fn set_actor_name(&self, id: ActorId, name: &str) -> Result<()> {
        self.with_actor("set_actor_name", id, |entity, _| {
            entity.set_name(name);
            Ok(())
        })
    }

    /// Name of an actor.
    pub fn actor_name(&self, id: ActorId) -> Result<String> {
        self.with_actor("actor_name", id, |entity, _| Ok(entity.name().to_string()))
    }

    // Shapes and mass

    /// Attach a shape to an actor.
    pub fn add_shape(&self, actor: ActorId, shape_id: ShapeId, shape: &ShapeDesc) -> Result<()> {
        let default_density = self.settings.default_density;
        self.with_scene_mut("add_shape", |scene| {
            let (entity, engine) = scene.split(actor)?;
            entity.add_shape(
                engine,
                shape_id,
                &shape.geometry,
                &shape.material,
                shape.density,
                default_density,
            )
        })
    }

    /// Detach a shape. Mass is recomputed even when the shape is missing.
    pub fn detach_shape(&self, actor: ActorId, shape_id: ShapeId) -> Result<()> {
        let default_density = self.settings.default_density;
        self.with_scene_mut("detach_shape", |scene| {
            let (entity, engine) = scene.split(actor)?;
            entity
                .detach_shape(engine, shape_id, default_density)
                .map(|_| ())
                .ok_or(BridgeError::ShapeNotFound {
                    actor,
                    shape: shape_id,
                })
        })
    }

    /// Change the density of one shape.
    pub fn set_shape_density(&self, actor: ActorId, shape_id: ShapeId, density: f32) -> Result<()> {
        let default_density = self.settings.default_density;
        self.with_scene_mut("set_shape_density", |scene| {
            let (entity, engine) = scene.split(actor)?;
            entity.set_shape_density(engine, shape_id, density, default_density)
        })
    }

    /// Density of one shape.
    pub fn shape_density(&self, actor: ActorId, shape_id: ShapeId) -> Result<f32> {
        self.with_actor("shape_density", actor, |entity, _| {
            entity
                .shape(shape_id)
                .map(|s| s.density())
                .ok_or(BridgeError::ShapeNotFound {
                    actor,
                    shape: shape_id,
                })
        })
    }

    /// Ids of an actor's shapes, ascending.
    pub fn shape_ids(&self, actor: ActorId) -> Result<Vec<ShapeId>> {
        self.with_actor("shape_ids", actor, |entity, _| Ok(entity.shape_ids()))
    }

    /// Give every shape of a dynamic actor the same density.
    pub fn update_actor_density(&self, actor: ActorId, density: f32) -> Result<()> {
        let default_density = self.settings.default_density;
        self.with_scene_mut("update_actor_density", |scene| {
            let (entity, engine) = scene.split(actor)?;
            entity.set_density(engine, density, default_density)
        })
    }

    /// Override the mass of a dynamic actor.
    pub fn set_actor_mass(&self, actor: ActorId, mass: f32) -> Result<()> {
        self.with_scene_mut("set_actor_mass", |scene| {
            let (entity, engine) = scene.split(actor)?;
            entity.set_mass(engine, mass)
        })
    }

    /// Mass of an actor; 0 for static actors.
    pub fn actor_mass(&self, actor: ActorId) -> Result<f32> {
        self.with_actor("actor_mass", actor, |entity, engine| Ok(entity.mass(engine)))
    }

    /// How many times an actor's mass has been recomputed.
    pub fn mass_updates(&self, actor: ActorId) -> Result<usize> {
        self.with_actor("mass_updates", actor, |entity, _| Ok(entity.mass_updates()))
    }

    // Pose and motion

    /// Move an actor, keeping its orientation.
    pub fn set_position(&self, actor: ActorId, position: [f32; 3]) -> Result<()> {
        self.with_actor("set_position", actor, |entity, engine| {
            entity.set_position(engine, array_to_vec(position));
            Ok(())
        })
    }

    /// Rotate an actor, keeping its position.
    pub fn set_rotation(&self, actor: ActorId, rotation: [f32; 4]) -> Result<()> {
        self.with_actor("set_rotation", actor, |entity, engine| {
            entity.set_rotation(engine, quat_from_xyzw(rotation));
            Ok(())
        })
    }

    /// Set position and orientation in one write.
    pub fn set_transformation(
        &self,
        actor: ActorId,
        position: [f32; 3],
        rotation: [f32; 4],
    ) -> Result<()> {
        self.with_actor("set_transformation", actor, |entity, engine| {
            entity.set_transformation(engine, isometry(position, rotation));
            Ok(())
        })
    }

    /// World position of an actor.
    pub fn position(&self, actor: ActorId) -> Result<[f32; 3]> {
        self.with_actor("position", actor, |entity, engine| {
            Ok(vec_to_array(&entity.pose(engine).translation.vector))
        })
    }

    /// World orientation of an actor as `[x, y, z, w]`.
    pub fn rotation(&self, actor: ActorId) -> Result<[f32; 4]> {
        self.with_actor("rotation", actor, |entity, engine| {
            Ok(quat_to_xyzw(&entity.pose(engine).rotation))
        })
    }

    /// Set the linear velocity of a dynamic actor.
    pub fn set_linear_velocity(&self, actor: ActorId, velocity: [f32; 3]) -> Result<()> {
        self.with_actor("set_linear_velocity", actor, |entity, engine| {
            entity.set_linear_velocity(engine, array_to_vec(velocity))
        })
    }

    /// Set the angular velocity of a dynamic actor.
    pub fn set_angular_velocity(&self, actor: ActorId, velocity: [f32; 3]) -> Result<()> {
        self.with_actor("set_angular_velocity", actor, |entity, engine| {
            entity.set_angular_velocity(engine, array_to_vec(velocity))
        })
    }

    /// Linear velocity of an actor.
    pub fn linear_velocity(&self, actor: ActorId) -> Result<[f32; 3]> {
        self.with_actor("linear_velocity", actor, |entity, engine| {
            Ok(vec_to_array(&entity.linear_velocity(engine)))
        })
    }

    /// Angular velocity of an actor.
    pub fn angular_velocity(&self, actor: ActorId) -> Result<[f32; 3]> {
        self.with_actor("angular_velocity", actor, |entity, engine| {
            Ok(vec_to_array(&entity.angular_velocity(engine)))
        })
    }

    /// Push a dynamic actor for the next step.
    pub fn add_force(&self, actor: ActorId, force: [f32; 3]) -> Result<()> {
        self.with_actor("add_force", actor, |entity, engine| {
            entity.add_force(engine, array_to_vec(force))
        })
    }

    /// Turn gravity on or off for one dynamic actor.
    pub fn enable_gravity(&self, actor: ActorId, enabled: bool) -> Result<()> {
        self.with_actor("enable_gravity", actor, |entity, engine| {
            entity.enable_gravity(engine, enabled)
        })
    }

    /// Set scene gravity.
    pub fn set_gravity(&self, gravity: [f32; 3]) -> Result<()> {
        self.with_scene("set_gravity", |scene| {
            scene.engine.lock().set_gravity(Vector3::from(gravity));
            Ok(())
        })
    }

    // Joints

    /// Create a 6-DOF joint.
    pub fn add_joint(&self, desc: &JointDesc) -> Result<()> {
        let tolerance = self.settings.projection_linear_tolerance;
        self.with_scene_mut("add_joint", |scene| {
            if scene.joints.contains(desc.id) {
                return Err(BridgeError::DuplicateJoint(desc.id));
            }
            let (actor1, body1) = scene.joint_side(desc.actor1);
            let (actor2, body2) = scene.joint_side(desc.actor2);

            let joint = D6JointDesc::new(
                isometry(desc.frame1_position, desc.frame1_rotation),
                isometry(desc.frame2_position, desc.frame2_rotation),
                &desc.limits,
            )
            .with_projection_tolerance(tolerance);
            let engine = scene.engine.get_mut();
            let handle = engine.create_joint(body1, body2, joint.to_generic_joint());
            let live = engine.joint_count();

            scene.joints.insert(JointRecord {
                id: desc.id,
                actor1,
                actor2,
                handle,
            })?;
            debug!(joint = %desc.id, %actor1, %actor2, live, "created joint");
            Ok(())
        })
    }

    /// Release a joint.
    pub fn remove_joint(&self, id: JointId) -> Result<()> {
        self.with_scene_mut("remove_joint", |scene| {
            let record = scene.joints.remove(id)?;
            scene.engine.get_mut().remove_joint(record.handle);
            debug!(joint = %id, "removed joint");
            Ok(())
        })
    }

    /// Actors a joint connects; 0 stands for the world frame.
    pub fn joint_actors(&self, id: JointId) -> Result<(ActorId, ActorId)> {
        self.with_scene("joint_actors", |scene| {
            scene
                .joints
                .lookup(id)
                .map(|j| (j.actor1, j.actor2))
                .ok_or(BridgeError::JointNotFound(id))
        })
    }

    /// Number of registered joints.
    pub fn joint_count(&self) -> Result<usize> {
        self.with_scene("joint_count", |scene| Ok(scene.joints.len()))
    }

    // Ground plane

    /// Add a static ground plane with a +Z normal through `position`,
    /// replacing any previous one.
    pub fn create_ground_plane(&self, position: [f32; 3]) -> Result<()> {
        self.with_scene_mut("create_ground_plane", |scene| {
            let engine = scene.engine.get_mut();
            if let Some(previous) = scene.ground_plane.take() {
                engine.remove_collider(previous);
            }
            scene.ground_plane = Some(engine.add_ground_plane(array_to_vec(position)));
            debug!(?position, "created ground plane");
            Ok(())
        })
    }

    /// Remove the ground plane if there is one.
    pub fn release_ground_plane(&self) -> Result<()> {
        self.with_scene_mut("release_ground_plane", |scene| {
            if let Some(plane) = scene.ground_plane.take() {
                scene.engine.get_mut().remove_collider(plane);
            }
            Ok(())
        })
    }

    // Aggregates

    /// Create an empty aggregate.
    pub fn create_aggregate(&self, id: AggregateId, max_actors: usize) -> Result<()> {
        self.with_scene_mut("create_aggregate", |scene| {
            scene.aggregates.create(id, max_actors)
        })
    }

    /// Add an actor to an aggregate.
    pub fn add_to_aggregate(&self, id: AggregateId, actor: ActorId) -> Result<()> {
        self.with_scene_mut("add_to_aggregate", |scene| {
            if !scene.actors.contains(actor) {
                return Err(BridgeError::ActorNotFound(actor));
            }
            scene.aggregates.get_mut(id)?.add(actor)
        })
    }

    /// Take an actor out of an aggregate.
    pub fn remove_from_aggregate(&self, id: AggregateId, actor: ActorId) -> Result<()> {
        self.with_scene_mut("remove_from_aggregate", |scene| {
            if scene.aggregates.get_mut(id)?.remove(actor) {
                Ok(())
            } else {
                Err(BridgeError::ActorNotFound(actor))
            }
        })
    }

    /// Release an aggregate. Its actors stay in the scene.
    pub fn remove_aggregate(&self, id: AggregateId) -> Result<()> {
        self.with_scene_mut("remove_aggregate", |scene| {
            scene.aggregates.remove(id).map(|_| ())
        })
    }

    /// Members of an aggregate, ascending.
    pub fn aggregate_members(&self, id: AggregateId) -> Result<Vec<ActorId>> {
        self.with_scene("aggregate_members", |scene| {
            Ok(scene.aggregates.get(id)?.members().collect())
        })
    }

    // Stepping

    /// Change how many collision records a step keeps.
    pub fn set_collision_capacity(&self, capacity: usize) -> Result<()> {
        self.with_scene("set_collision_capacity", |scene| {
            scene.collisions.lock().resize(capacity);
            Ok(())
        })
    }

    /// Advance the scene by `dt` seconds.
    ///
    /// Writes one record per active dynamic body into `updates` and the
    /// collisions of the step into `collisions`, truncating silently at
    /// either buffer's length or the sink's capacity.
    pub fn simulate(
        &self,
        dt: f32,
        updates: &mut [StepResultRecord],
        collisions: &mut [CollisionRecord],
    ) -> Result<StepCounts> {
        self.with_scene("simulate", |scene| {
            let mut engine = scene.engine.lock();
            engine.step(dt);

            let written = publish(engine.active_transforms(), |h| engine.resolve(h), updates);

            let mut sink = scene.collisions.lock();
            sink.on_contact_pairs(engine.contact_pairs(), |h| engine.resolve(h));
            let drained = sink.drain();
            let reported = drained.len().min(collisions.len());
            collisions[..reported].copy_from_slice(&drained[..reported]);

            Ok(StepCounts {
                updates: written,
                collisions: reported,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn world() -> PhysicsWorld {
        let world = PhysicsWorld::default();
        world.create_scene().unwrap();
        world
    }

    fn sphere(density: f32) -> ShapeDesc {
        ShapeDesc::new(ShapeGeometry::Sphere { radius: 0.5 }, density)
    }

    fn buffers() -> (Vec<StepResultRecord>, Vec<CollisionRecord>) {
        (
            vec![StepResultRecord::default(); 16],
            vec![CollisionRecord::default(); 64],
        )
    }

    #[test]
    fn test_uninitialized_requests_fail() {
        let world = PhysicsWorld::default();
        assert!(!world.is_initialized());
        assert_eq!(
            world.create_actor(&ActorDesc::new(ActorId(1), EntityKind::Dynamic)),
            Err(BridgeError::NotInitialized)
        );
        let (mut updates, mut collisions) = buffers();
        assert_eq!(
            world.simulate(DT, &mut updates, &mut collisions),
            Err(BridgeError::NotInitialized)
        );
        assert_eq!(world.release_scene(), Err(BridgeError::NotInitialized));
    }

    #[test]
    fn test_scene_lifecycle() {
        let world = world();
        assert_eq!(world.create_scene(), Err(BridgeError::AlreadyInitialized));
        world
            .create_actor(&ActorDesc::new(ActorId(1), EntityKind::Static))
            .unwrap();
        world.release_scene().unwrap();
        assert!(!world.has_actor(ActorId(1)));

        world.create_scene().unwrap();
        assert_eq!(world.actor_count(), Ok(0));
    }

    #[test]
    fn test_sphere_mass_then_detach() {
        let world = world();
        world
            .create_actor(&ActorDesc::new(ActorId(1), EntityKind::Dynamic))
            .unwrap();
        world.add_shape(ActorId(1), ShapeId(10), &sphere(1.0)).unwrap();

        let expected = 4.0 / 3.0 * std::f32::consts::PI * 0.125;
        assert_relative_eq!(world.actor_mass(ActorId(1)).unwrap(), expected, epsilon = 1e-4);

        world.detach_shape(ActorId(1), ShapeId(10)).unwrap();
        assert_eq!(world.actor_mass(ActorId(1)), Ok(0.0));
        assert_eq!(world.mass_updates(ActorId(1)), Ok(2));
        assert!(world.has_actor(ActorId(1)));
        assert!(world.shape_ids(ActorId(1)).unwrap().is_empty());
    }

    #[test]
    fn test_remove_unknown_actor() {
        let world = world();
        world
            .create_actor(&ActorDesc::new(ActorId(2), EntityKind::Dynamic))
            .unwrap();
        assert_eq!(
            world.remove_actor(ActorId(1)),
            Err(BridgeError::ActorNotFound(ActorId(1)))
        );
        assert_eq!(world.actor_count(), Ok(1));
    }

    #[test]
    fn test_duplicate_actor_untouched() {
        let world = world();
        let desc = ActorDesc::new(ActorId(1), EntityKind::Dynamic).at([1.0, 2.0, 3.0]);
        world.create_actor(&desc).unwrap();
        let again = ActorDesc::new(ActorId(1), EntityKind::Dynamic);
        assert_eq!(
            world.create_actor_with_shape(&again, ShapeId(1), &sphere(1.0)),
            Err(BridgeError::DuplicateActor(ActorId(1)))
        );
        assert_eq!(world.position(ActorId(1)), Ok([1.0, 2.0, 3.0]));
        assert!(world.shape_ids(ActorId(1)).unwrap().is_empty());
    }

    #[test]
    fn test_create_with_bad_shape_creates_nothing() {
        let world = world();
        let shape = ShapeDesc::new(ShapeGeometry::ConvexMesh { points: vec![] }, 1.0);
        let err = world
            .create_actor_with_shape(&ActorDesc::new(ActorId(1), EntityKind::Dynamic), ShapeId(1), &shape)
            .unwrap_err();
        assert!(matches!(err, BridgeError::CollisionShape { .. }));
        assert!(!world.has_actor(ActorId(1)));
    }

    #[test]
    fn test_falling_actor_is_published() {
        let world = world();
        let desc = ActorDesc::new(ActorId(7), EntityKind::Dynamic).at([0.0, 0.0, 10.0]);
        world
            .create_actor_with_shape(&desc, ShapeId(1), &sphere(1.0))
            .unwrap();

        let (mut updates, mut collisions) = buffers();
        let counts = world.simulate(DT, &mut updates, &mut collisions).unwrap();
        assert_eq!(counts.updates, 1);
        assert_eq!(counts.collisions, 0);
        assert_eq!(updates[0].id, 7);
        assert!(updates[0].position[2] < 10.0);
        assert!(updates[0].linear_velocity[2] < 0.0);
    }

    #[test]
    fn test_update_capacity_respected() {
        let world = world();
        for id in 1..=4 {
            let desc = ActorDesc::new(ActorId(id), EntityKind::Dynamic).at([id as f32 * 3.0, 0.0, 5.0]);
            world
                .create_actor_with_shape(&desc, ShapeId(1), &sphere(1.0))
                .unwrap();
        }
        let mut updates = vec![StepResultRecord::default(); 2];
        let mut collisions = vec![];
        let counts = world.simulate(DT, &mut updates, &mut collisions).unwrap();
        assert_eq!(counts.updates, 2);
    }

    #[test]
    fn test_collisions_reported_once() {
        let world = world();
        world.set_gravity([0.0, 0.0, 0.0]).unwrap();
        for (id, x) in [(1, 0.0), (2, 0.9)] {
            let desc = ActorDesc::new(ActorId(id), EntityKind::Dynamic).at([x, 0.0, 0.0]);
            world
                .create_actor_with_shape(&desc, ShapeId(1), &sphere(1.0))
                .unwrap();
        }

        let (mut updates, mut collisions) = buffers();
        let counts = world.simulate(DT, &mut updates, &mut collisions).unwrap();
        assert!(counts.collisions > 0);
        let ids = [collisions[0].actor1, collisions[0].actor2];
        assert!(ids.contains(&1) && ids.contains(&2));
    }

    #[test]
    fn test_ground_contacts_skipped() {
        let world = world();
        world.create_ground_plane([0.0, 0.0, 0.0]).unwrap();
        let desc = ActorDesc::new(ActorId(1), EntityKind::Dynamic).at([0.0, 0.0, 0.45]);
        world
            .create_actor_with_shape(&desc, ShapeId(1), &sphere(1.0))
            .unwrap();

        let (mut updates, mut collisions) = buffers();
        let counts = world.simulate(DT, &mut updates, &mut collisions).unwrap();
        assert_eq!(counts.collisions, 0);
        world.release_ground_plane().unwrap();
    }

    #[test]
    fn test_static_mass_rules() {
        let world = world();
        world
            .create_actor_with_shape(
                &ActorDesc::new(ActorId(3), EntityKind::Static),
                ShapeId(1),
                &sphere(1.0),
            )
            .unwrap();
        assert_eq!(world.actor_mass(ActorId(3)), Ok(0.0));
        assert_eq!(
            world.set_actor_mass(ActorId(3), 2.0),
            Err(BridgeError::NotDynamic(ActorId(3)))
        );
        assert_eq!(
            world.update_actor_density(ActorId(3), 2.0),
            Err(BridgeError::NotDynamic(ActorId(3)))
        );
        assert!(world.add_force(ActorId(3), [1.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_pose_components_preserved() {
        let world = world();
        world
            .create_actor(&ActorDesc::new(ActorId(1), EntityKind::Dynamic))
            .unwrap();
        let h = std::f32::consts::FRAC_1_SQRT_2;
        world.set_rotation(ActorId(1), [0.0, 0.0, h, h]).unwrap();
        world.set_position(ActorId(1), [4.0, 5.0, 6.0]).unwrap();

        let rotation = world.rotation(ActorId(1)).unwrap();
        assert_relative_eq!(rotation[2], h, epsilon = 1e-5);
        assert_relative_eq!(rotation[3], h, epsilon = 1e-5);
        assert_eq!(world.position(ActorId(1)), Ok([4.0, 5.0, 6.0]));
    }

    #[test]
    fn test_names_and_velocities() {
        let world = world();
        let mut desc = ActorDesc::new(ActorId(1), EntityKind::Dynamic);
        desc.name = "crate".to_string();
        world.create_actor(&desc).unwrap();
        assert_eq!(world.actor_name(ActorId(1)).unwrap(), "crate");
        world.set_actor_name(ActorId(1), "barrel").unwrap();
        assert_eq!(world.actor_name(ActorId(1)).unwrap(), "barrel");

        world.set_linear_velocity(ActorId(1), [1.0, 0.0, 0.0]).unwrap();
        world.set_angular_velocity(ActorId(1), [0.0, 0.0, 2.0]).unwrap();
        assert_eq!(world.linear_velocity(ActorId(1)), Ok([1.0, 0.0, 0.0]));
        assert_eq!(world.angular_velocity(ActorId(1)), Ok([0.0, 0.0, 2.0]));
        assert!(world.position(ActorId(9)).is_err());
    }

    #[test]
    fn test_gravity_toggle() {
        let world = world();
        let desc = ActorDesc::new(ActorId(1), EntityKind::Dynamic).at([0.0, 0.0, 5.0]);
        world
            .create_actor_with_shape(&desc, ShapeId(1), &sphere(1.0))
            .unwrap();
        world.enable_gravity(ActorId(1), false).unwrap();

        let (mut updates, mut collisions) = buffers();
        world.simulate(DT, &mut updates, &mut collisions).unwrap();
        assert_relative_eq!(world.position(ActorId(1)).unwrap()[2], 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_density_and_mass_updates() {
        let world = world();
        world
            .create_actor(&ActorDesc::new(ActorId(1), EntityKind::Dynamic))
            .unwrap();
        let cube = ShapeDesc::new(
            ShapeGeometry::Box {
                half_extents: [0.5, 0.5, 0.5],
            },
            1.0,
        );
        world.add_shape(ActorId(1), ShapeId(1), &cube).unwrap();
        world.add_shape(ActorId(1), ShapeId(2), &cube).unwrap();
        assert_relative_eq!(world.actor_mass(ActorId(1)).unwrap(), 2.0, epsilon = 1e-4);

        assert!(world.set_shape_density(ActorId(1), ShapeId(2), -1.0).is_err());
        assert_eq!(world.shape_density(ActorId(1), ShapeId(2)), Ok(1.0));

        world.update_actor_density(ActorId(1), 4.0).unwrap();
        assert_relative_eq!(world.actor_mass(ActorId(1)).unwrap(), 8.0, epsilon = 1e-3);

        world.set_actor_mass(ActorId(1), 10.0).unwrap();
        assert_relative_eq!(world.actor_mass(ActorId(1)).unwrap(), 10.0, epsilon = 1e-3);
        assert_eq!(world.shape_ids(ActorId(1)), Ok(vec![ShapeId(1), ShapeId(2)]));
    }

    #[test]
    fn test_mixed_densities_follow_collider_order() {
        let world = world();
        world
            .create_actor(&ActorDesc::new(ActorId(1), EntityKind::Dynamic))
            .unwrap();
        let cube = |half: f32, density: f32| {
            ShapeDesc::new(
                ShapeGeometry::Box {
                    half_extents: [half; 3],
                },
                density,
            )
        };
        // volumes 1, 8, 27
        world.add_shape(ActorId(1), ShapeId(1), &cube(0.5, 1.0)).unwrap();
        world.add_shape(ActorId(1), ShapeId(2), &cube(1.0, 2.0)).unwrap();
        world.add_shape(ActorId(1), ShapeId(3), &cube(1.5, 4.0)).unwrap();
        assert_relative_eq!(world.actor_mass(ActorId(1)).unwrap(), 125.0, max_relative = 1e-4);

        world.detach_shape(ActorId(1), ShapeId(2)).unwrap();
        assert_relative_eq!(world.actor_mass(ActorId(1)).unwrap(), 109.0, max_relative = 1e-4);

        world.set_shape_density(ActorId(1), ShapeId(3), 16.0).unwrap();
        assert_relative_eq!(world.actor_mass(ActorId(1)).unwrap(), 433.0, max_relative = 1e-4);
        assert_eq!(world.mass_updates(ActorId(1)), Ok(5));
    }

    #[test]
    fn test_remove_actor_wakes_resting_body() {
        let world = world();
        let slab = ShapeDesc::new(
            ShapeGeometry::Box {
                half_extents: [5.0, 5.0, 0.5],
            },
            1.0,
        );
        let cube = ShapeDesc::new(
            ShapeGeometry::Box {
                half_extents: [0.5, 0.5, 0.5],
            },
            1.0,
        );
        world
            .create_actor_with_shape(&ActorDesc::new(ActorId(1), EntityKind::Static), ShapeId(1), &slab)
            .unwrap();
        world
            .create_actor_with_shape(
                &ActorDesc::new(ActorId(2), EntityKind::Dynamic).at([0.0, 0.0, 1.0]),
                ShapeId(1),
                &cube,
            )
            .unwrap();

        let (mut updates, mut collisions) = buffers();
        let mut counts = StepCounts::default();
        for _ in 0..300 {
            counts = world.simulate(DT, &mut updates, &mut collisions).unwrap();
        }
        assert_eq!(counts.updates, 0);

        world.remove_actor(ActorId(1)).unwrap();
        let counts = world.simulate(DT, &mut updates, &mut collisions).unwrap();
        assert_eq!(counts.updates, 1);
        assert_eq!(updates[0].id, 2);
    }

    #[test]
    fn test_joint_to_world_frame() {
        let world = world();
        world
            .create_actor(&ActorDesc::new(ActorId(1), EntityKind::Dynamic))
            .unwrap();
        let desc = JointDesc {
            id: JointId(5),
            actor1: ActorId(1),
            actor2: ActorId(0),
            frame1_position: [0.0; 3],
            frame1_rotation: [0.0, 0.0, 0.0, 1.0],
            frame2_position: [0.0, 0.0, 1.0],
            frame2_rotation: [0.0, 0.0, 0.0, 1.0],
            limits: AxisLimits {
                linear_lower: [0.0; 3],
                linear_upper: [0.0; 3],
                angular_lower: [0.0, -1.0, -1.0],
                angular_upper: [0.0, 1.0, 1.0],
            },
        };
        world.add_joint(&desc).unwrap();
        assert_eq!(world.add_joint(&desc), Err(BridgeError::DuplicateJoint(JointId(5))));
        assert_eq!(world.joint_actors(JointId(5)), Ok((ActorId(1), ActorId(0))));
        assert_eq!(world.joint_count(), Ok(1));

        let mut unknown = desc.clone();
        unknown.id = JointId(6);
        unknown.actor1 = ActorId(42);
        world.add_joint(&unknown).unwrap();
        assert_eq!(world.joint_actors(JointId(6)), Ok((ActorId(0), ActorId(0))));

        world.remove_joint(JointId(5)).unwrap();
        assert_eq!(world.remove_joint(JointId(5)), Err(BridgeError::JointNotFound(JointId(5))));
        assert_eq!(world.joint_count(), Ok(1));
    }

    #[test]
    fn test_joint_survives_actor_removal() {
        let world = world();
        world
            .create_actor(&ActorDesc::new(ActorId(1), EntityKind::Dynamic))
            .unwrap();
        let desc = JointDesc {
            id: JointId(1),
            actor1: ActorId(1),
            actor2: ActorId(0),
            frame1_position: [0.0; 3],
            frame1_rotation: [0.0, 0.0, 0.0, 1.0],
            frame2_position: [0.0; 3],
            frame2_rotation: [0.0, 0.0, 0.0, 1.0],
            limits: AxisLimits::default(),
        };
        world.add_joint(&desc).unwrap();
        world.remove_actor(ActorId(1)).unwrap();
        assert_eq!(world.joint_count(), Ok(1));
        world.remove_joint(JointId(1)).unwrap();
    }

    #[test]
    fn test_aggregates() {
        let world = world();
        for id in 1..=3 {
            world
                .create_actor(&ActorDesc::new(ActorId(id), EntityKind::Dynamic))
                .unwrap();
        }
        world.create_aggregate(AggregateId(1), 2).unwrap();
        world.add_to_aggregate(AggregateId(1), ActorId(1)).unwrap();
        world.add_to_aggregate(AggregateId(1), ActorId(2)).unwrap();
        assert_eq!(
            world.add_to_aggregate(AggregateId(1), ActorId(3)),
            Err(BridgeError::AggregateFull(AggregateId(1)))
        );
        assert_eq!(
            world.add_to_aggregate(AggregateId(1), ActorId(9)),
            Err(BridgeError::ActorNotFound(ActorId(9)))
        );

        world.remove_actor(ActorId(1)).unwrap();
        assert_eq!(world.aggregate_members(AggregateId(1)), Ok(vec![ActorId(2)]));
        world.remove_from_aggregate(AggregateId(1), ActorId(2)).unwrap();
        world.remove_aggregate(AggregateId(1)).unwrap();
        assert!(world.aggregate_members(AggregateId(1)).is_err());
    }

    #[test]
    fn test_concurrent_requests_during_steps() {
        use std::sync::Arc;
        use std::thread;

        let world = Arc::new(world());
        let stepper = {
            let world = Arc::clone(&world);
            thread::spawn(move || {
                let (mut updates, mut collisions) = buffers();
                for _ in 0..20 {
                    let counts = world.simulate(DT, &mut updates, &mut collisions).unwrap();
                    assert!(counts.updates <= updates.len());
                }
            })
        };
        for id in 1..=20 {
            let desc = ActorDesc::new(ActorId(id), EntityKind::Dynamic).at([id as f32 * 2.0, 0.0, 1.0]);
            world
                .create_actor_with_shape(&desc, ShapeId(1), &sphere(1.0))
                .unwrap();
            if id % 2 == 0 {
                world.remove_actor(ActorId(id)).unwrap();
            }
        }
        stepper.join().unwrap();
        assert_eq!(world.actor_count(), Ok(10));
    }
}

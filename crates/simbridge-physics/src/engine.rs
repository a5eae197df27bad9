//! Rapier3d adapter.
//!
//! Everything the bridge needs from the native engine goes through
//! [`RapierEngine`]: body and collider lifetime, mass properties, poses,
//! joints, and stepping. The adapter also owns the back-reference table
//! from engine bodies to actor ids.

use std::collections::{HashMap, HashSet};

use nalgebra::{Isometry3, Point3, Vector3};
use parry3d::mass_properties::MassProperties;
use parry3d::shape::SharedShape;
use rapier3d::dynamics::{
    CCDSolver, GenericJoint, ImpulseJointHandle, ImpulseJointSet, IntegrationParameters,
    IslandManager, MultibodyJointSet, RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
    RigidBodyType,
};
use rapier3d::geometry::{
    BroadPhaseMultiSap, ColliderBuilder, ColliderHandle, ColliderSet, NarrowPhase,
};
use rapier3d::pipeline::{PhysicsPipeline, QueryPipeline};

use crate::collision::{ContactPairEvent, ContactPoint, TouchState};
use crate::entity::EntityKind;
use crate::id::ActorId;
use crate::publish::ActiveTransform;
use crate::settings::WorldSettings;
use crate::shape::ShapeMaterial;

/// Rapier world plus the bookkeeping the bridge layers on top of it.
pub struct RapierEngine {
    // Rapier components
    pipeline: PhysicsPipeline,
    gravity: Vector3<f32>,
    integration_params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    // Body -> actor back-references
    body_ids: HashMap<RigidBodyHandle, ActorId>,
    // Fixed body standing in for the world frame in joints
    world_anchor: Option<RigidBodyHandle>,
    // Bodies with a pending user force, cleared after each step
    forced: Vec<RigidBodyHandle>,
    ccd_enabled: bool,

    // Results of the last step
    touching: HashSet<(ColliderHandle, ColliderHandle)>,
    active: Vec<ActiveTransform>,
    contacts: Vec<ContactPairEvent>,
    contact_points_per_pair: usize,
}

impl RapierEngine {
    /// Create an empty engine world.
    pub fn new(settings: &WorldSettings) -> Self {
        let [gx, gy, gz] = settings.gravity;
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: Vector3::new(gx, gy, gz),
            integration_params: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            body_ids: HashMap::new(),
            world_anchor: None,
            forced: Vec::new(),
            ccd_enabled: settings.ccd_enabled,
            touching: HashSet::new(),
            active: Vec::new(),
            contacts: Vec::new(),
            contact_points_per_pair: settings.contact_points_per_pair,
        }
    }

    /// Create a body and add it to the simulation, recording `id` as its
    /// back-reference.
    pub fn create_body(&mut self, id: ActorId, kind: EntityKind, pose: Isometry3<f32>) -> RigidBodyHandle {
        let body_type = match kind {
            EntityKind::Static => RigidBodyType::Fixed,
            EntityKind::Dynamic => RigidBodyType::Dynamic,
        };
        let body = RigidBodyBuilder::new(body_type)
            .position(pose)
            .ccd_enabled(kind == EntityKind::Dynamic && self.ccd_enabled)
            .build();
        let handle = self.bodies.insert(body);
        self.body_ids.insert(handle, id);
        handle
    }

    /// Remove a body with its colliders and joints, waking whatever was
    /// touching it.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        let Some(body) = self.bodies.get(handle) else {
            return;
        };
        let own: HashSet<ColliderHandle> = body.colliders().iter().copied().collect();

        let mut touching = Vec::new();
        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let other = if own.contains(&pair.collider1) {
                pair.collider2
            } else if own.contains(&pair.collider2) {
                pair.collider1
            } else {
                continue;
            };
            if let Some(parent) = self.colliders.get(other).and_then(|c| c.parent()) {
                touching.push(parent);
            }
        }

        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        self.body_ids.remove(&handle);
        self.forced.retain(|h| *h != handle);

        for other in touching {
            if let Some(body) = self.bodies.get_mut(other) {
                body.wake_up(true);
            }
        }
    }

    /// Actor id recorded for a body, if the registry tracks it.
    pub fn resolve(&self, handle: RigidBodyHandle) -> Option<ActorId> {
        self.body_ids.get(&handle).copied()
    }

    /// Number of bodies in the engine, tracked or not.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Attach a collider to a body.
    pub fn attach_collider(
        &mut self,
        body: RigidBodyHandle,
        shape: SharedShape,
        material: &ShapeMaterial,
        density: f32,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::new(shape)
            .friction(material.dynamic_friction)
            .restitution(material.restitution)
            .density(density)
            .build();
        self.colliders
            .insert_with_parent(collider, body, &mut self.bodies)
    }

    /// Detach and release a collider. The parent's mass is refreshed from
    /// the colliders it still has.
    pub fn detach_collider(&mut self, handle: ColliderHandle) {
        let parent = self.colliders.get(handle).and_then(|c| c.parent());
        self.colliders
            .remove(handle, &mut self.islands, &mut self.bodies, true);
        if let Some(body) = parent.and_then(|p| self.bodies.get_mut(p)) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
    }

    /// Colliders of a body, in the engine's attach order.
    pub fn body_colliders(&self, body: RigidBodyHandle) -> Vec<ColliderHandle> {
        self.bodies
            .get(body)
            .map(|b| b.colliders().to_vec())
            .unwrap_or_default()
    }

    /// Assign one density per attached collider, in attach order, and
    /// recompute mass and inertia immediately.
    ///
    /// Returns `false` for unknown or non-dynamic bodies.
    pub fn update_mass_and_inertia(&mut self, body: RigidBodyHandle, densities: &[f32]) -> bool {
        let Some(rb) = self.bodies.get_mut(body) else {
            return false;
        };
        if !rb.is_dynamic() {
            return false;
        }
        for (handle, density) in rb.colliders().iter().zip(densities) {
            if let Some(collider) = self.colliders.get_mut(*handle) {
                collider.set_density(*density);
            }
        }
        rb.set_additional_mass_properties(MassProperties::default(), false);
        rb.recompute_mass_properties_from_colliders(&self.colliders);
        true
    }

    /// Set the total mass of a body, scaling inertia to match.
    ///
    /// Collider densities are scaled uniformly. A body without colliders
    /// carries the mass as a point-like additional mass.
    pub fn set_mass_and_update_inertia(&mut self, body: RigidBodyHandle, mass: f32) -> bool {
        if !mass.is_finite() || mass < 0.0 {
            return false;
        }
        let Some(rb) = self.bodies.get_mut(body) else {
            return false;
        };
        if !rb.is_dynamic() {
            return false;
        }

        rb.set_additional_mass_properties(MassProperties::default(), false);
        rb.recompute_mass_properties_from_colliders(&self.colliders);
        let current = rb.mass();
        if current > 0.0 && !rb.colliders().is_empty() {
            let scale = mass / current;
            for handle in rb.colliders() {
                if let Some(collider) = self.colliders.get_mut(*handle) {
                    let density = collider.density();
                    collider.set_density(density * scale);
                }
            }
        } else {
            // unit cube inertia
            let inertia = Vector3::repeat(mass / 6.0);
            rb.set_additional_mass_properties(
                MassProperties::new(Point3::origin(), mass, inertia),
                true,
            );
        }
        rb.recompute_mass_properties_from_colliders(&self.colliders);
        true
    }

    /// Current mass of a body; 0 for unknown bodies.
    pub fn mass(&self, body: RigidBodyHandle) -> f32 {
        self.bodies.get(body).map(|b| b.mass()).unwrap_or(0.0)
    }

    /// Global pose of a body.
    pub fn pose(&self, body: RigidBodyHandle) -> Option<Isometry3<f32>> {
        self.bodies.get(body).map(|b| *b.position())
    }

    /// Replace the global pose of a body in a single write.
    pub fn set_pose(&mut self, body: RigidBodyHandle, pose: Isometry3<f32>) {
        if let Some(rb) = self.bodies.get_mut(body) {
            rb.set_position(pose, true);
        }
    }

    /// Linear and angular velocity of a body.
    pub fn velocities(&self, body: RigidBodyHandle) -> Option<(Vector3<f32>, Vector3<f32>)> {
        self.bodies.get(body).map(|b| (*b.linvel(), *b.angvel()))
    }

    /// Set the linear velocity of a body.
    pub fn set_linear_velocity(&mut self, body: RigidBodyHandle, velocity: Vector3<f32>) {
        if let Some(rb) = self.bodies.get_mut(body) {
            rb.set_linvel(velocity, true);
        }
    }

    /// Set the angular velocity of a body.
    pub fn set_angular_velocity(&mut self, body: RigidBodyHandle, velocity: Vector3<f32>) {
        if let Some(rb) = self.bodies.get_mut(body) {
            rb.set_angvel(velocity, true);
        }
    }

    /// Apply a force for the next step only.
    pub fn add_force(&mut self, body: RigidBodyHandle, force: Vector3<f32>) {
        if let Some(rb) = self.bodies.get_mut(body) {
            rb.add_force(force, true);
            if !self.forced.contains(&body) {
                self.forced.push(body);
            }
        }
    }

    /// Turn scene gravity on or off for one body.
    pub fn enable_gravity(&mut self, body: RigidBodyHandle, enabled: bool) {
        if let Some(rb) = self.bodies.get_mut(body) {
            rb.set_gravity_scale(if enabled { 1.0 } else { 0.0 }, true);
        }
    }

    /// Set scene gravity.
    pub fn set_gravity(&mut self, gravity: Vector3<f32>) {
        self.gravity = gravity;
    }

    /// Add an untracked static half-space with a +Z normal.
    pub fn add_ground_plane(&mut self, position: Vector3<f32>) -> ColliderHandle {
        let collider = ColliderBuilder::halfspace(Vector3::z_axis())
            .translation(position)
            .friction(0.5)
            .restitution(0.5)
            .build();
        self.colliders.insert(collider)
    }

    /// Remove a collider that has no parent body.
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.colliders
            .remove(handle, &mut self.islands, &mut self.bodies, true);
    }

    /// Create a joint between two bodies. A missing body is replaced by a
    /// fixed anchor at the world origin.
    pub fn create_joint(
        &mut self,
        body1: Option<RigidBodyHandle>,
        body2: Option<RigidBodyHandle>,
        joint: GenericJoint,
    ) -> ImpulseJointHandle {
        let body1 = body1.unwrap_or_else(|| self.world_anchor());
        let body2 = body2.unwrap_or_else(|| self.world_anchor());
        self.impulse_joints.insert(body1, body2, joint, true)
    }

    /// Release a joint. Joints whose bodies are gone are already released.
    pub fn remove_joint(&mut self, handle: ImpulseJointHandle) {
        self.impulse_joints.remove(handle, true);
    }

    /// Number of live joints.
    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    fn world_anchor(&mut self) -> RigidBodyHandle {
        if let Some(anchor) = self.world_anchor {
            return anchor;
        }
        let anchor = self.bodies.insert(
            RigidBodyBuilder::fixed()
                .position(Isometry3::identity())
                .build(),
        );
        self.world_anchor = Some(anchor);
        anchor
    }

    /// Advance the simulation by `dt` seconds and gather the active
    /// transforms and contact pairs of the step.
    ///
    /// A non-positive or non-finite `dt` does not advance time.
    pub fn step(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.integration_params.dt = dt;

            self.pipeline.step(
                &self.gravity,
                &self.integration_params,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                Some(&mut self.query_pipeline),
                &(),
                &(),
            );
        }

        for handle in self.forced.drain(..) {
            if let Some(rb) = self.bodies.get_mut(handle) {
                rb.reset_forces(false);
            }
        }

        self.collect_active();
        self.collect_contacts();
    }

    fn collect_active(&mut self) {
        self.active.clear();
        for handle in self.islands.active_dynamic_bodies() {
            if let Some(body) = self.bodies.get(*handle) {
                self.active.push(ActiveTransform {
                    body: *handle,
                    pose: *body.position(),
                    linear_velocity: *body.linvel(),
                    angular_velocity: *body.angvel(),
                });
            }
        }
    }

    fn collect_contacts(&mut self) {
        self.contacts.clear();
        let mut touching = HashSet::with_capacity(self.touching.len());

        for pair in self.narrow_phase.contact_pairs() {
            let key = (pair.collider1, pair.collider2);
            let was_touching = self.touching.contains(&key);
            let touch = match (pair.has_any_active_contact, was_touching) {
                (true, false) => TouchState::Found,
                (true, true) => TouchState::Persists,
                (false, true) => TouchState::Lost,
                (false, false) => continue,
            };

            let (Some(c1), Some(c2)) = (
                self.colliders.get(pair.collider1),
                self.colliders.get(pair.collider2),
            ) else {
                continue;
            };

            let mut points = Vec::new();
            if touch != TouchState::Lost {
                touching.insert(key);
                'manifolds: for manifold in &pair.manifolds {
                    let normal = manifold.data.normal;
                    for contact in &manifold.points {
                        if points.len() >= self.contact_points_per_pair {
                            break 'manifolds;
                        }
                        let world = c1.position() * contact.local_p1;
                        points.push(ContactPoint {
                            position: [world.x, world.y, world.z],
                            normal: [normal.x, normal.y, normal.z],
                            separation: contact.dist,
                        });
                    }
                }
            }

            self.contacts.push(ContactPairEvent {
                body1: c1.parent(),
                body2: c2.parent(),
                touch,
                points,
            });
        }

        self.touching = touching;
    }

    /// Bodies moved by the last step, in engine order.
    pub fn active_transforms(&self) -> &[ActiveTransform] {
        &self.active
    }

    /// Contact pairs of the last step.
    pub fn contact_pairs(&self) -> &[ContactPairEvent] {
        &self.contacts
    }
}

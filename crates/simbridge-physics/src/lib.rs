#![warn(missing_docs)]

//! Rigid-body bridge between a simulation host and Rapier3d.
//!
//! The host refers to everything by caller-assigned numeric ids. This crate
//! keeps the mapping from those ids to live engine objects, translates
//! per-axis joint limits into Rapier joints, and writes each step's results
//! into fixed-capacity buffers the host owns.
//!
//! # Features
//!
//! - Id-keyed actors with any number of shapes and automatic mass updates
//! - 6-DOF joints from lower/upper limit pairs, anchored to the world frame
//!   when a side has no actor
//! - Bounded, allocation-free step results and collision reports
//! - Thread-safe: requests from any thread, one step in flight at a time
//!
//! # Example
//!
//! ```no_run
//! use simbridge_physics::{
//!     ActorDesc, ActorId, CollisionRecord, EntityKind, PhysicsWorld, ShapeDesc,
//!     ShapeGeometry, ShapeId, StepResultRecord,
//! };
//!
//! let world = PhysicsWorld::default();
//! world.create_scene().unwrap();
//!
//! let ball = ActorDesc::new(ActorId(1), EntityKind::Dynamic).at([0.0, 0.0, 5.0]);
//! let shape = ShapeDesc::new(ShapeGeometry::Sphere { radius: 0.5 }, 1.0);
//! world.create_actor_with_shape(&ball, ShapeId(1), &shape).unwrap();
//!
//! let mut updates = vec![StepResultRecord::default(); 64];
//! let mut collisions = vec![CollisionRecord::default(); 256];
//! let counts = world.simulate(1.0 / 60.0, &mut updates, &mut collisions).unwrap();
//! assert_eq!(updates[..counts.updates][0].id, 1);
//! ```

mod aggregate;
mod collision;
mod engine;
mod entity;
mod error;
mod id;
mod joints;
mod pose;
mod publish;
mod registry;
mod settings;
mod shape;
mod world;

pub use aggregate::Aggregate;
pub use collision::{CollisionRecord, CollisionSink, ContactPairEvent, ContactPoint, TouchState};
pub use entity::EntityKind;
pub use error::{BridgeError, Result};
pub use id::{ActorId, AggregateId, JointId, ShapeId};
pub use joints::{classify_axis, AxisLimits, AxisMotion, D6JointDesc, Projection, SwingCone};
pub use pose::{isometry, quat_from_xyzw, quat_to_xyzw};
pub use publish::{publish, ActiveTransform, StepResultRecord};
pub use settings::{WorldSettings, DEFAULT_DENSITY, DEFAULT_PROJECTION_LINEAR_TOLERANCE};
pub use shape::{ShapeGeometry, ShapeMaterial};
pub use world::{ActorDesc, JointDesc, PhysicsWorld, ShapeDesc, StepCounts};

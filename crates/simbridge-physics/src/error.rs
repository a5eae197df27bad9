//! Error types for the physics bridge.

use thiserror::Error;

use crate::id::{ActorId, AggregateId, JointId, ShapeId};

/// Errors that can occur while driving the physics world.
///
/// None of these are fatal; callers on the host side only ever see them as a
/// `false` return or a zero-filled output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// The scene has not been created yet.
    #[error("scene has not been initialized")]
    NotInitialized,

    /// The scene already exists.
    #[error("scene is already initialized")]
    AlreadyInitialized,

    /// No actor is registered under this id.
    #[error("actor {0} not found")]
    ActorNotFound(ActorId),

    /// An actor is already registered under this id.
    #[error("actor {0} already exists")]
    DuplicateActor(ActorId),

    /// The actor has no shape with this id.
    #[error("shape {shape} not found on actor {actor}")]
    ShapeNotFound {
        /// Owning actor.
        actor: ActorId,
        /// Missing shape.
        shape: ShapeId,
    },

    /// The actor already owns a shape with this id.
    #[error("shape {shape} already attached to actor {actor}")]
    DuplicateShape {
        /// Owning actor.
        actor: ActorId,
        /// Conflicting shape.
        shape: ShapeId,
    },

    /// No joint is registered under this id.
    #[error("joint {0} not found")]
    JointNotFound(JointId),

    /// A joint is already registered under this id.
    #[error("joint {0} already exists")]
    DuplicateJoint(JointId),

    /// No aggregate is registered under this id.
    #[error("aggregate {0} not found")]
    AggregateNotFound(AggregateId),

    /// An aggregate is already registered under this id.
    #[error("aggregate {0} already exists")]
    DuplicateAggregate(AggregateId),

    /// The aggregate holds its maximum number of actors.
    #[error("aggregate {0} is full")]
    AggregateFull(AggregateId),

    /// The operation only applies to dynamic actors.
    #[error("actor {0} is not dynamic")]
    NotDynamic(ActorId),

    /// Densities must be non-negative.
    #[error("invalid density {0}")]
    InvalidDensity(f32),

    /// Masses must be finite and non-negative.
    #[error("invalid mass {0}")]
    InvalidMass(f32),

    /// The engine could not build a collision shape.
    #[error("failed to create collision shape: {reason}")]
    CollisionShape {
        /// Reason for failure.
        reason: String,
    },

    /// World settings could not be parsed.
    #[error("invalid settings: {0}")]
    Settings(String),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

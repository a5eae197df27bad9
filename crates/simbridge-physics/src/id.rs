//! Caller-assigned identifiers.
//!
//! Actors, shapes, joints and aggregates each live in their own namespace, so
//! each gets its own key type. Shape ids are only unique within their owning
//! actor.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Raw numeric value as handed over by the host.
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a rigid actor.
    ActorId
);
define_id!(
    /// Identifier of a shape, unique per owning actor.
    ShapeId
);
define_id!(
    /// Identifier of a joint.
    JointId
);
define_id!(
    /// Identifier of an actor aggregate.
    AggregateId
);

impl ActorId {
    /// Id written into step results for bodies the registry does not track.
    pub const UNTRACKED: ActorId = ActorId(0);
}

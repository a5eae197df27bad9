//! World configuration.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Density substituted for shapes whose density is zero or negative when
/// recomputing mass (kg/m³).
pub const DEFAULT_DENSITY: f32 = 1000.0;

/// Positional projection tolerance applied to every joint.
pub const DEFAULT_PROJECTION_LINEAR_TOLERANCE: f32 = 0.1;

/// Number of contact points extracted per contact pair.
pub const DEFAULT_CONTACT_POINTS_PER_PAIR: usize = 64;

/// Physics world parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Scene gravity (m/s²). The host is z-up.
    pub gravity: [f32; 3],
    /// Step results published per step when the host has not registered
    /// its own buffer.
    pub max_updates: usize,
    /// Capacity of the collision sink.
    pub max_collisions: usize,
    /// Contact points extracted per colliding pair.
    pub contact_points_per_pair: usize,
    /// Density used in place of non-positive shape densities (kg/m³).
    pub default_density: f32,
    /// Positional projection tolerance for joints.
    pub projection_linear_tolerance: f32,
    /// Enable continuous collision detection on dynamic actors.
    pub ccd_enabled: bool,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0, -9.8],
            max_updates: 1024,
            max_collisions: 1024,
            contact_points_per_pair: DEFAULT_CONTACT_POINTS_PER_PAIR,
            default_density: DEFAULT_DENSITY,
            projection_linear_tolerance: DEFAULT_PROJECTION_LINEAR_TOLERANCE,
            ccd_enabled: true,
        }
    }
}

impl WorldSettings {
    /// Parse settings from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| BridgeError::Settings(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = WorldSettings::from_json(r#"{ "max_collisions": 16 }"#).unwrap();
        assert_eq!(settings.max_collisions, 16);
        assert_eq!(settings.gravity, [0.0, 0.0, -9.8]);
        assert_eq!(settings.default_density, DEFAULT_DENSITY);
        assert!(settings.ccd_enabled);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let settings = WorldSettings::from_json(r#"{ "gpu_enabled": true }"#).unwrap();
        assert_eq!(settings, WorldSettings::default());
    }

    #[test]
    fn test_malformed_json() {
        let err = WorldSettings::from_json("{ max_updates: ").unwrap_err();
        assert!(matches!(err, BridgeError::Settings(_)));
    }
}

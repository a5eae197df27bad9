//! Collision shapes attached to actors.

use nalgebra::Point3;
use parry3d::shape::{ConvexPolyhedron, SharedShape, TriMesh};
use rapier3d::geometry::ColliderHandle;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::id::ShapeId;

/// Geometry handed to the engine for a new shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeGeometry {
    /// Sphere centered on the actor origin.
    Sphere {
        /// Radius.
        radius: f32,
    },
    /// Box given by its half extents.
    Box {
        /// Half extents along x, y, z.
        half_extents: [f32; 3],
    },
    /// Capsule aligned with the local x axis.
    Capsule {
        /// Half the length of the cylindrical part.
        half_height: f32,
        /// Radius of the caps.
        radius: f32,
    },
    /// Static triangle mesh.
    TriangleMesh {
        /// Vertex positions.
        vertices: Vec<[f32; 3]>,
        /// Triangles as vertex index triples.
        indices: Vec<[u32; 3]>,
    },
    /// Convex hull of a point cloud.
    ConvexMesh {
        /// Hull input points.
        points: Vec<[f32; 3]>,
    },
}

impl ShapeGeometry {
    /// Build the engine shape.
    pub(crate) fn to_shared_shape(&self) -> Result<SharedShape> {
        match self {
            ShapeGeometry::Sphere { radius } => Ok(SharedShape::ball(*radius)),
            ShapeGeometry::Box { half_extents } => Ok(SharedShape::cuboid(
                half_extents[0],
                half_extents[1],
                half_extents[2],
            )),
            ShapeGeometry::Capsule {
                half_height,
                radius,
            } => Ok(SharedShape::capsule_x(*half_height, *radius)),
            ShapeGeometry::TriangleMesh { vertices, indices } => {
                if indices.is_empty() {
                    return Err(BridgeError::CollisionShape {
                        reason: "no triangles in mesh".to_string(),
                    });
                }
                let points = vertices.iter().map(|v| Point3::new(v[0], v[1], v[2])).collect();
                TriMesh::new(points, indices.clone())
                    .map(SharedShape::new)
                    .map_err(|e| BridgeError::CollisionShape {
                        reason: format!("failed to create trimesh: {:?}", e),
                    })
            }
            ShapeGeometry::ConvexMesh { points } => {
                if points.len() < 4 {
                    return Err(BridgeError::CollisionShape {
                        reason: "need at least 4 points for convex hull".to_string(),
                    });
                }
                let points: Vec<Point3<f32>> =
                    points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect();
                ConvexPolyhedron::from_convex_hull(&points)
                    .map(SharedShape::new)
                    .ok_or_else(|| BridgeError::CollisionShape {
                        reason: "degenerate convex hull".to_string(),
                    })
            }
        }
    }
}

/// Surface material of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeMaterial {
    /// Friction when at rest.
    pub static_friction: f32,
    /// Friction while sliding. Rapier has one coefficient and uses this one.
    pub dynamic_friction: f32,
    /// Bounciness.
    pub restitution: f32,
}

impl Default for ShapeMaterial {
    fn default() -> Self {
        Self {
            static_friction: 0.5,
            dynamic_friction: 0.5,
            restitution: 0.1,
        }
    }
}

/// A shape attached to an actor, owning its engine collider.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    id: ShapeId,
    collider: ColliderHandle,
    density: f32,
}

impl ShapeRecord {
    /// Wrap an attached collider. A negative density is stored as zero.
    pub(crate) fn new(id: ShapeId, collider: ColliderHandle, density: f32) -> Self {
        let mut record = Self {
            id,
            collider,
            density: 0.0,
        };
        record.set_density(density);
        record
    }

    /// Shape id.
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Engine collider backing this shape.
    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    /// Current density.
    pub fn density(&self) -> f32 {
        self.density
    }

    /// Update the density. Negative values are ignored and `false` returned.
    pub fn set_density(&mut self, density: f32) -> bool {
        if density >= 0.0 {
            self.density = density;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_corners() -> Vec<[f32; 3]> {
        let s = 0.5;
        vec![
            [-s, -s, -s],
            [s, -s, -s],
            [s, s, -s],
            [-s, s, -s],
            [-s, -s, s],
            [s, -s, s],
            [s, s, s],
            [-s, s, s],
        ]
    }

    #[test]
    fn test_negative_density_keeps_prior_value() {
        let mut record = ShapeRecord::new(ShapeId(1), ColliderHandle::invalid(), 2.5);
        assert!(!record.set_density(-1.0));
        assert_eq!(record.density(), 2.5);
        assert!(record.set_density(0.0));
        assert_eq!(record.density(), 0.0);
    }

    #[test]
    fn test_negative_initial_density_is_zero() {
        let record = ShapeRecord::new(ShapeId(1), ColliderHandle::invalid(), -3.0);
        assert_eq!(record.density(), 0.0);
    }

    #[test]
    fn test_primitive_shapes() {
        let ball = ShapeGeometry::Sphere { radius: 1.0 }.to_shared_shape().unwrap();
        assert!(ball.as_ball().is_some());
        let cuboid = ShapeGeometry::Box {
            half_extents: [1.0, 2.0, 3.0],
        }
        .to_shared_shape()
        .unwrap();
        assert_eq!(cuboid.as_cuboid().unwrap().half_extents.z, 3.0);
        let capsule = ShapeGeometry::Capsule {
            half_height: 1.0,
            radius: 0.25,
        }
        .to_shared_shape()
        .unwrap();
        assert!(capsule.as_capsule().is_some());
    }

    #[test]
    fn test_convex_hull() {
        let shape = ShapeGeometry::ConvexMesh {
            points: cube_corners(),
        }
        .to_shared_shape()
        .unwrap();
        assert!(shape.as_convex_polyhedron().is_some());
    }

    #[test]
    fn test_convex_hull_needs_four_points() {
        let err = ShapeGeometry::ConvexMesh {
            points: cube_corners()[..3].to_vec(),
        }
        .to_shared_shape()
        .unwrap_err();
        assert!(matches!(err, BridgeError::CollisionShape { .. }));
    }

    #[test]
    fn test_trimesh() {
        let shape = ShapeGeometry::TriangleMesh {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![[0, 1, 2]],
        }
        .to_shared_shape()
        .unwrap();
        assert!(shape.as_trimesh().is_some());
    }

    #[test]
    fn test_empty_trimesh_rejected() {
        let err = ShapeGeometry::TriangleMesh {
            vertices: vec![],
            indices: vec![],
        }
        .to_shared_shape()
        .unwrap_err();
        assert!(matches!(err, BridgeError::CollisionShape { .. }));
    }
}

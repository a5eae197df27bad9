//! Translation of per-axis limits into rapier 6-DOF joints.
//!
//! The host describes a joint with a lower/upper pair per axis (3 linear,
//! 3 angular). Each pair classifies the axis as locked, free, or limited.
//! Angular axis 0 is the twist axis; axes 1 and 2 are combined into a single
//! swing cone.

use nalgebra::Isometry3;
use rapier3d::dynamics::{GenericJoint, GenericJointBuilder, JointAxesMask, JointAxis};
use serde::{Deserialize, Serialize};

use crate::settings::DEFAULT_PROJECTION_LINEAR_TOLERANCE;

const LINEAR_AXES: [JointAxis; 3] = [JointAxis::LinX, JointAxis::LinY, JointAxis::LinZ];
const LINEAR_MASKS: [JointAxesMask; 3] =
    [JointAxesMask::LIN_X, JointAxesMask::LIN_Y, JointAxesMask::LIN_Z];
const ANGULAR_MASKS: [JointAxesMask; 3] =
    [JointAxesMask::ANG_X, JointAxesMask::ANG_Y, JointAxesMask::ANG_Z];

/// Freedom of a single joint axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisMotion {
    /// No movement along the axis.
    Locked,
    /// Unconstrained.
    Free,
    /// Constrained to a range of the given size.
    Limited {
        /// `upper - lower`.
        magnitude: f32,
    },
}

/// Classify one axis from its limit pair.
///
/// `lower > upper` is the host's way of saying "no limit". Pairs that
/// compare neither equal nor ordered (NaN) are treated the same way.
pub fn classify_axis(lower: f32, upper: f32) -> AxisMotion {
    if lower == upper {
        AxisMotion::Locked
    } else if lower < upper {
        AxisMotion::Limited {
            magnitude: upper - lower,
        }
    } else {
        AxisMotion::Free
    }
}

/// Lower/upper limit pairs for all six axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    /// Lower linear limits along x, y, z.
    pub linear_lower: [f32; 3],
    /// Upper linear limits along x, y, z.
    pub linear_upper: [f32; 3],
    /// Lower angular limits: twist, swing 1, swing 2.
    pub angular_lower: [f32; 3],
    /// Upper angular limits: twist, swing 1, swing 2.
    pub angular_upper: [f32; 3],
}

/// Combined limit over the two swing axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingCone {
    /// Limit around the y axis.
    pub y: f32,
    /// Limit around the z axis.
    pub z: f32,
}

/// Positional correction keeping a stressed joint inside its limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Distance past which the joint is projected back.
    pub linear_tolerance: f32,
    /// Whether projection is on.
    pub enabled: bool,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            linear_tolerance: DEFAULT_PROJECTION_LINEAR_TOLERANCE,
            enabled: true,
        }
    }
}

/// A fully classified 6-DOF joint, ready to hand to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct D6JointDesc {
    /// Joint frame relative to the first body.
    pub frame1: Isometry3<f32>,
    /// Joint frame relative to the second body.
    pub frame2: Isometry3<f32>,
    /// Motion along x, y, z.
    pub linear: [AxisMotion; 3],
    /// Motion around twist, swing 1, swing 2.
    pub angular: [AxisMotion; 3],
    /// Shared linear limit; the last limited linear axis wins.
    pub linear_limit: Option<f32>,
    /// Twist range `[lower, upper]`.
    pub twist_limit: Option<[f32; 2]>,
    /// Swing cone, set when either swing magnitude is positive.
    pub swing_cone: Option<SwingCone>,
    /// Projection settings.
    pub projection: Projection,
}

impl D6JointDesc {
    /// Classify every axis and derive the limits.
    pub fn new(frame1: Isometry3<f32>, frame2: Isometry3<f32>, limits: &AxisLimits) -> Self {
        let linear: [AxisMotion; 3] =
            std::array::from_fn(|i| classify_axis(limits.linear_lower[i], limits.linear_upper[i]));
        let angular: [AxisMotion; 3] = std::array::from_fn(|i| {
            classify_axis(limits.angular_lower[i], limits.angular_upper[i])
        });

        // The engine-side joint carries a single linear extent.
        let mut linear_limit = None;
        for motion in &linear {
            if let AxisMotion::Limited { magnitude } = motion {
                linear_limit = Some(*magnitude);
            }
        }

        let twist_limit = match angular[0] {
            AxisMotion::Limited { .. } => Some([limits.angular_lower[0], limits.angular_upper[0]]),
            _ => None,
        };

        let mut swing_y = 0.0;
        let mut swing_z = 0.0;
        if let AxisMotion::Limited { magnitude } = angular[1] {
            swing_y = magnitude;
        }
        if let AxisMotion::Limited { magnitude } = angular[2] {
            swing_z = magnitude;
        }
        let swing_cone = (swing_y > 0.0 || swing_z > 0.0).then_some(SwingCone {
            y: swing_y,
            z: swing_z,
        });

        Self {
            frame1,
            frame2,
            linear,
            angular,
            linear_limit,
            twist_limit,
            swing_cone,
            projection: Projection::default(),
        }
    }

    /// Override the projection tolerance.
    pub fn with_projection_tolerance(mut self, tolerance: f32) -> Self {
        self.projection.linear_tolerance = tolerance;
        self
    }

    /// Axes with no freedom.
    pub fn locked_axes(&self) -> JointAxesMask {
        let mut mask = JointAxesMask::empty();
        for (motion, axis) in self.linear.iter().zip(LINEAR_MASKS) {
            if *motion == AxisMotion::Locked {
                mask |= axis;
            }
        }
        for (motion, axis) in self.angular.iter().zip(ANGULAR_MASKS) {
            if *motion == AxisMotion::Locked {
                mask |= axis;
            }
        }
        mask
    }

    /// Build the rapier joint.
    ///
    /// Rapier has no projection; the settings stay on the descriptor.
    pub fn to_generic_joint(&self) -> GenericJoint {
        let mut builder = GenericJointBuilder::new(self.locked_axes())
            .local_frame1(self.frame1)
            .local_frame2(self.frame2);

        if let Some(extent) = self.linear_limit {
            for (motion, axis) in self.linear.iter().zip(LINEAR_AXES) {
                if matches!(motion, AxisMotion::Limited { .. }) {
                    builder = builder.limits(axis, [-extent, extent]);
                }
            }
        }
        if let Some(twist) = self.twist_limit {
            builder = builder.limits(JointAxis::AngX, twist);
        }
        if let Some(cone) = self.swing_cone {
            if matches!(self.angular[1], AxisMotion::Limited { .. }) {
                builder = builder.limits(JointAxis::AngY, [-cone.y, cone.y]);
            }
            if matches!(self.angular[2], AxisMotion::Limited { .. }) {
                builder = builder.limits(JointAxis::AngZ, [-cone.z, cone.z]);
            }
        }

        builder.build()
    }
}

/*!
Core collision types and math aliases shared by the collision submodules.

This module contains no algorithms. It defines the data exchanged between:
- the portion index (descriptor lookups per grid cell)
- the bounding volumes and SAT tester
- the ray resolver and its result
- the movement integrator
*/

use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Rot3 = na::Rotation3<f32>;

/// Box description `[cx, cy, cz, sx, sy, sz, rotY, rotX, rotZ]`.
///
/// Centre and size are in pixels, rotations in degrees. Descriptor boxes are world-space;
/// agent boxes are relative to the agent's feet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 9]", into = "[f32; 9]")]
pub struct BoxSpec {
    pub center: Vec3,
    pub size: Vec3,
    pub rot_y: f32,
    pub rot_x: f32,
    pub rot_z: f32,
}

impl BoxSpec {
    #[inline]
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self {
            center,
            size,
            rot_y: 0.0,
            rot_x: 0.0,
            rot_z: 0.0,
        }
    }

    #[inline]
    pub fn with_rotation(mut self, rot_y: f32, rot_x: f32, rot_z: f32) -> Self {
        self.rot_y = rot_y;
        self.rot_x = rot_x;
        self.rot_z = rot_z;
        self
    }

    /// Half of the widest horizontal extent.
    #[inline]
    pub fn half_width(&self) -> f32 {
        self.size.x.max(self.size.z) * 0.5
    }
}

impl From<[f32; 9]> for BoxSpec {
    fn from(b: [f32; 9]) -> Self {
        BoxSpec::new(Vec3::new(b[0], b[1], b[2]), Vec3::new(b[3], b[4], b[5]))
            .with_rotation(b[6], b[7], b[8])
    }
}

impl From<BoxSpec> for [f32; 9] {
    fn from(b: BoxSpec) -> Self {
        [
            b.center.x, b.center.y, b.center.z, b.size.x, b.size.y, b.size.z, b.rot_y, b.rot_x,
            b.rot_z,
        ]
    }
}

/// Discrete facing of an agent. `None` means "no particular orientation".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    South,
    West,
    North,
    East,
    None,
}

impl Orientation {
    /// Yaw in degrees about +Y where 0 faces +Z (south) and 90 faces +X (east).
    #[inline]
    pub fn yaw_degrees(self) -> Option<f32> {
        match self {
            Orientation::South => Some(0.0),
            Orientation::East => Some(90.0),
            Orientation::North => Some(180.0),
            Orientation::West => Some(270.0),
            Orientation::None => None,
        }
    }
}

/// How a climbing agent should present itself while on a climbable sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClimbHint {
    /// Forced look direction, or `Orientation::None` to keep the input orientation.
    pub orientation: Orientation,
    /// True while moving toward the sprite's top.
    pub up: bool,
}

/// Result of a ray collision check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RayOutcome {
    /// The displacement is accepted as-is.
    Free,
    /// The displacement is rejected; the agent stays where it was.
    Blocked,
    /// The displacement is accepted with the agent snapped to height `y`.
    ///
    /// `climb` is set when the height comes from a climbable sprite; the agent then keeps its
    /// horizontal position and only moves vertically.
    RequiresHeightAdjustment { y: f32, climb: Option<ClimbHint> },
}

impl RayOutcome {
    #[inline]
    pub fn is_blocked(&self) -> bool {
        matches!(self, RayOutcome::Blocked)
    }

    #[inline]
    pub fn mountain_y(&self) -> Option<f32> {
        match self {
            RayOutcome::RequiresHeightAdjustment { y, .. } => Some(*y),
            _ => None,
        }
    }

    #[inline]
    pub fn climb(&self) -> Option<ClimbHint> {
        match self {
            RayOutcome::RequiresHeightAdjustment { climb, .. } => *climb,
            _ => None,
        }
    }
}

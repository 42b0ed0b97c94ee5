use std::f32::consts::FRAC_1_SQRT_2;

/// Edge length of one grid square in world units (pixels).
/// All squares are square.
pub const DEFAULT_SQUARE_SIZE: f32 = 16.0;

/// Number of squares along each axis of a portion (chunk).
pub const DEFAULT_PORTION_SIZE: i32 = 16;

/// Largest height difference (pixels) an agent can step up or down without a slope.
///
/// Also the search window used by the fallback floor search.
pub const DEFAULT_MOUNTAIN_COLLISION_HEIGHT: f32 = 4.0;

/// Steepest walkable mountain slope, in degrees.
///
/// Admits the common two-squares-up-per-square slope (atan 2, about 63.4°).
pub const DEFAULT_MOUNTAIN_COLLISION_ANGLE: f32 = 70.0;

/// Vertical pixels climbed per horizontal pixel of input while on a climbable sprite.
pub const DEFAULT_CLIMBING_SPEED: f32 = 0.5;

/// Base walking speed in squares per millisecond for a speed multiplier of 1.0.
pub const SPEED_NORMAL: f32 = 0.004666;

/// Distance multiplier applied when a climbing agent changes orientation.
pub const CLIMBING_TURN_FACTOR: f32 = FRAC_1_SQRT_2;

/// Rotation applied to diamond (sprite-facing) boxes about the vertical axis, in degrees.
pub const ORIENTED_BOX_ANGLE: f32 = 45.0;

/// How far below the destination the climb-down search looks (pixels).
pub const CLIMB_DOWN_DEPTH: f32 = 1.0;

/// Minimum |cos| between the planar move and a sprite's facing for the move to count as
/// climbing up (toward the sprite) or down (away from it).
pub const CLIMB_ALIGNMENT: f32 = 0.5;

/// Widest descriptor footprint accepted from a record, in squares along any axis.
pub const MAX_DESCRIPTOR_SPAN: i32 = 64;

/// Tolerance used when comparing heights (pixels).
pub const HEIGHT_EPS: f32 = 1.0e-3;

/// Minimum planar displacement treated as actual movement (pixels).
pub const MOVE_EPS: f32 = 1.0e-4;

/// Bits per axis in a packed portion key.
pub const PORTION_KEY_BITS: u32 = 21;

/// Bias added to each signed portion coordinate before packing.
pub const PORTION_KEY_BIAS: i32 = 1 << (PORTION_KEY_BITS - 1);

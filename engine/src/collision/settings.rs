/*!
Collision settings and tolerances.

`CollisionConfig` gathers the per-game parameters used by the portion index, the ray
resolver and the movement integrator. Defaults come from [`crate::constants`]; a game can
override any subset from RON text:

```text
(
    square_size: 32.0,
    mountain_collision_height: 8.0,
)
```

Notes
- Distances are in pixels, angles in degrees.
- Missing fields keep their default value.
*/

use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        DEFAULT_CLIMBING_SPEED, DEFAULT_MOUNTAIN_COLLISION_ANGLE,
        DEFAULT_MOUNTAIN_COLLISION_HEIGHT, DEFAULT_PORTION_SIZE, DEFAULT_SQUARE_SIZE,
    },
    error::CollisionError,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Edge length of one grid square (pixels).
    pub square_size: f32,
    /// Squares per portion edge.
    pub portion_size: i32,
    /// Largest step up/down without a slope (pixels).
    pub mountain_collision_height: f32,
    /// Steepest walkable slope (degrees).
    pub mountain_collision_angle: f32,
    /// Vertical pixels climbed per horizontal pixel of input.
    pub climbing_speed: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            square_size: DEFAULT_SQUARE_SIZE,
            portion_size: DEFAULT_PORTION_SIZE,
            mountain_collision_height: DEFAULT_MOUNTAIN_COLLISION_HEIGHT,
            mountain_collision_angle: DEFAULT_MOUNTAIN_COLLISION_ANGLE,
            climbing_speed: DEFAULT_CLIMBING_SPEED,
        }
    }
}

impl CollisionConfig {
    /// Parse a config from RON text. Absent fields fall back to defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, CollisionError> {
        let config: CollisionConfig = ron::from_str(text)?;
        Ok(config.sanitized())
    }

    /// Clamp values that would make the grid or the resolver degenerate.
    fn sanitized(mut self) -> Self {
        if self.square_size <= 0.0 {
            log::warn!(
                "square_size {} is not positive, using {}",
                self.square_size,
                DEFAULT_SQUARE_SIZE
            );
            self.square_size = DEFAULT_SQUARE_SIZE;
        }
        if self.portion_size <= 0 {
            log::warn!(
                "portion_size {} is not positive, using {}",
                self.portion_size,
                DEFAULT_PORTION_SIZE
            );
            self.portion_size = DEFAULT_PORTION_SIZE;
        }
        self.mountain_collision_height = self.mountain_collision_height.max(0.0);
        self.mountain_collision_angle = self.mountain_collision_angle.clamp(0.0, 90.0);
        self.climbing_speed = self.climbing_speed.max(0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_keeps_defaults() {
        let config = CollisionConfig::from_ron_str("(square_size: 32.0)").unwrap();
        assert_eq!(config.square_size, 32.0);
        assert_eq!(config.portion_size, DEFAULT_PORTION_SIZE);
        assert_eq!(
            config.mountain_collision_height,
            DEFAULT_MOUNTAIN_COLLISION_HEIGHT
        );
    }

    #[test]
    fn degenerate_values_are_clamped() {
        let config =
            CollisionConfig::from_ron_str("(square_size: -1.0, mountain_collision_angle: 120.0)")
                .unwrap();
        assert_eq!(config.square_size, DEFAULT_SQUARE_SIZE);
        assert_eq!(config.mountain_collision_angle, 90.0);
    }

    #[test]
    fn malformed_ron_is_an_error() {
        assert!(matches!(
            CollisionConfig::from_ron_str("(square_size: )"),
            Err(CollisionError::Config(_))
        ));
    }
}

use serde::{Deserialize, Serialize};

use crate::{
    cell::{GridCell, Portion},
    collision::types::Vec3,
};

/// Discrete grid position plus sub-square offsets.
///
/// `center_x` / `center_z` are percentages of a square (50 = centred), `y_pixels` is the
/// height above the bottom of square `y`. Angles are in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub y_pixels: f32,
    pub z: i32,
    pub layer: u8,
    pub center_x: f32,
    pub center_z: f32,
    pub angle_y: f32,
    pub angle_x: f32,
    pub angle_z: f32,
    pub scale: [f32; 3],
}

impl Default for Position {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            y_pixels: 0.0,
            z: 0,
            layer: 0,
            center_x: 50.0,
            center_z: 50.0,
            angle_y: 0.0,
            angle_x: 0.0,
            angle_z: 0.0,
            scale: [1.0, 1.0, 1.0],
        }
    }
}

impl Position {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self {
            x,
            y,
            z,
            ..Self::default()
        }
    }

    pub fn with_y_pixels(mut self, y_pixels: f32) -> Self {
        self.y_pixels = y_pixels;
        self
    }

    pub fn with_angle_y(mut self, angle_y: f32) -> Self {
        self.angle_y = angle_y;
        self
    }

    /// Builds a position from a world vector; rotation and scale are left at defaults.
    pub fn from_world(v: Vec3, square_size: f32) -> Self {
        let cell = GridCell::containing(v, square_size);
        Self {
            x: cell.x,
            y: cell.y,
            y_pixels: v.y - cell.y as f32 * square_size,
            z: cell.z,
            center_x: (v.x - cell.x as f32 * square_size) / square_size * 100.0,
            center_z: (v.z - cell.z as f32 * square_size) / square_size * 100.0,
            ..Self::default()
        }
    }

    pub fn to_world(&self, square_size: f32) -> Vec3 {
        Vec3::new(
            (self.x as f32 + self.center_x / 100.0) * square_size,
            self.world_y(square_size),
            (self.z as f32 + self.center_z / 100.0) * square_size,
        )
    }

    #[inline]
    pub fn world_y(&self, square_size: f32) -> f32 {
        self.y as f32 * square_size + self.y_pixels
    }

    #[inline]
    pub fn cell(&self) -> GridCell {
        GridCell::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn portion(&self, portion_size: i32) -> Portion {
        self.cell().portion(portion_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_round_trip_keeps_grid_and_offsets() {
        let p = Position::new(3, 1, -2).with_y_pixels(4.0);
        let v = p.to_world(16.0);
        assert!((v - Vec3::new(56.0, 20.0, -24.0)).norm() < 1.0e-5);

        let back = Position::from_world(v, 16.0);
        assert_eq!(back.cell(), p.cell());
        assert!((back.y_pixels - 4.0).abs() < 1.0e-5);
        assert!((back.center_x - 50.0).abs() < 1.0e-3);
        assert!((back.center_z - 50.0).abs() < 1.0e-3);
    }

    #[test]
    fn portion_follows_cell() {
        let p = Position::new(17, 0, -1);
        assert_eq!(p.portion(16), Portion::new(1, 0, -1));
    }
}

//! Grid cell and portion coordinates.
//!
//! This module centralizes the grid/portion scheme so it's easy to reason about world sizing
//! and to test correctness.
//!
//! # Model
//! - A [`GridCell`] is one square of the world grid, `(x, y, z)` in squares.
//! - A [`Portion`] is a cube of `portion_size^3` cells used for spatial indexing.
//! - World units are pixels; a square is `square_size` pixels wide.
//!
//! # Encoding
//! A portion is packed into a [`PortionKey`] (`u64`) by biasing each signed coordinate by
//! `PORTION_KEY_BIAS` and storing it in `PORTION_KEY_BITS` bits, X in the low bits:
//! - `key = bx | by << 21 | bz << 42`
//!
//! Coordinates outside the representable range are clamped. The key is the only identity
//! used by the portion index and its overflow tables.

use std::fmt;

use crate::{
    collision::types::Vec3,
    constants::{PORTION_KEY_BIAS, PORTION_KEY_BITS},
};

const KEY_MASK: u64 = (1u64 << PORTION_KEY_BITS) - 1;

/// One square of the world grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCell {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Cell containing the world point `v`.
    #[inline]
    pub fn containing(v: Vec3, square_size: f32) -> Self {
        Self {
            x: (v.x / square_size).floor() as i32,
            y: (v.y / square_size).floor() as i32,
            z: (v.z / square_size).floor() as i32,
        }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Vertical column `(x, z)` this cell belongs to.
    #[inline]
    pub fn column(self) -> (i32, i32) {
        (self.x, self.z)
    }

    #[inline]
    pub fn portion(self, portion_size: i32) -> Portion {
        Portion {
            x: self.x.div_euclid(portion_size),
            y: self.y.div_euclid(portion_size),
            z: self.z.div_euclid(portion_size),
        }
    }

    /// Every cell touched by the world-space box `[min, max]` (bounds inclusive).
    pub fn covering(min: Vec3, max: Vec3, square_size: f32) -> Vec<GridCell> {
        let lo = Self::containing(min, square_size);
        let hi = Self::containing(max, square_size);
        let mut cells = Vec::new();
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    cells.push(GridCell::new(x, y, z));
                }
            }
        }
        cells
    }
}

/// A fixed-size chunk of the world grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Portion {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Portion {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn containing(v: Vec3, square_size: f32, portion_size: i32) -> Self {
        GridCell::containing(v, square_size).portion(portion_size)
    }

    #[inline]
    pub fn key(self) -> PortionKey {
        encode_portion_key(self)
    }

    /// World position of the portion's minimum corner.
    #[inline]
    pub fn origin(self, square_size: f32, portion_size: i32) -> Vec3 {
        let span = square_size * portion_size as f32;
        Vec3::new(
            self.x as f32 * span,
            self.y as f32 * span,
            self.z as f32 * span,
        )
    }
}

/// Packed, hashable identity of a [`Portion`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortionKey(pub u64);

impl fmt::Display for PortionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = decode_portion_key(*self);
        write!(f, "{}_{}_{}", p.x, p.y, p.z)
    }
}

#[inline]
fn bias(c: i32) -> u64 {
    let max = PORTION_KEY_BIAS - 1;
    (c.clamp(-PORTION_KEY_BIAS, max) + PORTION_KEY_BIAS) as u64
}

#[inline]
fn unbias(bits: u64) -> i32 {
    (bits & KEY_MASK) as i32 - PORTION_KEY_BIAS
}

/// Encodes a portion into its [`PortionKey`]. Out-of-range coordinates clamp.
#[inline]
pub fn encode_portion_key(p: Portion) -> PortionKey {
    PortionKey(bias(p.x) | (bias(p.y) << PORTION_KEY_BITS) | (bias(p.z) << (2 * PORTION_KEY_BITS)))
}

/// Decodes a [`PortionKey`] back into portion coordinates.
#[inline]
pub fn decode_portion_key(key: PortionKey) -> Portion {
    Portion {
        x: unbias(key.0),
        y: unbias(key.0 >> PORTION_KEY_BITS),
        z: unbias(key.0 >> (2 * PORTION_KEY_BITS)),
    }
}

/// Returns the 2x2 block of portions (same vertical layer) nearest to `v`.
///
/// Layout: `[0]` own portion, `[1]` X neighbour, `[2]` Z neighbour, `[3]` diagonal.
/// The neighbours are taken on the side of the portion `v` is closest to.
pub fn portion_block_2x2(v: Vec3, square_size: f32, portion_size: i32) -> [Portion; 4] {
    let p = Portion::containing(v, square_size, portion_size);
    let span = square_size * portion_size as f32;
    let fx = v.x / span - p.x as f32;
    let fz = v.z / span - p.z as f32;
    let dx = if fx < 0.5 { -1 } else { 1 };
    let dz = if fz < 0.5 { -1 } else { 1 };
    [
        p,
        Portion::new(p.x + dx, p.y, p.z),
        Portion::new(p.x, p.y, p.z + dz),
        Portion::new(p.x + dx, p.y, p.z + dz),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trip_for_portion_coords() {
        let samples = [
            Portion::new(0, 0, 0),
            Portion::new(-1, 0, 1),
            Portion::new(12, -3, 400),
            Portion::new(PORTION_KEY_BIAS - 1, -PORTION_KEY_BIAS, 7),
        ];
        for p in samples {
            assert_eq!(decode_portion_key(p.key()), p);
        }
    }

    #[test]
    fn distinct_portions_have_distinct_keys() {
        let a = Portion::new(1, 0, 0).key();
        let b = Portion::new(0, 1, 0).key();
        let c = Portion::new(0, 0, 1).key();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn encode_clamps_to_key_range() {
        let p = Portion::new(i32::MAX, i32::MIN, 0);
        let decoded = decode_portion_key(p.key());
        assert_eq!(decoded.x, PORTION_KEY_BIAS - 1);
        assert_eq!(decoded.y, -PORTION_KEY_BIAS);
    }

    #[test]
    fn key_display_is_stable() {
        assert_eq!(Portion::new(-2, 0, 5).key().to_string(), "-2_0_5");
    }

    #[test]
    fn negative_positions_floor_into_lower_cells_and_portions() {
        let cell = GridCell::containing(Vec3::new(-0.5, 0.0, 15.9), 16.0);
        assert_eq!(cell, GridCell::new(-1, 0, 0));
        assert_eq!(cell.portion(16), Portion::new(-1, 0, 0));
        assert_eq!(GridCell::new(-16, 0, -17).portion(16), Portion::new(-1, 0, -2));
    }

    #[test]
    fn adjacent_portion_origins_differ_by_one_span() {
        let a = Portion::new(3, 0, 4).origin(16.0, 16);
        let b = Portion::new(4, 0, 4).origin(16.0, 16);
        assert!((b.x - a.x - 256.0).abs() < 1.0e-6);
        assert!((b.z - a.z).abs() < 1.0e-6);
    }

    #[test]
    fn covering_includes_every_touched_cell() {
        let cells = GridCell::covering(Vec3::new(8.0, 0.0, 8.0), Vec3::new(24.0, 4.0, 8.0), 16.0);
        assert_eq!(cells.len(), 2);
        assert!(cells.contains(&GridCell::new(0, 0, 0)));
        assert!(cells.contains(&GridCell::new(1, 0, 0)));
    }

    #[test]
    fn block_2x2_picks_nearest_side() {
        // Near the +X/-Z corner of portion (0,0,0).
        let block = portion_block_2x2(Vec3::new(250.0, 0.0, 3.0), 16.0, 16);
        assert_eq!(block[0], Portion::new(0, 0, 0));
        assert_eq!(block[1], Portion::new(1, 0, 0));
        assert_eq!(block[2], Portion::new(0, 0, -1));
        assert_eq!(block[3], Portion::new(1, 0, -1));
    }
}

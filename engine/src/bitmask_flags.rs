use num_traits::{One, PrimInt};
use serde::{Deserialize, Serialize};

/// Trait implemented by user-defined flag enums.
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index.
/// You choose the backing integer type via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A small bitmask container keyed by a [`FlagBitmask`] enum.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn has_all<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        if tags.is_empty() {
            return true;
        }
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) == combined
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

// Tile edges, seen from above: Left = -X, Right = +X, Top = -Z (north), Bottom = +Z (south).
define_bitmask_flags!(Edge, u8, { Left, Right, Top, Bottom });

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];

    /// Edge crossed when entering a tile while moving with the given sign along X.
    #[inline]
    pub fn entered_along_x(dx: f32) -> Edge {
        if dx > 0.0 { Edge::Left } else { Edge::Right }
    }

    /// Edge crossed when entering a tile while moving with the given sign along Z.
    #[inline]
    pub fn entered_along_z(dz: f32) -> Edge {
        if dz > 0.0 { Edge::Top } else { Edge::Bottom }
    }

    /// Edge crossed when leaving a tile while moving with the given sign along X.
    #[inline]
    pub fn left_along_x(dx: f32) -> Edge {
        if dx > 0.0 { Edge::Right } else { Edge::Left }
    }

    /// Edge crossed when leaving a tile while moving with the given sign along Z.
    #[inline]
    pub fn left_along_z(dz: f32) -> Edge {
        if dz > 0.0 { Edge::Bottom } else { Edge::Top }
    }
}

/// Which edges of a tile can be crossed. A set bit means "passable".
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Passability {
    open: BitmaskFlags<u8>,
}

impl Default for Passability {
    fn default() -> Self {
        Self::all_open()
    }
}

impl Passability {
    pub fn all_open() -> Self {
        let mut open = BitmaskFlags::default();
        for edge in Edge::ALL {
            open.add(edge);
        }
        Self { open }
    }

    pub fn from_sides(left: bool, right: bool, top: bool, bottom: bool) -> Self {
        let mut passability = Self::all_open();
        for (edge, is_open) in [
            (Edge::Left, left),
            (Edge::Right, right),
            (Edge::Top, top),
            (Edge::Bottom, bottom),
        ] {
            if !is_open {
                passability.close(edge);
            }
        }
        passability
    }

    pub fn close(&mut self, edge: Edge) {
        self.open.remove(edge);
    }

    #[inline]
    pub fn is_open(&self, edge: Edge) -> bool {
        self.open.has(edge)
    }

    #[inline]
    pub fn is_fully_open(&self) -> bool {
        self.open.has_all(&Edge::ALL)
    }
}

/// Wire form of [`Passability`] used by descriptor records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalRecord {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Default for DirectionalRecord {
    fn default() -> Self {
        Self {
            left: true,
            right: true,
            top: true,
            bottom: true,
        }
    }
}

impl From<DirectionalRecord> for Passability {
    fn from(r: DirectionalRecord) -> Self {
        Passability::from_sides(r.left, r.right, r.top, r.bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_passability_is_fully_open() {
        let p = Passability::default();
        assert!(p.is_fully_open());
        for edge in Edge::ALL {
            assert!(p.is_open(edge));
        }
    }

    #[test]
    fn closing_one_edge_leaves_the_others_open() {
        let p = Passability::from_sides(true, false, true, true);
        assert!(!p.is_fully_open());
        assert!(!p.is_open(Edge::Right));
        assert!(p.is_open(Edge::Left));
        assert!(p.is_open(Edge::Top));
        assert!(p.is_open(Edge::Bottom));
    }

    #[test]
    fn entering_and_leaving_edges_are_opposite() {
        assert_eq!(Edge::entered_along_x(1.0), Edge::Left);
        assert_eq!(Edge::left_along_x(1.0), Edge::Right);
        assert_eq!(Edge::entered_along_z(-1.0), Edge::Bottom);
        assert_eq!(Edge::left_along_z(-1.0), Edge::Top);
    }

    #[test]
    fn record_maps_to_passability() {
        let record = DirectionalRecord {
            left: false,
            ..DirectionalRecord::default()
        };
        let p = Passability::from(record);
        assert!(!p.is_open(Edge::Left));
        assert!(p.is_open(Edge::Bottom));
    }
}

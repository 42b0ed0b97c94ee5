/*!
Mountain geometry: a raised core square plus sloped patches on its open sides.

Layout (top view, `w` = slope width, core = `[x0, x1] x [z0, z1]`):

```text
        x0-w   x0        x1   x1+w
  z0-w   +-----+---------+-----+
         | c   |   top   |   c |
  z0     +-----+---------+-----+
         | left|  core   |right|
  z1     +-----+---------+-----+
         | c   | bottom  |   c |
  z1+w   +-----+---------+-----+
```

Side strips exist on open sides. A corner square `c` exists only when both adjacent sides
are open; it is split along its diagonal into two triangles, each continuing the slope of
the strip it touches. Every patch is a plane rising from the base at its outer edge to the
top at the core edge; heights are found by intersecting a vertical ray with that plane.
*/

use super::{
    descriptor::{MountainForce, MountainShape},
    settings::CollisionConfig,
    types::Vec3,
};
use crate::constants::HEIGHT_EPS;

/// Result of testing one point against one mountain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MountainContact {
    /// The point is not on or against this mountain.
    None,
    /// The mountain blocks the point.
    Blocked,
    /// The point stands on the mountain at this height.
    Height(f32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Region {
    Rect { min_x: f32, max_x: f32, min_z: f32, max_z: f32 },
    Triangle([(f32, f32); 3]),
}

impl Region {
    fn contains(&self, x: f32, z: f32) -> bool {
        match *self {
            Region::Rect {
                min_x,
                max_x,
                min_z,
                max_z,
            } => x >= min_x && x <= max_x && z >= min_z && z <= max_z,
            Region::Triangle([a, b, c]) => {
                let d1 = edge_sign((x, z), a, b);
                let d2 = edge_sign((x, z), b, c);
                let d3 = edge_sign((x, z), c, a);
                let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
                let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
                !(has_neg && has_pos)
            }
        }
    }
}

#[inline]
fn edge_sign(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    (p.0 - b.0) * (a.1 - b.1) - (a.0 - b.0) * (p.1 - b.1)
}

/// A planar slope patch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlopePatch {
    region: Region,
    plane: [Vec3; 3],
}

impl SlopePatch {
    #[inline]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        self.region.contains(x, z)
    }

    /// Height of the patch plane under `(x, z)`.
    #[inline]
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        vertical_ray_plane(self.plane, x, z)
    }
}

/// Intersects the vertical line through `(x, z)` with the plane through `p`.
///
/// Returns `None` for vertical planes.
pub fn vertical_ray_plane(p: [Vec3; 3], x: f32, z: f32) -> Option<f32> {
    let n = (p[1] - p[0]).cross(&(p[2] - p[0]));
    if n.y.abs() < HEIGHT_EPS {
        return None;
    }
    Some(p[0].y - (n.x * (x - p[0].x) + n.z * (z - p[0].z)) / n.y)
}

/// World-space geometry of one mountain.
#[derive(Clone, Debug, PartialEq)]
pub struct MountainGeometry {
    pub x0: f32,
    pub x1: f32,
    pub z0: f32,
    pub z1: f32,
    pub base: f32,
    pub top: f32,
    pub shape: MountainShape,
    patches: Vec<SlopePatch>,
}

impl MountainGeometry {
    /// `anchor` is the minimum corner of the core square at base height.
    pub fn new(anchor: Vec3, shape: MountainShape, square_size: f32) -> Self {
        let (x0, z0, base) = (anchor.x, anchor.z, anchor.y);
        let (x1, z1) = (x0 + square_size, z0 + square_size);
        let top = base + shape.height;
        let w = shape.width;
        let sides = shape.sides;
        let mut patches = Vec::new();

        if w > 0.0 {
            let p = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
            let rect = |min_x, max_x, min_z, max_z| Region::Rect {
                min_x,
                max_x,
                min_z,
                max_z,
            };
            if sides.left {
                patches.push(SlopePatch {
                    region: rect(x0 - w, x0, z0, z1),
                    plane: [p(x0 - w, base, z0), p(x0, top, z0), p(x0, top, z1)],
                });
            }
            if sides.right {
                patches.push(SlopePatch {
                    region: rect(x1, x1 + w, z0, z1),
                    plane: [p(x1, top, z0), p(x1 + w, base, z0), p(x1, top, z1)],
                });
            }
            if sides.top {
                patches.push(SlopePatch {
                    region: rect(x0, x1, z0 - w, z0),
                    plane: [p(x0, base, z0 - w), p(x0, top, z0), p(x1, top, z0)],
                });
            }
            if sides.bottom {
                patches.push(SlopePatch {
                    region: rect(x0, x1, z1, z1 + w),
                    plane: [p(x0, top, z1), p(x0, base, z1 + w), p(x1, top, z1)],
                });
            }

            for (open_x, open_z, ax, az, sx, sz) in [
                (sides.left, sides.top, x0, z0, -1.0, -1.0),
                (sides.right, sides.top, x1, z0, 1.0, -1.0),
                (sides.left, sides.bottom, x0, z1, -1.0, 1.0),
                (sides.right, sides.bottom, x1, z1, 1.0, 1.0),
            ] {
                if !(open_x && open_z) {
                    continue;
                }
                let (ox, oz) = (ax + sx * w, az + sz * w);
                // Continues the x-facing strip: rises along x.
                patches.push(SlopePatch {
                    region: Region::Triangle([(ox, oz), (ax, az), (ox, az)]),
                    plane: [p(ox, base, oz), p(ox, base, az), p(ax, top, az)],
                });
                // Continues the z-facing strip: rises along z.
                patches.push(SlopePatch {
                    region: Region::Triangle([(ox, oz), (ax, az), (ax, oz)]),
                    plane: [p(ox, base, oz), p(ax, base, oz), p(ax, top, az)],
                });
            }
        }

        Self {
            x0,
            x1,
            z0,
            z1,
            base,
            top,
            shape,
            patches,
        }
    }

    #[inline]
    pub fn core_contains(&self, x: f32, z: f32) -> bool {
        x >= self.x0 && x <= self.x1 && z >= self.z0 && z <= self.z1
    }

    #[inline]
    pub fn patches(&self) -> &[SlopePatch] {
        &self.patches
    }

    /// Slope height under `(x, z)`, from the first patch containing it.
    pub fn slope_height(&self, x: f32, z: f32) -> Option<f32> {
        self.patches
            .iter()
            .find(|patch| patch.contains(x, z))
            .and_then(|patch| patch.height_at(x, z))
    }
}

/// Tests the feet position `point` against a mountain.
///
/// `floor_at_current_y` tells whether the destination column already has a floor at the
/// point's height; a slope leading downward is then ignored.
pub fn check_intersection_mountain(
    geometry: &MountainGeometry,
    point: Vec3,
    floor_at_current_y: bool,
    config: &CollisionConfig,
) -> MountainContact {
    let tolerance = config.mountain_collision_height;
    let force = geometry.shape.force;
    let y = point.y;

    if geometry.core_contains(point.x, point.z) {
        if y >= geometry.top - HEIGHT_EPS || y < geometry.base - tolerance {
            return MountainContact::None;
        }
        return match force {
            MountainForce::Never => MountainContact::Blocked,
            MountainForce::Always => MountainContact::Height(geometry.top),
            MountainForce::Default if geometry.top - y > tolerance => MountainContact::Blocked,
            MountainForce::Default => MountainContact::Height(geometry.top),
        };
    }

    if geometry.shape.width <= 0.0 {
        return MountainContact::None;
    }
    let Some(slope_y) = geometry.slope_height(point.x, point.z) else {
        return MountainContact::None;
    };

    if force == MountainForce::Never {
        return MountainContact::Blocked;
    }
    if slope_y < y - tolerance {
        return MountainContact::None;
    }
    let always = force == MountainForce::Always;
    if slope_y > y + tolerance && !always {
        return MountainContact::Blocked;
    }
    if slope_y < y && floor_at_current_y {
        return MountainContact::None;
    }
    if geometry.shape.angle > config.mountain_collision_angle && !always {
        return MountainContact::Blocked;
    }
    MountainContact::Height(slope_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::descriptor::MountainSides;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1.0e-3
    }

    fn left_slope(force: MountainForce) -> MountainGeometry {
        let shape = MountainShape::new(
            32.0,
            64.0,
            MountainSides {
                left: true,
                ..MountainSides::NONE
            },
            force,
        );
        MountainGeometry::new(Vec3::new(32.0, 0.0, 0.0), shape, 16.0)
    }

    #[test]
    fn vertical_ray_meets_tilted_plane() {
        let plane = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 5.0, 0.0),
            Vec3::new(0.0, 0.0, 10.0),
        ];
        assert!(approx(vertical_ray_plane(plane, 4.0, 7.0).unwrap(), 2.0));
        let wall = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, 0.0, 10.0),
        ];
        assert_eq!(vertical_ray_plane(wall, 1.0, 1.0), None);
    }

    #[test]
    fn left_strip_height_is_linear_in_x() {
        let g = left_slope(MountainForce::Default);
        for d in [0.0, 1.5, 8.0, 20.0, 32.0] {
            assert!(approx(g.slope_height(d, 8.0).unwrap(), 64.0 * d / 32.0));
        }
        // Right of the core there is no slope.
        assert_eq!(g.slope_height(50.0, 8.0), None);
    }

    #[test]
    fn corner_triangles_continue_adjacent_strips() {
        let shape = MountainShape::new(16.0, 16.0, MountainSides::ALL, MountainForce::Default);
        let g = MountainGeometry::new(Vec3::new(16.0, 0.0, 16.0), shape, 16.0);
        assert_eq!(g.patches().len(), 12);
        // Top-left corner square is [0,16] x [0,16]; apex at (16, 16).
        // Below the diagonal (x > z) the slope rises along z.
        assert!(approx(g.slope_height(12.0, 4.0).unwrap(), 4.0));
        // Above the diagonal (z > x) it rises along x.
        assert!(approx(g.slope_height(4.0, 12.0).unwrap(), 4.0));
        // On the diagonal both agree.
        assert!(approx(g.slope_height(10.0, 10.0).unwrap(), 10.0));
    }

    #[test]
    fn corner_absent_without_both_sides() {
        let shape = MountainShape::new(
            16.0,
            16.0,
            MountainSides {
                left: true,
                bottom: true,
                ..MountainSides::NONE
            },
            MountainForce::Default,
        );
        let g = MountainGeometry::new(Vec3::new(16.0, 0.0, 16.0), shape, 16.0);
        assert_eq!(g.slope_height(8.0, 8.0), None);
        assert!(g.slope_height(8.0, 40.0).is_some());
    }

    #[test]
    fn core_wall_respects_tolerance() {
        let config = CollisionConfig::default();
        let low = MountainShape::new(0.0, 3.0, MountainSides::NONE, MountainForce::Default);
        let g = MountainGeometry::new(Vec3::new(16.0, 0.0, 0.0), low, 16.0);
        assert_eq!(
            check_intersection_mountain(&g, Vec3::new(20.0, 0.0, 8.0), false, &config),
            MountainContact::Height(3.0)
        );

        let high = MountainShape::new(0.0, 32.0, MountainSides::NONE, MountainForce::Default);
        let g = MountainGeometry::new(Vec3::new(16.0, 0.0, 0.0), high, 16.0);
        assert_eq!(
            check_intersection_mountain(&g, Vec3::new(20.0, 0.0, 8.0), false, &config),
            MountainContact::Blocked
        );
        // Already on top: nothing to do.
        assert_eq!(
            check_intersection_mountain(&g, Vec3::new(20.0, 32.0, 8.0), false, &config),
            MountainContact::None
        );
    }

    #[test]
    fn force_overrides_tolerance() {
        let config = CollisionConfig::default();
        let always = MountainShape::new(0.0, 32.0, MountainSides::NONE, MountainForce::Always);
        let g = MountainGeometry::new(Vec3::new(16.0, 0.0, 0.0), always, 16.0);
        assert_eq!(
            check_intersection_mountain(&g, Vec3::new(20.0, 0.0, 8.0), false, &config),
            MountainContact::Height(32.0)
        );
        let never = MountainShape::new(0.0, 1.0, MountainSides::NONE, MountainForce::Never);
        let g = MountainGeometry::new(Vec3::new(16.0, 0.0, 0.0), never, 16.0);
        assert_eq!(
            check_intersection_mountain(&g, Vec3::new(20.0, 0.0, 8.0), false, &config),
            MountainContact::Blocked
        );
    }

    #[test]
    fn steep_slope_blocks_unless_angle_allows() {
        let g = left_slope(MountainForce::Default);
        let point = Vec3::new(1.5, 0.0, 8.0);

        let strict = CollisionConfig {
            mountain_collision_angle: 45.0,
            ..CollisionConfig::default()
        };
        assert_eq!(
            check_intersection_mountain(&g, point, false, &strict),
            MountainContact::Blocked
        );

        match check_intersection_mountain(&g, point, false, &CollisionConfig::default()) {
            MountainContact::Height(y) => assert!(approx(y, 3.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn descending_slope_ignored_when_floor_exists() {
        let config = CollisionConfig {
            mountain_collision_angle: 70.0,
            ..CollisionConfig::default()
        };
        let g = left_slope(MountainForce::Default);
        // Slope is at 60 under x = 30; agent walks at 62.
        let point = Vec3::new(30.0, 62.0, 8.0);
        assert_eq!(
            check_intersection_mountain(&g, point, true, &config),
            MountainContact::None
        );
        match check_intersection_mountain(&g, point, false, &config) {
            MountainContact::Height(y) => assert!(approx(y, 60.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn point_outside_every_patch_has_no_interaction() {
        let config = CollisionConfig::default();
        let g = left_slope(MountainForce::Always);
        assert_eq!(
            check_intersection_mountain(&g, Vec3::new(10.0, 0.0, 30.0), false, &config),
            MountainContact::None
        );
    }
}

use rapier3d::parry::bounding_volume::Aabb;
use std::f32::consts::SQRT_2;

use super::types::{BoxSpec, Point3, Rot3, Vec3};
use crate::constants::ORIENTED_BOX_ANGLE;

/// Corners of the unit cube centred on the origin.
const UNIT_CORNERS: [[f32; 3]; 8] = [
    [-0.5, -0.5, -0.5],
    [0.5, -0.5, -0.5],
    [0.5, 0.5, -0.5],
    [-0.5, 0.5, -0.5],
    [-0.5, -0.5, 0.5],
    [0.5, -0.5, 0.5],
    [0.5, 0.5, 0.5],
    [-0.5, 0.5, 0.5],
];

/// The transform last applied to a [`BoundingVolume`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxTransform {
    pub spec: BoxSpec,
    pub is_fix: bool,
    pub center: Vec3,
}

/// Oriented box with a cached world transform.
///
/// The volume always derives its corners from the unit cube, so applying a new transform
/// never has to undo the previous one. Re-applying the cached transform is a no-op.
#[derive(Clone, Debug)]
pub struct BoundingVolume {
    vertices: [Point3; 8],
    /// Face normals (unit rotation columns), independent of scale.
    axes: [Vec3; 3],
    transform: Option<BoxTransform>,
}

impl Default for BoundingVolume {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingVolume {
    /// Unit box at the origin with no transform applied.
    pub fn new() -> Self {
        Self {
            vertices: UNIT_CORNERS.map(|c| Point3::new(c[0], c[1], c[2])),
            axes: [Vec3::x(), Vec3::y(), Vec3::z()],
            transform: None,
        }
    }

    pub fn from_spec(spec: &BoxSpec, is_fix: bool, center: Vec3) -> Self {
        let mut volume = Self::new();
        volume.apply_box_transform(spec, is_fix, center);
        volume
    }

    /// Place the volume at `center + spec.center` with the shape described by `spec`.
    ///
    /// - fixed boxes: scale `(sx, sy, sz)`, rotate about X, then Y, then Z, translate.
    /// - diamond boxes: scale `(sx/√2, sy, sx/√2)`, rotate 45° about Y, translate. The
    ///   resulting square prism is `sx` wide corner to corner whatever `sz` is, which
    ///   approximates a camera-facing sprite.
    pub fn apply_box_transform(&mut self, spec: &BoxSpec, is_fix: bool, center: Vec3) {
        let next = BoxTransform {
            spec: *spec,
            is_fix,
            center,
        };
        if self.transform.as_ref() == Some(&next) {
            return;
        }

        let (rotation, scale) = if is_fix {
            (
                Rot3::from_euler_angles(
                    spec.rot_x.to_radians(),
                    spec.rot_y.to_radians(),
                    spec.rot_z.to_radians(),
                ),
                spec.size,
            )
        } else {
            let side = spec.size.x / SQRT_2;
            (
                Rot3::from_axis_angle(&Vec3::y_axis(), ORIENTED_BOX_ANGLE.to_radians()),
                Vec3::new(side, spec.size.y, side),
            )
        };
        let translation = center + spec.center;

        for (vertex, corner) in self.vertices.iter_mut().zip(UNIT_CORNERS.iter()) {
            let local = Vec3::new(corner[0] * scale.x, corner[1] * scale.y, corner[2] * scale.z);
            *vertex = Point3::from(rotation * local + translation);
        }
        let m = rotation.matrix();
        self.axes = [
            m.column(0).into_owned(),
            m.column(1).into_owned(),
            m.column(2).into_owned(),
        ];
        self.transform = Some(next);
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3; 8] {
        &self.vertices
    }

    #[inline]
    pub fn axes(&self) -> &[Vec3; 3] {
        &self.axes
    }

    #[inline]
    pub fn transform(&self) -> Option<&BoxTransform> {
        self.transform.as_ref()
    }

    /// World-space axis-aligned bounds of the current vertices.
    pub fn aabb(&self) -> Aabb {
        let mut mins = self.vertices[0];
        let mut maxs = self.vertices[0];
        for v in &self.vertices[1..] {
            mins = mins.inf(v);
            maxs = maxs.sup(v);
        }
        Aabb { mins, maxs }
    }

    /// Lowest and highest world Y covered by the volume.
    #[inline]
    pub fn vertical_range(&self) -> (f32, f32) {
        let aabb = self.aabb();
        (aabb.mins.y, aabb.maxs.y)
    }
}

/// Reusable scratch volumes for descriptor checks.
///
/// One slot per shape family. A slot is overwritten by the next check of the same family, so
/// the reference returned by [`VolumePool::descriptor_volume`] must be consumed before the
/// pool is used again (the borrow checker enforces this).
#[derive(Clone, Debug, Default)]
pub struct VolumePool {
    fix: BoundingVolume,
    oriented: BoundingVolume,
}

impl VolumePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the scratch volume for `spec` (world-space) and return it.
    pub fn descriptor_volume(&mut self, spec: &BoxSpec, is_fix: bool) -> &BoundingVolume {
        let slot = if is_fix {
            &mut self.fix
        } else {
            &mut self.oriented
        };
        slot.apply_box_transform(spec, is_fix, Vec3::zeros());
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1.0e-4
    }

    #[test]
    fn fixed_box_covers_its_size_around_center() {
        let spec = BoxSpec::new(Vec3::new(8.0, 16.0, 8.0), Vec3::new(16.0, 32.0, 4.0));
        let volume = BoundingVolume::from_spec(&spec, true, Vec3::new(100.0, 0.0, 0.0));
        let aabb = volume.aabb();
        assert!(approx(aabb.mins.x, 100.0) && approx(aabb.maxs.x, 116.0));
        assert!(approx(aabb.mins.y, 0.0) && approx(aabb.maxs.y, 32.0));
        assert!(approx(aabb.mins.z, 6.0) && approx(aabb.maxs.z, 10.0));
    }

    #[test]
    fn diamond_box_spans_its_width_corner_to_corner() {
        let spec = BoxSpec::new(Vec3::zeros(), Vec3::new(16.0, 10.0, 16.0));
        let volume = BoundingVolume::from_spec(&spec, false, Vec3::zeros());
        let aabb = volume.aabb();
        assert!(approx(aabb.maxs.x - aabb.mins.x, 16.0));
        assert!(approx(aabb.maxs.z - aabb.mins.z, 16.0));
        assert!(approx(aabb.maxs.y - aabb.mins.y, 10.0));
        // Face normals are the 45° rotated axes.
        let n = volume.axes()[0];
        assert!(approx(n.x.abs(), n.z.abs()));
    }

    #[test]
    fn thin_diamond_is_still_a_square_prism() {
        // A flat sprite (depth 1) keeps its full width in both horizontal directions.
        let spec = BoxSpec::new(Vec3::zeros(), Vec3::new(16.0, 32.0, 1.0));
        let aabb = BoundingVolume::from_spec(&spec, false, Vec3::zeros()).aabb();
        assert!(approx(aabb.maxs.x - aabb.mins.x, 16.0));
        assert!(approx(aabb.maxs.z - aabb.mins.z, 16.0));
        assert!(approx(aabb.maxs.y - aabb.mins.y, 32.0));
    }

    #[test]
    fn applying_same_transform_twice_is_a_noop() {
        let spec = BoxSpec::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0))
            .with_rotation(30.0, 10.0, 5.0);
        let mut volume = BoundingVolume::new();
        volume.apply_box_transform(&spec, true, Vec3::new(7.0, 0.0, 0.0));
        let once = *volume.vertices();
        volume.apply_box_transform(&spec, true, Vec3::new(7.0, 0.0, 0.0));
        assert_eq!(*volume.vertices(), once);
    }

    #[test]
    fn retargeting_does_not_accumulate_previous_transform() {
        let a = BoxSpec::new(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0)).with_rotation(45.0, 0.0, 0.0);
        let b = BoxSpec::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(4.0, 4.0, 4.0));
        let mut reused = BoundingVolume::new();
        reused.apply_box_transform(&a, true, Vec3::zeros());
        reused.apply_box_transform(&b, true, Vec3::zeros());
        let fresh = BoundingVolume::from_spec(&b, true, Vec3::zeros());
        for (r, f) in reused.vertices().iter().zip(fresh.vertices()) {
            assert!((r - f).norm() < 1.0e-5);
        }
    }

    #[test]
    fn pool_reuses_one_slot_per_family() {
        let mut pool = VolumePool::new();
        let spec = BoxSpec::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let center_x = pool.descriptor_volume(&spec, true).aabb().center().x;
        assert!(approx(center_x, 5.0));
        let other = BoxSpec::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let center_x = pool.descriptor_volume(&other, true).aabb().center().x;
        assert!(approx(center_x, -5.0));
    }
}

use crate::collision::types::{Orientation, Vec3};

/// Unit planar direction for `orientation`, rotated by `camera_angle` degrees about +Y.
///
/// Returns `None` for `Orientation::None`.
pub fn planar_direction(orientation: Orientation, camera_angle: Option<f32>) -> Option<Vec3> {
    let yaw = (orientation.yaw_degrees()? + camera_angle.unwrap_or(0.0)).to_radians();
    Some(Vec3::new(yaw.sin(), 0.0, yaw.cos()))
}

/// Closest discrete orientation for a planar displacement.
pub fn orientation_from_xz(dx: f32, dz: f32) -> Orientation {
    const EPS_SQ: f32 = 1.0e-8;
    if dx * dx + dz * dz <= EPS_SQ {
        return Orientation::None;
    }
    if dx.abs() > dz.abs() {
        if dx > 0.0 { Orientation::East } else { Orientation::West }
    } else if dz > 0.0 {
        Orientation::South
    } else {
        Orientation::North
    }
}

/// Squared distance in the XZ plane.
#[inline]
pub fn planar_distance_sq(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_follow_yaw() {
        let south = planar_direction(Orientation::South, None).unwrap();
        assert!((south - Vec3::new(0.0, 0.0, 1.0)).norm() < 1.0e-5);
        let east = planar_direction(Orientation::East, None).unwrap();
        assert!((east - Vec3::new(1.0, 0.0, 0.0)).norm() < 1.0e-5);
        // South seen through a camera turned 90° walks east.
        let turned = planar_direction(Orientation::South, Some(90.0)).unwrap();
        assert!((turned - east).norm() < 1.0e-5);
        assert_eq!(planar_direction(Orientation::None, None), None);
    }

    #[test]
    fn dominant_axis_picks_orientation() {
        assert_eq!(orientation_from_xz(3.0, 1.0), Orientation::East);
        assert_eq!(orientation_from_xz(0.0, -2.0), Orientation::North);
        assert_eq!(orientation_from_xz(0.0, 0.0), Orientation::None);
    }

    #[test]
    fn planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 100.0, 0.0);
        let b = Vec3::new(3.0, -5.0, 4.0);
        assert_eq!(planar_distance_sq(a, b), 25.0);
    }
}

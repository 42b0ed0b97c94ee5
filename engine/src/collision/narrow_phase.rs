use rapier3d::parry::{
    bounding_volume::Aabb,
    query::{Ray, RayCast},
    shape::TriMesh,
};

use super::{
    types::{Point3, Vec3},
    volume::BoundingVolume,
};
use crate::error::CollisionError;

/// Inclusive AABB overlap: touching boxes count as overlapping.
#[inline]
pub fn aabb_overlap(a: &Aabb, b: &Aabb) -> bool {
    a.mins.x <= b.maxs.x
        && a.maxs.x >= b.mins.x
        && a.mins.y <= b.maxs.y
        && a.maxs.y >= b.mins.y
        && a.mins.z <= b.maxs.z
        && a.maxs.z >= b.mins.z
}

#[inline]
fn project(vertices: &[Point3; 8], axis: &Vec3) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for v in vertices {
        let d = v.coords.dot(axis);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

/// True when the projections of both vertex sets onto `axis` overlap (inclusive).
#[inline]
pub fn is_overlapping(a: &BoundingVolume, b: &BoundingVolume, axis: &Vec3) -> bool {
    let (a_min, a_max) = project(a.vertices(), axis);
    let (b_min, b_max) = project(b.vertices(), axis);
    a_min <= b_max && b_min <= a_max
}

/// Oriented box intersection test.
///
/// Rejects on disjoint AABBs first. With `deep = false` the AABB overlap is the answer;
/// otherwise the face normals of both boxes are tried as separating axes. Edge cross
/// products are not tested, so boxes touching only edge to edge may report a hit.
pub fn intersects(a: &BoundingVolume, b: &BoundingVolume, deep: bool) -> bool {
    if !aabb_overlap(&a.aabb(), &b.aabb()) {
        return false;
    }
    if !deep {
        return true;
    }
    a.axes()
        .iter()
        .chain(b.axes().iter())
        .all(|axis| is_overlapping(a, b, axis))
}

/// World-space triangle mesh used by mesh-shaped 3D objects.
#[derive(Clone)]
pub struct CollisionMesh {
    shape: TriMesh,
    aabb: Aabb,
}

impl std::fmt::Debug for CollisionMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionMesh")
            .field("triangles", &self.shape.indices().len())
            .field("aabb", &self.aabb)
            .finish()
    }
}

impl CollisionMesh {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<[u32; 3]>) -> Result<Self, CollisionError> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(CollisionError::InvalidMesh("mesh has no triangles".to_string()));
        }
        if !vertices.iter().flat_map(|v| v.iter()).all(|c| c.is_finite()) {
            return Err(CollisionError::InvalidMesh("non-finite vertex".to_string()));
        }
        let count = vertices.len() as u32;
        if let Some(bad) = indices.iter().flatten().find(|&&i| i >= count) {
            return Err(CollisionError::InvalidMesh(format!(
                "index {bad} out of range for {count} vertices"
            )));
        }

        let points: Vec<Point3> = vertices.into_iter().map(Point3::from).collect();
        let mut mins = points[0];
        let mut maxs = points[0];
        for p in &points[1..] {
            mins = mins.inf(p);
            maxs = maxs.sup(p);
        }
        let shape = TriMesh::new(points, indices)
            .map_err(|e| CollisionError::InvalidMesh(format!("{e:?}")))?;
        Ok(Self {
            shape,
            aabb: Aabb { mins, maxs },
        })
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Time of impact of a world-space ray against the mesh surface.
    pub fn cast_ray(&self, origin: Vec3, dir: Vec3, max_toi: f32) -> Option<f32> {
        let ray = Ray::new(Point3::from(origin), dir);
        self.shape.cast_local_ray(&ray, max_toi, false)
    }

    /// True when a volume moving horizontally from `before` to `after` runs into the mesh.
    ///
    /// Rays are cast from the `before` point along the displacement at three heights of the
    /// volume (just above its bottom, its centre and just below its top). They reach as far
    /// as the displacement plus the volume's half width.
    pub fn blocks_volume(&self, volume: &BoundingVolume, before: Vec3, after: Vec3) -> bool {
        let aabb = volume.aabb();
        let reach = Aabb {
            mins: aabb.mins.inf(&Point3::from(before)),
            maxs: aabb.maxs.sup(&Point3::from(before)),
        };
        if !aabb_overlap(&reach, &self.aabb) {
            return false;
        }

        let mut dir = after - before;
        dir.y = 0.0;
        let distance = dir.norm();
        if distance <= f32::EPSILON {
            return false;
        }
        let dir = dir / distance;
        let half_width = (aabb.maxs.x - aabb.mins.x).max(aabb.maxs.z - aabb.mins.z) * 0.5;
        let max_toi = distance + half_width;

        let (bottom, top) = (aabb.mins.y, aabb.maxs.y);
        let center = (bottom + top) * 0.5;
        let heights = [(bottom + 1.0).min(center), center, (top - 1.0).max(center)];
        heights.iter().any(|&y| {
            self.cast_ray(Vec3::new(before.x, y, before.z), dir, max_toi)
                .is_some()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::types::BoxSpec;

    fn cube(center: Vec3, size: f32) -> BoundingVolume {
        BoundingVolume::from_spec(
            &BoxSpec::new(Vec3::zeros(), Vec3::new(size, size, size)),
            true,
            center,
        )
    }

    /// Vertical quad at `x`, spanning z in [-50, 50] and y in [0, 100].
    fn wall(x: f32) -> CollisionMesh {
        CollisionMesh::new(
            vec![
                Vec3::new(x, 0.0, -50.0),
                Vec3::new(x, 0.0, 50.0),
                Vec3::new(x, 100.0, 50.0),
                Vec3::new(x, 100.0, -50.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn overlapping_boxes_intersect_symmetrically() {
        let a = cube(Vec3::zeros(), 2.0);
        let b = cube(Vec3::new(1.5, 0.0, 0.0), 2.0);
        assert!(intersects(&a, &b, true));
        assert!(intersects(&b, &a, true));
    }

    #[test]
    fn separated_boxes_do_not_intersect() {
        let a = cube(Vec3::zeros(), 2.0);
        let b = cube(Vec3::new(2.5, 0.0, 0.0), 2.0);
        assert!(!intersects(&a, &b, true));
        assert!(!intersects(&b, &a, false));
    }

    #[test]
    fn touching_faces_count_as_intersection() {
        let a = cube(Vec3::zeros(), 2.0);
        let b = cube(Vec3::new(2.0, 0.0, 0.0), 2.0);
        assert!(intersects(&a, &b, true));
    }

    #[test]
    fn rotated_box_separated_by_its_own_face_normal() {
        // Long thin box rotated 45° about Y; its AABB overlaps the cube but its faces do not.
        let spec = BoxSpec::new(Vec3::zeros(), Vec3::new(20.0, 2.0, 1.0)).with_rotation(45.0, 0.0, 0.0);
        let thin = BoundingVolume::from_spec(&spec, true, Vec3::zeros());
        let corner = cube(Vec3::new(5.0, 0.0, 5.0), 2.0);
        assert!(aabb_overlap(&thin.aabb(), &corner.aabb()));
        assert!(intersects(&thin, &corner, false));
        assert!(!intersects(&thin, &corner, true));
        assert!(!intersects(&corner, &thin, true));
    }

    #[test]
    fn mesh_rejects_out_of_range_indices() {
        let err = CollisionMesh::new(vec![Vec3::zeros(); 3], vec![[0, 1, 3]]);
        assert!(matches!(err, Err(CollisionError::InvalidMesh(_))));
    }

    #[test]
    fn mesh_rejects_non_finite_vertices() {
        let vertices = vec![Vec3::zeros(), Vec3::new(f32::NAN, 0.0, 0.0), Vec3::x()];
        assert!(matches!(
            CollisionMesh::new(vertices, vec![[0, 1, 2]]),
            Err(CollisionError::InvalidMesh(_))
        ));
    }

    #[test]
    fn moving_into_a_mesh_wall_is_blocked() {
        let mesh = wall(9.5);
        let volume = cube(Vec3::new(8.0, 8.0, 0.0), 4.0);
        assert!(mesh.blocks_volume(&volume, Vec3::new(5.0, 6.0, 0.0), Vec3::new(8.0, 6.0, 0.0)));
    }

    #[test]
    fn moving_away_from_a_mesh_wall_is_free() {
        let mesh = wall(9.5);
        let volume = cube(Vec3::new(2.0, 8.0, 0.0), 4.0);
        assert!(!mesh.blocks_volume(&volume, Vec3::new(5.0, 6.0, 0.0), Vec3::new(2.0, 6.0, 0.0)));
    }
}

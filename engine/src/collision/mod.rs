/*!
Collision root module.

- types:        math aliases, box specs, orientations, resolver outcomes
- settings:     `CollisionConfig` and its RON loader
- descriptor:   passive collision descriptors and their wire records
- broad:        portion index (cell lookups, overflow tables, floors)
- volume:       transform-cached oriented boxes and the scratch pool
- narrow_phase: SAT box test and mesh ray casts
- mountain:     slope patches and vertical-ray heights
- ray:          the ray collision resolver
*/

pub mod broad;
pub mod descriptor;
pub mod mountain;
pub mod narrow_phase;
pub mod ray;
pub mod settings;
pub mod types;
pub mod volume;

pub use broad::PortionIndex;
pub use descriptor::{
    Category, CollisionDescriptor, DescriptorKind, DescriptorRecord, MountainForce,
    MountainShape, MountainSides, ObjectShape,
};
pub use narrow_phase::{CollisionMesh, intersects};
pub use ray::RayResolver;
pub use settings::CollisionConfig;
pub use types::{BoxSpec, ClimbHint, Orientation, Point3, RayOutcome, Rot3, Vec3};
pub use volume::{BoundingVolume, VolumePool};

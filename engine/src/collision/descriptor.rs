/*!
Collision descriptors: the passive shapes the portion index stores.

Descriptors are produced by the world-loading layer, one list per portion, and are
immutable once loaded. A reload replaces them wholesale.

Kinds
- `Land`: one floor tile. Provides a floor height and directional passability, and
  optionally a blocking box.
- `Sprite`: a billboard or fixed box; may be climbable (ladders, vines).
- `Mountain`: a raised square with optional slopes on its open sides.
- `Object3D`: a free 3D object, either a box or a triangle mesh.

Builders that cannot construct typed descriptors hand over a [`DescriptorRecord`] (serde)
which is validated by [`DescriptorRecord::into_descriptor`].
*/

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{
    narrow_phase::CollisionMesh,
    settings::CollisionConfig,
    types::{BoxSpec, Vec3},
    volume::BoundingVolume,
};
use crate::{
    bitmask_flags::{DirectionalRecord, Passability},
    cell::GridCell,
    constants::{HEIGHT_EPS, MAX_DESCRIPTOR_SPAN},
    error::CollisionError,
    position::Position,
};

/// Lookup category in the portion index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Land,
    Sprite,
    Mountain,
    Object3D,
}

/// Override for the mountain tolerance rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MountainForce {
    /// Height and angle limits apply.
    #[default]
    Default,
    /// Always walkable, whatever the height difference or slope.
    Always,
    /// Never walkable.
    Never,
}

/// Which sides of a mountain carry a slope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MountainSides {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl MountainSides {
    pub const NONE: MountainSides = MountainSides {
        left: false,
        right: false,
        top: false,
        bottom: false,
    };

    pub const ALL: MountainSides = MountainSides {
        left: true,
        right: true,
        top: true,
        bottom: true,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MountainShape {
    /// Horizontal run of each slope (pixels). Zero means vertical faces.
    pub width: f32,
    /// Rise from base to top (pixels).
    pub height: f32,
    pub sides: MountainSides,
    /// Slope angle in degrees, derived from `width` and `height`.
    pub angle: f32,
    pub force: MountainForce,
}

impl MountainShape {
    pub fn new(width: f32, height: f32, sides: MountainSides, force: MountainForce) -> Self {
        let width = width.max(0.0);
        let angle = if width <= 0.0 {
            90.0
        } else {
            (height / width).atan().to_degrees()
        };
        Self {
            width,
            height,
            sides,
            angle,
            force,
        }
    }
}

#[derive(Clone, Debug)]
pub enum ObjectShape {
    /// Blocks with `CollisionDescriptor::body`.
    Box,
    /// Blocks with ray casts against a world-space triangle mesh.
    Mesh(Arc<CollisionMesh>),
}

#[derive(Clone, Debug)]
pub enum DescriptorKind {
    Land,
    Sprite,
    Mountain(MountainShape),
    Object3D(ObjectShape),
}

#[derive(Clone, Debug)]
pub struct CollisionDescriptor {
    /// Owning position. Its portion is the descriptor's owning portion.
    pub position: Position,
    /// Anchor relative to the owning portion origin. For mountains this is the minimum
    /// corner of the core square at the base height.
    pub local_anchor: Vec3,
    /// World-space box. `None` means pass-through.
    pub body: Option<BoxSpec>,
    /// Fixed box when true, 45° diamond when false.
    pub is_fix: bool,
    pub climbing: bool,
    pub passability: Passability,
    pub terrain: Option<u16>,
    pub kind: DescriptorKind,
}

impl CollisionDescriptor {
    fn base(position: Position, kind: DescriptorKind, config: &CollisionConfig) -> Self {
        let s = config.square_size;
        let portion_origin = position
            .portion(config.portion_size)
            .origin(s, config.portion_size);
        let corner = Vec3::new(
            position.x as f32 * s,
            position.world_y(s),
            position.z as f32 * s,
        );
        Self {
            position,
            local_anchor: corner - portion_origin,
            body: None,
            is_fix: true,
            climbing: false,
            passability: Passability::default(),
            terrain: None,
            kind,
        }
    }

    /// Floor tile whose top surface is the position's world height.
    pub fn land(position: Position, config: &CollisionConfig) -> Self {
        Self::base(position, DescriptorKind::Land, config)
    }

    pub fn sprite(position: Position, body: BoxSpec, is_fix: bool, config: &CollisionConfig) -> Self {
        let mut descriptor = Self::base(position, DescriptorKind::Sprite, config);
        descriptor.body = Some(body);
        descriptor.is_fix = is_fix;
        descriptor
    }

    /// Mountain whose core is the position's square, based at the position's world height.
    pub fn mountain(position: Position, shape: MountainShape, config: &CollisionConfig) -> Self {
        Self::base(position, DescriptorKind::Mountain(shape), config)
    }

    pub fn object_box(position: Position, body: BoxSpec, is_fix: bool, config: &CollisionConfig) -> Self {
        let mut descriptor = Self::base(position, DescriptorKind::Object3D(ObjectShape::Box), config);
        descriptor.body = Some(body);
        descriptor.is_fix = is_fix;
        descriptor
    }

    pub fn object_mesh(position: Position, mesh: CollisionMesh, config: &CollisionConfig) -> Self {
        Self::base(
            position,
            DescriptorKind::Object3D(ObjectShape::Mesh(Arc::new(mesh))),
            config,
        )
    }

    pub fn with_body(mut self, body: BoxSpec, is_fix: bool) -> Self {
        self.body = Some(body);
        self.is_fix = is_fix;
        self
    }

    pub fn with_climbing(mut self, climbing: bool) -> Self {
        self.climbing = climbing;
        self
    }

    pub fn with_passability(mut self, passability: Passability) -> Self {
        self.passability = passability;
        self
    }

    pub fn with_terrain(mut self, terrain: u16) -> Self {
        self.terrain = Some(terrain);
        self
    }

    #[inline]
    pub fn category(&self) -> Category {
        match self.kind {
            DescriptorKind::Land => Category::Land,
            DescriptorKind::Sprite => Category::Sprite,
            DescriptorKind::Mountain(_) => Category::Mountain,
            DescriptorKind::Object3D(_) => Category::Object3D,
        }
    }

    #[inline]
    pub fn mountain_shape(&self) -> Option<&MountainShape> {
        match &self.kind {
            DescriptorKind::Mountain(shape) => Some(shape),
            _ => None,
        }
    }

    /// World-space anchor: owning portion origin plus the local anchor.
    #[inline]
    pub fn world_anchor(&self, config: &CollisionConfig) -> Vec3 {
        self.position
            .portion(config.portion_size)
            .origin(config.square_size, config.portion_size)
            + self.local_anchor
    }

    /// World-space box `[min, max]` the descriptor occupies, if it has a shape.
    pub fn bounds(&self, config: &CollisionConfig) -> Option<(Vec3, Vec3)> {
        let s = config.square_size;
        match &self.kind {
            DescriptorKind::Mountain(shape) => {
                let anchor = self.world_anchor(config);
                let w = shape.width;
                let left = if shape.sides.left { w } else { 0.0 };
                let right = if shape.sides.right { w } else { 0.0 };
                let top = if shape.sides.top { w } else { 0.0 };
                let bottom = if shape.sides.bottom { w } else { 0.0 };
                Some((
                    Vec3::new(anchor.x - left, anchor.y, anchor.z - top),
                    Vec3::new(
                        anchor.x + s + right - HEIGHT_EPS,
                        anchor.y + shape.height.max(0.0),
                        anchor.z + s + bottom - HEIGHT_EPS,
                    ),
                ))
            }
            DescriptorKind::Object3D(ObjectShape::Mesh(mesh)) => {
                let aabb = mesh.aabb();
                Some((aabb.mins.coords, aabb.maxs.coords))
            }
            _ => self.body.map(|body| {
                let aabb = BoundingVolume::from_spec(&body, self.is_fix, Vec3::zeros()).aabb();
                (aabb.mins.coords, aabb.maxs.coords)
            }),
        }
    }

    /// Every grid cell the descriptor can be touched from. Always contains the owning cell.
    pub fn footprint(&self, config: &CollisionConfig) -> Vec<GridCell> {
        let mut cells = self
            .bounds(config)
            .map(|(min, max)| GridCell::covering(min, max, config.square_size))
            .unwrap_or_default();
        let own = self.position.cell();
        if !cells.contains(&own) {
            cells.push(own);
        }
        cells
    }

    /// Rejects shapes whose footprint cannot be enumerated: non-finite bounds, or wider than
    /// [`MAX_DESCRIPTOR_SPAN`] squares along any axis.
    fn check_extent(&self, config: &CollisionConfig) -> Result<(), CollisionError> {
        let Some((min, max)) = self.bounds(config) else {
            return Ok(());
        };
        if !(min.iter().all(|v| v.is_finite()) && max.iter().all(|v| v.is_finite())) {
            return Err(CollisionError::InvalidDescriptor(format!(
                "non-finite bounds at {:?}",
                self.position.cell()
            )));
        }
        let span = (max - min) / config.square_size;
        if span.max() > MAX_DESCRIPTOR_SPAN as f32 {
            return Err(CollisionError::InvalidDescriptor(format!(
                "footprint of {:.0} squares at {:?} exceeds {MAX_DESCRIPTOR_SPAN}",
                span.max(),
                self.position.cell()
            )));
        }
        Ok(())
    }

    /// Floor heights contributed per column `(x, z) -> y`.
    pub fn floor_heights(&self, config: &CollisionConfig) -> Vec<((i32, i32), f32)> {
        match &self.kind {
            DescriptorKind::Land => vec![(
                self.position.cell().column(),
                self.position.world_y(config.square_size),
            )],
            DescriptorKind::Mountain(shape) => {
                let anchor = self.world_anchor(config);
                let cell = GridCell::containing(anchor, config.square_size);
                vec![(cell.column(), anchor.y + shape.height)]
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountainRecord {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub sides: MountainSides,
    #[serde(default)]
    pub force: MountainForce,
}

/// Triangle mesh with vertices relative to the owning position's world point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshRecord {
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<[u32; 3]>,
}

fn default_true() -> bool {
    true
}

/// External wire form of a descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorRecord {
    pub kind: Category,
    pub position: Position,
    /// Overrides the anchor derived from `position`.
    #[serde(default)]
    pub local_anchor: Option<[f32; 3]>,
    #[serde(default, rename = "box")]
    pub body: Option<BoxSpec>,
    #[serde(default = "default_true")]
    pub is_fix: bool,
    #[serde(default)]
    pub climbing: bool,
    #[serde(default)]
    pub directional: DirectionalRecord,
    #[serde(default)]
    pub terrain_tag: Option<u16>,
    #[serde(default)]
    pub mountain: Option<MountainRecord>,
    #[serde(default)]
    pub mesh: Option<MeshRecord>,
}

impl DescriptorRecord {
    pub fn into_descriptor(
        self,
        config: &CollisionConfig,
    ) -> Result<CollisionDescriptor, CollisionError> {
        let invalid = |what: &str| CollisionError::InvalidDescriptor(what.to_string());
        let bad_extent = |v: f32| !v.is_finite() || v < 0.0;
        let p = &self.position;
        if ![p.y_pixels, p.center_x, p.center_z, p.angle_x, p.angle_y, p.angle_z]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(invalid("non-finite position"));
        }
        if self.local_anchor.is_some_and(|a| !a.iter().all(|v| v.is_finite())) {
            return Err(invalid("non-finite anchor"));
        }
        if let Some(body) = &self.body {
            let rotation = [body.rot_x, body.rot_y, body.rot_z];
            if !(body.center.iter().all(|v| v.is_finite())
                && rotation.iter().all(|v| v.is_finite()))
            {
                return Err(invalid("non-finite box"));
            }
            if body.size.iter().any(|&v| bad_extent(v)) {
                return Err(invalid("box size must be finite and non-negative"));
            }
        }
        if self
            .mountain
            .as_ref()
            .is_some_and(|m| bad_extent(m.width) || bad_extent(m.height))
        {
            return Err(invalid("mountain extents must be finite and non-negative"));
        }

        let kind = match self.kind {
            Category::Land => DescriptorKind::Land,
            Category::Sprite => {
                if self.body.is_none() {
                    return Err(CollisionError::InvalidDescriptor(
                        "sprite without a box".to_string(),
                    ));
                }
                DescriptorKind::Sprite
            }
            Category::Mountain => {
                let m = self.mountain.as_ref().ok_or_else(|| {
                    CollisionError::InvalidDescriptor("mountain without shape".to_string())
                })?;
                DescriptorKind::Mountain(MountainShape::new(m.width, m.height, m.sides, m.force))
            }
            Category::Object3D => match (&self.mesh, &self.body) {
                (Some(mesh), _) => {
                    let origin = self.position.to_world(config.square_size);
                    let vertices = mesh
                        .vertices
                        .iter()
                        .map(|v| Vec3::new(v[0], v[1], v[2]) + origin)
                        .collect();
                    let mesh = CollisionMesh::new(vertices, mesh.indices.clone())?;
                    DescriptorKind::Object3D(ObjectShape::Mesh(Arc::new(mesh)))
                }
                (None, Some(_)) => DescriptorKind::Object3D(ObjectShape::Box),
                (None, None) => {
                    return Err(CollisionError::InvalidDescriptor(
                        "object without box or mesh".to_string(),
                    ));
                }
            },
        };

        let mut descriptor = CollisionDescriptor::base(self.position, kind, config);
        if let Some(a) = self.local_anchor {
            descriptor.local_anchor = Vec3::new(a[0], a[1], a[2]);
        }
        descriptor.body = self.body;
        descriptor.is_fix = self.is_fix;
        descriptor.climbing = self.climbing;
        descriptor.passability = self.directional.into();
        descriptor.terrain = self.terrain_tag;
        descriptor.check_extent(config)?;
        Ok(descriptor)
    }
}

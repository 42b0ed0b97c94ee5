/*!
Ray collision resolver.

Decides what happens to an agent moving from `before` to `after` (feet positions, pixels):
the move is accepted, rejected, or accepted with the feet snapped to a new height.

Phases, in order:
1. climbable and blocking sprites
2. mountains (cores, vertical faces, slopes)
3. lands (boxes and directional entry edges) and 3D objects (boxes and meshes)
4. other agents (first instead, when `reverse_test_objects` is set)
5. floor fallback: nearby floors, then a climb-down search
6. land-edge veto when leaving the current tile

A mountain height wins over a mountain block. Any other block wins over every height.
*/

use std::{collections::HashSet, sync::Arc};

use super::{
    broad::PortionIndex,
    descriptor::{Category, CollisionDescriptor, DescriptorKind, ObjectShape},
    mountain::{MountainContact, MountainGeometry, check_intersection_mountain},
    settings::CollisionConfig,
    types::{ClimbHint, Orientation, RayOutcome, Vec3},
    volume::VolumePool,
};
use crate::{
    agent::{Agent, AgentId, AgentRegistry},
    bitmask_flags::Edge,
    cell::GridCell,
    constants::{CLIMB_ALIGNMENT, CLIMB_DOWN_DEPTH, HEIGHT_EPS, MOVE_EPS},
};

/// What a climbable sprite does with the current input.
#[derive(Clone, Copy, Debug, PartialEq)]
enum ClimbStep {
    /// Move vertically to `y`.
    Move { y: f32, up: bool },
    /// At a limit: keep the agent on the sprite without moving it vertically.
    Hold,
    /// Input is not toward or away from the sprite.
    Sideways,
}

/// Look direction forced on an agent climbing a sprite with facing `angle_y` (degrees).
pub fn climb_orientation(angle_y: f32) -> Orientation {
    let a = angle_y.rem_euclid(360.0);
    let near = |target: f32| (a - target).abs() < HEIGHT_EPS;
    if near(0.0) || near(360.0) {
        Orientation::North
    } else if near(180.0) {
        Orientation::South
    } else if near(90.0) {
        Orientation::West
    } else if near(270.0) {
        Orientation::East
    } else {
        Orientation::None
    }
}

#[inline]
fn side_range(component: f32, reach: i32) -> (i32, i32) {
    if component > MOVE_EPS {
        (0, reach)
    } else if component < -MOVE_EPS {
        (-reach, 0)
    } else {
        (-reach, reach)
    }
}

/// Borrowed view of the world used for one resolution.
///
/// The moving agent must not be in `agents` while it is resolved.
pub struct RayResolver<'a> {
    config: &'a CollisionConfig,
    portions: &'a PortionIndex,
    agents: &'a AgentRegistry,
    hero: Option<AgentId>,
    pool: &'a mut VolumePool,
}

impl<'a> RayResolver<'a> {
    pub fn new(
        config: &'a CollisionConfig,
        portions: &'a PortionIndex,
        agents: &'a AgentRegistry,
        hero: Option<AgentId>,
        pool: &'a mut VolumePool,
    ) -> Self {
        Self {
            config,
            portions,
            agents,
            hero,
            pool,
        }
    }

    /// Resolves the move of `agent` from `before` to `after`.
    ///
    /// On return the agent's volumes are placed at `after`; its position is unchanged.
    pub fn check_ray(
        &mut self,
        before: Vec3,
        after: Vec3,
        agent: &mut Agent,
        reverse_test_objects: bool,
    ) -> RayOutcome {
        let s = self.config.square_size;
        let tolerance = self.config.mountain_collision_height;
        let direction = after - before;
        let before_cell = GridCell::containing(before, s);
        let after_cell = GridCell::containing(after, s);

        agent.place_volumes(after);
        let cells = self.neighbourhood(after, direction, agent, 0);

        if reverse_test_objects && self.hits_agent(agent, after) {
            log::debug!("agent {:#x}: blocked by agent (reverse)", agent.id);
            return RayOutcome::Blocked;
        }

        // 1. Sprites.
        let mut held = false;
        let mut blocked_by_sprite = false;
        for sprite in self.gather(Category::Sprite, &cells) {
            let Some(body) = sprite.body else {
                continue;
            };
            let volume = self.pool.descriptor_volume(&body, sprite.is_fix);
            if !agent.touches(volume, true) {
                continue;
            }
            if !sprite.climbing {
                blocked_by_sprite = true;
                continue;
            }
            let (bottom, top) = volume.vertical_range();
            match self.climb_step(sprite, before, direction, bottom, top) {
                ClimbStep::Move { y, up } => {
                    log::debug!("agent {:#x}: climbing to {y}", agent.id);
                    return RayOutcome::RequiresHeightAdjustment {
                        y,
                        climb: Some(ClimbHint {
                            orientation: climb_orientation(sprite.position.angle_y),
                            up,
                        }),
                    };
                }
                ClimbStep::Hold => held = true,
                ClimbStep::Sideways => {}
            }
        }
        if blocked_by_sprite {
            log::debug!("agent {:#x}: blocked by sprite", agent.id);
            return RayOutcome::Blocked;
        }

        // 2. Mountains.
        let floor_here = self.portions.has_floor_near(after_cell, after.y, HEIGHT_EPS);
        let mut mountain_y: Option<f32> = None;
        let mut mountain_blocked = false;
        for mountain in self.gather(Category::Mountain, &cells) {
            let Some(shape) = mountain.mountain_shape() else {
                continue;
            };
            let geometry = MountainGeometry::new(mountain.world_anchor(self.config), *shape, s);
            match check_intersection_mountain(&geometry, after, floor_here, self.config) {
                MountainContact::None => {}
                MountainContact::Blocked => mountain_blocked = true,
                MountainContact::Height(y) => {
                    mountain_y = Some(mountain_y.map_or(y, |current| current.max(y)));
                }
            }
        }
        if mountain_blocked && mountain_y.is_none() {
            log::debug!("agent {:#x}: blocked by mountain", agent.id);
            return RayOutcome::Blocked;
        }

        // 3. Lands and 3D objects.
        for land in self.gather(Category::Land, &cells) {
            if let Some(body) = land.body {
                let volume = self.pool.descriptor_volume(&body, land.is_fix);
                if agent.touches(volume, true) {
                    log::debug!("agent {:#x}: blocked by land box", agent.id);
                    return RayOutcome::Blocked;
                }
            }
        }
        if self.entry_edge_closed(before_cell, after_cell, after.y, direction) {
            log::debug!("agent {:#x}: land entry edge closed", agent.id);
            return RayOutcome::Blocked;
        }
        for object in self.gather(Category::Object3D, &cells) {
            let blocked = match &object.kind {
                DescriptorKind::Object3D(ObjectShape::Mesh(mesh)) => agent
                    .volumes()
                    .iter()
                    .any(|volume| mesh.blocks_volume(volume, before, after)),
                _ => match object.body {
                    Some(body) => {
                        let volume = self.pool.descriptor_volume(&body, object.is_fix);
                        agent.touches(volume, true)
                    }
                    None => false,
                },
            };
            if blocked {
                log::debug!("agent {:#x}: blocked by object", agent.id);
                return RayOutcome::Blocked;
            }
        }

        // 4. Other agents.
        if !reverse_test_objects && self.hits_agent(agent, after) {
            log::debug!("agent {:#x}: blocked by agent", agent.id);
            return RayOutcome::Blocked;
        }

        // 5. Floor fallback.
        if mountain_y.is_none() && !held && !floor_here {
            mountain_y = self
                .portions
                .nearest_floor(after_cell, after.y, tolerance)
                .or_else(|| self.portions.nearest_floor(after_cell, before.y, tolerance));
            if mountain_y.is_none() {
                let outcome = self.climb_down_search(before, after, agent);
                agent.place_volumes(after);
                if outcome.is_none() {
                    log::debug!("agent {:#x}: no floor at {:?}", agent.id, after_cell);
                }
                return outcome.unwrap_or(RayOutcome::Blocked);
            }
        }

        // 6. Leaving the current tile across a closed edge.
        if self.check_lands_inside(before_cell, after_cell, before.y, direction) {
            log::debug!("agent {:#x}: land exit edge closed", agent.id);
            return RayOutcome::Blocked;
        }

        match mountain_y {
            Some(y) if (y - after.y).abs() > HEIGHT_EPS => {
                RayOutcome::RequiresHeightAdjustment { y, climb: None }
            }
            _ => RayOutcome::Free,
        }
    }

    /// Cells around `at`, restricted to the side the move heads to, spanning the agent's
    /// height. `below` extra layers are added under the feet.
    fn neighbourhood(&self, at: Vec3, direction: Vec3, agent: &Agent, below: i32) -> Vec<GridCell> {
        let s = self.config.square_size;
        let reach = (agent.half_width() / s).ceil().max(1.0) as i32;
        let layers = (agent.height() / s).ceil().max(0.0) as i32;
        let (x_lo, x_hi) = side_range(direction.x, reach);
        let (z_lo, z_hi) = side_range(direction.z, reach);
        let origin = GridCell::containing(at, s);

        let mut cells = Vec::new();
        for i in x_lo..=x_hi {
            for j in -below..=layers {
                for k in z_lo..=z_hi {
                    cells.push(origin.offset(i, j, k));
                }
            }
        }
        cells
    }

    /// Descriptors of `category` in `cells`, each reported once.
    fn gather(&self, category: Category, cells: &[GridCell]) -> Vec<&'a CollisionDescriptor> {
        let portions: &'a PortionIndex = self.portions;
        let mut tested = HashSet::new();
        let mut found = Vec::new();
        for &cell in cells {
            for descriptor in portions.query(category, cell) {
                if tested.insert(Arc::as_ptr(descriptor)) {
                    found.push(descriptor.as_ref());
                }
            }
        }
        found
    }

    fn climb_step(
        &self,
        sprite: &CollisionDescriptor,
        before: Vec3,
        direction: Vec3,
        bottom: f32,
        top: f32,
    ) -> ClimbStep {
        let planar = Vec3::new(direction.x, 0.0, direction.z);
        let distance = planar.norm();
        if distance <= MOVE_EPS {
            return ClimbStep::Hold;
        }
        let angle = sprite.position.angle_y.to_radians();
        let facing = Vec3::new(angle.sin(), 0.0, angle.cos());
        let along = planar.dot(&facing) / distance;
        let step = distance * self.config.climbing_speed;

        let (y, up) = if along < -CLIMB_ALIGNMENT {
            ((before.y + step).min(top), true)
        } else if along > CLIMB_ALIGNMENT {
            ((before.y - step).max(bottom), false)
        } else {
            return ClimbStep::Sideways;
        };
        if (y - before.y).abs() <= MOVE_EPS {
            ClimbStep::Hold
        } else {
            ClimbStep::Move { y, up }
        }
    }

    /// Looks for a climbable sprite just under the destination and starts climbing down it.
    fn climb_down_search(&mut self, before: Vec3, after: Vec3, agent: &mut Agent) -> Option<RayOutcome> {
        let below = after - Vec3::new(0.0, CLIMB_DOWN_DEPTH, 0.0);
        agent.place_volumes(below);
        let cells = self.neighbourhood(below, after - before, agent, 1);
        let step = (after - before).xz().norm() * self.config.climbing_speed;

        for sprite in self.gather(Category::Sprite, &cells) {
            if !sprite.climbing {
                continue;
            }
            let Some(body) = sprite.body else {
                continue;
            };
            let volume = self.pool.descriptor_volume(&body, sprite.is_fix);
            if !agent.touches(volume, true) {
                continue;
            }
            let (bottom, _) = volume.vertical_range();
            let y = (before.y - step.max(CLIMB_DOWN_DEPTH)).max(bottom);
            log::debug!("agent {:#x}: climbing down to {y}", agent.id);
            return Some(RayOutcome::RequiresHeightAdjustment {
                y,
                climb: Some(ClimbHint {
                    orientation: climb_orientation(sprite.position.angle_y),
                    up: false,
                }),
            });
        }
        None
    }

    /// Lands at floor height `y` owned by `cell`'s column.
    fn lands_at(&self, cell: GridCell, y: f32) -> impl Iterator<Item = &'a CollisionDescriptor> + 'a {
        let s = self.config.square_size;
        let tolerance = self.config.mountain_collision_height;
        let portions: &'a PortionIndex = self.portions;
        portions
            .query(Category::Land, cell)
            .map(|land| land.as_ref())
            .filter(move |land| {
                land.position.cell().column() == cell.column()
                    && (land.position.world_y(s) - y).abs() <= tolerance
            })
    }

    /// True when a land tile at the destination refuses entry from the move's side.
    fn entry_edge_closed(&self, before: GridCell, after: GridCell, y: f32, direction: Vec3) -> bool {
        self.lands_at(after, y).any(|land| {
            (before.x != after.x && !land.passability.is_open(Edge::entered_along_x(direction.x)))
                || (before.z != after.z
                    && !land.passability.is_open(Edge::entered_along_z(direction.z)))
        })
    }

    /// True when the tile being left refuses exit toward the move's side.
    fn check_lands_inside(&self, before: GridCell, after: GridCell, y: f32, direction: Vec3) -> bool {
        self.lands_at(before, y).any(|land| {
            (before.x != after.x && !land.passability.is_open(Edge::left_along_x(direction.x)))
                || (before.z != after.z
                    && !land.passability.is_open(Edge::left_along_z(direction.z)))
        })
    }

    /// True when `agent` (volumes at `at`) overlaps the hero or a nearby agent.
    fn hits_agent(&self, agent: &Agent, at: Vec3) -> bool {
        let hero = self
            .hero
            .filter(|&id| id != agent.id)
            .and_then(|id| self.agents.get(id));
        hero.into_iter()
            .chain(
                self.agents
                    .nearby(at, self.config)
                    .filter(|other| Some(other.id) != self.hero),
            )
            .filter(|other| other.id != agent.id && !other.through)
            .any(|other| agent.check_collision_object(other))
    }
}

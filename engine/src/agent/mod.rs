/*!
Moving agents: heroes, NPCs and monsters.

An agent is a set of box specs relative to its feet plus the volumes those boxes occupy at
the agent's current position. Volumes are owned per agent (unlike descriptor volumes, which
are pooled) because other agents are tested against them during resolution.
*/

mod id;
mod registry;

pub use id::{
    AgentId, AgentKind, AgentSerial, pack_agent_id, try_unpack_agent_kind, unpack_agent_serial,
    validate_agent_id,
};
pub use registry::AgentRegistry;

use crate::collision::{
    narrow_phase::intersects,
    types::{BoxSpec, Orientation, Vec3},
    volume::BoundingVolume,
};

/// One collision box of an agent, relative to its feet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentBounds {
    pub spec: BoxSpec,
    pub is_fix: bool,
}

impl AgentBounds {
    pub fn fixed(spec: BoxSpec) -> Self {
        Self { spec, is_fix: true }
    }

    pub fn diamond(spec: BoxSpec) -> Self {
        Self {
            spec,
            is_fix: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClimbingState {
    pub is_climbing: bool,
    pub climbing_up: bool,
    /// Orientation requested by the last input while climbing.
    pub last_orientation: Option<Orientation>,
}

#[derive(Clone, Debug)]
pub struct Agent {
    pub id: AgentId,
    /// World position of the feet.
    pub position: Vec3,
    pub previous_position: Vec3,
    pub orientation: Orientation,
    /// Speed multiplier; 1.0 is normal speed.
    pub speed: f32,
    /// Ghost agents pass through everything.
    pub through: bool,
    pub is_moving: bool,
    pub climbing: ClimbingState,
    bounds: Vec<AgentBounds>,
    volumes: Vec<BoundingVolume>,
}

impl Agent {
    pub fn new(id: AgentId, position: Vec3, bounds: Vec<AgentBounds>) -> Self {
        let volumes = bounds
            .iter()
            .map(|b| BoundingVolume::from_spec(&b.spec, b.is_fix, position))
            .collect();
        Self {
            id,
            position,
            previous_position: position,
            orientation: Orientation::default(),
            speed: 1.0,
            through: false,
            is_moving: false,
            climbing: ClimbingState::default(),
            bounds,
            volumes,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_through(mut self, through: bool) -> Self {
        self.through = through;
        self
    }

    #[inline]
    pub fn bounds(&self) -> &[AgentBounds] {
        &self.bounds
    }

    #[inline]
    pub fn volumes(&self) -> &[BoundingVolume] {
        &self.volumes
    }

    /// Moves the volumes to `at` without changing the agent's position.
    pub fn place_volumes(&mut self, at: Vec3) {
        for (volume, b) in self.volumes.iter_mut().zip(&self.bounds) {
            volume.apply_box_transform(&b.spec, b.is_fix, at);
        }
    }

    /// Commits a new position and moves the volumes with it.
    pub fn set_position(&mut self, position: Vec3) {
        self.previous_position = self.position;
        self.position = position;
        self.place_volumes(position);
    }

    /// Largest horizontal reach of any box from the feet.
    pub fn half_width(&self) -> f32 {
        self.bounds
            .iter()
            .map(|b| b.spec.half_width() + b.spec.center.x.abs().max(b.spec.center.z.abs()))
            .fold(0.0, f32::max)
    }

    /// Height of the highest box top above the feet.
    pub fn height(&self) -> f32 {
        self.bounds
            .iter()
            .map(|b| b.spec.center.y + b.spec.size.y * 0.5)
            .fold(0.0, f32::max)
    }

    /// True when any of this agent's volumes intersects `volume`.
    pub fn touches(&self, volume: &BoundingVolume, deep: bool) -> bool {
        self.volumes.iter().any(|v| intersects(v, volume, deep))
    }

    /// Direct SAT test against another agent's current volumes.
    pub fn check_collision_object(&self, other: &Agent) -> bool {
        other.volumes.iter().any(|v| self.touches(v, true))
    }

    /// AABB-only test against a detection zone.
    pub fn check_collision_detection(&self, detection: &Detection) -> bool {
        detection.volumes.iter().any(|v| self.touches(v, false))
    }
}

/// A trigger zone made of fixed boxes around an origin.
#[derive(Clone, Debug)]
pub struct Detection {
    volumes: Vec<BoundingVolume>,
}

impl Detection {
    pub fn new(origin: Vec3, boxes: &[BoxSpec]) -> Self {
        Self {
            volumes: boxes
                .iter()
                .map(|spec| BoundingVolume::from_spec(spec, true, origin))
                .collect(),
        }
    }

    #[inline]
    pub fn volumes(&self) -> &[BoundingVolume] {
        &self.volumes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> Vec<AgentBounds> {
        vec![AgentBounds::diamond(BoxSpec::new(
            Vec3::new(0.0, 12.0, 0.0),
            Vec3::new(12.0, 24.0, 12.0),
        ))]
    }

    fn agent(serial: u32, at: Vec3) -> Agent {
        Agent::new(pack_agent_id(serial, AgentKind::Npc), at, body())
    }

    #[test]
    fn overlapping_agents_collide() {
        let a = agent(1, Vec3::new(0.0, 0.0, 0.0));
        let b = agent(2, Vec3::new(6.0, 0.0, 0.0));
        assert!(a.check_collision_object(&b));
        assert!(b.check_collision_object(&a));
    }

    #[test]
    fn distant_agents_do_not_collide() {
        let a = agent(1, Vec3::new(0.0, 0.0, 0.0));
        let b = agent(2, Vec3::new(40.0, 0.0, 0.0));
        assert!(!a.check_collision_object(&b));
    }

    #[test]
    fn set_position_moves_volumes_and_remembers_previous() {
        let mut a = agent(1, Vec3::zeros());
        a.set_position(Vec3::new(32.0, 0.0, 0.0));
        assert_eq!(a.previous_position, Vec3::zeros());
        let center = a.volumes()[0].aabb().center();
        assert!((center.x - 32.0).abs() < 1.0e-4);
        assert!((center.y - 12.0).abs() < 1.0e-4);
    }

    #[test]
    fn extents_from_bounds() {
        let a = agent(1, Vec3::zeros());
        assert_eq!(a.half_width(), 6.0);
        assert_eq!(a.height(), 24.0);
    }

    #[test]
    fn detection_uses_bounds_only() {
        let a = agent(1, Vec3::zeros());
        let zone = Detection::new(
            Vec3::new(10.0, 0.0, 0.0),
            &[BoxSpec::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(10.0, 10.0, 10.0))],
        );
        // The zone starts at x = 5, the diamond's AABB reaches x = 6.
        assert!(a.check_collision_detection(&zone));

        let far = Detection::new(
            Vec3::new(30.0, 0.0, 0.0),
            &[BoxSpec::new(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0))],
        );
        assert!(!a.check_collision_detection(&far));
    }
}

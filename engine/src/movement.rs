use crate::{
    agent::{Agent, AgentId, Detection},
    collision::types::{Orientation, RayOutcome, Vec3},
    constants::MOVE_EPS,
    error::CollisionError,
    motion::{JumpParams, StepParams, jump_position, step_distance},
    utils::{orientation_from_xz, planar_distance_sq, planar_direction},
    world::World,
};

/// One frame of walking input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveInput {
    pub orientation: Orientation,
    /// Upper bound on the distance walked this frame.
    pub limit: Option<f32>,
    /// Camera yaw in degrees, applied when `use_camera_orientation` is set.
    pub angle: f32,
    pub use_camera_orientation: bool,
}

impl MoveInput {
    pub fn toward(orientation: Orientation) -> Self {
        Self {
            orientation,
            limit: None,
            angle: 0.0,
            use_camera_orientation: false,
        }
    }
}

/// Output of [`World::move_agent`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveReport {
    /// Distance requested this frame (before collision).
    pub distance: f32,
    /// Orientation the agent ended up with.
    pub orientation: Orientation,
    pub outcome: RayOutcome,
}

/// Final feet position for a resolved move.
///
/// Climb adjustments keep the horizontal position and only change the height.
pub fn apply_outcome(before: Vec3, after: Vec3, outcome: RayOutcome) -> Vec3 {
    match outcome {
        RayOutcome::Free => after,
        RayOutcome::Blocked => before,
        RayOutcome::RequiresHeightAdjustment { y, climb: None } => Vec3::new(after.x, y, after.z),
        RayOutcome::RequiresHeightAdjustment { y, climb: Some(_) } => {
            Vec3::new(before.x, y, before.z)
        }
    }
}

impl World {
    /// Walks an agent one frame in the input direction.
    ///
    /// The agent leaves the registry while it is resolved so it never collides with itself.
    pub fn move_agent(&mut self, id: AgentId, input: MoveInput) -> Option<MoveReport> {
        let mut agent = self.take_agent(id)?;

        let turning_while_climbing = agent.climbing.is_climbing
            && agent
                .climbing
                .last_orientation
                .is_some_and(|last| last != input.orientation);
        let distance = step_distance(StepParams {
            speed: agent.speed,
            elapsed_ms: self.elapsed_ms,
            square_size: self.config.square_size,
            limit: input.limit,
            turning_while_climbing,
        });
        let camera = input.use_camera_orientation.then_some(input.angle);

        let Some(direction) = planar_direction(input.orientation, camera) else {
            agent.is_moving = false;
            let orientation = agent.orientation;
            self.agents.insert(agent, &self.config);
            return Some(MoveReport {
                distance: 0.0,
                orientation,
                outcome: RayOutcome::Free,
            });
        };

        let before = agent.position;
        let after = before + direction * distance;
        let outcome = if agent.through {
            RayOutcome::Free
        } else {
            self.resolve(&mut agent, before, after, false)
        };
        let target = apply_outcome(before, after, outcome);

        match outcome.climb() {
            Some(hint) => {
                agent.climbing.is_climbing = true;
                agent.climbing.climbing_up = hint.up;
                agent.climbing.last_orientation = Some(input.orientation);
                agent.orientation = if hint.orientation == Orientation::None {
                    input.orientation
                } else {
                    hint.orientation
                };
            }
            None => {
                agent.climbing = Default::default();
                agent.orientation = input.orientation;
            }
        }

        let moved = (target - before).norm() > MOVE_EPS;
        agent.is_moving = moved;
        agent.set_position(target);
        if moved && self.hero == Some(id) {
            self.steps += 1;
        }
        let orientation = agent.orientation;
        self.agents.insert(agent, &self.config);

        Some(MoveReport {
            distance,
            orientation,
            outcome,
        })
    }

    /// Places an agent at `position` without collision checks.
    pub fn teleport_agent(&mut self, id: AgentId, position: Vec3) -> Option<()> {
        let mut agent = self.take_agent(id)?;
        agent.set_position(position);
        agent.previous_position = position;
        agent.climbing = Default::default();
        agent.is_moving = false;
        self.agents.insert(agent, &self.config);
        Some(())
    }

    /// Advances an agent along a jump parabola. No collision is resolved while airborne.
    ///
    /// Returns the new feet position.
    pub fn jump_agent(
        &mut self,
        id: AgentId,
        start: Vec3,
        end: Vec3,
        peak: f32,
        current_time: f32,
        final_time: f32,
    ) -> Option<Vec3> {
        let mut agent = self.take_agent(id)?;
        let position = jump_position(JumpParams {
            start,
            end,
            peak,
            current_time,
            final_time,
        });
        let facing = orientation_from_xz(end.x - start.x, end.z - start.z);
        if facing != Orientation::None {
            agent.orientation = facing;
        }
        agent.is_moving = planar_distance_sq(position, end) > MOVE_EPS * MOVE_EPS;
        agent.set_position(position);
        self.agents.insert(agent, &self.config);
        Some(position)
    }

    /// Direct volume test between two registered agents.
    pub fn check_collision_object(&self, id: AgentId, other: AgentId) -> Option<bool> {
        let (Some(a), Some(b)) = (self.agent_or_report(id), self.agent_or_report(other)) else {
            return None;
        };
        Some(a.check_collision_object(b))
    }

    /// AABB test between a registered agent and a detection zone.
    pub fn check_collision_detection(&self, id: AgentId, detection: &Detection) -> Option<bool> {
        self.agent_or_report(id)
            .map(|agent| agent.check_collision_detection(detection))
    }

    fn agent_or_report(&self, id: AgentId) -> Option<&Agent> {
        let agent = self.agents.get(id);
        if agent.is_none() {
            self.report(CollisionError::MissingAgent(id));
        }
        agent
    }
}

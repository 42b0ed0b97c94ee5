use crate::{
    collision::types::Vec3,
    constants::{CLIMBING_TURN_FACTOR, SPEED_NORMAL},
};

/// Input for one frame of walking.
#[derive(Clone, Copy, Debug)]
pub struct StepParams {
    /// Agent speed multiplier (1.0 = normal).
    pub speed: f32,
    /// Frame duration in milliseconds.
    pub elapsed_ms: f32,
    /// Pixels per square.
    pub square_size: f32,
    /// Upper bound on the distance, e.g. the distance left to a target.
    pub limit: Option<f32>,
    /// True when the input direction changed while climbing.
    pub turning_while_climbing: bool,
}

/// Distance walked this frame, in pixels.
///
/// `speed * SPEED_NORMAL * elapsed_ms * square_size`, capped by `limit`, shortened by
/// `CLIMBING_TURN_FACTOR` when the agent turns on a climbable sprite.
#[inline]
pub fn step_distance(params: StepParams) -> f32 {
    let StepParams {
        speed,
        elapsed_ms,
        square_size,
        limit,
        turning_while_climbing,
    } = params;

    let mut distance = speed.max(0.0) * SPEED_NORMAL * elapsed_ms.max(0.0) * square_size;
    if let Some(limit) = limit {
        distance = distance.min(limit.max(0.0));
    }
    if turning_while_climbing {
        distance *= CLIMBING_TURN_FACTOR;
    }
    distance
}

/// A parabolic jump from `start` to `end` peaking at height `peak` halfway through.
#[derive(Clone, Copy, Debug)]
pub struct JumpParams {
    pub start: Vec3,
    pub end: Vec3,
    /// World Y at mid-jump.
    pub peak: f32,
    /// Time since the jump started.
    pub current_time: f32,
    /// Total jump duration, same unit as `current_time`.
    pub final_time: f32,
}

/// Feet position along the jump at `current_time`.
///
/// X/Z are interpolated linearly. Y follows `a * (t - half)^2 + peak`, with `a` chosen per
/// half so the curve starts at `start.y` and lands on `end.y`.
pub fn jump_position(params: JumpParams) -> Vec3 {
    let JumpParams {
        start,
        end,
        peak,
        current_time,
        final_time,
    } = params;
    if final_time <= 0.0 {
        return end;
    }

    let t = current_time.clamp(0.0, final_time);
    let progress = t / final_time;
    let half = final_time * 0.5;
    let base = if t < half { start.y } else { end.y };
    let a = (base - peak) / (half * half);
    let dt = t - half;

    Vec3::new(
        start.x + (end.x - start.x) * progress,
        a * dt * dt + peak,
        start.z + (end.z - start.z) * progress,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1.0e-4
    }

    #[test]
    fn step_scales_with_speed_and_time() {
        let d = step_distance(StepParams {
            speed: 1.0,
            elapsed_ms: 1000.0,
            square_size: 16.0,
            limit: None,
            turning_while_climbing: false,
        });
        assert!(approx(d, SPEED_NORMAL * 16_000.0));
    }

    #[test]
    fn step_is_capped_and_shortened_when_turning() {
        let params = StepParams {
            speed: 1.0,
            elapsed_ms: 1000.0,
            square_size: 16.0,
            limit: Some(10.0),
            turning_while_climbing: true,
        };
        assert!(approx(step_distance(params), 10.0 * CLIMBING_TURN_FACTOR));
    }

    #[test]
    fn jump_hits_start_peak_and_end() {
        let start = Vec3::new(0.0, 0.0, 0.0);
        let end = Vec3::new(32.0, 16.0, 0.0);
        let at = |t| {
            jump_position(JumpParams {
                start,
                end,
                peak: 40.0,
                current_time: t,
                final_time: 10.0,
            })
        };
        assert!((at(0.0) - start).norm() < 1.0e-4);
        assert!(approx(at(5.0).y, 40.0));
        assert!(approx(at(5.0).x, 16.0));
        assert!((at(10.0) - end).norm() < 1.0e-4);
        // Past the end the agent stays on the landing point.
        assert!((at(12.0) - end).norm() < 1.0e-4);
    }
}

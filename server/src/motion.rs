//! Motion policy: role-biased wandering for autonomous players and
//! fixed-step displacement for controlled ones.
//!
//! All functions here are pure over a single player; the tick driver decides
//! which players they apply to.

use rand::Rng;
use shared::{Direction, FieldConfig, PlayerState, COMMAND_STEP, RESAMPLE_CHANCE, WALK_STEP};

/// Tunable knobs for the autonomous policy. Tests force
/// `resample_chance = 0.0` to pin targets in place.
#[derive(Debug, Clone, Copy)]
pub struct MotionConfig {
    pub resample_chance: f64,
    pub step: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            resample_chance: RESAMPLE_CHANCE,
            step: WALK_STEP,
        }
    }
}

/// With `resample_chance` probability, draws a new wander target around the
/// current one. The draw radius depends on the player's role and the result
/// is clamped into the playable band before adoption.
pub fn maybe_resample_target(
    player: &mut PlayerState,
    field: &FieldConfig,
    config: &MotionConfig,
    rng: &mut impl Rng,
) {
    if !rng.gen_bool(config.resample_chance) {
        return;
    }

    let radius = player.role.movement_radius();
    let dx = rng.gen_range(-radius / 2.0..radius / 2.0);
    let dy = rng.gen_range(-radius / 2.0..radius / 2.0);

    player.target_x = field.clamp_x(player.target_x + dx);
    player.target_y = field.clamp_y(player.target_y + dy);
}

/// Advances one axis by at most `step` toward `target`. Within `step` of the
/// target the axis holds still, so a converged player never oscillates.
fn step_axis(position: f32, target: f32, step: f32) -> f32 {
    let delta = target - position;
    if delta.abs() >= step {
        position + step.copysign(delta)
    } else {
        position
    }
}

/// Moves the player one step toward its target, each axis independently.
/// This is straight-line axis convergence, not vector interpolation: the
/// player may cover up to `step * sqrt(2)` diagonally in one tick.
pub fn step_toward_target(player: &mut PlayerState, config: &MotionConfig) {
    player.x = step_axis(player.x, player.target_x, config.step);
    player.y = step_axis(player.y, player.target_y, config.step);
}

/// Applies one directional command to a controlled player. Commands are
/// fixed-step and unclamped; the target follows the position so the record
/// stays coherent if the player is ever handed back to the autonomous policy.
pub fn apply_command(player: &mut PlayerState, direction: Direction) {
    match direction {
        Direction::Left => player.x -= COMMAND_STEP,
        Direction::Right => player.x += COMMAND_STEP,
        Direction::Up => player.y -= COMMAND_STEP,
        Direction::Down => player.y += COMMAND_STEP,
    }
    player.target_x = player.x;
    player.target_y = player.y;
}

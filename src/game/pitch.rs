//! Field geometry and formation slots
//!
//! All distances are in field pixels; velocities are pixels per tick at the
//! simulation tick rate.

use crate::ws::protocol::{PlayerId, Team};

pub const FIELD_WIDTH: f32 = 800.0;
pub const FIELD_HEIGHT: f32 = 600.0;
pub const CENTER_X: f32 = FIELD_WIDTH / 2.0;
pub const CENTER_Y: f32 = FIELD_HEIGHT / 2.0;
pub const SIDE_Y_L: f32 = FIELD_HEIGHT * 0.25;
pub const SIDE_Y_R: f32 = FIELD_HEIGHT * 0.75;

pub const GOAL_POST_Y_TOP: f32 = FIELD_HEIGHT * 0.35;
pub const GOAL_POST_Y_BOTTOM: f32 = FIELD_HEIGHT * 0.65;
pub const GOAL_LINE_X_HOME: f32 = 30.0;
pub const GOAL_LINE_X_AWAY: f32 = FIELD_WIDTH - 30.0;

/// A ball above this height passes over the goal frame.
pub const GOAL_HEIGHT: f32 = 50.0;

/// X coordinate of the goal a team attacks toward.
pub fn attack_goal_x(team: Team) -> f32 {
    match team {
        Team::Home => FIELD_WIDTH,
        Team::Away => 0.0,
    }
}

/// X coordinate of the goal line a goalkeeper defends.
pub fn own_goal_line_x(team: Team) -> f32 {
    match team {
        Team::Home => GOAL_LINE_X_HOME,
        Team::Away => GOAL_LINE_X_AWAY,
    }
}

/// Fixed formation slot for an agent, the basis for positioning heuristics.
///
/// Returns `None` for ids outside the roster so callers can degrade to a
/// hold-position target instead of panicking.
pub fn formation_slot(id: PlayerId) -> Option<(f32, f32)> {
    let slot = match id.0 {
        // Home
        0 => (60.0, CENTER_Y),
        1 => (200.0, SIDE_Y_L),
        2 => (200.0, SIDE_Y_R),
        3 => (350.0, CENTER_Y),
        4 => (350.0, SIDE_Y_L),
        5 => (350.0, SIDE_Y_R),
        6 => (CENTER_X - 50.0, CENTER_Y - 50.0),
        7 => (CENTER_X - 50.0, CENTER_Y + 50.0),
        // Away (mirrored)
        8 => (FIELD_WIDTH - 60.0, CENTER_Y),
        9 => (FIELD_WIDTH - 200.0, SIDE_Y_L),
        10 => (FIELD_WIDTH - 200.0, SIDE_Y_R),
        11 => (FIELD_WIDTH - 350.0, CENTER_Y),
        12 => (FIELD_WIDTH - 350.0, SIDE_Y_L),
        13 => (FIELD_WIDTH - 350.0, SIDE_Y_R),
        14 => (CENTER_X + 50.0, CENTER_Y - 50.0),
        15 => (CENTER_X + 50.0, CENTER_Y + 50.0),
        _ => return None,
    };
    Some(slot)
}

/// Euclidean distance between two points.
pub fn dist(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    (x2 - x1).hypot(y2 - y1)
}

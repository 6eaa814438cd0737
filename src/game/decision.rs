//! Per-agent decision engine
//!
//! Phase one of the tick: every agent reads an immutable world snapshot and
//! produces an `Intent` (movement target plus an optional ball action).
//! Phase two (`apply_action`) commits the holder's action against the mutable
//! world. Decisions never mutate shared state mid-computation.

use rand::Rng;
use tracing::debug;

use crate::game::physics::GLOBAL_SPEED_FACTOR;
use crate::game::pitch::{
    self, attack_goal_x, CENTER_X, CENTER_Y, FIELD_HEIGHT, FIELD_WIDTH, GOAL_POST_Y_BOTTOM,
    GOAL_POST_Y_TOP, SIDE_Y_L, SIDE_Y_R,
};
use crate::game::world::{dist_to_ball, PlayerState, WorldState};
use crate::ws::protocol::{PlayerId, Role, RoleLine, Team};

/// Off-ball agents chase the ball inside this distance.
pub const CHASE_DISTANCE: f32 = 150.0;
/// Maximum pass distance considered.
pub const PASS_RANGE: f32 = 250.0;
/// A teammate with no opponent inside this radius counts as free.
pub const FREE_SPACE_DISTANCE: f32 = 70.0;
/// An opponent within this distance of the pass segment blocks a ground pass.
pub const PASS_ROUTE_CLEARANCE: f32 = 20.0;
/// Base shooting range, scaled per agent by its shot-range multiplier.
pub const SHOT_RANGE_DEFAULT: f32 = 300.0;

const BASE_PASS_POWER: f32 = 12.0;
const BASE_SHOT_POWER: f32 = 18.0;
const CLEAR_SPEED: f32 = 12.0;
const CLEAR_LOFT_VZ: f32 = 10.0;
const SHOT_LOFT_VZ: f32 = 2.0;

/// Requested ball action from the current holder
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BallAction {
    Pass { to: PlayerId, lofted: bool },
    Shoot,
    Clear,
}

/// One agent's decision for this tick
#[derive(Debug, Clone, Copy)]
pub struct Intent {
    /// New movement target; `None` keeps the current target.
    pub target: Option<(f32, f32)>,
    /// Ball action, only ever set for the holder.
    pub action: Option<BallAction>,
}

impl Intent {
    fn move_to(x: f32, y: f32) -> Self {
        Self {
            target: Some((x, y)),
            action: None,
        }
    }

    fn act(action: BallAction) -> Self {
        Self {
            target: None,
            action: Some(action),
        }
    }
}

/// Compute intents for the whole roster against a read-only world.
pub fn decide_all(world: &WorldState) -> Vec<Intent> {
    (0..world.players.len())
        .map(|idx| {
            let p = &world.players[idx];
            if p.has_ball {
                decide_holder(world, p)
            } else {
                decide_support(world, p)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Holder decisions
// ---------------------------------------------------------------------------

fn decide_holder(world: &WorldState, p: &PlayerState) -> Intent {
    if p.role.is_goalkeeper() {
        return match best_gk_pass_target(world, p) {
            Some(target) => Intent::act(BallAction::Pass {
                to: target.id,
                lofted: target.role.line() == RoleLine::Fw,
            }),
            None => Intent::act(BallAction::Clear),
        };
    }

    // Shot first: range is role-scaled per agent.
    let goal_x = attack_goal_x(p.team);
    let dist_to_goal = pitch::dist(p.x, p.y, goal_x, CENTER_Y);
    let shot_range = SHOT_RANGE_DEFAULT * p.attrs.shot_range_mult;
    if dist_to_goal < shot_range {
        return Intent::act(BallAction::Shoot);
    }

    if let Some((target, lofted)) = best_field_pass(world, p) {
        return Intent::act(BallAction::Pass {
            to: target.id,
            lofted,
        });
    }

    // No shot, no pass: dribble at the opposing goal.
    Intent::move_to(goal_x, CENTER_Y)
}

/// Goalkeeper distribution: prefer the closest free defender/midfielder with
/// a clear ground route; fall back to lofting toward the most advanced free
/// forward; `None` means clear it upfield.
fn best_gk_pass_target<'a>(world: &'a WorldState, passer: &PlayerState) -> Option<&'a PlayerState> {
    let goal_x = attack_goal_x(passer.team);
    let mut ground: Option<(&PlayerState, f32)> = None;
    let mut lob: Option<(&PlayerState, f32)> = None;

    for teammate in &world.players {
        if teammate.team != passer.team || teammate.id == passer.id {
            continue;
        }
        let d = pitch::dist(passer.x, passer.y, teammate.x, teammate.y);
        if d >= PASS_RANGE || !is_free(world, teammate) {
            continue;
        }

        match teammate.role.line() {
            RoleLine::Df | RoleLine::Mf => {
                if ground.map_or(true, |(_, best)| d < best)
                    && pass_route_clear(world, passer, teammate)
                {
                    ground = Some((teammate, d));
                }
            }
            RoleLine::Fw => {
                // Advanced target: score by proximity to the opposing goal.
                let score = FIELD_WIDTH - pitch::dist(teammate.x, teammate.y, goal_x, CENTER_Y);
                if lob.map_or(true, |(_, best)| score > best) {
                    lob = Some((teammate, score));
                }
            }
            RoleLine::Gk => {}
        }
    }

    ground.map(|(t, _)| t).or(lob.map(|(t, _)| t))
}

/// Field-agent pass search over forward/midfield teammates, returning the
/// highest-scoring target and whether the pass should be lofted.
fn best_field_pass<'a>(
    world: &'a WorldState,
    passer: &PlayerState,
) -> Option<(&'a PlayerState, bool)> {
    let goal_x = attack_goal_x(passer.team);
    let passer_line = passer.role.line();
    let mut best: Option<(&PlayerState, f32, bool)> = None;

    for teammate in &world.players {
        if teammate.team != passer.team || teammate.id == passer.id {
            continue;
        }
        let line = teammate.role.line();
        if line != RoleLine::Fw && line != RoleLine::Mf {
            continue;
        }
        let dist_to_passer = pitch::dist(passer.x, passer.y, teammate.x, teammate.y);
        if dist_to_passer >= PASS_RANGE {
            continue;
        }

        let free_bonus = if is_free(world, teammate) { 100.0 } else { 0.0 };
        let goal_bonus = FIELD_WIDTH - pitch::dist(teammate.x, teammate.y, goal_x, CENTER_Y);
        let route_clear = pass_route_clear(world, passer, teammate);
        let route_bonus = if route_clear { 50.0 } else { -200.0 };

        let mut score = free_bonus + goal_bonus + route_bonus;

        // A blocked ground route from the back line to a forward is rescored
        // as an aerial ball: route blocking no longer applies, and longer
        // distance scores higher.
        if !route_clear
            && (passer_line == RoleLine::Df || passer_line == RoleLine::Mf)
            && line == RoleLine::Fw
        {
            let dist_bonus = (dist_to_passer / PASS_RANGE) * 50.0;
            score = free_bonus + goal_bonus + dist_bonus;
        }

        let lofted = line == RoleLine::Fw
            && (passer_line == RoleLine::Df || (passer_line == RoleLine::Mf && !route_clear));

        if best.map_or(true, |(_, s, _)| score > s) {
            best = Some((teammate, score, lofted));
        }
    }

    best.map(|(t, _, lofted)| (t, lofted))
}

// ---------------------------------------------------------------------------
// Off-ball decisions
// ---------------------------------------------------------------------------

fn decide_support(world: &WorldState, p: &PlayerState) -> Intent {
    let ball = &world.ball;
    let team_has_ball = world.team_has_ball(p.team);
    let d_ball = dist_to_ball(p, ball);
    let slot = pitch::formation_slot(p.id);
    let home = p.team == Team::Home;

    // Keeper holds its line, tracking the ball laterally within the goal mouth.
    if p.role.is_goalkeeper() {
        let inset = if home { 20.0 } else { -20.0 };
        let tx = pitch::own_goal_line_x(p.team) + inset;
        let ty = ball.y.clamp(GOAL_POST_Y_TOP, GOAL_POST_Y_BOTTOM);
        return Intent::move_to(tx, ty);
    }

    if p.role.line() == RoleLine::Fw {
        return decide_forward(world, p, team_has_ball, d_ball, slot);
    }

    // Wide midfielders balance toward the far side when play is away from them.
    let ball_on_my_side = (home && ball.x < CENTER_X) || (!home && ball.x > CENTER_X);
    let side_offset = if home { 50.0 } else { -50.0 };
    if p.role == Role::MfL && !ball_on_my_side && d_ball > CHASE_DISTANCE {
        return Intent::move_to(CENTER_X + side_offset, SIDE_Y_L - 30.0);
    }
    if p.role == Role::MfR && !ball_on_my_side && d_ball > CHASE_DISTANCE {
        return Intent::move_to(CENTER_X + side_offset, SIDE_Y_R + 30.0);
    }

    // With possession: open a passing lane away from the nearest opponent.
    if team_has_ball {
        if let Some((sx, sy)) = slot {
            return match nearest_opponent(world, p) {
                Some(opp) => {
                    let ang = (opp.y - p.y).atan2(opp.x - p.x);
                    Intent::move_to(p.x - ang.cos() * 50.0, p.y - ang.sin() * 50.0)
                }
                None => Intent::move_to(sx + if home { 30.0 } else { -30.0 }, sy),
            };
        }
    }

    // Without possession: hold shape, blending the slot with the ball.
    if !team_has_ball && d_ball > CHASE_DISTANCE {
        if let Some((sx, sy)) = slot {
            return Intent::move_to(
                sx + (ball.x - CENTER_X) * 0.2,
                sy + (ball.y - CENTER_Y) * 0.2,
            );
        }
    }

    // Close to the ball (or no slot to fall back on): chase it.
    Intent::move_to(ball.x, ball.y)
}

fn decide_forward(
    world: &WorldState,
    p: &PlayerState,
    team_has_ball: bool,
    d_ball: f32,
    slot: Option<(f32, f32)>,
) -> Intent {
    let ball = &world.ball;
    let home = p.team == Team::Home;
    let mut tx = p.x;
    let mut ty = p.y;

    if team_has_ball {
        if let Some(opp) = nearest_opponent(world, p) {
            // Seek space: step directly away from the closest marker.
            let ang = (opp.y - p.y).atan2(opp.x - p.x);
            tx = p.x - ang.cos() * 50.0;
            ty = p.y - ang.sin() * 50.0;
        } else if let Some((sx, sy)) = slot {
            tx = sx + if home { 50.0 } else { -50.0 };
            ty = sy;
        } else {
            tx = attack_goal_x(p.team);
            ty = CENTER_Y;
        }
    } else {
        if let Some((sx, sy)) = slot {
            tx = sx + (ball.x - CENTER_X) * 0.1;
            ty = sy + (ball.y - CENTER_Y) * 0.1;
        } else {
            tx = if home { CENTER_X + 20.0 } else { CENTER_X - 20.0 };
            ty = CENTER_Y;
        }
        if d_ball < CHASE_DISTANCE {
            tx = ball.x;
            ty = ball.y;
        }
    }

    // Forwards stay in the attacking half.
    let tx = if home {
        tx.max(CENTER_X + 10.0)
    } else {
        tx.min(CENTER_X - 10.0)
    };
    Intent::move_to(tx, ty.clamp(0.0, FIELD_HEIGHT))
}

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

/// True when no opponent is within the free-space radius of the agent.
pub fn is_free(world: &WorldState, p: &PlayerState) -> bool {
    world
        .players
        .iter()
        .filter(|o| o.team != p.team)
        .all(|o| pitch::dist(p.x, p.y, o.x, o.y) >= FREE_SPACE_DISTANCE)
}

/// The opponent closest to the agent, if any.
pub fn nearest_opponent<'a>(world: &'a WorldState, p: &PlayerState) -> Option<&'a PlayerState> {
    world
        .players
        .iter()
        .filter(|o| o.team != p.team)
        .min_by(|a, b| {
            let da = pitch::dist(p.x, p.y, a.x, a.y);
            let db = pitch::dist(p.x, p.y, b.x, b.y);
            da.total_cmp(&db)
        })
}

/// Route-clearance test: an opponent blocks the pass when its perpendicular
/// distance to the passer-target segment (clamped to the segment) is under
/// the clearance constant. A bounding-box pre-check skips far opponents.
pub fn pass_route_clear(world: &WorldState, passer: &PlayerState, target: &PlayerState) -> bool {
    let (px, py) = (passer.x, passer.y);
    let (tx, ty) = (target.x, target.y);

    let line_length_sq = (tx - px).powi(2) + (ty - py).powi(2);
    if line_length_sq < PASS_ROUTE_CLEARANCE * PASS_ROUTE_CLEARANCE {
        return true;
    }

    for opponent in &world.players {
        if opponent.team == passer.team {
            continue;
        }
        let (ox, oy) = (opponent.x, opponent.y);

        if ox < px.min(tx) - PASS_ROUTE_CLEARANCE
            || ox > px.max(tx) + PASS_ROUTE_CLEARANCE
            || oy < py.min(ty) - PASS_ROUTE_CLEARANCE
            || oy > py.max(ty) + PASS_ROUTE_CLEARANCE
        {
            continue;
        }

        let t = ((ox - px) * (tx - px) + (oy - py) * (ty - py)) / line_length_sq;
        let (cx, cy) = if t < 0.0 {
            (px, py)
        } else if t > 1.0 {
            (tx, ty)
        } else {
            (px + t * (tx - px), py + t * (ty - py))
        };

        if pitch::dist(ox, oy, cx, cy) < PASS_ROUTE_CLEARANCE {
            return false;
        }
    }

    true
}

// ---------------------------------------------------------------------------
// Commit phase
// ---------------------------------------------------------------------------

/// Apply the holder's ball action: set ball velocity and release possession.
/// A pass to a teammate that no longer exists degrades to keeping the ball.
pub fn apply_action(
    world: &mut WorldState,
    holder: usize,
    action: &BallAction,
    rng: &mut impl Rng,
) {
    match *action {
        BallAction::Pass { to, lofted } => {
            let Some(t_idx) = world.player_index(to) else {
                return;
            };
            let target = &world.players[t_idx];
            // Lead the receiver by a few ticks of its current velocity.
            let lead_x = target.x + target.vx * 5.0;
            let lead_y = target.y + target.vy * 5.0;
            let target_name = target.display_name.clone();

            let p = &world.players[holder];
            let power = BASE_PASS_POWER * (p.attrs.pass / 100.0);
            let d = pitch::dist(p.x, p.y, lead_x, lead_y);
            let ang = (lead_y - p.y).atan2(lead_x - p.x);

            world.ball.vx = ang.cos() * power * GLOBAL_SPEED_FACTOR;
            world.ball.vy = ang.sin() * power * GLOBAL_SPEED_FACTOR;
            world.ball.vz = if lofted { 5.0 + d / 50.0 } else { 0.0 };

            debug!(
                passer = %world.players[holder].display_name,
                target = %target_name,
                lofted,
                "pass"
            );
            world.players[holder].has_ball = false;
        }
        BallAction::Shoot => {
            let p = &world.players[holder];
            let goal_x = attack_goal_x(p.team);
            let power = BASE_SHOT_POWER * (p.attrs.shot / 100.0);
            // Aim somewhere inside the goal mouth, not always dead center.
            let y_adjust = (rng.gen::<f32>() - 0.5) * (GOAL_POST_Y_BOTTOM - GOAL_POST_Y_TOP);
            let ang = ((CENTER_Y + y_adjust) - p.y).atan2(goal_x - p.x);

            world.ball.vx = ang.cos() * power * GLOBAL_SPEED_FACTOR;
            world.ball.vy = ang.sin() * power * GLOBAL_SPEED_FACTOR;
            world.ball.vz = SHOT_LOFT_VZ;

            debug!(shooter = %world.players[holder].display_name, "shot");
            world.players[holder].has_ball = false;
        }
        BallAction::Clear => {
            let p = &world.players[holder];
            let ang = (CENTER_Y - p.y).atan2(attack_goal_x(p.team) - p.x);

            world.ball.vx = ang.cos() * CLEAR_SPEED;
            world.ball.vy = ang.sin() * CLEAR_SPEED;
            world.ball.vz = CLEAR_LOFT_VZ;

            debug!(keeper = %world.players[holder].display_name, "clearance");
            world.players[holder].has_ball = false;
        }
    }
}

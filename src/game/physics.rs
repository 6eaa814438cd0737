//! Ball and agent physics, goal detection, kickoff reset
//!
//! Integrates one tick of motion: ball height under gravity with ground
//! bounce, horizontal motion with drag and elastic bounds, goal detection
//! ahead of the x-bound reflection, straight-line agent movement, and the
//! dribble coupling that keeps a grounded ball at the holder's feet.

use rand::Rng;

use crate::game::pitch::{
    self, FIELD_HEIGHT, FIELD_WIDTH, GOAL_HEIGHT, GOAL_LINE_X_AWAY, GOAL_LINE_X_HOME,
    GOAL_POST_Y_BOTTOM, GOAL_POST_Y_TOP,
};
use crate::game::world::{player_speed, Ball, WorldState};
use crate::ws::protocol::{PlayerId, Score, ScorerEntry, Team};

/// Global pace scale applied to kicked-ball and agent speeds.
pub const GLOBAL_SPEED_FACTOR: f32 = 0.7;
/// Base agent speed in pixels per tick, scaled per agent by its speed rating.
pub const PLAYER_SPEED: f32 = 2.0 * GLOBAL_SPEED_FACTOR;
/// Horizontal velocity decay per tick.
pub const BALL_DRAG: f32 = 0.98;
/// Dribble transfer factor from agent velocity to ball velocity.
pub const BALL_SPEED_FACTOR: f32 = 0.96;

/// Downward acceleration per tick while airborne.
const GRAVITY: f32 = -0.15;
/// Vertical velocity damping on a hard landing.
const GROUND_BOUNCE: f32 = -0.3;
/// Landings slower than this stick instead of bouncing.
const BOUNCE_MIN_IMPACT: f32 = -1.0;

const KICKOFF_SPEED: f32 = 48.0 * GLOBAL_SPEED_FACTOR;
const KICKOFF_Y_SPREAD: f32 = 24.0 * GLOBAL_SPEED_FACTOR;

/// Outcome of a goal crossing, reported to the tick loop for event emission.
#[derive(Debug, Clone, Copy)]
pub struct GoalScored {
    pub team: Team,
    pub scorer: Option<PlayerId>,
    pub score: Score,
}

/// Advance the world by one tick. Returns the goal scored this tick, if any;
/// the world has already been reset for the next kickoff in that case.
pub fn step(world: &mut WorldState, rng: &mut impl Rng) -> Option<GoalScored> {
    world.ball.normalize_height();

    // Vertical motion
    let ball = &mut world.ball;
    ball.z += ball.vz;
    if ball.z > 0.0 {
        ball.vz += GRAVITY;
    } else {
        ball.z = 0.0;
        if ball.vz < BOUNCE_MIN_IMPACT {
            ball.vz *= GROUND_BOUNCE;
        } else {
            ball.vz = 0.0;
        }
    }

    // Horizontal motion with drag; y bounds are elastic
    ball.x += ball.vx;
    ball.y += ball.vy;
    ball.vx *= BALL_DRAG;
    ball.vy *= BALL_DRAG;
    if ball.y < 0.0 {
        ball.y = 0.0;
        ball.vy = -ball.vy;
    }
    if ball.y > FIELD_HEIGHT {
        ball.y = FIELD_HEIGHT;
        ball.vy = -ball.vy;
    }

    // Goal detection runs before the x-bound reflection. A ball above the
    // goal height passes over the frame and stays in play.
    let in_goal_mouth =
        ball.y > GOAL_POST_Y_TOP && ball.y < GOAL_POST_Y_BOTTOM && ball.z < GOAL_HEIGHT;
    let scoring_team = if ball.x > GOAL_LINE_X_AWAY && in_goal_mouth {
        Some(Team::Home)
    } else if ball.x < GOAL_LINE_X_HOME && in_goal_mouth {
        Some(Team::Away)
    } else {
        None
    };

    if let Some(team) = scoring_team {
        match team {
            Team::Home => world.score.home += 1,
            Team::Away => world.score.away += 1,
        }
        // Kickoff goes to the side that conceded.
        world.kickoff_team = team.opponent();

        let scorer = world.last_toucher;
        if let Some(player_id) = scorer {
            world.scorers.push(ScorerEntry {
                player_id,
                time: world.time,
            });
        }

        let score = world.score;
        reset_for_kickoff(world, rng);
        return Some(GoalScored {
            team,
            scorer,
            score,
        });
    }

    if ball.x < 0.0 {
        ball.x = 0.0;
        ball.vx = -ball.vx;
    }
    if ball.x > FIELD_WIDTH {
        ball.x = FIELD_WIDTH;
        ball.vx = -ball.vx;
    }

    // Agents move straight at their targets, snapping without overshoot.
    for p in &mut world.players {
        let speed = player_speed(p);
        let d = pitch::dist(p.x, p.y, p.target_x, p.target_y);
        if d > speed {
            let ang = (p.target_y - p.y).atan2(p.target_x - p.x);
            p.vx = ang.cos() * speed;
            p.vy = ang.sin() * speed;
            p.x += p.vx;
            p.y += p.vy;
        } else {
            p.x = p.target_x;
            p.y = p.target_y;
            p.vx = 0.0;
            p.vy = 0.0;
        }
    }

    // Dribble coupling: the holder carries the ball grounded at its feet.
    if let Some(h) = world.holder() {
        let p = &world.players[h];
        let (px, py, pvx, pvy) = (p.x, p.y, p.vx, p.vy);
        let dribble = p.attrs.dribble / 100.0;
        let moving = pvx.hypot(pvy) > 0.1;

        let ball = &mut world.ball;
        if moving {
            let ang = pvy.atan2(pvx);
            ball.x = px + ang.cos() * 10.0;
            ball.y = py + ang.sin() * 10.0;
            ball.vx = pvx * BALL_SPEED_FACTOR * dribble;
            ball.vy = pvy * BALL_SPEED_FACTOR * dribble;
        } else {
            // Stationary holder: ease the ball to its side instead of snapping.
            ball.x = px + 5.0;
            ball.y = py;
            ball.vx *= BALL_DRAG;
            ball.vy *= BALL_DRAG;
        }
        ball.z = 0.0;
        ball.vz = 0.0;
    }

    None
}

/// Reposition everything for a kickoff: formation slots, zeroed velocities
/// and targets, cleared possession, centered ball, and the kickoff impulse
/// toward the receiving side with a small randomized lateral deflection.
pub fn reset_for_kickoff(world: &mut WorldState, rng: &mut impl Rng) {
    for p in &mut world.players {
        if let Some((sx, sy)) = pitch::formation_slot(p.id) {
            p.x = sx;
            p.y = sy;
        }
        p.vx = 0.0;
        p.vy = 0.0;
        p.target_x = p.x;
        p.target_y = p.y;
    }
    world.clear_possession();

    world.ball = Ball::at_center();
    let direction = match world.kickoff_team {
        Team::Home => 1.0,
        Team::Away => -1.0,
    };
    world.ball.vx = direction * KICKOFF_SPEED;
    world.ball.vy = (rng.gen::<f32>() - 0.5) * KICKOFF_Y_SPREAD;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::pitch::CENTER_Y;
    use crate::game::world::WorldState;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(5)
    }

    fn quiet_world() -> WorldState {
        let mut r = rng();
        let mut w = WorldState::new(180, &mut r);
        for p in &mut w.players {
            p.x = -1000.0;
            p.y = -1000.0;
            p.target_x = p.x;
            p.target_y = p.y;
            p.has_ball = false;
        }
        w.ball = Ball::at_center();
        w
    }

    #[test]
    fn height_stays_finite_and_non_negative() {
        let mut w = quiet_world();
        w.ball.z = 15.0;
        w.ball.vz = -4.0;
        let mut r = rng();
        for _ in 0..600 {
            step(&mut w, &mut r);
            assert!(w.ball.z.is_finite());
            assert!(w.ball.z >= 0.0);
            assert!(w.ball.vz.is_finite());
        }
    }

    #[test]
    fn hard_landing_bounces_soft_landing_sticks() {
        let mut w = quiet_world();
        w.ball.z = 1.0;
        w.ball.vz = -2.0;
        let mut r = rng();
        step(&mut w, &mut r);
        assert_eq!(w.ball.z, 0.0);
        assert!((w.ball.vz - 0.6).abs() < 1e-5, "vz = {}", w.ball.vz);

        let mut w = quiet_world();
        w.ball.z = 0.3;
        w.ball.vz = -0.5;
        step(&mut w, &mut r);
        assert_eq!(w.ball.z, 0.0);
        assert_eq!(w.ball.vz, 0.0);
    }

    #[test]
    fn drag_slows_the_ball() {
        let mut w = quiet_world();
        w.ball.vx = 10.0;
        let mut r = rng();
        step(&mut w, &mut r);
        assert!((w.ball.vx - 10.0 * BALL_DRAG).abs() < 1e-5);
    }

    #[test]
    fn y_bounds_reflect() {
        let mut w = quiet_world();
        w.ball.y = 2.0;
        w.ball.vy = -5.0;
        let mut r = rng();
        step(&mut w, &mut r);
        assert_eq!(w.ball.y, 0.0);
        assert!(w.ball.vy > 0.0);
    }

    #[test]
    fn grounded_ball_in_goal_mouth_scores_and_resets() {
        let mut w = quiet_world();
        w.ball.x = GOAL_LINE_X_AWAY - 5.0;
        w.ball.y = CENTER_Y;
        w.ball.vx = 10.0;
        w.last_toucher = Some(w.players[7].id);
        let mut r = rng();

        let goal = step(&mut w, &mut r).expect("goal");
        assert_eq!(goal.team, Team::Home);
        assert_eq!(goal.scorer, Some(w.players[7].id));
        assert_eq!(w.score.home, 1);
        assert_eq!(w.score.away, 0);
        assert_eq!(w.kickoff_team, Team::Away);
        assert_eq!(w.scorers.len(), 1);

        // Post-reset: formation, centered grounded ball, away kickoff impulse.
        let (sx, sy) = pitch::formation_slot(w.players[0].id).unwrap();
        assert_eq!((w.players[0].x, w.players[0].y), (sx, sy));
        assert_eq!(w.ball.x, FIELD_WIDTH / 2.0);
        assert_eq!(w.ball.z, 0.0);
        assert_eq!(w.ball.vz, 0.0);
        assert!(w.ball.vx < 0.0);
        assert!(w.holder().is_none());

        // The reset ball is at midfield, so the goal cannot double-count.
        assert!(step(&mut w, &mut r).is_none());
        assert_eq!(w.score.home, 1);
    }

    #[test]
    fn high_ball_does_not_score() {
        let mut w = quiet_world();
        w.ball.x = GOAL_LINE_X_AWAY - 5.0;
        w.ball.y = CENTER_Y;
        w.ball.z = GOAL_HEIGHT + 10.0;
        w.ball.vz = 1.0; // stays airborne through the tick
        w.ball.vx = 10.0;
        let mut r = rng();

        assert!(step(&mut w, &mut r).is_none());
        assert_eq!(w.score.home, 0);
    }

    #[test]
    fn ball_outside_goal_mouth_reflects_at_x_bound() {
        let mut w = quiet_world();
        w.ball.x = FIELD_WIDTH - 2.0;
        w.ball.y = 100.0; // above the goal mouth band
        w.ball.vx = 5.0;
        let mut r = rng();

        assert!(step(&mut w, &mut r).is_none());
        assert_eq!(w.ball.x, FIELD_WIDTH);
        assert!(w.ball.vx < 0.0);
    }

    #[test]
    fn agent_moves_toward_target_and_snaps() {
        let mut w = quiet_world();
        w.players[1].x = 100.0;
        w.players[1].y = 300.0;
        w.players[1].target_x = 200.0;
        w.players[1].target_y = 300.0;
        let mut r = rng();

        step(&mut w, &mut r);
        let expected = player_speed(&w.players[1]);
        assert!((w.players[1].x - (100.0 + expected)).abs() < 1e-4);

        // Within one tick of travel: snap, no overshoot.
        w.players[1].x = 199.5;
        step(&mut w, &mut r);
        assert_eq!(w.players[1].x, 200.0);
        assert_eq!(w.players[1].vx, 0.0);
    }

    #[test]
    fn moving_holder_pins_ball_ahead() {
        let mut w = quiet_world();
        w.players[3].x = 400.0;
        w.players[3].y = 300.0;
        w.players[3].target_x = 500.0;
        w.players[3].target_y = 300.0;
        w.players[3].has_ball = true;
        w.ball.x = 400.0;
        w.ball.y = 300.0;
        w.ball.z = 7.0;
        let mut r = rng();

        step(&mut w, &mut r);
        assert!((w.ball.x - (w.players[3].x + 10.0)).abs() < 1e-4);
        assert_eq!(w.ball.z, 0.0);
        assert!(w.ball.vx > 0.0);
    }

    #[test]
    fn kickoff_reset_gives_receiving_side_the_ball() {
        let mut w = quiet_world();
        w.kickoff_team = Team::Home;
        let mut r = rng();
        reset_for_kickoff(&mut w, &mut r);
        assert!(w.ball.vx > 0.0);
        assert!(w.ball.vy.abs() <= KICKOFF_Y_SPREAD / 2.0);
        for p in &w.players {
            assert_eq!((p.vx, p.vy), (0.0, 0.0));
            assert!(!p.has_ball);
        }
    }
}

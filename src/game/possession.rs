//! Possession resolution: which single agent controls the ball this tick
//!
//! Runs once per tick before the decision engine so that a ball released by
//! a pass or shot stays released through the physics step of the same tick.

use crate::game::world::{dist_to_ball, WorldState};

/// An agent must be closer than this to the ball to control it.
pub const KICK_RANGE: f32 = 20.0;
/// Field agents can only play a ball below this height.
pub const PLAYER_KICK_HEIGHT: f32 = 10.0;
/// Goalkeepers can catch up to this height.
pub const GK_CATCH_HEIGHT: f32 = 20.0;

/// Resolve the ball holder for this tick.
///
/// Nearest agent wins, gated on ball height: goalkeepers may touch below the
/// catch height, everyone else only below the strictly smaller kick height.
/// A ball at exactly the threshold is untouchable (strict comparison). If the
/// previous holder is a goalkeeper facing an opposing nearest agent and the
/// ball is still below catch height, the keeper retains the ball.
pub fn resolve(world: &mut WorldState) {
    let prev_holder = world.holder();

    let mut nearest: Option<(usize, f32)> = None;
    for (idx, p) in world.players.iter().enumerate() {
        let d = dist_to_ball(p, &world.ball);
        if nearest.map_or(true, |(_, best)| d < best) {
            nearest = Some((idx, d));
        }
    }

    let new_holder = match nearest {
        Some((idx, d)) if d < KICK_RANGE => {
            let closest = &world.players[idx];
            let gate = if closest.role.is_goalkeeper() {
                GK_CATCH_HEIGHT
            } else {
                PLAYER_KICK_HEIGHT
            };

            if world.ball.z < gate {
                match prev_holder {
                    // Caught-ball rule: a keeper holding against the other
                    // team keeps the ball until it deliberately releases.
                    Some(h)
                        if world.players[h].role.is_goalkeeper()
                            && world.players[h].team != closest.team
                            && world.ball.z < GK_CATCH_HEIGHT =>
                    {
                        Some(h)
                    }
                    _ => Some(idx),
                }
            } else {
                // Airborne ball is untouchable even for the nearest agent.
                None
            }
        }
        _ => None,
    };

    for (idx, p) in world.players.iter_mut().enumerate() {
        p.has_ball = Some(idx) == new_holder;
    }
    if let Some(h) = new_holder {
        world.last_toucher = Some(world.players[h].id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::pitch::{CENTER_X, CENTER_Y};
    use crate::ws::protocol::{Role, Team};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn world() -> WorldState {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut w = WorldState::new(180, &mut rng);
        // Park everyone far from the ball so tests place agents explicitly.
        for p in &mut w.players {
            p.x = -1000.0;
            p.y = -1000.0;
            p.has_ball = false;
        }
        w.ball.x = CENTER_X;
        w.ball.y = CENTER_Y;
        w.ball.z = 0.0;
        w
    }

    #[test]
    fn ball_at_rest_with_nobody_in_range_has_no_holder() {
        let mut w = world();
        resolve(&mut w);
        assert!(w.holder().is_none());
    }

    #[test]
    fn nearest_agent_in_range_acquires() {
        let mut w = world();
        w.players[5].x = CENTER_X + 5.0;
        w.players[5].y = CENTER_Y;
        w.players[13].x = CENTER_X + 12.0;
        w.players[13].y = CENTER_Y;
        resolve(&mut w);
        assert_eq!(w.holder(), Some(5));
        assert_eq!(w.last_toucher, Some(w.players[5].id));
    }

    #[test]
    fn height_gate_blocks_field_agents() {
        let mut w = world();
        w.players[5].x = CENTER_X + 5.0;
        w.players[5].y = CENTER_Y;
        w.ball.z = PLAYER_KICK_HEIGHT; // exactly at threshold: untouchable
        resolve(&mut w);
        assert!(w.holder().is_none());
    }

    #[test]
    fn keeper_may_catch_below_catch_height() {
        let mut w = world();
        let gk = w.players.iter().position(|p| p.role == Role::Gk).unwrap();
        w.players[gk].x = CENTER_X + 5.0;
        w.players[gk].y = CENTER_Y;
        w.ball.z = PLAYER_KICK_HEIGHT + 5.0; // too high for field agents
        resolve(&mut w);
        assert_eq!(w.holder(), Some(gk));
    }

    #[test]
    fn keeper_retains_against_closer_opponent() {
        let mut w = world();
        let gk = w
            .players
            .iter()
            .position(|p| p.role == Role::Gk && p.team == Team::Home)
            .unwrap();
        let striker = w
            .players
            .iter()
            .position(|p| p.team == Team::Away && p.role == Role::FwL)
            .unwrap();

        w.players[gk].x = CENTER_X + 10.0;
        w.players[gk].y = CENTER_Y;
        w.players[gk].has_ball = true;
        w.players[striker].x = CENTER_X + 3.0;
        w.players[striker].y = CENTER_Y;

        resolve(&mut w);
        assert_eq!(w.holder(), Some(gk), "keeper loses caught ball");
    }

    #[test]
    fn keeper_yields_to_closer_teammate() {
        let mut w = world();
        let gk = w
            .players
            .iter()
            .position(|p| p.role == Role::Gk && p.team == Team::Home)
            .unwrap();
        let teammate = w
            .players
            .iter()
            .position(|p| p.team == Team::Home && p.role == Role::DfL)
            .unwrap();

        w.players[gk].x = CENTER_X + 10.0;
        w.players[gk].y = CENTER_Y;
        w.players[gk].has_ball = true;
        w.players[teammate].x = CENTER_X + 3.0;
        w.players[teammate].y = CENTER_Y;

        resolve(&mut w);
        assert_eq!(w.holder(), Some(teammate));
    }

    #[test]
    fn at_most_one_holder_always() {
        let mut w = world();
        for i in 0..4 {
            w.players[i].x = CENTER_X + i as f32;
            w.players[i].y = CENTER_Y;
        }
        resolve(&mut w);
        assert_eq!(w.players.iter().filter(|p| p.has_ball).count(), 1);
    }
}

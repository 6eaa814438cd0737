//! World state to wire snapshot conversion

use std::collections::BTreeMap;

use crate::game::world::WorldState;
use crate::ws::protocol::{BallSnapshot, PlayerSnapshot, ServerMsg};

/// Normalization-on-read: observers must never see a non-finite number.
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Build the per-tick state broadcast from the authoritative world.
pub fn world_snapshot(world: &WorldState) -> ServerMsg {
    let players: BTreeMap<_, _> = world
        .players
        .iter()
        .map(|p| {
            (
                p.id,
                PlayerSnapshot {
                    x: p.x,
                    y: p.y,
                    vx: p.vx,
                    vy: p.vy,
                    team: p.team,
                    role: p.role,
                    has_ball: p.has_ball,
                    display_name: p.display_name.clone(),
                    ranks: p.ranks,
                    image_key: p.image_key.clone(),
                },
            )
        })
        .collect();

    ServerMsg::StateUpdate {
        players,
        ball: BallSnapshot {
            x: world.ball.x,
            y: world.ball.y,
            z: finite_or_zero(world.ball.z),
            vx: world.ball.vx,
            vy: world.ball.vy,
            vz: finite_or_zero(world.ball.vz),
        },
        score: world.score,
        time: world.time,
        match_ended: world.match_ended,
        scorers: world.scorers.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn world() -> WorldState {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        WorldState::new(180, &mut rng)
    }

    #[test]
    fn snapshot_carries_full_roster() {
        let w = world();
        match world_snapshot(&w) {
            ServerMsg::StateUpdate { players, time, .. } => {
                assert_eq!(players.len(), 16);
                assert_eq!(time, 180);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn non_finite_height_is_normalized_for_observers() {
        let mut w = world();
        w.ball.z = f32::NAN;
        w.ball.vz = f32::NEG_INFINITY;
        match world_snapshot(&w) {
            ServerMsg::StateUpdate { ball, .. } => {
                assert_eq!(ball.z, 0.0);
                assert_eq!(ball.vz, 0.0);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn possession_flag_is_carried() {
        let mut w = world();
        w.players[7].has_ball = true;
        match world_snapshot(&w) {
            ServerMsg::StateUpdate { players, .. } => {
                let holder = &players[&w.players[7].id];
                assert!(holder.has_ball);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}

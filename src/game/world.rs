//! Authoritative world state: roster, ball, score, clock, scorer log
//!
//! Pure data plus construction rules. All mutation happens in the possession
//! resolver, the decision commit phase, and the physics integrator, each
//! called in order by the match tick loop.

use rand::Rng;

use crate::game::pitch::{self, FIELD_HEIGHT, FIELD_WIDTH};
use crate::ws::protocol::{PlayerId, Rank, RankSet, Role, Score, ScorerEntry, Team};

/// Number of agents per match (8 a side)
pub const ROSTER_SIZE: u8 = 16;

/// Attribute ratings after star multipliers are applied
#[derive(Debug, Clone, Copy)]
pub struct Attributes {
    pub speed: f32,
    pub shot: f32,
    pub pass: f32,
    pub dribble: f32,
    pub tackle: f32,
    pub shot_range_mult: f32,
}

impl Attributes {
    pub fn ranks(&self) -> RankSet {
        RankSet {
            spd: Rank::from_rating(self.speed),
            sht: Rank::from_rating(self.shot),
            pas: Rank::from_rating(self.pass),
            drb: Rank::from_rating(self.dribble),
            tck: Rank::from_rating(self.tackle),
        }
    }
}

/// Authoritative per-agent state
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: PlayerId,
    pub display_name: String,
    pub team: Team,
    pub role: Role,
    pub image_key: String,

    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub target_x: f32,
    pub target_y: f32,

    /// Mutually exclusive across the roster; written only by the
    /// possession resolver and the action commit phase.
    pub has_ball: bool,

    pub attrs: Attributes,
    pub ranks: RankSet,
}

/// Ball state. `z` is height above ground, kept finite and non-negative.
#[derive(Debug, Clone, Copy)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
}

impl Ball {
    pub fn at_center() -> Self {
        Self {
            x: FIELD_WIDTH / 2.0,
            y: FIELD_HEIGHT / 2.0,
            z: 0.0,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
        }
    }

    /// Normalization-on-read for the height axis: a non-finite `z`/`vz`
    /// (e.g. from a divide-by-zero upstream) resets to ground level instead
    /// of propagating into clients.
    pub fn normalize_height(&mut self) {
        if !self.z.is_finite() {
            self.z = 0.0;
        }
        if !self.vz.is_finite() {
            self.vz = 0.0;
        }
    }
}

/// The single authoritative record of a match world
#[derive(Debug, Clone)]
pub struct WorldState {
    pub players: Vec<PlayerState>,
    pub ball: Ball,
    pub score: Score,
    /// Remaining whole seconds, counts down while play runs
    pub time: u32,
    pub match_ended: bool,
    /// Append-only goal log
    pub scorers: Vec<ScorerEntry>,
    /// Side that takes the next kickoff
    pub kickoff_team: Team,
    /// Most recent ball holder, used for scorer attribution
    pub last_toucher: Option<PlayerId>,
}

impl WorldState {
    /// Build a fresh world with a randomized roster. Initial positions are
    /// random; the first kickoff reset moves everyone to formation slots.
    pub fn new(match_seconds: u32, rng: &mut impl Rng) -> Self {
        let players = (0..ROSTER_SIZE).map(|i| generate_player(i, rng)).collect();

        Self {
            players,
            ball: Ball::at_center(),
            score: Score::default(),
            time: match_seconds,
            match_ended: false,
            scorers: Vec::new(),
            kickoff_team: Team::Home,
            last_toucher: None,
        }
    }

    /// Index of the current ball holder, if any.
    pub fn holder(&self) -> Option<usize> {
        self.players.iter().position(|p| p.has_ball)
    }

    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// True when the given team's agent currently holds the ball.
    pub fn team_has_ball(&self, team: Team) -> bool {
        self.holder().is_some_and(|i| self.players[i].team == team)
    }

    pub fn clear_possession(&mut self) {
        for p in &mut self.players {
            p.has_ball = false;
        }
    }
}

/// Star-agent override: boosted multipliers and a distinct visual identity.
struct StarProfile {
    name: &'static str,
    image_key: &'static str,
    speed_mult: f32,
    shot_mult: f32,
    dribble_mult: f32,
    shot_range_mult: f32,
}

fn star_profile(index: u8) -> Option<StarProfile> {
    match index {
        7 => Some(StarProfile {
            name: "Sakuraba",
            image_key: "sakuraba_home",
            speed_mult: 1.5,
            shot_mult: 1.0,
            dribble_mult: 3.0,
            shot_range_mult: 1.5,
        }),
        3 => Some(StarProfile {
            name: "Gouda",
            image_key: "gouda_home",
            speed_mult: 1.5,
            shot_mult: 1.0,
            dribble_mult: 5.0,
            shot_range_mult: 1.5,
        }),
        14 => Some(StarProfile {
            name: "Zoro",
            image_key: "zoro_away",
            speed_mult: 1.2,
            shot_mult: 2.0,
            dribble_mult: 1.0,
            shot_range_mult: 1.3,
        }),
        11 => Some(StarProfile {
            name: "Itoshi",
            image_key: "itoshi_away",
            speed_mult: 1.0,
            shot_mult: 1.0,
            dribble_mult: 10.0,
            shot_range_mult: 2.0,
        }),
        _ => None,
    }
}

fn role_for(index: u8) -> Role {
    match index {
        0 | 8 => Role::Gk,
        1 | 9 => Role::DfL,
        2 | 10 => Role::DfR,
        3 | 11 => Role::MfC,
        4 | 12 => Role::MfL,
        5 | 13 => Role::MfR,
        6 | 14 => Role::FwL,
        _ => Role::FwR,
    }
}

fn generate_player(index: u8, rng: &mut impl Rng) -> PlayerState {
    let id = PlayerId(index);
    let team = if index < 8 { Team::Home } else { Team::Away };
    let role = role_for(index);
    let star = star_profile(index);

    let base_speed = rng.gen_range(70..100) as f32;
    let base_shot = rng.gen_range(50..100) as f32;
    let base_dribble = rng.gen_range(70..100) as f32;
    let base_tackle = rng.gen_range(70..100) as f32;

    let (speed_mult, shot_mult, dribble_mult, shot_range_mult) = star
        .as_ref()
        .map(|s| (s.speed_mult, s.shot_mult, s.dribble_mult, s.shot_range_mult))
        .unwrap_or((1.0, 1.0, 1.0, 1.0));

    let attrs = Attributes {
        speed: base_speed * speed_mult,
        shot: base_shot * shot_mult,
        pass: 80.0,
        dribble: base_dribble * dribble_mult,
        tackle: base_tackle,
        shot_range_mult,
    };

    let display_name = star
        .as_ref()
        .map(|s| s.name.to_string())
        .unwrap_or_else(|| id.to_string());

    let image_key = star.map(|s| s.image_key.to_string()).unwrap_or_else(|| {
        let side = if team == Team::Home { "home" } else { "away" };
        if role.is_goalkeeper() {
            format!("keeper_{side}")
        } else {
            format!("player_{side}")
        }
    });

    let x = rng.gen::<f32>() * FIELD_WIDTH;
    let y = rng.gen::<f32>() * FIELD_HEIGHT;

    let ranks = attrs.ranks();
    PlayerState {
        id,
        display_name,
        team,
        role,
        image_key,
        x,
        y,
        vx: 0.0,
        vy: 0.0,
        target_x: x,
        target_y: y,
        has_ball: false,
        attrs,
        ranks,
    }
}

/// Per-agent movement speed in pixels per tick.
pub fn player_speed(p: &PlayerState) -> f32 {
    (p.attrs.speed / 100.0) * crate::game::physics::PLAYER_SPEED
}

/// Convenience: distance from an agent to the ball.
pub fn dist_to_ball(p: &PlayerState, ball: &Ball) -> f32 {
    pitch::dist(p.x, p.y, ball.x, ball.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn world() -> WorldState {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        WorldState::new(180, &mut rng)
    }

    #[test]
    fn roster_has_sixteen_agents_one_keeper_per_side() {
        let w = world();
        assert_eq!(w.players.len(), 16);
        let home_gk = w
            .players
            .iter()
            .filter(|p| p.team == Team::Home && p.role.is_goalkeeper())
            .count();
        let away_gk = w
            .players
            .iter()
            .filter(|p| p.team == Team::Away && p.role.is_goalkeeper())
            .count();
        assert_eq!(home_gk, 1);
        assert_eq!(away_gk, 1);
    }

    #[test]
    fn base_ratings_within_bounds() {
        let w = world();
        for p in &w.players {
            assert_eq!(p.attrs.pass, 80.0);
            assert!((70.0..100.0).contains(&p.attrs.tackle));
            // Stars may exceed the base bounds via multipliers.
            if star_profile(p.id.0).is_none() {
                assert!((70.0..100.0).contains(&p.attrs.speed), "{}", p.id);
                assert!((50.0..100.0).contains(&p.attrs.shot), "{}", p.id);
                assert!((70.0..100.0).contains(&p.attrs.dribble), "{}", p.id);
            }
        }
    }

    #[test]
    fn star_agents_carry_overrides() {
        let w = world();
        let itoshi = &w.players[11];
        assert_eq!(itoshi.display_name, "Itoshi");
        assert_eq!(itoshi.attrs.shot_range_mult, 2.0);
        assert!(itoshi.attrs.dribble >= 700.0);
        assert_eq!(itoshi.ranks.drb, Rank::S);

        let regular = &w.players[1];
        assert_eq!(regular.display_name, "player1");
        assert_eq!(regular.image_key, "player_home");
    }

    #[test]
    fn no_holder_after_construction() {
        let w = world();
        assert!(w.holder().is_none());
        assert!(w.last_toucher.is_none());
    }

    #[test]
    fn normalize_height_defends_against_nan() {
        let mut ball = Ball::at_center();
        ball.z = f32::NAN;
        ball.vz = f32::INFINITY;
        ball.normalize_height();
        assert_eq!(ball.z, 0.0);
        assert_eq!(ball.vz, 0.0);
    }
}

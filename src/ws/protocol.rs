//! WebSocket protocol message definitions
//! These are the wire types for observer-server communication

use std::collections::BTreeMap;
use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Stable agent identity, serialized as `"player{N}"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u8);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player{}", self.0)
    }
}

impl Serialize for PlayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.strip_prefix("player")
            .and_then(|n| n.parse().ok())
            .map(PlayerId)
            .ok_or_else(|| de::Error::custom(format!("invalid player id: {s}")))
    }
}

/// Which squad an agent belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Home,
    Away,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Team::Home => Team::Away,
            Team::Away => Team::Home,
        }
    }
}

/// Formation role of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "GK")]
    Gk,
    #[serde(rename = "DF-L")]
    DfL,
    #[serde(rename = "DF-R")]
    DfR,
    #[serde(rename = "DF-C")]
    DfC,
    #[serde(rename = "MF-L")]
    MfL,
    #[serde(rename = "MF-R")]
    MfR,
    #[serde(rename = "MF-C")]
    MfC,
    #[serde(rename = "FW-L")]
    FwL,
    #[serde(rename = "FW-R")]
    FwR,
    #[serde(rename = "FW-C")]
    FwC,
}

/// Role collapsed to its line, used by the decision heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleLine {
    Gk,
    Df,
    Mf,
    Fw,
}

impl Role {
    pub fn line(self) -> RoleLine {
        match self {
            Role::Gk => RoleLine::Gk,
            Role::DfL | Role::DfR | Role::DfC => RoleLine::Df,
            Role::MfL | Role::MfR | Role::MfC => RoleLine::Mf,
            Role::FwL | Role::FwR | Role::FwC => RoleLine::Fw,
        }
    }

    pub fn is_goalkeeper(self) -> bool {
        self == Role::Gk
    }
}

/// Display tier for an attribute rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
    D,
    E,
}

impl Rank {
    /// Pure threshold bucketing of a rating into its display tier.
    pub fn from_rating(rating: f32) -> Self {
        if rating >= 250.0 {
            Rank::S
        } else if rating >= 150.0 {
            Rank::A
        } else if rating >= 120.0 {
            Rank::B
        } else if rating >= 90.0 {
            Rank::C
        } else if rating >= 60.0 {
            Rank::D
        } else {
            Rank::E
        }
    }
}

/// One rank per attribute
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RankSet {
    pub spd: Rank,
    pub sht: Rank,
    pub pas: Rank,
    pub drb: Rank,
    pub tck: Rank,
}

/// Match score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

/// One scorer-log entry: who scored and the clock value at the goal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScorerEntry {
    pub player_id: PlayerId,
    pub time: u32,
}

/// Messages sent from observer to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Release a paused kickoff. No-op while play is running.
    Ready,

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to observer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        observer_id: Uuid,
        match_id: Uuid,
        server_time: u64,
    },

    /// Full world state, sent after every tick
    StateUpdate {
        players: BTreeMap<PlayerId, PlayerSnapshot>,
        ball: BallSnapshot,
        score: Score,
        /// Remaining seconds on the match clock
        time: u32,
        match_ended: bool,
        scorers: Vec<ScorerEntry>,
    },

    /// Discrete match event, pushed independently of state updates
    Event { event: GameEvent },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Agent state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub team: Team,
    pub role: Role,
    pub has_ball: bool,
    pub display_name: String,
    pub ranks: RankSet,
    /// Sprite/skin identifier consumed by the presentation layer
    pub image_key: String,
}

/// Ball state in a snapshot. `z`/`vz` are always present and finite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
}

/// Match events (goals, kickoff transitions, match end)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A goal was scored
    Goal {
        team: Team,
        score: Score,
        scorer_id: Option<PlayerId>,
    },

    /// Match is paused waiting for a kickoff-ready signal
    KickoffWait { team: Team, score: Score },

    /// Play resumed
    Start,

    /// Match ended
    End { score: Score },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_id_round_trips_as_string() {
        let json = serde_json::to_string(&PlayerId(14)).unwrap();
        assert_eq!(json, "\"player14\"");
        let back: PlayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PlayerId(14));
    }

    #[test]
    fn role_serializes_with_line_and_side() {
        assert_eq!(serde_json::to_string(&Role::Gk).unwrap(), "\"GK\"");
        assert_eq!(serde_json::to_string(&Role::FwR).unwrap(), "\"FW-R\"");
    }

    #[test]
    fn rank_thresholds() {
        assert_eq!(Rank::from_rating(250.0), Rank::S);
        assert_eq!(Rank::from_rating(249.9), Rank::A);
        assert_eq!(Rank::from_rating(150.0), Rank::A);
        assert_eq!(Rank::from_rating(120.0), Rank::B);
        assert_eq!(Rank::from_rating(90.0), Rank::C);
        assert_eq!(Rank::from_rating(60.0), Rank::D);
        assert_eq!(Rank::from_rating(59.9), Rank::E);
    }

    #[test]
    fn ready_message_parses() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"ready"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Ready));
    }
}

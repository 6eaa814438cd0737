//! Match simulation modules

pub mod decision;
pub mod r#match;
pub mod physics;
pub mod pitch;
pub mod possession;
pub mod snapshot;
pub mod world;

pub use r#match::{GameMatch, MatchHandle, MatchRegistry, MatchSettings};

use uuid::Uuid;

use crate::ws::protocol::ClientMsg;

/// Control signal received from an observer WebSocket
#[derive(Debug, Clone)]
pub struct ObserverSignal {
    pub observer_id: Uuid,
    pub msg: ClientMsg,
    pub received_at: u64,
}

/// Unrecoverable tick failure. The scheduler halts permanently on these
/// rather than running further ticks against possibly-inconsistent state.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("possession invariant violated: {holders} agents hold the ball")]
    SplitPossession { holders: usize },

    #[error("ball position became non-finite at tick {tick}")]
    NonFiniteBall { tick: u64 },
}

//! Match lifecycle and the authoritative tick loop

use std::time::Duration;

use dashmap::DashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{error, info};
use uuid::Uuid;

use crate::game::world::WorldState;
use crate::game::{decision, physics, possession, snapshot, ObserverSignal, SimError};
use crate::util::time::{SIMULATION_TPS, TICK_DURATION_MICROS};
use crate::ws::protocol::{ClientMsg, GameEvent, ServerMsg};

/// Per-match configuration derived from [`crate::config::Config`]
#[derive(Debug, Clone, Copy)]
pub struct MatchSettings {
    /// Match length in seconds
    pub match_seconds: u32,
    /// Resume play immediately after a reset instead of waiting for a
    /// "ready" signal
    pub auto_kickoff: bool,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            match_seconds: 180,
            auto_kickoff: true,
        }
    }
}

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Paused at a kickoff, waiting for a ready signal
    KickoffWait,
    /// Play is running
    InProgress,
    /// Match ended (terminal)
    Ended,
}

/// Handle to a running match
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    pub control_tx: mpsc::Sender<ObserverSignal>,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
}

impl MatchHandle {
    pub fn observer_count(&self) -> usize {
        self.snapshot_tx.receiver_count()
    }
}

/// Registry of all active matches
pub struct MatchRegistry {
    matches: DashMap<Uuid, MatchHandle>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            matches: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.get(id).map(|m| m.value().clone())
    }

    pub fn insert(&self, handle: MatchHandle) {
        self.matches.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.remove(id).map(|(_, h)| h)
    }

    pub fn active_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn total_observers(&self) -> usize {
        self.matches.iter().map(|m| m.value().observer_count()).sum()
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The authoritative match simulation, owned by a single tokio task
pub struct GameMatch {
    id: Uuid,
    state: WorldState,
    settings: MatchSettings,
    phase: MatchPhase,
    tick: u64,
    ticks_into_second: u32,
    rng: ChaCha8Rng,
    control_rx: mpsc::Receiver<ObserverSignal>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
}

impl GameMatch {
    pub fn new(id: Uuid, seed: u64, settings: MatchSettings) -> (Self, MatchHandle) {
        let (control_tx, control_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let state = WorldState::new(settings.match_seconds, &mut rng);

        let handle = MatchHandle {
            id,
            control_tx,
            snapshot_tx: snapshot_tx.clone(),
        };

        let game = Self {
            id,
            state,
            settings,
            phase: MatchPhase::KickoffWait,
            tick: 0,
            ticks_into_second: 0,
            rng,
            control_rx,
            snapshot_tx,
        };

        (game, handle)
    }

    /// Run the authoritative tick loop until full time or a fatal error.
    pub async fn run(mut self) {
        info!(match_id = %self.id, settings = ?self.settings, "Match task started");
        self.start_match();

        let tick_duration = Duration::from_micros(TICK_DURATION_MICROS);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            self.process_signals();

            if let Err(e) = self.run_tick() {
                // Fail fast: state may be inconsistent, so no further ticks
                // and no further broadcasts.
                error!(match_id = %self.id, error = %e, "Fatal tick error, halting simulation");
                break;
            }

            // State is published every tick, paused or not, so observers
            // always see the current scene.
            let _ = self.snapshot_tx.send(snapshot::world_snapshot(&self.state));

            if self.phase == MatchPhase::Ended {
                info!(match_id = %self.id, score = ?self.state.score, "Match ended");
                break;
            }
        }
    }

    /// Initial reset and kickoff gating, run once before the loop.
    fn start_match(&mut self) {
        physics::reset_for_kickoff(&mut self.state, &mut self.rng);
        self.begin_kickoff();
    }

    fn begin_kickoff(&mut self) {
        if self.settings.auto_kickoff {
            self.phase = MatchPhase::InProgress;
            self.emit(GameEvent::Start);
        } else {
            self.phase = MatchPhase::KickoffWait;
            self.emit(GameEvent::KickoffWait {
                team: self.state.kickoff_team,
                score: self.state.score,
            });
            info!(
                match_id = %self.id,
                team = ?self.state.kickoff_team,
                "Waiting for kickoff"
            );
        }
    }

    /// Drain pending observer signals. These only flip booleans consumed by
    /// the next tick; they never touch simulation state directly.
    fn process_signals(&mut self) {
        while let Ok(signal) = self.control_rx.try_recv() {
            match signal.msg {
                ClientMsg::Ready => self.handle_ready(),
                ClientMsg::Ping { t } => {
                    let _ = self.snapshot_tx.send(ServerMsg::Pong { t });
                }
            }
        }
    }

    /// Honored only while paused at a kickoff; otherwise a no-op.
    fn handle_ready(&mut self) {
        if self.phase == MatchPhase::KickoffWait {
            self.phase = MatchPhase::InProgress;
            self.emit(GameEvent::Start);
            info!(match_id = %self.id, "Kickoff");
        }
    }

    /// One simulation tick: possession, decisions, action commit, physics,
    /// clock. Frozen while paused or ended.
    fn run_tick(&mut self) -> Result<(), SimError> {
        self.tick += 1;
        if self.phase != MatchPhase::InProgress {
            return Ok(());
        }

        possession::resolve(&mut self.state);
        let holders = self.state.players.iter().filter(|p| p.has_ball).count();
        if holders > 1 {
            return Err(SimError::SplitPossession { holders });
        }

        let intents = decision::decide_all(&self.state);
        for (idx, intent) in intents.iter().enumerate() {
            if let Some((tx, ty)) = intent.target {
                self.state.players[idx].target_x = tx;
                self.state.players[idx].target_y = ty;
            }
        }
        for (idx, intent) in intents.iter().enumerate() {
            if let Some(action) = &intent.action {
                if self.state.players[idx].has_ball {
                    decision::apply_action(&mut self.state, idx, action, &mut self.rng);
                }
            }
        }

        if let Some(goal) = physics::step(&mut self.state, &mut self.rng) {
            info!(
                match_id = %self.id,
                team = ?goal.team,
                scorer = ?goal.scorer,
                home = goal.score.home,
                away = goal.score.away,
                "Goal"
            );
            self.emit(GameEvent::Goal {
                team: goal.team,
                score: goal.score,
                scorer_id: goal.scorer,
            });
            self.begin_kickoff();
        }

        if !self.state.ball.x.is_finite() || !self.state.ball.y.is_finite() {
            return Err(SimError::NonFiniteBall { tick: self.tick });
        }

        self.advance_clock();
        Ok(())
    }

    fn advance_clock(&mut self) {
        self.ticks_into_second += 1;
        if self.ticks_into_second >= SIMULATION_TPS {
            self.ticks_into_second = 0;
            if self.state.time > 0 {
                self.state.time -= 1;
            } else if !self.state.match_ended {
                self.state.match_ended = true;
                self.phase = MatchPhase::Ended;
                self.emit(GameEvent::End {
                    score: self.state.score,
                });
                info!(match_id = %self.id, score = ?self.state.score, "Full time");
            }
        }
    }

    fn emit(&self, event: GameEvent) {
        let _ = self.snapshot_tx.send(ServerMsg::Event { event });
    }
}

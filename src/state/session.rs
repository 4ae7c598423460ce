//! The authoritative game session.
//!
//! [`GameSession`] is the only place shared game state is mutated. Every
//! operation returns the list of [`Outbound`] effects it produced (messages
//! to fan out, timers to arm) instead of performing I/O, so the whole flow can
//! be driven without sockets. Callers are expected to hold the session behind a
//! single-writer lock and deliver the effects in order.

use std::{collections::BTreeMap, time::Duration};

use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::{
    dto::{
        game::{GameSnapshot, PlayerSummary},
        ws::{
            ConnectedEvent, GameOverEvent, LevelCompleteEvent, NoticeEvent, PlayerMoveEvent,
            RestartVotesEvent, SequenceEvent, ServerMessage, WaitingForPlayersEvent,
        },
    },
    error::{CommandError, JoinError},
    state::{
        barrier::{BarrierKind, ConsensusBarrier},
        game::{Color, ConnectionId, Player, PlayerId},
        registry::{ConnectionRegistry, Departure},
        sequence,
        state_machine::{GameEvent, GamePhase, GameStateMachine},
        turn::{TurnMode, TurnScheduler},
    },
};

const RESET_MESSAGE: &str = "The game was reset! Every player needs to get ready again.";
const PLAYER_LEFT_MESSAGE: &str = "A player left. The game will be reset.";

/// Tunables of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRules {
    /// Seats available.
    pub max_players: usize,
    /// Players required to start a round and to keep it going.
    pub min_players: usize,
    /// Sequence length of the first level.
    pub initial_sequence_length: usize,
    /// Time clients get to show the game-over screen before the reset.
    pub game_over_grace: Duration,
    /// Pause between the last acknowledgement and the next sequence.
    pub next_level_delay: Duration,
    /// Turn gating.
    pub turn_mode: TurnMode,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            max_players: 4,
            min_players: 2,
            initial_sequence_length: 1,
            game_over_grace: Duration::from_secs(5),
            next_level_delay: Duration::from_millis(1500),
            turn_mode: TurnMode::Rotation,
            rng_seed: None,
        }
    }
}

/// Commands a player can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Flag (or unflag) readiness in the lobby.
    Ready(bool),
    /// Press a pad.
    Move(Color),
    /// Acknowledge the next level.
    AdvanceAck,
    /// Cast or withdraw a restart vote.
    VoteRestart(bool),
}

impl PlayerCommand {
    /// Wire name, used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Move(_) => "move",
            Self::AdvanceAck => "readyForNextLevel",
            Self::VoteRestart(_) => "voteRestart",
        }
    }
}

/// Delayed work the session asks its owner to run later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Return to the lobby once the game-over screen had time to show.
    ResetAfterGameOver,
    /// Push the new level's sequence and snapshot.
    DeliverSequence,
}

/// A timer tagged with the generation it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTimer {
    /// What to do when it fires.
    pub kind: TimerKind,
    /// State-machine generation at scheduling time.
    pub generation: u64,
    /// How long to wait.
    pub delay: Duration,
}

/// Side effect produced by a session operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Send to every subscriber.
    Broadcast(ServerMessage),
    /// Send to a single connection.
    Direct {
        /// Recipient.
        connection: ConnectionId,
        /// Payload.
        message: ServerMessage,
    },
    /// Arm a timer and feed it back through [`GameSession::on_timer`].
    Schedule(ScheduledTimer),
}

/// Single authoritative game state shared by every connection.
#[derive(Debug)]
pub struct GameSession {
    rules: SessionRules,
    machine: GameStateMachine,
    registry: ConnectionRegistry,
    turns: TurnScheduler,
    ready: ConsensusBarrier,
    restart: ConsensusBarrier,
    sequence: Vec<Color>,
    next_sequence: Option<Vec<Color>>,
    current_step: usize,
    scores: BTreeMap<PlayerId, u32>,
    rng: StdRng,
}

impl GameSession {
    /// Fresh session sitting in the lobby.
    pub fn new(rules: SessionRules) -> Self {
        let rng = match rules.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            registry: ConnectionRegistry::new(rules.max_players),
            machine: GameStateMachine::new(),
            turns: TurnScheduler::new(),
            ready: ConsensusBarrier::new(BarrierKind::Ready),
            restart: ConsensusBarrier::new(BarrierKind::Restart),
            sequence: Vec::new(),
            next_sequence: None,
            current_step: 0,
            scores: BTreeMap::new(),
            rng,
            rules,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    /// Generation of the underlying state machine.
    pub fn generation(&self) -> u64 {
        self.machine.generation()
    }

    /// Active sequence.
    pub fn sequence(&self) -> &[Color] {
        &self.sequence
    }

    /// Colors of the active sequence already reproduced.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Levels cleared per player.
    pub fn scores(&self) -> &BTreeMap<PlayerId, u32> {
        &self.scores
    }

    /// Connected player count.
    pub fn player_count(&self) -> usize {
        self.registry.len()
    }

    /// Players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.registry.players()
    }

    /// Player record attached to `connection`.
    pub fn lookup(&self, connection: &ConnectionId) -> Option<&Player> {
        self.registry.lookup(connection)
    }

    /// Player holding the turn.
    pub fn current_player(&self) -> Option<&Player> {
        self.registry.players().find(|player| player.is_turn)
    }

    /// `(acknowledged, total)` for the ready barrier.
    pub fn ready_progress(&self) -> (usize, usize) {
        self.ready.progress(self.registry.len())
    }

    /// `(votes, total)` for the restart barrier.
    pub fn restart_progress(&self) -> (usize, usize) {
        self.restart.progress(self.registry.len())
    }

    /// Public snapshot broadcast as `gameState`.
    pub fn snapshot(&self) -> GameSnapshot {
        let phase = self.phase();
        GameSnapshot {
            is_active: phase.round_in_progress(),
            waiting_for_players: phase == GamePhase::Lobby,
            phase: phase.into(),
            player_count: self.registry.len(),
            players: self.registry.players().map(PlayerSummary::from).collect(),
            current_step: self.current_step,
            scores: self.scores.clone(),
        }
    }

    /// Admit a connection.
    pub fn connect(
        &mut self,
        connection: ConnectionId,
    ) -> Result<(PlayerId, Vec<Outbound>), JoinError> {
        let round_in_progress = self.phase().round_in_progress();
        let id = self
            .registry
            .register(connection, round_in_progress, &mut self.rng)?;

        let outbound = vec![
            Outbound::Direct {
                connection,
                message: ServerMessage::Connected(ConnectedEvent {
                    player_id: id.clone(),
                    player_count: self.registry.len(),
                }),
            },
            self.state_broadcast(),
        ];
        Ok((id, outbound))
    }

    /// Drop a connection and repair every piece of state that referenced it.
    ///
    /// Unknown connections produce no effects, so this is safe to call twice.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Vec<Outbound> {
        let Some(Departure { position, player }) = self.registry.unregister(&connection) else {
            return Vec::new();
        };
        self.ready.remove(&player.id);
        self.restart.remove(&player.id);

        let remaining = self.registry.len();
        let mut out = Vec::new();

        if remaining == 0 {
            self.reset(&mut out);
            return out;
        }
        if self.try_restart(&mut out) {
            return out;
        }

        match self.phase() {
            GamePhase::Active | GamePhase::LevelTransition
                if remaining < self.rules.min_players =>
            {
                info!(player = %player.id, remaining, "not enough players left; ending round");
                out.push(Outbound::Broadcast(ServerMessage::PlayerLeft(NoticeEvent {
                    message: PLAYER_LEFT_MESSAGE.into(),
                })));
                self.reset(&mut out);
            }
            GamePhase::Active => {
                let turn = self.turns.on_departure(position, remaining);
                self.registry.mark_turn(turn);
                out.push(self.state_broadcast());
            }
            GamePhase::LevelTransition => {
                out.push(self.state_broadcast());
                if !self.try_advance_level(&mut out) {
                    out.push(self.level_progress());
                }
            }
            GamePhase::Lobby => {
                if !self.try_start_round(&mut out) {
                    out.push(self.state_broadcast());
                }
            }
            GamePhase::Ended => out.push(self.state_broadcast()),
        }

        out
    }

    /// Apply a command from the player behind `connection`.
    pub fn handle(
        &mut self,
        connection: ConnectionId,
        command: PlayerCommand,
    ) -> Result<Vec<Outbound>, CommandError> {
        let id = self
            .registry
            .lookup(&connection)
            .map(|player| player.id.clone())
            .ok_or(CommandError::UnknownConnection(connection))?;

        match command {
            PlayerCommand::Ready(flag) => self.set_ready(&id, flag),
            PlayerCommand::Move(color) => self.play(&id, color),
            PlayerCommand::AdvanceAck => self.acknowledge_level(&id),
            PlayerCommand::VoteRestart(vote) => Ok(self.vote_restart(&id, vote)),
        }
    }

    /// Run a timer previously handed out through [`Outbound::Schedule`].
    ///
    /// Timers issued before the latest phase change are discarded.
    pub fn on_timer(&mut self, timer: ScheduledTimer) -> Vec<Outbound> {
        if timer.generation != self.machine.generation() {
            debug!(
                kind = ?timer.kind,
                issued = timer.generation,
                current = self.machine.generation(),
                "discarding stale timer"
            );
            return Vec::new();
        }

        let mut out = Vec::new();
        match timer.kind {
            TimerKind::ResetAfterGameOver => self.reset(&mut out),
            TimerKind::DeliverSequence => {
                out.push(self.sequence_broadcast());
                out.push(self.state_broadcast());
            }
        }
        out
    }

    fn set_ready(&mut self, id: &str, flag: bool) -> Result<Vec<Outbound>, CommandError> {
        self.expect_phase(GamePhase::Lobby, "ready")?;
        if let Some(player) = self.registry.get_mut(id) {
            player.ready = flag;
        }
        self.ready.set(id, flag);

        let mut out = Vec::new();
        if !self.try_start_round(&mut out) {
            out.push(self.state_broadcast());
        }
        Ok(out)
    }

    fn play(&mut self, id: &str, color: Color) -> Result<Vec<Outbound>, CommandError> {
        self.expect_phase(GamePhase::Active, "move")?;
        let holds_turn = self.registry.get(id).is_some_and(|player| player.is_turn);
        if self.rules.turn_mode == TurnMode::Rotation && !holds_turn {
            return Err(CommandError::InvalidTurn(id.to_owned()));
        }
        let Some(&expected) = self.sequence.get(self.current_step) else {
            warn!(step = self.current_step, len = self.sequence.len(), "step past end of sequence");
            return Err(CommandError::NotAccepted {
                command: "move",
                phase: self.phase(),
            });
        };

        let mut out = vec![Outbound::Broadcast(ServerMessage::PlayerMove(
            PlayerMoveEvent {
                player_id: id.to_owned(),
                color,
            },
        ))];

        if color != expected {
            self.miss(id, color, expected, &mut out);
            return Ok(out);
        }

        self.current_step += 1;
        if self.current_step >= self.sequence.len() {
            self.clear_level(&mut out);
        } else {
            if self.rules.turn_mode == TurnMode::Rotation {
                let turn = self.turns.advance(self.registry.len());
                self.registry.mark_turn(turn);
            }
            out.push(self.state_broadcast());
        }
        Ok(out)
    }

    fn acknowledge_level(&mut self, id: &str) -> Result<Vec<Outbound>, CommandError> {
        self.expect_phase(GamePhase::LevelTransition, "readyForNextLevel")?;
        self.ready.add(id);

        let mut out = Vec::new();
        if !self.try_advance_level(&mut out) {
            out.push(self.level_progress());
        }
        Ok(out)
    }

    fn vote_restart(&mut self, id: &str, vote: bool) -> Vec<Outbound> {
        if let Some(player) = self.registry.get_mut(id) {
            player.voted_restart = vote;
        }
        self.restart.set(id, vote);

        let mut out = Vec::new();
        if !self.try_restart(&mut out) {
            let (votes, total) = self.restart_progress();
            out.push(Outbound::Broadcast(ServerMessage::RestartVotes(
                RestartVotesEvent { votes, total },
            )));
        }
        out
    }

    fn try_start_round(&mut self, out: &mut Vec<Outbound>) -> bool {
        let count = self.registry.len();
        if count < self.rules.min_players || !self.ready.try_fire(count) {
            return false;
        }
        self.start_round(out);
        true
    }

    fn try_advance_level(&mut self, out: &mut Vec<Outbound>) -> bool {
        if !self.ready.try_fire(self.registry.len()) {
            return false;
        }
        self.advance_level(out);
        true
    }

    fn try_restart(&mut self, out: &mut Vec<Outbound>) -> bool {
        if !self.restart.try_fire(self.registry.len()) {
            return false;
        }
        info!(barrier = ?self.restart.kind(), "restart vote passed");
        self.reset(out);
        true
    }

    fn start_round(&mut self, out: &mut Vec<Outbound>) {
        if !self.transition(GameEvent::RoundStarted) {
            return;
        }
        self.sequence = sequence::generate(&mut self.rng, self.rules.initial_sequence_length);
        self.next_sequence = None;
        self.current_step = 0;
        self.scores.clear();
        self.ready.clear();
        self.registry.assign_colors();
        let turn = self
            .turns
            .assign_random_start(self.registry.len(), &mut self.rng);
        self.registry.mark_turn(turn);

        info!(players = self.registry.len(), ?turn, "round started");
        out.push(self.state_broadcast());
        out.push(self.sequence_broadcast());
    }

    fn clear_level(&mut self, out: &mut Vec<Outbound>) {
        if !self.transition(GameEvent::LevelCleared) {
            return;
        }
        for id in self.registry.ids() {
            *self.scores.entry(id.clone()).or_insert(0) += 1;
        }
        self.next_sequence = Some(sequence::extend(&mut self.rng, &self.sequence));
        self.ready.clear();
        self.turns.clear();
        self.registry.mark_turn(None);

        let level = self.sequence.len();
        info!(level, "level cleared");
        out.push(Outbound::Broadcast(ServerMessage::LevelComplete(
            LevelCompleteEvent {
                current_level: level,
                next_level: level + 1,
                scores: self.scores.clone(),
            },
        )));
    }

    fn advance_level(&mut self, out: &mut Vec<Outbound>) {
        if !self.transition(GameEvent::LevelAdvanced) {
            return;
        }
        self.sequence = self
            .next_sequence
            .take()
            .unwrap_or_else(|| sequence::extend(&mut self.rng, &self.sequence));
        self.current_step = 0;
        self.ready.clear();
        let total = self.registry.len();
        let turn = self.turns.assign_random_start(total, &mut self.rng);
        self.registry.mark_turn(turn);

        info!(level = self.sequence.len(), ?turn, "next level");
        out.push(Outbound::Broadcast(ServerMessage::WaitingForPlayers(
            WaitingForPlayersEvent {
                ready: total,
                total,
                all_ready: true,
            },
        )));
        out.push(self.timer(TimerKind::DeliverSequence, self.rules.next_level_delay));
    }

    fn miss(&mut self, id: &str, played: Color, expected: Color, out: &mut Vec<Outbound>) {
        if !self.transition(GameEvent::ColorMissed) {
            return;
        }
        self.turns.clear();
        self.registry.mark_turn(None);

        let final_score = self.sequence.len().saturating_sub(1);
        info!(player = %id, ?played, ?expected, final_score, "round lost");
        out.push(Outbound::Broadcast(ServerMessage::GameOver(GameOverEvent {
            correct_color: expected,
            player_color: played,
            player_id: id.to_owned(),
            final_score,
        })));
        out.push(self.timer(TimerKind::ResetAfterGameOver, self.rules.game_over_grace));
    }

    fn reset(&mut self, out: &mut Vec<Outbound>) {
        self.transition(GameEvent::Reset);
        self.sequence.clear();
        self.next_sequence = None;
        self.current_step = 0;
        self.scores.clear();
        self.ready.clear();
        self.restart.clear();
        self.turns.clear();
        self.registry.reset_flags();

        info!(players = self.registry.len(), "session reset");
        out.push(Outbound::Broadcast(ServerMessage::GameReset(NoticeEvent {
            message: RESET_MESSAGE.into(),
        })));
        out.push(self.state_broadcast());
    }

    fn transition(&mut self, event: GameEvent) -> bool {
        match self.machine.apply(event) {
            Ok(phase) => {
                debug!(?event, ?phase, generation = self.machine.generation(), "phase changed");
                true
            }
            Err(err) => {
                warn!(error = %err, "rejected phase transition");
                false
            }
        }
    }

    fn expect_phase(&self, expected: GamePhase, command: &'static str) -> Result<(), CommandError> {
        let phase = self.phase();
        if phase == expected {
            Ok(())
        } else {
            Err(CommandError::NotAccepted { command, phase })
        }
    }

    fn level_progress(&self) -> Outbound {
        let (ready, total) = self.ready_progress();
        Outbound::Broadcast(ServerMessage::WaitingForPlayers(WaitingForPlayersEvent {
            ready,
            total,
            all_ready: false,
        }))
    }

    fn timer(&self, kind: TimerKind, delay: Duration) -> Outbound {
        Outbound::Schedule(ScheduledTimer {
            kind,
            generation: self.machine.generation(),
            delay,
        })
    }

    fn state_broadcast(&self) -> Outbound {
        Outbound::Broadcast(ServerMessage::GameState(self.snapshot()))
    }

    fn sequence_broadcast(&self) -> Outbound {
        Outbound::Broadcast(ServerMessage::Sequence(SequenceEvent {
            sequence: self.sequence.clone(),
        }))
    }
}

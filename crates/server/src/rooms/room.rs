//! One room: two seats, an optional live session, and a broadcast feed.
//!
//! Every mutating entry point funnels through [`Room::gate`], so operations
//! on the same room are strictly ordered while different rooms proceed in
//! parallel. Events are published while the gate is held, which keeps the
//! subscriber stream in the same order the state changed.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tokio::time::timeout;
use uuid::Uuid;

use shogi_core::{GameAction, RuleError, Session, Side};

use crate::error::AppError;
use crate::rooms::events::{GameOutcome, PlayerView, RoomEvent, RoomSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Waiting,
    InProgress,
    Finished,
    Deleted,
}

#[derive(Debug, Clone)]
struct Seat {
    user_id: Uuid,
    username: String,
}

#[derive(Debug, Default)]
struct Seats {
    first: Option<Seat>,
    second: Option<Seat>,
}

impl Seats {
    fn occupant(&self, side: Side) -> Option<&Seat> {
        match side {
            Side::First => self.first.as_ref(),
            Side::Second => self.second.as_ref(),
        }
    }

    fn side_of(&self, user_id: Uuid) -> Option<Side> {
        [Side::First, Side::Second]
            .into_iter()
            .find(|&side| self.occupant(side).map(|s| s.user_id) == Some(user_id))
    }

    /// The first free seat; the host always ends up as First.
    fn vacant(&self) -> Option<Side> {
        if self.first.is_none() {
            Some(Side::First)
        } else if self.second.is_none() {
            Some(Side::Second)
        } else {
            None
        }
    }

    fn seat(&mut self, side: Side, user_id: Uuid, username: String) {
        let seat = Seat { user_id, username };
        match side {
            Side::First => self.first = Some(seat),
            Side::Second => self.second = Some(seat),
        }
    }

    fn take(&mut self, side: Side) -> Option<Seat> {
        match side {
            Side::First => self.first.take(),
            Side::Second => self.second.take(),
        }
    }

    fn is_empty(&self) -> bool {
        self.first.is_none() && self.second.is_none()
    }

    fn both_filled(&self) -> bool {
        self.first.is_some() && self.second.is_some()
    }

    fn views(&self) -> Vec<PlayerView> {
        [Side::First, Side::Second]
            .into_iter()
            .filter_map(|side| {
                self.occupant(side).map(|s| PlayerView {
                    user_id: s.user_id,
                    username: s.username.clone(),
                    side,
                })
            })
            .collect()
    }
}

#[derive(Debug)]
struct RoomState {
    lifecycle: Lifecycle,
    seats: Seats,
    session: Option<Session>,
    last_activity: Instant,
}

/// Success payload for a move or resignation: the post-transition snapshot
/// plus the notation lines this action appended.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub snapshot: RoomSnapshot,
    pub log_delta: Vec<String>,
}

#[derive(Debug)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    state: Mutex<RoomState>,
    events: broadcast::Sender<RoomEvent>,
    gate_wait: Duration,
}

impl Room {
    pub fn new(name: impl Into<String>, gate_wait: Duration, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Room {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            state: Mutex::new(RoomState {
                lifecycle: Lifecycle::Waiting,
                seats: Seats::default(),
                session: None,
                last_activity: Instant::now(),
            }),
            events,
            gate_wait,
        }
    }

    /// Acquires the per-room gate with a bounded wait. A caller that cannot
    /// get in before the deadline fails with `RoomBusy` instead of queueing
    /// indefinitely; retrying is the caller's job.
    async fn gate(&self) -> Result<MutexGuard<'_, RoomState>, AppError> {
        timeout(self.gate_wait, self.state.lock())
            .await
            .map_err(|_| AppError::RoomBusy)
    }

    /// New event stream for one subscriber. Receivers that fall behind the
    /// channel capacity are lagged out and must resync via a fresh
    /// subscribe plus a snapshot read.
    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.events.subscribe()
    }

    /// Fire-and-forget fan-out; a room with no subscribers is fine.
    fn publish(&self, event: RoomEvent) {
        let _ = self.events.send(event);
    }

    fn snapshot_of(&self, state: &RoomState) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id,
            room_name: self.name.clone(),
            created_at: self.created_at.to_rfc3339(),
            lifecycle: state.lifecycle,
            players: state.seats.views(),
            session: state.session.clone(),
            logs: state
                .session
                .as_ref()
                .map(|s| s.log_lines())
                .unwrap_or_default(),
        }
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, AppError> {
        let state = self.gate().await?;
        if state.lifecycle == Lifecycle::Deleted {
            return Err(AppError::RoomNotFound);
        }
        Ok(self.snapshot_of(&state))
    }

    /// Seats a player. Joining again with the same id is a no-op returning
    /// the held seat, so a reconnecting client never burns the second seat.
    pub async fn join(
        &self,
        user_id: Uuid,
        username: &str,
    ) -> Result<(Side, RoomSnapshot), AppError> {
        let mut state = self.gate().await?;
        if state.lifecycle == Lifecycle::Deleted {
            return Err(AppError::RoomNotFound);
        }
        if let Some(side) = state.seats.side_of(user_id) {
            return Ok((side, self.snapshot_of(&state)));
        }
        if state.lifecycle != Lifecycle::Waiting {
            return Err(AppError::RoomFull);
        }
        let side = state.seats.vacant().ok_or(AppError::RoomFull)?;
        state.seats.seat(side, user_id, username.to_string());
        state.last_activity = Instant::now();
        let snapshot = self.snapshot_of(&state);
        self.publish(RoomEvent::PlayerJoined {
            player: PlayerView {
                user_id,
                username: username.to_string(),
                side,
            },
        });
        Ok((side, snapshot))
    }

    /// Vacates the player's seat. Leaving a game in progress counts as
    /// resignation; the last player out deletes the room. Returns whether
    /// the room is now deleted.
    pub async fn leave(&self, user_id: Uuid) -> Result<bool, AppError> {
        let mut state = self.gate().await?;
        if state.lifecycle == Lifecycle::Deleted {
            return Err(AppError::RoomNotFound);
        }
        let state = &mut *state;
        let side = state.seats.side_of(user_id).ok_or(AppError::SeatNotHeld)?;
        let seat = state.seats.take(side).ok_or(AppError::SeatNotHeld)?;
        state.last_activity = Instant::now();
        self.publish(RoomEvent::PlayerLeft {
            user_id: seat.user_id,
            username: seat.username,
        });

        if state.lifecycle == Lifecycle::InProgress {
            if let Some(session) = state.session.as_mut() {
                if session.resign(side).is_ok() {
                    state.lifecycle = Lifecycle::Finished;
                    if let Some(outcome) = GameOutcome::from_status(session.status()) {
                        self.publish(RoomEvent::GameOver { outcome });
                    }
                }
            }
        }

        if state.seats.is_empty() {
            if let Some(session) = state.session.as_mut() {
                session.abort();
            }
            state.lifecycle = Lifecycle::Deleted;
            self.publish(RoomEvent::Deleted);
            return Ok(true);
        }
        Ok(false)
    }

    /// Starts the game. Only the First-seat occupant may start, and only
    /// with both seats filled.
    pub async fn start(&self, user_id: Uuid) -> Result<RoomSnapshot, AppError> {
        let mut state = self.gate().await?;
        match state.lifecycle {
            Lifecycle::Deleted => return Err(AppError::RoomNotFound),
            Lifecycle::InProgress | Lifecycle::Finished => {
                return Err(AppError::AlreadyStarted)
            }
            Lifecycle::Waiting => {}
        }
        if state.seats.occupant(Side::First).map(|s| s.user_id) != Some(user_id) {
            return Err(AppError::SeatNotHeld);
        }
        if !state.seats.both_filled() {
            return Err(AppError::RoomNotReady);
        }

        state.session = Some(Session::new(self.id.to_string()));
        state.lifecycle = Lifecycle::InProgress;
        state.last_activity = Instant::now();
        let snapshot = self.snapshot_of(&state);
        self.publish(RoomEvent::Started {
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Applies one game action for the seated player. The session validates
    /// against the state as of gate acquisition, so of two concurrent
    /// submissions exactly one sees the pre-transition turn.
    pub async fn submit(
        &self,
        user_id: Uuid,
        action: GameAction,
    ) -> Result<ActionOutcome, AppError> {
        let mut state = self.gate().await?;
        if state.lifecycle == Lifecycle::Deleted {
            return Err(AppError::RoomNotFound);
        }
        let side = state.seats.side_of(user_id).ok_or(AppError::SeatNotHeld)?;
        let state = &mut *state;
        let session = state.session.as_mut().ok_or(AppError::RoomNotReady)?;

        let record = match session.apply(side, action) {
            Ok(record) => record,
            Err(err @ RuleError::InvalidPieceState(_)) => {
                // Model invariant violation: poison the game rather than
                // guess at a repair, and tell every subscriber.
                session.abort();
                state.lifecycle = Lifecycle::Finished;
                if let Some(outcome) = GameOutcome::from_status(session.status()) {
                    self.publish(RoomEvent::GameOver { outcome });
                }
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        let log_delta = vec![record.notation.clone()];
        let finished = session.status().is_over();
        let outcome = GameOutcome::from_status(session.status());
        if finished {
            state.lifecycle = Lifecycle::Finished;
        }
        state.last_activity = Instant::now();

        let snapshot = self.snapshot_of(state);
        self.publish(RoomEvent::StateUpdated {
            snapshot: snapshot.clone(),
            log_delta: log_delta.clone(),
        });
        if let Some(outcome) = outcome {
            self.publish(RoomEvent::GameOver { outcome });
        }
        Ok(ActionOutcome { snapshot, log_delta })
    }

    /// Explicit resignation by a seated player.
    pub async fn resign(&self, user_id: Uuid) -> Result<ActionOutcome, AppError> {
        let mut state = self.gate().await?;
        if state.lifecycle == Lifecycle::Deleted {
            return Err(AppError::RoomNotFound);
        }
        let side = state.seats.side_of(user_id).ok_or(AppError::SeatNotHeld)?;
        let state = &mut *state;
        let session = state.session.as_mut().ok_or(AppError::RoomNotReady)?;

        session.resign(side)?;
        let outcome = GameOutcome::from_status(session.status());
        state.lifecycle = Lifecycle::Finished;
        state.last_activity = Instant::now();

        let snapshot = self.snapshot_of(state);
        self.publish(RoomEvent::StateUpdated {
            snapshot: snapshot.clone(),
            log_delta: Vec::new(),
        });
        if let Some(outcome) = outcome {
            self.publish(RoomEvent::GameOver { outcome });
        }
        Ok(ActionOutcome {
            snapshot,
            log_delta: Vec::new(),
        })
    }

    /// Sweep hook: closes the room if it has sat untouched for `ttl`.
    /// Skips rooms whose gate is currently held; they are clearly not idle.
    pub fn close_if_idle(&self, ttl: Duration) -> bool {
        let Ok(mut state) = self.state.try_lock() else {
            return false;
        };
        let state = &mut *state;
        if state.lifecycle == Lifecycle::Deleted {
            return true;
        }
        if state.last_activity.elapsed() < ttl {
            return false;
        }
        if let Some(session) = state.session.as_mut() {
            session.abort();
            if state.lifecycle == Lifecycle::InProgress {
                if let Some(outcome) = GameOutcome::from_status(session.status()) {
                    self.publish(RoomEvent::GameOver { outcome });
                }
            }
        }
        state.lifecycle = Lifecycle::Deleted;
        self.publish(RoomEvent::Deleted);
        true
    }
}

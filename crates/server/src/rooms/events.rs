//! Wire types fanned out to room subscribers and returned from snapshot
//! requests. Field names match the Next.js client (camelCase).

use serde::Serialize;
use shogi_core::{Session, SessionStatus, Side};
use uuid::Uuid;

use crate::rooms::room::Lifecycle;

/// One seated player as the client sees them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub user_id: Uuid,
    pub username: String,
    pub side: Side,
}

/// Full room state for subscribe-time resync and REST reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: Uuid,
    pub room_name: String,
    pub created_at: String,
    pub lifecycle: Lifecycle,
    pub players: Vec<PlayerView>,
    /// Absent until the game starts.
    pub session: Option<Session>,
    pub logs: Vec<String>,
}

/// How a finished game ended. `winner` is empty for aborted games.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOutcome {
    pub winner: Option<Side>,
    pub reason: &'static str,
}

impl GameOutcome {
    pub fn from_status(status: SessionStatus) -> Option<Self> {
        match status {
            SessionStatus::Active => None,
            SessionStatus::Checkmate { winner } => Some(GameOutcome {
                winner: Some(winner),
                reason: "checkmate",
            }),
            SessionStatus::Resigned { winner } => Some(GameOutcome {
                winner: Some(winner),
                reason: "resignation",
            }),
            SessionStatus::Aborted => Some(GameOutcome {
                winner: None,
                reason: "aborted",
            }),
        }
    }
}

/// Server → subscriber messages, one JSON object per WebSocket frame.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    PlayerJoined {
        player: PlayerView,
    },
    PlayerLeft {
        #[serde(rename = "userId")]
        user_id: Uuid,
        username: String,
    },
    Started {
        snapshot: RoomSnapshot,
    },
    StateUpdated {
        snapshot: RoomSnapshot,
        #[serde(rename = "logDelta")]
        log_delta: Vec<String>,
    },
    GameOver {
        outcome: GameOutcome,
    },
    Deleted,
}

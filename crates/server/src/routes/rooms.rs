use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shogi_core::{GameAction, PieceKind, Side, Square};

use crate::error::AppError;
use crate::rooms::events::RoomSnapshot;
use crate::rooms::registry::Rooms;
use crate::rooms::room::ActionOutcome;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub room_name: String,
    pub username: String,
    /// Minted server-side when the client does not bring one.
    pub user_id: Option<Uuid>,
    pub game_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_name: String,
    pub username: String,
    pub user_id: Option<Uuid>,
    pub game_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomRequest {
    pub room_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub user_id: Uuid,
    pub from: Square,
    pub to: Square,
    #[serde(default)]
    pub promote: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropRequest {
    pub user_id: Uuid,
    pub piece: PieceKind,
    pub to: Square,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedResponse {
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub side: Side,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveResponse {
    pub deleted: bool,
}

fn validate_room_request(
    room_name: &str,
    username: &str,
    game_type: Option<&str>,
) -> Result<(), AppError> {
    if room_name.trim().is_empty() {
        return Err(AppError::BadRequest("Room name must not be empty".into()));
    }
    if room_name.len() > 40 {
        return Err(AppError::BadRequest(
            "Room name must be at most 40 characters".into(),
        ));
    }
    if username.trim().is_empty() {
        return Err(AppError::BadRequest("Username must not be empty".into()));
    }
    if username.len() > 20 {
        return Err(AppError::BadRequest(
            "Username must be at most 20 characters".into(),
        ));
    }
    if let Some(game_type) = game_type {
        if game_type != "shogi" {
            return Err(AppError::BadRequest(format!(
                "Unsupported game type: {game_type}"
            )));
        }
    }
    Ok(())
}

/// POST /create-room
/// Creates a room and seats the caller as First.
pub async fn create_room(
    Extension(rooms): Extension<Arc<Rooms>>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<Json<JoinedResponse>, AppError> {
    validate_room_request(&req.room_name, &req.username, req.game_type.as_deref())?;

    let user_id = req.user_id.unwrap_or_else(Uuid::new_v4);
    let room = rooms.create(&req.room_name).await?;
    let (side, _) = room.join(user_id, &req.username).await?;

    tracing::info!("Room '{}' created by {}", room.name, req.username);
    Ok(Json(JoinedResponse {
        room_id: room.id,
        user_id,
        side,
    }))
}

/// POST /join-room
/// Joins an open room by name; the second player in gets the Second seat.
pub async fn join_room(
    Extension(rooms): Extension<Arc<Rooms>>,
    Json(req): Json<JoinRoomRequest>,
) -> Result<Json<JoinedResponse>, AppError> {
    validate_room_request(&req.room_name, &req.username, req.game_type.as_deref())?;

    let user_id = req.user_id.unwrap_or_else(Uuid::new_v4);
    let room = rooms.find_by_name(&req.room_name).await?;
    let (side, _) = room.join(user_id, &req.username).await?;

    Ok(Json(JoinedResponse {
        room_id: room.id,
        user_id,
        side,
    }))
}

/// POST /leave-room
/// Vacates the caller's seat; mid-game this resigns for them.
pub async fn leave_room(
    Extension(rooms): Extension<Arc<Rooms>>,
    Json(req): Json<LeaveRoomRequest>,
) -> Result<Json<LeaveResponse>, AppError> {
    let deleted = rooms.leave(req.room_id, req.user_id).await?;
    Ok(Json(LeaveResponse { deleted }))
}

/// GET /room/{room_id}
/// Full state for reconnect resync and page loads.
pub async fn get_room(
    Extension(rooms): Extension<Arc<Rooms>>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let room = rooms.get(room_id).await?;
    Ok(Json(room.snapshot().await?))
}

/// POST /room/{room_id}/start
pub async fn start_game(
    Extension(rooms): Extension<Arc<Rooms>>,
    Path(room_id): Path<Uuid>,
    Json(req): Json<PlayerRequest>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let room = rooms.get(room_id).await?;
    Ok(Json(room.start(req.user_id).await?))
}

/// POST /room/{room_id}/move
pub async fn submit_move(
    Extension(rooms): Extension<Arc<Rooms>>,
    Path(room_id): Path<Uuid>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let room = rooms.get(room_id).await?;
    let action = GameAction::Move {
        from: req.from,
        to: req.to,
        promote: req.promote,
    };
    Ok(Json(room.submit(req.user_id, action).await?))
}

/// POST /room/{room_id}/drop
pub async fn submit_drop(
    Extension(rooms): Extension<Arc<Rooms>>,
    Path(room_id): Path<Uuid>,
    Json(req): Json<DropRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let room = rooms.get(room_id).await?;
    let action = GameAction::Drop {
        piece: req.piece,
        to: req.to,
    };
    Ok(Json(room.submit(req.user_id, action).await?))
}

/// POST /room/{room_id}/resign
pub async fn resign(
    Extension(rooms): Extension<Arc<Rooms>>,
    Path(room_id): Path<Uuid>,
    Json(req): Json<PlayerRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let room = rooms.get(room_id).await?;
    Ok(Json(room.resign(req.user_id).await?))
}

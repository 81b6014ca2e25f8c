use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shogi_core::RuleError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is full")]
    RoomFull,

    #[error("Room name already in use")]
    RoomNameTaken,

    #[error("Room is busy, try again")]
    RoomBusy,

    #[error("You are not seated in this room")]
    SeatNotHeld,

    #[error("Both seats must be filled to start")]
    RoomNotReady,

    #[error("Game already started")]
    AlreadyStarted,

    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl AppError {
    /// Stable machine-readable name for the client to branch on.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BadRequest",
            AppError::RoomNotFound => "RoomNotFound",
            AppError::RoomFull => "RoomFull",
            AppError::RoomNameTaken => "RoomNameTaken",
            AppError::RoomBusy => "RoomBusy",
            AppError::SeatNotHeld => "SeatNotHeld",
            AppError::RoomNotReady => "RoomNotReady",
            AppError::AlreadyStarted => "AlreadyStarted",
            AppError::Rule(e) => match e {
                RuleError::NotYourTurn => "NotYourTurn",
                RuleError::GameAlreadyOver => "GameAlreadyOver",
                RuleError::IllegalMove => "IllegalMove",
                RuleError::IllegalDrop => "IllegalDrop",
                RuleError::InvalidPromotion => "InvalidPromotion",
                RuleError::InvalidPieceState(_) => "InvalidPieceState",
            },
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RoomNotFound => StatusCode::NOT_FOUND,
            AppError::RoomFull | AppError::SeatNotHeld => StatusCode::FORBIDDEN,
            AppError::RoomNameTaken | AppError::RoomNotReady | AppError::AlreadyStarted => {
                StatusCode::CONFLICT
            }
            // transient: the caller retries, we never queue behind the gate
            AppError::RoomBusy => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Rule(e) => match e {
                RuleError::NotYourTurn | RuleError::GameAlreadyOver => StatusCode::CONFLICT,
                RuleError::IllegalMove
                | RuleError::IllegalDrop
                | RuleError::InvalidPromotion => StatusCode::BAD_REQUEST,
                RuleError::InvalidPieceState(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {message}");
        }

        // Match the Next.js API error format: {"detail": "message"}
        (status, Json(json!({ "detail": message, "code": self.code() }))).into_response()
    }
}

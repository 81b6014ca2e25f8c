pub mod health;
pub mod room_ws;
pub mod rooms;

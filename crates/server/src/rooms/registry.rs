//! Registry of live rooms. Lookups take a read lock; create/remove take
//! the write lock briefly and never while a room's gate is held.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::rooms::room::Room;

pub struct Rooms {
    inner: RwLock<HashMap<Uuid, Arc<Room>>>,
    gate_wait: Duration,
    event_capacity: usize,
    room_idle: Duration,
}

impl Rooms {
    pub fn new(config: &Config) -> Self {
        Rooms {
            inner: RwLock::new(HashMap::new()),
            gate_wait: config.gate_wait,
            event_capacity: config.event_capacity,
            room_idle: config.room_idle,
        }
    }

    /// Creates a room. Names stay unique for as long as their room lives,
    /// since joining is by name.
    pub async fn create(&self, name: &str) -> Result<Arc<Room>, AppError> {
        let mut rooms = self.inner.write().await;
        if rooms.values().any(|r| r.name == name) {
            return Err(AppError::RoomNameTaken);
        }
        let room = Arc::new(Room::new(name, self.gate_wait, self.event_capacity));
        rooms.insert(room.id, Arc::clone(&room));
        Ok(room)
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<Room>, AppError> {
        self.inner
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AppError::RoomNotFound)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Arc<Room>, AppError> {
        self.inner
            .read()
            .await
            .values()
            .find(|r| r.name == name)
            .cloned()
            .ok_or(AppError::RoomNotFound)
    }

    /// Leaves on the player's behalf and drops the registry entry once the
    /// room has deleted itself.
    pub async fn leave(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let room = self.get(id).await?;
        let deleted = room.leave(user_id).await?;
        if deleted {
            self.inner.write().await.remove(&id);
        }
        Ok(deleted)
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }

    /// One sweep pass over all rooms; returns how many were closed.
    pub async fn sweep_idle(&self) -> usize {
        let mut rooms = self.inner.write().await;
        let before = rooms.len();
        rooms.retain(|_, room| !room.close_if_idle(self.room_idle));
        before - rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(room_idle: Duration) -> Config {
        Config {
            host: "127.0.0.1".into(),
            port: 0,
            gate_wait: Duration::from_secs(1),
            event_capacity: 16,
            room_idle,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let rooms = Rooms::new(&test_config(Duration::from_secs(3600)));
        let room = rooms.create("first-room").await.unwrap();
        assert_eq!(rooms.count().await, 1);
        let found = rooms.get(room.id).await.unwrap();
        assert_eq!(found.name, "first-room");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let rooms = Rooms::new(&test_config(Duration::from_secs(3600)));
        rooms.create("salon").await.unwrap();
        let err = rooms.create("salon").await.unwrap_err();
        assert!(matches!(err, AppError::RoomNameTaken));
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let rooms = Rooms::new(&test_config(Duration::from_secs(3600)));
        let room = rooms.create("salon").await.unwrap();
        assert_eq!(rooms.find_by_name("salon").await.unwrap().id, room.id);
        let err = rooms.find_by_name("missing").await.unwrap_err();
        assert!(matches!(err, AppError::RoomNotFound));
    }

    #[tokio::test]
    async fn test_leave_removes_deleted_room() {
        let rooms = Rooms::new(&test_config(Duration::from_secs(3600)));
        let room = rooms.create("salon").await.unwrap();
        let user = Uuid::new_v4();
        room.join(user, "alice").await.unwrap();

        assert!(rooms.leave(room.id, user).await.unwrap());
        assert_eq!(rooms.count().await, 0);
        assert!(matches!(
            rooms.get(room.id).await.unwrap_err(),
            AppError::RoomNotFound
        ));
    }

    #[tokio::test]
    async fn test_sweep_removes_idle_rooms() {
        let rooms = Rooms::new(&test_config(Duration::ZERO));
        rooms.create("one").await.unwrap();
        rooms.create("two").await.unwrap();
        assert_eq!(rooms.sweep_idle().await, 2);
        assert_eq!(rooms.count().await, 0);
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_rooms() {
        let rooms = Rooms::new(&test_config(Duration::from_secs(3600)));
        rooms.create("one").await.unwrap();
        assert_eq!(rooms.sweep_idle().await, 0);
        assert_eq!(rooms.count().await, 1);
    }
}

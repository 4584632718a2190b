use crate::room::{Room, RoomCommand, RoomSnapshot};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use huddle_core::RoomId;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

pub(crate) struct RoomHandle {
    pub(crate) tx: mpsc::UnboundedSender<RoomCommand>,
    pub(crate) generation: u64,
}

pub(crate) struct RegistryInner {
    pub(crate) rooms: DashMap<RoomId, RoomHandle>,
    output: Arc<dyn SignalingOutput>,
    next_generation: AtomicU64,
}

/// Owns every live room. Rooms are created by the first command addressed
/// to them and remove themselves once empty.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<RegistryInner>,
}

impl RoomRegistry {
    pub fn new(output: Arc<dyn SignalingOutput>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                rooms: DashMap::new(),
                output,
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Queues a command for the room, spawning the room actor if needed.
    pub fn dispatch(&self, room_id: &RoomId, cmd: RoomCommand) {
        let handle = self
            .inner
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| self.spawn_room(room_id));

        if let Err(e) = handle.tx.send(cmd) {
            error!("Room '{}' is gone, dropped {:?}", room_id, e.0);
        }
    }

    fn spawn_room(&self, room_id: &RoomId) -> RoomHandle {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        info!("Creating new room: {}", room_id);

        let (tx, rx) = mpsc::unbounded_channel();
        let room = Room::new(
            room_id.clone(),
            generation,
            rx,
            self.inner.output.clone(),
            Arc::downgrade(&self.inner),
        );
        tokio::spawn(room.run());

        RoomHandle { tx, generation }
    }

    /// State of a live room. Never creates one.
    pub async fn snapshot(&self, room_id: &RoomId) -> Option<RoomSnapshot> {
        let (reply, rx) = oneshot::channel();
        {
            let handle = self.inner.rooms.get(room_id)?;
            handle.tx.send(RoomCommand::Snapshot { reply }).ok()?;
        }
        rx.await.ok()
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.inner.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.inner.rooms.len()
    }

    /// Drops every room handle; room actors finish once their queues drain.
    pub fn shutdown(&self) {
        let count = self.inner.rooms.len();
        self.inner.rooms.clear();
        info!("Room registry shut down ({} rooms released)", count);
    }
}

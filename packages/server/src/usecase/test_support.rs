//! Shared fixtures for usecase and session tests.

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use tayori_shared::time::SteppingClock;
use tokio::sync::Mutex;

use crate::{
    domain::{
        ConnectionId, MessageBody, MessagePushError, MessagePusher, PresenceRegistry,
        PusherChannel, RoomId, ServerEvent, UserId,
    },
    infrastructure::repository::{InMemoryMessageRepository, InMemoryUserRepository},
};

use super::{broadcaster::EventBroadcaster, read_state::ReadStateReconciler};

pub fn user(name: &str) -> UserId {
    UserId::new(name.to_string()).unwrap()
}

pub fn room(name: &str) -> RoomId {
    RoomId::new(name.to_string()).unwrap()
}

pub fn body(text: &str) -> MessageBody {
    MessageBody::new(text.to_string()).unwrap()
}

/// One pushed event and the connections it was addressed to.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub to: Vec<ConnectionId>,
    pub event: ServerEvent,
}

/// MessagePusher that records every event instead of writing frames.
#[derive(Default)]
pub struct RecordingPusher {
    registered: Mutex<HashSet<ConnectionId>>,
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingPusher {
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().await.clone()
    }

    pub async fn events(&self) -> Vec<ServerEvent> {
        self.deliveries
            .lock()
            .await
            .iter()
            .map(|d| d.event.clone())
            .collect()
    }

    /// Events addressed to `connection`, in push order.
    pub async fn received_by(&self, connection: &ConnectionId) -> Vec<ServerEvent> {
        self.deliveries
            .lock()
            .await
            .iter()
            .filter(|d| d.to.contains(connection))
            .map(|d| d.event.clone())
            .collect()
    }

    pub async fn is_registered(&self, connection: &ConnectionId) -> bool {
        self.registered.lock().await.contains(connection)
    }

    pub async fn clear(&self) {
        self.deliveries.lock().await.clear();
    }
}

#[async_trait]
impl MessagePusher for RecordingPusher {
    async fn register_connection(&self, connection: ConnectionId, _sender: PusherChannel) {
        self.registered.lock().await.insert(connection);
    }

    async fn unregister_connection(&self, connection: &ConnectionId) {
        self.registered.lock().await.remove(connection);
    }

    async fn push_to(
        &self,
        connection: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError> {
        self.deliveries.lock().await.push(Delivery {
            to: vec![*connection],
            event: event.clone(),
        });
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: &[ConnectionId],
        event: &ServerEvent,
    ) -> Result<(), MessagePushError> {
        self.deliveries.lock().await.push(Delivery {
            to: targets.to_vec(),
            event: event.clone(),
        });
        Ok(())
    }
}

/// In-memory stores, a recording pusher and a clock that ticks 1 ms per read.
pub struct Fixture {
    pub registry: PresenceRegistry,
    pub messages: Arc<InMemoryMessageRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub pusher: Arc<RecordingPusher>,
    pub broadcaster: EventBroadcaster,
    pub reconciler: Arc<ReadStateReconciler>,
    pub clock: Arc<SteppingClock>,
}

impl Fixture {
    pub fn new() -> Self {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let pusher = Arc::new(RecordingPusher::default());
        let broadcaster = EventBroadcaster::new(pusher.clone());
        let reconciler = Arc::new(ReadStateReconciler::new(
            messages.clone(),
            broadcaster.clone(),
        ));
        Self {
            registry: PresenceRegistry::new(),
            messages,
            users: Arc::new(InMemoryUserRepository::new()),
            pusher,
            broadcaster,
            reconciler,
            clock: Arc::new(SteppingClock::new(1_700_000_000_000, 1)),
        }
    }
}

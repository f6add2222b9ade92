//! Shared application state.

use std::sync::Arc;

use tayori_shared::time::Clock;

use crate::{
    domain::{
        MessagePusher, MessageRepository, PresenceRegistry, RoomAccessPolicy, UserRepository,
    },
    usecase::{
        AcknowledgeReadUseCase, ClearHistoryUseCase, EventBroadcaster, GetLastSeenUseCase,
        GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase, NotifyTypingUseCase,
        ReadStateReconciler, SendMessageUseCase,
    },
};

/// Ports the server is assembled from.
pub struct AppDependencies {
    pub messages: Arc<dyn MessageRepository>,
    pub users: Arc<dyn UserRepository>,
    pub access: Arc<dyn RoomAccessPolicy>,
    pub message_pusher: Arc<dyn MessagePusher>,
    pub clock: Arc<dyn Clock>,
    /// Number of messages sent as history on join
    pub history_limit: usize,
}

/// Shared application state
pub struct AppState {
    /// MessagePusher（接続の登録と解除に使う）
    pub message_pusher: Arc<dyn MessagePusher>,
    pub broadcaster: EventBroadcaster,
    pub join_room_usecase: JoinRoomUseCase,
    pub leave_room_usecase: LeaveRoomUseCase,
    pub send_message_usecase: SendMessageUseCase,
    pub acknowledge_read_usecase: AcknowledgeReadUseCase,
    pub notify_typing_usecase: NotifyTypingUseCase,
    pub clear_history_usecase: ClearHistoryUseCase,
    pub get_last_seen_usecase: GetLastSeenUseCase,
    pub get_rooms_usecase: GetRoomsUseCase,
}

impl AppState {
    /// Wire every use case around one presence registry.
    pub fn build(deps: AppDependencies) -> Self {
        let AppDependencies {
            messages,
            users,
            access,
            message_pusher,
            clock,
            history_limit,
        } = deps;

        let registry = PresenceRegistry::new();
        let broadcaster = EventBroadcaster::new(message_pusher.clone());
        let reconciler = Arc::new(ReadStateReconciler::new(
            messages.clone(),
            broadcaster.clone(),
        ));

        Self {
            join_room_usecase: JoinRoomUseCase::new(
                access,
                registry.clone(),
                messages.clone(),
                users.clone(),
                reconciler.clone(),
                broadcaster.clone(),
                clock.clone(),
                history_limit,
            ),
            leave_room_usecase: LeaveRoomUseCase::new(
                registry.clone(),
                users.clone(),
                broadcaster.clone(),
                clock.clone(),
            ),
            send_message_usecase: SendMessageUseCase::new(
                registry.clone(),
                messages,
                reconciler.clone(),
                broadcaster.clone(),
                clock.clone(),
            ),
            acknowledge_read_usecase: AcknowledgeReadUseCase::new(registry.clone(), reconciler),
            notify_typing_usecase: NotifyTypingUseCase::new(registry.clone(), broadcaster.clone()),
            clear_history_usecase: ClearHistoryUseCase::new(
                users.clone(),
                broadcaster.clone(),
                clock,
            ),
            get_last_seen_usecase: GetLastSeenUseCase::new(registry.clone(), users),
            get_rooms_usecase: GetRoomsUseCase::new(registry),
            message_pusher,
            broadcaster,
        }
    }
}

//! Tayori chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tayori-server
//! cargo run --bin tayori-server -- --host 0.0.0.0 --port 3000 --private-room staff=alice,bob
//! ```

use std::sync::Arc;

use clap::Parser;
use tayori_server::{
    infrastructure::{
        access::{PrivateRoom, StaticRoomAccessPolicy},
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryMessageRepository, InMemoryUserRepository},
    },
    ui::{AppDependencies, AppState, Server},
    usecase::DEFAULT_HISTORY_LIMIT,
};
use tayori_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "tayori-server")]
#[command(about = "Room chat server with presence and read receipts", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Number of messages sent as history when joining a room
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    history_limit: usize,

    /// Restrict a room to a member list, as ROOM=user1,user2 (repeatable)
    #[arg(long = "private-room", value_name = "ROOM=USERS")]
    private_rooms: Vec<PrivateRoom>,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_PKG_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. Access policy
    // 3. MessagePusher
    // 4. AppState (use cases)
    // 5. Server

    // 1. Create Repositories (in-memory)
    let messages = Arc::new(InMemoryMessageRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());

    // 2. Create access policy
    for private in &args.private_rooms {
        tracing::info!(
            "Room '{}' is private ({} member(s))",
            private.room,
            private.members.len()
        );
    }
    let access = Arc::new(StaticRoomAccessPolicy::with_private_rooms(
        args.private_rooms,
    ));

    // 3. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 4. Assemble use cases
    let state = AppState::build(AppDependencies {
        messages,
        users,
        access,
        message_pusher,
        clock: Arc::new(SystemClock),
        history_limit: args.history_limit,
    });

    // 5. Run the server
    let server = Server::new(state);
    if let Err(e) = server.run(&args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

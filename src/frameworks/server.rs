// Framework bootstrap for the sync server runtime.

use crate::domain::tuning::player::PlayerTuning;
use crate::domain::tuning::world::WorldTuning;
use crate::frameworks::config;
use crate::interface_adapters::hitbox::HitBoxTable;
use crate::interface_adapters::net::{spawn_session_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{Dispatcher, SessionHandle, SessionSettings};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state();
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state.clone());

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    let served = axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    });
    state.session.shutdown();
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Arc<AppState> {
    let settings = SessionSettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        broadcast_capacity: config::BROADCAST_CAPACITY,
        tick_interval: config::tick_interval(),
        dispatcher: Dispatcher::new(PlayerTuning::default(), config::occupied_slot_policy()),
        world: WorldTuning::default(),
    };
    tracing::debug!(
        tick_interval_ms = settings.tick_interval.as_millis(),
        occupied_slot_policy = ?settings.dispatcher.occupied_slot_policy,
        "session configured"
    );

    // One authoritative world task; every connection joins it.
    let session = SessionHandle::spawn(settings, Box::new(HitBoxTable::default()));
    spawn_session_serializer(&session);

    Arc::new(AppState { session })
}

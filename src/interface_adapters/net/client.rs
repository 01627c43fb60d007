use crate::domain::{PlayerId, SyncMessage};
use crate::interface_adapters::protocol::{self, CodecError, WireMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::conn_id;
use crate::use_cases::{Broadcast, GameEvent, SequencedFrame, SessionHandle};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    JoinRejected,
    JoinRequired,
    JoinTimeout,
    ClosedBeforeJoin,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_DISPLAY_NAME_LEN: usize = 32;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn frame_serializer(
    mut events_rx: broadcast::Receiver<Broadcast>,
    frames_tx: broadcast::Sender<SequencedFrame>,
) {
    // Serialize each applied message once and broadcast the shared bytes.
    loop {
        match events_rx.recv().await {
            Ok(Broadcast { seq, message }) => {
                let txt = match protocol::encode_sync(message) {
                    Ok(txt) => txt,
                    Err(e) => {
                        // Connections see the missing seq and close for a rejoin.
                        error!(seq, error = ?e, "failed to serialize sync message");
                        continue;
                    }
                };
                // No connections is fine; late joiners get a resync instead.
                let _ = frames_tx.send(SequencedFrame {
                    seq,
                    bytes: Utf8Bytes::from(txt),
                });
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                // The next frame skips seqs, so every connection closes for a rejoin.
                error!(missed = n, "frame serializer lagged; messages lost");
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("sync message channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_session_serializer(session: &SessionHandle) {
    tokio::spawn(frame_serializer(
        session.events_tx.subscribe(),
        session.frames_tx.clone(),
    ));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let session = state.session.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, session))
}

async fn handle_socket(socket: WebSocket, session: SessionHandle) {
    // Separate connection id for correlating logs before/after a player_id exists.
    let conn_id = conn_id();
    let span = info_span!("conn", conn_id, player_id = tracing::field::Empty);
    serve_connection(socket, session).instrument(span).await;
}

async fn serve_connection(mut socket: WebSocket, session: SessionHandle) {
    let mut ctx = match bootstrap_connection(&mut socket, &session).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = send_close_with_reason(&mut socket, close_code::POLICY, "bootstrap failed")
                .await;
            return;
        }
    };

    Span::current().record("player_id", ctx.player_id);
    info!(
        player_id = ctx.player_id,
        display_name = %ctx.display_name,
        as_of_seq = ctx.last_seq,
        "client connected"
    );

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &WireMessage) -> Result<usize, NetError> {
    let txt = protocol::encode(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    pub player_id: PlayerId,
    pub display_name: String,
    pub input_tx: mpsc::Sender<GameEvent>,
    pub frames_rx: broadcast::Receiver<SequencedFrame>,
    // Last seq this client has seen, through the resync or a forwarded frame.
    pub last_seq: u64,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,
    pub rejected_intents: u64,

    pub last_input_full_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

#[derive(Debug)]
struct JoinHandshake {
    display_name: String,
    bytes_in: u64,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    session: &SessionHandle,
) -> Result<ConnCtx, NetError> {
    // Subscribe before joining so nothing published after the resync is missed.
    let frames_rx = session.frames_tx.subscribe();

    let join = match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(socket)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    // The world task assigns the id and cuts the resync in the same step.
    let (reply, accepted_rx) = oneshot::channel();
    session
        .input_tx
        .send(GameEvent::Join { reply })
        .await
        .map_err(|_| NetError::InputClosed)?;
    let accepted = accepted_rx.await.map_err(|_| NetError::JoinRejected)?;
    let player_id = accepted.player_id;

    let mut msgs_out = 0;
    let mut bytes_out = 0;
    let mut initial = Vec::with_capacity(accepted.resync.len() + 1);
    initial.push(WireMessage::Identity { player_id });
    initial.extend(accepted.resync.into_iter().map(WireMessage::from));
    for message in &initial {
        match send_message(socket, message).await {
            Ok(bytes) => {
                msgs_out += 1;
                bytes_out += bytes as u64;
            }
            Err(err) => {
                // Compensate so the player does not linger without a connection.
                session
                    .input_tx
                    .send(GameEvent::Leave { player_id })
                    .await
                    .map_err(|_| NetError::InputClosed)?; // InputClosed takes precedence
                return Err(err);
            }
        }
    }

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        display_name: join.display_name,
        input_tx: session.input_tx.clone(),
        frames_rx,
        last_seq: accepted.as_of_seq,

        msgs_in: 1,
        msgs_out,
        bytes_in: join.bytes_in,
        bytes_out,

        invalid_json: 0,
        rejected_intents: 0,

        last_input_full_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

async fn read_join_handshake(socket: &mut WebSocket) -> Result<JoinHandshake, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        let message = incoming.map_err(NetError::Ws)?;
        match message {
            Message::Text(text) => {
                let bytes_in = text.len() as u64;
                let display_name = match protocol::decode(&text) {
                    Ok(WireMessage::Join { display_name }) => display_name,
                    Ok(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        return Err(NetError::JoinRequired);
                    }
                    Err(CodecError::UnsupportedVersion(v)) => {
                        debug!(version = v, "join with unsupported protocol version");
                        let _ = send_close_with_reason(
                            socket,
                            close_code::PROTOCOL,
                            "unsupported protocol version",
                        )
                        .await;
                        return Err(NetError::JoinRequired);
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        return Err(NetError::JoinRequired);
                    }
                };

                return Ok(JoinHandshake {
                    display_name: display_name.trim().chars().take(MAX_DISPLAY_NAME_LEN).collect(),
                    bytes_in,
                });
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum FrameOrder {
    AlreadySent,
    Next,
    Gap { missing: u64 },
}

// Frames must arrive with consecutive seqs; anything else means the client's view has a hole.
fn frame_order(last_seq: u64, seq: u64) -> FrameOrder {
    if seq <= last_seq {
        FrameOrder::AlreadySent
    } else if seq == last_seq + 1 {
        FrameOrder::Next
    } else {
        FrameOrder::Gap {
            missing: seq - last_seq - 1,
        }
    }
}

fn rejoin_close_frame() -> CloseFrame {
    CloseFrame {
        code: close_code::AGAIN,
        reason: "lagged behind; rejoin".into(),
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

// Clients speak only for themselves, and only with intents.
fn admit_intent(player_id: PlayerId, message: &SyncMessage) -> bool {
    message.is_client_intent() && message.player_id() == Some(player_id)
}

fn process_intent_message(
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    message: SyncMessage,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match input_tx.try_send(GameEvent::Intent { player_id, message }) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            if should_log(last_input_full_log) {
                warn!(player_id, "input channel full; dropping intent");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        input_tx,
        frames_rx,
        last_seq,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        rejected_intents,
        last_input_full_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    player_id,
                    input_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    rejected_intents,
                    last_input_full_log,
                    last_invalid_input_log,
                    close_frame,
                ) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            frame = frames_rx.recv() => {
                match frame {
                    Ok(frame) => match frame_order(*last_seq, frame.seq) {
                        // Already part of the resync.
                        FrameOrder::AlreadySent => false,
                        FrameOrder::Next => {
                            *last_seq = frame.seq;
                            match forward_frame(frame.bytes, socket, msgs_out, bytes_out).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                        FrameOrder::Gap { missing } => {
                            // Frames were lost upstream of this connection.
                            warn!(player_id, last_seq = *last_seq, seq = frame.seq, missing, "gap in sync stream; disconnecting");
                            *close_frame = Some(rejoin_close_frame());
                            true
                        }
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // A gap cannot be patched; the client rejoins for a fresh resync.
                        warn!(player_id, missed = n, "client lagged behind sync stream; disconnecting");
                        *close_frame = Some(rejoin_close_frame());
                        true
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!(player_id, "sync stream closed; disconnecting");
                        *close_frame = Some(CloseFrame {
                            code: close_code::AWAY,
                            reason: "session ended".into(),
                        });
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(
        player_id,
        input_tx,
        *msgs_in,
        *msgs_out,
        *bytes_in,
        *bytes_out,
        *invalid_json,
        *rejected_intents,
    )
    .await
    {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    rejected_intents: &mut u64,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match protocol::decode(&text) {
                    Ok(WireMessage::Join { .. }) => {
                        // Ignore repeated Join packets after bootstrap to keep the session stable.
                        if should_log(last_invalid_input_log) {
                            warn!(player_id, "duplicate join ignored");
                        }
                        Ok(LoopControl::Continue)
                    }
                    Ok(wire) => {
                        let Some(message) = wire
                            .into_sync()
                            .filter(|message| admit_intent(player_id, message))
                        else {
                            *rejected_intents += 1;
                            if should_log(last_invalid_input_log) {
                                warn!(player_id, "message not allowed from client; dropping");
                            }
                            return Ok(LoopControl::Continue);
                        };
                        process_intent_message(player_id, input_tx, message, last_input_full_log)
                    }
                    Err(CodecError::UnknownVariant(kind)) => {
                        // Newer clients may send types this server does not know.
                        if should_log(last_invalid_input_log) {
                            debug!(player_id, %kind, "unknown message type ignored");
                        }
                        Ok(LoopControl::Continue)
                    }
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_frame(
    bytes: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = bytes.len();
    match socket
        .send(Message::Text(bytes))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send sync frame");
            LoopControl::Disconnect
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn disconnect_cleanup(
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    rejected_intents: u64,
) -> Result<(), NetError> {
    input_tx
        .send(GameEvent::Leave { player_id })
        .await
        .map_err(|_| NetError::InputClosed)?;

    debug!(
        player_id,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        rejected_intents,
        "connection stats"
    );
    info!(player_id, "client disconnected");
    Ok(())
}

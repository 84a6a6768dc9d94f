//! Loopback chat server and scripted resolver for tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::client::ChatEvent;
use crate::error::ResolveError;
use crate::protocol::{encode_frame, ServiceCode};
use crate::resolver::{Endpoint, EndpointResolver};

pub(crate) type ServerSocket = WebSocketStream<TcpStream>;

/// Websocket server on an ephemeral local port
pub(crate) struct FakeServer {
    listener: TcpListener,
    port: u16,
}

impl FakeServer {
    pub(crate) async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        Self { listener, port }
    }

    pub(crate) fn endpoint(&self, room_id: &str) -> Endpoint {
        Endpoint {
            socket_url: format!("ws://127.0.0.1:{}/Websocket", self.port),
            room_id: room_id.to_string(),
        }
    }

    /// Accept one client, answering with the `chat` sub-protocol
    pub(crate) async fn accept(&self) -> ServerSocket {
        let (stream, _) = self.listener.accept().await.unwrap();
        let callback = |_req: &Request, mut resp: Response| -> Result<Response, ErrorResponse> {
            resp.headers_mut()
                .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static("chat"));
            Ok(resp)
        };
        tokio_tungstenite::accept_hdr_async(stream, callback)
            .await
            .unwrap()
    }
}

/// Next binary frame from the client, `None` once it closes
pub(crate) async fn recv_frame(ws: &mut ServerSocket) -> Option<Vec<u8>> {
    while let Some(msg) = ws.next().await {
        match msg {
            Ok(Message::Binary(data)) => return Some(data),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
    None
}

pub(crate) async fn send_frame(ws: &mut ServerSocket, service: ServiceCode, body: &str) {
    let frame = encode_frame(service, body.as_bytes()).unwrap();
    ws.send(Message::Binary(frame.to_vec())).await.unwrap();
}

/// Next event, failing the test after five seconds
pub(crate) async fn next_event(rx: &mut UnboundedReceiver<ChatEvent>) -> ChatEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Resolver that replays queued results, then repeats a fallback
pub(crate) struct ScriptedResolver {
    queued: Mutex<VecDeque<Result<Endpoint, ResolveError>>>,
    fallback: Result<Endpoint, ResolveError>,
    calls: AtomicUsize,
}

impl ScriptedResolver {
    pub(crate) fn new(fallback: Result<Endpoint, ResolveError>) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn then(self, result: Result<Endpoint, ResolveError>) -> Self {
        self.queued.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EndpointResolver for ScriptedResolver {
    async fn resolve(&self, _streamer_id: &str) -> Result<Endpoint, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.queued.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Collect events up to and including the first one matching `done`
pub(crate) async fn events_until<F>(rx: &mut UnboundedReceiver<ChatEvent>, done: F) -> Vec<ChatEvent>
where
    F: Fn(&ChatEvent) -> bool,
{
    let mut seen = Vec::new();
    loop {
        let event = next_event(rx).await;
        let stop = done(&event);
        seen.push(event);
        if stop {
            return seen;
        }
    }
}

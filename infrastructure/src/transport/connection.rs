//! WebSocket connection manager
//!
//! Owns the persistent chat connection. A supervisor task connects, pumps
//! frames in both directions while the socket is up, and on any close waits a
//! fixed interval and connects again, for as long as the manager lives. Only
//! [`close`](ChatTransport::close) stops it.
//!
//! The handshake carries the session cookie from the shared cookie jar, so the
//! server sees the same login as the HTTP API.

use crate::transport::error::ConnectionError;
use crate::transport::protocol::parse_frame;
use futures::{SinkExt, StreamExt};
use parley_application::ports::transport::{ChatTransport, TransportError, TransportEvent};
use parley_domain::{ConnectionState, OutgoingFrame};
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connection tuning
#[derive(Clone)]
pub struct ConnectionSettings {
    /// Fixed delay before each reconnect attempt. There is no ceiling.
    pub reconnect_interval: Duration,
    /// Cookie store shared with the HTTP clients.
    pub cookies: Option<Arc<Jar>>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            reconnect_interval: Duration::from_millis(3000),
            cookies: None,
        }
    }
}

impl ConnectionSettings {
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn with_cookies(mut self, jar: Arc<Jar>) -> Self {
        self.cookies = Some(jar);
        self
    }
}

/// Persistent chat connection with automatic reconnect
pub struct ConnectionManager {
    url: Url,
    /// `url` with an http(s) scheme, for cookie lookups.
    cookie_url: Url,
    settings: ConnectionSettings,
    state: watch::Sender<ConnectionState>,
    /// Outbox of the live socket; `None` between connections.
    writer: Mutex<Option<mpsc::UnboundedSender<String>>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    /// Start connecting to `url` in the background.
    ///
    /// Returns the manager and the stream of state changes and well-formed
    /// frames, in arrival order.
    pub fn open(
        url: &str,
        settings: ConnectionSettings,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<TransportEvent>), ConnectionError> {
        let parsed = Url::parse(url).map_err(|e| ConnectionError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let cookie_url = cookie_url_for(&parsed).ok_or_else(|| ConnectionError::InvalidUrl {
            url: url.to_string(),
            reason: "scheme must be ws or wss".to_string(),
        })?;

        let (events, rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ConnectionState::Closed);
        let manager = Arc::new(Self {
            url: parsed,
            cookie_url,
            settings,
            state,
            writer: Mutex::new(None),
            events,
            shutdown: CancellationToken::new(),
        });
        tokio::spawn(Arc::clone(&manager).supervise());
        Ok((manager, rx))
    }

    /// Watch state changes without consuming the event stream.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    async fn supervise(self: Arc<Self>) {
        loop {
            self.set_state(ConnectionState::Connecting);
            let attempt = tokio::select! {
                _ = self.shutdown.cancelled() => None,
                result = self.connect() => Some(result),
            };
            match attempt {
                Some(Ok(stream)) => {
                    info!("Connected to {}", self.url);
                    self.pump(stream).await;
                }
                Some(Err(e)) => warn!("Connection to {} failed: {}", self.url, e),
                None => {}
            }
            self.set_state(ConnectionState::Closed);

            if self.shutdown.is_cancelled() {
                break;
            }
            info!(
                "Reconnecting in {} ms",
                self.settings.reconnect_interval.as_millis()
            );
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.settings.reconnect_interval) => {}
            }
        }
        debug!("Connection supervisor stopped");
    }

    async fn connect(&self) -> Result<WsStream, ConnectionError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(ConnectionError::from_tungstenite)?;
        if let Some(cookie) = self
            .settings
            .cookies
            .as_ref()
            .and_then(|jar| jar.cookies(&self.cookie_url))
        {
            request.headers_mut().insert(COOKIE, cookie);
        }
        let (stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(ConnectionError::from_tungstenite)?;
        Ok(stream)
    }

    /// Move frames until the socket closes or shutdown is requested.
    async fn pump(&self, stream: WsStream) {
        let (mut write, mut read) = stream.split();
        let (tx, mut outbox) = mpsc::unbounded_channel::<String>();
        self.set_writer(Some(tx));
        self.set_state(ConnectionState::Open);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    self.set_state(ConnectionState::Closing);
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
                Some(text) = outbox.recv() => {
                    trace!("-> {}", text);
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        warn!("Write failed, frame lost: {}", e);
                        break;
                    }
                }
                incoming = read.next() => match incoming {
                    Some(Ok(Message::Text(text))) => self.dispatch(text.as_str()),
                    Some(Ok(Message::Close(frame))) => {
                        debug!("Server closed the connection: {:?}", frame);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(tungstenite::Error::ConnectionClosed)) | None => break,
                    Some(Err(e)) => {
                        warn!("Read failed: {}", e);
                        break;
                    }
                },
            }
        }
        self.set_writer(None);
        let unsent = drain_unsent(&mut outbox);
        if unsent > 0 {
            warn!("Connection lost with {} queued frame(s) unsent", unsent);
        }
    }

    fn dispatch(&self, text: &str) {
        trace!("<- {}", text);
        match parse_frame(text) {
            Ok(frame) => {
                let _ = self.events.send(TransportEvent::Frame(frame));
            }
            Err(e) => warn!("Dropping malformed frame ({}): {}", e, text),
        }
    }

    fn set_state(&self, next: ConnectionState) {
        let current = *self.state.borrow();
        if current == next {
            return;
        }
        match current.transition(next) {
            Ok(state) => {
                debug!("Connection {} -> {}", current, state);
                self.state.send_replace(state);
                let _ = self.events.send(TransportEvent::StateChanged(state));
            }
            Err(e) => warn!("Ignoring connection state change: {}", e),
        }
    }

    fn set_writer(&self, writer: Option<mpsc::UnboundedSender<String>>) {
        let mut guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        *guard = writer;
    }
}

impl ChatTransport for ConnectionManager {
    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn send(&self, frame: &OutgoingFrame) -> Result<(), TransportError> {
        let state = self.state();
        if !state.accepts_sends() {
            return Err(TransportError::NotOpen(state));
        }
        let text =
            serde_json::to_string(frame).map_err(|e| TransportError::Serialization(e.to_string()))?;
        let guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(outbox) => outbox.send(text).map_err(|_| TransportError::Closed),
            None => Err(TransportError::NotOpen(state)),
        }
    }

    fn close(&self) {
        debug!("Connection marked for close");
        self.shutdown.cancel();
    }
}

/// Close `outbox` and count the frames that never reached the socket.
fn drain_unsent(outbox: &mut mpsc::UnboundedReceiver<String>) -> usize {
    outbox.close();
    let mut count = 0;
    while outbox.try_recv().is_ok() {
        count += 1;
    }
    count
}

/// The http(s) twin of a ws(s) URL.
fn cookie_url_for(url: &Url) -> Option<Url> {
    let scheme = match url.scheme() {
        "ws" => "http",
        "wss" => "https",
        _ => return None,
    };
    let mut http = url.clone();
    http.set_scheme(scheme).ok()?;
    Some(http)
}

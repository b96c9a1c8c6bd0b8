//! The APNs gateway client: maintains a single TLS connection, tracks sent
//! notifications for resend-on-error, and runs a background reader that
//! watches for the gateway's error-response frame.

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::history::{History, SentNotification};
use crate::protocol::constants::{
    DEFAULT_PRIORITY, READER_ALIVE_TIMEOUT, READER_TAIL_SLEEP, WAIT_WRITE_TIMEOUT,
    WRITE_RETRY, WRITE_RETRY_BACKOFF_BASE_SECS,
};
use crate::protocol::frame::{Frame, Notification};
use crate::protocol::payload::Payload;
use crate::reader::spawn_reader;
use crate::status::ErrorResponse;
use crate::tls::Connection;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Mutable state shared between the public [`GatewayClient`] handle and the
/// background [`crate::reader::ErrorReader`] task.
///
/// A single re-entrant lock in the reference implementation guards the
/// socket, the send history, and the liveness flag together; here that
/// becomes one plain (non-reentrant) `Mutex` around a struct holding all
/// three, so every caller takes the lock exactly once per operation.
pub struct GatewayState {
    pub(crate) conn: Option<Connection>,
    pub(crate) config: GatewayConfig,
    pub(crate) history: History,
    pub(crate) last_activity: Instant,
}

impl GatewayState {
    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

/// One notification queued into a [`GatewayClient::send_multiple`] call.
#[derive(Debug, Clone, Copy)]
pub struct NotificationRequest<'a> {
    pub token: [u8; 32],
    pub payload: &'a Payload,
    pub identifier: Option<u32>,
    pub expiry: u32,
    pub priority: u8,
}

/// Handle to a lazily-connecting APNs gateway connection: constructing one
/// never touches the network, it only arms the state a later `send` drives
/// from Disconnected to Alive.
pub struct GatewayClient {
    state: Arc<Mutex<GatewayState>>,
    identifiers: Arc<AtomicU32>,
    responses: broadcast::Sender<ErrorResponse>,
    cancel: CancellationToken,
    reader: Mutex<tokio::task::JoinHandle<()>>,
    reader_alive: Arc<AtomicBool>,
}

impl GatewayClient {
    /// Build a gateway client for `config`. The TLS connection is opened
    /// lazily, by the first `send`/`send_multiple` call; this constructor
    /// only starts the background error-response reader.
    pub fn new(config: GatewayConfig) -> Self {
        let state = Arc::new(Mutex::new(GatewayState {
            conn: None,
            config,
            history: History::default(),
            last_activity: Instant::now(),
        }));
        let (responses, _) = broadcast::channel(1024);
        let cancel = CancellationToken::new();
        let reader_alive = Arc::new(AtomicBool::new(false));
        let reader = spawn_reader(state.clone(), responses.clone(), cancel.clone(), reader_alive.clone());

        Self {
            state,
            identifiers: Arc::new(AtomicU32::new(1)),
            responses,
            cancel,
            reader: Mutex::new(reader),
            reader_alive,
        }
    }

    /// Connect eagerly: like [`GatewayClient::new`], but opens the TLS
    /// connection immediately so a caller can surface a connect-time failure
    /// up front instead of on the first send.
    pub async fn connect(config: GatewayConfig) -> Result<Self> {
        let client = Self::new(config);
        {
            let mut state = client.state.lock().await;
            client.ensure_connected(&mut state).await?;
        }
        Ok(client)
    }

    /// Subscribe to delivery failures reported by the gateway's
    /// error-response frame.
    pub fn register_response_listener(&self) -> broadcast::Receiver<ErrorResponse> {
        self.responses.subscribe()
    }

    fn next_identifier(&self, requested: Option<u32>) -> u32 {
        resolve_identifier(&self.identifiers, requested)
    }

    /// Send a single notification. `identifier` of `None` (or `Some(0)`)
    /// requests an auto-generated identifier.
    pub async fn send(
        &self,
        token: [u8; 32],
        payload: &Payload,
        identifier: Option<u32>,
        expiry: u32,
        priority: u8,
    ) -> Result<u32> {
        let identifier = self.next_identifier(identifier);
        let mut frame = Frame::new();
        frame.add(&Notification {
            token,
            payload,
            identifier,
            expiry,
            priority,
        });

        self.write_with_retry(frame.bytes()).await?;
        self.record_sent(frame.items()).await;

        Ok(identifier)
    }

    /// Send several notifications batched into a single frame write.
    pub async fn send_multiple(&self, notifications: &[NotificationRequest<'_>]) -> Result<Vec<u32>> {
        let mut frame = Frame::new();
        let mut identifiers = Vec::with_capacity(notifications.len());
        for request in notifications {
            let identifier = self.next_identifier(request.identifier);
            identifiers.push(identifier);
            frame.add(&Notification {
                token: request.token,
                payload: request.payload,
                identifier,
                expiry: request.expiry,
                priority: request.priority,
            });
        }

        self.write_with_retry(frame.bytes()).await?;
        self.record_sent(frame.items()).await;

        Ok(identifiers)
    }

    /// Record every notification in a just-written frame into the send
    /// history, reading the records back from the frame itself rather than
    /// re-deriving them, so the history always matches what was encoded.
    async fn record_sent<'a>(&self, items: impl Iterator<Item = &'a Notification<'a>>) {
        let mut state = self.state.lock().await;
        for item in items {
            state.history.push(SentNotification {
                identifier: item.identifier,
                token: item.token,
                payload_json: item.payload.json().to_vec(),
                expiry: item.expiry,
                priority: item.priority,
            });
        }
        state.touch();
    }

    /// Ensure the background error reader is running, spawning a replacement
    /// if it exited, then wait up to [`READER_ALIVE_TIMEOUT`] for it to
    /// report itself alive before a write proceeds.
    async fn ensure_reader_running(&self) {
        {
            let mut reader = self.reader.lock().await;
            if reader.is_finished() {
                info!("error reader absent, respawning");
                self.reader_alive.store(false, Ordering::SeqCst);
                *reader = spawn_reader(
                    self.state.clone(),
                    self.responses.clone(),
                    self.cancel.clone(),
                    self.reader_alive.clone(),
                );
            }
        }

        let deadline = Instant::now() + READER_ALIVE_TIMEOUT;
        while !self.reader_alive.load(Ordering::SeqCst) {
            if Instant::now() >= deadline {
                warn!("error reader did not report alive within timeout");
                break;
            }
            tokio::time::sleep(READER_TAIL_SLEEP).await;
        }
    }

    async fn write_with_retry(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_reader_running().await;

        let mut attempt = 0;
        loop {
            let result = {
                let mut state = self.state.lock().await;
                match self.ensure_connected(&mut state).await {
                    Ok(()) => {
                        let conn = state.conn.as_mut().expect("ensure_connected established a connection");
                        conn.write_all(bytes, WAIT_WRITE_TIMEOUT).await
                    }
                    Err(e) => Err(e),
                }
            };
            match result {
                Ok(()) => return Ok(()),
                Err(e) if attempt + 1 < WRITE_RETRY => {
                    warn!(attempt, error = %e, "send failed, retrying");
                    attempt += 1;
                    {
                        let mut state = self.state.lock().await;
                        state.conn = None;
                    }
                    let backoff = Duration::from_secs(WRITE_RETRY_BACKOFF_BASE_SECS + 2 * attempt as u64);
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    // §7: a write that still fails once retries are
                    // exhausted is logged and dropped, not surfaced.
                    warn!(error = %e, "send failed after exhausting retries, dropping");
                    return Ok(());
                }
            }
        }
    }

    async fn ensure_connected(&self, state: &mut GatewayState) -> Result<()> {
        if state.conn.is_some() {
            return Ok(());
        }
        info!(host = %state.config.host, "reconnecting to gateway");
        let conn = Connection::open_with_root_ca(
            &state.config.host,
            state.config.port,
            &state.config.identity,
            state.config.connect_timeout,
            state.config.root_ca_pem.as_deref(),
        )
        .await?;
        state.conn = Some(conn);
        Ok(())
    }

    /// Tear down the connection and stop the background reader.
    pub async fn close(self) -> Result<()> {
        self.cancel.cancel();
        let handle = self.reader.into_inner();
        let _ = handle.await;
        let mut state = self.state.lock().await;
        if let Some(conn) = state.conn.as_mut() {
            conn.close().await;
        }
        state.conn = None;
        state.history.clear();
        Ok(())
    }
}

impl Drop for GatewayClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// The priority APNs uses when none is specified: immediate delivery.
pub const fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

/// Resolve a caller-requested identifier, generating one from `counter` when
/// the caller passed `None` or the reserved `Some(0)`.
fn resolve_identifier(counter: &AtomicU32, requested: Option<u32>) -> u32 {
    match requested {
        Some(0) | None => counter.fetch_add(1, Ordering::Relaxed),
        Some(id) => id,
    }
}

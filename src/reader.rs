//! Background task that watches the gateway connection for the
//! APNs error-response frame and drives the resend protocol.
//!
//! The reference implementation runs this as a subclassed `Thread` with a
//! `_close_signal` flag it polls each iteration; here the same loop shape is
//! expressed as a `tokio::spawn`ed task cooperatively cancelled via a
//! [`CancellationToken`], holding only a shared handle to the gateway's
//! state — never a reference back to the public `GatewayClient` API, so the
//! task and the client cannot keep each other alive.
//!
//! The task itself models the Reader-Alive/Reader-Absent states: it flips
//! `alive` to `true` once its loop is running, and back to `false` just
//! before returning — on cancellation, or on an idle timeout, which ends the
//! task rather than just dropping the connection. `GatewayClient` polls
//! `alive` and respawns the task if it's ever found absent.

use crate::gateway::GatewayState;
use crate::protocol::constants::{ERROR_RESPONSE_LENGTH, IDLE_TIMEOUT, READER_TAIL_SLEEP};
use crate::status::{ApnsStatus, ErrorResponse};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub(crate) fn spawn_reader(
    state: Arc<Mutex<GatewayState>>,
    responses: broadcast::Sender<ErrorResponse>,
    cancel: CancellationToken,
    alive: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(state, responses, cancel, alive))
}

async fn run(
    state: Arc<Mutex<GatewayState>>,
    responses: broadcast::Sender<ErrorResponse>,
    cancel: CancellationToken,
    alive: Arc<AtomicBool>,
) {
    alive.store(true, Ordering::SeqCst);

    loop {
        if cancel.is_cancelled() {
            info!("error reader stopping: cancelled");
            alive.store(false, Ordering::SeqCst);
            return;
        }

        let idle_for = {
            let guard = state.lock().await;
            guard.last_activity.elapsed()
        };
        if idle_for >= IDLE_TIMEOUT {
            let mut guard = state.lock().await;
            if let Some(conn) = guard.conn.as_mut() {
                info!(?idle_for, "closing idle gateway connection");
                conn.close().await;
            }
            guard.conn = None;
            drop(guard);
            info!("error reader exiting after idle timeout, reader now absent");
            alive.store(false, Ordering::SeqCst);
            return;
        }

        // The read attempt below holds the state lock only for
        // `READER_TAIL_SLEEP`, not the full error-response read timeout:
        // `send()`/`send_multiple()` need the lock too, and a multi-second
        // hold here would stall every write while idly polling for a
        // response that may never come.
        let mut buf = [0u8; ERROR_RESPONSE_LENGTH];
        let read = {
            let mut guard = state.lock().await;
            match guard.conn.as_mut() {
                Some(conn) => conn.try_read_exact(&mut buf, READER_TAIL_SLEEP).await,
                None => {
                    drop(guard);
                    tokio::time::sleep(READER_TAIL_SLEEP).await;
                    continue;
                }
            }
        };

        match read {
            Ok(true) => {
                let status = ApnsStatus::from(buf[1]);
                let identifier = u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]);
                warn!(?status, identifier, "gateway reported an error response");
                let response = ErrorResponse { status, identifier };
                let _ = responses.send(response);

                let to_resend = {
                    let mut guard = state.lock().await;
                    if let Some(conn) = guard.conn.as_mut() {
                        conn.close().await;
                    }
                    guard.conn = None;
                    guard.history.drain_after(identifier)
                };

                if !to_resend.is_empty() {
                    info!(count = to_resend.len(), "resending notifications after error response");
                    if let Err(e) = resend_all(&state, to_resend).await {
                        warn!(error = %e, "failed to resend after error response");
                    }
                }
            }
            Ok(false) => {
                // Nothing available before the read timeout; loop and
                // re-check idle/cancellation state.
            }
            Err(e) => {
                warn!(error = %e, "error reader read failed, dropping connection");
                let mut guard = state.lock().await;
                if let Some(conn) = guard.conn.as_mut() {
                    conn.close().await;
                }
                guard.conn = None;
            }
        }

        tokio::time::sleep(READER_TAIL_SLEEP).await;
    }
}

async fn resend_all(
    state: &Arc<Mutex<GatewayState>>,
    entries: Vec<crate::history::SentNotification>,
) -> crate::error::Result<()> {
    use crate::protocol::frame::{Frame, Notification};
    use crate::protocol::payload::Payload;
    use crate::protocol::constants::WAIT_WRITE_TIMEOUT;

    for entry in entries {
        let payload = Payload::raw(entry.payload_json.clone());
        let mut frame = Frame::new();
        frame.add(&Notification {
            token: entry.token,
            payload: &payload,
            identifier: entry.identifier,
            expiry: entry.expiry,
            priority: entry.priority,
        });

        let mut guard = state.lock().await;
        if guard.conn.is_none() {
            let config = guard.config.clone();
            let conn = crate::tls::Connection::open_with_root_ca(
                &config.host,
                config.port,
                &config.identity,
                config.connect_timeout,
                config.root_ca_pem.as_deref(),
            )
            .await?;
            guard.conn = Some(conn);
        }
        let conn = guard.conn.as_mut().expect("connection established above");
        conn.write_all(frame.bytes(), WAIT_WRITE_TIMEOUT).await?;
        guard.history.push(entry);
    }
    Ok(())
}

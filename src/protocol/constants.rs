//! Wire-level constants for the legacy APNs binary protocol.

use std::time::Duration;

/// Maximum size, in bytes, of a UTF-8 encoded [`crate::payload::Payload`] JSON body.
pub const MAX_PAYLOAD_LENGTH: usize = 4096;

/// Device tokens are always 32 bytes on the wire (64 hex characters).
pub const TOKEN_LENGTH: usize = 32;

/// `0x08 status identifier` error-response frame length.
pub const ERROR_RESPONSE_LENGTH: usize = 6;

/// Capacity of the gateway's send-history ring.
pub const SENT_BUFFER_QTY: usize = 100_000;

/// How long a write waits for the socket to become writable.
pub const WAIT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the error reader waits for the socket to become readable.
pub const WAIT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Retries for `send()` on transient socket errors.
pub const WRITE_RETRY: u32 = 3;

/// Base delay, in seconds, between write retries: `10 + 2*attempt`, giving
/// the error reader time to observe and act on a pending error-response
/// before the next write lands.
pub const WRITE_RETRY_BACKOFF_BASE_SECS: u64 = 10;

/// How long a connection may sit idle before the reader tears it down.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a write path waits for the error reader to report itself alive.
pub const READER_ALIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Tail sleep in the error-reader loop, to avoid a tight spin on persistent failure.
pub const READER_TAIL_SLEEP: Duration = Duration::from_millis(100);

/// Delay between resent notifications (kept at zero, matching the reference).
pub const RESEND_DELAY: Duration = Duration::from_millis(0);

/// Command byte: legacy (non-enhanced) notification.
pub const COMMAND_LEGACY: u8 = 0;

/// Command byte: enhanced notification (identifier + expiry).
pub const COMMAND_ENHANCED: u8 = 1;

/// Command byte: Command 2 frame (tagged items).
pub const COMMAND_FRAME: u8 = 2;

/// Command byte: APNs error-response.
pub const COMMAND_ERROR_RESPONSE: u8 = 8;

/// Command 2 item tag: device token.
pub const ITEM_TAG_TOKEN: u8 = 1;
/// Command 2 item tag: JSON payload.
pub const ITEM_TAG_PAYLOAD: u8 = 2;
/// Command 2 item tag: notification identifier.
pub const ITEM_TAG_IDENTIFIER: u8 = 3;
/// Command 2 item tag: expiration date.
pub const ITEM_TAG_EXPIRY: u8 = 4;
/// Command 2 item tag: priority.
pub const ITEM_TAG_PRIORITY: u8 = 5;

/// Production APNs gateway host.
pub const GATEWAY_HOST_PRODUCTION: &str = "gateway.push.apple.com";
/// Sandbox APNs gateway host.
pub const GATEWAY_HOST_SANDBOX: &str = "gateway.sandbox.push.apple.com";
/// APNs gateway port.
pub const GATEWAY_PORT: u16 = 2195;

/// Production APNs Feedback host.
pub const FEEDBACK_HOST_PRODUCTION: &str = "feedback.push.apple.com";
/// Sandbox APNs Feedback host.
pub const FEEDBACK_HOST_SANDBOX: &str = "feedback.sandbox.push.apple.com";
/// APNs Feedback port.
pub const FEEDBACK_PORT: u16 = 2196;

/// Feedback chunk read size.
pub const FEEDBACK_CHUNK_SIZE: usize = 4096;

/// Default priority (immediate delivery).
pub const DEFAULT_PRIORITY: u8 = 10;

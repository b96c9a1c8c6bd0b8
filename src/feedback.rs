//! Client for APNs's Feedback service: a stream of `(device token, failure
//! time)` pairs for tokens the gateway has stopped accepting.

use crate::config::FeedbackConfig;
use crate::error::Result;
use crate::protocol::codec::encode_token_hex;
use crate::protocol::constants::{FEEDBACK_CHUNK_SIZE, TOKEN_LENGTH, WAIT_READ_TIMEOUT};
use crate::tls::Connection;
use chrono::{DateTime, TimeZone, Utc};
use futures::Stream;

/// One record read from the Feedback service: `fail_time token_length token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub token_hex: String,
    pub fail_time: DateTime<Utc>,
}

/// A connection to the APNs Feedback service.
pub struct FeedbackClient {
    conn: Connection,
}

impl FeedbackClient {
    /// Connect to the Feedback service named by `config`.
    pub async fn connect(config: &FeedbackConfig) -> Result<Self> {
        let conn = Connection::open_with_root_ca(
            &config.host,
            config.port,
            &config.identity,
            config.connect_timeout,
            config.root_ca_pem.as_deref(),
        )
        .await?;
        Ok(Self { conn })
    }

    /// Read every feedback record currently buffered by the service.
    ///
    /// The Feedback service sends its records and then closes the
    /// connection; this drains everything available and returns once the
    /// peer closes or a read yields nothing.
    pub async fn read_all(&mut self) -> Result<Vec<FeedbackRecord>> {
        let mut out = Vec::new();
        let mut carry: Vec<u8> = Vec::new();
        let mut chunk = vec![0u8; FEEDBACK_CHUNK_SIZE];

        loop {
            let got = self.conn.try_read_exact(&mut chunk[..1], WAIT_READ_TIMEOUT).await?;
            if !got {
                break;
            }
            carry.push(chunk[0]);

            // Drain anything else immediately available without blocking
            // long on the timeout, matching the reference's 4096-byte chunk reads.
            while carry.len() < 6 {
                if !self.conn.try_read_exact(&mut chunk[..1], WAIT_READ_TIMEOUT).await? {
                    break;
                }
                carry.push(chunk[0]);
            }

            while let Some(record) = try_parse_record(&mut carry)? {
                out.push(record);
            }
        }

        Ok(out)
    }

    /// Stream feedback records one at a time as they are parsed off the
    /// wire, mirroring the reference implementation's `items()` generator.
    pub fn items(&mut self) -> impl Stream<Item = Result<FeedbackRecord>> + '_ {
        async_stream::try_stream! {
            let mut carry: Vec<u8> = Vec::new();
            let mut byte = [0u8; 1];
            loop {
                if !self.conn.try_read_exact(&mut byte, WAIT_READ_TIMEOUT).await? {
                    break;
                }
                carry.push(byte[0]);
                while let Some(record) = try_parse_record(&mut carry)? {
                    yield record;
                }
            }
        }
    }
}

fn try_parse_record(carry: &mut Vec<u8>) -> Result<Option<FeedbackRecord>> {
    if carry.len() < 6 {
        return Ok(None);
    }
    let token_length = u16::from_be_bytes([carry[4], carry[5]]) as usize;
    let total = 6 + token_length;
    if carry.len() < total {
        return Ok(None);
    }

    let fail_time_secs = u32::from_be_bytes([carry[0], carry[1], carry[2], carry[3]]);
    let fail_time = Utc.timestamp_opt(fail_time_secs as i64, 0).single().unwrap_or_else(Utc::now);

    let token_bytes = &carry[6..total];
    let token_hex = if token_length == TOKEN_LENGTH {
        let mut arr = [0u8; TOKEN_LENGTH];
        arr.copy_from_slice(token_bytes);
        encode_token_hex(&arr)
    } else {
        token_bytes.iter().map(|b| format!("{b:02x}")).collect()
    };

    carry.drain(0..total);
    Ok(Some(FeedbackRecord { token_hex, fail_time }))
}

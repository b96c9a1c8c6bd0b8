//! Minimal client for the legacy Firebase Cloud Messaging HTTP endpoint.
//!
//! Unlike the gateway/feedback clients this is a one-shot HTTP POST with no
//! persistent connection, resend history, or background reader — the
//! reference implementation's `FCMMessage` is a thin wrapper over
//! `requests.post`, and this mirrors that shape rather than forcing it
//! into the TLS/history machinery built for the binary protocol.

use crate::error::{Error, Result};
use crate::protocol::payload::Payload;
use serde::Serialize;

const FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";

#[derive(Serialize)]
struct FcmRequest<'a> {
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    collapse_key: Option<&'a str>,
    data: &'a serde_json::Value,
}

/// A client for sending messages through FCM's legacy HTTP API.
pub struct FcmClient {
    http: reqwest::Client,
    server_key: String,
}

impl FcmClient {
    pub fn new(server_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            server_key: server_key.into(),
        }
    }

    /// Send `payload`'s JSON body as the FCM `data` field to `device_token`.
    pub async fn send(&self, device_token: &str, payload: &Payload, collapse_key: Option<&str>) -> Result<()> {
        let data: serde_json::Value =
            serde_json::from_slice(payload.json()).map_err(|e| Error::protocol(format!("invalid payload JSON: {e}")))?;
        let request = FcmRequest {
            to: device_token,
            collapse_key,
            data: &data,
        };

        let response = self
            .http
            .post(FCM_SEND_URL)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::FcmRejected { status, body });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_collapse_key_only_when_present() {
        let data = serde_json::json!({"alert": "hi"});
        let req = FcmRequest {
            to: "token",
            collapse_key: None,
            data: &data,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("collapse_key").is_none());

        let req = FcmRequest {
            to: "token",
            collapse_key: Some("group"),
            data: &data,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["collapse_key"], "group");
    }
}

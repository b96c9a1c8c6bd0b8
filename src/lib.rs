//! A thin Rust client for Apple's legacy binary APNs provider protocol and
//! Feedback service, with a secondary HTTP path for Firebase Cloud
//! Messaging.
//!
//! # Example
//!
//! ```no_run
//! use apns_thin_rs::{GatewayClient, GatewayConfig, Identity, Payload, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let identity = Identity::from_files("cert.pem", Some("key.pem"))?;
//!     let gateway = GatewayClient::new(GatewayConfig::new(identity, false));
//!
//!     let payload = Payload::builder().alert("Hello World!").badge(1).build()?;
//!     let token = apns_thin_rs::protocol::codec::decode_token_hex(
//!         "99036da8fa94117c2ac999fdb3fa7275f42cc5fa851e2cccc1ad03937c7ed8d1",
//!     )?;
//!     gateway.send(token, &payload, None, 0, 10).await?;
//!
//!     gateway.close().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod fcm;
pub mod feedback;
pub mod gateway;
pub mod history;
pub mod protocol;
pub mod reader;
pub mod status;
pub mod tls;

pub use client::ApnsClient;
pub use config::{FeedbackConfig, GatewayConfig, Identity};
pub use error::{Error, Result};
pub use fcm::FcmClient;
pub use feedback::{FeedbackClient, FeedbackRecord};
pub use gateway::{GatewayClient, NotificationRequest};
pub use protocol::{Alert, Frame, Notification, Payload, PayloadBuilder, StructuredAlert};
pub use status::{ApnsStatus, ErrorResponse};

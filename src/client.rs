//! A small facade bundling gateway and feedback access behind one type,
//! grounded in the reference implementation's `APNService`, which holds
//! both a `GatewayConnection` and a `FeedbackConnection` for one app.

use crate::config::{FeedbackConfig, GatewayConfig, Identity};
use crate::error::Result;
use crate::feedback::{FeedbackClient, FeedbackRecord};
use crate::gateway::GatewayClient;

/// Convenience entry point bundling a gateway connection and on-demand
/// feedback polling for one certificate identity.
pub struct ApnsClient {
    identity: Identity,
    sandbox: bool,
    gateway: GatewayClient,
}

impl ApnsClient {
    /// Connect the gateway half immediately; feedback connections are made
    /// lazily on each [`ApnsClient::poll_feedback`] call, matching the
    /// reference implementation's short-lived feedback connections.
    pub async fn connect(identity: Identity, sandbox: bool) -> Result<Self> {
        let gateway = GatewayClient::connect(GatewayConfig::new(identity.clone(), sandbox)).await?;
        Ok(Self {
            identity,
            sandbox,
            gateway,
        })
    }

    /// The underlying gateway handle, for sending notifications.
    pub fn gateway(&self) -> &GatewayClient {
        &self.gateway
    }

    /// Open a fresh Feedback connection and drain every record it has
    /// buffered.
    pub async fn poll_feedback(&self) -> Result<Vec<FeedbackRecord>> {
        let config = FeedbackConfig::new(self.identity.clone(), self.sandbox);
        let mut client = FeedbackClient::connect(&config).await?;
        client.read_all().await
    }

    /// Shut down the gateway connection and its background reader.
    pub async fn close(self) -> Result<()> {
        self.gateway.close().await
    }
}

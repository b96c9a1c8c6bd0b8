//! Connection parameters for the gateway and feedback clients.

use crate::error::{Error, Result};
use crate::protocol::constants::{
    FEEDBACK_HOST_PRODUCTION, FEEDBACK_HOST_SANDBOX, FEEDBACK_PORT, GATEWAY_HOST_PRODUCTION,
    GATEWAY_HOST_SANDBOX, GATEWAY_PORT,
};
use std::env;
use std::time::Duration;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// PEM-encoded client certificate and private key used for mTLS against APNs.
#[derive(Debug, Clone)]
pub struct Identity {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

impl Identity {
    pub fn new(cert_pem: Vec<u8>, key_pem: Vec<u8>) -> Self {
        Self { cert_pem, key_pem }
    }

    /// Read the certificate (and, if given a separate path, the key) from disk.
    pub fn from_files(cert_path: &str, key_path: Option<&str>) -> Result<Self> {
        let cert_pem = std::fs::read(cert_path)?;
        let key_pem = match key_path {
            Some(path) => std::fs::read(path)?,
            None => cert_pem.clone(),
        };
        Ok(Self { cert_pem, key_pem })
    }
}

/// Connection parameters for [`crate::gateway::GatewayClient`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub identity: Identity,
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Extra PEM-encoded trust anchor, added alongside the native root
    /// store. Not needed against the real APNs hosts; exists so tests and
    /// enterprise deployments behind a private CA can point at a
    /// non-Apple endpoint.
    pub root_ca_pem: Option<Vec<u8>>,
}

impl GatewayConfig {
    pub fn new(identity: Identity, sandbox: bool) -> Self {
        let host = if sandbox {
            GATEWAY_HOST_SANDBOX
        } else {
            GATEWAY_HOST_PRODUCTION
        };
        Self {
            identity,
            host: host.to_string(),
            port: GATEWAY_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            root_ca_pem: None,
        }
    }

    /// Override the gateway host and port, e.g. to point at a local test server.
    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Trust an additional PEM-encoded CA certificate, for connecting to a
    /// gateway that doesn't present a publicly-trusted certificate.
    pub fn with_root_ca_pem(mut self, pem: Vec<u8>) -> Self {
        self.root_ca_pem = Some(pem);
        self
    }

    /// Build from `APNS_CERT_PATH`, `APNS_KEY_PATH` (optional), `APNS_SANDBOX`,
    /// and `APNS_CONNECT_TIMEOUT_SECS` environment variables.
    pub fn from_env() -> Result<Self> {
        let cert_path = env::var("APNS_CERT_PATH").map_err(|_| Error::InvalidIdentity {
            message: "APNS_CERT_PATH is not set".to_string(),
        })?;
        let key_path = env::var("APNS_KEY_PATH").ok();
        let identity = Identity::from_files(&cert_path, key_path.as_deref())?;
        let sandbox = env_flag("APNS_SANDBOX");

        let mut config = Self::new(identity, sandbox);
        if let Some(secs) = env_u64("APNS_CONNECT_TIMEOUT_SECS") {
            config = config.with_connect_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// Connection parameters for [`crate::feedback::FeedbackClient`].
#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    pub identity: Identity,
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    pub root_ca_pem: Option<Vec<u8>>,
}

impl FeedbackConfig {
    pub fn new(identity: Identity, sandbox: bool) -> Self {
        let host = if sandbox {
            FEEDBACK_HOST_SANDBOX
        } else {
            FEEDBACK_HOST_PRODUCTION
        };
        Self {
            identity,
            host: host.to_string(),
            port: FEEDBACK_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            root_ca_pem: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_root_ca_pem(mut self, pem: Vec<u8>) -> Self {
        self.root_ca_pem = Some(pem);
        self
    }

    pub fn from_env() -> Result<Self> {
        let cert_path = env::var("APNS_CERT_PATH").map_err(|_| Error::InvalidIdentity {
            message: "APNS_CERT_PATH is not set".to_string(),
        })?;
        let key_path = env::var("APNS_KEY_PATH").ok();
        let identity = Identity::from_files(&cert_path, key_path.as_deref())?;
        let sandbox = env_flag("APNS_SANDBOX");

        let mut config = Self::new(identity, sandbox);
        if let Some(secs) = env_u64("APNS_CONNECT_TIMEOUT_SECS") {
            config = config.with_connect_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

fn env_flag(name: &str) -> bool {
    matches!(
        env::var(name).ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE") | Some("yes")
    )
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

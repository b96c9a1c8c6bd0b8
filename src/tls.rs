//! TLS (mutual-auth) transport to the APNs gateway/feedback services.
//!
//! The reference implementation wraps a non-blocking socket in OpenSSL and
//! drives the handshake with `select()`; here the same shape — DNS lookup,
//! connect-with-retry, then a client-cert TLS handshake — is expressed with
//! `tokio::net::TcpStream` and `tokio_rustls` instead.

use crate::config::Identity;
use crate::error::{Error, Result};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::{client::TlsStream, TlsConnector};
use tracing::{debug, warn};

const CONNECT_RETRY: u32 = 3;

fn load_identity(identity: &Identity) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut identity.cert_pem.as_slice())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| Error::InvalidIdentity {
            message: format!("failed to parse client certificate: {e}"),
        })?;
    if certs.is_empty() {
        return Err(Error::InvalidIdentity {
            message: "no certificates found in identity PEM".to_string(),
        });
    }

    let key = rustls_pemfile::private_key(&mut identity.key_pem.as_slice())
        .map_err(|e| Error::InvalidIdentity {
            message: format!("failed to parse client private key: {e}"),
        })?
        .ok_or_else(|| Error::InvalidIdentity {
            message: "no private key found in identity PEM".to_string(),
        })?;

    Ok((certs, key))
}

fn build_connector(identity: &Identity, extra_root_ca_pem: Option<&[u8]>) -> Result<TlsConnector> {
    let (certs, key) = load_identity(identity)?;

    let mut root_store = rustls::RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        warn!(%err, "error loading a native root certificate");
    }
    for cert in native.certs {
        let _ = root_store.add(cert);
    }
    if let Some(mut pem) = extra_root_ca_pem {
        for cert in rustls_pemfile::certs(&mut pem) {
            let cert = cert.map_err(|e| Error::InvalidIdentity {
                message: format!("failed to parse extra root CA certificate: {e}"),
            })?;
            let _ = root_store.add(cert);
        }
    }

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_client_auth_cert(certs, key)
        .map_err(Error::Tls)?;

    Ok(TlsConnector::from(Arc::new(config)))
}

async fn connect_tcp(host: &str, port: u16, connect_timeout: Duration) -> Result<TcpStream> {
    let addr = format!("{host}:{port}");
    let resolved: Vec<_> = tokio::net::lookup_host(&addr)
        .await
        .map_err(|e| Error::DnsResolutionFailed {
            hostname: host.to_string(),
            message: e.to_string(),
        })?
        .collect();
    if resolved.is_empty() {
        return Err(Error::DnsResolutionFailed {
            hostname: host.to_string(),
            message: "no addresses returned".to_string(),
        });
    }

    let mut last_err = None;
    for attempt in 0..CONNECT_RETRY {
        match timeout(connect_timeout, TcpStream::connect(resolved[0])).await {
            Ok(Ok(stream)) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Ok(Err(e)) => {
                debug!(attempt, error = %e, "connect attempt failed");
                last_err = Some(Error::Io(e));
            }
            Err(_) => {
                debug!(attempt, "connect attempt timed out");
                last_err = Some(Error::ConnectTimeout {
                    host: host.to_string(),
                    port,
                    timeout: connect_timeout,
                });
            }
        }
    }
    Err(last_err.unwrap_or(Error::ConnectTimeout {
        host: host.to_string(),
        port,
        timeout: connect_timeout,
    }))
}

/// An established, authenticated TLS connection to an APNs service.
pub struct Connection {
    stream: TlsStream<TcpStream>,
}

impl Connection {
    /// Resolve `host`, connect over TCP (retried up to 3 times), and perform
    /// a client-certificate TLS handshake.
    pub async fn open(host: &str, port: u16, identity: &Identity, connect_timeout: Duration) -> Result<Self> {
        Self::open_with_root_ca(host, port, identity, connect_timeout, None).await
    }

    /// Like [`Connection::open`], but trusting an extra PEM-encoded root CA
    /// alongside the native store. Used against a private or test gateway.
    pub async fn open_with_root_ca(
        host: &str,
        port: u16,
        identity: &Identity,
        connect_timeout: Duration,
        extra_root_ca_pem: Option<&[u8]>,
    ) -> Result<Self> {
        let tcp = connect_tcp(host, port, connect_timeout).await?;
        let connector = build_connector(identity, extra_root_ca_pem)?;
        let server_name = ServerName::try_from(host.to_string()).map_err(|e| Error::InvalidIdentity {
            message: format!("invalid server name '{host}': {e}"),
        })?;
        let stream = connector.connect(server_name, tcp).await?;
        Ok(Self { stream })
    }

    /// Write `data` in full, bounded by `timeout_duration`.
    ///
    /// A socket not yet writable within `timeout_duration` is a `WriteNotReady`
    /// condition: logged and silently dropped rather than surfaced, since the
    /// gateway is expected to retry the send on its own schedule.
    pub async fn write_all(&mut self, data: &[u8], timeout_duration: Duration) -> Result<()> {
        match timeout(timeout_duration, self.stream.write_all(data)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_) => {
                warn!(bytes = data.len(), "write timed out, dropping");
                Ok(())
            }
        }
    }

    /// Read exactly `buf.len()` bytes, bounded by `timeout_duration`.
    ///
    /// Returns `Ok(false)` on a clean EOF with zero bytes read (nothing to
    /// report); a partial read before EOF is an [`Error::ShortRead`].
    pub async fn try_read_exact(&mut self, buf: &mut [u8], timeout_duration: Duration) -> Result<bool> {
        let result = timeout(timeout_duration, self.stream.read_exact(buf)).await;
        match result {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_) => Ok(false),
        }
    }

    /// Shut down the TLS session and underlying socket. Idempotent: errors
    /// from an already-closed peer are swallowed.
    pub async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}

use crate::common::{ConformanceError, TlsOptions};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("market-conformance-rs/", env!("CARGO_PKG_VERSION"));

pub fn create_http_client(tls: &TlsOptions) -> Result<reqwest::Client, ConformanceError> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(DEFAULT_TIMEOUT)
        .user_agent(USER_AGENT);

    if tls.insecure {
        builder = builder.danger_accept_invalid_certs(true);
    } else if let Some(path) = &tls.cafile {
        let pem = std::fs::read(path)?;
        let cert = reqwest::Certificate::from_pem(&pem)?;
        builder = builder.add_root_certificate(cert);
    }

    Ok(builder.build()?)
}

/// TLS connector for the WebSocket side, mirroring [create_http_client].
/// `None` means the default system trust store.
pub fn create_tls_connector(
    tls: &TlsOptions,
) -> Result<Option<native_tls::TlsConnector>, ConformanceError> {
    if !tls.insecure && tls.cafile.is_none() {
        return Ok(None);
    }

    let mut builder = native_tls::TlsConnector::builder();
    if tls.insecure {
        builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    } else if let Some(path) = &tls.cafile {
        let pem = std::fs::read(path)?;
        let cert = native_tls::Certificate::from_pem(&pem)
            .map_err(|e| ConformanceError::ConfigError(format!("invalid cafile {:?}: {}", path, e)))?;
        builder.add_root_certificate(cert);
    }

    builder
        .build()
        .map(Some)
        .map_err(|e| ConformanceError::ConfigError(format!("TLS connector: {}", e)))
}

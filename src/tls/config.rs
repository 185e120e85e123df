//! rustls server context for HTTPS mode.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig;
use rustls_pki_types::pem::{self, PemObject};
use rustls_pki_types::{CertificateDer, PrivateKeyDer};

/// TLS context construction error
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Failed to read certificate {}: {source}", .path.display())]
    Certificate {
        path: PathBuf,
        #[source]
        source: pem::Error,
    },

    #[error("No certificate found in {}", .path.display())]
    NoCertificate { path: PathBuf },

    #[error("Failed to read private key {}: {source}", .path.display())]
    PrivateKey {
        path: PathBuf,
        #[source]
        source: pem::Error,
    },

    #[error("Certificate {} and key {} were rejected: {source}", .cert.display(), .key.display())]
    Rejected {
        cert: PathBuf,
        key: PathBuf,
        #[source]
        source: rustls::Error,
    },
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let certificate_error = |source| TlsError::Certificate {
        path: path.to_path_buf(),
        source,
    };

    let certs = CertificateDer::pem_file_iter(path)
        .map_err(certificate_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(certificate_error)?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificate {
            path: path.to_path_buf(),
        });
    }

    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    PrivateKeyDer::from_pem_file(path).map_err(|source| TlsError::PrivateKey {
        path: path.to_path_buf(),
        source,
    })
}

/// Build a rustls server configuration from PEM files.
///
/// Uses the aws-lc-rs provider explicitly with its safe default protocol
/// versions (TLS 1.2 and 1.3) and cipher suites, and offers HTTP/2 and
/// HTTP/1.1 over ALPN.
pub fn build_server_config(cert_path: &Path, key_path: &Path) -> Result<ServerConfig, TlsError> {
    let certs = load_certs(cert_path)?;
    let key = load_key(key_path)?;

    let rejected = |source| TlsError::Rejected {
        cert: cert_path.to_path_buf(),
        key: key_path.to_path_buf(),
        source,
    };

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(rejected)?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(rejected)?;

    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(config)
}

/// Load the certificate pair into an axum-server TLS configuration.
pub fn load_rustls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    let config = build_server_config(cert_path, key_path)?;
    tracing::debug!(
        cert = %cert_path.display(),
        key = %key_path.display(),
        "Loaded TLS configuration"
    );
    Ok(RustlsConfig::from_config(Arc::new(config)))
}

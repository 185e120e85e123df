//! TLS support for HTTPS mode.
//!
//! - [`cert`]: make sure a self-signed certificate/key pair exists on disk
//! - [`config`]: turn that pair into a rustls server context for axum-server

pub mod cert;
pub mod config;

pub use cert::{ensure_certificate, CertError, CertStatus};
pub use config::{build_server_config, load_rustls_config, TlsError};

//! Self-signed certificate bootstrap.
//!
//! On first HTTPS run a certificate and private key are generated in-process
//! and written as PEM. Later runs reuse whatever pair is already on disk;
//! there is no expiry check or rotation.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, RsaKeySize, PKCS_RSA_SHA256};
use time::{Duration, OffsetDateTime};

use crate::config::{
    CERT_COMMON_NAME, CERT_COUNTRY, CERT_LOCALITY, CERT_ORGANIZATION, CERT_ORGANIZATIONAL_UNIT,
    CERT_STATE, CERT_SUBJECT_ALT_NAMES, CERT_VALIDITY_DAYS,
};

/// Outcome of [`ensure_certificate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertStatus {
    /// Both files were already present; nothing was written
    Reused,
    /// A new pair was generated and written
    Generated,
}

/// Certificate bootstrap error
#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error("Failed to generate self-signed certificate: {0}")]
    Generate(#[from] rcgen::Error),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Certificate generation left {} missing or unreadable: {source}", .path.display())]
    Verify {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// PEM-encoded certificate and PKCS#8 private key
#[derive(Debug, Clone)]
pub struct PemPair {
    pub cert_pem: String,
    pub key_pem: String,
}

/// Generate a self-signed certificate for `localhost` and `127.0.0.1`.
///
/// RSA 2048 key, SHA-256 signature, valid from now for [`CERT_VALIDITY_DAYS`].
pub fn generate_self_signed() -> Result<PemPair, CertError> {
    let sans: Vec<String> = CERT_SUBJECT_ALT_NAMES.iter().map(|s| s.to_string()).collect();
    let mut params = CertificateParams::new(sans)?;

    let mut dn = DistinguishedName::new();
    dn.push(DnType::CountryName, CERT_COUNTRY);
    dn.push(DnType::StateOrProvinceName, CERT_STATE);
    dn.push(DnType::LocalityName, CERT_LOCALITY);
    dn.push(DnType::OrganizationName, CERT_ORGANIZATION);
    dn.push(DnType::OrganizationalUnitName, CERT_ORGANIZATIONAL_UNIT);
    dn.push(DnType::CommonName, CERT_COMMON_NAME);
    params.distinguished_name = dn;

    let now = OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + Duration::days(CERT_VALIDITY_DAYS);

    let key_pair = KeyPair::generate_rsa_for(&PKCS_RSA_SHA256, RsaKeySize::_2048)?;
    let cert = params.self_signed(&key_pair)?;

    Ok(PemPair {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
    })
}

/// Make sure a certificate and key exist at the given paths.
///
/// A no-op when both files exist. Otherwise a fresh pair is generated and
/// both files are (re)written, then read back so a failed write is reported
/// here. Concurrent callers on the same paths race; the last writer wins.
pub fn ensure_certificate(cert_path: &Path, key_path: &Path) -> Result<CertStatus, CertError> {
    if cert_path.is_file() && key_path.is_file() {
        tracing::debug!(
            cert = %cert_path.display(),
            key = %key_path.display(),
            "Reusing existing certificate"
        );
        return Ok(CertStatus::Reused);
    }

    tracing::info!("Generating self-signed certificate...");
    let pair = generate_self_signed()?;

    write_file(cert_path, pair.cert_pem.as_bytes(), false)?;
    write_file(key_path, pair.key_pem.as_bytes(), true)?;

    verify_written(cert_path)?;
    verify_written(key_path)?;

    tracing::info!(
        cert = %cert_path.display(),
        key = %key_path.display(),
        valid_days = CERT_VALIDITY_DAYS,
        "Generated self-signed certificate"
    );

    Ok(CertStatus::Generated)
}

fn write_file(path: &Path, contents: &[u8], private: bool) -> Result<(), CertError> {
    write_pem(path, contents, private).map_err(|source| CertError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_pem(path: &Path, contents: &[u8], private: bool) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    // Key is owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if private {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = private;

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

fn verify_written(path: &Path) -> Result<(), CertError> {
    let contents = fs::read_to_string(path).map_err(|source| CertError::Verify {
        path: path.to_path_buf(),
        source,
    })?;

    if !contents.contains("-----BEGIN ") {
        return Err(CertError::Verify {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, "no PEM block found"),
        });
    }

    Ok(())
}

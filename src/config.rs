//! Server configuration and constants.
//!
//! Defines the response header values, default ports and paths, certificate
//! parameters, and logging defaults. `ServerConfig` is the one object the
//! server is built from; nothing is read from module-level state at runtime.

use const_format::formatcp;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

// =============================================================================
// HTTP Response Cache Control
// =============================================================================
// Every response carries all three headers so browsers and intermediaries
// always refetch. The HUD/server client pages depend on never seeing a stale copy.

/// Disable storage and force revalidation
pub const CACHE_CONTROL_NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// HTTP/1.0 caches only understand Pragma
pub const PRAGMA_NO_CACHE: &str = "no-cache";

/// Already expired
pub const EXPIRES_IMMEDIATELY: &str = "0";

// =============================================================================
// Network
// =============================================================================

/// First port tried when looking for a free one
pub const DEFAULT_START_PORT: u16 = 5000;

/// Ports probed before giving up
pub const DEFAULT_MAX_PORT_ATTEMPTS: u32 = 100;

/// Listen on all interfaces so other devices on the LAN can connect
pub const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Well-known external address used to discover the LAN-facing interface.
/// Nothing is sent; connecting a UDP socket only selects a route.
pub const LOCAL_IP_PROBE_HOST: &str = "8.8.8.8";
pub const LOCAL_IP_PROBE_PORT: u16 = 80;
pub const LOCAL_IP_PROBE_ADDR: &str =
    formatcp!("{}:{}", LOCAL_IP_PROBE_HOST, LOCAL_IP_PROBE_PORT);

/// Query-string modes of the two client entry points
pub const CLIENT_MODES: [&str; 2] = ["server", "hud"];

/// Drain period for in-flight connections after Ctrl+C or SIGTERM
pub const SHUTDOWN_GRACE_SECONDS: u64 = 5;

// =============================================================================
// Self-signed Certificate
// =============================================================================

/// Certificate file, relative to the working directory
pub const DEFAULT_CERT_PATH: &str = "localhost.crt";

/// Private key file, relative to the working directory
pub const DEFAULT_KEY_PATH: &str = "localhost.key";

/// Certificate lifetime from the moment of generation
pub const CERT_VALIDITY_DAYS: i64 = 365;

pub const CERT_COUNTRY: &str = "US";
pub const CERT_STATE: &str = "State";
pub const CERT_LOCALITY: &str = "City";
pub const CERT_ORGANIZATION: &str = "Organization";
pub const CERT_ORGANIZATIONAL_UNIT: &str = "Unit";
pub const CERT_COMMON_NAME: &str = "localhost";

/// Subject Alternative Names: one DNS name and the IPv4 loopback
pub const CERT_SUBJECT_ALT_NAMES: [&str; 2] = ["localhost", "127.0.0.1"];

// =============================================================================
// Logging
// =============================================================================

/// Log target of this crate
pub const CRATE_LOG_TARGET: &str = "lanserve";

/// Default log filter when neither --log-level nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = formatcp!("{}=info,tower_http=info", CRATE_LOG_TARGET);

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Whether the listening socket is wrapped in TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Plain HTTP
    Plain,
    /// HTTPS with a certificate generated on first run
    SelfSigned,
}

impl TlsMode {
    /// URL scheme clients use for this mode
    pub fn scheme(self) -> &'static str {
        match self {
            TlsMode::Plain => "http",
            TlsMode::SelfSigned => "https",
        }
    }
}

/// Everything needed to start a server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory served as the web root
    pub root: PathBuf,
    /// Interface address to listen on
    pub bind_ip: IpAddr,
    /// First port to try; 0 lets the OS pick
    pub start_port: u16,
    /// Upper bound on ports probed
    pub max_port_attempts: u32,
    pub tls: TlsMode,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            bind_ip: DEFAULT_BIND_IP,
            start_port: DEFAULT_START_PORT,
            max_port_attempts: DEFAULT_MAX_PORT_ATTEMPTS,
            tls: TlsMode::Plain,
            cert_path: PathBuf::from(DEFAULT_CERT_PATH),
            key_path: PathBuf::from(DEFAULT_KEY_PATH),
        }
    }
}

impl ServerConfig {
    /// Default configuration for the mode selected on the command line
    pub fn from_flags(https: bool) -> Self {
        let tls = if https {
            TlsMode::SelfSigned
        } else {
            TlsMode::Plain
        };
        Self {
            tls,
            ..Self::default()
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    pub fn with_start_port(mut self, port: u16) -> Self {
        self.start_port = port;
        self
    }

    pub fn with_max_port_attempts(mut self, attempts: u32) -> Self {
        self.max_port_attempts = attempts;
        self
    }

    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_cert_paths(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.cert_path = cert.into();
        self.key_path = key.into();
        self
    }

    /// Certificate path as given
    pub fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    /// Key path as given
    pub fn key_path(&self) -> &Path {
        &self.key_path
    }
}

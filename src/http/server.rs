//! HTTP/HTTPS server startup logic.
//!
//! Startup runs strictly in order: bootstrap the certificate and build the
//! TLS context (HTTPS only), bind the first free port, build the router.
//! After that the server does nothing but serve until the process stops.

use std::net::{IpAddr, SocketAddr, TcpListener};
use std::path::PathBuf;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;

use crate::config::{ServerConfig, TlsMode, CLIENT_MODES};
use crate::net::{bind_available, local_ip_or_loopback, PortError};
use crate::tls::{ensure_certificate, load_rustls_config, CertError, TlsError};

use super::shutdown;
use super::static_files::create_router;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Served directory {} is not a directory", .0.display())]
    Root(PathBuf),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Certificate(#[from] CertError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Connection URLs printed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUrls {
    pub scheme: &'static str,
    pub port: u16,
    pub network_ip: IpAddr,
}

impl ServerUrls {
    fn entry_points(&self, host: &str) -> Vec<String> {
        CLIENT_MODES
            .iter()
            .map(|mode| format!("{}://{}:{}?mode={}", self.scheme, host, self.port, mode))
            .collect()
    }

    /// `localhost` URLs, one per client mode
    pub fn local(&self) -> Vec<String> {
        self.entry_points("localhost")
    }

    /// LAN URLs, one per client mode
    pub fn network(&self) -> Vec<String> {
        let host = match self.network_ip {
            IpAddr::V4(ip) => ip.to_string(),
            IpAddr::V6(ip) => format!("[{}]", ip),
        };
        self.entry_points(&host)
    }
}

/// A bound, ready-to-serve static file server.
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    tls: Option<RustlsConfig>,
    router: Router,
    handle: Handle,
}

impl Server {
    /// Prepare everything needed to serve, without accepting connections yet.
    pub fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        if !config.root.is_dir() {
            return Err(ServerError::Root(config.root.clone()));
        }

        let tls = match config.tls {
            TlsMode::Plain => None,
            TlsMode::SelfSigned => {
                ensure_certificate(config.cert_path(), config.key_path())?;
                Some(load_rustls_config(config.cert_path(), config.key_path())?)
            }
        };

        let listener = bind_available(config.bind_ip, config.start_port, config.max_port_attempts)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let router = create_router(&config.root);

        tracing::info!(
            addr = %local_addr,
            root = %config.root.display(),
            scheme = config.tls.scheme(),
            "Server bound"
        );

        Ok(Self {
            config,
            listener,
            local_addr,
            tls,
            router,
            handle: Handle::new(),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn tls_mode(&self) -> TlsMode {
        self.config.tls
    }

    /// Handle for observing startup and triggering shutdown
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Connection URLs, resolving the LAN address now.
    pub fn urls(&self) -> ServerUrls {
        let network_ip = if self.local_addr.ip().is_unspecified() {
            local_ip_or_loopback()
        } else {
            self.local_addr.ip()
        };

        ServerUrls {
            scheme: self.config.tls.scheme(),
            port: self.port(),
            network_ip,
        }
    }

    /// The startup banner.
    pub fn banner(&self) -> String {
        let urls = self.urls();
        let mut banner = format!(
            "Serving at:\nLocal: {}\nNetwork: {}\n",
            urls.local().join(" "),
            urls.network().join(" ")
        );
        if self.config.tls == TlsMode::SelfSigned {
            banner.push_str(
                "Note: You will need to accept the self-signed certificate warning in your browser\n",
            );
        }
        banner
    }

    pub fn print_banner(&self) {
        print!("{}", self.banner());
    }

    /// Serve until the handle is shut down. Under normal operation this never returns.
    pub async fn serve(self) -> Result<(), ServerError> {
        let Server {
            listener,
            tls,
            router,
            handle,
            local_addr,
            ..
        } = self;

        let service = router.into_make_service();

        let result = match tls {
            None => {
                tracing::info!(%local_addr, "Starting HTTP server");
                axum_server::from_tcp(listener)
                    .handle(handle)
                    .serve(service)
                    .await
            }
            Some(tls) => {
                tracing::info!(%local_addr, "Starting HTTPS server (self-signed)");
                axum_server::tls_rustls::from_tcp_rustls(listener, tls)
                    .handle(handle)
                    .serve(service)
                    .await
            }
        };

        result.map_err(|e| ServerError::Server(e.to_string()))
    }
}

/// Bind, print the connection URLs, and serve forever.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let server = Server::bind(config)?;
    server.print_banner();
    shutdown::setup_shutdown_handler(server.handle());
    server.serve().await
}

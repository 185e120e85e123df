//! lanserve - serve a local directory on the LAN with caching disabled
//!
//! Serves the working directory over HTTP, or over HTTPS with a self-signed
//! certificate generated on first run, so browser clients on other devices
//! always load fresh copies of the HUD and server pages.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod net;
pub mod tls;

pub use config::{ServerConfig, TlsMode};
pub use error::AppError;
pub use http::{run, Server, ServerError, ServerUrls};

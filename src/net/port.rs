//! Free port selection.
//!
//! Ports are probed upward from a starting value by binding a listener on
//! the requested interface. A port is skipped when the bind fails because
//! the address is in use or the process lacks permission for it.

use std::io;
use std::net::{IpAddr, SocketAddr, TcpListener};

/// Port selection error
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("No free port found in {attempts} attempts starting at {start}")]
    Exhausted { start: u16, attempts: u32 },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Whether a bind failure means "try the next port".
fn is_retryable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::AddrInUse | io::ErrorKind::PermissionDenied
    )
}

/// Bind the first free port at or above `start` and keep the listener.
///
/// The returned listener is the probe itself, so the port cannot be taken by
/// another process between selection and serving. A `start` of 0 binds an
/// OS-assigned ephemeral port.
pub fn bind_available(
    ip: IpAddr,
    start: u16,
    max_attempts: u32,
) -> Result<TcpListener, PortError> {
    let mut port = start;

    for _ in 0..max_attempts {
        let addr = SocketAddr::new(ip, port);
        match TcpListener::bind(addr) {
            Ok(listener) => return Ok(listener),
            Err(e) if is_retryable(&e) => {
                let Some(next) = port.checked_add(1) else {
                    break;
                };
                tracing::info!(port, error = %e, "Port {} is in use, trying {}", port, next);
                port = next;
            }
            Err(source) => return Err(PortError::Bind { addr, source }),
        }
    }

    Err(PortError::Exhausted {
        start,
        attempts: max_attempts,
    })
}

/// Find the first free port at or above `start`.
///
/// The probe socket is released before returning, so the port is only known
/// to be bindable at the moment of return. Prefer [`bind_available`] when the
/// caller is about to listen on it.
pub fn find_available_port(ip: IpAddr, start: u16, max_attempts: u32) -> Result<u16, PortError> {
    let listener = bind_available(ip, start, max_attempts)?;
    let addr = listener.local_addr().map_err(|source| PortError::Bind {
        addr: SocketAddr::new(ip, start),
        source,
    })?;
    Ok(addr.port())
}

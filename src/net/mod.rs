//! Socket-level helpers used at startup.
//!
//! - [`port`]: find and bind the first free TCP port at or above a start port
//! - [`local_ip`]: best-effort discovery of the LAN-facing address

pub mod local_ip;
pub mod port;

pub use local_ip::{local_ip, local_ip_or_loopback};
pub use port::{bind_available, find_available_port, PortError};

//! LAN address discovery.
//!
//! Connecting a UDP socket sends nothing; it only makes the kernel pick the
//! outbound interface, whose address is then read back from the socket.

use std::io;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use crate::config::LOCAL_IP_PROBE_ADDR;

fn probe(target: &str) -> io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(target)?;
    Ok(socket.local_addr()?.ip())
}

/// Address of the interface used to reach the outside network, if any.
pub fn local_ip() -> Option<IpAddr> {
    match probe(LOCAL_IP_PROBE_ADDR) {
        Ok(ip) if !ip.is_unspecified() => Some(ip),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Could not determine network address");
            None
        }
    }
}

/// [`local_ip`], falling back to the IPv4 loopback address.
pub fn local_ip_or_loopback() -> IpAddr {
    local_ip().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

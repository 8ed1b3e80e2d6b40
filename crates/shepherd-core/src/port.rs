//! Ephemeral port allocation.

use crate::error::{Result, ShepherdError};
use std::net::{Ipv4Addr, TcpListener};
use tracing::{debug, warn};

/// Ask the OS for an unused TCP port.
///
/// Binds a listener to port 0, reads back the assigned port, and releases
/// the listener before returning. Another process may grab the port between
/// the release and the viewer binding it; this is accepted for a single
/// operator tool. There is no retry.
pub fn allocate_port() -> Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(|e| {
        warn!("Failed to get random port: {}", e);
        ShepherdError::PortExhausted
    })?;

    let addr = listener.local_addr().map_err(|e| {
        warn!("Failed to read allocated listener address: {}", e);
        ShepherdError::PortExhausted
    })?;

    match addr.port() {
        0 => Err(ShepherdError::PortExhausted),
        port => {
            debug!("Allocated port {}", port);
            Ok(port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_returns_nonzero_port() {
        let port = allocate_port().unwrap();
        assert_ne!(port, 0);
    }

    #[test]
    fn test_allocated_port_is_released() {
        let port = allocate_port().unwrap();
        // The listener is dropped, so the port can be bound again.
        let rebind = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port));
        assert!(rebind.is_ok());
    }
}

use crate::client::error::{ClientError, Result};
use crate::client::identity::{PlainCredentials, SessionIdentity};
use crate::protocol::{encode_pretty, read_frame, write_frame, Greeting, ProtocolError};
use std::net::{Shutdown, TcpStream};
use tracing::{debug, warn};

/// Trait for blocking, frame-oriented socket operations
pub trait NetworkSocket: Send {
    /// Send one frame over the network
    fn send_frame(&mut self, payload: &[u8]) -> Result<usize>;

    /// Receive one frame from the network, blocking until it arrives
    fn recv_frame(&mut self) -> Result<Vec<u8>>;

    /// Tear down the transport. Dropping does this implicitly; the explicit
    /// path lets teardown errors be observed.
    fn close(&mut self) -> Result<()>;
}

/// TCP-based implementation of NetworkSocket
#[derive(Debug)]
pub struct TcpNetworkSocket {
    stream: TcpStream,
}

impl TcpNetworkSocket {
    /// Connect to a remote address
    pub fn connect(addr: &str) -> Result<Self> {
        debug!(addr = addr, "Connecting TCP socket");
        let stream = TcpStream::connect(addr).map_err(|e| {
            warn!(error = %e, "Failed to connect socket");
            ClientError::Socket(format!("Failed to connect to {}: {}", addr, e))
        })?;
        debug!("Socket connected successfully");
        Ok(Self { stream })
    }

    /// Present the routing identity and plain credentials to the server.
    ///
    /// The server answers a bad pair by dropping the session, not by
    /// replying, so success here does not mean the credentials were
    /// accepted.
    pub fn greet(
        &mut self,
        identity: &SessionIdentity,
        credentials: &PlainCredentials,
    ) -> Result<()> {
        let greeting = Greeting {
            identity: identity.to_string(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        };
        let payload = encode_pretty(&greeting).map_err(lift)?;
        self.send_frame(&payload)?;
        debug!(identity = %identity, "Greeting sent");
        Ok(())
    }
}

impl NetworkSocket for TcpNetworkSocket {
    fn send_frame(&mut self, payload: &[u8]) -> Result<usize> {
        let bytes_sent = write_frame(&mut self.stream, payload).map_err(|e| {
            warn!(error = %e, "Failed to send frame");
            lift(e)
        })?;
        debug!(bytes_sent = bytes_sent, "Frame sent");
        Ok(bytes_sent)
    }

    fn recv_frame(&mut self) -> Result<Vec<u8>> {
        let payload = read_frame(&mut self.stream).map_err(|e| {
            debug!(error = %e, "Failed to receive frame");
            lift(e)
        })?;
        debug!(bytes_received = payload.len(), "Frame received");
        Ok(payload)
    }

    fn close(&mut self) -> Result<()> {
        debug!("Shutting down TCP socket");
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Peer already hung up; nothing left to tear down
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(ClientError::Io(e)),
        }
    }
}

/// Transport failures surface as `Io`, everything else stays `Protocol`.
fn lift(e: ProtocolError) -> ClientError {
    match e {
        ProtocolError::Io(io) => ClientError::Io(io),
        other => ClientError::Protocol(other),
    }
}


#[cfg(test)]
pub use tests::MockNetworkSocket;

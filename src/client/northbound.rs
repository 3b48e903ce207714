use crate::client::config::Config;
use crate::client::constants::{
    ACTION_LIST_KEY, ENDPOINT_HOST, ENDPOINT_SCHEME, TEST_SESSION_NAME,
};
use crate::client::dispatch::{self, Dispatch};
use crate::client::error::{ClientError, Result};
use crate::client::identity::SessionIdentity;
use crate::client::report;
use crate::client::socket::{NetworkSocket, TcpNetworkSocket};
use crate::protocol::encode_pretty;
use serde_json::Value;
use tracing::{debug, info};

/// Northbound client: one persistent session to the environment server.
///
/// Owns the socket, the routing identity, and the synchronization
/// timestamp. The protocol is strict request/reply lock-step and the caller
/// is responsible for alternating `send` and `recv`; nothing here is shared
/// across threads.
pub struct NorthboundClient<S: NetworkSocket = TcpNetworkSocket> {
    identity: SessionIdentity,
    config: Config,
    socket: Option<S>,
    end_ts: Option<i64>,
}

impl NorthboundClient<TcpNetworkSocket> {
    /// Create an unconnected client for the given session configuration.
    pub fn new(client_id: u32, config: Config) -> Self {
        let identity = SessionIdentity::new(config.session_name.as_str(), client_id);
        Self {
            identity,
            config,
            socket: None,
            end_ts: None,
        }
    }

    /// Connect to the environment server and transmit the start request.
    ///
    /// Establishes the TCP connection, presents identity and credentials in
    /// the greeting frame, then sends the configured `env_config` verbatim.
    /// A rejected credential pair is not reported back by the server; it
    /// shows up as a `recv()` that never returns or hits end-of-stream.
    pub fn connect(&mut self) -> Result<()> {
        let endpoint = format!(
            "{}://{}:{}",
            ENDPOINT_SCHEME, ENDPOINT_HOST, self.config.algorithm_client_port
        );
        let mut socket = TcpNetworkSocket::connect(&format!(
            "{}:{}",
            ENDPOINT_HOST, self.config.algorithm_client_port
        ))?;
        socket.greet(&self.identity, &self.config.credentials())?;

        println!("{} started", self.identity);
        println!("{} Sending environment start request to {}...", self.identity, endpoint);
        if self.config.session_name == TEST_SESSION_NAME {
            println!(
                "If no response arrives after the start request, the port forwarding may be broken..."
            );
        } else {
            println!(
                "If no response arrives from the server, the session_name and session_key may be \
                 wrong or the port forwarding is broken. Set both to \"{}\" to check the port \
                 forwarding alone.",
                TEST_SESSION_NAME
            );
        }

        let start_request = encode_pretty(&self.config.env_config)?;
        socket.send_frame(&start_request)?;
        debug!(identity = %self.identity, "Start request sent");

        self.socket = Some(socket);
        Ok(())
    }
}

impl<S: NetworkSocket> NorthboundClient<S> {
    /// Build a client on an already-established socket.
    ///
    /// The greeting and start request are the caller's concern; this is the
    /// entry point for tests and alternative transports.
    pub fn with_socket(client_id: u32, config: Config, socket: S) -> Self {
        let identity = SessionIdentity::new(config.session_name.as_str(), client_id);
        Self {
            identity,
            config,
            socket: Some(socket),
            end_ts: None,
        }
    }

    /// Send the policy for the current cycle.
    ///
    /// When the environment is not configured to wait for actions
    /// (`respond_action_after_measurement` is false) this is a no-op and
    /// nothing touches the wire. Otherwise the policy is injected into the
    /// action template under `action_list` and the result is transmitted as
    /// one frame. Blocking write.
    pub fn send(&mut self, policy: &Value) -> Result<()> {
        if !self.config.env_config.respond_action_after_measurement {
            debug!(identity = %self.identity, "Action responses disabled, dropping policy");
            return Ok(());
        }
        let socket = self.socket.as_mut().ok_or(ClientError::NotConnected)?;

        let mut action = self.config.action_template.clone();
        match action.as_object_mut() {
            Some(fields) => {
                fields.insert(ACTION_LIST_KEY.to_owned(), policy.clone());
            }
            None => {
                return Err(ClientError::Config(
                    "action_template must be a JSON object".into(),
                ))
            }
        }

        let payload = encode_pretty(&action)?;
        socket.send_frame(&payload)?;
        debug!(identity = %self.identity, "Action sent");
        Ok(())
    }

    /// Receive and classify the next reply. Blocks until a frame arrives;
    /// there is no timeout and no retry here.
    ///
    /// `Err` is reserved for transport failures. Everything the server
    /// actually said comes back as a [`Dispatch`]: a normalized measurement
    /// report, or a retryable/fatal classification for the caller to act
    /// on. A measurement that carries an `end_ts` column also updates the
    /// synchronization timestamp; one that does not leaves it unchanged.
    pub fn recv(&mut self) -> Result<Dispatch> {
        let socket = self.socket.as_mut().ok_or(ClientError::NotConnected)?;
        let frame = socket.recv_frame()?;

        let outcome = dispatch::dispatch(&self.identity, &frame);
        if let Dispatch::Measurement(report) = &outcome {
            if let Some(ts) = report::sync_timestamp(&report.data) {
                debug!(identity = %self.identity, end_ts = ts, "Synchronization timestamp updated");
                self.end_ts = Some(ts);
            }
        }
        Ok(outcome)
    }

    /// Tear down the connection. Idempotent; `send` and `recv` return
    /// [`ClientError::NotConnected`] afterwards.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut socket) = self.socket.take() {
            socket.close()?;
            info!(identity = %self.identity, "Connection closed");
        }
        Ok(())
    }

    /// Synchronization timestamp of the most recent measurement reply that
    /// carried one.
    pub fn end_ts(&self) -> Option<i64> {
        self.end_ts
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }
}

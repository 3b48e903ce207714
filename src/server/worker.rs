//! Single-session mock environment worker
//!
//! Stands in for the real environment server during tests and local runs:
//! it authenticates the greeting, consumes the start request, and serves
//! scripted measurement rounds.

use crate::protocol::error::Result;
use crate::protocol::{encode_pretty, read_frame, write_frame, Greeting};
use crate::server::config::WorkerConfig;
use serde_json::{json, Value};
use std::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

pub struct EnvWorker {
    config: WorkerConfig,
}

impl EnvWorker {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Accept sessions until the listener fails. One session at a time.
    pub fn run(&self, listener: TcpListener) -> Result<()> {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let peer = stream.peer_addr().ok();
                    info!(peer = ?peer, "Client connected");
                    if let Err(e) = self.serve(stream) {
                        warn!(peer = ?peer, error = %e, "Session ended with error");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                }
            }
        }
        Ok(())
    }

    /// Serve one client session to completion.
    ///
    /// A credential mismatch drops the connection without a reply; the
    /// client is expected to notice only through its blocked receive.
    pub fn serve(&self, mut stream: TcpStream) -> Result<()> {
        let frame = read_frame(&mut stream)?;
        let greeting: Greeting = serde_json::from_slice(&frame)?;
        if greeting.username != self.config.session_name
            || greeting.password != self.config.session_key
        {
            warn!(identity = %greeting.identity, "Credential mismatch, dropping session");
            return Ok(());
        }
        info!(identity = %greeting.identity, "Session authenticated");

        let frame = read_frame(&mut stream)?;
        let env_config: Value = serde_json::from_slice(&frame)?;
        let respond_action = env_config
            .get("respond_action_after_measurement")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        info!(
            identity = %greeting.identity,
            respond_action = respond_action,
            "Start request received"
        );

        if self.config.unavailable {
            let reply = json!({"type": "no-available-worker"});
            write_frame(&mut stream, &encode_pretty(&reply)?)?;
            info!(identity = %greeting.identity, "No worker available, session refused");
            return Ok(());
        }

        let mut start_ts: i64 = 0;
        for round in 0..self.config.rounds {
            let end_ts = start_ts + self.config.window_ms;
            let reply = self.measurement_reply(start_ts, end_ts);
            write_frame(&mut stream, &encode_pretty(&reply)?)?;
            debug!(round = round, end_ts = end_ts, "Measurement sent");

            if respond_action {
                let frame = read_frame(&mut stream)?;
                let action: Value = serde_json::from_slice(&frame)?;
                debug!(round = round, action = %action, "Action received");
            }
            start_ts = end_ts;
        }

        info!(
            identity = %greeting.identity,
            rounds = self.config.rounds,
            "Session complete"
        );
        Ok(())
    }

    /// One scripted measurement reply for the given window.
    fn measurement_reply(&self, start_ts: i64, end_ts: i64) -> Value {
        json!({
            "type": "env-measurement",
            "metric_list": [
                {"name": "start_ts", "value": start_ts.to_string(), "group": "GMA", "cid": "All", "direction": "DL"},
                {"name": "end_ts", "value": end_ts.to_string(), "group": "GMA", "cid": "All", "direction": "DL"},
                {"name": "rate", "value": 42.0, "group": "GMA", "cid": "All", "direction": "DL", "unit": "mbps"},
                {"name": "owd", "value": 13, "group": "GMA", "cid": "All", "direction": "DL", "unit": "ms"},
                {"name": "measurement_ok", "value": 1, "group": "GMA", "cid": "All", "direction": "DL"},
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Reply;

    fn sample_config() -> WorkerConfig {
        WorkerConfig {
            bind: "127.0.0.1".to_string(),
            port: 0,
            session_name: "test".to_string(),
            session_key: "test".to_string(),
            rounds: 2,
            window_ms: 100,
            unavailable: false,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }

    #[test]
    fn test_measurement_reply_decodes() {
        let worker = EnvWorker::new(sample_config());
        let reply = worker.measurement_reply(0, 100);
        let bytes = serde_json::to_vec(&reply).unwrap();

        match Reply::decode(&bytes).unwrap() {
            Reply::Measurement { metric_list } => {
                assert_eq!(metric_list.len(), 5);
                let end_ts = metric_list.iter().find(|m| m.name == "end_ts").unwrap();
                assert_eq!(end_ts.value, serde_json::json!("100"));
            }
            other => panic!("expected measurement, got {:?}", other),
        }
    }

    #[test]
    fn test_window_advances() {
        let worker = EnvWorker::new(sample_config());
        let first = worker.measurement_reply(0, 100);
        let second = worker.measurement_reply(100, 200);
        assert_eq!(first["metric_list"][0]["value"], "0");
        assert_eq!(second["metric_list"][0]["value"], "100");
        assert_eq!(second["metric_list"][1]["value"], "200");
    }
}

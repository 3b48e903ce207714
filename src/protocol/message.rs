use crate::protocol::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Greeting frame presented once at connect time, before the start request.
/// Carries the routing identity and the plain username/password pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    pub identity: String,
    pub username: String,
    pub password: String,
}

/// One entry of a measurement reply's `metric_list`.
///
/// `name` and `value` are mandatory; the contextual tags (`group`, `cid`,
/// `direction`) vary by metric. Fields outside the named set are preserved
/// in `extra` so nothing the server sends is lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub name: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Inbound reply, classified by its `type` discriminator.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The server has no free worker for this session.
    NoAvailableWorker,
    /// A measurement reply carrying metric records.
    Measurement { metric_list: Vec<MetricRecord> },
    /// The simulation stopped with an error.
    EnvError { message: Option<String> },
    /// A discriminator this client does not understand.
    Unknown { kind: String },
}

impl Reply {
    /// Decode one inbound frame.
    ///
    /// Validation happens here, at the deserialization boundary: malformed
    /// JSON, a missing `type` discriminator, and a measurement without
    /// `metric_list` are all typed errors. An unrecognized discriminator is
    /// not an error at this layer; it decodes to [`Reply::Unknown`] and the
    /// dispatcher decides what to do with it.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingType)?
            .to_owned();

        debug!(kind = %kind, "Reply decoded");

        match kind.as_str() {
            "no-available-worker" => Ok(Reply::NoAvailableWorker),
            "env-measurement" => {
                let metrics = value
                    .get("metric_list")
                    .cloned()
                    .ok_or(ProtocolError::MissingField("metric_list"))?;
                let metric_list = serde_json::from_value(metrics)?;
                Ok(Reply::Measurement { metric_list })
            }
            "env-error" => {
                let message = value
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                Ok(Reply::EnvError { message })
            }
            _ => Ok(Reply::Unknown { kind }),
        }
    }
}

/// Serialize an outbound message to human-readably indented UTF-8 JSON,
/// the format the server expects one of per frame.
pub fn encode_pretty<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(message)?)
}

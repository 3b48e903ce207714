use crate::client::identity::SessionIdentity;
use crate::client::report::{self, MeasurementReport};
use crate::protocol::Reply;
use tracing::{error, warn};

/// Outcome of classifying one inbound reply.
///
/// Only a measurement returns data; the other classes end the session from
/// the core's point of view, but the decision to terminate, back off, or
/// reconnect stays with the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// A measurement reply, normalized into a report.
    Measurement(MeasurementReport),
    /// The server had no free worker; a later attempt may succeed.
    Retryable(String),
    /// The session cannot continue.
    Fatal(String),
}

impl Dispatch {
    /// True for every class that does not carry a report.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Dispatch::Measurement(_))
    }
}

/// Classify one raw inbound frame.
///
/// Each frame is classified independently; there are no intermediate
/// states. Abnormal replies are logged here, with the raw payload, before
/// being surfaced as a value.
pub fn dispatch(identity: &SessionIdentity, frame: &[u8]) -> Dispatch {
    let raw = String::from_utf8_lossy(frame);

    let reply = match Reply::decode(frame) {
        Ok(reply) => reply,
        Err(e) => {
            error!(identity = %identity, raw = %raw, error = %e, "Undecodable reply");
            return Dispatch::Fatal(format!("undecodable reply: {}", e));
        }
    };

    match reply {
        Reply::Measurement { metric_list } => {
            Dispatch::Measurement(report::build(&metric_list))
        }
        Reply::NoAvailableWorker => {
            warn!(identity = %identity, raw = %raw, "No available worker, retry later");
            Dispatch::Retryable("no available worker".to_owned())
        }
        Reply::EnvError { message } => {
            error!(identity = %identity, raw = %raw, "Simulation stopped with error");
            Dispatch::Fatal(match message {
                Some(message) => format!("environment error: {}", message),
                None => "environment error".to_owned(),
            })
        }
        Reply::Unknown { kind } => {
            error!(identity = %identity, raw = %raw, kind = %kind, "Unknown message type");
            Dispatch::Fatal(format!("unknown message type `{}`", kind))
        }
    }
}

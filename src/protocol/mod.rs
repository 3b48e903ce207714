//! Wire protocol for the northbound interface

pub mod error;
pub mod frame;
pub mod message;

pub use error::{ProtocolError, Result as ProtocolResult};
pub use frame::{read_frame, write_frame, FRAME_HEADER_LEN, MAX_FRAME_LEN};
pub use message::{encode_pretty, Greeting, MetricRecord, Reply};

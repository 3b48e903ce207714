//! Client module for the axon northbound interface

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod logging;
pub mod northbound;
pub mod report;
pub mod socket;

pub use config::{Config, EnvConfig};
pub use constants::*;
pub use dispatch::Dispatch;
pub use error::{ClientError, Result};
pub use identity::{PlainCredentials, SessionIdentity};
pub use logging::{init_logging, init_logging_with_config};
pub use northbound::NorthboundClient;
pub use report::{build, project, sync_timestamp, MeasurementReport, MetricTable};
pub use socket::{NetworkSocket, TcpNetworkSocket};

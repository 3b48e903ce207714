//! Mock environment server for exercising northbound clients

pub mod config;
pub mod worker;

pub use config::WorkerConfig;
pub use worker::EnvWorker;

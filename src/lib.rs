pub mod config;
pub mod core;
pub mod engine;
pub mod invoker;
pub mod parser;
pub mod service;
pub mod cli;
pub mod utils;

#[cfg(feature = "api")]
pub mod api;

pub use crate::core::EngineHost;
pub use engine::{Engine, EngineError, ExecutionError, ScanResult};
pub use service::ScannerService;

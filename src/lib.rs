// src/lib.rs
pub mod config;
pub mod connectors;
pub mod core;
pub mod error;
pub mod strategies;
pub mod types;
pub mod utils;

pub use crate::config::AppConfig;
pub use crate::connectors::binance::BinanceFuturesClient;
pub use crate::connectors::traits::ExchangeGateway;
pub use crate::core::engine::{CycleOutcome, TradingEngine};
pub use crate::error::{EngineError, Result};

// src/config.rs

use crate::error::{EngineError, Result};
use crate::types::{Interval, MarginType};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Binance caps a klines request at 1500 rows.
const MAX_CANDLE_LIMIT: usize = 1500;
const MAX_LEVERAGE: u32 = 125;

/// Informational volatility check. It is logged each cycle and never blocks a trade.
#[derive(Debug, Deserialize, Clone)]
pub struct VolatilityConfig {
    pub enabled: bool,
    pub interval: Interval,
    pub lookback: usize,
    pub threshold: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub secret_key: String,
    pub base_url: String,
    pub symbol: String,
    pub quote_asset: String,
    pub interval: Interval,
    pub fast_window: usize,
    pub slow_window: usize,
    pub leverage: u32,
    pub margin_type: MarginType,
    /// Share of the quote balance committed per entry, before leverage.
    pub balance_fraction: Decimal,
    pub candle_limit: usize,
    pub retry_backoff_secs: u64,
    /// Minimum distance to a candle close before the scheduler skips to the next one.
    pub boundary_guard_secs: u64,
    pub recv_window_ms: u64,
    pub request_timeout_secs: u64,
    pub volatility: VolatilityConfig,
}

impl AppConfig {
    /// Defaults, then an optional `Settings` file, then `APP_*` environment variables.
    pub fn new() -> Result<Self> {
        Self::load("Settings")
    }

    pub fn load(file: &str) -> Result<Self> {
        let builder = Self::defaults()?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::finish(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        // Conventional credential variables act as defaults; APP_API_KEY / APP_SECRET_KEY win.
        let api_key = std::env::var("BINANCE_API_KEY").unwrap_or_default();
        let secret_key = std::env::var("BINANCE_SECRET_KEY").unwrap_or_default();

        let builder = Config::builder()
            .set_default("api_key", api_key)?
            .set_default("secret_key", secret_key)?
            .set_default("base_url", "https://fapi.binance.com")?
            .set_default("symbol", "SOLUSDT")?
            .set_default("quote_asset", "USDT")?
            .set_default("interval", "1h")?
            .set_default("fast_window", 7)?
            .set_default("slow_window", 40)?
            .set_default("leverage", 2)?
            .set_default("margin_type", "ISOLATED")?
            .set_default("balance_fraction", "0.90")?
            .set_default("candle_limit", 1000)?
            .set_default("retry_backoff_secs", 60)?
            .set_default("boundary_guard_secs", 10)?
            .set_default("recv_window_ms", 60_000)?
            .set_default("request_timeout_secs", 30)?
            .set_default("volatility.enabled", true)?
            .set_default("volatility.interval", "15m")?
            .set_default("volatility.lookback", 20)?
            .set_default("volatility.threshold", "0.05")?;
        Ok(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the engine cannot run with. Every failure here is fatal.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(EngineError::Configuration(msg));

        if self.api_key.trim().is_empty() || self.secret_key.trim().is_empty() {
            return fail(
                "API credentials missing: set BINANCE_API_KEY and BINANCE_SECRET_KEY".to_string(),
            );
        }
        if self.symbol.trim().is_empty() {
            return fail("symbol must not be empty".to_string());
        }
        if self.fast_window == 0 || self.slow_window == 0 {
            return fail("moving average windows must be positive".to_string());
        }
        if self.fast_window >= self.slow_window {
            return fail(format!(
                "fast_window ({}) must be shorter than slow_window ({})",
                self.fast_window, self.slow_window
            ));
        }
        if self.balance_fraction <= Decimal::ZERO || self.balance_fraction > Decimal::ONE {
            return fail(format!(
                "balance_fraction must be in (0, 1], got {}",
                self.balance_fraction
            ));
        }
        if self.leverage == 0 || self.leverage > MAX_LEVERAGE {
            return fail(format!(
                "leverage must be within 1..={}, got {}",
                MAX_LEVERAGE, self.leverage
            ));
        }
        if self.candle_limit < self.slow_window + 2 || self.candle_limit > MAX_CANDLE_LIMIT {
            return fail(format!(
                "candle_limit must be within {}..={}, got {}",
                self.slow_window + 2,
                MAX_CANDLE_LIMIT,
                self.candle_limit
            ));
        }
        if self.retry_backoff_secs == 0 {
            return fail("retry_backoff_secs must be positive".to_string());
        }
        if self.boundary_guard_secs >= self.interval.period_secs() {
            return fail(format!(
                "boundary_guard_secs ({}) must be shorter than the {} candle",
                self.boundary_guard_secs, self.interval
            ));
        }
        if let Err(e) = url::Url::parse(&self.base_url) {
            return fail(format!("base_url '{}' is invalid: {}", self.base_url, e));
        }
        if self.volatility.enabled && self.volatility.lookback < 3 {
            return fail("volatility.lookback needs at least 3 candles".to_string());
        }
        Ok(())
    }
}

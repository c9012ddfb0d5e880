// src/connectors/traits.rs
use crate::error::Result;
use crate::types::{
    Candle, Interval, MarginType, OrderConfirmation, OrderIntent, Position, SymbolFilters,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Everything the decision engine needs from a futures exchange account.
///
/// Timeouts are the implementor's job; they surface as `EngineError::Connectivity`.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    async fn server_time(&self) -> Result<DateTime<Utc>>;

    /// Most recent candles, oldest first. Every element but the last is closed;
    /// the last one is the candle currently forming.
    async fn recent_candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>>;

    async fn account_balance(&self, asset: &str) -> Result<Decimal>;

    async fn current_price(&self, symbol: &str) -> Result<Decimal>;

    async fn position(&self, symbol: &str) -> Result<Position>;

    /// Fails with `EngineError::OrderRejected` when the exchange declines the order.
    async fn submit_market_order(
        &self,
        symbol: &str,
        intent: &OrderIntent,
    ) -> Result<OrderConfirmation>;

    // Account configuration. "No change needed" answers count as success.
    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()>;

    async fn set_margin_type(&self, symbol: &str, margin_type: MarginType) -> Result<()>;

    async fn set_position_mode(&self, one_way: bool) -> Result<()>;

    async fn symbol_filters(&self, symbol: &str) -> Result<SymbolFilters>;
}

// src/core/engine.rs
use crate::config::AppConfig;
use crate::connectors::traits::ExchangeGateway;
use crate::core::reconciler::{reconcile, Transition};
use crate::core::scheduler::Scheduler;
use crate::core::sizer;
use crate::error::{EngineError, Result};
use crate::strategies::{crossover, volatility};
use crate::types::{OperationRecord, OrderIntent, Position, Side, Signal, SymbolFilters};
use chrono::Utc;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How a single decision cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The exchange returned no candles; the cycle is retried after the backoff.
    NoData,
    /// Nothing to do for this signal/position pair.
    Held {
        signal: Signal,
        position: Position,
        reason: &'static str,
    },
    /// Order accepted and recorded.
    Executed(OperationRecord),
    /// Exchange declined the order. Not retried until the next candle.
    Rejected { intent: OrderIntent, reason: String },
    /// A non-retryable fault ended the cycle. The loop waits for the next candle.
    Failed { reason: String },
}

pub struct TradingEngine {
    config: AppConfig,
    gateway: Box<dyn ExchangeGateway>,
    filters: SymbolFilters,
    scheduler: Scheduler,
    retry_backoff: Duration,
    journal: Vec<OperationRecord>,
}

impl TradingEngine {
    pub fn new(config: AppConfig, gateway: Box<dyn ExchangeGateway>, filters: SymbolFilters) -> Self {
        let scheduler = Scheduler::new(config.interval.period_secs(), config.boundary_guard_secs);
        let retry_backoff = Duration::from_secs(config.retry_backoff_secs);
        Self {
            config,
            gateway,
            filters,
            scheduler,
            retry_backoff,
            journal: Vec::new(),
        }
    }

    /// Validates the config, loads symbol filters and configures the account.
    ///
    /// Only configuration problems are returned; connectivity failures while
    /// fetching filters are retried with the usual backoff.
    pub async fn bootstrap(config: AppConfig, gateway: Box<dyn ExchangeGateway>) -> Result<Self> {
        config.validate()?;

        info!(
            symbol = %config.symbol,
            interval = %config.interval,
            fast = config.fast_window,
            slow = config.slow_window,
            leverage = config.leverage,
            margin = %config.margin_type,
            "Starting USDT-M futures engine | MA {}x{}",
            config.fast_window,
            config.slow_window
        );

        let backoff = Duration::from_secs(config.retry_backoff_secs);
        let filters = loop {
            match gateway.symbol_filters(&config.symbol).await {
                Ok(filters) => break filters,
                Err(EngineError::Configuration(msg)) => {
                    return Err(EngineError::Configuration(msg));
                }
                Err(e) => {
                    warn!(error = %e, "[Filters] Could not load symbol filters. Retrying in {}s", backoff.as_secs());
                    tokio::time::sleep(backoff).await;
                }
            }
        };

        if filters.step_size < Decimal::ZERO || filters.min_notional < Decimal::ZERO {
            return Err(EngineError::Configuration(format!(
                "exchange reported negative filters for {}: {:?}",
                config.symbol, filters
            )));
        }
        info!(step_size = %filters.step_size, min_notional = %filters.min_notional, "[Filters] Cached");

        let engine = Self::new(config, gateway, filters);
        engine.configure_account().await;
        Ok(engine)
    }

    /// One-way mode, margin type and leverage. Failures are only warnings:
    /// the account is usually already in the wanted mode.
    pub async fn configure_account(&self) {
        let symbol = &self.config.symbol;

        if let Err(e) = self.gateway.set_position_mode(true).await {
            warn!(error = %e, "[Position Mode] Could not switch to one-way mode");
        }
        if let Err(e) = self.gateway.set_margin_type(symbol, self.config.margin_type).await {
            warn!(error = %e, margin = %self.config.margin_type, "[Margin Type] Could not set margin type");
        }
        if let Err(e) = self.gateway.set_leverage(symbol, self.config.leverage).await {
            warn!(error = %e, leverage = self.config.leverage, "[Leverage] Could not set leverage");
        }
    }

    pub fn journal(&self) -> &[OperationRecord] {
        &self.journal
    }

    pub fn filters(&self) -> &SymbolFilters {
        &self.filters
    }

    /// Runs forever: decide once per closed candle, then wait for the next close.
    pub async fn run(&mut self) {
        info!("Engine loop running");
        loop {
            let outcome = self.decide_with_retry().await;
            debug!(?outcome, "Cycle finished");

            if self.config.volatility.enabled {
                self.measure_volatility().await;
            }

            self.scheduler
                .wait_for_next_boundary(self.gateway.as_ref())
                .await;
        }
    }

    /// Repeats the cycle after `retry_backoff` while faults are transient.
    ///
    /// A retried cycle restarts from the top with fresh exchange state, so an
    /// order whose fate is unknown is never resubmitted blindly. Faults that a
    /// retry cannot fix end the cycle at once.
    pub async fn decide_with_retry(&mut self) -> CycleOutcome {
        loop {
            match self.run_cycle().await {
                Ok(CycleOutcome::NoData) => {
                    warn!("[Data] No candles returned. Retrying in {}s", self.retry_backoff.as_secs());
                }
                Ok(outcome) => return outcome,
                Err(e) if e.is_retryable() => {
                    error!(error = %e, "[API Error] Retrying in {}s", self.retry_backoff.as_secs());
                }
                Err(e) => {
                    error!(error = %e, "[Error] Skipping this candle");
                    return CycleOutcome::Failed {
                        reason: e.to_string(),
                    };
                }
            }
            tokio::time::sleep(self.retry_backoff).await;
        }
    }

    /// One pass of the decision pipeline. Exchange writes only happen once an
    /// intent exists.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let symbol = self.config.symbol.clone();

        let candles = self
            .gateway
            .recent_candles(&symbol, self.config.interval, self.config.candle_limit)
            .await?;
        if candles.is_empty() {
            return Ok(CycleOutcome::NoData);
        }

        let reading =
            crossover::evaluate(&candles, self.config.fast_window, self.config.slow_window);
        debug!(
            fast = ?reading.fast,
            slow = ?reading.slow,
            candles = candles.len(),
            "[MA] Fast({}) vs Slow({}) on the candle that just closed",
            self.config.fast_window,
            self.config.slow_window
        );

        let position = self.gateway.position(&symbol).await?;

        let transition = match reconcile(reading.signal, &position) {
            Some(t) => t,
            None => {
                let reason = hold_reason(reading.signal, &position);
                info!(signal = %reading.signal, position = %position, action = "HOLD", reason, "[Cycle]");
                return Ok(CycleOutcome::Held {
                    signal: reading.signal,
                    position,
                    reason,
                });
            }
        };

        self.execute(reading.signal, position, transition).await
    }

    async fn execute(
        &mut self,
        signal: Signal,
        position: Position,
        transition: Transition,
    ) -> Result<CycleOutcome> {
        let symbol = self.config.symbol.clone();
        let price = self.gateway.current_price(&symbol).await?;
        let balance = self.gateway.account_balance(&self.config.quote_asset).await?;

        let entry_qty = match transition {
            Transition::Open => sizer::size(
                balance,
                price,
                self.config.balance_fraction,
                self.config.leverage,
                &self.filters,
            ),
            Transition::Close(_) => Decimal::ZERO,
        };

        let intent = match transition.into_intent(entry_qty) {
            Some(intent) => intent,
            None => {
                warn!(balance = %balance, quote = %self.config.quote_asset, "[Qty] Insufficient balance for an entry");
                info!(signal = %signal, position = %position, action = "HOLD", reason = "zero size", "[Cycle]");
                return Ok(CycleOutcome::Held {
                    signal,
                    position,
                    reason: "sized quantity is zero",
                });
            }
        };

        let label = match intent.side {
            Side::Buy => "[Entry] Opening LONG",
            Side::Sell => "[Exit] Closing LONG",
        };
        info!(qty = %intent.quantity, price = %price, "{} qty={} @ ~{}", label, intent.quantity, price);

        match self.gateway.submit_market_order(&symbol, &intent).await {
            Ok(confirmation) => {
                info!(
                    order_id = %confirmation.order_id,
                    status = %confirmation.status,
                    executed_qty = %confirmation.executed_qty,
                    avg_price = %confirmation.avg_price,
                    "✅ Order accepted"
                );

                let account_balance = match self.gateway.account_balance(&self.config.quote_asset).await {
                    Ok(after) => after,
                    Err(e) => {
                        warn!(error = %e, "[Balance] Could not refresh balance after fill; recording pre-trade balance");
                        balance
                    }
                };

                let record = OperationRecord {
                    timestamp: Utc::now(),
                    action: intent.side,
                    quantity: intent.quantity,
                    price,
                    signal_strength: match intent.side {
                        Side::Buy => Decimal::ONE,
                        Side::Sell => Decimal::NEGATIVE_ONE,
                    },
                    account_balance,
                };
                self.journal.push(record.clone());

                info!(signal = %signal, position = %position, action = %intent.side, qty = %intent.quantity, "[Cycle]");
                Ok(CycleOutcome::Executed(record))
            }
            Err(EngineError::OrderRejected(reason)) => {
                error!(reason = %reason, side = %intent.side, qty = %intent.quantity, "⚠️ Order rejected");
                info!(signal = %signal, position = %position, action = "REJECTED", "[Cycle]");
                Ok(CycleOutcome::Rejected { intent, reason })
            }
            Err(e) => Err(e),
        }
    }

    /// Logs short-term volatility. Never affects trading; failures are only warnings.
    async fn measure_volatility(&self) {
        let settings = &self.config.volatility;
        let candles = match self
            .gateway
            .recent_candles(&self.config.symbol, settings.interval, settings.lookback)
            .await
        {
            Ok(candles) => candles,
            Err(e) => {
                warn!(error = %e, "[Vol] Could not measure volatility");
                return;
            }
        };

        match volatility::is_volatile(&candles, settings.threshold) {
            Some((sigma, volatile)) => info!(
                sigma = %sigma.round_dp(4),
                threshold = %settings.threshold,
                volatile,
                "[Vol] σ(returns {})",
                settings.interval
            ),
            None => debug!(candles = candles.len(), "[Vol] Not enough candles"),
        }
    }
}

fn hold_reason(signal: Signal, position: &Position) -> &'static str {
    match signal {
        Signal::Hold => "no crossover",
        Signal::Buy if position.is_long() => "already long",
        Signal::Buy => "short position open",
        Signal::Sell if position.is_flat() => "already flat",
        Signal::Sell => "short position open",
    }
}

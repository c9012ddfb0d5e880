// src/types.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed candlestick, reduced to what the crossover needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub close_time: DateTime<Utc>,
    pub close_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => f.write_str("BUY"),
            Signal::Sell => f.write_str("SELL"),
            Signal::Hold => f.write_str("HOLD"),
        }
    }
}

/// Net position on the exchange. Positive = long, negative = short, zero = flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub size: Decimal,
}

impl Position {
    pub fn flat() -> Self {
        Self { size: Decimal::ZERO }
    }

    pub fn new(size: Decimal) -> Self {
        Self { size }
    }

    pub fn is_flat(&self) -> bool {
        self.size.is_zero()
    }

    pub fn is_long(&self) -> bool {
        self.size.is_sign_positive() && !self.size.is_zero()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.size.normalize())
    }
}

/// Exchange quantization rules for one symbol, fetched once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolFilters {
    pub step_size: Decimal,
    pub min_notional: Decimal,
}

/// The single order the engine may emit in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub side: Side,
    pub quantity: Decimal,
    pub reduce_only: bool,
}

impl OrderIntent {
    /// Opening market buy.
    pub fn open_long(quantity: Decimal) -> Self {
        Self {
            side: Side::Buy,
            quantity,
            reduce_only: false,
        }
    }

    /// Reduce-only market sell for the full size of a long position.
    pub fn close_long(position: &Position) -> Self {
        Self {
            side: Side::Sell,
            quantity: position.size.abs(),
            reduce_only: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: String,
    pub client_order_id: String,
    pub symbol: String,
    pub status: String,
    pub executed_qty: Decimal,
    pub avg_price: Decimal,
}

/// Audit entry for an executed intent. Written, never read back by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub timestamp: DateTime<Utc>,
    pub action: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub signal_strength: Decimal,
    pub account_balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarginType {
    Isolated,
    Crossed,
}

impl MarginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarginType::Isolated => "ISOLATED",
            MarginType::Crossed => "CROSSED",
        }
    }
}

impl fmt::Display for MarginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candle period, using Binance's interval notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    M1,
    M3,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    H6,
    H8,
    H12,
    D1,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M3 => "3m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H2 => "2h",
            Interval::H4 => "4h",
            Interval::H6 => "6h",
            Interval::H8 => "8h",
            Interval::H12 => "12h",
            Interval::D1 => "1d",
        }
    }

    pub fn period_secs(&self) -> u64 {
        match self {
            Interval::M1 => 60,
            Interval::M3 => 3 * 60,
            Interval::M5 => 5 * 60,
            Interval::M15 => 15 * 60,
            Interval::M30 => 30 * 60,
            Interval::H1 => 3600,
            Interval::H2 => 2 * 3600,
            Interval::H4 => 4 * 3600,
            Interval::H6 => 6 * 3600,
            Interval::H8 => 8 * 3600,
            Interval::H12 => 12 * 3600,
            Interval::D1 => 24 * 3600,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let interval = match s.trim() {
            "1m" => Interval::M1,
            "3m" => Interval::M3,
            "5m" => Interval::M5,
            "15m" => Interval::M15,
            "30m" => Interval::M30,
            "1h" => Interval::H1,
            "2h" => Interval::H2,
            "4h" => Interval::H4,
            "6h" => Interval::H6,
            "8h" => Interval::H8,
            "12h" => Interval::H12,
            "1d" => Interval::D1,
            other => return Err(format!("unsupported candle interval '{}'", other)),
        };
        Ok(interval)
    }
}

impl TryFrom<String> for Interval {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_interval_round_trip_and_period() {
        let h1: Interval = "1h".parse().unwrap();
        assert_eq!(h1, Interval::H1);
        assert_eq!(h1.period_secs(), 3600);
        assert_eq!(Interval::M15.period_secs(), 900);
        assert!("7h".parse::<Interval>().is_err());
    }

    #[test]
    fn test_position_direction() {
        assert!(Position::flat().is_flat());
        assert!(Position::new(dec!(2.5)).is_long());
        assert!(!Position::new(dec!(-1)).is_long());
        assert!(!Position::new(dec!(-1)).is_flat());
        // Binance reports a flat position as "0.000"
        assert!(Position::new(dec!(0.000)).is_flat());
        assert!(!Position::new(dec!(0.000)).is_long());
    }

    #[test]
    fn test_close_long_uses_full_size() {
        let intent = OrderIntent::close_long(&Position::new(dec!(2.5)));
        assert_eq!(intent.side, Side::Sell);
        assert_eq!(intent.quantity, dec!(2.5));
        assert!(intent.reduce_only);
    }
}

// src/strategies/volatility.rs
use crate::types::Candle;
use rust_decimal::{Decimal, MathematicalOps};

/// Sample standard deviation of simple close-to-close returns.
///
/// Needs at least three candles (two returns). Zero closes are skipped
/// since a return cannot be computed from them.
pub fn returns_std_dev(candles: &[Candle]) -> Option<Decimal> {
    let returns: Vec<Decimal> = candles
        .windows(2)
        .filter(|w| !w[0].close_price.is_zero())
        .map(|w| (w[1].close_price - w[0].close_price) / w[0].close_price)
        .collect();

    if returns.len() < 2 {
        return None;
    }

    let n = Decimal::from(returns.len() as u64);
    let mean = returns.iter().copied().sum::<Decimal>() / n;
    let variance = returns
        .iter()
        .map(|r| (*r - mean) * (*r - mean))
        .sum::<Decimal>()
        / (n - Decimal::ONE);

    variance.sqrt()
}

/// Informational only: the engine logs this, it never gates an order.
pub fn is_volatile(candles: &[Candle], threshold: Decimal) -> Option<(Decimal, bool)> {
    returns_std_dev(candles).map(|sigma| (sigma, sigma > threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn candles(closes: &[Decimal]) -> Vec<Candle> {
        closes
            .iter()
            .map(|p| Candle {
                close_time: Utc::now(),
                close_price: *p,
            })
            .collect()
    }

    #[test]
    fn test_flat_market_has_zero_volatility() {
        let sigma = returns_std_dev(&candles(&[dec!(100); 5])).unwrap();
        assert_eq!(sigma, Decimal::ZERO);
    }

    #[test]
    fn test_alternating_returns() {
        let sigma = returns_std_dev(&candles(&[dec!(100), dec!(110), dec!(99)])).unwrap();
        // returns 0.1 and -0.1, mean 0, sample variance 0.02
        let expected = dec!(0.02).sqrt().unwrap();
        assert!((sigma - expected).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_too_few_candles() {
        assert!(returns_std_dev(&candles(&[dec!(100), dec!(101)])).is_none());
        assert!(returns_std_dev(&[]).is_none());
    }

    #[test]
    fn test_threshold_flag() {
        let calm = candles(&[dec!(100), dec!(100.1), dec!(100)]);
        let (_, volatile) = is_volatile(&calm, dec!(0.05)).unwrap();
        assert!(!volatile);

        let wild = candles(&[dec!(100), dec!(130), dec!(90), dec!(140)]);
        let (_, volatile) = is_volatile(&wild, dec!(0.05)).unwrap();
        assert!(volatile);
    }
}

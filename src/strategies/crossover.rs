// src/strategies/crossover.rs
use crate::types::{Candle, Signal};
use rust_decimal::Decimal;

/// Moving averages read at the last fully closed candle, plus the resulting signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverReading {
    pub fast: Option<Decimal>,
    pub slow: Option<Decimal>,
    pub signal: Signal,
}

impl CrossoverReading {
    fn hold() -> Self {
        Self {
            fast: None,
            slow: None,
            signal: Signal::Hold,
        }
    }
}

/// Trailing simple moving average. Entry `i` is the mean of `values[i+1-window..=i]`,
/// or `None` while fewer than `window` values are available.
pub fn sma_series(values: &[Decimal], window: usize) -> Vec<Option<Decimal>> {
    let mut out = Vec::with_capacity(values.len());
    if window == 0 {
        out.resize(values.len(), None);
        return out;
    }

    let divisor = Decimal::from(window as u64);
    let mut sum = Decimal::ZERO;
    for (i, value) in values.iter().enumerate() {
        sum += *value;
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out.push(Some(sum / divisor));
        } else {
            out.push(None);
        }
    }
    out
}

/// Evaluates the fast/slow crossover on the penultimate candle of `candles`.
///
/// The newest candle is never read, so a revision of it by the exchange
/// cannot change the outcome.
pub fn evaluate(candles: &[Candle], fast_window: usize, slow_window: usize) -> CrossoverReading {
    if fast_window == 0 || slow_window == 0 {
        return CrossoverReading::hold();
    }
    if candles.len() < fast_window.max(slow_window) + 2 {
        return CrossoverReading::hold();
    }

    let closes: Vec<Decimal> = candles.iter().map(|c| c.close_price).collect();
    let idx = closes.len() - 2;
    let fast = sma_series(&closes, fast_window)[idx];
    let slow = sma_series(&closes, slow_window)[idx];

    let signal = match (fast, slow) {
        (Some(f), Some(s)) if f > s => Signal::Buy,
        (Some(f), Some(s)) if f < s => Signal::Sell,
        _ => Signal::Hold,
    };

    CrossoverReading { fast, slow, signal }
}

/// Trade direction from a series ending with the forming candle. Pure and deterministic.
pub fn signal(candles: &[Candle], fast_window: usize, slow_window: usize) -> Signal {
    evaluate(candles, fast_window, slow_window).signal
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn candles(closes: &[Decimal]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, price)| Candle {
                close_time: Utc.timestamp_opt(3600 * (i as i64 + 1) - 1, 0).unwrap(),
                close_price: *price,
            })
            .collect()
    }

    #[test]
    fn test_sma_series() {
        let series = sma_series(&[dec!(1), dec!(2), dec!(3), dec!(4)], 2);
        assert_eq!(
            series,
            vec![None, Some(dec!(1.5)), Some(dec!(2.5)), Some(dec!(3.5))]
        );
    }

    #[test]
    fn test_sma_series_window_larger_than_input() {
        assert_eq!(sma_series(&[dec!(1), dec!(2)], 5), vec![None, None]);
    }

    #[test]
    fn test_buy_when_fast_above_slow() {
        // slow(4) at penultimate = (90+100+100+110)/4 = 100, fast(2) = (100+110)/2 = 105
        let history = candles(&[dec!(50), dec!(90), dec!(100), dec!(100), dec!(110), dec!(1)]);
        let reading = evaluate(&history, 2, 4);
        assert_eq!(reading.fast, Some(dec!(105)));
        assert_eq!(reading.slow, Some(dec!(100)));
        assert_eq!(reading.signal, Signal::Buy);
    }

    #[test]
    fn test_just_closed_candle_triggers_entry() {
        // 200 is the candle that just closed, 201 is still forming
        let history = candles(&[
            dec!(100),
            dec!(100),
            dec!(100),
            dec!(100),
            dec!(100),
            dec!(200),
            dec!(201),
        ]);
        let reading = evaluate(&history, 2, 4);
        assert_eq!(reading.fast, Some(dec!(150)));
        assert_eq!(reading.slow, Some(dec!(125)));
        assert_eq!(reading.signal, Signal::Buy);
    }

    #[test]
    fn test_sell_when_fast_below_slow() {
        let history = candles(&[dec!(50), dec!(110), dec!(100), dec!(100), dec!(90), dec!(500)]);
        assert_eq!(signal(&history, 2, 4), Signal::Sell);
    }

    #[test]
    fn test_hold_when_equal() {
        let history = candles(&[dec!(100); 8]);
        assert_eq!(signal(&history, 2, 4), Signal::Hold);
    }

    #[test]
    fn test_insufficient_history_is_hold() {
        // Exactly fast_window candles, steeply rising
        let history = candles(&[dec!(1), dec!(2), dec!(3), dec!(4), dec!(5), dec!(6), dec!(70)]);
        assert_eq!(signal(&history, 7, 40), Signal::Hold);

        // One short of max(fast, slow) + 2
        let history = candles(&[dec!(1), dec!(2), dec!(3), dec!(4), dec!(500)]);
        assert_eq!(signal(&history, 2, 4), Signal::Hold);
    }

    #[test]
    fn test_zero_window_is_hold() {
        let history = candles(&[dec!(1); 10]);
        assert_eq!(signal(&history, 0, 4), Signal::Hold);
    }

    #[test]
    fn test_deterministic() {
        let history = candles(&[dec!(50), dec!(90), dec!(100), dec!(100), dec!(110), dec!(1)]);
        let first = evaluate(&history, 2, 4);
        for _ in 0..10 {
            assert_eq!(evaluate(&history, 2, 4), first);
        }
    }

    #[test]
    fn test_newest_candle_never_affects_signal() {
        let base = [dec!(50), dec!(90), dec!(100), dec!(100), dec!(110)];
        let expected = {
            let mut closes = base.to_vec();
            closes.push(dec!(110));
            signal(&candles(&closes), 2, 4)
        };
        for last in [dec!(0.01), dec!(1), dec!(105), dec!(100000)] {
            let mut closes = base.to_vec();
            closes.push(last);
            assert_eq!(signal(&candles(&closes), 2, 4), expected);
        }
    }
}

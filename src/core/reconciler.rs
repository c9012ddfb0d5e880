// src/core/reconciler.rs
use crate::types::{OrderIntent, Position, Signal};
use rust_decimal::Decimal;

/// What a signal means for the live position. Derived fresh every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// FLAT + BUY: open a long; quantity comes from the sizer.
    Open,
    /// LONG + SELL: close the whole long, reduce-only.
    Close(OrderIntent),
}

impl Transition {
    /// Final intent once the entry size is known. A zero entry size drops the trade.
    pub fn into_intent(self, entry_quantity: Decimal) -> Option<OrderIntent> {
        match self {
            Transition::Open if entry_quantity > Decimal::ZERO => {
                Some(OrderIntent::open_long(entry_quantity))
            }
            Transition::Open => None,
            Transition::Close(intent) => Some(intent),
        }
    }
}

/// FLAT/LONG state machine over the exchange-reported position.
///
/// Short positions are never opened by this strategy and are left alone.
pub fn reconcile(signal: Signal, current_position: &Position) -> Option<Transition> {
    match signal {
        Signal::Buy if current_position.is_flat() => Some(Transition::Open),
        Signal::Sell if current_position.is_long() => {
            Some(Transition::Close(OrderIntent::close_long(current_position)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_buy_opens() {
        let transition = reconcile(Signal::Buy, &Position::flat());
        assert_eq!(transition, Some(Transition::Open));

        let intent = transition.unwrap().into_intent(dec!(18)).unwrap();
        assert_eq!(intent.side, Side::Buy);
        assert_eq!(intent.quantity, dec!(18));
        assert!(!intent.reduce_only);
    }

    #[test]
    fn test_long_sell_closes_full_size() {
        let intent = reconcile(Signal::Sell, &Position::new(dec!(2.5)))
            .unwrap()
            .into_intent(dec!(999))
            .unwrap();
        assert_eq!(intent.side, Side::Sell);
        assert_eq!(intent.quantity, dec!(2.5));
        assert!(intent.reduce_only);
    }

    #[test]
    fn test_zero_entry_size_is_hold() {
        assert_eq!(Transition::Open.into_intent(Decimal::ZERO), None);
    }

    #[test]
    fn test_every_other_pair_holds() {
        let long = Position::new(dec!(1.2));
        let short = Position::new(dec!(-0.7));
        let flat = Position::flat();

        assert_eq!(reconcile(Signal::Buy, &long), None);
        assert_eq!(reconcile(Signal::Hold, &long), None);
        assert_eq!(reconcile(Signal::Sell, &flat), None);
        assert_eq!(reconcile(Signal::Hold, &flat), None);
        assert_eq!(reconcile(Signal::Buy, &short), None);
        assert_eq!(reconcile(Signal::Sell, &short), None);
        assert_eq!(reconcile(Signal::Hold, &short), None);
    }

    #[test]
    fn test_never_buys_with_open_position() {
        let sizes = [dec!(-5), dec!(-0.001), dec!(0), dec!(0.001), dec!(2.5), dec!(40)];
        for size in sizes {
            let position = Position::new(size);
            for signal in [Signal::Buy, Signal::Sell, Signal::Hold] {
                match reconcile(signal, &position) {
                    Some(Transition::Open) => assert!(position.is_flat()),
                    Some(Transition::Close(intent)) => {
                        assert_eq!(intent.quantity, size.abs());
                        assert!(intent.reduce_only);
                    }
                    None => {}
                }
            }
        }
    }
}

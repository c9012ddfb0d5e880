// src/core/sizer.rs
use crate::types::SymbolFilters;
use crate::utils::precision::normalize_quantity;
use rust_decimal::Decimal;

/// Converts a target exposure into an exchange-compliant order quantity.
///
/// The quantity is truncated to `step_size`. When the result falls short of
/// `min_notional`, it is rebuilt from `min_notional / price` and bumped by one
/// step if truncation left it under the minimum. A zero result means "do not trade".
pub fn size(
    balance_quote: Decimal,
    price: Decimal,
    target_fraction: Decimal,
    leverage: u32,
    filters: &SymbolFilters,
) -> Decimal {
    if balance_quote <= Decimal::ZERO || price <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let target_notional = balance_quote * target_fraction * Decimal::from(leverage);
    if target_notional <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let raw_qty = target_notional / price;
    let qty = normalize_quantity(raw_qty, filters.step_size);
    if qty * price >= filters.min_notional && !qty.is_zero() {
        return qty;
    }

    let mut qty = normalize_quantity(filters.min_notional / price, filters.step_size);
    if qty * price < filters.min_notional || qty.is_zero() {
        qty += filters.step_size;
    }

    if qty * price < filters.min_notional {
        // Only reachable with a zero step, where the division already was exact enough.
        return Decimal::ZERO;
    }
    qty.normalize()
}

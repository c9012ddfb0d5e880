// src/utils/precision.rs
use rust_decimal::Decimal;

/// Rounds a quantity DOWN to the nearest multiple of `step_size`.
/// Example: amount=10.999, step=1.0 -> 10.0
///
/// A zero step means the exchange imposes no lot increment.
pub fn normalize_quantity(amount: Decimal, step_size: Decimal) -> Decimal {
    if step_size.is_zero() {
        return amount;
    }
    ((amount / step_size).floor() * step_size).normalize()
}

/// True when `quantity` is an exact integer multiple of `step_size`.
pub fn is_step_aligned(quantity: Decimal, step_size: Decimal) -> bool {
    if step_size.is_zero() {
        return true;
    }
    (quantity % step_size).is_zero()
}

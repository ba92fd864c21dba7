use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Money is tracked in whole currency units.
pub type Money = i64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// `amount / seconds` as a fixed-point rate. Saturates instead of overflowing
/// and returns zero for a zero-length window.
#[inline]
pub fn per_second(amount: i64, seconds: u64) -> Fixed64 {
    if seconds == 0 {
        return Fixed64::ZERO;
    }
    let amount = Fixed64::saturating_from_num(amount);
    let seconds = Fixed64::saturating_from_num(seconds);
    amount.checked_div(seconds).unwrap_or(Fixed64::MAX)
}

/// Scale a base cost by an integer percentage, rounding up so that a
/// fractional charge always costs at least one unit.
#[inline]
pub fn scale_cost(base: Money, percent: u32) -> Money {
    if base <= 0 {
        return 0;
    }
    let scaled = base.saturating_mul(percent as i64);
    scaled.saturating_add(99) / 100
}

//! Mathematical constants

/// The square root of 2π
pub const SQRT_2PI: f64 = 2.506_628_274_631_000_2;
/// 0.5 ln(2π)
pub const HALF_LN_2PI: f64 = 0.918_938_533_204_672_7;
/// ln(2π)
pub const LN_2PI: f64 = 1.837_877_066_409_345_3;

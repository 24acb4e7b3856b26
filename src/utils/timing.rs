//! Randomized timing.

use std::time::Duration;

use rand::Rng;

/// Scales `base` by a random factor in `[1 - spread, 1 + spread]`.
///
/// Keeps several clients started together from falling into lock-step.
/// `spread` is clamped to `[0, 1]`.
pub fn jitter(base: Duration, spread: f64) -> Duration {
    let spread = spread.clamp(0.0, 1.0);
    if spread == 0.0 || base.is_zero() {
        return base;
    }
    let factor = rand::rng().random_range((1.0 - spread)..=(1.0 + spread));
    base.mul_f64(factor)
}

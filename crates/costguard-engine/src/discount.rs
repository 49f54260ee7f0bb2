//! Cache-hit discounting.
//!
//! A statement likely to be answered from the result cache costs little or
//! nothing to rerun. The discount is a coarse step function over the cache
//! probability rather than a linear blend; anything at or below 0.5 is
//! treated as a miss.

/// Multiplier applied to an estimate's cost for a given cache probability.
///
/// Strictly above 0.8 the run is assumed served from cache and is free.
/// Strictly above 0.5 it is discounted to a tenth. Everything else pays
/// full price, including out-of-range and non-finite probabilities.
pub fn cache_multiplier(probability: f64) -> f64 {
    if probability > 0.8 {
        0.0
    } else if probability > 0.5 {
        0.1
    } else {
        1.0
    }
}

//! Billing quantization.
//!
//! Warehouses bill in whole minutes with a one-minute floor. Everything
//! downstream of the time layers goes through [`billable_seconds`] before
//! touching money, so costs only ever move in 60-second steps.

/// Largest minute count we will quantize to. Cartesian-product estimates can
/// reach absurd magnitudes; capping here keeps the `u64` conversion exact.
const MAX_BILLABLE_MINUTES: f64 = 1.0e15;

/// Round an estimated duration up to the warehouse billing increment.
///
/// Returns a positive multiple of 60 for any input, including zero, negative,
/// and non-finite estimates.
pub fn billable_seconds(estimated_seconds: f64) -> u64 {
    let mut minutes = (estimated_seconds / 60.0).ceil();
    if minutes.is_nan() {
        minutes = 1.0;
    }
    minutes.clamp(1.0, MAX_BILLABLE_MINUTES) as u64 * 60
}

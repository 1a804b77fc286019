//! Envelope controller
//!
//! Ramp and fade primitives shared by every channel and layer. Each helper
//! first cancels whatever was scheduled on the parameter from `now` on and
//! pins the current value, so repeated calls never stack and a fade always
//! starts from what is actually audible.

use super::param::AudioParam;

/// Floor used by exponential fades (exponential ramps cannot reach zero)
pub const EXPONENTIAL_FLOOR: f32 = 0.0001;

/// Cancel scheduled events from `now` on and hold the current value
///
/// Returns the value that was pinned.
pub fn hold_current(param: &mut AudioParam, now: f64) -> f32 {
    let current = param.value_at(now);
    param.cancel_scheduled_values(now);
    param.set_value_at_time(current, now);
    current
}

/// Linear ramp from the current value to `target` over `ramp_secs`
pub fn ramp_to(param: &mut AudioParam, now: f64, target: f32, ramp_secs: f64) {
    hold_current(param, now);
    param.linear_ramp_to_value_at_time(target, now + ramp_secs.max(0.0));
}

/// Fade in to `target`; with a known `total_duration` also fade back out
///
/// The fade-out mirrors the fade-in and finishes exactly at
/// `now + total_duration`. Short sounds split their duration evenly between
/// the two ramps.
pub fn fade_in(
    param: &mut AudioParam,
    now: f64,
    target: f32,
    ramp_secs: f64,
    total_duration: Option<f64>,
) {
    let Some(total) = total_duration else {
        ramp_to(param, now, target, ramp_secs);
        return;
    };

    let total = total.max(0.0);
    let ramp = ramp_secs.max(0.0).min(total / 2.0);
    ramp_to(param, now, target, ramp);
    param.set_value_at_time(target, now + total - ramp);
    param.linear_ramp_to_value_at_time(0.0, now + total);
}

/// Linear fade to silence over `secs`
pub fn fade_out(param: &mut AudioParam, now: f64, secs: f64) {
    ramp_to(param, now, 0.0, secs);
}

/// Exponential decay to [`EXPONENTIAL_FLOOR`] over `secs`
///
/// Used for tone stops, where a linear tail clicks.
pub fn fade_out_exponential(param: &mut AudioParam, now: f64, secs: f64) {
    let current = hold_current(param, now);
    if current <= EXPONENTIAL_FLOOR {
        param.set_value_at_time(EXPONENTIAL_FLOOR, now);
    }
    param.exponential_ramp_to_value_at_time(EXPONENTIAL_FLOOR, now + secs.max(0.0));
}

/// Smoothed approach to `target` with the given time constant
pub fn glide_to(param: &mut AudioParam, now: f64, target: f32, time_constant: f64) {
    hold_current(param, now);
    param.set_target_at_time(target, now, time_constant);
}

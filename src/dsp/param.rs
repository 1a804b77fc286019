//! Automatable parameters
//!
//! An [`AudioParam`] holds a timeline of scheduled events and evaluates to a
//! value at any point in time. Ramps are described by their end point and
//! start from the previous event, so callers pin the current value before
//! scheduling a ramp (see [`crate::dsp::envelope`]).

// ============================================================================
// Events
// ============================================================================

/// A scheduled change on a parameter timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    /// Jump to `value` at `time`
    SetValue { time: f64, value: f32 },
    /// Linear ramp from the previous event, reaching `value` at `time`
    LinearRamp { time: f64, value: f32 },
    /// Exponential ramp from the previous event, reaching `value` at `time`
    ExponentialRamp { time: f64, value: f32 },
    /// Approach `target` from `time` on with the given time constant
    SetTarget {
        time: f64,
        target: f32,
        time_constant: f64,
    },
}

impl ParamEvent {
    /// Time at which the event takes effect
    pub fn time(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { time, .. }
            | ParamEvent::LinearRamp { time, .. }
            | ParamEvent::ExponentialRamp { time, .. }
            | ParamEvent::SetTarget { time, .. } => time,
        }
    }
}

/// Folded state of every event that already took effect
#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    time: f64,
    value: f32,
    target: Option<(f32, f64)>,
}

impl Anchor {
    fn value_at(&self, time: f64) -> f32 {
        match self.target {
            Some((target, time_constant)) if time_constant > 0.0 => {
                let elapsed = (time - self.time).max(0.0);
                target + (self.value - target) * (-elapsed / time_constant).exp() as f32
            }
            Some((target, _)) => target,
            None => self.value,
        }
    }

    fn apply(self, event: ParamEvent) -> Anchor {
        match event {
            ParamEvent::SetValue { time, value }
            | ParamEvent::LinearRamp { time, value }
            | ParamEvent::ExponentialRamp { time, value } => Anchor {
                time,
                value,
                target: None,
            },
            ParamEvent::SetTarget {
                time,
                target,
                time_constant,
            } => Anchor {
                time,
                value: self.value_at(time),
                target: Some((target, time_constant)),
            },
        }
    }
}

// ============================================================================
// AudioParam
// ============================================================================

/// A parameter whose value follows a schedule of events
#[derive(Debug, Clone)]
pub struct AudioParam {
    anchor: Anchor,
    events: Vec<ParamEvent>,
}

impl AudioParam {
    /// Create a parameter resting at `value`
    pub fn new(value: f32) -> Self {
        AudioParam {
            anchor: Anchor {
                time: 0.0,
                value,
                target: None,
            },
            events: Vec::new(),
        }
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(ParamEvent::SetValue { time, value });
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(ParamEvent::LinearRamp { time, value });
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(ParamEvent::ExponentialRamp { time, value });
    }

    pub fn set_target_at_time(&mut self, target: f32, time: f64, time_constant: f64) {
        self.insert(ParamEvent::SetTarget {
            time,
            target,
            time_constant,
        });
    }

    /// Drop every event scheduled at or after `time`
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|event| event.time() < time);
    }

    /// Number of events still on the timeline
    pub fn scheduled_len(&self) -> usize {
        self.events.len()
    }

    /// Evaluate the parameter at `time`
    pub fn value_at(&self, time: f64) -> f32 {
        let mut anchor = self.anchor;
        for event in &self.events {
            if event.time() <= time {
                anchor = anchor.apply(*event);
                continue;
            }

            return match *event {
                ParamEvent::LinearRamp { time: end, value } => {
                    let span = end - anchor.time;
                    if span <= 0.0 {
                        value
                    } else {
                        let frac = ((time - anchor.time) / span) as f32;
                        anchor.value + (value - anchor.value) * frac
                    }
                }
                ParamEvent::ExponentialRamp { time: end, value } => {
                    let start = anchor.value;
                    let span = end - anchor.time;
                    // Undefined across zero or a sign change: hold.
                    if span <= 0.0 || start * value <= 0.0 {
                        start
                    } else {
                        let frac = ((time - anchor.time) / span) as f32;
                        start * (value / start).powf(frac)
                    }
                }
                _ => anchor.value_at(time),
            };
        }
        anchor.value_at(time)
    }

    /// Fold every event that completed at or before `time` into the anchor
    pub fn prune(&mut self, time: f64) {
        let done = self
            .events
            .iter()
            .take_while(|event| event.time() <= time)
            .count();
        for event in self.events.drain(..done) {
            self.anchor = self.anchor.apply(event);
        }
    }

    fn insert(&mut self, event: ParamEvent) {
        let at = self
            .events
            .iter()
            .position(|existing| existing.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(at, event);
    }
}

impl Default for AudioParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_value() {
        let param = AudioParam::new(0.5);
        assert_eq!(param.value_at(0.0), 0.5);
        assert_eq!(param.value_at(100.0), 0.5);
    }

    #[test]
    fn test_linear_ramp_midpoint() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.0, 1.0);
        param.linear_ramp_to_value_at_time(1.0, 3.0);

        assert_eq!(param.value_at(0.5), 0.0);
        assert_relative_eq!(param.value_at(2.0), 0.5, epsilon = 1e-6);
        assert_eq!(param.value_at(3.0), 1.0);
        assert_eq!(param.value_at(10.0), 1.0);
    }

    #[test]
    fn test_exponential_ramp() {
        let mut param = AudioParam::new(1.0);
        param.set_value_at_time(1.0, 0.0);
        param.exponential_ramp_to_value_at_time(0.01, 2.0);

        assert_relative_eq!(param.value_at(1.0), 0.1, epsilon = 1e-5);
        assert_relative_eq!(param.value_at(2.0), 0.01, epsilon = 1e-6);
    }

    #[test]
    fn test_exponential_ramp_from_zero_holds() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.exponential_ramp_to_value_at_time(1.0, 1.0);
        assert_eq!(param.value_at(0.5), 0.0);
        assert_eq!(param.value_at(1.0), 1.0);
    }

    #[test]
    fn test_set_target_approaches() {
        let mut param = AudioParam::new(1.0);
        param.set_target_at_time(0.0, 0.0, 0.5);

        assert_relative_eq!(param.value_at(0.5), (-1.0f32).exp(), epsilon = 1e-5);
        assert!(param.value_at(5.0) < 1e-3);
    }

    #[test]
    fn test_cancel_removes_future_events() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.linear_ramp_to_value_at_time(1.0, 2.0);
        param.cancel_scheduled_values(1.0);

        assert_eq!(param.scheduled_len(), 1);
        assert_eq!(param.value_at(3.0), 0.0);
    }

    #[test]
    fn test_prune_preserves_values() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.2, 0.0);
        param.linear_ramp_to_value_at_time(0.6, 1.0);
        param.linear_ramp_to_value_at_time(0.0, 2.0);

        let before = param.value_at(1.5);
        param.prune(1.2);
        assert_eq!(param.scheduled_len(), 1);
        assert_relative_eq!(param.value_at(1.5), before, epsilon = 1e-6);
    }

    #[test]
    fn test_events_at_same_time_keep_call_order() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.3, 1.0);
        param.set_value_at_time(0.7, 1.0);
        assert_eq!(param.value_at(1.0), 0.7);
    }
}

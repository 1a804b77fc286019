//! Timer scheduler
//!
//! Pending callbacks keyed by id, fired by the engine between render quanta.
//! Cancelling a timer removes it outright so nothing is left dangling.

use std::collections::BTreeMap;

/// Identifier of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Pending timers carrying a payload of type `T`
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    timers: BTreeMap<TimerId, (f64, T)>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Scheduler {
            timers: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<T: Copy> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire at `due` seconds
    pub fn schedule(&mut self, due: f64, payload: T) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.insert(id, (due, payload));
        id
    }

    /// Cancel a timer; returns false if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Due time of a pending timer
    pub fn due_time(&self, id: TimerId) -> Option<f64> {
        self.timers.get(&id).map(|(due, _)| *due)
    }

    /// Remove and return every timer due at or before `now`, earliest first
    pub fn take_due(&mut self, now: f64) -> Vec<(TimerId, T)> {
        let mut due: Vec<(f64, TimerId, T)> = self
            .timers
            .iter()
            .filter(|(_, (at, _))| *at <= now)
            .map(|(&id, &(at, payload))| (at, id, payload))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (_, id, _) in &due {
            self.timers.remove(id);
        }
        due.into_iter().map(|(_, id, payload)| (id, payload)).collect()
    }
}

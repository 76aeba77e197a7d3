// src/watch/debounce.rs

//! Watch event coalescing.
//!
//! Editors save in bursts (write, truncate, rename, chmod within
//! milliseconds); the generator rewrites dozens of HTML files per build.
//! Each route gets one fixed window: the first event opens it, later events
//! inside it are absorbed without extending the deadline, and the route's
//! action fires once when the window closes. Pure state machine over
//! `Instant`s; the watcher loop supplies the clock.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    deadlines: BTreeMap<usize, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: BTreeMap::new(),
        }
    }

    /// Record an event for `route`. Returns true when this event opened a
    /// fresh window, false when an open window absorbed it.
    pub fn observe(&mut self, route: usize, now: Instant) -> bool {
        if self.deadlines.contains_key(&route) {
            return false;
        }
        self.deadlines.insert(route, now + self.window);
        true
    }

    /// Earliest pending deadline across all routes.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Close and return every window whose deadline has passed, in route
    /// order.
    pub fn take_expired(&mut self, now: Instant) -> Vec<usize> {
        let expired: Vec<usize> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(route, _)| *route)
            .collect();
        for route in &expired {
            self.deadlines.remove(route);
        }
        expired
    }

    pub fn is_idle(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(200);

    #[test]
    fn burst_yields_one_expiry() {
        let mut d = Debouncer::new(WINDOW);
        let t0 = Instant::now();

        assert!(d.observe(0, t0));
        assert!(!d.observe(0, t0 + Duration::from_millis(50)));
        assert!(!d.observe(0, t0 + Duration::from_millis(150)));

        // Window is fixed from the first event, not the last.
        assert_eq!(d.next_deadline(), Some(t0 + WINDOW));
        assert!(d.take_expired(t0 + Duration::from_millis(199)).is_empty());
        assert_eq!(d.take_expired(t0 + WINDOW), vec![0]);
        assert!(d.is_idle());

        // A later event opens a new window.
        assert!(d.observe(0, t0 + Duration::from_millis(500)));
    }

    #[test]
    fn routes_debounce_independently() {
        let mut d = Debouncer::new(WINDOW);
        let t0 = Instant::now();

        assert!(d.observe(1, t0));
        assert!(d.observe(0, t0 + Duration::from_millis(100)));

        assert_eq!(d.next_deadline(), Some(t0 + WINDOW));
        assert_eq!(d.take_expired(t0 + WINDOW), vec![1]);
        assert_eq!(
            d.next_deadline(),
            Some(t0 + Duration::from_millis(100) + WINDOW)
        );
        assert_eq!(d.take_expired(t0 + Duration::from_millis(100) + WINDOW), vec![0]);
        assert!(d.is_idle());
    }

    #[test]
    fn simultaneous_expiries_come_out_in_route_order() {
        let mut d = Debouncer::new(WINDOW);
        let t0 = Instant::now();
        d.observe(1, t0);
        d.observe(0, t0);
        assert_eq!(d.take_expired(t0 + WINDOW), vec![0, 1]);
    }
}

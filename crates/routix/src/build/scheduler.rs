// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Debounce and latch bookkeeping of a build session.
//!
//! The scheduler holds no timer itself: it exposes a `deadline` that the
//! session loop sleeps until, and decides what happens when it fires.
//!
//! - `invalidate` (re)arms the deadline
//! - `latch` / `release` bracket async parse work; while any latch is held
//!   a firing deadline does nothing, and the last release re-arms it with
//!   whatever remains of the debounce window
//! - `fire` hands out the dirty flags of the build to run

use crate::error::RoutixError;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Which outputs need regenerating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidated {
    /// Routes and tree.
    pub build: bool,
    /// Extras manifest.
    pub extras: bool,
}

impl Invalidated {
    fn all() -> Self {
        Self {
            build: true,
            extras: true,
        }
    }

    fn none() -> Self {
        Self {
            build: false,
            extras: false,
        }
    }

    /// Whether any output is dirty.
    pub fn any(&self) -> bool {
        self.build || self.extras
    }
}

/// Mutable state of one build session.
#[derive(Debug)]
pub struct BuildState {
    /// Outputs to regenerate on the next build. Everything starts dirty so
    /// that the first build writes even with no files.
    pub invalidated: Invalidated,
    started: bool,
    deadline: Option<Instant>,
    running: bool,
    latches: usize,
    last_invalidate: Option<Instant>,
    errors: Vec<RoutixError>,
    cycle_start: Option<Instant>,
    debounce: Duration,
}

impl BuildState {
    /// Creates the state of a session that has not started yet.
    pub fn new(debounce: Duration) -> Self {
        Self {
            invalidated: Invalidated::all(),
            started: false,
            deadline: None,
            running: false,
            latches: 0,
            last_invalidate: None,
            errors: Vec::new(),
            cycle_start: None,
            debounce,
        }
    }

    /// Notes incoming input. The first input after a successful write opens
    /// a new cycle and forgets errors of the previous one.
    pub fn input(&mut self, now: Instant) {
        if self.cycle_start.is_none() {
            self.cycle_start = Some(now);
            self.errors.clear();
        }
    }

    /// Closes the current cycle, returning its duration.
    pub fn finish_cycle(&mut self, now: Instant) -> Duration {
        self.cycle_start
            .take()
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default()
    }

    /// Marks the session ready and schedules an immediate build.
    pub fn start(&mut self, now: Instant) {
        self.input(now);
        self.started = true;
        self.invalidate(now, Duration::ZERO);
    }

    /// Whether [`start`](Self::start) has been called.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// (Re)arms the deadline `delay` from `now`. Returns `false` before start.
    pub fn invalidate(&mut self, now: Instant, delay: Duration) -> bool {
        if !self.started {
            return false;
        }
        self.deadline = Some(now + delay);
        true
    }

    /// Arms the deadline with the full debounce window.
    pub fn invalidate_debounced(&mut self, now: Instant) -> bool {
        self.invalidate(now, self.debounce)
    }

    /// Holds the session busy while async work is outstanding.
    pub fn latch(&mut self, now: Instant) {
        self.last_invalidate = Some(now);
        self.latches += 1;
    }

    /// Releases a latch. Returns `true` if the deadline was re-armed.
    ///
    /// The last release re-arms the deadline unless it was `canceled` and
    /// no output is dirty. Work accepted under earlier releases still
    /// builds when a canceled parse happens to finish last.
    pub fn release(&mut self, now: Instant, canceled: bool) -> bool {
        self.latches = self.latches.saturating_sub(1);
        if !self.started || self.latches > 0 {
            return false;
        }
        if canceled && !self.invalidated.any() {
            debug!("Bailing out");
            return false;
        }
        let elapsed = self
            .last_invalidate
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(self.debounce);
        self.invalidate(now, self.debounce.saturating_sub(elapsed))
    }

    /// Current deadline, if a build is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consumes the deadline. Returns the flags of the build to run, or
    /// `None` while latches are held.
    pub fn fire(&mut self) -> Option<Invalidated> {
        self.deadline = None;
        if self.latches > 0 {
            debug!(latches = self.latches, "Build deferred until parsing settles");
            return None;
        }
        let flags = self.invalidated;
        self.invalidated = Invalidated::none();
        Some(flags)
    }

    /// Flags a build in progress.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Number of held latches.
    pub fn latches(&self) -> usize {
        self.latches
    }

    /// Records an error of the current cycle.
    pub fn push_error(&mut self, error: RoutixError) {
        self.errors.push(error);
    }

    /// Drains collected errors.
    pub fn take_errors(&mut self) -> Vec<RoutixError> {
        std::mem::take(&mut self.errors)
    }

    /// Idle means started with nothing pending. Pending errors count as
    /// idle so they surface without waiting for further work.
    pub fn is_idle(&self) -> bool {
        !self.errors.is_empty()
            || (self.started && self.deadline.is_none() && !self.running && self.latches == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(50);

    #[test]
    fn test_invalidate_ignored_before_start() {
        let mut state = BuildState::new(DEBOUNCE);
        assert!(!state.invalidate(Instant::now(), DEBOUNCE));
        assert!(state.deadline().is_none());
        assert!(!state.is_idle());
    }

    #[test]
    fn test_start_schedules_full_build() {
        let now = Instant::now();
        let mut state = BuildState::new(DEBOUNCE);
        state.start(now);
        assert_eq!(state.deadline(), Some(now));
        assert!(!state.is_idle());

        let flags = state.fire().unwrap();
        assert!(flags.build && flags.extras);
        assert!(state.is_idle());
        assert_eq!(state.invalidated, Invalidated::none());
    }

    #[test]
    fn test_fire_with_latch_defers() {
        let now = Instant::now();
        let mut state = BuildState::new(DEBOUNCE);
        state.start(now);
        state.latch(now);
        assert!(state.fire().is_none());
        assert!(!state.is_idle());
    }

    #[test]
    fn test_release_rearms_with_remaining_window() {
        let now = Instant::now();
        let mut state = BuildState::new(DEBOUNCE);
        state.start(now);
        state.fire();
        state.latch(now);
        state.latch(now);

        assert!(!state.release(now + Duration::from_millis(10), false));
        assert!(state.release(now + Duration::from_millis(20), false));
        assert_eq!(state.deadline(), Some(now + DEBOUNCE));
    }

    #[test]
    fn test_release_after_window_fires_immediately() {
        let now = Instant::now();
        let mut state = BuildState::new(DEBOUNCE);
        state.start(now);
        state.fire();
        state.latch(now);
        let later = now + Duration::from_millis(200);
        assert!(state.release(later, false));
        assert_eq!(state.deadline(), Some(later));
    }

    #[test]
    fn test_canceled_release_skips_build() {
        let now = Instant::now();
        let mut state = BuildState::new(DEBOUNCE);
        state.start(now);
        state.fire();
        state.latch(now);
        assert!(!state.release(now, true));
        assert!(state.deadline().is_none());
        assert!(state.is_idle());
    }

    #[test]
    fn test_canceled_last_release_builds_pending_changes() {
        let now = Instant::now();
        let mut state = BuildState::new(DEBOUNCE);
        state.start(now);
        state.fire();
        state.latch(now);
        state.latch(now);

        // first parse is accepted while the second is still in flight
        state.invalidated.build = true;
        assert!(!state.release(now + Duration::from_millis(5), false));
        assert!(state.release(now + Duration::from_millis(10), true));
        assert_eq!(state.deadline(), Some(now + DEBOUNCE));
        assert!(state.fire().unwrap().build);
    }

    #[test]
    fn test_canceled_release_after_deferred_fire_rebuilds() {
        let now = Instant::now();
        let mut state = BuildState::new(DEBOUNCE);
        state.start(now);
        state.fire();
        state.latch(now);
        state.invalidated.build = true;
        state.invalidate_debounced(now);
        assert!(state.fire().is_none());

        let later = now + Duration::from_millis(80);
        assert!(state.release(later, true));
        assert_eq!(state.deadline(), Some(later));
    }

    #[test]
    fn test_new_cycle_clears_errors() {
        let now = Instant::now();
        let mut state = BuildState::new(DEBOUNCE);
        state.input(now);
        state.push_error(RoutixError::Closed);
        state.input(now);
        assert!(state.is_idle());

        assert_eq!(state.finish_cycle(now + DEBOUNCE), DEBOUNCE);
        state.input(now + DEBOUNCE);
        assert!(state.take_errors().is_empty());
    }

    #[test]
    fn test_errors_short_circuit_idle() {
        let mut state = BuildState::new(DEBOUNCE);
        state.push_error(RoutixError::Closed);
        assert!(state.is_idle());
        assert_eq!(state.take_errors().len(), 1);
        assert!(!state.is_idle());
    }
}

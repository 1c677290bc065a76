//! Rate governor state machine
//!
//! Enforces the pacing rules around the single generation slot: a fixed
//! cooldown after every success, exponential backoff after rate-limit
//! errors, and a circuit breaker that pauses the session after a streak of
//! consecutive rate-limit errors. Every transition takes an explicit `now`
//! so the machine stays deterministic under test; cooldown expiry is
//! polled by the caller, not pushed.

use std::time::{Duration, Instant};

use tracing::debug;

use super::config::SessionConfig;

/// Outcome of recording a rate-limit-classified failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitAction {
    /// Cooldown scheduled; retry the item after this delay
    Backoff(Duration),

    /// Circuit breaker tripped; no countdown runs until a manual resume
    Paused,
}

/// Governor over the single in-flight generation slot
#[derive(Debug)]
pub struct RateGovernor {
    spacing: Duration,
    backoff_base: Duration,
    pause_threshold: u32,
    cooldown_until: Option<Instant>,
    streak: u32,
    paused: bool,
}

impl RateGovernor {
    pub fn new(spacing: Duration, backoff_base: Duration, pause_threshold: u32) -> Self {
        Self {
            spacing,
            backoff_base,
            pause_threshold,
            cooldown_until: None,
            streak: 0,
            paused: false,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.request_spacing(), config.backoff_base(), config.pause_threshold)
    }

    /// Whether a dispatch is permitted right now
    pub fn permits_dispatch(&self, now: Instant) -> bool {
        !self.paused && self.cooldown_remaining(now).is_none()
    }

    /// Remaining cooldown, if one is running
    ///
    /// Always `None` while paused: the breaker runs no countdown.
    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        if self.paused {
            return None;
        }
        let until = self.cooldown_until?;
        if until > now { Some(until - now) } else { None }
    }

    /// Deadline at which a pending cooldown expires
    pub fn cooldown_deadline(&self, now: Instant) -> Option<Instant> {
        self.cooldown_remaining(now).map(|remaining| now + remaining)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Record a successful call: reset the streak, impose the fixed
    /// inter-request spacing
    pub fn note_success(&mut self, now: Instant) {
        debug!("RateGovernor::note_success: called");
        self.streak = 0;
        self.cooldown_until = Some(now + self.spacing);
    }

    /// Record a rate-limit-classified failure
    ///
    /// Grows the streak; below the threshold schedules an exponential
    /// backoff (`base * 2^(streak-1)`, deliberately uncapped — the breaker
    /// is the bound), at the threshold trips the breaker instead.
    pub fn note_rate_limit(&mut self, now: Instant) -> RateLimitAction {
        self.streak += 1;
        debug!(streak = self.streak, "RateGovernor::note_rate_limit: called");

        if self.streak >= self.pause_threshold {
            self.paused = true;
            self.cooldown_until = None;
            return RateLimitAction::Paused;
        }

        let backoff = self.backoff_base * 2u32.pow(self.streak - 1);
        self.cooldown_until = Some(now + backoff);
        RateLimitAction::Backoff(backoff)
    }

    /// Record a permanent (non-rate-limit) failure
    ///
    /// Unrelated to throughput: the streak resets, the cooldown is left
    /// untouched.
    pub fn note_permanent_failure(&mut self) {
        debug!("RateGovernor::note_permanent_failure: called");
        self.streak = 0;
    }

    /// Manual pause: prevents future dispatch only
    pub fn pause(&mut self) {
        debug!("RateGovernor::pause: called");
        self.paused = true;
    }

    /// Manual resume: clears the pause, the streak, and any pending cooldown
    pub fn resume(&mut self) {
        debug!("RateGovernor::resume: called");
        self.paused = false;
        self.streak = 0;
        self.cooldown_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPACING: Duration = Duration::from_secs(10);
    const BASE: Duration = Duration::from_secs(30);

    fn governor(threshold: u32) -> RateGovernor {
        RateGovernor::new(SPACING, BASE, threshold)
    }

    #[test]
    fn test_fresh_governor_permits_dispatch() {
        let g = governor(3);
        assert!(g.permits_dispatch(Instant::now()));
        assert_eq!(g.cooldown_remaining(Instant::now()), None);
    }

    #[test]
    fn test_success_imposes_fixed_spacing() {
        let mut g = governor(3);
        let now = Instant::now();
        g.note_success(now);

        assert!(!g.permits_dispatch(now));
        assert_eq!(g.cooldown_remaining(now), Some(SPACING));
        assert!(g.permits_dispatch(now + SPACING));
    }

    #[test]
    fn test_backoff_doubles_per_consecutive_failure() {
        let mut g = governor(5);
        let now = Instant::now();

        assert_eq!(g.note_rate_limit(now), RateLimitAction::Backoff(BASE));
        assert_eq!(g.note_rate_limit(now), RateLimitAction::Backoff(2 * BASE));
        assert_eq!(g.note_rate_limit(now), RateLimitAction::Backoff(4 * BASE));
        assert_eq!(g.streak(), 3);
    }

    #[test]
    fn test_success_resets_streak_to_spacing() {
        let mut g = governor(5);
        let now = Instant::now();
        g.note_rate_limit(now);
        g.note_rate_limit(now);

        g.note_success(now);
        assert_eq!(g.streak(), 0);
        assert_eq!(g.cooldown_remaining(now), Some(SPACING));

        // Next failure starts the streak over at BASE, not 4*BASE
        assert_eq!(g.note_rate_limit(now), RateLimitAction::Backoff(BASE));
    }

    #[test]
    fn test_third_consecutive_failure_trips_breaker() {
        let mut g = governor(3);
        let now = Instant::now();

        assert_eq!(g.note_rate_limit(now), RateLimitAction::Backoff(BASE));
        assert_eq!(g.note_rate_limit(now), RateLimitAction::Backoff(2 * BASE));
        assert_eq!(g.note_rate_limit(now), RateLimitAction::Paused);

        assert!(g.is_paused());
        // No countdown runs while paused, even far in the future
        assert_eq!(g.cooldown_remaining(now), None);
        assert!(!g.permits_dispatch(now + Duration::from_secs(3600)));
    }

    #[test]
    fn test_resume_resets_streak_and_cooldown() {
        let mut g = governor(3);
        let now = Instant::now();
        for _ in 0..3 {
            g.note_rate_limit(now);
        }
        assert!(g.is_paused());

        g.resume();
        assert!(!g.is_paused());
        assert_eq!(g.streak(), 0);
        assert!(g.permits_dispatch(now));
    }

    #[test]
    fn test_permanent_failure_resets_streak_leaves_cooldown() {
        let mut g = governor(3);
        let now = Instant::now();
        g.note_rate_limit(now); // cooldown = BASE

        g.note_permanent_failure();
        assert_eq!(g.streak(), 0);
        // Cooldown from the earlier rate limit is untouched
        assert_eq!(g.cooldown_remaining(now), Some(BASE));
    }

    #[test]
    fn test_manual_pause_dominates_expired_cooldown() {
        let mut g = governor(3);
        let now = Instant::now();
        g.pause();
        assert!(!g.permits_dispatch(now));

        g.resume();
        assert!(g.permits_dispatch(now));
    }

    #[test]
    fn test_cooldown_deadline_matches_remaining() {
        let mut g = governor(3);
        let now = Instant::now();
        g.note_success(now);
        assert_eq!(g.cooldown_deadline(now), Some(now + SPACING));
        assert_eq!(g.cooldown_deadline(now + SPACING), None);
    }
}

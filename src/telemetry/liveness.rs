//! Online/offline signal derived from the recency of telemetry.
//!
//! # State Machine
//!
//! ```text
//!            arrival (fresh)
//!  Offline ─────────────────► Online ──┐ arrival (fresh):
//!     ▲                         │  ▲   │ re-arm deadline
//!     │   expiry >= deadline    │  └───┘
//!     ├─────────────────────────┤
//!     │   arrival (stale)       │
//!     ├─────────────────────────┤
//!     │   reset (absent value)  │
//!     └─────────────────────────┘
//! ```
//!
//! The tracker holds at most one pending deadline. Arming a new deadline
//! replaces the previous one, and every transition to offline clears it.
//! The owner is expected to call [`LivenessTracker::on_expiry`] once the
//! deadline passes; arrivals and expiries must come from the same task so
//! they are observed in a single order.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::snapshot::Snapshot;

/// Default liveness window.
pub const DEFAULT_LIVENESS_THRESHOLD: Duration = Duration::from_secs(10);

/// How a sample's recency is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessPolicy {
    /// Online on every arrival; offline once no arrival has been seen for
    /// the given duration.
    ArrivalTimeout(Duration),
    /// Online while `now - timestamp` is below the threshold, using the
    /// producer-supplied timestamp. Samples without one are offline.
    TimestampAge(Duration),
}

impl Default for LivenessPolicy {
    fn default() -> Self {
        LivenessPolicy::ArrivalTimeout(DEFAULT_LIVENESS_THRESHOLD)
    }
}

impl LivenessPolicy {
    pub fn threshold(&self) -> Duration {
        match self {
            LivenessPolicy::ArrivalTimeout(d) | LivenessPolicy::TimestampAge(d) => *d,
        }
    }
}

/// Binary liveness signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    #[default]
    Offline,
    Online,
}

/// Converts arrivals and deadline expiries into a [`Liveness`] signal.
#[derive(Debug)]
pub struct LivenessTracker {
    policy: LivenessPolicy,
    state: Liveness,
    deadline: Option<Instant>,
}

impl LivenessTracker {
    pub fn new(policy: LivenessPolicy) -> Self {
        Self {
            policy,
            state: Liveness::Offline,
            deadline: None,
        }
    }

    pub fn policy(&self) -> LivenessPolicy {
        self.policy
    }

    pub fn state(&self) -> Liveness {
        self.state
    }

    pub fn is_online(&self) -> bool {
        self.state == Liveness::Online
    }

    /// When the tracker next needs [`on_expiry`](Self::on_expiry), if ever.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Record a snapshot arriving at monotonic time `now`.
    pub fn on_arrival(&mut self, snapshot: &Snapshot, now: Instant) -> Liveness {
        let remaining = match self.policy {
            LivenessPolicy::ArrivalTimeout(timeout) => Some(timeout),
            LivenessPolicy::TimestampAge(threshold) => {
                snapshot.age().and_then(|age| match age.to_std() {
                    // A timestamp ahead of our clock counts as brand new.
                    Err(_) => Some(threshold),
                    Ok(age) => threshold.checked_sub(age).filter(|d| !d.is_zero()),
                })
            }
        };

        match remaining {
            Some(window) => {
                self.state = Liveness::Online;
                // A window past the end of the clock never expires
                self.deadline = now.checked_add(window);
            }
            None => self.go_offline(),
        }
        self.state
    }

    /// Re-evaluate after the deadline may have passed.
    ///
    /// Returns `true` only when this call flipped the signal to offline.
    pub fn on_expiry(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.go_offline();
                true
            }
            _ => false,
        }
    }

    /// Force offline and cancel any pending deadline.
    pub fn reset(&mut self) {
        self.go_offline();
    }

    fn go_offline(&mut self) {
        self.state = Liveness::Offline;
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TimestampUnit;
    use chrono::{DateTime, TimeDelta, Utc};
    use serde_json::json;

    const WINDOW: Duration = Duration::from_secs(10);

    fn arrival() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn with_age(age: TimeDelta) -> Snapshot {
        let ts = (arrival() - age).timestamp_millis();
        Snapshot::from_value(&json!({ "timestamp": ts }), arrival(), TimestampUnit::Millis)
    }

    fn without_timestamp() -> Snapshot {
        Snapshot::from_value(&json!({ "gas": 100 }), arrival(), TimestampUnit::Millis)
    }

    #[test]
    fn test_starts_offline() {
        let tracker = LivenessTracker::new(LivenessPolicy::default());
        assert_eq!(tracker.state(), Liveness::Offline);
        assert!(tracker.deadline().is_none());
    }

    #[test]
    fn test_expiry_without_arrival_is_noop() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::default());
        assert!(!tracker.on_expiry(Instant::now() + WINDOW * 5));
        assert!(!tracker.is_online());
    }

    #[test]
    fn test_arrival_timeout_goes_online_then_offline_once() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::ArrivalTimeout(WINDOW));
        let t0 = Instant::now();

        assert_eq!(tracker.on_arrival(&without_timestamp(), t0), Liveness::Online);
        assert_eq!(tracker.deadline(), Some(t0 + WINDOW));

        // Not earlier than the deadline
        assert!(!tracker.on_expiry(t0 + WINDOW - Duration::from_millis(1)));
        assert!(tracker.is_online());

        // Exactly once at the deadline
        assert!(tracker.on_expiry(t0 + WINDOW));
        assert!(!tracker.is_online());
        assert!(!tracker.on_expiry(t0 + WINDOW * 2));
    }

    #[test]
    fn test_arrival_rearms_single_deadline() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::ArrivalTimeout(WINDOW));
        let t0 = Instant::now();

        tracker.on_arrival(&without_timestamp(), t0);
        let t1 = t0 + Duration::from_secs(8);
        tracker.on_arrival(&without_timestamp(), t1);

        assert_eq!(tracker.deadline(), Some(t1 + WINDOW));
        assert!(!tracker.on_expiry(t0 + WINDOW));
        assert!(tracker.is_online());
    }

    #[test]
    fn test_reset_cancels_deadline() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::ArrivalTimeout(WINDOW));
        let t0 = Instant::now();
        tracker.on_arrival(&without_timestamp(), t0);

        tracker.reset();
        assert!(!tracker.is_online());
        assert!(tracker.deadline().is_none());
        assert!(!tracker.on_expiry(t0 + WINDOW));
    }

    #[test]
    fn test_timestamp_age_fresh_sample() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::TimestampAge(WINDOW));
        let t0 = Instant::now();

        let state = tracker.on_arrival(&with_age(TimeDelta::seconds(3)), t0);
        assert_eq!(state, Liveness::Online);
        // Decays once the sample itself is WINDOW old
        assert_eq!(tracker.deadline(), Some(t0 + Duration::from_secs(7)));
    }

    #[test]
    fn test_timestamp_age_stale_sample() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::TimestampAge(WINDOW));
        let state = tracker.on_arrival(&with_age(TimeDelta::seconds(10)), Instant::now());
        assert_eq!(state, Liveness::Offline);
        assert!(tracker.deadline().is_none());
    }

    #[test]
    fn test_timestamp_age_missing_timestamp_is_offline() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::TimestampAge(WINDOW));
        let state = tracker.on_arrival(&without_timestamp(), Instant::now());
        assert_eq!(state, Liveness::Offline);
    }

    #[test]
    fn test_timestamp_age_future_timestamp() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::TimestampAge(WINDOW));
        let t0 = Instant::now();
        let state = tracker.on_arrival(&with_age(TimeDelta::seconds(-30)), t0);
        assert_eq!(state, Liveness::Online);
        assert_eq!(tracker.deadline(), Some(t0 + WINDOW));
    }

    #[test]
    fn test_stale_arrival_drops_online_state() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::TimestampAge(WINDOW));
        let t0 = Instant::now();
        tracker.on_arrival(&with_age(TimeDelta::seconds(1)), t0);
        assert!(tracker.is_online());

        tracker.on_arrival(&with_age(TimeDelta::seconds(60)), t0 + Duration::from_secs(1));
        assert!(!tracker.is_online());
        assert!(tracker.deadline().is_none());
    }

    #[test]
    fn test_unrepresentable_window_stays_online() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::ArrivalTimeout(Duration::MAX));
        let t0 = Instant::now();
        let state = tracker.on_arrival(&without_timestamp(), t0);
        assert_eq!(state, Liveness::Online);
        assert!(tracker.deadline().is_none());
        assert!(!tracker.on_expiry(t0 + Duration::from_secs(3600)));
        assert!(tracker.is_online());
    }
}

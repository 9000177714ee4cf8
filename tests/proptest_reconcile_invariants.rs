//! Property-based invariant tests for the reconciler.
//!
//! These hold for any sequence of deliveries:
//!
//! 1. History never exceeds its capacity and its head is the latest present value.
//! 2. The alarm action fires exactly once per inactive-to-active transition.
//! 3. An absent delivery clears current state and forces offline.
//! 4. Online is never true before the first present delivery.
//! 5. Missing readings stay unset and never read as zero.
//! 6. An expired window flips offline exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use firewatch::{
    AlertSink, Delivery, LivenessPolicy, Reconciler, ReconcilerOptions, TimestampUnit,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
struct CountingAlert {
    sounds: Arc<AtomicUsize>,
    notifications: Arc<AtomicUsize>,
}

impl AlertSink for CountingAlert {
    fn play_alarm_sound(&self) {
        self.sounds.fetch_add(1, Ordering::SeqCst);
    }

    fn show_notification(&self, _title: &str, _body: &str) {
        self.notifications.fetch_add(1, Ordering::SeqCst);
    }
}

fn reconciler(capacity: usize) -> (Reconciler, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let alert = CountingAlert::default();
    let sounds = alert.sounds.clone();
    let notifications = alert.notifications.clone();
    let options = ReconcilerOptions {
        history_capacity: capacity,
        liveness: LivenessPolicy::ArrivalTimeout(WINDOW),
        timestamp_unit: TimestampUnit::Millis,
    };
    (Reconciler::new(options, Box::new(alert)), sounds, notifications)
}

/// A delivery in the generated sequence: `None` is absent.
type Step = Option<(Option<f64>, Option<i64>, bool)>;

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        1 => Just(None),
        6 => (
            proptest::option::of(-40.0f64..120.0),
            proptest::option::of(0i64..4096),
            any::<bool>(),
        )
            .prop_map(Some),
    ]
}

fn payload(temperature: Option<f64>, gas: Option<i64>, alarm: bool) -> Value {
    let mut map = serde_json::Map::new();
    if let Some(t) = temperature {
        map.insert("temperature".to_string(), json!(t));
    }
    if let Some(g) = gas {
        map.insert("gas".to_string(), json!(g));
    }
    map.insert("alarm".to_string(), json!(alarm));
    Value::Object(map)
}

fn to_delivery(step: &Step) -> Delivery {
    match *step {
        None => Delivery::Absent,
        Some((temperature, gas, alarm)) => Delivery::Present(payload(temperature, gas, alarm)),
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. History is bounded and newest first
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn history_bounded_with_latest_at_head(
        capacity in 1usize..12,
        steps in proptest::collection::vec(step_strategy(), 0..60),
    ) {
        let (mut reconciler, _, _) = reconciler(capacity);
        let now = Instant::now();
        let mut presents = 0usize;
        let mut last_present: Option<Value> = None;

        for step in &steps {
            if let Some((t, g, a)) = *step {
                presents += 1;
                last_present = Some(payload(t, g, a));
            }
            reconciler.on_snapshot(to_delivery(step), now, Utc::now());

            let view = reconciler.view();
            prop_assert!(view.history.len() <= capacity);
            prop_assert_eq!(view.history.len(), presents.min(capacity));
        }

        if let Some(expected) = last_present {
            let head = reconciler.view().history[0].clone();
            prop_assert_eq!(head.temperature, expected.get("temperature").and_then(Value::as_f64));
            prop_assert_eq!(head.gas, expected.get("gas").and_then(Value::as_i64));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Alarm fires once per rising edge
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn alarm_fires_once_per_rising_edge(
        steps in proptest::collection::vec(step_strategy(), 0..80),
    ) {
        let (mut reconciler, sounds, notifications) = reconciler(30);
        let now = Instant::now();

        let mut previous = false;
        let mut expected = 0usize;
        for step in &steps {
            match *step {
                None => previous = false,
                Some((_, _, alarm)) => {
                    if alarm && !previous {
                        expected += 1;
                    }
                    previous = alarm;
                }
            }
            reconciler.on_snapshot(to_delivery(step), now, Utc::now());
        }

        prop_assert_eq!(sounds.load(Ordering::SeqCst), expected);
        prop_assert_eq!(notifications.load(Ordering::SeqCst), expected);
        prop_assert_eq!(reconciler.alarm_triggers(), expected as u64);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Absent resets to no data / offline
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn absent_resets_current_and_liveness(
        steps in proptest::collection::vec(step_strategy(), 0..40),
    ) {
        let (mut reconciler, sounds, _) = reconciler(30);
        let now = Instant::now();
        for step in &steps {
            reconciler.on_snapshot(to_delivery(step), now, Utc::now());
        }
        let history_before = reconciler.history().len();

        reconciler.on_snapshot(Delivery::Absent, now, Utc::now());
        let view = reconciler.view();
        prop_assert!(!view.online);
        prop_assert!(view.current.is_none());
        prop_assert_eq!(view.history.len(), history_before);
        prop_assert!(reconciler.deadline().is_none());

        // The edge detector is re-armed
        let fired = sounds.load(Ordering::SeqCst);
        reconciler.on_snapshot(Delivery::Present(json!({"alarm": true})), now, Utc::now());
        prop_assert_eq!(sounds.load(Ordering::SeqCst), fired + 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Never online without data
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn never_online_before_first_snapshot(
        absents in 0usize..10,
        ticks in proptest::collection::vec(0u64..30_000, 0..10),
    ) {
        let (mut reconciler, _, _) = reconciler(30);
        let start = Instant::now();
        prop_assert!(!reconciler.is_online());

        for _ in 0..absents {
            reconciler.on_snapshot(Delivery::Absent, start, Utc::now());
            prop_assert!(!reconciler.is_online());
        }
        for ms in ticks {
            reconciler.on_deadline(start + Duration::from_millis(ms));
            prop_assert!(!reconciler.is_online());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Missing readings are unset, not zero
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn missing_fields_stay_unset(
        gas in proptest::option::of(0i64..4096),
        alarm in any::<bool>(),
    ) {
        let (mut reconciler, _, _) = reconciler(30);
        reconciler.on_snapshot(Delivery::Present(payload(None, gas, alarm)), Instant::now(), Utc::now());

        let current = reconciler.current().cloned().unwrap();
        prop_assert_eq!(current.temperature, None);
        prop_assert_eq!(current.humidity, None);
        prop_assert_eq!(current.gas, gas);
        prop_assert_eq!(current.timestamp, None);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Offline exactly once after the window
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn expiry_flips_offline_once(
        arrivals in proptest::collection::vec(0u64..9_000, 1..10),
    ) {
        let (mut reconciler, _, _) = reconciler(30);
        let start = Instant::now();

        // Arrivals spaced closer than the window keep the device online
        let mut at = start;
        for gap in &arrivals {
            at += Duration::from_millis(*gap);
            reconciler.on_deadline(at);
            reconciler.on_snapshot(Delivery::Present(json!({})), at, Utc::now());
            prop_assert!(reconciler.is_online());
        }

        let mut view = reconciler.subscribe();
        let _ = view.borrow_and_update();

        reconciler.on_deadline(at + WINDOW - Duration::from_millis(1));
        prop_assert!(reconciler.is_online());

        reconciler.on_deadline(at + WINDOW);
        prop_assert!(!reconciler.is_online());
        prop_assert!(view.has_changed().unwrap_or(false));
        let _ = view.borrow_and_update();

        // No further transitions without new arrivals
        reconciler.on_deadline(at + WINDOW * 5);
        prop_assert!(!view.has_changed().unwrap_or(true));
    }
}

// Duplicate payloads: appended twice, alarm fires at most once.
#[test]
fn duplicate_payload_is_not_deduplicated() {
    let (mut reconciler, sounds, _) = reconciler(30);
    let now = Instant::now();
    let payload = json!({"temperature": 50.0, "alarm": true});

    reconciler.on_snapshot(Delivery::Present(payload.clone()), now, Utc::now());
    reconciler.on_snapshot(Delivery::Present(payload), now, Utc::now());

    assert_eq!(reconciler.history().len(), 2);
    assert_eq!(sounds.load(Ordering::SeqCst), 1);
}

//! Stream-to-state reconciliation.
//!
//! The [`Reconciler`] is the single entry point for deliveries from a
//! telemetry source. For every present value it, in order:
//!
//! 1. feeds the [`LivenessTracker`],
//! 2. checks the [`AlarmEdgeDetector`] (before `current` is replaced),
//! 3. appends to the [`History`],
//! 4. publishes the snapshot as current.
//!
//! An absent value clears `current`, forces offline and re-arms the edge
//! detector without touching history. Every change is pushed to observers
//! as a [`DashboardView`] over a watch channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::alert::AlertSink;
use crate::source::Delivery;
use crate::telemetry::duration::format_duration;
use crate::telemetry::format::{format_gas, format_temperature};
use crate::telemetry::{
    AlarmEdgeDetector, Flame, History, Liveness, LivenessPolicy, LivenessTracker, Snapshot,
    TimestampUnit, DEFAULT_HISTORY_CAPACITY,
};

/// Title used for alarm notifications.
pub const ALARM_TITLE: &str = "Fire alarm";

/// Read-only state exposed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    /// The latest snapshot, or `None` when the device has no data.
    pub current: Option<Arc<Snapshot>>,
    /// Past snapshots, newest first.
    pub history: Vec<Arc<Snapshot>>,
    pub online: bool,
    /// Number of alarm edges that have fired since start.
    pub alarm_triggers: u64,
}

/// Tunables for a [`Reconciler`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilerOptions {
    pub history_capacity: usize,
    pub liveness: LivenessPolicy,
    pub timestamp_unit: TimestampUnit,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            liveness: LivenessPolicy::default(),
            timestamp_unit: TimestampUnit::default(),
        }
    }
}

/// Orchestrates liveness, history and alarm edges for one device.
///
/// Deliveries and deadline expiries must be fed from a single task, one at
/// a time, in arrival order.
#[derive(Debug)]
pub struct Reconciler {
    liveness: LivenessTracker,
    history: History,
    alarm: AlarmEdgeDetector,
    current: Option<Arc<Snapshot>>,
    timestamp_unit: TimestampUnit,
    alerts: Box<dyn AlertSink>,
    alarm_triggers: u64,
    view: watch::Sender<DashboardView>,
}

impl Reconciler {
    pub fn new(options: ReconcilerOptions, alerts: Box<dyn AlertSink>) -> Self {
        let (view, _) = watch::channel(DashboardView::default());
        Self {
            liveness: LivenessTracker::new(options.liveness),
            history: History::new(options.history_capacity),
            alarm: AlarmEdgeDetector::new(),
            current: None,
            timestamp_unit: options.timestamp_unit,
            alerts,
            alarm_triggers: 0,
            view,
        }
    }

    /// Observe the derived view. The receiver sees every later update.
    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.view.subscribe()
    }

    /// Handle one delivery from the telemetry source.
    ///
    /// `now` drives liveness deadlines; `wall` is stamped on the snapshot
    /// as its arrival time.
    pub fn on_snapshot(&mut self, delivery: Delivery, now: Instant, wall: DateTime<Utc>) {
        match delivery {
            Delivery::Absent => {
                debug!("Device node is empty");
                let was_online = self.liveness.is_online();
                self.current = None;
                self.liveness.reset();
                self.alarm.reset();
                if was_online {
                    info!("Device offline (no data)");
                }
            }
            Delivery::Present(value) => {
                let snapshot = Arc::new(Snapshot::from_value(&value, wall, self.timestamp_unit));
                debug!(?snapshot, "Reconciling snapshot");

                let was_online = self.liveness.is_online();
                let online = self.liveness.on_arrival(&snapshot, now) == Liveness::Online;
                if online != was_online {
                    info!("Device {}", if online { "online" } else { "offline" });
                }

                if self.alarm.check(snapshot.alarm) {
                    self.raise_alarm(&snapshot);
                }

                self.history.append(snapshot.clone());
                self.current = Some(snapshot);
            }
        }
        self.publish();
    }

    /// Handle expiry of the liveness deadline.
    pub fn on_deadline(&mut self, now: Instant) {
        if self.liveness.on_expiry(now) {
            info!(
                "Device offline (no fresh data within {})",
                format_duration(self.liveness.policy().threshold())
            );
            self.publish();
        }
    }

    /// When [`on_deadline`](Self::on_deadline) should next be called.
    pub fn deadline(&self) -> Option<Instant> {
        self.liveness.deadline()
    }

    pub fn current(&self) -> Option<&Arc<Snapshot>> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_online(&self) -> bool {
        self.liveness.is_online()
    }

    pub fn alarm_triggers(&self) -> u64 {
        self.alarm_triggers
    }

    /// Build the current derived view.
    pub fn view(&self) -> DashboardView {
        DashboardView {
            current: self.current.clone(),
            history: self.history.to_ordered_vec(),
            online: self.liveness.is_online(),
            alarm_triggers: self.alarm_triggers,
        }
    }

    fn publish(&self) {
        self.view.send_replace(self.view());
    }

    fn raise_alarm(&mut self, snapshot: &Snapshot) {
        self.alarm_triggers += 1;
        let body = alarm_body(snapshot);
        warn!("Alarm raised: {}", body);

        self.alerts.play_alarm_sound();
        self.alerts.show_notification(ALARM_TITLE, &body);
    }
}

fn alarm_body(snapshot: &Snapshot) -> String {
    let flame = match snapshot.flame {
        Flame::Detected => "flame detected",
        Flame::Clear => "no flame",
        Flame::Unknown => "flame unknown",
    };
    format!(
        "Temperature {}, gas {}, {}",
        format_temperature(snapshot.temperature),
        format_gas(snapshot.gas),
        flame
    )
}

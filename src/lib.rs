//! # firewatch
//!
//! A live terminal dashboard and library for a single fire-detection
//! sensor node.
//!
//! The node publishes temperature, humidity, gas, flame and an alarm flag
//! to a realtime feed. This crate turns that feed into reconciled state: the
//! current snapshot, a bounded history, an online/offline signal with
//! timeout semantics, and an edge-triggered alarm notification.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Application                           │
//! │  ┌─────────┐    ┌────────────┐    ┌──────────┐   ┌─────────┐ │
//! │  │ source  │───▶│  monitor   │───▶│   app    │──▶│   ui    │ │
//! │  │ (input) │    │(reconciler)│    │ (state)  │   │         │ │
//! │  └─────────┘    └─────┬──────┘    └──────────┘   └─────────┘ │
//! │       ▲               │ watch<DashboardView>                 │
//! │       │               ▼                                      │
//! │  File | Stream   ┌──────────┐                                │
//! │  Channel | RTDB  │  alert   │  bell / desktop notification   │
//! │                  └──────────┘                                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Telemetry source abstraction ([`TelemetrySource`] trait) with
//!   implementations for file polling, byte streams, channels and Firebase RTDB
//! - **[`telemetry`]**: The snapshot model, history buffer, liveness tracker,
//!   alarm edge detector and reading classification
//! - **[`reconciler`]**: Applies deliveries to the telemetry state and publishes
//!   a [`DashboardView`]
//! - **[`monitor`]**: The task that owns a subscription and drives the reconciler
//! - **[`app`]** / **[`ui`]**: Terminal presentation using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Poll a JSON export of the device tree
//! firewatch --file telemetry.json
//!
//! # Stream from a Firebase Realtime Database
//! firewatch --rtdb https://my-project-default-rtdb.firebaseio.com
//!
//! # Newline-delimited JSON over TCP
//! firewatch --connect localhost:9090
//! ```
//!
//! ### As a library with channel source
//!
//! ```
//! use firewatch::{
//!     ChannelSource, Delivery, Monitor, Reconciler, ReconcilerOptions, SilentAlert,
//!     TelemetrySource,
//! };
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let (tx, mut source) = ChannelSource::create("sensor bridge");
//! let subscription = source.subscribe("/devices/esp32_1").unwrap();
//! let reconciler = Reconciler::new(ReconcilerOptions::default(), Box::new(SilentAlert));
//! let monitor = Monitor::spawn(subscription, reconciler);
//!
//! let mut view = monitor.view();
//! tx.send(Delivery::Present(json!({"temperature": 24.5, "alarm": false})))
//!     .await
//!     .unwrap();
//! view.changed().await.unwrap();
//! assert!(view.borrow().online);
//!
//! monitor.shutdown().await;
//! # });
//! ```

pub mod alert;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod monitor;
pub mod reconciler;
pub mod source;
pub mod telemetry;
pub mod ui;

// Re-export main types for convenience
pub use alert::{AlertSink, SilentAlert, TerminalAlert};
pub use app::App;
pub use config::Settings;
pub use error::{ConfigError, SourceError};
pub use monitor::Monitor;
pub use reconciler::{DashboardView, Reconciler, ReconcilerOptions};
#[cfg(feature = "rtdb")]
pub use source::RtdbSource;
pub use source::{
    ChannelSource, Delivery, FileSource, StreamSource, Subscription, TelemetrySource,
};
pub use telemetry::{
    AlarmEdgeDetector, Flame, History, Level, Liveness, LivenessPolicy, LivenessTracker,
    Snapshot, Thresholds, TimestampUnit,
};

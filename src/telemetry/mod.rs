//! Telemetry models and the stateful pieces of reconciliation.
//!
//! ## Submodules
//!
//! - [`snapshot`]: [`Snapshot`] and lenient payload coercion
//! - [`history`]: bounded newest-first [`History`]
//! - [`liveness`]: [`LivenessTracker`] deriving online/offline
//! - [`alarm`]: [`AlarmEdgeDetector`] for rising alarm edges
//! - [`assess`]: reading classification against [`Thresholds`]
//! - [`format`], [`duration`]: display and parsing helpers
//!
//! ## Data Flow
//!
//! ```text
//! serde_json::Value (raw payload)
//!        │
//!        ▼
//! Snapshot::from_value()
//!        │
//!        ├──▶ LivenessTracker::on_arrival()
//!        ├──▶ AlarmEdgeDetector::check()
//!        └──▶ History::append()
//! ```

pub mod alarm;
pub mod assess;
pub mod duration;
pub mod format;
pub mod history;
pub mod liveness;
pub mod snapshot;

pub use alarm::AlarmEdgeDetector;
pub use assess::{Level, Thresholds};
pub use history::{History, DEFAULT_HISTORY_CAPACITY};
pub use liveness::{Liveness, LivenessPolicy, LivenessTracker, DEFAULT_LIVENESS_THRESHOLD};
pub use snapshot::{Flame, Snapshot, TimestampUnit};

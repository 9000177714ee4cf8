//! Example: Feeding the dashboard through a channel
//!
//! Generates synthetic sensor readings, pushes them through a
//! [`ChannelSource`] and prints every derived view. Along the way the
//! sensor heats up until the alarm trips, pauses long enough to drop
//! offline, and finally disappears from the tree.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example synthetic_sensor
//! ```

use std::time::Duration;

use chrono::Utc;
use firewatch::telemetry::format::{format_gas, format_temperature};
use firewatch::{
    ChannelSource, Delivery, LivenessPolicy, Monitor, Reconciler, ReconcilerOptions,
    SilentAlert, TelemetrySource,
};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Synthetic sensor example\n");

    let (tx, mut source) = ChannelSource::create("synthetic-sensor");
    let subscription = source.subscribe("/devices/esp32_1")?;

    let options = ReconcilerOptions {
        history_capacity: 5,
        liveness: LivenessPolicy::ArrivalTimeout(Duration::from_secs(2)),
        ..ReconcilerOptions::default()
    };
    let monitor = Monitor::spawn(subscription, Reconciler::new(options, Box::new(SilentAlert)));
    let mut view = monitor.view();

    // Producer: a sensor warming up until the alarm trips
    tokio::spawn(async move {
        for step in 0..8u32 {
            let temperature = 24.0 + f64::from(step) * 6.0;
            let payload = json!({
                "temperature": temperature,
                "humidity": 40.0,
                "gas": 600 + step * 350,
                "flame": if temperature >= 55.0 { 0 } else { 1 },
                "alarm": temperature >= 50.0,
                "timestamp": Utc::now().timestamp_millis(),
            });
            if tx.send(Delivery::Present(payload)).await.is_err() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }

        // Go quiet long enough for the liveness window to close
        tokio::time::sleep(Duration::from_secs(3)).await;

        // The device node is removed
        let _ = tx.send(Delivery::Absent).await;
    });

    while view.changed().await.is_ok() {
        let current = view.borrow_and_update().clone();
        let status = if current.online { "online " } else { "offline" };
        match current.current {
            Some(ref s) => println!(
                "[{}] temp {:>9}  gas {:>5}  alarm {:<5}  history {}  alarms fired {}",
                status,
                format_temperature(s.temperature),
                format_gas(s.gas),
                s.alarm,
                current.history.len(),
                current.alarm_triggers,
            ),
            None => println!("[{}] no data (history {})", status, current.history.len()),
        }
    }

    monitor.shutdown().await;
    Ok(())
}

//! Firebase Realtime Database streaming source.
//!
//! Uses the database's REST streaming endpoint: a GET on
//! `{base}/{path}.json` with `Accept: text/event-stream` returns
//! Server-Sent Events describing changes under that node.
//!
//! | Event | Data | Effect |
//! |-------|------|--------|
//! | `put` | `{"path": p, "data": d}` | replace the value at `p` |
//! | `patch` | `{"path": p, "data": {k: v}}` | set each child `k` under `p` |
//! | `keep-alive` | `null` | ignored |
//! | `cancel`, `auth_revoked` | reason | node becomes absent, stream ends |
//!
//! After each `put` or `patch` the whole device node is delivered.

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{Delivery, Subscription, TelemetrySource, DELIVERY_BUFFER};
use crate::error::SourceError;

/// A telemetry source streaming a node of a Firebase Realtime Database.
///
/// # Example
///
/// ```no_run
/// use firewatch::{RtdbSource, TelemetrySource};
///
/// # tokio_test::block_on(async {
/// let mut source = RtdbSource::new("https://example-default-rtdb.firebaseio.com");
/// let subscription = source.subscribe("/devices/esp32_1").unwrap();
/// # });
/// ```
#[derive(Debug)]
pub struct RtdbSource {
    base_url: String,
    client: reqwest::Client,
    description: String,
    subscribed: bool,
}

impl RtdbSource {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            description: format!("rtdb: {}", base_url),
            base_url,
            client,
            subscribed: false,
        }
    }

    fn node_url(&self, device_path: &str) -> String {
        format!("{}/{}.json", self.base_url, device_path.trim_matches('/'))
    }
}

impl TelemetrySource for RtdbSource {
    fn subscribe(&mut self, device_path: &str) -> Result<Subscription, SourceError> {
        if self.subscribed {
            return Err(SourceError::AlreadySubscribed(self.description.clone()));
        }
        self.subscribed = true;

        let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);
        let url = self.node_url(device_path);
        let request = self.client.get(&url).header(ACCEPT, "text/event-stream");

        let task = tokio::spawn(async move {
            if let Err(e) = stream_events(request, &tx).await {
                warn!("Realtime database stream {} failed: {}", url, e);
            }
            let _ = tx.send(Delivery::Absent).await;
        });

        Ok(Subscription::new(rx, Some(task), &self.description))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

async fn stream_events(
    request: reqwest::RequestBuilder,
    tx: &mpsc::Sender<Delivery>,
) -> Result<(), SourceError> {
    let response = request.send().await?.error_for_status()?;
    info!("Subscribed to {}", response.url());

    let mut body = response.bytes_stream();
    let mut parser = EventParser::default();
    let mut node = Value::Null;
    let mut pending: Vec<u8> = Vec::new();

    while let Some(chunk) = body.next().await {
        pending.extend_from_slice(&chunk?);

        while let Some(end) = pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw);
            let Some(event) = parser.feed_line(line.trim_end_matches(['\n', '\r'])) else {
                continue;
            };

            match apply_event(&mut node, &event) {
                Action::Deliver => {
                    if tx.send(Delivery::from_value(node.clone())).await.is_err() {
                        return Ok(());
                    }
                }
                Action::Ignore => {}
                Action::Close(reason) => {
                    info!("Realtime database closed the stream: {}", reason);
                    return Ok(());
                }
            }
        }
    }

    info!("Realtime database stream ended");
    Ok(())
}

/// One dispatched Server-Sent Event.
#[derive(Debug, Clone, PartialEq)]
struct Event {
    name: String,
    data: String,
}

/// Incremental Server-Sent Events line parser.
#[derive(Debug, Default)]
struct EventParser {
    name: Option<String>,
    data: Vec<String>,
}

impl EventParser {
    /// Feed one line without its terminator. Returns an event on the blank
    /// line that ends it.
    fn feed_line(&mut self, line: &str) -> Option<Event> {
        if line.is_empty() {
            if self.name.is_none() && self.data.is_empty() {
                return None;
            }
            let event = Event {
                name: self.name.take().unwrap_or_else(|| "message".to_string()),
                data: self.data.join("\n"),
            };
            self.data.clear();
            return Some(event);
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.name = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }
}

#[derive(Debug, PartialEq)]
enum Action {
    Deliver,
    Ignore,
    Close(String),
}

#[derive(Debug, Deserialize)]
struct Change {
    path: String,
    data: Value,
}

fn apply_event(node: &mut Value, event: &Event) -> Action {
    match event.name.as_str() {
        "put" | "patch" => {
            let change: Change = match serde_json::from_str(&event.data) {
                Ok(change) => change,
                Err(e) => {
                    warn!("Skipping malformed {} event: {}", event.name, e);
                    return Action::Ignore;
                }
            };
            debug!("{} at {}", event.name, change.path);
            if event.name == "put" {
                apply_put(node, &change.path, change.data);
            } else {
                apply_patch(node, &change.path, change.data);
            }
            Action::Deliver
        }
        "keep-alive" => Action::Ignore,
        "cancel" | "auth_revoked" => Action::Close(event.name.clone()),
        other => {
            debug!("Ignoring event {}", other);
            Action::Ignore
        }
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Replace the value at `path`; `null` deletes it.
fn apply_put(node: &mut Value, path: &str, data: Value) {
    let segments = segments(path);
    let Some((last, parents)) = segments.split_last() else {
        *node = data;
        return;
    };

    let mut current = &mut *node;
    for segment in parents {
        current = child_object(current)
            .entry(segment.to_string())
            .or_insert(Value::Null);
    }

    let map = child_object(current);
    if data.is_null() {
        map.remove(*last);
    } else {
        map.insert(last.to_string(), data);
    }
    prune_empty(node);
}

/// Set each child of `data` under `path`.
fn apply_patch(node: &mut Value, path: &str, data: Value) {
    let Value::Object(children) = data else {
        apply_put(node, path, data);
        return;
    };
    let base = path.trim_end_matches('/');
    for (key, value) in children {
        apply_put(node, &format!("{}/{}", base, key), value);
    }
}

fn child_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

/// The database has no empty objects; a node whose children are all gone is null.
fn prune_empty(value: &mut Value) {
    if let Value::Object(map) = value {
        for child in map.values_mut() {
            prune_empty(child);
        }
        map.retain(|_, child| !child.is_null());
        if map.is_empty() {
            *value = Value::Null;
        }
    }
}

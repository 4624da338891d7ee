//! Decoding of the optimizer's Socket.IO push channel.
//!
//! The optimizer speaks Socket.IO v4 on top of Engine.IO v4 over a plain
//! WebSocket. Every WebSocket text message is one Engine.IO packet:
//!
//! - `0{...}` open handshake (carries the ping interval/timeout)
//! - `1` close, `2` ping, `3` pong, `6` noop
//! - `4...` Socket.IO packet: `40` namespace connected, `41` disconnected,
//!   `42["event", payload]` event, `44{...}` connect error
//!
//! Only three events matter to the editor: `path_update`,
//! `optimization_error` and `connection_status`. Anything malformed is
//! dropped here so it never reaches the scene state.

use serde::Deserialize;
use serde_json::Value;

use crate::scene::{PathSnapshot, Point, SolutionDetails};

/// Client packet answering a server ping.
pub const PONG_FRAME: &str = "3";
/// Client packet joining the default namespace.
pub const CONNECT_FRAME: &str = "40";

/// Application-level message pushed by the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    PathUpdate(PathSnapshot),
    OptimizationError(String),
    ConnectionStatus(String),
}

/// What the push listener reports to the editor task.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Connected,
    Disconnected(String),
    Message(PushMessage),
}

/// Session parameters announced in the Engine.IO open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    #[serde(default)]
    pub sid: String,
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
}

fn default_ping_interval() -> u64 {
    25_000
}

fn default_ping_timeout() -> u64 {
    20_000
}

/// One decoded Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Open(OpenHandshake),
    Close,
    Ping,
    Pong,
    NamespaceConnected,
    NamespaceDisconnected,
    ConnectError(String),
    Event(PushMessage),
    /// Valid but irrelevant, unknown or malformed packet.
    Ignored,
}

/// Decode a single WebSocket text message.
pub fn decode_frame(text: &str) -> Frame {
    let mut chars = text.chars();
    match chars.next() {
        Some('0') => match serde_json::from_str::<OpenHandshake>(chars.as_str()) {
            Ok(handshake) => Frame::Open(handshake),
            Err(e) => {
                log::debug!("Unparseable open packet {:?}: {}", text, e);
                Frame::Ignored
            }
        },
        Some('1') => Frame::Close,
        Some('2') => Frame::Ping,
        Some('3') => Frame::Pong,
        Some('4') => decode_socket_packet(chars.as_str()),
        _ => {
            log::debug!("Ignoring frame {:?}", text);
            Frame::Ignored
        }
    }
}

fn decode_socket_packet(packet: &str) -> Frame {
    let mut chars = packet.chars();
    let kind = chars.next();
    let body = skip_namespace_and_ack(chars.as_str());
    match kind {
        Some('0') => Frame::NamespaceConnected,
        Some('1') => Frame::NamespaceDisconnected,
        Some('2') => match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(items)) => match items.as_slice() {
                [Value::String(name), payload, ..] => decode_event(name, payload).map(Frame::Event).unwrap_or(Frame::Ignored),
                [Value::String(name)] => decode_event(name, &Value::Null).map(Frame::Event).unwrap_or(Frame::Ignored),
                _ => Frame::Ignored,
            },
            _ => {
                log::debug!("Malformed event packet {:?}", packet);
                Frame::Ignored
            }
        },
        Some('4') => {
            let message = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| body.to_string());
            Frame::ConnectError(message)
        }
        _ => Frame::Ignored,
    }
}

/// Strip an optional `/namespace,` prefix and ack id in front of the JSON body.
fn skip_namespace_and_ack(body: &str) -> &str {
    let body = if body.starts_with('/') {
        match body.find(',') {
            Some(idx) => &body[idx + 1..],
            None => "",
        }
    } else {
        body
    };
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

/// Turn a named event into a message, or `None` if it is unknown or malformed.
pub fn decode_event(name: &str, payload: &Value) -> Option<PushMessage> {
    match name {
        "path_update" => decode_path_update(payload).map(PushMessage::PathUpdate),
        "optimization_error" => {
            let message = payload.get("message").and_then(Value::as_str).unwrap_or("unknown optimization error");
            Some(PushMessage::OptimizationError(message.to_string()))
        }
        "connection_status" => {
            let status = payload.get("status").and_then(Value::as_str).unwrap_or_default();
            Some(PushMessage::ConnectionStatus(status.to_string()))
        }
        other => {
            log::debug!("Ignoring unknown event {:?}", other);
            None
        }
    }
}

/// Decode a `path_update` payload.
///
/// `path` must be an array of points (`{"x":..,"y":..}` or `[x, y]`); a
/// missing or non-array path, or any malformed point, discards the whole
/// update. Missing `iteration`, `cost` or `length` default to zero.
pub fn decode_path_update(payload: &Value) -> Option<PathSnapshot> {
    let Some(raw_path) = payload.get("path").and_then(Value::as_array) else {
        log::warn!("Discarding path update without a path array");
        return None;
    };

    let mut path = Vec::with_capacity(raw_path.len());
    for raw_point in raw_path {
        match decode_point(raw_point) {
            Some(point) => path.push(point),
            None => {
                log::warn!("Discarding path update with malformed point {}", raw_point);
                return None;
            }
        }
    }

    let iteration = payload
        .get("iteration")
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
        .unwrap_or(0);
    let number = |key: &str| payload.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    let details = payload
        .get("details")
        .and_then(|d| serde_json::from_value::<SolutionDetails>(d.clone()).ok());

    Some(PathSnapshot {
        path,
        iteration,
        cost: number("cost"),
        length: number("length"),
        details,
    })
}

fn decode_point(value: &Value) -> Option<Point> {
    match value {
        Value::Object(map) => Some(Point::new(map.get("x")?.as_f64()?, map.get("y")?.as_f64()?)),
        Value::Array(pair) if pair.len() == 2 => Some(Point::new(pair[0].as_f64()?, pair[1].as_f64()?)),
        _ => None,
    }
}

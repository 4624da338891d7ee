//! WebSocket connection loop for the push channel.
//!
//! Runs on its own thread. Each session performs the Engine.IO handshake,
//! joins the default namespace, answers pings and forwards decoded messages
//! to the editor. Lost sessions are retried after a fixed delay; after
//! `reconnect_attempts` consecutive failures the listener gives up.

use std::net::TcpStream;
use std::time::Duration;

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::push::{CONNECT_FRAME, Frame, OpenHandshake, PONG_FRAME, PushEvent, decode_frame};
use crate::common::BackendConfig;

/// What the session loop should do after a frame.
#[derive(Debug, Clone, PartialEq)]
enum Step {
    Continue,
    Reply(&'static str),
    Handshake(OpenHandshake),
    Emit(PushEvent),
    End(String),
}

fn step(frame: Frame, connected: &mut bool) -> Step {
    match frame {
        Frame::Open(handshake) => Step::Handshake(handshake),
        Frame::Ping => Step::Reply(PONG_FRAME),
        Frame::NamespaceConnected => {
            *connected = true;
            Step::Emit(PushEvent::Connected)
        }
        Frame::Event(message) => Step::Emit(PushEvent::Message(message)),
        Frame::NamespaceDisconnected => Step::End("disconnected by server".to_string()),
        Frame::Close => Step::End("connection closed by server".to_string()),
        Frame::ConnectError(message) => Step::End(format!("connect error: {}", message)),
        Frame::Pong | Frame::Ignored => Step::Continue,
    }
}

/// Keep the push channel connected until the retry budget is exhausted.
///
/// # Parameters
///
/// * `config` - Backend location and reconnection policy
/// * `emit` - Sink for connection changes and decoded messages
pub fn run_push_listener(config: &BackendConfig, mut emit: impl FnMut(PushEvent)) {
    let url = config.socket_url();
    let delay = Duration::from_millis(config.reconnect_delay_ms);
    let open_timeout = Duration::from_secs(config.request_timeout_secs);
    let mut failures = 0u32;

    loop {
        log::info!("Connecting to push channel at {}", url);
        match run_session(&url, open_timeout, &mut emit) {
            Ok(reason) => {
                log::info!("Disconnected from push channel: {}", reason);
                emit(PushEvent::Disconnected(reason));
                failures = 0;
            }
            Err(reason) => {
                failures += 1;
                log::error!("Push channel connection error ({}/{}): {}", failures, config.reconnect_attempts, reason);
                if failures >= config.reconnect_attempts {
                    log::error!("Giving up on the push channel after {} attempts", failures);
                    emit(PushEvent::Disconnected(reason));
                    return;
                }
            }
        }
        std::thread::sleep(delay);
    }
}

/// Run one WebSocket session.
///
/// Until the Engine.IO open packet arrives, reads give up after
/// `open_timeout`; afterwards the server's ping settings decide.
///
/// # Returns
///
/// `Ok(reason)` if the namespace was joined before the session ended,
/// `Err(reason)` if the session failed before that point.
fn run_session(url: &str, open_timeout: Duration, emit: &mut impl FnMut(PushEvent)) -> Result<String, String> {
    let (mut socket, _response) = tungstenite::connect(url).map_err(|e| e.to_string())?;
    set_read_timeout(&socket, open_timeout).map_err(|e| format!("could not set read timeout: {}", e))?;
    let mut connected = false;

    let end = |connected: bool, reason: String| if connected { Ok(reason) } else { Err(reason) };

    loop {
        let message = match socket.read() {
            Ok(message) => message,
            Err(e) => return end(connected, e.to_string()),
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => return end(connected, "websocket closed".to_string()),
            _ => continue,
        };

        match step(decode_frame(text.as_str()), &mut connected) {
            Step::Continue => {}
            Step::Reply(frame) => {
                if let Err(e) = socket.send(Message::text(frame)) {
                    return end(connected, e.to_string());
                }
            }
            Step::Handshake(handshake) => {
                // A silent server is dead once a ping interval plus its timeout has passed.
                let timeout = Duration::from_millis(handshake.ping_interval + handshake.ping_timeout);
                if let Err(e) = set_read_timeout(&socket, timeout) {
                    log::warn!("Could not set push channel read timeout: {}", e);
                }
                if let Err(e) = socket.send(Message::text(CONNECT_FRAME)) {
                    return end(connected, e.to_string());
                }
            }
            Step::Emit(event) => {
                if event == PushEvent::Connected {
                    log::info!("Connected to push channel");
                }
                emit(event);
            }
            Step::End(reason) => return end(connected, reason),
        }
    }
}

fn set_read_timeout(socket: &WebSocket<MaybeTlsStream<TcpStream>>, timeout: Duration) -> std::io::Result<()> {
    #[allow(unreachable_patterns)]
    match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(timeout)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::PushMessage;
    use std::net::TcpListener;
    use std::time::Instant;

    fn closed_port() -> u16 {
        TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
    }

    #[test]
    fn handshake_then_namespace_join_reports_connected() {
        let mut connected = false;
        let open = decode_frame(r#"0{"sid":"s1","pingInterval":25000,"pingTimeout":20000}"#);
        assert!(matches!(step(open, &mut connected), Step::Handshake(h) if h.ping_interval == 25_000));
        assert!(!connected);

        assert_eq!(step(decode_frame("40"), &mut connected), Step::Emit(PushEvent::Connected));
        assert!(connected);
    }

    #[test]
    fn pings_are_answered_with_pongs() {
        let mut connected = true;
        assert_eq!(step(decode_frame("2"), &mut connected), Step::Reply("3"));
        assert_eq!(step(decode_frame("3"), &mut connected), Step::Continue);
    }

    #[test]
    fn events_are_forwarded_and_errors_end_the_session() {
        let mut connected = true;
        assert_eq!(
            step(decode_frame(r#"42["optimization_error",{"message":"boom"}]"#), &mut connected),
            Step::Emit(PushEvent::Message(PushMessage::OptimizationError("boom".to_string())))
        );
        assert_eq!(step(decode_frame(r#"42["path_update",{}]"#), &mut connected), Step::Continue);
        assert!(matches!(step(decode_frame("41"), &mut connected), Step::End(_)));
        assert!(matches!(step(decode_frame(r#"44{"message":"nope"}"#), &mut connected), Step::End(r) if r.contains("nope")));
    }

    #[test]
    fn listener_gives_up_after_configured_attempts() {
        let config = BackendConfig {
            url: format!("http://127.0.0.1:{}", closed_port()),
            reconnect_attempts: 2,
            reconnect_delay_ms: 1,
            ..Default::default()
        };
        let mut events = Vec::new();
        run_push_listener(&config, |event| events.push(event));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], PushEvent::Disconnected(_)));
    }

    #[test]
    fn silent_server_times_out_before_the_handshake() {
        let server = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = server.local_addr().unwrap().port();
        let handle = std::thread::spawn(move || {
            let (stream, _) = server.accept().unwrap();
            // Complete the WebSocket upgrade, then never send the open packet.
            let _socket = tungstenite::accept(stream).unwrap();
            std::thread::sleep(Duration::from_millis(1500));
        });

        let url = format!("ws://127.0.0.1:{}/socket.io/?EIO=4&transport=websocket", port);
        let began = Instant::now();
        let mut events = Vec::new();
        let result = run_session(&url, Duration::from_millis(200), &mut |event: PushEvent| events.push(event));

        assert!(result.is_err(), "got {:?}", result);
        assert!(began.elapsed() < Duration::from_millis(1200));
        assert!(events.is_empty());
        handle.join().unwrap();
    }
}

//! Shared websocket subscription to the backend's realtime feed.
//!
//! A single reader thread serves every subscriber. It starts with the first subscription,
//! reconnects while subscribers remain, and exits once the last one is dropped.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use tracing::debug;
use tracing::info;
use tracing::warn;
use url::Url;

use super::message::parse_push_message;
use super::socket::Frame;
use super::socket::PushSocket;
use super::socket::SERVICE;
use super::socket::connect_ws_socket;
use super::socket::read_frame;
use crate::common::mutex_lock_or_recover;
use crate::usecases::ports::PushChannel;
use crate::usecases::ports::PushEvent;
use crate::usecases::ports::PushHandler;
use crate::usecases::ports::PushSubscription;
use crate::usecases::ports::ServiceError;

const READ_POLL: Duration = Duration::from_millis(250);
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Default)]
struct Registry {
    handlers: Vec<(u64, PushHandler)>,
    reader_alive: bool,
}

struct Shared {
    url: Url,
    registry: Mutex<Registry>,
    next_id: AtomicU64,
}

impl Shared {
    fn handlers(&self) -> Vec<PushHandler> {
        mutex_lock_or_recover(&self.registry)
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }

    /// Marks the reader stopped when nobody is listening. Returns true if it should exit.
    fn retire_if_idle(&self) -> bool {
        let mut registry = mutex_lock_or_recover(&self.registry);
        if registry.handlers.is_empty() {
            registry.reader_alive = false;
            true
        } else {
            false
        }
    }

    fn dispatch(&self, event: PushEvent) {
        debug!(kind = event.kind(), device_id = event.device_id(), "Push event");
        for handler in self.handlers() {
            handler(event.clone());
        }
    }
}

#[derive(Clone)]
pub struct WsPushChannel {
    shared: Arc<Shared>,
}

impl WsPushChannel {
    pub fn new(url: Url) -> Self {
        Self {
            shared: Arc::new(Shared {
                url,
                registry: Mutex::new(Registry::default()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        mutex_lock_or_recover(&self.shared.registry).handlers.len()
    }

    pub fn is_reading(&self) -> bool {
        mutex_lock_or_recover(&self.shared.registry).reader_alive
    }
}

impl PushChannel for WsPushChannel {
    fn subscribe(&self, handler: PushHandler) -> Result<PushSubscription, ServiceError> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut registry = mutex_lock_or_recover(&self.shared.registry);
            if !registry.reader_alive {
                let socket = connect_ws_socket(&self.shared.url, READ_POLL)?;
                let shared = Arc::clone(&self.shared);
                thread::Builder::new()
                    .name("push-channel".to_string())
                    .spawn(move || run_reader(shared, socket))
                    .map_err(|err| ServiceError::Failed {
                        service: SERVICE,
                        reason: format!("failed to start reader: {err}"),
                    })?;
                registry.reader_alive = true;
                info!(url = %self.shared.url, "Push channel connected");
            }
            registry.handlers.push((id, handler));
        }

        let shared = Arc::clone(&self.shared);
        Ok(PushSubscription::new(move || {
            mutex_lock_or_recover(&shared.registry)
                .handlers
                .retain(|(handler_id, _)| *handler_id != id);
        }))
    }
}

fn run_reader(shared: Arc<Shared>, mut socket: PushSocket) {
    loop {
        if shared.retire_if_idle() {
            let _ = socket.close(None);
            let _ = socket.flush();
            debug!("Push channel reader stopped");
            return;
        }
        match read_frame(&mut socket) {
            Ok(Frame::Text(text)) => {
                if let Some(event) = parse_push_message(&text) {
                    shared.dispatch(event);
                }
            }
            Ok(Frame::Idle) => {}
            Ok(Frame::Closed) => {
                warn!("Push channel closed by server");
                match reconnect(&shared) {
                    Some(fresh) => socket = fresh,
                    None => return,
                }
            }
            Err(err) => {
                warn!(error = %err, "Push channel read failed");
                match reconnect(&shared) {
                    Some(fresh) => socket = fresh,
                    None => return,
                }
            }
        }
    }
}

fn reconnect(shared: &Shared) -> Option<PushSocket> {
    loop {
        let mut waited = Duration::ZERO;
        while waited < RECONNECT_DELAY {
            if shared.retire_if_idle() {
                return None;
            }
            thread::sleep(READ_POLL);
            waited += READ_POLL;
        }
        match connect_ws_socket(&shared.url, READ_POLL) {
            Ok(socket) => {
                info!(url = %shared.url, "Push channel reconnected");
                return Some(socket);
            }
            Err(err) => warn!(error = %err, "Push channel reconnect failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InstallProgress;
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::time::Instant;
    use tungstenite::Message;

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        condition()
    }

    #[test]
    fn test_delivers_frames_to_subscribers() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut ws = tungstenite::accept(stream).unwrap();
            ws.send(Message::Text(
                r#"{"type":"installation_progress","data":{"device_id":"emulator-5554","progress":20,"message":"Analyzing APK..."}}"#
                    .into(),
            ))
            .unwrap();
            ws.send(Message::Text(r#"{"type":"heartbeat"}"#.into()))
                .unwrap();
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
        });

        let channel = WsPushChannel::new(Url::parse(&format!("ws://{addr}/ws/realtime")).unwrap());
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let subscription = channel
            .subscribe(Arc::new(move |event| {
                let _ = mutex_lock_or_recover(&tx).send(event);
            }))
            .unwrap();
        assert_eq!(channel.subscriber_count(), 1);

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            event,
            PushEvent::InstallationProgress(InstallProgress {
                device_id: "emulator-5554".to_string(),
                progress: 20.0,
                message: "Analyzing APK...".to_string(),
            })
        );

        drop(subscription);
        assert_eq!(channel.subscriber_count(), 0);
        assert!(wait_until(Duration::from_secs(3), || !channel.is_reading()));
        let _ = release_tx.send(());
        server.join().unwrap();
    }

    #[test]
    fn test_subscribe_fails_when_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let channel = WsPushChannel::new(Url::parse(&format!("ws://{addr}/ws/realtime")).unwrap());
        let err = channel.subscribe(Arc::new(|_| {})).unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable { .. }));
        assert_eq!(channel.subscriber_count(), 0);
        assert!(!channel.is_reading());
    }

    #[test]
    fn test_rejects_secure_scheme() {
        let channel = WsPushChannel::new(Url::parse("wss://backend.example/ws/realtime").unwrap());
        let err = channel.subscribe(Arc::new(|_| {})).unwrap_err();
        assert!(matches!(err, ServiceError::Failed { .. }));
    }
}

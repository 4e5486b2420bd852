//! Local HTTP/WebSocket API the recorder UI talks to.
//!
//! The server runs on its own thread with a private tokio runtime. Controller calls block, so
//! handlers move them onto `spawn_blocking`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::usecases::RecordingSessionController;

mod error;
mod routes;

pub use error::ApiServerError;

const API_VERSION: &str = "1";
const API_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy)]
pub struct ApiConfig {
    pub listen: SocketAddr,
    pub max_ws_connections: usize,
}

struct ApiState {
    controller: Arc<RecordingSessionController>,
    ws_limits: Arc<Semaphore>,
    shutdown_rx: watch::Receiver<bool>,
}

pub struct ApiServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<watch::Sender<bool>>,
    join: Option<thread::JoinHandle<()>>,
}

impl ApiServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(join) = self.join.take() {
            let (done_tx, done_rx) = std_mpsc::channel();
            let _ = thread::Builder::new()
                .name("api-shutdown".to_string())
                .spawn(move || {
                    let _ = join.join();
                    let _ = done_tx.send(());
                });
            if done_rx.recv_timeout(API_SHUTDOWN_TIMEOUT * 2).is_err() {
                warn!("API server did not stop within shutdown timeout");
            }
        }
    }
}

impl Drop for ApiServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Binds the listener and serves until `shutdown_flag` is set or the handle shuts down.
pub fn start_api_server(
    controller: Arc<RecordingSessionController>,
    shutdown_flag: Arc<AtomicBool>,
    config: ApiConfig,
) -> Result<ApiServerHandle, ApiServerError> {
    let listener = std::net::TcpListener::bind(config.listen).map_err(|source| {
        ApiServerError::Io {
            operation: "bind",
            source,
        }
    })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| ApiServerError::Io {
            operation: "set nonblocking",
            source,
        })?;
    let local_addr = listener.local_addr().map_err(|source| ApiServerError::Io {
        operation: "local addr",
        source,
    })?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = Arc::new(ApiState {
        controller,
        ws_limits: Arc::new(Semaphore::new(config.max_ws_connections)),
        shutdown_rx: shutdown_rx.clone(),
    });
    let shutdown_tx_for_thread = shutdown_tx.clone();

    let join = thread::Builder::new()
        .name("tapflow-api".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(err) => {
                    error!(error = %err, "Failed to build API runtime");
                    return;
                }
            };

            runtime.block_on(async move {
                let listener = match TcpListener::from_std(listener) {
                    Ok(l) => l,
                    Err(err) => {
                        error!(error = %err, "Failed to create async listener");
                        return;
                    }
                };
                info!(addr = %local_addr, "API server listening");
                let app = routes::build_router(state);
                let mut shutdown_rx_server = shutdown_rx.clone();
                let mut shutdown_rx_wait = shutdown_rx;
                let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                    let _ = shutdown_rx_server.changed().await;
                });
                let mut server_task = tokio::spawn(async move { server.await });

                let flag_task = tokio::spawn(async move {
                    while !shutdown_flag.load(Ordering::Relaxed) {
                        tokio::time::sleep(SHUTDOWN_POLL).await;
                    }
                    let _ = shutdown_tx_for_thread.send(true);
                });

                tokio::select! {
                    join_result = &mut server_task => {
                        if let Err(err) = join_result {
                            error!(error = %err, "API server task failed");
                        }
                    }
                    _ = shutdown_rx_wait.changed() => {
                        match tokio::time::timeout(API_SHUTDOWN_TIMEOUT, &mut server_task).await {
                            Ok(Err(err)) => error!(error = %err, "API server task failed"),
                            Ok(Ok(_)) => {}
                            Err(_) => {
                                warn!(
                                    timeout_ms = API_SHUTDOWN_TIMEOUT.as_millis(),
                                    "API server shutdown timed out; aborting"
                                );
                                server_task.abort();
                            }
                        }
                    }
                }
                flag_task.abort();
                info!("API server stopped");
            });
        })
        .map_err(|source| ApiServerError::Io {
            operation: "spawn api thread",
            source,
        })?;

    Ok(ApiServerHandle {
        local_addr,
        shutdown_tx: Some(shutdown_tx),
        join: Some(join),
    })
}

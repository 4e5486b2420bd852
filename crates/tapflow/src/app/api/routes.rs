use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::Message;
use axum::extract::ws::WebSocket;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde::Serialize;
use tokio::sync::OwnedSemaphorePermit;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tracing::debug;
use tracing::error;

use super::API_VERSION;
use super::ApiState;
use crate::adapters::ErrorPayload;
use crate::adapters::IntentRequest;
use crate::usecases::IntentOutput;
use crate::usecases::SessionIntent;
use crate::usecases::SessionView;
use crate::usecases::ports::ControllerError;

const REVISION_POLL: Duration = Duration::from_millis(100);

pub(super) fn build_router(state: Arc<ApiState>) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    axum::Router::new()
        .route("/api/v1/session", get(session_handler))
        .route("/api/v1/actions", get(actions_handler))
        .route("/api/v1/screenshot", get(screenshot_handler))
        .route("/api/v1/intents", post(intent_handler))
        .route("/api/v1/events", get(events_handler))
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct IntentResponse {
    output: IntentOutput,
    view: SessionView,
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum SessionEvent<'a> {
    Hello { api_version: &'a str, revision: u64 },
    State { view: &'a SessionView },
    Error { message: &'a str },
}

fn error_response(status: StatusCode, payload: ErrorPayload) -> Response {
    (status, Json(payload)).into_response()
}

fn controller_error_response(err: &ControllerError) -> Response {
    let status = StatusCode::from_u16(err.category().http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, ErrorPayload::from(err))
}

async fn run_blocking<T, F>(work: F) -> Result<T, Response>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ControllerError> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(controller_error_response(&err)),
        Err(err) => {
            error!(error = %err, "Controller task failed");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorPayload::new("controller task failed", "internal", "Restart tapflow."),
            ))
        }
    }
}

async fn session_handler(State(state): State<Arc<ApiState>>) -> Response {
    let controller = Arc::clone(&state.controller);
    match run_blocking(move || controller.view()).await {
        Ok(view) => Json(view).into_response(),
        Err(resp) => resp,
    }
}

async fn actions_handler(State(state): State<Arc<ApiState>>) -> Response {
    let controller = Arc::clone(&state.controller);
    match run_blocking(move || controller.actions()).await {
        Ok(actions) => Json(actions).into_response(),
        Err(resp) => resp,
    }
}

async fn screenshot_handler(State(state): State<Arc<ApiState>>) -> Response {
    match state.controller.screenshot() {
        Some(screenshot) => Json(screenshot).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            ErrorPayload::new(
                "no screenshot available",
                "not_found",
                "Launch the app to start the screen mirror.",
            ),
        ),
    }
}

async fn intent_handler(State(state): State<Arc<ApiState>>, body: Bytes) -> Response {
    let request: IntentRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorPayload::new(
                    format!("invalid intent: {err}"),
                    "invalid_input",
                    "Send a JSON object with an 'intent' field.",
                ),
            );
        }
    };
    let intent = match SessionIntent::try_from(request) {
        Ok(intent) => intent,
        Err(err) => return controller_error_response(&err),
    };

    let controller = Arc::clone(&state.controller);
    let result = run_blocking(move || {
        let output = controller.handle(intent)?;
        let view = controller.view()?;
        Ok(IntentResponse { output, view })
    })
    .await;
    match result {
        Ok(response) => Json(response).into_response(),
        Err(resp) => resp,
    }
}

async fn events_handler(State(state): State<Arc<ApiState>>, ws: WebSocketUpgrade) -> Response {
    let permit = match Arc::clone(&state.ws_limits).try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorPayload::new(
                    "too many connections",
                    "external",
                    "Close other recorder windows and retry.",
                ),
            );
        }
    };
    ws.on_upgrade(move |socket| stream_events(socket, state, permit))
        .into_response()
}

fn serialize_event(event: &SessionEvent<'_>) -> String {
    serde_json::to_string(event).unwrap_or_else(|err| {
        error!(error = %err, "Failed to serialize session event");
        "{\"event\":\"error\",\"message\":\"serialization failed\"}".to_string()
    })
}

async fn stream_events(mut socket: WebSocket, state: Arc<ApiState>, _permit: OwnedSemaphorePermit) {
    let mut shutdown_rx = state.shutdown_rx.clone();
    if *shutdown_rx.borrow() {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    let hello = SessionEvent::Hello {
        api_version: API_VERSION,
        revision: state.controller.revision(),
    };
    if socket
        .send(Message::Text(serialize_event(&hello)))
        .await
        .is_err()
    {
        return;
    }

    let mut sent_revision = None;
    let mut ticker = tokio::time::interval(REVISION_POLL);
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ticker.tick() => {
                let revision = state.controller.revision();
                if sent_revision == Some(revision) {
                    continue;
                }
                let controller = Arc::clone(&state.controller);
                let payload = match tokio::task::spawn_blocking(move || controller.view()).await {
                    Ok(Ok(view)) => {
                        sent_revision = Some(view.revision);
                        serialize_event(&SessionEvent::State { view: &view })
                    }
                    Ok(Err(err)) => {
                        sent_revision = Some(revision);
                        serialize_event(&SessionEvent::Error { message: &err.to_string() })
                    }
                    Err(err) => {
                        error!(error = %err, "Session view task failed");
                        break;
                    }
                };
                if socket.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
        }
    }
    debug!("Event stream closed");
}

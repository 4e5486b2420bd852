use std::io;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::time::Duration;

use tungstenite::Message;
use tungstenite::WebSocket;
use tungstenite::client::IntoClientRequest;
use url::Url;

use crate::usecases::ports::ServiceError;

pub(super) const SERVICE: &str = "push channel";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

pub(super) type PushSocket = WebSocket<TcpStream>;

pub(super) enum Frame {
    Text(String),
    Idle,
    Closed,
}

fn unavailable(reason: impl Into<String>) -> ServiceError {
    ServiceError::Unavailable {
        service: SERVICE,
        reason: reason.into(),
    }
}

fn ws_error(err: tungstenite::Error) -> ServiceError {
    match err {
        tungstenite::Error::Io(io_err) => unavailable(io_err.to_string()),
        other => ServiceError::Failed {
            service: SERVICE,
            reason: format!("websocket error: {other}"),
        },
    }
}

/// Opens a plain `ws://` connection. `poll` bounds each blocking read.
pub(super) fn connect_ws_socket(url: &Url, poll: Duration) -> Result<PushSocket, ServiceError> {
    if url.scheme() != "ws" {
        return Err(ServiceError::Failed {
            service: SERVICE,
            reason: format!(
                "unsupported websocket scheme '{}'; only ws:// is supported",
                url.scheme()
            ),
        });
    }

    let host = url
        .host_str()
        .ok_or_else(|| unavailable("websocket URL is missing a host"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| unavailable("websocket URL is missing a port"))?;
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|err| unavailable(err.to_string()))?
        .next()
        .ok_or_else(|| unavailable(format!("failed to resolve websocket host '{host}:{port}'")))?;

    let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
        .map_err(|err| unavailable(err.to_string()))?;
    stream
        .set_nodelay(true)
        .map_err(|err| unavailable(err.to_string()))?;

    let request = url
        .as_str()
        .into_client_request()
        .map_err(|err| ServiceError::Failed {
            service: SERVICE,
            reason: format!("invalid websocket URL: {err}"),
        })?;
    let (mut socket, _response) =
        tungstenite::client::client(request, stream).map_err(|err| match err {
            tungstenite::HandshakeError::Failure(ws_err) => ws_error(ws_err),
            tungstenite::HandshakeError::Interrupted(_) => {
                unavailable("websocket handshake interrupted")
            }
        })?;

    let stream = socket.get_mut();
    stream
        .set_read_timeout(Some(poll))
        .and_then(|_| stream.set_write_timeout(Some(WRITE_TIMEOUT)))
        .map_err(|err| unavailable(err.to_string()))?;
    Ok(socket)
}

/// Reads until a text frame arrives, the read times out, or the peer goes away.
pub(super) fn read_frame(socket: &mut PushSocket) -> Result<Frame, ServiceError> {
    loop {
        match socket.read() {
            Ok(Message::Text(text)) => return Ok(Frame::Text(text.to_string())),
            Ok(Message::Close(_)) => return Ok(Frame::Closed),
            Ok(Message::Ping(payload)) => {
                socket.send(Message::Pong(payload)).map_err(ws_error)?;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(err))
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                return Ok(Frame::Idle);
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                return Ok(Frame::Closed);
            }
            Err(err) => return Err(ws_error(err)),
        }
    }
}

//! Recorder configuration.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use tracing::warn;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_PUSH_URL: &str = "ws://localhost:8000/ws/realtime";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SCREENSHOT_INTERVAL_MS: u64 = 500;
const DEFAULT_HOVER_THROTTLE_MS: u64 = 100;
const DEFAULT_LAUNCH_SETTLE_MS: u64 = 3000;
const DEFAULT_API_LISTEN: &str = "127.0.0.1:7070";
const DEFAULT_API_MAX_CONNECTIONS: usize = 32;

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    backend_url: String,
    push_url: String,
    http_timeout: Duration,
    screenshot_interval: Duration,
    hover_throttle: Duration,
    launch_settle: Duration,
    api_listen: SocketAddr,
    api_max_connections: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl RecorderConfig {
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn push_url(&self) -> &str {
        &self.push_url
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    pub fn screenshot_interval(&self) -> Duration {
        self.screenshot_interval
    }

    pub fn hover_throttle(&self) -> Duration {
        self.hover_throttle
    }

    pub fn launch_settle(&self) -> Duration {
        self.launch_settle
    }

    pub fn api_listen(&self) -> SocketAddr {
        self.api_listen
    }

    pub fn api_max_connections(&self) -> usize {
        self.api_max_connections
    }

    pub fn from_env() -> Self {
        Self {
            backend_url: env_string("TAPFLOW_BACKEND_URL", DEFAULT_BACKEND_URL),
            push_url: env_string("TAPFLOW_PUSH_URL", DEFAULT_PUSH_URL),
            http_timeout: Duration::from_secs(parse_env_u64(
                "TAPFLOW_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
            screenshot_interval: Duration::from_millis(parse_env_u64(
                "TAPFLOW_SCREENSHOT_INTERVAL_MS",
                DEFAULT_SCREENSHOT_INTERVAL_MS,
            )),
            hover_throttle: Duration::from_millis(parse_env_u64(
                "TAPFLOW_HOVER_THROTTLE_MS",
                DEFAULT_HOVER_THROTTLE_MS,
            )),
            launch_settle: Duration::from_millis(parse_env_u64(
                "TAPFLOW_LAUNCH_SETTLE_MS",
                DEFAULT_LAUNCH_SETTLE_MS,
            )),
            api_listen: parse_env_addr("TAPFLOW_API_LISTEN", DEFAULT_API_LISTEN),
            api_max_connections: parse_env_usize(
                "TAPFLOW_API_MAX_CONNECTIONS",
                DEFAULT_API_MAX_CONNECTIONS,
            ),
        }
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn with_push_url(mut self, url: impl Into<String>) -> Self {
        self.push_url = url.into();
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_screenshot_interval(mut self, interval: Duration) -> Self {
        self.screenshot_interval = interval;
        self
    }

    pub fn with_api_listen(mut self, addr: SocketAddr) -> Self {
        self.api_listen = addr;
        self
    }

    pub fn with_api_max_connections(mut self, max: usize) -> Self {
        self.api_max_connections = max;
        self
    }
}

fn env_string(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default.to_string(),
    }
}

fn parse_env_u64(key: &str, default: u64) -> u64 {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return default,
    };
    if value.trim().is_empty() {
        return default;
    }
    match value.trim().parse::<u64>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(value = %value, key, "Invalid numeric config; using default");
            default
        }
    }
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return default,
    };
    if value.trim().is_empty() {
        return default;
    }
    match value.trim().parse::<usize>() {
        Ok(parsed) if parsed > 0 => parsed,
        _ => {
            warn!(value = %value, key, "Invalid numeric config; using default");
            default
        }
    }
}

fn parse_env_addr(key: &str, default: &str) -> SocketAddr {
    let fallback = SocketAddr::from(([127, 0, 0, 1], 7070));
    let default_addr = default.parse().unwrap_or(fallback);
    let value = env_string(key, default);
    match value.parse::<SocketAddr>() {
        Ok(addr) => addr,
        Err(_) => {
            warn!(value = %value, key, "Invalid listen address; using default");
            default_addr
        }
    }
}

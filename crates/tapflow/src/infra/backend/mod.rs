//! Blocking HTTP client for the automation backend.
//!
//! One [`BackendClient`] implements every request/response port. Requests are issued once;
//! failures surface to the caller without retries.

mod dto;

use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::Response;
use reqwest::blocking::multipart::Form;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::domain::ApkInfo;
use crate::domain::CodeLanguage;
use crate::domain::Device;
use crate::domain::DevicePoint;
use crate::domain::ElementDescriptor;
use crate::domain::FlowDraft;
use crate::domain::FlowRecord;
use crate::domain::PlaybackReport;
use crate::domain::RecordedAction;
use crate::domain::Screenshot;
use crate::usecases::ports::AppSession;
use crate::usecases::ports::CodeGenerator;
use crate::usecases::ports::DeviceCatalog;
use crate::usecases::ports::ElementInspector;
use crate::usecases::ports::FlowStore;
use crate::usecases::ports::GestureExecutor;
use crate::usecases::ports::LaunchRequest;
use crate::usecases::ports::PackageInstaller;
use crate::usecases::ports::PlaybackService;
use crate::usecases::ports::ServiceError;
use crate::usecases::ports::TouchMonitor;

use dto::*;

const DEVICES: &str = "device service";
const INSTALLER: &str = "package installer";
const SESSION: &str = "automation session";
const GESTURES: &str = "gesture executor";
const MONITOR: &str = "touch monitor";
const INSPECTOR: &str = "element inspector";
const FLOWS: &str = "flow store";
const PLAYBACK: &str = "playback service";
const CODEGEN: &str = "code generator";

const APK_FIELD: &str = "apk";
const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);
const PLAYBACK_TIMEOUT: Duration = Duration::from_secs(900);

#[derive(Error, Debug)]
pub enum BackendSetupError {
    #[error("invalid backend URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("backend URL '{0}' must use http or https")]
    UnsupportedScheme(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    base: Url,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendSetupError> {
        let mut base = Url::parse(base_url).map_err(|source| BackendSetupError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(BackendSetupError::UnsupportedScheme(base_url.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, service: &'static str, path: &str) -> Result<Url, ServiceError> {
        self.base.join(path).map_err(|err| ServiceError::Failed {
            service,
            reason: format!("invalid endpoint '{path}': {err}"),
        })
    }

    fn http_get(&self, service: &'static str, path: &str) -> Result<RequestBuilder, ServiceError> {
        Ok(self.http.get(self.endpoint(service, path)?))
    }

    fn http_post(&self, service: &'static str, path: &str) -> Result<RequestBuilder, ServiceError> {
        Ok(self.http.post(self.endpoint(service, path)?))
    }

    fn http_delete(
        &self,
        service: &'static str,
        path: &str,
    ) -> Result<RequestBuilder, ServiceError> {
        Ok(self.http.delete(self.endpoint(service, path)?))
    }
}

fn send(service: &'static str, request: RequestBuilder) -> Result<Response, ServiceError> {
    let response = request
        .send()
        .map_err(|err| transport_error(service, err))?;
    let status = response.status();
    debug!(service, status = status.as_u16(), url = %response.url(), "Backend responded");
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(ServiceError::Status {
        service,
        status: status.as_u16(),
        detail: error_detail(&body, status),
    })
}

fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
) -> Result<T, ServiceError> {
    send(service, request)?
        .json::<T>()
        .map_err(|err| ServiceError::Decode {
            service,
            reason: err.to_string(),
        })
}

fn send_unit(service: &'static str, request: RequestBuilder) -> Result<(), ServiceError> {
    send(service, request).map(|_| ())
}

fn transport_error(service: &'static str, err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout { service }
    } else if err.is_decode() {
        ServiceError::Decode {
            service,
            reason: err.to_string(),
        }
    } else {
        ServiceError::Unavailable {
            service,
            reason: err.to_string(),
        }
    }
}

fn error_detail(body: &str, status: StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return detail_text(&parsed.detail);
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        trimmed.to_string()
    }
}

fn apk_form(service: &'static str, apk: &Path) -> Result<Form, ServiceError> {
    Form::new()
        .file(APK_FIELD, apk)
        .map_err(|err| ServiceError::Failed {
            service,
            reason: format!("cannot read {}: {err}", apk.display()),
        })
}

impl DeviceCatalog for BackendClient {
    fn list_devices(&self) -> Result<Vec<Device>, ServiceError> {
        send_json(DEVICES, self.http_get(DEVICES, "api/devices/")?)
    }
}

impl PackageInstaller for BackendClient {
    fn analyze(&self, device_id: &str, apk: &Path) -> Result<ApkInfo, ServiceError> {
        let request = self
            .http_post(INSTALLER, &format!("api/check-apk/{device_id}"))?
            .multipart(apk_form(INSTALLER, apk)?);
        send_json(INSTALLER, request)
    }

    fn install(&self, device_id: &str, apk: &Path) -> Result<(), ServiceError> {
        let request = self
            .http_post(INSTALLER, &format!("api/devices/{device_id}/install-apk"))?
            .timeout(INSTALL_TIMEOUT)
            .multipart(apk_form(INSTALLER, apk)?);
        send_unit(INSTALLER, request)
    }
}

impl AppSession for BackendClient {
    fn start_session(&self, request: &LaunchRequest) -> Result<String, ServiceError> {
        let started: SessionStarted = send_json(
            SESSION,
            self.http_post(SESSION, "api/inspector/start-session")?
                .json(&StartSessionBody::from(request)),
        )?;
        started.id().ok_or_else(|| ServiceError::Decode {
            service: SESSION,
            reason: "response carried no session id".to_string(),
        })
    }

    fn screenshot(&self) -> Result<Screenshot, ServiceError> {
        let body: ScreenshotBody =
            send_json(SESSION, self.http_get(SESSION, "api/inspector/screenshot")?)?;
        match body.screenshot {
            Some(encoded) if !encoded.is_empty() => Ok(Screenshot::from_base64(&encoded)),
            _ => Err(ServiceError::Decode {
                service: SESSION,
                reason: "response carried no screenshot".to_string(),
            }),
        }
    }
}

impl GestureExecutor for BackendClient {
    fn tap(&self, point: DevicePoint) -> Result<(), ServiceError> {
        send_unit(
            GESTURES,
            self.http_post(GESTURES, "api/inspector/tap-coordinate")?
                .json(&TapBody {
                    x: point.x,
                    y: point.y,
                }),
        )
    }

    fn swipe(
        &self,
        start: DevicePoint,
        end: DevicePoint,
        duration_ms: u64,
    ) -> Result<(), ServiceError> {
        send_unit(
            GESTURES,
            self.http_post(GESTURES, "api/inspector/swipe")?.json(&SwipeBody {
                start_x: start.x,
                start_y: start.y,
                end_x: end.x,
                end_y: end.y,
                duration: duration_ms,
            }),
        )
    }
}

impl TouchMonitor for BackendClient {
    fn start_monitoring(&self, device_id: &str) -> Result<(), ServiceError> {
        send_unit(
            MONITOR,
            self.http_post(MONITOR, "api/inspector/start-mobile-monitoring")?
                .json(&MonitoringBody { device_id }),
        )
    }

    fn stop_monitoring(&self, device_id: &str) -> Result<(), ServiceError> {
        send_unit(
            MONITOR,
            self.http_post(MONITOR, "api/inspector/stop-mobile-monitoring")?
                .json(&MonitoringBody { device_id }),
        )
    }
}

impl ElementInspector for BackendClient {
    fn element_at(&self, point: DevicePoint) -> Result<Option<ElementDescriptor>, ServiceError> {
        let lookup: ElementLookup = send_json(
            INSPECTOR,
            self.http_get(INSPECTOR, "api/inspector/element-at-position")?
                .query(&[("x", point.x), ("y", point.y)]),
        )?;
        Ok(lookup.into_element())
    }
}

impl FlowStore for BackendClient {
    fn create(&self, draft: &FlowDraft) -> Result<i64, ServiceError> {
        let request = self.http_post(FLOWS, "api/flows/")?.json(draft);
        let created: CreatedFlow = send_json(FLOWS, request)?;
        Ok(created.id)
    }

    fn list(&self) -> Result<Vec<FlowRecord>, ServiceError> {
        send_json(FLOWS, self.http_get(FLOWS, "api/flows/")?)
    }

    fn get(&self, flow_id: i64) -> Result<FlowRecord, ServiceError> {
        send_json(FLOWS, self.http_get(FLOWS, &format!("api/flows/{flow_id}"))?)
    }

    fn delete(&self, flow_id: i64) -> Result<(), ServiceError> {
        send_unit(
            FLOWS,
            self.http_delete(FLOWS, &format!("api/flows/{flow_id}"))?,
        )
    }
}

impl PlaybackService for BackendClient {
    fn run(&self, flow_id: i64, device_id: &str) -> Result<PlaybackReport, ServiceError> {
        send_json(
            PLAYBACK,
            self.http_post(PLAYBACK, "api/playback/start")?
                .timeout(PLAYBACK_TIMEOUT)
                .json(&PlaybackBody { flow_id, device_id }),
        )
    }
}

impl CodeGenerator for BackendClient {
    fn generate(
        &self,
        actions: &[RecordedAction],
        language: CodeLanguage,
    ) -> Result<String, ServiceError> {
        let generated: GeneratedSource = send_json(
            CODEGEN,
            self.http_post(CODEGEN, "api/codegen/generate")?
                .json(&CodegenBody { actions, language }),
        )?;
        if !generated.success {
            return Err(ServiceError::Failed {
                service: CODEGEN,
                reason: "generator reported failure".to_string(),
            });
        }
        Ok(generated.code)
    }
}

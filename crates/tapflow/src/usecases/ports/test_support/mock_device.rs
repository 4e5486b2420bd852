//! In-memory device implementing every device-facing port.

use std::path::Path;
use std::sync::Condvar;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use super::unavailable;
use crate::domain::ApkInfo;
use crate::domain::Device;
use crate::domain::DevicePoint;
use crate::domain::ElementDescriptor;
use crate::domain::Screenshot;
use crate::usecases::dispatch::ExecutionRequest;
use crate::usecases::ports::AppSession;
use crate::usecases::ports::DeviceCatalog;
use crate::usecases::ports::ElementInspector;
use crate::usecases::ports::GestureExecutor;
use crate::usecases::ports::LaunchRequest;
use crate::usecases::ports::PackageInstaller;
use crate::usecases::ports::ServiceError;
use crate::usecases::ports::TouchMonitor;

#[derive(Default)]
struct Calls {
    gestures: Vec<ExecutionRequest>,
    element_lookups: usize,
    launches: Vec<LaunchRequest>,
    installs: Vec<String>,
    analyses: usize,
    monitoring_started: Vec<String>,
    monitoring_stopped: Vec<String>,
    screenshots: usize,
}

pub struct MockDevice {
    devices: Vec<Device>,
    apk: ApkInfo,
    screenshot: Mutex<Option<Screenshot>>,
    element: Mutex<Option<ElementDescriptor>>,
    list_error: bool,
    analyze_error: bool,
    install_error: bool,
    session_error: bool,
    gesture_error: bool,
    monitor_error: bool,
    element_error: bool,
    screenshot_delay: Duration,
    calls: Mutex<Calls>,
    gesture_signal: Condvar,
}

impl MockDevice {
    pub fn new() -> Self {
        MockDeviceBuilder::default().build()
    }

    pub fn builder() -> MockDeviceBuilder {
        MockDeviceBuilder::default()
    }

    pub fn gestures(&self) -> Vec<ExecutionRequest> {
        self.calls.lock().unwrap().gestures.clone()
    }

    /// Blocks until at least `count` gestures were received or `timeout` passes.
    pub fn wait_for_gestures(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut calls = self.calls.lock().unwrap();
        while calls.gestures.len() < count {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            calls = self.gesture_signal.wait_timeout(calls, remaining).unwrap().0;
        }
        true
    }

    pub fn element_lookups(&self) -> usize {
        self.calls.lock().unwrap().element_lookups
    }

    pub fn set_element(&self, element: Option<ElementDescriptor>) {
        *self.element.lock().unwrap() = element;
    }

    pub fn set_screenshot(&self, screenshot: Option<Screenshot>) {
        *self.screenshot.lock().unwrap() = screenshot;
    }

    pub fn launches(&self) -> Vec<LaunchRequest> {
        self.calls.lock().unwrap().launches.clone()
    }

    pub fn installs(&self) -> Vec<String> {
        self.calls.lock().unwrap().installs.clone()
    }

    pub fn analyses(&self) -> usize {
        self.calls.lock().unwrap().analyses
    }

    pub fn screenshots_taken(&self) -> usize {
        self.calls.lock().unwrap().screenshots
    }

    pub fn monitoring_started(&self) -> Vec<String> {
        self.calls.lock().unwrap().monitoring_started.clone()
    }

    pub fn monitoring_stopped(&self) -> Vec<String> {
        self.calls.lock().unwrap().monitoring_stopped.clone()
    }

    fn record_gesture(&self, request: ExecutionRequest) {
        self.calls.lock().unwrap().gestures.push(request);
        self.gesture_signal.notify_all();
    }
}

impl AppSession for MockDevice {
    fn start_session(&self, request: &LaunchRequest) -> Result<String, ServiceError> {
        self.calls.lock().unwrap().launches.push(request.clone());
        if self.session_error {
            return Err(unavailable("automation"));
        }
        Ok("session-1".to_string())
    }

    fn screenshot(&self) -> Result<Screenshot, ServiceError> {
        self.calls.lock().unwrap().screenshots += 1;
        thread::sleep(self.screenshot_delay);
        self.screenshot
            .lock()
            .unwrap()
            .clone()
            .ok_or(ServiceError::Timeout {
                service: "screenshot",
            })
    }
}

impl GestureExecutor for MockDevice {
    fn tap(&self, point: DevicePoint) -> Result<(), ServiceError> {
        self.record_gesture(ExecutionRequest::Tap(point));
        if self.gesture_error {
            return Err(unavailable("automation"));
        }
        Ok(())
    }

    fn swipe(
        &self,
        start: DevicePoint,
        end: DevicePoint,
        duration_ms: u64,
    ) -> Result<(), ServiceError> {
        self.record_gesture(ExecutionRequest::Swipe {
            start,
            end,
            duration_ms,
        });
        if self.gesture_error {
            return Err(unavailable("automation"));
        }
        Ok(())
    }
}

impl TouchMonitor for MockDevice {
    fn start_monitoring(&self, device_id: &str) -> Result<(), ServiceError> {
        if self.monitor_error {
            return Err(unavailable("touch monitor"));
        }
        self.calls
            .lock()
            .unwrap()
            .monitoring_started
            .push(device_id.to_string());
        Ok(())
    }

    fn stop_monitoring(&self, device_id: &str) -> Result<(), ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .monitoring_stopped
            .push(device_id.to_string());
        Ok(())
    }
}

impl ElementInspector for MockDevice {
    fn element_at(&self, _point: DevicePoint) -> Result<Option<ElementDescriptor>, ServiceError> {
        self.calls.lock().unwrap().element_lookups += 1;
        if self.element_error {
            return Err(ServiceError::Timeout {
                service: "inspector",
            });
        }
        Ok(self.element.lock().unwrap().clone())
    }
}

impl DeviceCatalog for MockDevice {
    fn list_devices(&self) -> Result<Vec<Device>, ServiceError> {
        if self.list_error {
            return Err(unavailable("device catalog"));
        }
        Ok(self.devices.clone())
    }
}

impl PackageInstaller for MockDevice {
    fn analyze(&self, _device_id: &str, _apk: &Path) -> Result<ApkInfo, ServiceError> {
        self.calls.lock().unwrap().analyses += 1;
        if self.analyze_error {
            return Err(ServiceError::Status {
                service: "package installer",
                status: 400,
                detail: "Only APK files are allowed".to_string(),
            });
        }
        Ok(self.apk.clone())
    }

    fn install(&self, device_id: &str, _apk: &Path) -> Result<(), ServiceError> {
        if self.install_error {
            return Err(ServiceError::Status {
                service: "package installer",
                status: 500,
                detail: "INSTALL_FAILED_INSUFFICIENT_STORAGE".to_string(),
            });
        }
        self.calls.lock().unwrap().installs.push(device_id.to_string());
        Ok(())
    }
}

pub struct MockDeviceBuilder {
    devices: Vec<Device>,
    apk: ApkInfo,
    screenshot: Option<Screenshot>,
    element: Option<ElementDescriptor>,
    list_error: bool,
    analyze_error: bool,
    install_error: bool,
    session_error: bool,
    gesture_error: bool,
    monitor_error: bool,
    element_error: bool,
    screenshot_delay: Duration,
}

impl Default for MockDeviceBuilder {
    fn default() -> Self {
        Self {
            devices: vec![Device {
                device_id: "emulator-5554".to_string(),
                name: Some("Pixel 7".to_string()),
                platform: Some("android".to_string()),
                platform_version: Some("14".to_string()),
                model: None,
                manufacturer: None,
                is_connected: true,
            }],
            apk: ApkInfo {
                package_name: "com.example.shop".to_string(),
                app_name: Some("Shop".to_string()),
                version: Some("2.1.0".to_string()),
                launch_activity: None,
                already_installed: false,
            },
            screenshot: None,
            element: None,
            list_error: false,
            analyze_error: false,
            install_error: false,
            session_error: false,
            gesture_error: false,
            monitor_error: false,
            element_error: false,
            screenshot_delay: Duration::ZERO,
        }
    }
}

impl MockDeviceBuilder {
    pub fn with_devices(mut self, devices: Vec<Device>) -> Self {
        self.devices = devices;
        self
    }

    pub fn with_apk(mut self, apk: ApkInfo) -> Self {
        self.apk = apk;
        self
    }

    pub fn with_screenshot(mut self, screenshot: Screenshot) -> Self {
        self.screenshot = Some(screenshot);
        self
    }

    pub fn with_element(mut self, element: Option<ElementDescriptor>) -> Self {
        self.element = element;
        self
    }

    pub fn with_list_failure(mut self) -> Self {
        self.list_error = true;
        self
    }

    pub fn with_analyze_failure(mut self) -> Self {
        self.analyze_error = true;
        self
    }

    pub fn with_install_failure(mut self) -> Self {
        self.install_error = true;
        self
    }

    pub fn with_session_failure(mut self) -> Self {
        self.session_error = true;
        self
    }

    pub fn with_gesture_failure(mut self) -> Self {
        self.gesture_error = true;
        self
    }

    pub fn with_monitor_failure(mut self) -> Self {
        self.monitor_error = true;
        self
    }

    pub fn with_element_failure(mut self) -> Self {
        self.element_error = true;
        self
    }

    /// Each screenshot call blocks for `delay` before answering.
    pub fn with_screenshot_delay(mut self, delay: Duration) -> Self {
        self.screenshot_delay = delay;
        self
    }

    pub fn build(self) -> MockDevice {
        MockDevice {
            devices: self.devices,
            apk: self.apk,
            screenshot: Mutex::new(self.screenshot),
            element: Mutex::new(self.element),
            list_error: self.list_error,
            analyze_error: self.analyze_error,
            install_error: self.install_error,
            session_error: self.session_error,
            gesture_error: self.gesture_error,
            monitor_error: self.monitor_error,
            element_error: self.element_error,
            screenshot_delay: self.screenshot_delay,
            calls: Mutex::new(Calls::default()),
            gesture_signal: Condvar::new(),
        }
    }
}

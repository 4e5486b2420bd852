//! Recording Session Controller.
//!
//! Owns the wizard stage and the session data, and turns UI intents into calls on the capture
//! engine, the recorder and the external services. A rejected intent leaves the session as it
//! was. Stage intents are serialized; pointer intents only need the stage to be `record`.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::common::mutex_lock_or_recover;
use crate::domain::ApkInfo;
use crate::domain::CaptureMode;
use crate::domain::CodeLanguage;
use crate::domain::DEFAULT_PLATFORM;
use crate::domain::Device;
use crate::domain::DevicePoint;
use crate::domain::ElementDescriptor;
use crate::domain::FlowContext;
use crate::domain::FlowDraft;
use crate::domain::FlowValidationError;
use crate::domain::PendingAction;
use crate::domain::PlaybackReport;
use crate::domain::RecordedAction;
use crate::domain::Screenshot;
use crate::domain::StageTransitionError;
use crate::domain::WaitSeconds;
use crate::domain::WizardStage;
use crate::usecases::capture::CaptureEngine;
use crate::usecases::capture::DEFAULT_HOVER_THROTTLE;
use crate::usecases::capture::PointerSample;
use crate::usecases::dispatch::ExecutionDispatcher;
use crate::usecases::ports::AppSession;
use crate::usecases::ports::Clock;
use crate::usecases::ports::CodeGenerator;
use crate::usecases::ports::ControllerError;
use crate::usecases::ports::DeviceCatalog;
use crate::usecases::ports::ElementInspector;
use crate::usecases::ports::FlowStore;
use crate::usecases::ports::GestureExecutor;
use crate::usecases::ports::LaunchRequest;
use crate::usecases::ports::PackageInstaller;
use crate::usecases::ports::PlaybackService;
use crate::usecases::ports::PushChannel;
use crate::usecases::ports::PushSubscription;
use crate::usecases::ports::Sleeper;
use crate::usecases::ports::TouchMonitor;
use crate::usecases::recorder::ActionRecorder;
use crate::usecases::recorder::Revision;
use crate::usecases::remote::RemoteEventListener;
use crate::usecases::remote::status_handler;
use crate::usecases::replay::ReplayInput;
use crate::usecases::replay::ReplayUseCase;
use crate::usecases::replay::ReplayUseCaseImpl;
use crate::usecases::replay::StopToken;
use crate::usecases::screenshot_feed::DEFAULT_REFRESH_INTERVAL;
use crate::usecases::screenshot_feed::FeedHandle;
use crate::usecases::screenshot_feed::ScreenshotFeed;
use crate::usecases::status::StatusBoard;
use crate::usecases::status::StatusView;

const DEFAULT_LAUNCH_SETTLE: Duration = Duration::from_millis(3000);

/// External collaborators the controller talks to.
#[derive(Clone)]
pub struct SessionServices {
    pub catalog: Arc<dyn DeviceCatalog>,
    pub installer: Arc<dyn PackageInstaller>,
    pub session: Arc<dyn AppSession>,
    pub executor: Arc<dyn GestureExecutor>,
    pub monitor: Arc<dyn TouchMonitor>,
    pub inspector: Arc<dyn ElementInspector>,
    pub push: Arc<dyn PushChannel>,
    pub flows: Arc<dyn FlowStore>,
    pub playback: Arc<dyn PlaybackService>,
    pub codegen: Arc<dyn CodeGenerator>,
    pub clock: Arc<dyn Clock>,
    pub sleeper: Arc<dyn Sleeper>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub screenshot_interval: Duration,
    pub hover_throttle: Duration,
    pub launch_settle: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            screenshot_interval: DEFAULT_REFRESH_INTERVAL,
            hover_throttle: DEFAULT_HOVER_THROTTLE,
            launch_settle: DEFAULT_LAUNCH_SETTLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionIntent {
    RefreshDevices,
    SelectDevice { device_id: String },
    Advance,
    AnalyzeApk { path: PathBuf },
    Install,
    Launch,
    SetMode(CaptureMode),
    ToggleRecording,
    PointerDown(PointerSample),
    PointerUp(PointerSample),
    Hover(PointerSample),
    Leave,
    InspectorClick(PointerSample),
    InsertWait(WaitSeconds),
    FinishRecording,
    Save { name: String },
    GenerateCode(CodeLanguage),
    RunPlayback,
    ReplayLocally,
    Reset,
}

impl SessionIntent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RefreshDevices => "refresh_devices",
            Self::SelectDevice { .. } => "select_device",
            Self::Advance => "advance",
            Self::AnalyzeApk { .. } => "analyze_apk",
            Self::Install => "install",
            Self::Launch => "launch",
            Self::SetMode(_) => "set_mode",
            Self::ToggleRecording => "toggle_recording",
            Self::PointerDown(_) => "pointer_down",
            Self::PointerUp(_) => "pointer_up",
            Self::Hover(_) => "hover",
            Self::Leave => "leave",
            Self::InspectorClick(_) => "inspector_click",
            Self::InsertWait(_) => "insert_wait",
            Self::FinishRecording => "finish_recording",
            Self::Save { .. } => "save",
            Self::GenerateCode(_) => "generate_code",
            Self::RunPlayback => "run_playback",
            Self::ReplayLocally => "replay_locally",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedCode {
    pub language: CodeLanguage,
    pub source: String,
}

/// Intent-specific result returned next to the updated view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IntentOutput {
    None,
    Devices(Vec<Device>),
    DragStarted(DevicePoint),
    Action(Option<RecordedAction>),
    Element(Option<ElementDescriptor>),
    FlowSaved(i64),
    Code(GeneratedCode),
    Report(PlaybackReport),
}

/// Read-only projection of the session for UI clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub revision: u64,
    pub stage: WizardStage,
    pub status: StatusView,
    pub mode: CaptureMode,
    pub recording: bool,
    pub frozen: bool,
    pub device: Option<Device>,
    pub apk: Option<ApkInfo>,
    pub session_id: Option<String>,
    pub flow_name: Option<String>,
    pub saved_flow_id: Option<i64>,
    pub playback: Option<PlaybackReport>,
    pub generated_code: Option<GeneratedCode>,
    pub hovered_element: Option<ElementDescriptor>,
    pub action_count: usize,
}

#[derive(Default)]
struct SessionState {
    stage: WizardStage,
    devices: Vec<Device>,
    device: Option<Device>,
    apk: Option<ApkInfo>,
    apk_path: Option<PathBuf>,
    session_id: Option<String>,
    mode: CaptureMode,
    recording: bool,
    flow_name: Option<String>,
    saved_flow_id: Option<i64>,
    playback: Option<PlaybackReport>,
    generated_code: Option<GeneratedCode>,
    feed: Option<FeedHandle>,
    status_subscription: Option<PushSubscription>,
    capture_subscription: Option<PushSubscription>,
}

impl SessionState {
    fn require(
        &self,
        intent: &'static str,
        allowed: &[WizardStage],
    ) -> Result<(), ControllerError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(ControllerError::InvalidStage {
                intent,
                stage: self.stage,
            })
        }
    }

    fn device_id(&self) -> Result<String, ControllerError> {
        self.device
            .as_ref()
            .map(|d| d.device_id.clone())
            .ok_or_else(|| ControllerError::validation("select a device first"))
    }

    fn advance(&mut self, to: WizardStage) -> Result<(), ControllerError> {
        let from = self.stage;
        self.stage = from.advance_to(to)?;
        info!(from = %from, to = %to, "Stage advanced");
        Ok(())
    }
}

pub struct RecordingSessionController {
    services: SessionServices,
    settings: ControllerSettings,
    revision: Revision,
    recorder: ActionRecorder,
    capture: CaptureEngine,
    feed: ScreenshotFeed,
    status: StatusBoard,
    replay: ReplayUseCaseImpl,
    replay_stop: StopToken,
    busy: Mutex<()>,
    state: Mutex<SessionState>,
}

impl RecordingSessionController {
    pub fn new(
        services: SessionServices,
        settings: ControllerSettings,
    ) -> std::io::Result<Self> {
        let revision = Revision::default();
        let recorder = ActionRecorder::spawn(revision.clone())?;
        let dispatcher = ExecutionDispatcher::spawn(Arc::clone(&services.executor))?;
        let capture = CaptureEngine::new(
            recorder.clone(),
            dispatcher,
            Arc::clone(&services.inspector),
            Arc::clone(&services.clock),
            settings.hover_throttle,
        );
        let status = StatusBoard::new(revision.clone());
        let feed = ScreenshotFeed::new(
            Arc::clone(&services.session),
            recorder.clone(),
            status.clone(),
        );
        let replay = ReplayUseCaseImpl::new(
            Arc::clone(&services.executor),
            Arc::clone(&services.sleeper),
            Arc::clone(&services.clock),
        );
        Ok(Self {
            status,
            services,
            settings,
            revision,
            recorder,
            capture,
            feed,
            replay,
            replay_stop: StopToken::default(),
            busy: Mutex::new(()),
            state: Mutex::new(SessionState::default()),
        })
    }

    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    pub fn stage(&self) -> WizardStage {
        mutex_lock_or_recover(&self.state).stage
    }

    pub fn actions(&self) -> Result<Vec<RecordedAction>, ControllerError> {
        Ok(self.recorder.snapshot()?.actions)
    }

    pub fn screenshot(&self) -> Option<Screenshot> {
        self.feed.latest()
    }

    pub fn view(&self) -> Result<SessionView, ControllerError> {
        let snapshot = self.recorder.snapshot()?;
        let state = mutex_lock_or_recover(&self.state);
        Ok(SessionView {
            revision: self.revision.get(),
            stage: state.stage,
            status: self.status.view(),
            mode: state.mode,
            recording: snapshot.recording,
            frozen: snapshot.frozen,
            device: state.device.clone(),
            apk: state.apk.clone(),
            session_id: state.session_id.clone(),
            flow_name: state.flow_name.clone(),
            saved_flow_id: state.saved_flow_id,
            playback: state.playback.clone(),
            generated_code: state.generated_code.clone(),
            hovered_element: self.capture.cached_element(),
            action_count: snapshot.actions.len(),
        })
    }

    pub fn handle(&self, intent: SessionIntent) -> Result<IntentOutput, ControllerError> {
        debug!(intent = intent.name(), "Handling intent");
        match intent {
            SessionIntent::RefreshDevices => self.refresh_devices().map(IntentOutput::Devices),
            SessionIntent::SelectDevice { device_id } => {
                self.select_device(&device_id).map(|()| IntentOutput::None)
            }
            SessionIntent::Advance => self.advance().map(|()| IntentOutput::None),
            SessionIntent::AnalyzeApk { path } => {
                self.analyze_apk(&path).map(|()| IntentOutput::None)
            }
            SessionIntent::Install => self.install().map(|()| IntentOutput::None),
            SessionIntent::Launch => self.launch().map(|()| IntentOutput::None),
            SessionIntent::SetMode(mode) => self.set_mode(mode).map(|()| IntentOutput::None),
            SessionIntent::ToggleRecording => {
                self.toggle_recording().map(|()| IntentOutput::None)
            }
            SessionIntent::PointerDown(sample) => {
                self.pointer_down(sample).map(IntentOutput::DragStarted)
            }
            SessionIntent::PointerUp(sample) => self.pointer_up(sample).map(IntentOutput::Action),
            SessionIntent::Hover(sample) => self.hover(sample).map(IntentOutput::Element),
            SessionIntent::Leave => self.leave().map(|()| IntentOutput::None),
            SessionIntent::InspectorClick(sample) => {
                self.inspector_click(sample).map(IntentOutput::Action)
            }
            SessionIntent::InsertWait(seconds) => self
                .insert_wait(seconds)
                .map(|action| IntentOutput::Action(Some(action))),
            SessionIntent::FinishRecording => {
                self.finish_recording().map(|()| IntentOutput::None)
            }
            SessionIntent::Save { name } => self.save(&name).map(IntentOutput::FlowSaved),
            SessionIntent::GenerateCode(language) => {
                self.generate_code(language).map(IntentOutput::Code)
            }
            SessionIntent::RunPlayback => self.run_playback().map(IntentOutput::Report),
            SessionIntent::ReplayLocally => self.replay_locally().map(IntentOutput::Report),
            SessionIntent::Reset => self.reset().map(|()| IntentOutput::None),
        }
    }

    pub fn refresh_devices(&self) -> Result<Vec<Device>, ControllerError> {
        let _busy = mutex_lock_or_recover(&self.busy);
        let mut devices = self.services.catalog.list_devices().inspect_err(|err| {
            warn!(error = %err, "Device listing failed");
        })?;
        devices.retain(|d| d.is_connected);
        mutex_lock_or_recover(&self.state).devices = devices.clone();
        self.status
            .set_message(format!("Found {} device(s)", devices.len()));
        Ok(devices)
    }

    #[tracing::instrument(skip(self))]
    pub fn select_device(&self, device_id: &str) -> Result<(), ControllerError> {
        let _busy = mutex_lock_or_recover(&self.busy);
        let mut state = mutex_lock_or_recover(&self.state);
        state.require("select_device", &[WizardStage::Device])?;
        let device_id = device_id.trim();
        if device_id.is_empty() {
            return Err(ControllerError::validation("device id must not be empty"));
        }
        let device = match state.devices.iter().find(|d| d.device_id == device_id) {
            Some(device) => device.clone(),
            None if state.devices.is_empty() => Device {
                device_id: device_id.to_string(),
                name: None,
                platform: None,
                platform_version: None,
                model: None,
                manufacturer: None,
                is_connected: true,
            },
            None => {
                return Err(ControllerError::validation(format!(
                    "unknown device '{device_id}'"
                )));
            }
        };

        let handler = status_handler(device.device_id.clone(), self.status.clone());
        state.status_subscription = match self.services.push.subscribe(handler) {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                warn!(error = %err, "Push channel unavailable; device status will not update");
                None
            }
        };
        self.status
            .set_message(format!("Selected {}", device.display_name()));
        state.device = Some(device);
        self.revision.bump();
        Ok(())
    }

    /// Moves forward using whatever the current stage needs no extra input for.
    pub fn advance(&self) -> Result<(), ControllerError> {
        match self.stage() {
            WizardStage::Device => {
                let _busy = mutex_lock_or_recover(&self.busy);
                let mut state = mutex_lock_or_recover(&self.state);
                state.require("advance", &[WizardStage::Device])?;
                state.device_id()?;
                state.advance(WizardStage::Apk)?;
                self.revision.bump();
                Ok(())
            }
            WizardStage::Apk => Err(ControllerError::validation("choose an APK file to analyze")),
            WizardStage::Install => self.install(),
            WizardStage::Launch => self.launch(),
            WizardStage::Record => self.finish_recording(),
            WizardStage::Save => Err(ControllerError::validation("enter a flow name to save")),
            WizardStage::Playback => {
                Err(StageTransitionError::Terminal(WizardStage::Playback).into())
            }
        }
    }

    #[tracing::instrument(skip(self, path), fields(path = %path.display()))]
    pub fn analyze_apk(&self, path: &Path) -> Result<(), ControllerError> {
        let _busy = mutex_lock_or_recover(&self.busy);
        let device_id = {
            let state = mutex_lock_or_recover(&self.state);
            state.require("analyze_apk", &[WizardStage::Apk])?;
            state.device_id()?
        };
        let is_apk = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("apk"));
        if !is_apk {
            return Err(ControllerError::validation("only .apk files can be analyzed"));
        }

        let info = self
            .services
            .installer
            .analyze(&device_id, path)
            .inspect_err(|err| warn!(error = %err, "APK analysis failed"))?;

        let mut state = mutex_lock_or_recover(&self.state);
        state.advance(WizardStage::Install)?;
        let name = info.app_name.as_deref().unwrap_or(&info.package_name);
        self.status.set_message(if info.already_installed {
            format!("{name} is already installed")
        } else {
            format!("Analyzed {name}")
        });
        state.apk = Some(info);
        state.apk_path = Some(path.to_path_buf());
        self.revision.bump();
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn install(&self) -> Result<(), ControllerError> {
        let _busy = mutex_lock_or_recover(&self.busy);
        let (device_id, apk, path) = {
            let state = mutex_lock_or_recover(&self.state);
            state.require("install", &[WizardStage::Install])?;
            let apk = state
                .apk
                .clone()
                .ok_or_else(|| ControllerError::validation("analyze an APK first"))?;
            (state.device_id()?, apk, state.apk_path.clone())
        };

        if apk.already_installed {
            info!(package = %apk.package_name, "Skipping install");
        } else {
            let path =
                path.ok_or_else(|| ControllerError::validation("analyze an APK first"))?;
            self.services
                .installer
                .install(&device_id, &path)
                .inspect_err(|err| warn!(error = %err, "Install failed"))?;
            self.status
                .set_message(format!("Installed {}", apk.package_name));
        }

        mutex_lock_or_recover(&self.state).advance(WizardStage::Launch)?;
        self.revision.bump();
        Ok(())
    }

    /// Starts the app session and the screen mirror.
    ///
    /// A failed first screenshot still enters `record`, flagged as degraded.
    #[tracing::instrument(skip(self))]
    pub fn launch(&self) -> Result<(), ControllerError> {
        let _busy = mutex_lock_or_recover(&self.busy);
        let request = {
            let state = mutex_lock_or_recover(&self.state);
            state.require("launch", &[WizardStage::Launch])?;
            let device = state
                .device
                .as_ref()
                .ok_or_else(|| ControllerError::validation("select a device first"))?;
            let apk = state
                .apk
                .as_ref()
                .ok_or_else(|| ControllerError::validation("analyze an APK first"))?;
            LaunchRequest {
                device_id: device.device_id.clone(),
                platform: device
                    .platform
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
                app_package: apk.package_name.clone(),
                app_activity: apk.activity_or_default().to_string(),
            }
        };

        let session_id = self
            .services
            .session
            .start_session(&request)
            .inspect_err(|err| warn!(error = %err, "App launch failed"))?;

        self.services.sleeper.sleep(self.settings.launch_settle);
        let degraded = match self.feed.refresh() {
            Ok(_) => false,
            Err(err) => {
                warn!(error = %err, "First screenshot failed; continuing without a mirror");
                true
            }
        };
        self.status.set_degraded(degraded);
        self.status.set_message(if degraded {
            "App launched; screen mirror unavailable"
        } else {
            "App launched"
        });
        let feed = self
            .feed
            .start(self.settings.screenshot_interval)
            .inspect_err(|err| warn!(error = %err, "Screenshot refresh thread failed to start"))
            .ok();

        let mut state = mutex_lock_or_recover(&self.state);
        state.advance(WizardStage::Record)?;
        state.session_id = Some(session_id);
        state.feed = feed;
        self.revision.bump();
        Ok(())
    }

    pub fn set_mode(&self, mode: CaptureMode) -> Result<(), ControllerError> {
        let mut state = mutex_lock_or_recover(&self.state);
        state.require("set_mode", &[WizardStage::Record])?;
        if state.mode != mode {
            self.capture.reset();
            state.mode = mode;
            self.revision.bump();
        }
        Ok(())
    }

    /// Opens or closes a recording segment.
    ///
    /// Opening starts remote monitoring and subscribes to device touches first, so a failure
    /// leaves recording off. Closing is a barrier: remote actions still queued are dropped.
    /// A closed segment with actions is frozen and the session moves to `save`; an empty one
    /// stays in `record` and can be reopened.
    #[tracing::instrument(skip(self))]
    pub fn toggle_recording(&self) -> Result<(), ControllerError> {
        let _busy = mutex_lock_or_recover(&self.busy);
        let mut state = mutex_lock_or_recover(&self.state);
        state.require("toggle_recording", &[WizardStage::Record])?;
        let device_id = state.device_id()?;

        if state.recording {
            if self.stop_recording(&mut state, &device_id)? == 0 {
                return Ok(());
            }
            let feed = self.enter_save(&mut state)?;
            drop(state);
            drop(feed);
            return Ok(());
        }

        self.services
            .monitor
            .start_monitoring(&device_id)
            .inspect_err(|err| warn!(error = %err, "Could not start touch monitoring"))?;
        let listener = RemoteEventListener::new(
            device_id.clone(),
            self.recorder.clone(),
            Arc::clone(&self.services.clock),
        );
        let subscription = match self.services.push.subscribe(listener.into_handler()) {
            Ok(subscription) => subscription,
            Err(err) => {
                warn!(error = %err, "Could not subscribe to device touches");
                self.stop_monitoring_quietly(&device_id);
                return Err(err.into());
            }
        };
        if let Err(err) = self.recorder.open() {
            drop(subscription);
            self.stop_monitoring_quietly(&device_id);
            return Err(err);
        }

        state.capture_subscription = Some(subscription);
        state.recording = true;
        self.status.set_message("Recording");
        info!(device_id, "Recording started");
        Ok(())
    }

    fn stop_recording(
        &self,
        state: &mut SessionState,
        device_id: &str,
    ) -> Result<usize, ControllerError> {
        let len = self.recorder.close()?;
        state.capture_subscription = None;
        state.recording = false;
        self.capture.cancel_drag();
        self.stop_monitoring_quietly(device_id);
        self.status
            .set_message(format!("Recording stopped ({len} actions)"));
        info!(device_id, actions = len, "Recording stopped");
        Ok(len)
    }

    fn stop_monitoring_quietly(&self, device_id: &str) {
        if let Err(err) = self.services.monitor.stop_monitoring(device_id) {
            warn!(device_id, error = %err, "Could not stop touch monitoring");
        }
    }

    fn capture_mode(&self, intent: &'static str) -> Result<CaptureMode, ControllerError> {
        let state = mutex_lock_or_recover(&self.state);
        state.require(intent, &[WizardStage::Record])?;
        Ok(state.mode)
    }

    pub fn pointer_down(&self, sample: PointerSample) -> Result<DevicePoint, ControllerError> {
        let mode = self.capture_mode("pointer_down")?;
        if !mode.uses_drag_pipeline() {
            return Err(ControllerError::validation(
                "drag capture is off in inspector mode",
            ));
        }
        self.capture.pointer_down(sample, self.feed.native_size())
    }

    pub fn pointer_up(
        &self,
        sample: PointerSample,
    ) -> Result<Option<RecordedAction>, ControllerError> {
        let mode = self.capture_mode("pointer_up")?;
        self.capture
            .pointer_up(sample, self.feed.native_size(), mode)
    }

    pub fn hover(
        &self,
        sample: PointerSample,
    ) -> Result<Option<ElementDescriptor>, ControllerError> {
        if self.capture_mode("hover")? != CaptureMode::Inspector {
            return Ok(None);
        }
        let hit = self.capture.hover(sample, self.feed.native_size())?;
        self.revision.bump();
        Ok(hit)
    }

    pub fn leave(&self) -> Result<(), ControllerError> {
        self.capture_mode("leave")?;
        self.capture.leave();
        self.revision.bump();
        Ok(())
    }

    pub fn inspector_click(
        &self,
        sample: PointerSample,
    ) -> Result<Option<RecordedAction>, ControllerError> {
        if self.capture_mode("inspector_click")? != CaptureMode::Inspector {
            return Err(ControllerError::validation(
                "switch to inspector mode to capture elements",
            ));
        }
        self.capture
            .inspector_click(sample, self.feed.native_size())
    }

    pub fn insert_wait(&self, seconds: WaitSeconds) -> Result<RecordedAction, ControllerError> {
        self.capture_mode("insert_wait")?;
        self.recorder
            .insert_wait(PendingAction::wait(seconds, self.services.clock.epoch_millis()))
    }

    /// Ends capture for good and moves to `save`. Rejected while the list is empty.
    #[tracing::instrument(skip(self))]
    pub fn finish_recording(&self) -> Result<(), ControllerError> {
        let _busy = mutex_lock_or_recover(&self.busy);
        let mut state = mutex_lock_or_recover(&self.state);
        state.require("finish_recording", &[WizardStage::Record])?;
        if self.recorder.snapshot()?.actions.is_empty() {
            return Err(FlowValidationError::NoActions.into());
        }

        if state.recording {
            let device_id = state.device_id()?;
            self.stop_recording(&mut state, &device_id)?;
        }
        let feed = self.enter_save(&mut state)?;
        drop(state);
        drop(feed);
        Ok(())
    }

    /// Freezes the list and moves to `save`.
    ///
    /// Drop the returned refresh handle only after releasing the state lock; dropping it joins
    /// the refresh thread.
    fn enter_save(&self, state: &mut SessionState) -> Result<Option<FeedHandle>, ControllerError> {
        let actions = self.recorder.freeze()?;
        let feed = state.feed.take();
        self.capture.reset();
        state.advance(WizardStage::Save)?;
        self.status
            .set_message(format!("{} actions ready to save", actions.len()));
        self.revision.bump();
        Ok(feed)
    }

    #[tracing::instrument(skip(self))]
    pub fn save(&self, name: &str) -> Result<i64, ControllerError> {
        let _busy = mutex_lock_or_recover(&self.busy);
        let draft = {
            let state = mutex_lock_or_recover(&self.state);
            state.require("save", &[WizardStage::Save])?;
            let actions = self.recorder.snapshot()?.actions;
            let device_id = state.device_id()?;
            let recorded_at = self.services.clock.timestamp();
            FlowDraft::build(
                name,
                &actions,
                FlowContext {
                    device_id: &device_id,
                    device_name: state.device.as_ref().and_then(|d| d.name.as_deref()),
                    apk: state.apk.as_ref(),
                    recorded_at: &recorded_at,
                },
            )?
        };

        let flow_id = self
            .services
            .flows
            .create(&draft)
            .inspect_err(|err| warn!(error = %err, "Saving flow failed"))?;

        let mut state = mutex_lock_or_recover(&self.state);
        state.advance(WizardStage::Playback)?;
        state.saved_flow_id = Some(flow_id);
        state.flow_name = Some(draft.name);
        self.status.set_message(format!("Saved flow {flow_id}"));
        self.revision.bump();
        Ok(flow_id)
    }

    pub fn generate_code(&self, language: CodeLanguage) -> Result<GeneratedCode, ControllerError> {
        let _busy = mutex_lock_or_recover(&self.busy);
        mutex_lock_or_recover(&self.state).require(
            "generate_code",
            &[WizardStage::Save, WizardStage::Playback],
        )?;
        let actions = self.recorder.snapshot()?.actions;
        let source = self
            .services
            .codegen
            .generate(&actions, language)
            .inspect_err(|err| warn!(error = %err, "Code generation failed"))?;

        let code = GeneratedCode { language, source };
        mutex_lock_or_recover(&self.state).generated_code = Some(code.clone());
        self.revision.bump();
        Ok(code)
    }

    #[tracing::instrument(skip(self))]
    pub fn run_playback(&self) -> Result<PlaybackReport, ControllerError> {
        let _busy = mutex_lock_or_recover(&self.busy);
        let (flow_id, device_id) = {
            let state = mutex_lock_or_recover(&self.state);
            state.require("run_playback", &[WizardStage::Playback])?;
            let flow_id = state
                .saved_flow_id
                .ok_or_else(|| ControllerError::validation("save the flow first"))?;
            (flow_id, state.device_id()?)
        };

        let report = self
            .services
            .playback
            .run(flow_id, &device_id)
            .inspect_err(|err| warn!(error = %err, "Playback failed"))?;
        self.store_report(&report);
        Ok(report)
    }

    /// Replays the frozen list directly on the device. `reset` stops it between steps.
    #[tracing::instrument(skip(self))]
    pub fn replay_locally(&self) -> Result<PlaybackReport, ControllerError> {
        let _busy = mutex_lock_or_recover(&self.busy);
        let flow_name = {
            let state = mutex_lock_or_recover(&self.state);
            state.require("replay_locally", &[WizardStage::Playback])?;
            state.flow_name.clone()
        };
        let actions = self.recorder.snapshot()?.actions;
        self.replay_stop.rearm();
        let report = self
            .replay
            .execute(ReplayInput { flow_name, actions }, &self.replay_stop);
        self.store_report(&report);
        Ok(report)
    }

    fn store_report(&self, report: &PlaybackReport) {
        self.status.set_message(format!(
            "Playback {}/{} steps passed",
            report.successful_steps, report.total_steps
        ));
        mutex_lock_or_recover(&self.state).playback = Some(report.clone());
        self.revision.bump();
    }

    /// Returns to `device` and clears every piece of session data.
    #[tracing::instrument(skip(self))]
    pub fn reset(&self) -> Result<(), ControllerError> {
        self.replay_stop.stop();
        let _busy = mutex_lock_or_recover(&self.busy);
        let mut state = mutex_lock_or_recover(&self.state);
        if state.recording {
            let device_id = state.device_id()?;
            self.stop_recording(&mut state, &device_id)?;
        }
        self.recorder.clear()?;
        self.capture.reset();

        let devices = std::mem::take(&mut state.devices);
        let feed = state.feed.take();
        *state = SessionState {
            devices,
            ..SessionState::default()
        };
        drop(state);
        drop(feed);
        self.feed.clear();
        self.status.reset();
        self.revision.bump();
        info!("Session reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActionKind;
    use crate::domain::DisplayPoint;
    use crate::domain::InstallProgress;
    use crate::domain::PlaybackStatus;
    use crate::domain::RenderedSize;
    use crate::domain::png_header;
    use crate::usecases::ports::PushEvent;
    use crate::usecases::ports::RemoteTouch;
    use crate::usecases::ports::test_support::{
        MockBackend, MockClock, MockDevice, MockPushChannel, RecordingSleeper,
    };
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use std::thread;
    use std::time::Instant;

    const DEVICE: &str = "emulator-5554";

    struct Harness {
        controller: RecordingSessionController,
        device: Arc<MockDevice>,
        backend: Arc<MockBackend>,
        push: Arc<MockPushChannel>,
        sleeper: Arc<RecordingSleeper>,
    }

    fn phone_screenshot() -> Screenshot {
        Screenshot::from_base64(&STANDARD.encode(png_header(1080, 2340)))
    }

    fn harness_with(device: MockDevice, backend: MockBackend, push: MockPushChannel) -> Harness {
        harness_with_interval(device, backend, push, Duration::from_secs(3600))
    }

    fn harness_with_interval(
        device: MockDevice,
        backend: MockBackend,
        push: MockPushChannel,
        screenshot_interval: Duration,
    ) -> Harness {
        let device = Arc::new(device);
        let backend = Arc::new(backend);
        let push = Arc::new(push);
        let sleeper = Arc::new(RecordingSleeper::default());
        let services = SessionServices {
            catalog: device.clone(),
            installer: device.clone(),
            session: device.clone(),
            executor: device.clone(),
            monitor: device.clone(),
            inspector: device.clone(),
            push: push.clone(),
            flows: backend.clone(),
            playback: backend.clone(),
            codegen: backend.clone(),
            clock: Arc::new(MockClock::new()),
            sleeper: sleeper.clone(),
        };
        let settings = ControllerSettings {
            screenshot_interval,
            ..ControllerSettings::default()
        };
        Harness {
            controller: RecordingSessionController::new(services, settings).unwrap(),
            device,
            backend,
            push,
            sleeper,
        }
    }

    fn harness() -> Harness {
        harness_with(
            MockDevice::builder()
                .with_screenshot(phone_screenshot())
                .build(),
            MockBackend::new(),
            MockPushChannel::new(),
        )
    }

    fn sample(x: f64, y: f64) -> PointerSample {
        PointerSample {
            position: DisplayPoint { x, y },
            rendered: RenderedSize {
                width: 375.0,
                height: 812.0,
            },
        }
    }

    fn to_record(h: &Harness) {
        let c = &h.controller;
        c.refresh_devices().unwrap();
        c.select_device(DEVICE).unwrap();
        c.advance().unwrap();
        c.analyze_apk(Path::new("/tmp/shop.apk")).unwrap();
        c.install().unwrap();
        c.launch().unwrap();
        assert_eq!(c.stage(), WizardStage::Record);
    }

    fn tap(h: &Harness, x: f64, y: f64) -> Option<RecordedAction> {
        h.controller.pointer_down(sample(x, y)).unwrap();
        h.controller.pointer_up(sample(x, y)).unwrap()
    }

    #[test]
    fn test_full_wizard_to_playback() {
        let h = harness();
        to_record(&h);
        assert_eq!(h.sleeper.sleeps(), vec![DEFAULT_LAUNCH_SETTLE]);
        assert_eq!(h.device.launches()[0].app_activity, ".MainActivity");
        assert_eq!(h.device.installs(), vec![DEVICE.to_string()]);

        h.controller.toggle_recording().unwrap();
        let action = tap(&h, 100.0, 100.0).unwrap();
        assert_eq!(
            action.kind,
            ActionKind::Tap {
                x: 288,
                y: 288,
                element: None
            }
        );
        h.controller.insert_wait(WaitSeconds::Three).unwrap();
        h.controller.finish_recording().unwrap();
        assert_eq!(h.controller.stage(), WizardStage::Save);
        assert_eq!(h.device.monitoring_stopped(), vec![DEVICE.to_string()]);

        let flow_id = h.controller.save("Checkout").unwrap();
        assert_eq!(h.controller.stage(), WizardStage::Playback);
        let draft = &h.backend.drafts()[0];
        assert_eq!(draft.description, "Automated test - 2 steps");
        assert_eq!(draft.device_name, "Pixel 7");
        assert_eq!(draft.app_package, "com.example.shop");

        let report = h.controller.run_playback().unwrap();
        assert_eq!(report.total_steps, 2);
        assert_eq!(h.backend.playback_runs(), vec![(flow_id, DEVICE.to_string())]);
        let report = h.controller.run_playback().unwrap();
        assert_eq!(report.status, PlaybackStatus::Completed);
        assert!(h.controller.view().unwrap().playback.is_some());
    }

    #[test]
    fn test_advance_without_device_is_rejected() {
        let h = harness();
        let err = h.controller.advance().unwrap_err();
        assert!(matches!(err, ControllerError::Validation(_)));
        assert_eq!(h.controller.stage(), WizardStage::Device);
    }

    #[test]
    fn test_intents_outside_their_stage_are_rejected() {
        let h = harness();
        let err = h.controller.insert_wait(WaitSeconds::One).unwrap_err();
        assert_eq!(
            err,
            ControllerError::InvalidStage {
                intent: "insert_wait",
                stage: WizardStage::Device
            }
        );
        assert!(h.controller.actions().unwrap().is_empty());
    }

    #[test]
    fn test_failed_analysis_leaves_stage() {
        let h = harness_with(
            MockDevice::builder().with_analyze_failure().build(),
            MockBackend::new(),
            MockPushChannel::new(),
        );
        h.controller.select_device(DEVICE).unwrap();
        h.controller.advance().unwrap();
        let err = h
            .controller
            .analyze_apk(Path::new("/tmp/shop.apk"))
            .unwrap_err();
        assert!(matches!(err, ControllerError::Service(_)));
        let view = h.controller.view().unwrap();
        assert_eq!(view.stage, WizardStage::Apk);
        assert!(view.apk.is_none());
    }

    #[test]
    fn test_non_apk_path_is_validation_error() {
        let h = harness();
        h.controller.select_device(DEVICE).unwrap();
        h.controller.advance().unwrap();
        let err = h
            .controller
            .analyze_apk(Path::new("/tmp/notes.txt"))
            .unwrap_err();
        assert!(matches!(err, ControllerError::Validation(_)));
        assert_eq!(h.device.analyses(), 0);
    }

    #[test]
    fn test_already_installed_skips_install_call() {
        let h = harness_with(
            MockDevice::builder()
                .with_apk(ApkInfo {
                    package_name: "com.example.maps".to_string(),
                    app_name: None,
                    version: None,
                    launch_activity: Some(".Home".to_string()),
                    already_installed: true,
                })
                .with_install_failure()
                .build(),
            MockBackend::new(),
            MockPushChannel::new(),
        );
        h.controller.select_device(DEVICE).unwrap();
        h.controller.advance().unwrap();
        h.controller.analyze_apk(Path::new("maps.APK")).unwrap();
        h.controller.install().unwrap();
        assert_eq!(h.controller.stage(), WizardStage::Launch);
        assert!(h.device.installs().is_empty());
    }

    #[test]
    fn test_failed_install_keeps_stage() {
        let h = harness_with(
            MockDevice::builder().with_install_failure().build(),
            MockBackend::new(),
            MockPushChannel::new(),
        );
        h.controller.select_device(DEVICE).unwrap();
        h.controller.advance().unwrap();
        h.controller.analyze_apk(Path::new("shop.apk")).unwrap();
        assert!(h.controller.install().is_err());
        assert_eq!(h.controller.stage(), WizardStage::Install);
    }

    #[test]
    fn test_launch_without_screenshot_is_degraded() {
        let h = harness_with(MockDevice::new(), MockBackend::new(), MockPushChannel::new());
        to_record(&h);
        let view = h.controller.view().unwrap();
        assert!(view.status.degraded);
        assert!(h.controller.screenshot().is_none());

        h.controller.toggle_recording().unwrap();
        assert!(matches!(
            h.controller.pointer_down(sample(1.0, 1.0)),
            Err(ControllerError::Mapping(_))
        ));
    }

    #[test]
    fn test_failed_launch_keeps_stage() {
        let h = harness_with(
            MockDevice::builder().with_session_failure().build(),
            MockBackend::new(),
            MockPushChannel::new(),
        );
        h.controller.select_device(DEVICE).unwrap();
        h.controller.advance().unwrap();
        h.controller.analyze_apk(Path::new("shop.apk")).unwrap();
        h.controller.install().unwrap();
        assert!(h.controller.launch().is_err());
        let view = h.controller.view().unwrap();
        assert_eq!(view.stage, WizardStage::Launch);
        assert!(view.session_id.is_none());
    }

    #[test]
    fn test_taps_before_recording_are_not_captured() {
        let h = harness();
        to_record(&h);
        assert!(tap(&h, 10.0, 10.0).is_none());
        assert!(h.controller.actions().unwrap().is_empty());
    }

    #[test]
    fn test_remote_actions_interleave_with_local_ones() {
        let h = harness();
        to_record(&h);
        h.controller.toggle_recording().unwrap();
        tap(&h, 10.0, 10.0).unwrap();
        h.push.emit(PushEvent::MobileAction {
            device_id: DEVICE.to_string(),
            touch: RemoteTouch::Tap { x: 500.0, y: 900.0 },
        });
        h.controller.insert_wait(WaitSeconds::One).unwrap();

        let actions = h.controller.actions().unwrap();
        let steps: Vec<u32> = actions.iter().map(|a| a.step).collect();
        assert_eq!(steps, vec![1, 2, 3]);
        assert_eq!(actions[1].description, "Tap at (500, 900) [Mobile 📱]");
    }

    #[test]
    fn test_late_remote_action_after_stop_is_dropped() {
        let h = harness();
        to_record(&h);
        h.controller.toggle_recording().unwrap();
        tap(&h, 10.0, 10.0).unwrap();
        h.controller.toggle_recording().unwrap();

        h.push.emit(PushEvent::MobileAction {
            device_id: DEVICE.to_string(),
            touch: RemoteTouch::Tap { x: 1.0, y: 1.0 },
        });
        assert_eq!(h.controller.actions().unwrap().len(), 1);
        let view = h.controller.view().unwrap();
        assert!(!view.recording);
        assert_eq!(view.stage, WizardStage::Save);
    }

    #[test]
    fn test_stopping_with_actions_freezes_and_moves_to_save() {
        let h = harness();
        to_record(&h);
        h.controller.toggle_recording().unwrap();
        tap(&h, 10.0, 10.0).unwrap();
        h.controller.toggle_recording().unwrap();

        let view = h.controller.view().unwrap();
        assert_eq!(view.stage, WizardStage::Save);
        assert!(view.frozen);
        assert_eq!(h.device.monitoring_stopped(), vec![DEVICE.to_string()]);
        assert!(matches!(
            h.controller.toggle_recording(),
            Err(ControllerError::InvalidStage { .. })
        ));
        assert_eq!(h.controller.actions().unwrap().len(), 1);
        assert_eq!(h.controller.save("Tap").unwrap(), 1);
    }

    #[test]
    fn test_stopping_empty_segment_stays_in_record() {
        let h = harness();
        to_record(&h);
        h.controller.toggle_recording().unwrap();
        h.controller.toggle_recording().unwrap();
        let view = h.controller.view().unwrap();
        assert_eq!(view.stage, WizardStage::Record);
        assert!(!view.recording);
        assert!(!view.frozen);

        h.controller.toggle_recording().unwrap();
        assert_eq!(tap(&h, 10.0, 10.0).unwrap().step, 1);
    }

    #[test]
    fn test_view_is_not_blocked_while_feed_stops() {
        let delay = Duration::from_millis(500);
        let h = harness_with_interval(
            MockDevice::builder()
                .with_screenshot(phone_screenshot())
                .with_screenshot_delay(delay)
                .build(),
            MockBackend::new(),
            MockPushChannel::new(),
            Duration::from_millis(1),
        );
        to_record(&h);
        h.controller.insert_wait(WaitSeconds::One).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while h.device.screenshots_taken() < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }

        thread::scope(|scope| {
            let finisher = scope.spawn(|| h.controller.finish_recording());
            thread::sleep(Duration::from_millis(50));
            let started = Instant::now();
            h.controller.view().unwrap();
            assert!(started.elapsed() < Duration::from_millis(250));
            finisher.join().unwrap().unwrap();
        });
        assert_eq!(h.controller.stage(), WizardStage::Save);
    }

    #[test]
    fn test_mirror_recovery_clears_degraded_status() {
        let h = harness_with(MockDevice::new(), MockBackend::new(), MockPushChannel::new());
        to_record(&h);
        assert!(h.controller.view().unwrap().status.degraded);

        h.device.set_screenshot(Some(phone_screenshot()));
        h.controller.feed.refresh().unwrap();
        let status = h.controller.view().unwrap().status;
        assert!(!status.degraded);
        assert_eq!(status.message, "Screen mirror restored");
    }

    #[test]
    fn test_monitor_failure_keeps_recording_off() {
        let h = harness_with(
            MockDevice::builder()
                .with_screenshot(phone_screenshot())
                .with_monitor_failure()
                .build(),
            MockBackend::new(),
            MockPushChannel::new(),
        );
        to_record(&h);
        assert!(h.controller.toggle_recording().is_err());
        assert!(!h.controller.view().unwrap().recording);
    }

    #[test]
    fn test_installation_progress_goes_to_status() {
        let h = harness();
        h.controller.select_device(DEVICE).unwrap();
        h.push.emit(PushEvent::InstallationProgress(InstallProgress {
            device_id: DEVICE.to_string(),
            progress: 50.0,
            message: "Streaming".to_string(),
        }));
        let view = h.controller.view().unwrap();
        assert_eq!(view.status.message, "Installing: Streaming (50%)");
        assert_eq!(view.action_count, 0);
    }

    #[test]
    fn test_finish_with_empty_list_is_rejected() {
        let h = harness();
        to_record(&h);
        let err = h.controller.finish_recording().unwrap_err();
        assert_eq!(err, ControllerError::validation("no actions to save"));
        assert_eq!(h.controller.stage(), WizardStage::Record);
    }

    #[test]
    fn test_save_with_blank_name_changes_nothing() {
        let h = harness();
        to_record(&h);
        h.controller.insert_wait(WaitSeconds::Five).unwrap();
        h.controller.finish_recording().unwrap();

        let err = h.controller.save("   ").unwrap_err();
        assert!(matches!(err, ControllerError::Validation(_)));
        assert_eq!(h.controller.stage(), WizardStage::Save);
        assert_eq!(h.controller.actions().unwrap().len(), 1);
        assert!(h.backend.drafts().is_empty());
    }

    #[test]
    fn test_failed_save_keeps_stage() {
        let h = harness_with(
            MockDevice::builder()
                .with_screenshot(phone_screenshot())
                .build(),
            MockBackend::failing_store(),
            MockPushChannel::new(),
        );
        to_record(&h);
        h.controller.insert_wait(WaitSeconds::One).unwrap();
        h.controller.finish_recording().unwrap();
        assert!(h.controller.save("Flow").is_err());
        assert_eq!(h.controller.view().unwrap().saved_flow_id, None);
        assert_eq!(h.controller.stage(), WizardStage::Save);
    }

    #[test]
    fn test_list_is_frozen_after_record() {
        let h = harness();
        to_record(&h);
        h.controller.toggle_recording().unwrap();
        tap(&h, 5.0, 5.0).unwrap();
        h.controller.finish_recording().unwrap();

        assert!(matches!(
            h.controller.insert_wait(WaitSeconds::One),
            Err(ControllerError::InvalidStage { .. })
        ));
        h.push.emit(PushEvent::MobileAction {
            device_id: DEVICE.to_string(),
            touch: RemoteTouch::Tap { x: 1.0, y: 1.0 },
        });
        assert_eq!(h.controller.actions().unwrap().len(), 1);
        assert!(h.controller.view().unwrap().frozen);
    }

    #[test]
    fn test_generate_code_and_replay() {
        let h = harness();
        to_record(&h);
        h.controller.insert_wait(WaitSeconds::Two).unwrap();
        h.controller.finish_recording().unwrap();

        let code = h.controller.generate_code(CodeLanguage::Python).unwrap();
        assert_eq!(code.source, "// 1 steps (python)");

        h.controller.save("Waits").unwrap();
        let report = h.controller.replay_locally().unwrap();
        assert_eq!(report.successful_steps, 1);
        assert_eq!(report.flow_name.as_deref(), Some("Waits"));
    }

    #[test]
    fn test_playback_is_terminal() {
        let h = harness();
        to_record(&h);
        h.controller.insert_wait(WaitSeconds::One).unwrap();
        h.controller.finish_recording().unwrap();
        h.controller.save("Flow").unwrap();
        assert!(matches!(
            h.controller.advance(),
            Err(ControllerError::Transition(_))
        ));
    }

    #[test]
    fn test_reset_clears_session() {
        let h = harness();
        to_record(&h);
        h.controller.toggle_recording().unwrap();
        tap(&h, 5.0, 5.0).unwrap();
        assert_eq!(h.push.subscriber_count(), 2);

        h.controller.reset().unwrap();
        let view = h.controller.view().unwrap();
        assert_eq!(view.stage, WizardStage::Device);
        assert!(view.device.is_none());
        assert!(view.apk.is_none());
        assert_eq!(view.action_count, 0);
        assert!(!view.recording);
        assert_eq!(h.push.subscriber_count(), 0);
        assert!(h.controller.screenshot().is_none());
    }

    #[test]
    fn test_inspector_mode_records_element_taps() {
        let h = harness_with(
            MockDevice::builder()
                .with_screenshot(phone_screenshot())
                .with_element(Some(ElementDescriptor {
                    class_name: Some("android.widget.EditText".to_string()),
                    resource_id: Some("com.example.shop:id/email".to_string()),
                    ..Default::default()
                }))
                .build(),
            MockBackend::new(),
            MockPushChannel::new(),
        );
        to_record(&h);
        h.controller.toggle_recording().unwrap();
        h.controller.set_mode(CaptureMode::Inspector).unwrap();
        assert!(h.controller.pointer_down(sample(1.0, 1.0)).is_err());

        assert!(h.controller.hover(sample(50.0, 60.0)).unwrap().is_some());
        let action = h
            .controller
            .inspector_click(sample(50.0, 60.0))
            .unwrap()
            .unwrap();
        assert_eq!(
            action.description,
            "🔍 Tap EditText \"com.example.shop:id/email\""
        );
        assert_eq!(
            h.controller.view().unwrap().device.unwrap().display_name(),
            "Pixel 7"
        );
    }

    #[test]
    fn test_unknown_device_is_rejected_once_listed() {
        let h = harness();
        h.controller.refresh_devices().unwrap();
        assert!(matches!(
            h.controller.select_device("nope"),
            Err(ControllerError::Validation(_))
        ));
    }

    #[test]
    fn test_handle_maps_outputs() {
        let h = harness();
        let output = h.controller.handle(SessionIntent::RefreshDevices).unwrap();
        assert!(matches!(output, IntentOutput::Devices(ref d) if d.len() == 1));
        let output = h
            .controller
            .handle(SessionIntent::SelectDevice {
                device_id: DEVICE.to_string(),
            })
            .unwrap();
        assert_eq!(output, IntentOutput::None);
        assert_eq!(h.controller.stage(), WizardStage::Device);
    }
}

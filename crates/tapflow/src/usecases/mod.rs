mod capture;
mod controller;
mod dispatch;
mod flows;
mod recorder;
mod remote;
mod replay;
mod screenshot_feed;
mod status;

pub use capture::PointerSample;
pub use controller::{
    ControllerSettings, GeneratedCode, IntentOutput, RecordingSessionController, SessionIntent,
    SessionServices, SessionView,
};
pub use flows::{
    DeleteFlowUseCase, DeleteFlowUseCaseImpl, FlowCodeInput, FlowCodeUseCase, FlowCodeUseCaseImpl,
    ListDevicesUseCase, ListDevicesUseCaseImpl, ListFlowsUseCase, ListFlowsUseCaseImpl,
    RunPlaybackUseCase, RunPlaybackUseCaseImpl, ShowFlowUseCase, ShowFlowUseCaseImpl,
};
pub mod ports;

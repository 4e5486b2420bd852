pub mod clock;
pub mod device_control;
pub mod devices;
pub mod errors;
pub mod flows;
pub mod push_channel;
#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, Sleeper};
pub use device_control::{
    AppSession, ElementInspector, GestureExecutor, LaunchRequest, TouchMonitor,
};
pub use devices::{DeviceCatalog, PackageInstaller};
pub use errors::{ControllerError, ServiceError};
pub use flows::{CodeGenerator, FlowStore, PlaybackService};
pub use push_channel::{PushChannel, PushEvent, PushHandler, PushSubscription, RemoteTouch};

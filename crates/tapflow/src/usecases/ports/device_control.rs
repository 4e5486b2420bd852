use crate::domain::DevicePoint;
use crate::domain::ElementDescriptor;
use crate::domain::Screenshot;
use crate::usecases::ports::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub device_id: String,
    pub platform: String,
    pub app_package: String,
    pub app_activity: String,
}

/// Live automation session on the device plus its mirrored screen.
pub trait AppSession: Send + Sync {
    fn start_session(&self, request: &LaunchRequest) -> Result<String, ServiceError>;

    fn screenshot(&self) -> Result<Screenshot, ServiceError>;
}

pub trait GestureExecutor: Send + Sync {
    fn tap(&self, point: DevicePoint) -> Result<(), ServiceError>;

    fn swipe(
        &self,
        start: DevicePoint,
        end: DevicePoint,
        duration_ms: u64,
    ) -> Result<(), ServiceError>;
}

/// Device-side capture of physical touches, delivered later as push events.
pub trait TouchMonitor: Send + Sync {
    fn start_monitoring(&self, device_id: &str) -> Result<(), ServiceError>;

    fn stop_monitoring(&self, device_id: &str) -> Result<(), ServiceError>;
}

pub trait ElementInspector: Send + Sync {
    /// `Ok(None)` when nothing is hit at `point`.
    fn element_at(&self, point: DevicePoint) -> Result<Option<ElementDescriptor>, ServiceError>;
}

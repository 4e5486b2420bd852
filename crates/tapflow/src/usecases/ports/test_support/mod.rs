mod mock_backend;
mod mock_clock;
mod mock_device;
mod mock_push;

pub use mock_backend::MockBackend;
pub use mock_clock::{MockClock, RecordingSleeper};
pub use mock_device::MockDevice;
pub use mock_push::MockPushChannel;

use crate::usecases::ports::ServiceError;

pub(crate) fn unavailable(service: &'static str) -> ServiceError {
    ServiceError::Unavailable {
        service,
        reason: "connection refused".to_string(),
    }
}

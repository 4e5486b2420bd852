use std::path::Path;

use crate::domain::ApkInfo;
use crate::domain::Device;
use crate::usecases::ports::ServiceError;

pub trait DeviceCatalog: Send + Sync {
    fn list_devices(&self) -> Result<Vec<Device>, ServiceError>;
}

/// Package analysis and installation for a target device.
pub trait PackageInstaller: Send + Sync {
    fn analyze(&self, device_id: &str, apk: &Path) -> Result<ApkInfo, ServiceError>;

    /// Progress is reported on the push channel, not through this call.
    fn install(&self, device_id: &str, apk: &Path) -> Result<(), ServiceError>;
}

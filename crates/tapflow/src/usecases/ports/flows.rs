use crate::domain::CodeLanguage;
use crate::domain::FlowDraft;
use crate::domain::FlowRecord;
use crate::domain::PlaybackReport;
use crate::domain::RecordedAction;
use crate::usecases::ports::ServiceError;

pub trait FlowStore: Send + Sync {
    /// Persists a draft and returns the new flow id.
    fn create(&self, draft: &FlowDraft) -> Result<i64, ServiceError>;

    fn list(&self) -> Result<Vec<FlowRecord>, ServiceError>;

    fn get(&self, flow_id: i64) -> Result<FlowRecord, ServiceError>;

    fn delete(&self, flow_id: i64) -> Result<(), ServiceError>;
}

pub trait PlaybackService: Send + Sync {
    fn run(&self, flow_id: i64, device_id: &str) -> Result<PlaybackReport, ServiceError>;
}

pub trait CodeGenerator: Send + Sync {
    fn generate(
        &self,
        actions: &[RecordedAction],
        language: CodeLanguage,
    ) -> Result<String, ServiceError>;
}

//! Flow store, playback and code generation backed by memory.

use std::sync::Mutex;

use super::unavailable;
use crate::domain::CodeLanguage;
use crate::domain::FlowAppInfo;
use crate::domain::FlowDeviceInfo;
use crate::domain::FlowDraft;
use crate::domain::FlowRecord;
use crate::domain::PlaybackReport;
use crate::domain::RecordedAction;
use crate::domain::StepOutcome;
use crate::usecases::ports::CodeGenerator;
use crate::usecases::ports::FlowStore;
use crate::usecases::ports::PlaybackService;
use crate::usecases::ports::ServiceError;

#[derive(Default)]
pub struct MockBackend {
    flows: Mutex<Vec<FlowRecord>>,
    drafts: Mutex<Vec<FlowDraft>>,
    playback_runs: Mutex<Vec<(i64, String)>>,
    failing_steps: Vec<u32>,
    store_error: bool,
    playback_error: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_store() -> Self {
        Self {
            store_error: true,
            ..Self::default()
        }
    }

    pub fn failing_playback() -> Self {
        Self {
            playback_error: true,
            ..Self::default()
        }
    }

    /// Playback reports these steps as failed.
    pub fn with_failing_steps(mut self, steps: Vec<u32>) -> Self {
        self.failing_steps = steps;
        self
    }

    pub fn with_flow(self, record: FlowRecord) -> Self {
        self.flows.lock().unwrap().push(record);
        self
    }

    pub fn drafts(&self) -> Vec<FlowDraft> {
        self.drafts.lock().unwrap().clone()
    }

    pub fn playback_runs(&self) -> Vec<(i64, String)> {
        self.playback_runs.lock().unwrap().clone()
    }

    fn not_found(flow_id: i64) -> ServiceError {
        ServiceError::Status {
            service: "flow store",
            status: 404,
            detail: format!("Flow {flow_id} not found"),
        }
    }
}

impl FlowStore for MockBackend {
    fn create(&self, draft: &FlowDraft) -> Result<i64, ServiceError> {
        if self.store_error {
            return Err(unavailable("flow store"));
        }
        self.drafts.lock().unwrap().push(draft.clone());
        let mut flows = self.flows.lock().unwrap();
        let id = flows.iter().map(|f| f.id).max().unwrap_or(0) + 1;
        flows.push(FlowRecord {
            id,
            name: draft.name.clone(),
            description: Some(draft.description.clone()),
            device_info: FlowDeviceInfo {
                device_id: Some(draft.device_id.clone()),
                name: Some(draft.device_name.clone()),
                platform: Some(draft.device_platform.clone()),
            },
            app_info: FlowAppInfo {
                package: Some(draft.app_package.clone()),
                name: Some(draft.app_name.clone()),
                version: Some(draft.app_version.clone()),
            },
            steps: draft.steps.clone(),
            created_at: Some(draft.flow_metadata.recorded_at.clone()),
        });
        Ok(id)
    }

    fn list(&self) -> Result<Vec<FlowRecord>, ServiceError> {
        if self.store_error {
            return Err(unavailable("flow store"));
        }
        Ok(self.flows.lock().unwrap().clone())
    }

    fn get(&self, flow_id: i64) -> Result<FlowRecord, ServiceError> {
        self.flows
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == flow_id)
            .cloned()
            .ok_or_else(|| Self::not_found(flow_id))
    }

    fn delete(&self, flow_id: i64) -> Result<(), ServiceError> {
        let mut flows = self.flows.lock().unwrap();
        let before = flows.len();
        flows.retain(|f| f.id != flow_id);
        if flows.len() == before {
            return Err(Self::not_found(flow_id));
        }
        Ok(())
    }
}

impl PlaybackService for MockBackend {
    fn run(&self, flow_id: i64, device_id: &str) -> Result<PlaybackReport, ServiceError> {
        self.playback_runs
            .lock()
            .unwrap()
            .push((flow_id, device_id.to_string()));
        if self.playback_error {
            return Err(unavailable("playback"));
        }
        let flow = self.get(flow_id)?;
        let outcomes = flow.steps.iter().map(|step| {
            if self.failing_steps.contains(&step.step) {
                StepOutcome::failed(step.step, step.kind.name(), "element not found")
            } else {
                StepOutcome::ok(step.step, step.kind.name())
            }
        });
        Ok(PlaybackReport::aggregate(
            Some(flow.name.clone()),
            flow.steps.len(),
            outcomes,
        ))
    }
}

impl CodeGenerator for MockBackend {
    fn generate(
        &self,
        actions: &[RecordedAction],
        language: CodeLanguage,
    ) -> Result<String, ServiceError> {
        Ok(format!(
            "// {} steps ({})",
            actions.len(),
            language.as_str()
        ))
    }
}

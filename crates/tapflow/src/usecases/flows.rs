//! Flow management use cases behind the one-shot CLI commands.

use std::sync::Arc;

use crate::domain::CodeLanguage;
use crate::domain::Device;
use crate::domain::FlowRecord;
use crate::domain::PlaybackReport;
use crate::usecases::controller::GeneratedCode;
use crate::usecases::ports::CodeGenerator;
use crate::usecases::ports::DeviceCatalog;
use crate::usecases::ports::FlowStore;
use crate::usecases::ports::PlaybackService;
use crate::usecases::ports::ServiceError;

pub trait ListDevicesUseCase: Send + Sync {
    fn execute(&self) -> Result<Vec<Device>, ServiceError>;
}

pub struct ListDevicesUseCaseImpl<C: DeviceCatalog + ?Sized> {
    catalog: Arc<C>,
}

impl<C: DeviceCatalog + ?Sized> ListDevicesUseCaseImpl<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }
}

impl<C: DeviceCatalog + ?Sized> ListDevicesUseCase for ListDevicesUseCaseImpl<C> {
    #[tracing::instrument(skip(self))]
    fn execute(&self) -> Result<Vec<Device>, ServiceError> {
        self.catalog.list_devices()
    }
}

pub trait ListFlowsUseCase: Send + Sync {
    fn execute(&self) -> Result<Vec<FlowRecord>, ServiceError>;
}

pub struct ListFlowsUseCaseImpl<S: FlowStore + ?Sized> {
    store: Arc<S>,
}

impl<S: FlowStore + ?Sized> ListFlowsUseCaseImpl<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: FlowStore + ?Sized> ListFlowsUseCase for ListFlowsUseCaseImpl<S> {
    #[tracing::instrument(skip(self))]
    fn execute(&self) -> Result<Vec<FlowRecord>, ServiceError> {
        self.store.list()
    }
}

pub trait ShowFlowUseCase: Send + Sync {
    fn execute(&self, flow_id: i64) -> Result<FlowRecord, ServiceError>;
}

pub struct ShowFlowUseCaseImpl<S: FlowStore + ?Sized> {
    store: Arc<S>,
}

impl<S: FlowStore + ?Sized> ShowFlowUseCaseImpl<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: FlowStore + ?Sized> ShowFlowUseCase for ShowFlowUseCaseImpl<S> {
    #[tracing::instrument(skip(self))]
    fn execute(&self, flow_id: i64) -> Result<FlowRecord, ServiceError> {
        self.store.get(flow_id)
    }
}

pub trait DeleteFlowUseCase: Send + Sync {
    fn execute(&self, flow_id: i64) -> Result<(), ServiceError>;
}

pub struct DeleteFlowUseCaseImpl<S: FlowStore + ?Sized> {
    store: Arc<S>,
}

impl<S: FlowStore + ?Sized> DeleteFlowUseCaseImpl<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: FlowStore + ?Sized> DeleteFlowUseCase for DeleteFlowUseCaseImpl<S> {
    #[tracing::instrument(skip(self))]
    fn execute(&self, flow_id: i64) -> Result<(), ServiceError> {
        self.store.delete(flow_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowCodeInput {
    pub flow_id: i64,
    pub language: CodeLanguage,
}

/// Fetches a stored flow and generates source for its steps.
pub trait FlowCodeUseCase: Send + Sync {
    fn execute(&self, input: FlowCodeInput) -> Result<GeneratedCode, ServiceError>;
}

pub struct FlowCodeUseCaseImpl<S: FlowStore + ?Sized, G: CodeGenerator + ?Sized> {
    store: Arc<S>,
    generator: Arc<G>,
}

impl<S: FlowStore + ?Sized, G: CodeGenerator + ?Sized> FlowCodeUseCaseImpl<S, G> {
    pub fn new(store: Arc<S>, generator: Arc<G>) -> Self {
        Self { store, generator }
    }
}

impl<S: FlowStore + ?Sized, G: CodeGenerator + ?Sized> FlowCodeUseCase
    for FlowCodeUseCaseImpl<S, G>
{
    #[tracing::instrument(
        skip(self, input),
        fields(flow_id = input.flow_id, language = %input.language)
    )]
    fn execute(&self, input: FlowCodeInput) -> Result<GeneratedCode, ServiceError> {
        let flow = self.store.get(input.flow_id)?;
        let source = self.generator.generate(&flow.steps, input.language)?;
        Ok(GeneratedCode {
            language: input.language,
            source,
        })
    }
}

pub trait RunPlaybackUseCase: Send + Sync {
    fn execute(&self, flow_id: i64, device_id: &str) -> Result<PlaybackReport, ServiceError>;
}

pub struct RunPlaybackUseCaseImpl<P: PlaybackService + ?Sized> {
    playback: Arc<P>,
}

impl<P: PlaybackService + ?Sized> RunPlaybackUseCaseImpl<P> {
    pub fn new(playback: Arc<P>) -> Self {
        Self { playback }
    }
}

impl<P: PlaybackService + ?Sized> RunPlaybackUseCase for RunPlaybackUseCaseImpl<P> {
    #[tracing::instrument(skip(self))]
    fn execute(&self, flow_id: i64, device_id: &str) -> Result<PlaybackReport, ServiceError> {
        self.playback.run(flow_id, device_id)
    }
}

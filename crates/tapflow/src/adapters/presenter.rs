#![expect(clippy::print_stdout, reason = "CLI output is emitted here")]
#![expect(clippy::print_stderr, reason = "CLI output is emitted here")]

//! CLI output presenter.

use clap::ValueEnum;
use serde::Serialize;

use crate::adapters::ErrorPayload;
use crate::domain::Device;
use crate::domain::FlowRecord;
use crate::domain::PlaybackReport;
use crate::usecases::GeneratedCode;

const PROGRAM_NAME: &str = "tapflow";

/// Output format for CLI commands
#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub trait Presenter {
    fn present_success(&self, message: &str);

    fn present_error(&self, error: &ErrorPayload);

    fn present_devices(&self, devices: &[Device]);

    fn present_flows(&self, flows: &[FlowRecord]);

    fn present_flow(&self, flow: &FlowRecord);

    fn present_report(&self, report: &PlaybackReport);

    fn present_code(&self, code: &GeneratedCode);
}

pub fn create_presenter(format: OutputFormat) -> Box<dyn Presenter> {
    match format {
        OutputFormat::Text => Box::new(TextPresenter),
        OutputFormat::Json => Box::new(JsonPresenter),
    }
}

pub struct TextPresenter;

impl Presenter for TextPresenter {
    fn present_success(&self, message: &str) {
        println!("✓ {message}");
    }

    fn present_error(&self, error: &ErrorPayload) {
        eprintln!("{PROGRAM_NAME}: Error: {}", error.error);
        if !error.suggestion.is_empty() {
            eprintln!("Suggestion: {}", error.suggestion);
        }
        if error.retryable {
            eprintln!("(This error may be transient - retry may succeed)");
        }
    }

    fn present_devices(&self, devices: &[Device]) {
        if devices.is_empty() {
            println!("No devices found");
            return;
        }
        println!("Devices:");
        for device in devices {
            let state = if device.is_connected {
                "connected"
            } else {
                "offline"
            };
            println!(
                "  {}  {} ({}) [{state}]",
                device.device_id,
                device.display_name(),
                device.platform.as_deref().unwrap_or("unknown")
            );
        }
    }

    fn present_flows(&self, flows: &[FlowRecord]) {
        if flows.is_empty() {
            println!("No saved flows");
            return;
        }
        println!("Flows:");
        for flow in flows {
            println!(
                "  #{}  {}  ({} steps)  {}",
                flow.id,
                flow.name,
                flow.steps.len(),
                flow.created_at.as_deref().unwrap_or("-")
            );
        }
    }

    fn present_flow(&self, flow: &FlowRecord) {
        println!("Flow #{}: {}", flow.id, flow.name);
        if let Some(description) = flow.description.as_deref() {
            println!("  {description}");
        }
        if let Some(package) = flow.app_info.package.as_deref() {
            println!("  App: {package}");
        }
        if let Some(device) = flow.device_info.name.as_deref() {
            println!("  Device: {device}");
        }
        for step in &flow.steps {
            println!("  {:>3}. {}", step.step, step.description);
        }
    }

    fn present_report(&self, report: &PlaybackReport) {
        println!(
            "Playback {}: {}/{} steps succeeded, {} failed",
            report.status.as_str(),
            report.successful_steps,
            report.total_steps,
            report.failed_steps
        );
        for error in &report.errors {
            eprintln!("  step {} ({}): {}", error.step, error.action, error.error);
        }
    }

    fn present_code(&self, code: &GeneratedCode) {
        println!("{}", code.source);
    }
}

pub struct JsonPresenter;

impl JsonPresenter {
    fn emit<T: Serialize + ?Sized>(value: &T) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }
}

impl Presenter for JsonPresenter {
    fn present_success(&self, message: &str) {
        Self::emit(&serde_json::json!({
            "success": true,
            "message": message
        }));
    }

    fn present_error(&self, error: &ErrorPayload) {
        eprintln!(
            "{}",
            serde_json::to_string_pretty(error).unwrap_or_default()
        );
    }

    fn present_devices(&self, devices: &[Device]) {
        Self::emit(devices);
    }

    fn present_flows(&self, flows: &[FlowRecord]) {
        Self::emit(flows);
    }

    fn present_flow(&self, flow: &FlowRecord) {
        Self::emit(flow);
    }

    fn present_report(&self, report: &PlaybackReport) {
        Self::emit(report);
    }

    fn present_code(&self, code: &GeneratedCode) {
        Self::emit(code);
    }
}

//! CLI application layer and composition root wiring.

use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use clap_complete::generate;
use tracing::debug;
use tracing::info;
use tracing::warn;
use url::Url;

pub mod api;
pub mod commands;
pub mod error;

use crate::adapters::ErrorPayload;
use crate::adapters::Presenter;
use crate::adapters::create_presenter;
use crate::app::api::ApiConfig;
use crate::app::api::ApiServerError;
use crate::app::api::start_api_server;
use crate::app::commands::Cli;
use crate::app::commands::Commands;
use crate::app::commands::FlowsCommand;
use crate::app::commands::OutputFormat;
use crate::app::error::CliError;
use crate::common::ErrorCategory;
use crate::common::error_codes::exit_codes;
use crate::common::telemetry;
use crate::domain::CodeLanguage;
use crate::domain::CodeLanguageParseError;
use crate::infra::backend::BackendClient;
use crate::infra::backend::BackendSetupError;
use crate::infra::clock::SystemClock;
use crate::infra::clock::ThreadSleeper;
use crate::infra::config::RecorderConfig;
use crate::infra::push::WsPushChannel;
use crate::usecases::ControllerSettings;
use crate::usecases::DeleteFlowUseCase;
use crate::usecases::DeleteFlowUseCaseImpl;
use crate::usecases::FlowCodeInput;
use crate::usecases::FlowCodeUseCase;
use crate::usecases::FlowCodeUseCaseImpl;
use crate::usecases::ListDevicesUseCase;
use crate::usecases::ListDevicesUseCaseImpl;
use crate::usecases::ListFlowsUseCase;
use crate::usecases::ListFlowsUseCaseImpl;
use crate::usecases::RecordingSessionController;
use crate::usecases::RunPlaybackUseCase;
use crate::usecases::RunPlaybackUseCaseImpl;
use crate::usecases::SessionServices;
use crate::usecases::ShowFlowUseCase;
use crate::usecases::ShowFlowUseCaseImpl;
use crate::usecases::ports::ServiceError;

const PROGRAM_NAME: &str = "tapflow";
const SERVE_POLL: Duration = Duration::from_millis(200);

/// Invalid push channel URL from configuration.
#[derive(Debug, thiserror::Error)]
#[error("invalid push URL '{url}': {source}")]
struct PushUrlError {
    url: String,
    #[source]
    source: url::ParseError,
}

pub struct Application;

impl Application {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self) -> Result<i32> {
        let exit_code = match self.execute() {
            Ok(()) => exit_codes::SUCCESS,
            Err(e) => self.handle_error(e),
        };
        Ok(exit_code)
    }

    fn execute(&self) -> Result<()> {
        let cli = Cli::parse();
        let settings =
            telemetry::TelemetrySettings::from_env(if cli.verbose { "debug" } else { "warn" });
        let _telemetry = telemetry::init_tracing(&settings);
        let format = cli.effective_format();
        debug!(command = ?cli.command, format = ?format, "CLI command parsed");

        let presenter = create_presenter(format);
        self.dispatch_command(&cli.command, presenter.as_ref())
            .map_err(|e| self.wrap_error(e, format))
            .with_context(|| format!("failed to execute command {:?}", cli.command))
    }

    fn dispatch_command(&self, command: &Commands, presenter: &dyn Presenter) -> Result<()> {
        if let Commands::Completions { shell } = command {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, PROGRAM_NAME, &mut io::stdout());
            return Ok(());
        }

        let config = RecorderConfig::from_env();
        match command {
            Commands::Serve { listen } => self.serve(&config, *listen, presenter),
            Commands::Devices { all } => {
                let backend = connect_backend(&config)?;
                let devices = ListDevicesUseCaseImpl::new(backend).execute()?;
                let devices: Vec<_> = devices
                    .into_iter()
                    .filter(|device| *all || device.is_connected)
                    .collect();
                presenter.present_devices(&devices);
                Ok(())
            }
            Commands::Flows(flows) => {
                let backend = connect_backend(&config)?;
                match flows {
                    FlowsCommand::List => {
                        let flows = ListFlowsUseCaseImpl::new(backend).execute()?;
                        presenter.present_flows(&flows);
                    }
                    FlowsCommand::Show { flow_id } => {
                        let flow = ShowFlowUseCaseImpl::new(backend).execute(*flow_id)?;
                        presenter.present_flow(&flow);
                    }
                    FlowsCommand::Delete { flow_id } => {
                        DeleteFlowUseCaseImpl::new(backend).execute(*flow_id)?;
                        presenter.present_success(&format!("Flow {flow_id} deleted"));
                    }
                }
                Ok(())
            }
            Commands::Codegen {
                flow_id,
                language,
                out,
            } => {
                let language: CodeLanguage = language.parse()?;
                let backend = connect_backend(&config)?;
                let usecase = FlowCodeUseCaseImpl::new(Arc::clone(&backend), backend);
                let code = usecase.execute(FlowCodeInput {
                    flow_id: *flow_id,
                    language,
                })?;
                match out {
                    Some(path) => {
                        write_source(path, &code.source)?;
                        presenter.present_success(&format!(
                            "Wrote {} test for flow {flow_id} to {}",
                            code.language,
                            path.display()
                        ));
                    }
                    None => presenter.present_code(&code),
                }
                Ok(())
            }
            Commands::Playback { flow_id, device } => {
                let backend = connect_backend(&config)?;
                let report = RunPlaybackUseCaseImpl::new(backend).execute(*flow_id, device)?;
                presenter.present_report(&report);
                Ok(())
            }
            Commands::Completions { .. } => Ok(()),
        }
    }

    fn serve(
        &self,
        config: &RecorderConfig,
        listen: Option<SocketAddr>,
        presenter: &dyn Presenter,
    ) -> Result<()> {
        let backend = connect_backend(config)?;
        let services = session_services(config, backend)?;
        let settings = ControllerSettings {
            screenshot_interval: config.screenshot_interval(),
            hover_throttle: config.hover_throttle(),
            launch_settle: config.launch_settle(),
        };
        let controller = Arc::new(
            RecordingSessionController::new(services, settings)
                .context("failed to start recording session workers")?,
        );

        let shutdown = Arc::new(AtomicBool::new(false));
        #[cfg(unix)]
        let _signals = crate::infra::signal_handler::SignalHandler::setup(
            Arc::clone(&shutdown),
            || {},
        )
        .context("failed to install signal handlers")?;

        let api_config = ApiConfig {
            listen: listen.unwrap_or(config.api_listen()),
            max_ws_connections: config.api_max_connections(),
        };
        let server = start_api_server(Arc::clone(&controller), Arc::clone(&shutdown), api_config)?;
        info!(
            addr = %server.local_addr(),
            backend = config.backend_url(),
            push = config.push_url(),
            "Recorder API started"
        );
        presenter.present_success(&format!(
            "Recorder API listening on http://{}",
            server.local_addr()
        ));

        while !shutdown.load(Ordering::SeqCst) {
            thread::sleep(SERVE_POLL);
        }

        server.shutdown();
        if let Err(err) = controller.reset() {
            warn!(error = %err, "Failed to release the recording session on shutdown");
        }
        info!("Recorder API stopped");
        Ok(())
    }

    fn handle_error(&self, e: anyhow::Error) -> i32 {
        if let Some(cli_error) = find_error::<CliError>(&e) {
            create_presenter(cli_error.format).present_error(&cli_error.payload);
            return cli_error.exit_code;
        }
        let payload = ErrorPayload::new(
            e.to_string(),
            ErrorCategory::Internal.as_str(),
            "Re-run with --verbose for details.",
        );
        create_presenter(OutputFormat::Text).present_error(&payload);
        exit_codes::GENERAL_ERROR
    }

    fn wrap_error(&self, error: anyhow::Error, format: OutputFormat) -> anyhow::Error {
        if find_error::<CliError>(&error).is_some() {
            return error;
        }
        let (payload, exit_code) = classify_error(&error);
        anyhow::Error::new(CliError::new(format, payload, exit_code))
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

fn classify_error(error: &anyhow::Error) -> (ErrorPayload, i32) {
    if let Some(service_error) = find_error::<ServiceError>(error) {
        return (
            ErrorPayload::from(service_error),
            service_error.category().exit_code(),
        );
    }
    if let Some(parse_error) = find_error::<CodeLanguageParseError>(error) {
        return (
            ErrorPayload::new(
                parse_error.to_string(),
                ErrorCategory::InvalidInput.as_str(),
                "Pass --language javascript or --language python.",
            ),
            exit_codes::USAGE,
        );
    }
    if let Some(setup_error) = find_error::<BackendSetupError>(error) {
        return (
            ErrorPayload::new(
                setup_error.to_string(),
                ErrorCategory::InvalidInput.as_str(),
                "Check TAPFLOW_BACKEND_URL.",
            ),
            exit_codes::USAGE,
        );
    }
    if let Some(url_error) = find_error::<PushUrlError>(error) {
        return (
            ErrorPayload::new(
                url_error.to_string(),
                ErrorCategory::InvalidInput.as_str(),
                "Check TAPFLOW_PUSH_URL.",
            ),
            exit_codes::USAGE,
        );
    }
    if let Some(api_error) = find_error::<ApiServerError>(error) {
        return (
            ErrorPayload::new(
                api_error.to_string(),
                ErrorCategory::Internal.as_str(),
                "Make sure the listen address is free or pick another with --listen.",
            ),
            exit_codes::IOERR,
        );
    }
    if let Some(io_error) = find_error::<io::Error>(error) {
        return (
            ErrorPayload::new(
                format!("{error:#}"),
                ErrorCategory::Internal.as_str(),
                format!("Check file permissions and disk space ({}).", io_error.kind()),
            ),
            exit_codes::IOERR,
        );
    }
    (
        ErrorPayload::new(
            format!("{error:#}"),
            ErrorCategory::Internal.as_str(),
            "Re-run with --verbose for details.",
        ),
        exit_codes::GENERAL_ERROR,
    )
}

fn connect_backend(config: &RecorderConfig) -> Result<Arc<BackendClient>> {
    let client = BackendClient::new(config.backend_url(), config.http_timeout())?;
    debug!(base_url = %client.base_url(), "Backend client ready");
    Ok(Arc::new(client))
}

fn session_services(
    config: &RecorderConfig,
    backend: Arc<BackendClient>,
) -> Result<SessionServices> {
    let push_url = Url::parse(config.push_url()).map_err(|source| PushUrlError {
        url: config.push_url().to_string(),
        source,
    })?;
    Ok(SessionServices {
        catalog: backend.clone(),
        installer: backend.clone(),
        session: backend.clone(),
        executor: backend.clone(),
        monitor: backend.clone(),
        inspector: backend.clone(),
        push: Arc::new(WsPushChannel::new(push_url)),
        flows: backend.clone(),
        playback: backend.clone(),
        codegen: backend,
        clock: Arc::new(SystemClock),
        sleeper: Arc::new(ThreadSleeper),
    })
}

fn write_source(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, source).with_context(|| format!("failed to write {}", path.display()))
}

fn find_error<T: std::error::Error + 'static>(error: &anyhow::Error) -> Option<&T> {
    error.chain().find_map(|e| e.downcast_ref::<T>())
}

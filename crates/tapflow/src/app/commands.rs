use clap::Parser;
use clap::Subcommand;
use clap::ValueHint;
pub use clap_complete::Shell;
use std::path::PathBuf;

pub use crate::adapters::OutputFormat;

const AFTER_HELP: &str =
    "Use --help for full details and examples. Use --format json for machine-readable output.";

const LONG_ABOUT: &str = "\
Record device UI interactions into replayable test flows.\n\
\n\
Common flow: serve -> select device -> analyze APK -> install -> launch -> record -> save \
-> playback.\n\
Use --format json for automation-friendly output.";

const AFTER_LONG_HELP: &str = r#"WORKFLOW:
    1. Start the recorder API with `tapflow serve`
    2. Drive the wizard from the UI (device, APK, install, launch)
    3. Record taps, swipes and inspector clicks on the mirrored screen
    4. Save the flow and play it back

CONFIGURATION:
    TAPFLOW_BACKEND_URL   Automation backend (default http://localhost:8000)
    TAPFLOW_PUSH_URL      Realtime feed (default ws://localhost:8000/ws/realtime)
    TAPFLOW_API_LISTEN    UI API address (default 127.0.0.1:7070)

EXAMPLES:
    tapflow serve
    tapflow devices --json
    tapflow flows list
    tapflow codegen 12 --language python --out login_test.py
    tapflow playback 12 --device emulator-5554"#;

#[derive(Parser)]
#[command(name = "tapflow")]
#[command(author, version, propagate_version = true)]
#[command(about = "Guided recorder that turns device interactions into replayable test flows")]
#[command(long_about = LONG_ABOUT)]
#[command(after_help = AFTER_HELP)]
#[command(after_long_help = AFTER_LONG_HELP)]
#[command(subcommand_required = true, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(
        short,
        long,
        global = true,
        value_enum,
        value_name = "FORMAT",
        default_value_t = OutputFormat::Text,
        help_heading = "Output Options"
    )]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true, help_heading = "Output Options")]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true, help_heading = "Debug Options")]
    pub verbose: bool,
}

impl Cli {
    pub fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the recording session behind the local UI API
    #[command(long_about = "\
Run the recording session controller behind a local HTTP/WebSocket API.

The UI drives the wizard through POST /api/v1/intents and follows state
changes on the /api/v1/events WebSocket. Stop with Ctrl-C.")]
    Serve {
        /// Address to listen on (overrides TAPFLOW_API_LISTEN)
        #[arg(long, value_name = "ADDR")]
        listen: Option<std::net::SocketAddr>,
    },

    /// List devices known to the backend
    Devices {
        /// Include devices that are not connected
        #[arg(long)]
        all: bool,
    },

    /// Manage saved flows
    #[command(subcommand)]
    Flows(FlowsCommand),

    /// Generate test source for a saved flow
    #[command(after_long_help = "\
EXAMPLES:
    tapflow codegen 12
    tapflow codegen 12 --language python --out login_test.py")]
    Codegen {
        #[arg(value_name = "FLOW_ID")]
        flow_id: i64,

        /// Target language (javascript or python)
        #[arg(short, long, default_value = "javascript")]
        language: String,

        /// Write the source to a file instead of stdout
        #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },

    /// Play a saved flow back on a device
    Playback {
        #[arg(value_name = "FLOW_ID")]
        flow_id: i64,

        /// Device to run on
        #[arg(short, long, value_name = "DEVICE_ID")]
        device: String,
    },

    /// Generate shell completion scripts
    #[command(after_long_help = "\
EXAMPLES:
    tapflow completions bash > ~/.local/share/bash-completion/completions/tapflow
    tapflow completions zsh > ~/.zfunc/_tapflow")]
    Completions {
        #[arg(value_enum, value_name = "SHELL")]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum FlowsCommand {
    /// List saved flows
    List,

    /// Show a saved flow and its steps
    Show {
        #[arg(value_name = "FLOW_ID")]
        flow_id: i64,
    },

    /// Delete a saved flow
    Delete {
        #[arg(value_name = "FLOW_ID")]
        flow_id: i64,
    },
}

//! CLI definitions for cmdmock
//!
//! Kept in the library so the argument surface can be parsed in tests
//! without spawning the binary.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand, ValueEnum};

use crate::replayer::Pacing;

pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser, Debug)]
#[command(name = "cmdmock")]
#[command(about = "Record a command's output and exit code, then replay it with the original timing")]
#[command(long_about = "cmdmock records everything a command writes to stdout and stderr,
when it wrote it, and how it exited. The recording can be replayed later as a
stand-in for the real command, reproducing output, timing and exit code.

EXAMPLES:
    cmdmock record ls-tmp -- ls -la /tmp      Record into ./ls-tmp.json
    cmdmock replay ls-tmp                     Replay it, exiting like ls did
    cmdmock -o fixtures record slow -- make   Store under ./fixtures/")]
#[command(version)]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Directory recordings are stored in [default: from config, else ./]
    #[arg(
        short = 'o',
        long = "output-dir",
        alias = "outputDir",
        global = true,
        value_name = "DIR"
    )]
    pub output_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command and record its output and exit code
    #[command(long_about = "Run a command and record its output and exit code.

The command runs with this terminal's stdin. Its output is shown while
recording unless --quiet is given. A command that exits non-zero is
recorded normally; only failing to launch it is an error.

EXAMPLES:
    cmdmock record greet -- echo hello
    cmdmock record build --quiet -- cargo build
    cmdmock record greet --force -- echo hello again")]
    Record {
        /// Name of the recording (.json is added if there is no extension)
        name: String,
        /// Do not echo the command's output while recording
        #[arg(short, long)]
        quiet: bool,
        /// Overwrite an existing recording
        #[arg(short, long)]
        force: bool,
        /// Command to record, followed by its arguments (after --)
        #[arg(last = true, required = true, value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Replay a recording, exiting with the recorded exit code
    Replay {
        /// Name of the recording to replay
        name: String,
        /// How waits between outputs are timed [default: from config, else relative]
        #[arg(long, value_enum)]
        pacing: Option<PacingArg>,
    },
}

/// Command-line spelling of [`Pacing`].
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacingArg {
    /// Wait the recorded gap between consecutive outputs
    Relative,
    /// Schedule every output against the replay start
    Absolute,
}

impl From<PacingArg> for Pacing {
    fn from(arg: PacingArg) -> Self {
        match arg {
            PacingArg::Relative => Pacing::Relative,
            PacingArg::Absolute => Pacing::Absolute,
        }
    }
}

// CLI definitions using clap derive API
//
// `upload` is the default command: running the binary without a subcommand
// parses the upload flags from the top level, so `bundle-uploader --dir x`
// and `bundle-uploader upload --dir x` are equivalent. Top-level upload flags
// next to a subcommand are rejected; `--verbose` is accepted anywhere.

use crate::config::{
    ConvertConfig, UploadConfig, DEFAULT_BUNDLES_DIR, DEFAULT_DATA_PATH, DEFAULT_ENDPOINT,
    DEFAULT_OUT_DIR,
};
use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Ids of the flattened top-level `UploadArgs`.
const TOP_LEVEL_UPLOAD_FLAGS: [&str; 4] = ["dir", "url", "timeout", "no_progress"];

/// Upload FHIR bundle files to a FHIR endpoint, one POST per file.
#[derive(Parser, Debug)]
#[command(
    name = "bundle-uploader",
    version,
    about = "Upload FHIR bundle files to a FHIR endpoint, one POST per file"
)]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub upload: UploadArgs,
}

impl Cli {
    /// Parse `std::env::args_os`, exiting with clap's usage error on failure.
    pub fn parse_args() -> Self {
        Self::try_parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Parse like `try_parse_from`, additionally refusing top-level upload
    /// flags given on the command line together with a subcommand.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut cmd = Self::command();
        let matches = cmd.try_get_matches_from_mut(args)?;

        if let Some(sub) = matches.subcommand_name() {
            let misplaced = TOP_LEVEL_UPLOAD_FLAGS
                .iter()
                .find(|id| matches.value_source(id) == Some(ValueSource::CommandLine));
            if let Some(id) = misplaced {
                let sub = sub.to_string();
                return Err(cmd.error(
                    ErrorKind::ArgumentConflict,
                    format!(
                        "'--{}' cannot be used before the '{}' subcommand; pass it to 'upload' instead",
                        id.replace('_', "-"),
                        sub
                    ),
                ));
            }
        }

        Self::from_arg_matches(&matches).map_err(|e| e.format(&mut cmd))
    }

    /// The command to run, falling back to `upload` with the top-level flags.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Upload(self.upload))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// POST every file in the bundles directory to the endpoint (default)
    Upload(UploadArgs),
    /// Convert a cBioPortal clinical data TSV into FHIR transaction bundles
    Convert(ConvertArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// Directory whose entries are uploaded
    #[arg(long, short = 'd', env = "BUNDLES_DIR", default_value = DEFAULT_BUNDLES_DIR)]
    pub dir: PathBuf,

    /// Destination URL for every POST
    #[arg(long, short = 'u', env = "FHIR_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub url: String,

    /// Per-request timeout in seconds (no timeout when unset)
    #[arg(long, env = "UPLOAD_TIMEOUT_SECS")]
    pub timeout: Option<u64>,

    /// Do not draw the progress spinner on stderr
    #[arg(long)]
    pub no_progress: bool,
}

impl UploadArgs {
    pub fn into_config(self) -> UploadConfig {
        UploadConfig {
            bundles_dir: self.dir,
            endpoint: self.url,
            timeout: self.timeout.map(Duration::from_secs),
            show_progress: !self.no_progress,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Tab-separated clinical data export
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// Directory the bundle files are written to
    #[arg(long, short = 'o', default_value = DEFAULT_OUT_DIR)]
    pub out: PathBuf,

    /// Id of an already created ResearchStudy. Without it only study.json is written.
    #[arg(long)]
    pub research_study_id: Option<String>,
}

impl ConvertArgs {
    pub fn into_config(self) -> ConvertConfig {
        ConvertConfig {
            data_path: self.data,
            out_dir: self.out,
            research_study_id: self.research_study_id,
        }
    }
}

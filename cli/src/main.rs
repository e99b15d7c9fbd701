use std::path::PathBuf;

use clap::{CommandFactory, Parser};

mod handlers;

use handlers::utils::WriteAdapter;
use ornitag_core::{
    config::Settings,
    logger::{init_logger, init_tracing},
};

/// Options configurable via the CLI.
#[derive(Debug, Parser)]
#[command(name = "ornitag", version = env!("CARGO_PKG_VERSION"), about)]
struct Flags {
    /// Directory of photos, laid out as `<bird code>/<tag code>/photo.jpg`
    #[clap(value_hint = clap::ValueHint::DirPath)]
    directory: PathBuf,
    /// File holding the photo service auth token
    #[clap(long, short = 't', value_hint = clap::ValueHint::FilePath)]
    token_file: Option<PathBuf>,
    /// The metadata spreadsheet [default: `birds.xlsx` inside the photo directory]
    #[clap(long, value_hint = clap::ValueHint::FilePath)]
    spreadsheet: Option<PathBuf>,
    /// config file path
    #[clap(long, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,
    /// Go through the motions without changing anything on the photo service
    #[clap(long, short = 'n')]
    dry_run: bool,
    /// Photos are laid out as `<tag code>/<bird code>/photo.jpg` instead
    #[clap(long, short = 's')]
    swap: bool,
    /// Only check that every photo matches the spreadsheet, then exit
    #[clap(long, short = 'c', alias = "validate")]
    check: bool,
    /// Print debug logs
    #[clap(long, short = 'v')]
    verbose: bool,
    /// Print trace logs, and the timing of every upload step
    #[clap(long, conflicts_with = "verbose")]
    trace: bool,
}

impl Flags {
    const fn log_level(&self) -> Option<log::LevelFilter> {
        if self.trace {
            Some(log::LevelFilter::Trace)
        } else if self.verbose {
            Some(log::LevelFilter::Debug)
        } else {
            None
        }
    }
}

#[test]
fn verify_cli() {
    Flags::command().debug_assert();
}

#[cfg(not(tarpaulin_include))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    clap_complete::CompleteEnv::with_factory(Flags::command).complete();

    let flags = Flags::parse();

    let config_file = match &flags.config {
        Some(config) => config.clone(),
        None => Settings::get_config_path()?,
    };
    let settings = Settings::init(config_file, flags.token_file.clone(), flags.log_level())?;

    init_logger(settings.upload.log_level);
    tracing::subscriber::set_global_default(init_tracing(flags.trace))?;

    let mut stdout_adapter = WriteAdapter(std::io::stdout());
    let mut stderr_adapter = WriteAdapter(std::io::stderr());

    handlers::run(&flags, &settings, &mut stdout_adapter, &mut stderr_adapter).await
}

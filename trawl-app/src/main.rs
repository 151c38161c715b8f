use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use trawl_app::{Cli, Outcome, execute};
use trawl_common::TrawlError;
use trawl_common::observability::{LogConfig, LogFormat, init_logging};
use trawl_config::{Credentials, LogSettings, TrawlConfigLoader};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (path, required) = cli.config_source();
    let outcome = match TrawlConfigLoader::new().with_file(&path, required).load() {
        Ok(config) => {
            start_logging(&config.log);
            tracing::info!(config = %path.display(), "trawl.start");
            execute(cli.plan(), config.twitter, Credentials::from_env()).await
        }
        Err(err) => {
            start_logging(&LogSettings::default());
            tracing::error!(config = %path.display(), error = %err, "trawl.config_failed");
            Outcome::Failed(TrawlError::Config(err.to_string()))
        }
    };

    println!("{}", outcome.render());
    ExitCode::from(outcome.exit_code())
}

fn start_logging(settings: &LogSettings) {
    let config = LogConfig {
        log_dir: settings.dir.as_ref().map(PathBuf::from),
        emit_stderr: settings.stderr,
        format: LogFormat::from_name(&settings.format),
        default_filter: settings.filter.clone(),
        ..LogConfig::default()
    };
    // stdout carries the result, so logging problems go to stderr only
    if let Err(err) = init_logging(config) {
        eprintln!("trawl: logging disabled: {err:#}");
    }
}

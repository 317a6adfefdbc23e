use crate::{Error, Result};
use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Hook output goes to stderr so Juju captures it in the unit log
pub fn init(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| Error::Other(format!("invalid log filter: {e}")))?;
    let collector = Registry::default().with(env_filter);
    match format {
        LogFormat::Text => {
            let logger = fmt::layer().with_writer(std::io::stderr).with_ansi(false);
            tracing::subscriber::set_global_default(collector.with(logger))
        }
        LogFormat::Json => {
            let logger = fmt::layer().json().with_writer(std::io::stderr);
            tracing::subscriber::set_global_default(collector.with(logger))
        }
    }
    .map_err(|e| Error::Other(format!("cannot install the tracing subscriber: {e}")))
}

use clap::{Parser, Subcommand};
use controller::{dispatch, telemetry};
use std::process;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Parameters {
    /// Log output format
    #[arg(long = "log-format", env = "LOG_FORMAT", value_enum, default_value_t = telemetry::LogFormat::Text, global = true)]
    log_format: telemetry::LogFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Handle the hook Juju is currently running
    Dispatch(dispatch::Parameters),
    /// Print the operator version
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Parameters::parse();
    if let Err(e) = telemetry::init(args.log_format) {
        eprintln!("{e}");
        process::exit(1)
    }
    match &args.command {
        Commands::Dispatch(args) => dispatch::run(args).await.unwrap_or_else(|e| {
            tracing::error!("Dispatch failed with: {e:}");
            process::exit(1)
        }),
        Commands::Version => println!("{}", common::VERSION),
    }
}

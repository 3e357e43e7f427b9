//! `logcensor` - CLI for the secret censor
//!
//! This binary censors configured log and artifact locations in place, or
//! filters stdin to stdout.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;

use anyhow::Context;
use clap::Parser;

use logcensor::cli::{Cli, Command, ConfigCommand, RunCommand, StreamCommand};
use logcensor::{
    censor, init_logging, Config, DirectorySecretLoader, Redactor, SecretLoader, SecretRegistry,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Run(run_cmd) => handle_run(config, &run_cmd),
        Command::Stream(stream_cmd) => handle_stream(config, &stream_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn handle_run(mut config: Config, cmd: &RunCommand) -> anyhow::Result<()> {
    cmd.apply(&mut config);
    config.validate()?;

    let redactor = Redactor::new(config.censoring_config());

    let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    let summary = runtime.block_on(redactor.censor_all())?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Secrets loaded:  {}", summary.secrets);
        println!("Files censored:  {}", summary.files);
        println!("Bytes processed: {}", summary.bytes);
        println!("Redactions:      {}", summary.redactions);
    }
    Ok(())
}

fn handle_stream(mut config: Config, cmd: &StreamCommand) -> anyhow::Result<()> {
    cmd.secrets.apply(&mut config);
    config.validate()?;

    let secrets = DirectorySecretLoader::new()
        .with_base64(config.secrets.include_base64)
        .load(&config.secrets.directories)?;
    let registry = SecretRegistry::with_secrets(&secrets)?;

    let buffer_size = config.censoring_config().buffer_size();
    censor(io::stdin().lock(), io::stdout().lock(), &registry, buffer_size)
        .context("failed to censor stdin")?;
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Targets]");
                for path in &config.targets.artifacts {
                    println!("  Artifact:           {}", path.display());
                }
                for path in &config.targets.process_logs {
                    println!("  Process log:        {}", path.display());
                }
                println!();
                println!("[Secrets]");
                for dir in &config.secrets.directories {
                    println!("  Directory:          {}", dir.display());
                }
                println!("  Include base64:     {}", config.secrets.include_base64);
                println!();
                println!("[Censor]");
                println!(
                    "  Buffer size:        {}",
                    config.censoring_config().buffer_size()
                );
                println!("  Concurrency:        {}", config.censor.concurrency);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path)).context("configuration is invalid")?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use sessionreg_cli::cli::{Api, Cli};
use sessionreg_cli::config::Config;
use sessionreg_cli::error::AppError;
use sessionreg_cli::runner::run_pass;
use sessionreg_core::{LogMode, init_tracing};
use sessionreg_gateways::{GoogleGateway, GraphGateway};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_mode = if cli.debug {
        LogMode::Debug
    } else if cli.json_logs {
        LogMode::Batch
    } else {
        LogMode::Interactive
    };
    if let Err(error) = init_tracing(log_mode) {
        eprintln!("failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(error = ?error, "pass aborted");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let config = Config::load(&cli.config)?;
    let template =
        fs::read_to_string(&config.mail.template).map_err(|source| AppError::Template {
            path: config.mail.template.clone(),
            source,
        })?;
    let recipient = cli.receiver.as_deref().unwrap_or(&config.mail.to);

    match cli.api {
        Api::Graph => {
            let gateway = GraphGateway::new(cli.token.clone());
            run_pass(&gateway, &gateway, &gateway, &config, recipient, &template)?;
        }
        Api::Google => {
            let gateway = GoogleGateway::new(cli.token.clone());
            run_pass(&gateway, &gateway, &gateway, &config, recipient, &template)?;
        }
    }
    Ok(())
}

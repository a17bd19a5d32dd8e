use std::process::ExitCode;

use clap::Parser;

use mdview::{batch, server, Cli, Config, Logger};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = Logger::init() {
        eprintln!("cannot install logger: {e}");
    }

    let cli = Cli::parse();
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            log::error!("Cannot determine the working directory: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = Config::from_cli(&cli, cwd);

    if let Some(output) = &cli.output {
        return match batch::run(&config.file_service(), &config.renderer(), &cli.masks, output) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    match server::run(&config, &cli.masks).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

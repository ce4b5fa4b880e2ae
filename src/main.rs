// src/main.rs

use std::process::ExitCode;

use bunny::{cli, logging, run, RunStatus};

#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(RunStatus::Success) => ExitCode::SUCCESS,
        Ok(RunStatus::BuildFailed) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("bunny error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run_main() -> anyhow::Result<RunStatus> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    Ok(run(args).await?)
}

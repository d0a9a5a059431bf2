use queue_keeper_cli::run_cli;
use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        error!("CLI error: {}", e);

        let exit_code = match e {
            queue_keeper_cli::CliError::Configuration(_) => 1,
            queue_keeper_cli::CliError::HealthCheckFailed { .. } => 2,
            queue_keeper_cli::CliError::Io(_) => 3,
        };

        std::process::exit(exit_code);
    }
}

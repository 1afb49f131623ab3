use breach_scout_cli::run_cli;
use tracing::error;

#[tokio::main]
async fn main() {
    // Run CLI and handle errors
    if let Err(e) = run_cli().await {
        error!("CLI error: {}", e);

        // Exit with appropriate code based on error type
        let exit_code = match e {
            breach_scout_cli::CliError::Configuration(_) => 1,
            breach_scout_cli::CliError::Request(_) => 2,
            breach_scout_cli::CliError::ServiceRejected { .. } => 3,
            breach_scout_cli::CliError::InvalidArgument { .. } => 4,
            breach_scout_cli::CliError::Io(_) => 5,
            breach_scout_cli::CliError::Output { .. } => 6,
        };

        std::process::exit(exit_code);
    }
}

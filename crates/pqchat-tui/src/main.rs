//! pqchat TUI entry point.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use pqchat_tui::{BackendConfig, Runtime, logging};

/// pqchat terminal client
#[derive(Parser, Debug)]
#[command(name = "pqchat")]
#[command(about = "Terminal UI for the pqchat encrypted chat backend")]
#[command(version)]
struct Args {
    /// Backend executable to spawn
    #[arg(short, long, default_value = "../core/client")]
    backend: String,

    /// Argument passed through to the backend (repeatable)
    #[arg(long = "backend-arg", value_name = "ARG", allow_hyphen_values = true)]
    backend_args: Vec<String>,

    /// Write logs to this file
    ///
    /// Logging is disabled without it, since stdout belongs to the UI.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref(), &args.log_level)?;

    let config = BackendConfig { program: args.backend, args: args.backend_args };
    let code = Runtime::start(&config)?.run().await?;

    Ok(exit_code(code))
}

/// Map a backend exit code onto a process exit code.
fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn backend_args_pass_through() {
        let args = Args::parse_from([
            "pqchat",
            "--backend",
            "./client",
            "--backend-arg",
            "--server",
            "--backend-arg",
            "localhost:8080",
        ]);
        assert_eq!(args.backend, "./client");
        assert_eq!(args.backend_args, vec!["--server", "localhost:8080"]);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(0), ExitCode::SUCCESS);
        assert_eq!(exit_code(-1), ExitCode::FAILURE);
    }
}

use clap::Parser;
use fxcli::core::log::init_logging;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long)]
    config_path: Option<String>,

    /// <amount> <from> <to>, e.g. `10 usd btc`
    #[arg(value_name = "ARGS", num_args = 0.., allow_negative_numbers = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut stdout = std::io::stdout();
    match fxcli::run(&cli.args, cli.config_path.as_deref(), &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Application failed");
            eprintln!("Error: {e:#}");
            ExitCode::from(fxcli::exit_code(&e))
        }
    }
}

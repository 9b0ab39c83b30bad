use clap::Parser;
use colored::Colorize;

use surveyhub::cli::Cli;
use surveyhub::config::init_config_from;
use surveyhub::runtime::modes::{Mode, detect_mode};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_from(&cli.config);

    match detect_mode(cli.command.as_ref()) {
        #[cfg(feature = "server")]
        Mode::Server => {
            let config = surveyhub::config::get_config();
            let _guard = surveyhub::system::init_logging(&config.logging)?;
            if let Err(e) = surveyhub::runtime::modes::run_server().await {
                eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
                std::process::exit(1);
            }
        }
        #[cfg(feature = "cli")]
        Mode::Cli => {
            let Some(command) = cli.command else {
                return Ok(());
            };
            if let Err(e) = surveyhub::runtime::modes::run_cli(command).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
        }
        #[allow(unreachable_patterns)]
        mode => {
            eprintln!(
                "{} mode {:?} is not enabled in this build",
                "[ERROR]".red().bold(),
                mode
            );
            std::process::exit(2);
        }
    }

    Ok(())
}

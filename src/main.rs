use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use sop_manager::cli::{Cli, Commands};
use sop_manager::config::{get_config, init_config};
use sop_manager::runtime::modes::{run_cli, run_server};
use sop_manager::system::logging::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_config(Some(&cli.config));

    match cli.command() {
        Commands::Serve => {
            let config = get_config();
            // guard 必须存活到进程结束
            let _log_guard = init_logging(&config.logging)?;
            info!(
                "sop-manager {} starting (config: {})",
                env!("CARGO_PKG_VERSION"),
                cli.config
            );
            run_server().await.inspect_err(|e| error!("{:#}", e))
        }
        command => {
            if let Err(e) = run_cli(command).await {
                eprintln!("{}", e);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

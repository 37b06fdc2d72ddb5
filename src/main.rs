use anyhow::Result;
use env_logger::Env;
use log::{info, warn};
use std::path::Path;

use modemu_rust::cli::{build_cli, handle_subcommands};
use modemu_rust::config::Config;
use modemu_rust::services::{EmulatorHandler, SlaveServer};
use modemu_rust::storage::DataTableStore;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let default_filter = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("🖥️  Modbus/TCP Slave Emulator v{}", modemu_rust::VERSION);

    if handle_subcommands(&matches)? {
        return Ok(());
    }

    let config_path = matches.get_one::<String>("config").expect("has default");
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("⚠️  {} not found, using built-in defaults", config_path);
        Config::default()
    };
    config.apply_matches(&matches)?;

    let store = DataTableStore::from_config(&config.tables)?;
    let mut server = SlaveServer::new(config, EmulatorHandler::new(store));

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("👋 Shutdown requested, closing listener"),
    }
    Ok(())
}

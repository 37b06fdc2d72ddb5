use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::Path;

use crate::config::Config;
use crate::storage::DataTableStore;
use crate::utils::error::ModbusError;

pub fn build_cli() -> Command {
    Command::new("modemu_rust")
        .version(crate::VERSION)
        .about("Configurable Modbus/TCP slave emulator")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .default_value("modemu.json")
                .help("Path to the JSON configuration document"),
        )
        .arg(
            Arg::new("listen-address")
                .short('l')
                .long("listen-address")
                .value_name("ADDR")
                .help("Override listenAddress from the config"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Override listenPort from the config"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Debug logging, including per-exchange hex dumps"),
        )
        .subcommand(Command::new("init").about("Write a default configuration file and exit"))
        .subcommand(Command::new("check").about("Validate a configuration file and exit"))
}

/// Handle `init` / `check`. Returns true when a subcommand ran and the
/// process should exit instead of starting the server.
pub fn handle_subcommands(matches: &ArgMatches) -> Result<bool, ModbusError> {
    let config_path = matches.get_one::<String>("config").expect("has default");

    if matches.subcommand_matches("init").is_some() {
        if Path::new(config_path).exists() {
            return Err(ModbusError::ConfigError(format!(
                "{} already exists, refusing to overwrite",
                config_path
            )));
        }
        Config::default().save_to_file(config_path)?;
        println!("✅ Wrote default configuration to {}", config_path);
        return Ok(true);
    }

    if matches.subcommand_matches("check").is_some() {
        let config = Config::from_file(config_path)?;
        // seeding exercises address keys and value clamping
        let _ = DataTableStore::from_config(&config.tables)?;
        println!(
            "✅ {} is valid: will listen on {}, {} seeded cells",
            config_path,
            config.socket_addr(),
            config.tables.cell_count()
        );
        return Ok(true);
    }

    Ok(false)
}

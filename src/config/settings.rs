use clap::ArgMatches;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use crate::utils::error::ModbusError;

/// Emulator configuration, loaded from a JSON document (`modemu.json` by
/// convention). Key casing follows the wire document, not Rust.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub listen_address: String,
    pub listen_port: u16,

    #[serde(default)]
    pub tables: TablesConfig,
}

/// Initial cell values per table: string-decimal address -> integer value.
/// Discrete values clamp to {0,1}, analog values outside 0..=65535 collapse
/// to 0 at seeding time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TablesConfig {
    pub discrete_output_coils: HashMap<String, i64>,
    pub discrete_input_contacts: HashMap<String, i64>,
    pub analog_output_registers: HashMap<String, i64>,
    pub analog_input_registers: HashMap<String, i64>,
}

impl TablesConfig {
    pub fn cell_count(&self) -> usize {
        self.discrete_output_coils.len()
            + self.discrete_input_contacts.len()
            + self.analog_output_registers.len()
            + self.analog_input_registers.len()
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut holding = HashMap::new();
        holding.insert("0".to_string(), 10);
        holding.insert("1".to_string(), 18);
        holding.insert("2".to_string(), 52);

        let mut coils = HashMap::new();
        coils.insert("0".to_string(), 1);

        Self {
            listen_address: "0.0.0.0".to_string(),
            // 502 needs root, so the default stays in user space
            listen_port: 1502,
            tables: TablesConfig {
                discrete_output_coils: coils,
                discrete_input_contacts: HashMap::new(),
                analog_output_registers: holding,
                analog_input_registers: HashMap::new(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModbusError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ModbusError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config: Config = serde_json::from_str(&content).map_err(|e| {
            ModbusError::ConfigError(format!("cannot parse {}: {}", path.display(), e))
        })?;

        config.validate()?;

        info!(
            "📄 Loaded configuration from {} ({} seeded cells)",
            path.display(),
            config.tables.cell_count()
        );
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ModbusError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply command line overrides on top of the loaded document.
    pub fn apply_matches(&mut self, matches: &ArgMatches) -> Result<(), ModbusError> {
        if let Some(address) = matches.get_one::<String>("listen-address") {
            self.listen_address = address.clone();
        }
        if let Some(port) = matches.get_one::<String>("port") {
            self.listen_port = port
                .parse()
                .map_err(|_| ModbusError::ConfigError(format!("bad port value: '{}'", port)))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ModbusError> {
        self.listen_address.parse::<IpAddr>().map_err(|_| {
            ModbusError::ConfigError(format!(
                "listenAddress '{}' is not an IP address",
                self.listen_address
            ))
        })?;
        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.listen_address, self.listen_port)
    }
}

//! Modbus/TCP Slave Emulator
//!
//! This library emulates a Modbus/TCP slave device: it decodes raw Modbus
//! Application Data Units (ADUs), looks up or mutates four fixed-size
//! register/coil tables, and encodes properly framed ADU responses.
//! Supported function codes: 01, 02, 03, 04, 05, 06, 15, 16.

pub mod cli;
pub mod config;
pub mod modbus;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use modbus::{process_request, FunctionCode, MbapHeader, Request, RequestPdu};
pub use services::{EmulatorHandler, SlaveHandler, SlaveServer};
pub use storage::{DataTableStore, TableKind, TABLE_SIZE};
pub use utils::error::ModbusError;

pub const VERSION: &str = "1.0.0";

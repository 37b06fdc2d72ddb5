use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModbusError {
    #[error("Malformed MBAP header: need at least 8 bytes, got {0}")]
    MalformedHeader(usize),

    #[error("Unsupported function code: {0}")]
    UnsupportedFunction(u8),

    #[error("Malformed payload for function {function}: need {expected} bytes, got {actual}")]
    MalformedPayload {
        function: u8,
        expected: usize,
        actual: usize,
    },

    #[error("Address range out of bounds: start {start}, count {count}")]
    AddressOutOfRange { start: u16, count: u16 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Communication error: {0}")]
    CommunicationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for ModbusError {
    fn from(err: std::io::Error) -> Self {
        ModbusError::CommunicationError(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for ModbusError {
    fn from(err: serde_json::Error) -> Self {
        ModbusError::SerializationError(format!("JSON error: {}", err))
    }
}

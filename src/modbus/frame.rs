use crate::utils::error::ModbusError;

/// MBAP header is always 7 bytes on the wire.
pub const MBAP_HEADER_LEN: usize = 7;

/// Shortest ADU we accept: header plus the function code byte.
pub const MIN_ADU_LEN: usize = 8;

/// MBAP (MODBUS Application Protocol) header.
///
/// Sample request `00:14 00:00 00:06 01 | 01 15:20 00:25`:
///   00:14 : Transaction ID - master increases it on every request
///   00:00 : Protocol Identifier - 0 for the standard protocol
///   00:06 : Message Length
///   01    : Unit ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    pub transaction_id: u16,
    pub protocol_id: u16,
    pub message_length: u16,
    pub unit_id: u8,
}

impl MbapHeader {
    /// Big-endian fields at fixed offsets 0, 2, 4, 6. The declared
    /// message_length is kept for logging only; it never bounds parsing.
    pub fn decode(data: &[u8]) -> Result<Self, ModbusError> {
        if data.len() < MIN_ADU_LEN {
            return Err(ModbusError::MalformedHeader(data.len()));
        }

        Ok(Self {
            transaction_id: u16::from_be_bytes([data[0], data[1]]),
            protocol_id: u16::from_be_bytes([data[2], data[3]]),
            message_length: u16::from_be_bytes([data[4], data[5]]),
            unit_id: data[6],
        })
    }
}

/// Incremental response builder. Writes the header with a zero
/// message_length up front, takes PDU bytes, then `finish()` patches the
/// length field to everything-after-it (unit id + PDU).
pub struct AduBuilder {
    bytes: Vec<u8>,
}

impl AduBuilder {
    pub fn new(header: &MbapHeader) -> Self {
        let mut bytes = Vec::with_capacity(MBAP_HEADER_LEN + 16);

        bytes.extend_from_slice(&header.transaction_id.to_be_bytes());
        bytes.extend_from_slice(&header.protocol_id.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes()); // placeholder, patched in finish()
        bytes.push(header.unit_id);

        Self { bytes }
    }

    pub fn push_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn push_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn finish(mut self) -> Vec<u8> {
        let message_length = (self.bytes.len() - 6) as u16;
        self.bytes[4..6].copy_from_slice(&message_length.to_be_bytes());
        self.bytes
    }
}

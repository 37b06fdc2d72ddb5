use log::warn;

use super::bits::{bit_payload_len, unpack_bits};
use super::frame::MbapHeader;
use super::function::FunctionCode;
use crate::utils::error::ModbusError;

/// Coil write payload value meaning "on". Anything else forces the coil
/// off, including malformed values a strict device would reject.
pub const COIL_ON: u16 = 0xFF00;
pub const COIL_OFF: u16 = 0x0000;

/// A decoded request ADU. The PDU variant carries exactly the fields its
/// function populates, nothing is zero-filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub header: MbapHeader,
    pub function: FunctionCode,
    pub pdu: RequestPdu,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPdu {
    /// fc01 / fc02
    ReadBits { start_reference: u16, count: u16 },
    /// fc03 / fc04
    ReadWords { start_reference: u16, count: u16 },
    /// fc05
    WriteSingleCoil { reference: u16, value: bool },
    /// fc06
    WriteSingleRegister { reference: u16, value: u16 },
    /// fc15
    WriteMultipleCoils {
        start_reference: u16,
        count: u16,
        values: Vec<bool>,
    },
    /// fc16
    WriteMultipleRegisters {
        start_reference: u16,
        count: u16,
        values: Vec<u16>,
    },
}

impl Request {
    /// Decode one ADU. The function code sits at offset 7, right after the
    /// MBAP header; everything past it is function-specific.
    pub fn decode(data: &[u8]) -> Result<Self, ModbusError> {
        let header = MbapHeader::decode(data)?;

        if header.protocol_id != 0 {
            warn!(
                "⚠️  Non-standard protocol identifier {} in transaction {}, echoing it back",
                header.protocol_id, header.transaction_id
            );
        }

        let raw_function = data[7];
        let function = FunctionCode::from_u8(raw_function)?;
        let pdu = Self::decode_pdu(function, data)?;

        Ok(Self {
            header,
            function,
            pdu,
        })
    }

    fn decode_pdu(function: FunctionCode, data: &[u8]) -> Result<RequestPdu, ModbusError> {
        match function {
            FunctionCode::ReadCoilStatus | FunctionCode::ReadInputStatus => {
                require_pdu(function, data, 5)?;
                Ok(RequestPdu::ReadBits {
                    start_reference: be_u16(data, 8),
                    count: be_u16(data, 10),
                })
            }
            FunctionCode::ReadHoldingRegisters | FunctionCode::ReadInputRegisters => {
                require_pdu(function, data, 5)?;
                Ok(RequestPdu::ReadWords {
                    start_reference: be_u16(data, 8),
                    count: be_u16(data, 10),
                })
            }
            FunctionCode::WriteSingleCoil => {
                require_pdu(function, data, 5)?;
                // Only the canonical 0xFF00 turns the coil on.
                let raw = be_u16(data, 10);
                Ok(RequestPdu::WriteSingleCoil {
                    reference: be_u16(data, 8),
                    value: raw == COIL_ON,
                })
            }
            FunctionCode::WriteSingleRegister => {
                require_pdu(function, data, 5)?;
                Ok(RequestPdu::WriteSingleRegister {
                    reference: be_u16(data, 8),
                    value: be_u16(data, 10),
                })
            }
            FunctionCode::WriteMultipleCoils => {
                require_pdu(function, data, 6)?;
                let start_reference = be_u16(data, 8);
                let count = be_u16(data, 10);
                let byte_count = data[12] as usize;

                if byte_count != bit_payload_len(count) {
                    return Err(ModbusError::MalformedPayload {
                        function: function.as_u8(),
                        expected: 6 + bit_payload_len(count),
                        actual: 6 + byte_count,
                    });
                }
                require_pdu(function, data, 6 + byte_count)?;

                // LSB-first within each byte, addresses increasing with bit
                // position, pad bits past `count` dropped.
                let values = unpack_bits(&data[13..13 + byte_count], count as usize);

                Ok(RequestPdu::WriteMultipleCoils {
                    start_reference,
                    count,
                    values,
                })
            }
            FunctionCode::WriteMultipleRegisters => {
                require_pdu(function, data, 6)?;
                let start_reference = be_u16(data, 8);
                let count = be_u16(data, 10);
                let byte_count = data[12] as usize;

                if byte_count != count as usize * 2 {
                    return Err(ModbusError::MalformedPayload {
                        function: function.as_u8(),
                        expected: 6 + count as usize * 2,
                        actual: 6 + byte_count,
                    });
                }
                require_pdu(function, data, 6 + byte_count)?;

                let values = (0..count as usize)
                    .map(|i| be_u16(data, 13 + i * 2))
                    .collect();

                Ok(RequestPdu::WriteMultipleRegisters {
                    start_reference,
                    count,
                    values,
                })
            }
        }
    }
}

fn be_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

/// PDU length check. `needed` counts PDU bytes (function code included),
/// i.e. everything after the 7-byte header.
fn require_pdu(function: FunctionCode, data: &[u8], needed: usize) -> Result<(), ModbusError> {
    let actual = data.len().saturating_sub(7);
    if actual < needed {
        return Err(ModbusError::MalformedPayload {
            function: function.as_u8(),
            expected: needed,
            actual,
        });
    }
    Ok(())
}

use super::bits::pack_bits;
use super::frame::AduBuilder;
use super::request::{Request, RequestPdu, COIL_OFF, COIL_ON};
use crate::storage::DataTableStore;
use crate::utils::error::ModbusError;

/// Encode the response ADU for a decoded request.
///
/// Read functions pull the requested window out of the store; write
/// functions answer with the standard echo-style confirmation (the values
/// themselves are applied by the caller before encoding). The header always
/// echoes the request's transaction and protocol identifiers, and the
/// message length is patched once the PDU is complete.
pub fn encode_response(request: &Request, store: &DataTableStore) -> Result<Vec<u8>, ModbusError> {
    let mut builder = AduBuilder::new(&request.header);
    let function = request.function;

    match &request.pdu {
        RequestPdu::ReadBits {
            start_reference,
            count,
        } => {
            let cells = store.read_bits(function.table_kind(), *start_reference, *count)?;
            let payload = pack_bits(&cells);
            let byte_count = data_size(function.as_u8(), payload.len())?;

            builder.push_u8(function.as_u8());
            builder.push_u8(byte_count);
            for byte in payload {
                builder.push_u8(byte);
            }
        }
        RequestPdu::ReadWords {
            start_reference,
            count,
        } => {
            let words = store.read_words(function.table_kind(), *start_reference, *count)?;
            let byte_count = data_size(function.as_u8(), words.len() * 2)?;

            builder.push_u8(function.as_u8());
            builder.push_u8(byte_count);
            for word in words {
                builder.push_u16(word);
            }
        }
        RequestPdu::WriteSingleCoil { reference, value } => {
            builder.push_u8(function.as_u8());
            builder.push_u16(*reference);
            builder.push_u16(if *value { COIL_ON } else { COIL_OFF });
        }
        RequestPdu::WriteSingleRegister { reference, value } => {
            builder.push_u8(function.as_u8());
            builder.push_u16(*reference);
            builder.push_u16(*value);
        }
        RequestPdu::WriteMultipleCoils {
            start_reference,
            count,
            ..
        }
        | RequestPdu::WriteMultipleRegisters {
            start_reference,
            count,
            ..
        } => {
            builder.push_u8(function.as_u8());
            builder.push_u16(*start_reference);
            builder.push_u16(*count);
        }
    }

    Ok(builder.finish())
}

/// The PDU data size field is a single byte; a window too wide to answer in
/// one ADU is an invalid request.
fn data_size(function: u8, len: usize) -> Result<u8, ModbusError> {
    len.try_into().map_err(|_| ModbusError::MalformedPayload {
        function,
        expected: u8::MAX as usize,
        actual: len,
    })
}

pub mod bits;
pub mod frame;
pub mod function;
pub mod request;
pub mod response;

pub use frame::{AduBuilder, MbapHeader, MBAP_HEADER_LEN, MIN_ADU_LEN};
pub use function::FunctionCode;
pub use request::{Request, RequestPdu};
pub use response::encode_response;

use log::debug;

use crate::storage::DataTableStore;
use crate::utils::error::ModbusError;

/// One full decode / apply / encode cycle over a raw ADU.
///
/// Writes land in the store before the confirmation is encoded, so a
/// request that fails its range check never mutates anything.
pub fn process_request(data: &[u8], store: &mut DataTableStore) -> Result<Vec<u8>, ModbusError> {
    debug!("request : {}", hex::encode(data));

    let request = Request::decode(data)?;
    debug!(
        "fc{:02} {} @ transaction {}",
        request.function.as_u8(),
        request.function.description(),
        request.header.transaction_id
    );

    apply_write(&request, store)?;
    let out = encode_response(&request, store)?;

    debug!("response: {}", hex::encode(&out));
    Ok(out)
}

fn apply_write(request: &Request, store: &mut DataTableStore) -> Result<(), ModbusError> {
    let kind = request.function.table_kind();

    match &request.pdu {
        RequestPdu::WriteSingleCoil { reference, value } => {
            store.write_bit(kind, *reference, *value);
        }
        RequestPdu::WriteSingleRegister { reference, value } => {
            store.write_word(kind, *reference, *value);
        }
        RequestPdu::WriteMultipleCoils {
            start_reference,
            values,
            ..
        } => {
            store.write_bits(kind, *start_reference, values)?;
        }
        RequestPdu::WriteMultipleRegisters {
            start_reference,
            values,
            ..
        } => {
            store.write_words(kind, *start_reference, values)?;
        }
        RequestPdu::ReadBits { .. } | RequestPdu::ReadWords { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TableKind;

    fn adu(transaction_id: u16, function: u8, payload: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&transaction_id.to_be_bytes());
        data.extend_from_slice(&[0x00, 0x00]);
        data.extend_from_slice(&((2 + payload.len()) as u16).to_be_bytes());
        data.push(0x01);
        data.push(function);
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn test_write_then_read_back_registers() {
        let mut store = DataTableStore::new();

        // fc16: three registers at 0x0000
        let write = adu(
            1,
            16,
            &[0x00, 0x00, 0x00, 0x03, 0x06, 0x00, 0x0A, 0x00, 0x12, 0x00, 0x34],
        );
        let confirmation = process_request(&write, &mut store).unwrap();
        assert_eq!(&confirmation[7..], &[0x10, 0x00, 0x00, 0x00, 0x03]);

        // fc03 reads the same window back
        let read = adu(2, 3, &[0x00, 0x00, 0x00, 0x03]);
        let out = process_request(&read, &mut store).unwrap();
        assert_eq!(&out[7..], &[0x03, 0x06, 0x00, 0x0A, 0x00, 0x12, 0x00, 0x34]);
    }

    #[test]
    fn test_single_coil_write_is_visible_to_fc01() {
        let mut store = DataTableStore::new();

        let write = adu(7, 5, &[0x00, 0x02, 0xFF, 0x00]);
        let confirmation = process_request(&write, &mut store).unwrap();
        assert_eq!(&confirmation[7..], &[0x05, 0x00, 0x02, 0xFF, 0x00]);
        assert!(store.read_bit(TableKind::DiscreteOutputCoils, 2));

        let read = adu(8, 1, &[0x00, 0x00, 0x00, 0x08]);
        let out = process_request(&read, &mut store).unwrap();
        assert_eq!(&out[7..], &[0x01, 0x01, 0b0000_0100]);
    }

    #[test]
    fn test_multiple_coil_write_is_visible_to_fc01() {
        let mut store = DataTableStore::new();

        // fc15: 10 coils at 0x0000, payload CD 01
        let write = adu(5, 15, &[0x00, 0x00, 0x00, 0x0A, 0x02, 0xCD, 0x01]);
        let confirmation = process_request(&write, &mut store).unwrap();
        assert_eq!(&confirmation[7..], &[0x0F, 0x00, 0x00, 0x00, 0x0A]);

        // fc01 over the same window sees the exact bit pattern back
        let read = adu(6, 1, &[0x00, 0x00, 0x00, 0x0A]);
        let out = process_request(&read, &mut store).unwrap();
        assert_eq!(&out[7..], &[0x01, 0x02, 0xCD, 0x01]);
    }

    #[test]
    fn test_failed_range_check_leaves_store_untouched() {
        let mut store = DataTableStore::new();

        // fc16 window runs past the table end
        let write = adu(
            9,
            16,
            &[0xFF, 0xFE, 0x00, 0x03, 0x06, 0x00, 0x01, 0x00, 0x02, 0x00, 0x03],
        );
        assert!(matches!(
            process_request(&write, &mut store),
            Err(ModbusError::AddressOutOfRange { .. })
        ));
        assert_eq!(store.read_word(TableKind::AnalogOutputRegisters, 0xFFFE), 0);
    }

    #[test]
    fn test_unsupported_function_then_valid_request() {
        let mut store = DataTableStore::new();
        store.write_word(TableKind::AnalogOutputRegisters, 0, 42);

        let bogus = adu(3, 99, &[0x00, 0x00, 0x00, 0x01]);
        assert!(matches!(
            process_request(&bogus, &mut store),
            Err(ModbusError::UnsupportedFunction(99))
        ));

        // the next request must still be answered correctly
        let read = adu(4, 3, &[0x00, 0x00, 0x00, 0x01]);
        let out = process_request(&read, &mut store).unwrap();
        assert_eq!(&out[7..], &[0x03, 0x02, 0x00, 0x2A]);
        assert_eq!(out[0..2], [0x00, 0x04]);
    }
}

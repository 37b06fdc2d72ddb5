use crate::storage::TableKind;
use crate::utils::error::ModbusError;

/// The eight function codes the emulator answers. Everything else is a
/// lookup miss and comes back as `UnsupportedFunction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCode {
    ReadCoilStatus = 1,
    ReadInputStatus = 2,
    ReadHoldingRegisters = 3,
    ReadInputRegisters = 4,
    WriteSingleCoil = 5,
    WriteSingleRegister = 6,
    WriteMultipleCoils = 15,
    WriteMultipleRegisters = 16,
}

impl FunctionCode {
    pub fn from_u8(raw: u8) -> Result<Self, ModbusError> {
        match raw {
            1 => Ok(FunctionCode::ReadCoilStatus),
            2 => Ok(FunctionCode::ReadInputStatus),
            3 => Ok(FunctionCode::ReadHoldingRegisters),
            4 => Ok(FunctionCode::ReadInputRegisters),
            5 => Ok(FunctionCode::WriteSingleCoil),
            6 => Ok(FunctionCode::WriteSingleRegister),
            15 => Ok(FunctionCode::WriteMultipleCoils),
            16 => Ok(FunctionCode::WriteMultipleRegisters),
            other => Err(ModbusError::UnsupportedFunction(other)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Which data table this function reads from or writes to.
    pub fn table_kind(&self) -> TableKind {
        match self {
            FunctionCode::ReadCoilStatus
            | FunctionCode::WriteSingleCoil
            | FunctionCode::WriteMultipleCoils => TableKind::DiscreteOutputCoils,
            FunctionCode::ReadInputStatus => TableKind::DiscreteInputContacts,
            FunctionCode::ReadHoldingRegisters
            | FunctionCode::WriteSingleRegister
            | FunctionCode::WriteMultipleRegisters => TableKind::AnalogOutputRegisters,
            FunctionCode::ReadInputRegisters => TableKind::AnalogInputRegisters,
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(
            self,
            FunctionCode::ReadCoilStatus
                | FunctionCode::ReadInputStatus
                | FunctionCode::ReadHoldingRegisters
                | FunctionCode::ReadInputRegisters
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            FunctionCode::ReadCoilStatus => "Read Coil Status",
            FunctionCode::ReadInputStatus => "Read Input Status",
            FunctionCode::ReadHoldingRegisters => "Read Holding Registers",
            FunctionCode::ReadInputRegisters => "Read Input Registers",
            FunctionCode::WriteSingleCoil => "Force Single Coil",
            FunctionCode::WriteSingleRegister => "Preset Single Register",
            FunctionCode::WriteMultipleCoils => "Force Multiple Coils",
            FunctionCode::WriteMultipleRegisters => "Preset Multiple Registers",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_codes_round_trip() {
        for raw in [1u8, 2, 3, 4, 5, 6, 15, 16] {
            let fc = FunctionCode::from_u8(raw).unwrap();
            assert_eq!(fc.as_u8(), raw);
        }
    }

    #[test]
    fn test_unknown_code_is_a_lookup_miss() {
        for raw in [0u8, 7, 8, 17, 99, 255] {
            assert!(matches!(
                FunctionCode::from_u8(raw),
                Err(ModbusError::UnsupportedFunction(r)) if r == raw
            ));
        }
    }

    #[test]
    fn test_table_routing() {
        assert_eq!(
            FunctionCode::ReadCoilStatus.table_kind(),
            TableKind::DiscreteOutputCoils
        );
        assert_eq!(
            FunctionCode::ReadInputStatus.table_kind(),
            TableKind::DiscreteInputContacts
        );
        assert_eq!(
            FunctionCode::ReadHoldingRegisters.table_kind(),
            TableKind::AnalogOutputRegisters
        );
        assert_eq!(
            FunctionCode::ReadInputRegisters.table_kind(),
            TableKind::AnalogInputRegisters
        );
    }
}

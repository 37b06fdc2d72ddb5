use log::{debug, info};

use crate::config::settings::TablesConfig;
use crate::utils::error::ModbusError;

/// Every table spans the full 16-bit address space.
pub const TABLE_SIZE: usize = 65536;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    DiscreteOutputCoils,
    DiscreteInputContacts,
    AnalogOutputRegisters,
    AnalogInputRegisters,
}

impl TableKind {
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::DiscreteOutputCoils => "discreteOutputCoils",
            TableKind::DiscreteInputContacts => "discreteInputContacts",
            TableKind::AnalogOutputRegisters => "analogOutputRegisters",
            TableKind::AnalogInputRegisters => "analogInputRegisters",
        }
    }

}

/// The four Modbus data tables, owned by the server and handed by reference
/// into the codec. Contiguous arrays, so lookups stay O(1) and memory stays
/// bounded at 4 x 65536 cells.
pub struct DataTableStore {
    coils: Box<[bool]>,
    discrete_inputs: Box<[bool]>,
    holding_registers: Box<[u16]>,
    input_registers: Box<[u16]>,
}

impl DataTableStore {
    pub fn new() -> Self {
        Self {
            coils: vec![false; TABLE_SIZE].into_boxed_slice(),
            discrete_inputs: vec![false; TABLE_SIZE].into_boxed_slice(),
            holding_registers: vec![0u16; TABLE_SIZE].into_boxed_slice(),
            input_registers: vec![0u16; TABLE_SIZE].into_boxed_slice(),
        }
    }

    /// Seed all four tables from the configuration maps.
    pub fn from_config(tables: &TablesConfig) -> Result<Self, ModbusError> {
        let mut store = Self::new();

        let coils = store.seed_discrete(TableKind::DiscreteOutputCoils, &tables.discrete_output_coils)?;
        let inputs =
            store.seed_discrete(TableKind::DiscreteInputContacts, &tables.discrete_input_contacts)?;
        let holding =
            store.seed_analog(TableKind::AnalogOutputRegisters, &tables.analog_output_registers)?;
        let input_regs =
            store.seed_analog(TableKind::AnalogInputRegisters, &tables.analog_input_registers)?;

        info!(
            "📋 Data tables seeded: {} coils, {} discrete inputs, {} holding registers, {} input registers",
            coils, inputs, holding, input_regs
        );

        Ok(store)
    }

    fn seed_discrete(
        &mut self,
        kind: TableKind,
        entries: &std::collections::HashMap<String, i64>,
    ) -> Result<usize, ModbusError> {
        for (key, value) in entries {
            let reference = parse_reference(kind, key)?;
            // Anything positive counts as energized, everything else is off.
            let cell = *value > 0;
            self.write_bit(kind, reference, cell);
            debug!("  {} [{}] = {}", kind.name(), reference, cell as u8);
        }
        Ok(entries.len())
    }

    fn seed_analog(
        &mut self,
        kind: TableKind,
        entries: &std::collections::HashMap<String, i64>,
    ) -> Result<usize, ModbusError> {
        for (key, value) in entries {
            let reference = parse_reference(kind, key)?;
            // Out-of-domain values collapse to zero rather than failing the boot.
            let cell = if (0..=65535).contains(value) {
                *value as u16
            } else {
                0
            };
            self.write_word(kind, reference, cell);
            debug!("  {} [{}] = {}", kind.name(), reference, cell);
        }
        Ok(entries.len())
    }

    /// Reject any window that runs past the end of the address space.
    pub fn check_range(&self, start: u16, count: u16) -> Result<(), ModbusError> {
        if start as usize + count as usize > TABLE_SIZE {
            return Err(ModbusError::AddressOutOfRange { start, count });
        }
        Ok(())
    }

    pub fn read_bit(&self, kind: TableKind, reference: u16) -> bool {
        self.bit_table(kind)[reference as usize]
    }

    pub fn read_word(&self, kind: TableKind, reference: u16) -> u16 {
        self.word_table(kind)[reference as usize]
    }

    pub fn write_bit(&mut self, kind: TableKind, reference: u16, value: bool) {
        self.bit_table_mut(kind)[reference as usize] = value;
    }

    pub fn write_word(&mut self, kind: TableKind, reference: u16, value: u16) {
        self.word_table_mut(kind)[reference as usize] = value;
    }

    /// Range read for the bit-style tables (fc01/fc02).
    pub fn read_bits(&self, kind: TableKind, start: u16, count: u16) -> Result<Vec<bool>, ModbusError> {
        self.check_range(start, count)?;
        let table = self.bit_table(kind);
        Ok(table[start as usize..start as usize + count as usize].to_vec())
    }

    /// Range read for the word-style tables (fc03/fc04).
    pub fn read_words(&self, kind: TableKind, start: u16, count: u16) -> Result<Vec<u16>, ModbusError> {
        self.check_range(start, count)?;
        let table = self.word_table(kind);
        Ok(table[start as usize..start as usize + count as usize].to_vec())
    }

    pub fn write_bits(&mut self, kind: TableKind, start: u16, values: &[bool]) -> Result<(), ModbusError> {
        self.check_range(start, values.len() as u16)?;
        let table = self.bit_table_mut(kind);
        table[start as usize..start as usize + values.len()].copy_from_slice(values);
        Ok(())
    }

    pub fn write_words(&mut self, kind: TableKind, start: u16, values: &[u16]) -> Result<(), ModbusError> {
        self.check_range(start, values.len() as u16)?;
        let table = self.word_table_mut(kind);
        table[start as usize..start as usize + values.len()].copy_from_slice(values);
        Ok(())
    }

    fn bit_table(&self, kind: TableKind) -> &[bool] {
        match kind {
            TableKind::DiscreteOutputCoils => &self.coils,
            TableKind::DiscreteInputContacts => &self.discrete_inputs,
            _ => unreachable!("not a bit table: {}", kind.name()),
        }
    }

    fn bit_table_mut(&mut self, kind: TableKind) -> &mut [bool] {
        match kind {
            TableKind::DiscreteOutputCoils => &mut self.coils,
            TableKind::DiscreteInputContacts => &mut self.discrete_inputs,
            _ => unreachable!("not a bit table: {}", kind.name()),
        }
    }

    fn word_table(&self, kind: TableKind) -> &[u16] {
        match kind {
            TableKind::AnalogOutputRegisters => &self.holding_registers,
            TableKind::AnalogInputRegisters => &self.input_registers,
            _ => unreachable!("not a word table: {}", kind.name()),
        }
    }

    fn word_table_mut(&mut self, kind: TableKind) -> &mut [u16] {
        match kind {
            TableKind::AnalogOutputRegisters => &mut self.holding_registers,
            TableKind::AnalogInputRegisters => &mut self.input_registers,
            _ => unreachable!("not a word table: {}", kind.name()),
        }
    }
}

impl Default for DataTableStore {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_reference(kind: TableKind, key: &str) -> Result<u16, ModbusError> {
    key.parse::<u16>().map_err(|_| {
        ModbusError::ConfigError(format!(
            "table {} has a bad address key: '{}' (expected 0-65535)",
            kind.name(),
            key
        ))
    })
}

pub mod tables;

pub use tables::{DataTableStore, TableKind, TABLE_SIZE};

pub mod server;

pub use server::{EmulatorHandler, SlaveHandler, SlaveServer};

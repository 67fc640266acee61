//! Outcome sink implementations.

mod csv_log;
mod memory;

pub use csv_log::CsvOutcomeLog;
pub use memory::MemorySink;

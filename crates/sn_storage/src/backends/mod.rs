pub mod csv_file;
pub mod memory;

pub use csv_file::CsvStore;
pub use memory::MemoryStore;

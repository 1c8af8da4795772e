pub mod db;
pub mod file;
pub mod memory;

pub use memory::MemoryStore;

pub mod memory;
pub mod seed;
pub mod sort_value;

pub use memory::InMemoryStore;

//! Account directory implementations.

mod account;
mod memory;

pub use account::SurrealAccountDirectory;
pub use memory::MemoryAccountDirectory;

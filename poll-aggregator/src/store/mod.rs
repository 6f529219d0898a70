pub mod memory;
pub mod postgres;

pub use memory::MemoryPollStore;
pub use postgres::PgPollStore;

mod database;
mod kv_repo;
mod memory;


pub use database::Database;
pub use kv_repo::KvRepo;
pub use memory::MemoryStore;

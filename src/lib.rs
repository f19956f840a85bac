pub mod cli;
pub mod core;
pub mod providers;
pub mod session;
pub mod storage;

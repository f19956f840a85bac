pub mod category;
pub mod chat;
pub mod config;
pub mod error;
pub mod service;
pub mod store;
pub mod surface;
pub mod theme;

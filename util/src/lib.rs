pub mod cache;
pub mod config;
pub mod retry;
pub mod ws;

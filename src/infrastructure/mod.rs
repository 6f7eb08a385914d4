pub mod config;
pub mod security;
pub mod storage;

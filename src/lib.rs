pub mod config;
pub mod http;
pub mod models;
pub mod repositories;
pub mod storage;

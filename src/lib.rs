pub mod commands;
pub mod config;
pub mod coordinator;
pub mod git;
pub mod models;
pub mod store;

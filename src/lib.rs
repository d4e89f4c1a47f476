// ABOUTME: Library module for sqldatadump
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod chunk;
pub mod commands;
pub mod config;
pub mod export;
pub mod filters;
pub mod metadata;
pub mod mssql;
pub mod source;
pub mod utils;
pub mod value;

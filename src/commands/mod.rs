// ABOUTME: Command implementations for the CLI
// ABOUTME: Exports the schema data-dump command

pub mod export;

pub use export::export;

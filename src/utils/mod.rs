//! Utility modules for configuration, error handling, and symbol interning.

pub mod config;
pub mod error;
pub mod symtab;

// Re-export commonly used error types for convenience
pub use error::{CaptureError, DiffError, ModelError, OutputError};
pub use symtab::SymbolTable;

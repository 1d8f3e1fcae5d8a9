//! Feature modules - core logic separated from the command line
//!
//! Each feature module contains the core logic for a specific functionality.
//! Features should not depend on terminal output directly.

pub mod export;
pub mod lyrics;
pub mod settings;

// Waitline Core - Domain Logic & Ports
// NO infrastructure dependencies (hexagonal: adapters depend on core, never the reverse)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, ErrorKind, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for the Waitline queue engine.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use rate_limiter::RateLimitConfig;
pub use server::{RpcServer, RpcServerConfig};

pub use jsonrpsee::server::ServerHandle;

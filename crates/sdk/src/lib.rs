//! Waitline SDK - Rust Client Library
//!
//! Typed client for the Waitline daemon's JSON-RPC surface.
//!
//! # Example
//!
//! ```no_run
//! use waitline_sdk::{JoinQueueRequest, WaitlineClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WaitlineClient::connect("http://127.0.0.1:9530").await?;
//!
//!     let entry = client.join_queue(&JoinQueueRequest {
//!         queue_id: "3f0c...".to_string(),
//!         customer_name: "Ada".to_string(),
//!         phone_number: "+15551234567".to_string(),
//!         party_size: Some(2),
//!     }).await?;
//!
//!     println!("Position {} (~{} min)", entry.position, entry.estimated_wait_minutes);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::WaitlineClient;
pub use error::{Result, SdkError};
pub use types::{
    CreateQueueRequest, DeleteQueueResponse, HealthResponse, JoinQueueRequest, ListEntriesRequest,
    ListQueuesRequest, MaintenanceResponse, StatsResponse, UpdateQueueRequest,
};
pub use waitline_core::domain::{Entry, EntryId, EntryStatus, Queue, QueueStatus};

//! Waitline Client Implementation

use crate::error::{Result, SdkError};
use crate::types::*;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use waitline_core::domain::{Entry, EntryId, Queue, QueueStatus};

/// Waitline Client
///
/// Every daemon method takes one named-parameter object; requests are
/// serialized field by field into JSON-RPC object params.
///
/// # Example
///
/// ```no_run
/// use waitline_sdk::WaitlineClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = WaitlineClient::connect("http://127.0.0.1:9530").await?;
/// let health = client.health().await?;
/// println!("{}", health.status);
/// # Ok(())
/// # }
/// ```
pub struct WaitlineClient {
    client: HttpClient,
}

impl WaitlineClient {
    /// Connect to the Waitline daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9530`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    async fn call<T, R>(&self, method: &str, request: &R) -> Result<T>
    where
        T: DeserializeOwned,
        R: Serialize,
    {
        let params = object_params(request)?;
        Ok(self.client.request(method, params).await?)
    }

    // Queues

    pub async fn list_queues(&self, request: &ListQueuesRequest) -> Result<Vec<Queue>> {
        self.call("queue.list.v1", request).await
    }

    pub async fn get_queue(&self, queue_id: &str) -> Result<Queue> {
        let params = QueueParams {
            queue_id,
            staff_id: None,
        };
        self.call("queue.get.v1", &params).await
    }

    pub async fn create_queue(&self, request: &CreateQueueRequest) -> Result<Queue> {
        self.call("queue.create.v1", request).await
    }

    pub async fn update_queue(&self, request: &UpdateQueueRequest) -> Result<Queue> {
        self.call("queue.update.v1", request).await
    }

    /// Pause, resume or close a queue
    pub async fn set_queue_status(
        &self,
        staff_id: &str,
        queue_id: &str,
        status: QueueStatus,
    ) -> Result<Queue> {
        let request = UpdateQueueRequest {
            staff_id: staff_id.to_string(),
            queue_id: queue_id.to_string(),
            status: Some(status),
            ..UpdateQueueRequest::default()
        };
        self.update_queue(&request).await
    }

    /// Delete a queue; fails with a conflict while entries are live
    pub async fn delete_queue(&self, staff_id: &str, queue_id: &str) -> Result<DeleteQueueResponse> {
        let params = QueueParams {
            queue_id,
            staff_id: Some(staff_id),
        };
        self.call("queue.delete.v1", &params).await
    }

    // Entries

    pub async fn join_queue(&self, request: &JoinQueueRequest) -> Result<Entry> {
        self.call("entry.join.v1", request).await
    }

    /// Current position and wait estimate for an entry
    pub async fn get_entry(&self, entry_id: EntryId) -> Result<Entry> {
        let params = EntryParams {
            entry_id,
            staff_id: None,
        };
        self.call("entry.get.v1", &params).await
    }

    pub async fn list_entries(&self, request: &ListEntriesRequest) -> Result<Vec<Entry>> {
        self.call("entry.list.v1", request).await
    }

    /// Call the head of the line; `None` when nobody is waiting
    pub async fn call_next(&self, staff_id: &str, queue_id: &str) -> Result<Option<Entry>> {
        let params = QueueParams {
            queue_id,
            staff_id: Some(staff_id),
        };
        let response: CallNextResponse = self.call("entry.call_next.v1", &params).await?;
        Ok(response.entry)
    }

    pub async fn call_entry(&self, staff_id: &str, entry_id: EntryId) -> Result<Entry> {
        let params = EntryParams {
            entry_id,
            staff_id: Some(staff_id),
        };
        self.call("entry.call.v1", &params).await
    }

    pub async fn mark_served(&self, staff_id: &str, entry_id: EntryId) -> Result<Entry> {
        let params = EntryParams {
            entry_id,
            staff_id: Some(staff_id),
        };
        self.call("entry.serve.v1", &params).await
    }

    /// Cancel as the customer (`staff_id == None`) or as the queue owner
    pub async fn cancel_entry(&self, entry_id: EntryId, staff_id: Option<&str>) -> Result<Entry> {
        let params = EntryParams { entry_id, staff_id };
        self.call("entry.cancel.v1", &params).await
    }

    // Admin

    pub async fn stats(&self) -> Result<StatsResponse> {
        Ok(self.client.request("admin.stats.v1", rpc_params![]).await?)
    }

    pub async fn maintenance(&self, force_vacuum: bool) -> Result<MaintenanceResponse> {
        self.call("admin.maintenance.v1", &MaintenanceRequest { force_vacuum })
            .await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        Ok(self.client.request("system.health.v1", rpc_params![]).await?)
    }
}

/// Serialize a request struct into named params, skipping nulls
fn object_params<R: Serialize>(request: &R) -> Result<ObjectParams> {
    let value = serde_json::to_value(request)?;
    let fields = match value {
        serde_json::Value::Object(fields) => fields,
        other => {
            return Err(SdkError::Other(format!(
                "request must serialize to an object, got {}",
                other
            )))
        }
    };

    let mut params = ObjectParams::new();
    for (name, value) in fields {
        if !value.is_null() {
            params.insert(&name, value)?;
        }
    }
    Ok(params)
}

//! RPC Method Handlers
//!
//! Translates requests into registry/ledger calls and enforces queue
//! ownership for staff methods. Identity is established upstream; a
//! request's `staff_id` is trusted as the authenticated caller.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use crate::types::*;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use waitline_core::application::{EntryLedger, JoinRequest, MaintenanceScheduler, QueueRegistry};
use waitline_core::domain::{Entry, EntryId, Queue, QueueDraft, QueuePatch};
use waitline_core::error::{AppError, Result as AppResult};
use waitline_core::port::Page;

type RpcResult<T> = Result<T, ErrorObjectOwned>;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    registry: Arc<QueueRegistry>,
    ledger: Arc<EntryLedger>,
    maintenance: Arc<MaintenanceScheduler>,
    join_limiter: RateLimiter,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(
        registry: Arc<QueueRegistry>,
        ledger: Arc<EntryLedger>,
        maintenance: Arc<MaintenanceScheduler>,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            registry,
            ledger,
            maintenance,
            join_limiter: RateLimiter::new(rate_limit),
            start_time: Instant::now(),
        }
    }

    // ------------------------------------------------------------------
    // Queues
    // ------------------------------------------------------------------

    /// queue.list.v1
    pub async fn list_queues(&self, req: ListQueuesRequest) -> RpcResult<Vec<Queue>> {
        self.registry
            .list_queues(&req.filter(), req.page())
            .await
            .map_err(to_rpc_error)
    }

    /// queue.get.v1
    pub async fn get_queue(&self, req: GetQueueRequest) -> RpcResult<Queue> {
        self.registry
            .get_queue(&req.queue_id)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.create.v1
    pub async fn create_queue(&self, req: CreateQueueRequest) -> RpcResult<Queue> {
        let mut draft = QueueDraft::new(req.name, req.business_name);
        draft.description = req.description;
        draft.address = req.address;
        if let Some(minutes) = req.estimated_wait_minutes {
            draft = draft.with_wait_minutes(minutes);
        }

        self.registry
            .create_queue(&req.staff_id, draft)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.update.v1
    pub async fn update_queue(&self, req: UpdateQueueRequest) -> RpcResult<Queue> {
        self.authorize_queue(&req.staff_id, &req.queue_id)
            .await
            .map_err(to_rpc_error)?;

        let patch = QueuePatch {
            name: req.name,
            business_name: req.business_name,
            description: req.description,
            address: req.address,
            status: req.status,
            estimated_wait_minutes: req.estimated_wait_minutes,
        };
        self.registry
            .update_queue(&req.queue_id, patch)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.delete.v1
    pub async fn delete_queue(&self, req: DeleteQueueRequest) -> RpcResult<DeleteQueueResponse> {
        self.authorize_queue(&req.staff_id, &req.queue_id)
            .await
            .map_err(to_rpc_error)?;

        self.registry
            .delete_queue(&req.queue_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(DeleteQueueResponse {
            queue_id: req.queue_id,
            deleted: true,
        })
    }

    // ------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------

    /// entry.join.v1
    pub async fn join_queue(&self, req: JoinQueueRequest) -> RpcResult<Entry> {
        if !self.join_limiter.check(&req.queue_id) {
            warn!(queue_id = %req.queue_id, "Join throttled");
            return Err(throttled());
        }

        let mut join = JoinRequest::new(req.queue_id, req.customer_name, req.phone_number);
        if let Some(party_size) = req.party_size {
            join = join.with_party_size(party_size);
        }

        self.ledger.join_queue(join).await.map_err(to_rpc_error)
    }

    /// entry.list.v1
    pub async fn list_entries(&self, req: ListEntriesRequest) -> RpcResult<Vec<Entry>> {
        self.authorize_queue(&req.staff_id, &req.queue_id)
            .await
            .map_err(to_rpc_error)?;

        self.ledger
            .list_entries(&req.queue_id, req.status, Page::new(req.offset, req.limit))
            .await
            .map_err(to_rpc_error)
    }

    /// entry.get.v1
    pub async fn get_entry(&self, req: GetEntryRequest) -> RpcResult<Entry> {
        self.ledger
            .get_entry(req.entry_id)
            .await
            .map_err(to_rpc_error)
    }

    /// entry.call_next.v1
    pub async fn call_next(&self, req: CallNextRequest) -> RpcResult<CallNextResponse> {
        self.authorize_queue(&req.staff_id, &req.queue_id)
            .await
            .map_err(to_rpc_error)?;

        let entry = self
            .ledger
            .call_next(&req.queue_id)
            .await
            .map_err(to_rpc_error)?;
        Ok(CallNextResponse { entry })
    }

    /// entry.call.v1
    pub async fn call_entry(&self, req: StaffEntryRequest) -> RpcResult<Entry> {
        self.authorize_entry(&req.staff_id, req.entry_id)
            .await
            .map_err(to_rpc_error)?;

        self.ledger
            .call_entry(req.entry_id)
            .await
            .map_err(to_rpc_error)
    }

    /// entry.serve.v1
    pub async fn mark_served(&self, req: StaffEntryRequest) -> RpcResult<Entry> {
        self.authorize_entry(&req.staff_id, req.entry_id)
            .await
            .map_err(to_rpc_error)?;

        self.ledger
            .mark_served(req.entry_id)
            .await
            .map_err(to_rpc_error)
    }

    /// entry.cancel.v1
    pub async fn cancel_entry(&self, req: CancelEntryRequest) -> RpcResult<Entry> {
        if let Some(staff_id) = &req.staff_id {
            self.authorize_entry(staff_id, req.entry_id)
                .await
                .map_err(to_rpc_error)?;
        }

        self.ledger
            .cancel_entry(req.entry_id)
            .await
            .map_err(to_rpc_error)
    }

    // ------------------------------------------------------------------
    // Admin / system
    // ------------------------------------------------------------------

    /// admin.stats.v1
    pub async fn stats(&self) -> RpcResult<StatsResponse> {
        let stats = self.maintenance.stats().await.map_err(to_rpc_error)?;
        Ok(StatsResponse {
            stats,
            uptime_seconds: self.start_time.elapsed().as_secs(),
        })
    }

    /// admin.maintenance.v1
    pub async fn maintenance(&self, req: MaintenanceRequest) -> RpcResult<MaintenanceResponse> {
        let report = self
            .maintenance
            .run_now(req.force_vacuum)
            .await
            .map_err(to_rpc_error)?;

        Ok(MaintenanceResponse {
            vacuum_run: req.force_vacuum || report.reclaimed_mb > 0.0,
            purged_entries: report.purged_entries,
            reclaimed_mb: report.reclaimed_mb,
            db_size_bytes: report.stats.db_size_bytes,
        })
    }

    /// system.health.v1
    pub fn health(&self) -> RpcResult<HealthResponse> {
        Ok(HealthResponse {
            status: "ok".to_string(),
            version: waitline_core::VERSION.to_string(),
        })
    }

    // ------------------------------------------------------------------
    // Ownership
    // ------------------------------------------------------------------

    async fn authorize_queue(&self, staff_id: &str, queue_id: &str) -> AppResult<Queue> {
        let queue = self.registry.get_queue(queue_id).await?;
        if queue.owner_id != staff_id {
            debug!(queue_id = %queue_id, staff_id = %staff_id, "Ownership check failed");
            return Err(AppError::Forbidden(format!(
                "queue {} is not managed by {}",
                queue_id, staff_id
            )));
        }
        Ok(queue)
    }

    async fn authorize_entry(&self, staff_id: &str, entry_id: EntryId) -> AppResult<Queue> {
        let entry = self.ledger.get_entry(entry_id).await?;
        self.authorize_queue(staff_id, &entry.queue_id).await
    }
}

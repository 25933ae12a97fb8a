//! JSON-RPC Server
//!
//! Implements the JSON-RPC 2.0 server over HTTP.

use crate::handler::RpcHandler;
use crate::types::*;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9530;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// Register `$method` so that its object params parse into `$req` and
/// are passed to `RpcHandler::$call`.
macro_rules! register {
    ($module:expr, $method:literal, $req:ty => $call:ident) => {
        $module
            .register_async_method($method, |params, ctx, _| async move {
                let req: $req = params.parse()?;
                ctx.$call(req).await
            })
            .map_err(|e| e.to_string())?;
    };
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: RpcHandler,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self { config, handler }
    }

    /// Build the method table (also used by in-process tests)
    pub fn into_module(self) -> Result<RpcModule<RpcHandler>, String> {
        let mut module = RpcModule::new(self.handler);

        // Queues
        register!(module, "queue.list.v1", Option<ListQueuesRequest> => list_queues_opt);
        register!(module, "queue.get.v1", GetQueueRequest => get_queue);
        register!(module, "queue.create.v1", CreateQueueRequest => create_queue);
        register!(module, "queue.update.v1", UpdateQueueRequest => update_queue);
        register!(module, "queue.delete.v1", DeleteQueueRequest => delete_queue);

        // Entries
        register!(module, "entry.join.v1", JoinQueueRequest => join_queue);
        register!(module, "entry.list.v1", ListEntriesRequest => list_entries);
        register!(module, "entry.get.v1", GetEntryRequest => get_entry);
        register!(module, "entry.call_next.v1", CallNextRequest => call_next);
        register!(module, "entry.call.v1", StaffEntryRequest => call_entry);
        register!(module, "entry.serve.v1", StaffEntryRequest => mark_served);
        register!(module, "entry.cancel.v1", CancelEntryRequest => cancel_entry);

        // Admin APIs
        module
            .register_async_method("admin.stats.v1", |_, ctx, _| async move { ctx.stats().await })
            .map_err(|e| e.to_string())?;
        register!(module, "admin.maintenance.v1", Option<MaintenanceRequest> => maintenance_opt);

        module
            .register_method("system.health.v1", |_, ctx, _| ctx.health())
            .map_err(|e| e.to_string())?;

        Ok(module)
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (port 0 picks a free port) and the handle
    /// used to stop the server.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = self.into_module()?;
        let handle = server.start(module);

        info!(addr = %local_addr, "JSON-RPC server started successfully");
        Ok((local_addr, handle))
    }
}

// Methods whose params object may be omitted entirely
impl RpcHandler {
    async fn list_queues_opt(
        &self,
        req: Option<ListQueuesRequest>,
    ) -> Result<Vec<waitline_core::domain::Queue>, jsonrpsee::types::ErrorObjectOwned> {
        self.list_queues(req.unwrap_or_default()).await
    }

    async fn maintenance_opt(
        &self,
        req: Option<MaintenanceRequest>,
    ) -> Result<MaintenanceResponse, jsonrpsee::types::ErrorObjectOwned> {
        self.maintenance(req.unwrap_or_default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use crate::rate_limiter::RateLimitConfig;
    use jsonrpsee::core::params::ObjectParams;
    use jsonrpsee::rpc_params;
    use jsonrpsee::MethodsError;
    use std::sync::Arc;
    use tokio_test::assert_err;
    use waitline_core::application::{EntryLedger, MaintenanceScheduler, QueueLocks, QueueRegistry};
    use waitline_core::domain::{Entry, Queue};
    use waitline_core::port::id_provider::mocks::SequentialIdProvider;
    use waitline_core::port::notifier::mocks::RecordingNotifier;
    use waitline_core::port::time_provider::mocks::FixedTimeProvider;
    use waitline_core::port::MaintenanceConfig;
    use waitline_infra_sqlite::{create_pool, run_migrations, SqliteMaintenance, SqliteStore};

    async fn module() -> RpcModule<RpcHandler> {
        let pool = create_pool(":memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = Arc::new(SqliteStore::new(pool));
        let clock = Arc::new(FixedTimeProvider::new(1_000));
        let locks = Arc::new(QueueLocks::new(std::time::Duration::from_secs(1)));

        let registry = Arc::new(QueueRegistry::new(
            store.clone(),
            locks.clone(),
            Arc::new(SequentialIdProvider::new("q")),
            clock.clone(),
        ));
        let ledger = Arc::new(EntryLedger::new(
            store.clone(),
            store.clone(),
            store.clone(),
            locks,
            Arc::new(RecordingNotifier::new()),
            clock.clone(),
        ));
        let maintenance = Arc::new(MaintenanceScheduler::new(
            Arc::new(SqliteMaintenance::new((*store).clone(), clock)),
            MaintenanceConfig::default(),
            24,
        ));
        let handler = RpcHandler::new(registry, ledger, maintenance, RateLimitConfig::default());
        RpcServer::new(RpcServerConfig::default(), handler)
            .into_module()
            .unwrap()
    }

    fn params(pairs: &[(&str, serde_json::Value)]) -> ObjectParams {
        let mut params = ObjectParams::new();
        for (name, value) in pairs {
            params.insert(name, value).unwrap();
        }
        params
    }

    fn error_code(err: MethodsError) -> i32 {
        match err {
            MethodsError::JsonRpc(obj) => obj.code(),
            other => panic!("expected a JSON-RPC error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_all_methods_registered() {
        let module = module().await;
        let names: Vec<&str> = module.method_names().collect();
        for method in [
            "queue.list.v1",
            "queue.get.v1",
            "queue.create.v1",
            "queue.update.v1",
            "queue.delete.v1",
            "entry.join.v1",
            "entry.list.v1",
            "entry.get.v1",
            "entry.call_next.v1",
            "entry.call.v1",
            "entry.serve.v1",
            "entry.cancel.v1",
            "admin.stats.v1",
            "admin.maintenance.v1",
            "system.health.v1",
        ] {
            assert!(names.contains(&method), "{} not registered", method);
        }
    }

    #[tokio::test]
    async fn test_optional_params_may_be_omitted() {
        let module = module().await;
        let queues: Vec<Queue> = module.call("queue.list.v1", rpc_params![]).await.unwrap();
        assert!(queues.is_empty());

        let report: serde_json::Value = module
            .call("admin.maintenance.v1", rpc_params![])
            .await
            .unwrap();
        assert_eq!(report["purged_entries"], 0);
    }

    #[tokio::test]
    async fn test_join_and_poll_in_process() {
        let module = module().await;
        let queue: Queue = module
            .call(
                "queue.create.v1",
                params(&[
                    ("staff_id", "staff-1".into()),
                    ("name", "Main".into()),
                    ("business_name", "Bakery".into()),
                    ("estimated_wait_minutes", 10.into()),
                ]),
            )
            .await
            .unwrap();

        for name in ["Ada", "Grace"] {
            let _: Entry = module
                .call(
                    "entry.join.v1",
                    params(&[
                        ("queue_id", queue.id.clone().into()),
                        ("customer_name", name.into()),
                        ("phone_number", "+15551234567".into()),
                    ]),
                )
                .await
                .unwrap();
        }

        let polled: Entry = module
            .call("entry.get.v1", params(&[("entry_id", 2.into())]))
            .await
            .unwrap();
        assert_eq!(polled.position, 2);
        assert_eq!(polled.estimated_wait_minutes, 10);
    }

    #[tokio::test]
    async fn test_errors_carry_application_codes() {
        let module = module().await;

        let missing = module
            .call::<_, Entry>("entry.get.v1", params(&[("entry_id", 42.into())]))
            .await;
        assert_eq!(error_code(assert_err!(missing)), code::NOT_FOUND);

        let invalid = module
            .call::<_, Queue>(
                "queue.create.v1",
                params(&[
                    ("staff_id", "staff-1".into()),
                    ("name", "".into()),
                    ("business_name", "Bakery".into()),
                ]),
            )
            .await;
        assert_eq!(error_code(assert_err!(invalid)), code::VALIDATION_ERROR);
    }
}

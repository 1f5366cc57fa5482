//! Bridge between the blocking store API and the async remote transport.
//!
//! Store construction needs remote query results before it can finish, so
//! queries block on a private runtime. Mutations only fire writes: they are
//! spawned on the same runtime and never awaited by the caller.

use std::sync::{Arc, Mutex};

use mvs_types::{QueryRequest, UpsertRecord};
use serde_json::Value;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{PersistError, PersistResult};
use crate::traits::{collapse_results, RemoteTransport};

/// Owns a private runtime. Writes that have not finished when the channel is
/// dropped are abandoned; call [`RemoteChannel::flush`] first to keep them.
pub struct RemoteChannel {
    runtime: Option<Runtime>,
    transport: Arc<dyn RemoteTransport>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl RemoteChannel {
    pub fn new(transport: Arc<dyn RemoteTransport>) -> PersistResult<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("mvs-remote")
            .enable_all()
            .build()
            .map_err(|e| PersistError::Runtime(format!("failed to create tokio runtime: {e}")))?;
        Ok(Self {
            runtime: Some(runtime),
            transport,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Run a list query to completion.
    ///
    /// Fails when called from inside an async runtime, where blocking would
    /// stall the caller's executor.
    pub fn query(&self, query: &QueryRequest) -> PersistResult<Value> {
        if Handle::try_current().is_ok() {
            return Err(PersistError::Runtime(
                "blocking remote query issued from inside an async context".into(),
            ));
        }
        let records = self.runtime()?.block_on(self.transport.list(query))?;
        debug!(class = %query.model_class, records = records.len(), "remote query done");
        Ok(collapse_results(records))
    }

    /// Spawn an upsert of `record`. Failures are logged, not retried.
    pub fn write(&self, record: UpsertRecord) {
        let runtime = match self.runtime() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(name = %record.name, error = %e, "remote write dropped");
                return;
            }
        };
        let transport = Arc::clone(&self.transport);
        let handle = runtime.spawn(async move {
            match transport.upsert(std::slice::from_ref(&record)).await {
                Ok(()) => debug!(name = %record.name, ty = %record.type_name, "remote write done"),
                Err(e) => warn!(name = %record.name, error = %e, "remote write failed"),
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Number of writes that have not completed yet.
    pub fn pending(&self) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.len()
    }

    /// Wait for every write spawned so far.
    pub fn flush(&self) -> PersistResult<()> {
        if Handle::try_current().is_ok() {
            return Err(PersistError::Runtime(
                "flush issued from inside an async context".into(),
            ));
        }
        let runtime = self.runtime()?;
        let handles = std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()));
        for handle in handles {
            if let Err(e) = runtime.block_on(handle) {
                warn!(error = %e, "remote write task aborted");
            }
        }
        Ok(())
    }

    fn runtime(&self) -> PersistResult<&Runtime> {
        self.runtime
            .as_ref()
            .ok_or_else(|| PersistError::Runtime("remote runtime already shut down".into()))
    }
}

impl Drop for RemoteChannel {
    fn drop(&mut self) {
        // A runtime may not be dropped where blocking is forbidden, such as
        // inside another runtime; shutting down in the background never blocks.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

//! NATS-based worker client.
//!
//! [`NatsWorkerClient`] implements the [`WorkerApi`] trait over NATS
//! request/reply: each of the five operations serializes its request
//! payload, publishes it on the operation's subject, and blocks until the
//! reply arrives.
//!
//! One connection is shared by every concurrent caller -- the supervisor,
//! the poller, and the control handler all clone this client, and the
//! underlying `async_nats::Client` interleaves their calls without mixing
//! up replies (each request gets its own reply inbox).
//!
//! Calls carry no deadline: the connection is opened with the request
//! timeout disabled, because the bulk evolve call legitimately runs for
//! as long as the whole simulation takes.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use lattice_core::{WorkerApi, WorkerError};
use lattice_types::{
    CONTROL_SUBJECT, ControlAction, ControlRequest, ControlResponse, EVOLVE_SUBJECT,
    EvolveRequest, EvolveResponse, PROGRESS_SUBJECT, Params, ProgressRequest, ProgressResponse,
    RESUME_SUBJECT, ResumeRequest, ResumeResponse, SNAPSHOT_SUBJECT, SnapshotRequest,
    SnapshotResponse, World,
};

/// A worker client over one long-lived NATS connection.
#[derive(Clone)]
pub struct NatsWorkerClient {
    client: async_nats::Client,
}

impl NatsWorkerClient {
    /// Connect to the worker's NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Connect`] if the connection cannot be
    /// established. Callers treat this as fatal.
    pub async fn connect(url: &str) -> Result<Self, WorkerError> {
        info!(url = url, "connecting to worker");
        let client = async_nats::ConnectOptions::new()
            .request_timeout(None)
            .connect(url)
            .await
            .map_err(|e| WorkerError::Connect {
                message: format!("failed to connect to {url}: {e}"),
            })?;
        info!("worker connection established");
        Ok(Self { client })
    }

    async fn round_trip<Req, Resp>(
        &self,
        subject: &'static str,
        request: &Req,
    ) -> Result<Resp, WorkerError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request).map_err(|e| WorkerError::Decode {
            message: format!("failed to serialize request for {subject}: {e}"),
        })?;
        let message = self
            .client
            .request(subject.to_owned(), payload.into())
            .await
            .map_err(|e| WorkerError::Request {
                message: format!("request on {subject} failed: {e}"),
            })?;
        serde_json::from_slice(&message.payload).map_err(|e| WorkerError::Decode {
            message: format!("failed to decode response from {subject}: {e}"),
        })
    }
}

impl WorkerApi for NatsWorkerClient {
    async fn evolve(&self, world: World, params: Params) -> Result<World, WorkerError> {
        let response: EvolveResponse = self
            .round_trip(EVOLVE_SUBJECT, &EvolveRequest { world, params })
            .await?;
        Ok(response.world)
    }

    async fn progress(&self) -> Result<ProgressResponse, WorkerError> {
        self.round_trip(PROGRESS_SUBJECT, &ProgressRequest::default())
            .await
    }

    async fn snapshot(&self) -> Result<SnapshotResponse, WorkerError> {
        self.round_trip(SNAPSHOT_SUBJECT, &SnapshotRequest::default())
            .await
    }

    async fn control(&self, action: ControlAction) -> Result<u64, WorkerError> {
        let response: ControlResponse = self
            .round_trip(CONTROL_SUBJECT, &ControlRequest { action })
            .await?;
        Ok(response.turn)
    }

    async fn resume(&self) -> Result<u64, WorkerError> {
        let response: ResumeResponse =
            self.round_trip(RESUME_SUBJECT, &ResumeRequest::default()).await?;
        Ok(response.turn)
    }
}

impl std::fmt::Debug for NatsWorkerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsWorkerClient")
            .field("connected", &true)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests that require a live NATS server are marked #[ignore].
    #[tokio::test]
    #[ignore]
    async fn connect_to_nats() {
        let result = NatsWorkerClient::connect("nats://localhost:4222").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unreachable_worker_is_a_connect_error() {
        // Nothing listens on this port.
        let result = NatsWorkerClient::connect("nats://localhost:1").await;
        assert!(matches!(result, Err(WorkerError::Connect { .. })));
    }
}

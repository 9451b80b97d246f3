//! NATS request/reply service over a [`LocalWorker`].
//!
//! The service subscribes to every `lattice.*` subject and answers each
//! request on its reply inbox. Long-running requests (the bulk evolve)
//! are handled in their own task so status probes keep being answered
//! while evolution runs.
//!
//! Every request gets a reply: handler failures are answered with an
//! error document, which the controller surfaces as a decode failure on
//! its side. A request left unanswered would hang its caller forever,
//! since controller calls carry no deadline.

use std::sync::Arc;

use futures::StreamExt as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use lattice_core::WorkerApi as _;
use lattice_types::{
    CONTROL_SUBJECT, ControlAction, ControlRequest, ControlResponse, EVOLVE_SUBJECT,
    EvolveRequest, EvolveResponse, PROGRESS_SUBJECT, ProgressRequest, ProgressResponse,
    RESUME_SUBJECT, ResumeRequest, ResumeResponse, SNAPSHOT_SUBJECT, SnapshotRequest,
    SnapshotResponse,
};

use crate::error::ServiceError;
use crate::local::LocalWorker;

/// Error document sent in place of a response when a handler fails.
#[derive(Debug, Serialize)]
struct ErrorReply<'a> {
    error: &'a str,
}

/// The worker's NATS front end.
#[derive(Clone)]
pub struct WorkerService {
    client: async_nats::Client,
    worker: LocalWorker,
    shutdown: Arc<Notify>,
}

impl WorkerService {
    /// Connect to a NATS server and create the service.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Nats`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, ServiceError> {
        info!(url = url, "connecting to NATS server");
        let client = async_nats::connect(url)
            .await
            .map_err(|e| ServiceError::Nats(format!("failed to connect to {url}: {e}")))?;
        info!("NATS connection established");
        Ok(Self {
            client,
            worker: LocalWorker::new(),
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Serve requests until a shutdown control request arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Nats`] if the subscription fails.
    pub async fn run(&self) -> Result<(), ServiceError> {
        let subject = "lattice.>";
        let mut requests = self
            .client
            .subscribe(subject.to_owned())
            .await
            .map_err(|e| ServiceError::Nats(format!("failed to subscribe to {subject}: {e}")))?;
        info!(subject = subject, "worker service listening");

        loop {
            tokio::select! {
                () = self.shutdown.notified() => {
                    info!("shutdown requested, worker service stopping");
                    break;
                }
                message = requests.next() => {
                    let Some(message) = message else { break };
                    let service = self.clone();
                    tokio::spawn(async move { service.handle(message).await });
                }
            }
        }
        let _ = requests.unsubscribe().await;
        Ok(())
    }

    async fn handle(&self, message: async_nats::Message) {
        let subject = message.subject.to_string();
        debug!(subject = subject, "request received");

        let (response, is_shutdown) = match subject.as_str() {
            EVOLVE_SUBJECT => (self.handle_evolve(&message.payload).await, false),
            PROGRESS_SUBJECT => (self.handle_progress(&message.payload).await, false),
            SNAPSHOT_SUBJECT => (self.handle_snapshot(&message.payload).await, false),
            CONTROL_SUBJECT => self.handle_control(&message.payload).await,
            RESUME_SUBJECT => (self.handle_resume(&message.payload).await, false),
            other => {
                warn!(subject = other, "unknown subject, ignoring");
                return;
            }
        };

        let payload = match response {
            Ok(payload) => payload,
            Err(e) => {
                warn!(subject = subject, error = %e, "request handling failed");
                serde_json::to_vec(&ErrorReply {
                    error: &e.to_string(),
                })
                .unwrap_or_default()
            }
        };

        if let Some(reply) = message.reply {
            if let Err(e) = self.client.publish(reply, payload.into()).await {
                warn!(subject = subject, error = %e, "failed to publish reply");
            }
            let _ = self.client.flush().await;
        }

        if is_shutdown {
            // notify_one stores a permit, so the stop is not lost if the
            // service loop is between polls when it fires.
            self.shutdown.notify_one();
        }
    }

    async fn handle_evolve(&self, payload: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let request: EvolveRequest = parse(payload)?;
        let world = self
            .worker
            .evolve(request.world, request.params)
            .await
            .map_err(|e| ServiceError::Worker(e.to_string()))?;
        encode(&EvolveResponse { world })
    }

    async fn handle_progress(&self, payload: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let _request: ProgressRequest = parse(payload)?;
        let report: ProgressResponse = self
            .worker
            .progress()
            .await
            .map_err(|e| ServiceError::Worker(e.to_string()))?;
        encode(&report)
    }

    async fn handle_snapshot(&self, payload: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let _request: SnapshotRequest = parse(payload)?;
        let snapshot: SnapshotResponse = self
            .worker
            .snapshot()
            .await
            .map_err(|e| ServiceError::Worker(e.to_string()))?;
        encode(&snapshot)
    }

    async fn handle_control(&self, payload: &[u8]) -> (Result<Vec<u8>, ServiceError>, bool) {
        let request: ControlRequest = match parse(payload) {
            Ok(request) => request,
            Err(e) => return (Err(e), false),
        };
        let result = self
            .worker
            .control(request.action)
            .await
            .map_err(|e| ServiceError::Worker(e.to_string()))
            .and_then(|turn| encode(&ControlResponse { turn }));
        // The reply goes out before the service loop is told to stop.
        let is_shutdown = result.is_ok() && request.action == ControlAction::Shutdown;
        (result, is_shutdown)
    }

    async fn handle_resume(&self, payload: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let _request: ResumeRequest = parse(payload)?;
        let turn = self
            .worker
            .resume()
            .await
            .map_err(|e| ServiceError::Worker(e.to_string()))?;
        encode(&ResumeResponse { turn })
    }
}

fn parse<T: DeserializeOwned>(payload: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(payload)
        .map_err(|e| ServiceError::Parse(format!("failed to parse request: {e}")))
}

fn encode<T: Serialize>(response: &T) -> Result<Vec<u8>, ServiceError> {
    serde_json::to_vec(response)
        .map_err(|e| ServiceError::Parse(format!("failed to serialize response: {e}")))
}

impl std::fmt::Debug for WorkerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerService")
            .field("session", &self.worker.session().map(|s| s.id()))
            .finish_non_exhaustive()
    }
}

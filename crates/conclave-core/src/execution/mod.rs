//! Code execution pipeline
//!
//! `submit` stores a `Pending` record and queues its id; it never runs code
//! on the caller's task and never waits for queue space. A full queue
//! rejects the submission before anything is stored. A dispatcher started with
//! [`ExecutionService::start`] pulls ids off the queue and runs each one on
//! the configured [`CodeExecutor`] behind a semaphore:
//!
//! ```text
//! Pending ──► Running ──► Completed | Failed | Timeout | Cancelled
//!    └──────────────────► Cancelled
//! ```
//!
//! The record store doubles as the list of in-flight work: after a restart
//! [`ExecutionService::recover`] requeues `Pending` records and fails the
//! ones left `Running`.
//!
//! A timed-out execution is signalled through its cancellation token and
//! given [`CANCEL_GRACE`] to hand back the output it produced so far.

mod queue;
mod record;

#[cfg(test)]
mod tests;

pub use queue::{ExecutionQueue, QueuePermit, QueueSlot};
pub use record::{ExecutionRecord, ExecutionStatus, SubmitExecution};

use chrono::Utc;
use conclave_sandbox::{CodeExecutor, ExecutionRequest, Language, SandboxOutput};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::agents::AgentService;
use crate::conversations::ConversationService;
use crate::error::{Error, Result};
use crate::event_bus::{EventBus, HubEvent};
use crate::repository::{Page, PageLimits, PageQuery, Repository};
use crate::shutdown::ShutdownController;

/// Error text for records found `Running` at startup
pub const INTERRUPTED: &str = "interrupted before completion";

/// How long a timed-out executor may take to return partial output
pub const CANCEL_GRACE: Duration = Duration::from_secs(1);

/// Pipeline settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Executions running at once
    pub max_concurrent: usize,
    /// Queued ids before `submit` rejects new work
    pub queue_capacity: usize,
    /// Timeout applied when the request gives none
    pub default_timeout_secs: u64,
    /// Largest accepted timeout
    pub max_timeout_secs: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            queue_capacity: 1024,
            default_timeout_secs: 30,
            max_timeout_secs: 300,
        }
    }
}

/// Counts from [`ExecutionService::recover`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// `Pending` records put back on the queue
    pub requeued: usize,
    /// `Running` records marked failed
    pub interrupted: usize,
    /// `Pending` records left out because the queue was full
    pub deferred: usize,
}

/// Accepts, tracks and dispatches code executions
pub struct ExecutionService {
    repo: Arc<dyn Repository<ExecutionRecord>>,
    agents: Arc<AgentService>,
    conversations: Arc<ConversationService>,
    executor: Arc<dyn CodeExecutor>,
    queue: ExecutionQueue,
    /// Cancellation handle per queued or running execution
    active: DashMap<Uuid, CancellationToken>,
    root_token: CancellationToken,
    events: Arc<EventBus>,
    config: ExecutionConfig,
    limits: PageLimits,
}

impl ExecutionService {
    /// Create the service; nothing runs until [`ExecutionService::start`]
    pub fn new(
        repo: Arc<dyn Repository<ExecutionRecord>>,
        agents: Arc<AgentService>,
        conversations: Arc<ConversationService>,
        executor: Arc<dyn CodeExecutor>,
        events: Arc<EventBus>,
        config: ExecutionConfig,
        limits: PageLimits,
    ) -> Self {
        Self {
            repo,
            agents,
            conversations,
            executor,
            queue: ExecutionQueue::new(config.queue_capacity, config.max_concurrent),
            active: DashMap::new(),
            root_token: CancellationToken::new(),
            events,
            config,
            limits,
        }
    }

    /// Validate, store as `Pending` and queue
    pub async fn submit(&self, request: SubmitExecution) -> Result<ExecutionRecord> {
        let language: Language = request.language.parse()?;
        if request.code.trim().is_empty() {
            return Err(Error::Validation("code must not be empty".to_string()));
        }
        let timeout_seconds = request
            .timeout_seconds
            .unwrap_or(self.config.default_timeout_secs);
        if !(1..=self.config.max_timeout_secs).contains(&timeout_seconds) {
            return Err(Error::Validation(format!(
                "timeout_seconds must be between 1 and {}",
                self.config.max_timeout_secs
            )));
        }
        if let Some(conversation_id) = request.conversation_id {
            if !self.conversations.exists(conversation_id).await? {
                return Err(Error::not_found("conversation", conversation_id));
            }
        }
        if let Some(agent_id) = request.requesting_agent_id {
            self.agents.ensure_exists(agent_id).await?;
        }

        let slot = self.queue.try_reserve()?;
        let record = self
            .repo
            .insert(ExecutionRecord {
                id: Uuid::new_v4(),
                language,
                code: request.code,
                conversation_id: request.conversation_id,
                requesting_agent_id: request.requesting_agent_id,
                timeout_seconds,
                limits: request.limits.unwrap_or_default(),
                status: ExecutionStatus::Pending,
                result: None,
                error: None,
                created_at: Utc::now(),
                started_at: None,
                completed_at: None,
                version: 1,
            })
            .await?;

        self.active
            .insert(record.id, self.root_token.child_token());
        slot.send(record.id);

        info!(
            execution_id = %record.id,
            language = %record.language,
            timeout_seconds,
            "Execution submitted"
        );
        Ok(record)
    }

    /// Fetch a record
    pub async fn get(&self, id: Uuid) -> Result<ExecutionRecord> {
        self.repo.get(id).await
    }

    /// List records by submission time, optionally filtered by status
    pub async fn list(
        &self,
        query: PageQuery,
        status: Option<ExecutionStatus>,
    ) -> Result<Vec<ExecutionRecord>> {
        let page = Page::resolve(query, self.limits);
        match status {
            None => self.repo.list(page).await,
            Some(status) => {
                let all = self.repo.list(Page::ALL).await?;
                Ok(page.apply(all.into_iter().filter(|r| r.status == status)))
            }
        }
    }

    /// Record counts keyed by status
    pub async fn count_by_status(&self) -> Result<BTreeMap<ExecutionStatus, usize>> {
        let mut counts: BTreeMap<ExecutionStatus, usize> =
            ExecutionStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for record in self.repo.list(Page::ALL).await? {
            *counts.entry(record.status).or_default() += 1;
        }
        Ok(counts)
    }

    /// Delete a finished record
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let record = self.repo.get(id).await?;
        if !record.status.is_terminal() {
            return Err(Error::InvalidState(format!(
                "execution {} is {}; cancel it first",
                id, record.status
            )));
        }
        self.repo.delete(id).await?;
        debug!(execution_id = %id, "Execution deleted");
        Ok(())
    }

    /// Cancel a pending or running execution
    ///
    /// A pending record becomes `Cancelled` at once. For a running one the
    /// executor is signalled and the worker records `Cancelled`; the record
    /// returned is still `Running`.
    pub async fn cancel(&self, id: Uuid) -> Result<ExecutionRecord> {
        let outcome = self
            .repo
            .update(
                id,
                Box::new(|r: &mut ExecutionRecord| {
                    if r.status != ExecutionStatus::Pending {
                        return Err(Error::InvalidState(format!(
                            "execution is {}",
                            r.status
                        )));
                    }
                    r.transition(ExecutionStatus::Cancelled)
                }),
            )
            .await;

        match outcome {
            Ok(record) => {
                if let Some((_, token)) = self.active.remove(&id) {
                    token.cancel();
                }
                info!(execution_id = %id, "Pending execution cancelled");
                self.announce(&record);
                return Ok(record);
            }
            Err(Error::InvalidState(_)) => {}
            Err(e) => return Err(e),
        }

        let record = self.repo.get(id).await?;
        if record.status == ExecutionStatus::Running {
            if let Some(token) = self.active.get(&id) {
                token.cancel();
            }
            info!(execution_id = %id, "Cancellation requested for running execution");
            return Ok(record);
        }
        Err(Error::InvalidState(format!(
            "execution {} is already {}",
            id, record.status
        )))
    }

    /// Requeue `Pending` records and fail `Running` ones left from a previous run
    ///
    /// Records already queued by this process are left alone. Once the
    /// dispatcher runs, requeueing waits for queue space; before that, records
    /// that do not fit stay `Pending` and are counted as deferred.
    pub async fn recover(&self) -> Result<RecoveryReport> {
        let mut report = RecoveryReport::default();
        let dispatching = self.queue.is_dispatching();
        for record in self.repo.list(Page::ALL).await? {
            match record.status {
                ExecutionStatus::Pending if self.active.contains_key(&record.id) => {}
                ExecutionStatus::Pending => {
                    let slot = if dispatching {
                        self.queue.reserve().await?
                    } else {
                        match self.queue.try_reserve() {
                            Ok(slot) => slot,
                            Err(Error::InvalidState(_)) => {
                                report.deferred += 1;
                                continue;
                            }
                            Err(e) => return Err(e),
                        }
                    };
                    self.active
                        .insert(record.id, self.root_token.child_token());
                    slot.send(record.id);
                    report.requeued += 1;
                }
                ExecutionStatus::Running => {
                    let failed = self
                        .repo
                        .update(
                            record.id,
                            Box::new(|r: &mut ExecutionRecord| {
                                r.transition(ExecutionStatus::Failed)?;
                                r.error = Some(INTERRUPTED.to_string());
                                Ok(())
                            }),
                        )
                        .await?;
                    self.active.remove(&record.id);
                    self.announce(&failed);
                    report.interrupted += 1;
                }
                _ => {}
            }
        }
        if report.deferred > 0 {
            warn!(
                deferred = report.deferred,
                "Execution queue full; pending records left for the next recovery"
            );
        }
        if report != RecoveryReport::default() {
            info!(
                requeued = report.requeued,
                interrupted = report.interrupted,
                deferred = report.deferred,
                "Execution records recovered"
            );
        }
        Ok(report)
    }

    /// Spawn the dispatcher; fails if it was already started
    pub fn start(self: &Arc<Self>, shutdown: Arc<ShutdownController>) -> Result<JoinHandle<()>> {
        let receiver = self
            .queue
            .take_receiver()
            .ok_or_else(|| Error::InvalidState("execution dispatcher already started".to_string()))?;
        let service = Arc::clone(self);
        info!(
            executor = self.executor.name(),
            workers = self.queue.max_concurrent(),
            "Execution dispatcher started"
        );
        Ok(tokio::spawn(service.dispatch(receiver, shutdown)))
    }

    /// Ids waiting to be picked up
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    async fn dispatch(
        self: Arc<Self>,
        mut receiver: tokio::sync::mpsc::Receiver<Uuid>,
        shutdown: Arc<ShutdownController>,
    ) {
        let stop = shutdown.token();
        loop {
            let id = tokio::select! {
                _ = stop.cancelled() => break,
                next = receiver.recv() => match next {
                    Some(id) => id,
                    None => break,
                },
            };

            let permit = tokio::select! {
                _ = stop.cancelled() => break,
                permit = self.queue.acquire() => match permit {
                    Ok(permit) => permit,
                    Err(e) => {
                        error!(error = %e, "Execution dispatcher cannot acquire a slot");
                        break;
                    }
                },
            };

            let guard = shutdown.register_task();
            let service = Arc::clone(&self);
            tokio::spawn(async move {
                service.run_one(id).await;
                drop(permit);
                drop(guard);
            });
        }

        self.root_token.cancel();
        info!("Execution dispatcher stopped");
    }

    async fn run_one(&self, id: Uuid) {
        let record = match self
            .repo
            .update(
                id,
                Box::new(|r: &mut ExecutionRecord| r.transition(ExecutionStatus::Running)),
            )
            .await
        {
            Ok(record) => record,
            Err(e) => {
                // cancelled or deleted while queued
                debug!(execution_id = %id, error = %e, "Skipping queued execution");
                self.active.remove(&id);
                return;
            }
        };

        let token = self
            .active
            .entry(id)
            .or_insert_with(|| self.root_token.child_token())
            .value()
            .clone();
        let request = ExecutionRequest::new(record.language, record.code.clone())
            .with_limits(record.limits.clone());
        let timeout = Duration::from_secs(record.timeout_seconds);

        debug!(execution_id = %id, language = %record.language, "Execution running");
        let mut execution = self.executor.execute(&request, token.clone());
        let outcome = match tokio::time::timeout(timeout, &mut execution).await {
            Ok(result) => Ok(result),
            Err(_) => {
                token.cancel();
                let partial = tokio::time::timeout(CANCEL_GRACE, &mut execution)
                    .await
                    .ok()
                    .and_then(|result| result.ok());
                Err(partial)
            }
        };
        drop(execution);

        let (status, result, error) = match outcome {
            Ok(Ok(output)) if token.is_cancelled() => (
                ExecutionStatus::Cancelled,
                Some(output),
                Some("cancelled".to_string()),
            ),
            Ok(Ok(output)) if output.is_success() => (ExecutionStatus::Completed, Some(output), None),
            Ok(Ok(output)) => (ExecutionStatus::Failed, Some(output), None),
            Ok(Err(conclave_sandbox::Error::Cancelled)) => (
                ExecutionStatus::Cancelled,
                None,
                Some("cancelled".to_string()),
            ),
            Ok(Err(e)) => {
                warn!(execution_id = %id, error = %e, "Executor failed");
                (
                    ExecutionStatus::Failed,
                    Some(SandboxOutput::failure(e.to_string(), -1)),
                    None,
                )
            }
            Err(partial) => (
                ExecutionStatus::Timeout,
                partial,
                Some(format!("timed out after {}s", record.timeout_seconds)),
            ),
        };

        self.finish(id, status, result, error).await;
    }

    async fn finish(
        &self,
        id: Uuid,
        status: ExecutionStatus,
        result: Option<SandboxOutput>,
        error: Option<String>,
    ) {
        self.active.remove(&id);
        let stored = self
            .repo
            .update(
                id,
                Box::new(move |r: &mut ExecutionRecord| {
                    r.transition(status)?;
                    r.result = result;
                    r.error = error;
                    Ok(())
                }),
            )
            .await;

        match stored {
            Ok(record) => {
                info!(
                    execution_id = %id,
                    status = %record.status,
                    exit_code = record.result.as_ref().map(|o| o.exit_code),
                    "Execution finished"
                );
                self.announce(&record);
            }
            Err(e) => warn!(execution_id = %id, error = %e, "Failed to store execution result"),
        }
    }

    fn announce(&self, record: &ExecutionRecord) {
        self.events.publish(HubEvent::ExecutionCompleted {
            execution_id: record.id,
            conversation_id: record.conversation_id,
            status: record.status,
        });
    }
}

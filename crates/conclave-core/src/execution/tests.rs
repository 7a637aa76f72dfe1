use super::*;
use crate::agents::CreateAgent;
use crate::conversations::CreateConversation;
use crate::message_log::MessageLog;
use crate::repository::MemoryRepository;
use async_trait::async_trait;
use conclave_sandbox::{MockExecutor, MockExecutorConfig, ResourceLimits};
use mockall::mock;
use tokio::sync::broadcast;

mock! {
    pub Backend {}

    #[async_trait]
    impl CodeExecutor for Backend {
        fn name(&self) -> &str;
        async fn execute(
            &self,
            request: &ExecutionRequest,
            cancel: CancellationToken,
        ) -> conclave_sandbox::Result<SandboxOutput>;
    }
}

struct Fixture {
    service: Arc<ExecutionService>,
    repo: Arc<MemoryRepository<ExecutionRecord>>,
    agents: Arc<AgentService>,
    conversations: Arc<ConversationService>,
    events: Arc<EventBus>,
    shutdown: Arc<ShutdownController>,
}

fn fixture_with(executor: Arc<dyn CodeExecutor>, config: ExecutionConfig) -> Fixture {
    let events = Arc::new(EventBus::new(64));
    let limits = PageLimits::default();
    let agents = Arc::new(AgentService::new(
        Arc::new(MemoryRepository::new()),
        events.clone(),
        limits,
    ));
    let conversations = Arc::new(ConversationService::new(
        Arc::new(MemoryRepository::new()),
        agents.clone(),
        Arc::new(MessageLog::new()),
        events.clone(),
        limits,
    ));
    let repo = Arc::new(MemoryRepository::new());
    let service = Arc::new(ExecutionService::new(
        repo.clone(),
        agents.clone(),
        conversations.clone(),
        executor,
        events.clone(),
        config,
        limits,
    ));
    Fixture {
        service,
        repo,
        agents,
        conversations,
        events,
        shutdown: ShutdownController::new(),
    }
}

fn fixture(delay: Duration) -> Fixture {
    fixture_with(
        Arc::new(MockExecutor::new(MockExecutorConfig::default().with_delay(delay))),
        ExecutionConfig::default(),
    )
}

async fn next_completion(rx: &mut broadcast::Receiver<HubEvent>) -> (Uuid, ExecutionStatus) {
    loop {
        if let HubEvent::ExecutionCompleted {
            execution_id,
            status,
            ..
        } = rx.recv().await.unwrap()
        {
            return (execution_id, status);
        }
    }
}

async fn wait_for_status(service: &ExecutionService, id: Uuid, status: ExecutionStatus) {
    for _ in 0..1000 {
        if service.get(id).await.unwrap().status == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("execution {} never reached {}", id, status);
}

#[tokio::test]
async fn test_submit_is_pending_then_completes() {
    let f = fixture(Duration::ZERO);
    let mut rx = f.events.subscribe();

    let record = f
        .service
        .submit(SubmitExecution::new("python", "print('hello')"))
        .await
        .unwrap();
    assert_eq!(record.status, ExecutionStatus::Pending);
    assert_eq!(record.timeout_seconds, 30);
    assert_eq!(f.service.queue_depth(), 1);

    f.service.start(f.shutdown.clone()).unwrap();
    let (id, status) = next_completion(&mut rx).await;
    assert_eq!(id, record.id);
    assert_eq!(status, ExecutionStatus::Completed);

    let stored = f.service.get(record.id).await.unwrap();
    assert_eq!(stored.status, ExecutionStatus::Completed);
    assert_eq!(stored.result.unwrap().stdout, "hello\n");
    assert!(stored.started_at.is_some());
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn test_nonzero_exit_is_failed() {
    let f = fixture(Duration::ZERO);
    let mut rx = f.events.subscribe();
    f.service.start(f.shutdown.clone()).unwrap();

    let record = f
        .service
        .submit(SubmitExecution::new("python", "raise ValueError('bad')"))
        .await
        .unwrap();
    assert_eq!(next_completion(&mut rx).await.1, ExecutionStatus::Failed);

    let stored = f.service.get(record.id).await.unwrap();
    let output = stored.result.unwrap();
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("ValueError"));
}

#[tokio::test(start_paused = true)]
async fn test_long_delay_times_out() {
    let f = fixture(Duration::from_secs(60));
    let mut rx = f.events.subscribe();
    f.service.start(f.shutdown.clone()).unwrap();

    let record = f
        .service
        .submit(SubmitExecution::new("bash", "echo slow").with_timeout(1))
        .await
        .unwrap();
    let (id, status) = next_completion(&mut rx).await;
    assert_eq!(id, record.id);
    assert_eq!(status, ExecutionStatus::Timeout);

    let stored = f.service.get(record.id).await.unwrap();
    assert!(stored.error.unwrap().contains("timed out"));
    // the mock prints nothing before its delay ends
    assert!(stored.result.is_none());
}

/// Streams output until cancelled, then hands back what it has
struct StreamingBackend;

#[async_trait]
impl CodeExecutor for StreamingBackend {
    fn name(&self) -> &str {
        "streaming"
    }

    async fn execute(
        &self,
        _request: &ExecutionRequest,
        cancel: CancellationToken,
    ) -> conclave_sandbox::Result<SandboxOutput> {
        cancel.cancelled().await;
        let mut output = SandboxOutput::failure("", -1);
        output.stdout = "step 1\nstep 2\n".to_string();
        Ok(output)
    }
}

#[tokio::test(start_paused = true)]
async fn test_timeout_keeps_partial_output() {
    let f = fixture_with(Arc::new(StreamingBackend), ExecutionConfig::default());
    let mut rx = f.events.subscribe();
    f.service.start(f.shutdown.clone()).unwrap();

    let record = f
        .service
        .submit(SubmitExecution::new("python", "while True: print('step')").with_timeout(2))
        .await
        .unwrap();
    assert_eq!(
        next_completion(&mut rx).await,
        (record.id, ExecutionStatus::Timeout)
    );

    let stored = f.service.get(record.id).await.unwrap();
    assert_eq!(stored.error.as_deref(), Some("timed out after 2s"));
    assert_eq!(stored.result.unwrap().stdout, "step 1\nstep 2\n");
}

#[tokio::test(start_paused = true)]
async fn test_full_queue_rejects_without_storing() {
    let f = fixture_with(
        Arc::new(MockExecutor::new(
            MockExecutorConfig::default().with_delay(Duration::from_secs(60)),
        )),
        ExecutionConfig {
            max_concurrent: 1,
            queue_capacity: 1,
            ..ExecutionConfig::default()
        },
    );
    f.service.start(f.shutdown.clone()).unwrap();

    // one running, one held by the dispatcher waiting for a worker, one queued
    let running = f
        .service
        .submit(SubmitExecution::new("python", "print(1)"))
        .await
        .unwrap();
    wait_for_status(&f.service, running.id, ExecutionStatus::Running).await;
    f.service
        .submit(SubmitExecution::new("python", "print(2)"))
        .await
        .unwrap();
    while f.service.queue_depth() > 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    f.service
        .submit(SubmitExecution::new("python", "print(3)"))
        .await
        .unwrap();

    for _ in 0..3 {
        let rejected = tokio::time::timeout(
            Duration::from_millis(500),
            f.service.submit(SubmitExecution::new("python", "print(4)")),
        )
        .await
        .expect("submit must not wait for queue space");
        assert!(matches!(
            rejected,
            Err(Error::InvalidState(msg)) if msg == "execution queue is full"
        ));
    }
    assert_eq!(f.repo.count().await.unwrap(), 3);
    assert_eq!(f.service.queue_depth(), 1);
}

#[tokio::test]
async fn test_cancel_pending() {
    let f = fixture(Duration::ZERO);
    let mut rx = f.events.subscribe();
    let record = f
        .service
        .submit(SubmitExecution::new("python", "print('never')"))
        .await
        .unwrap();

    let cancelled = f.service.cancel(record.id).await.unwrap();
    assert_eq!(cancelled.status, ExecutionStatus::Cancelled);
    assert_eq!(next_completion(&mut rx).await.1, ExecutionStatus::Cancelled);

    // the queued id is skipped once the dispatcher starts
    f.service.start(f.shutdown.clone()).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let stored = f.service.get(record.id).await.unwrap();
    assert_eq!(stored.status, ExecutionStatus::Cancelled);
    assert!(stored.result.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_running() {
    let f = fixture(Duration::from_secs(60));
    let mut rx = f.events.subscribe();
    f.service.start(f.shutdown.clone()).unwrap();

    let record = f
        .service
        .submit(SubmitExecution::new("python", "print('x')").with_timeout(120))
        .await
        .unwrap();
    wait_for_status(&f.service, record.id, ExecutionStatus::Running).await;

    let requested = f.service.cancel(record.id).await.unwrap();
    assert_eq!(requested.status, ExecutionStatus::Running);
    assert_eq!(next_completion(&mut rx).await.1, ExecutionStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_finished_is_invalid_state() {
    let f = fixture(Duration::ZERO);
    let mut rx = f.events.subscribe();
    f.service.start(f.shutdown.clone()).unwrap();

    let record = f
        .service
        .submit(SubmitExecution::new("javascript", "console.log('done')"))
        .await
        .unwrap();
    next_completion(&mut rx).await;

    assert!(matches!(
        f.service.cancel(record.id).await,
        Err(Error::InvalidState(_))
    ));
    assert!(matches!(
        f.service.cancel(Uuid::new_v4()).await,
        Err(Error::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_submit_validation() {
    let f = fixture(Duration::ZERO);
    let cases = [
        SubmitExecution::new("python", "   "),
        SubmitExecution::new("cobol", "DISPLAY 'HI'"),
        SubmitExecution::new("python", "print(1)").with_timeout(0),
        SubmitExecution::new("python", "print(1)").with_timeout(301),
    ];
    for request in cases {
        assert!(matches!(
            f.service.submit(request).await,
            Err(Error::Validation(_))
        ));
    }

    assert!(matches!(
        f.service
            .submit(SubmitExecution::new("python", "print(1)").in_conversation(Uuid::new_v4()))
            .await,
        Err(Error::NotFound {
            kind: "conversation",
            ..
        })
    ));

    let mut request = SubmitExecution::new("python", "print(1)");
    request.requesting_agent_id = Some(Uuid::new_v4());
    assert!(matches!(
        f.service.submit(request).await,
        Err(Error::NotFound { kind: "agent", .. })
    ));
}

#[tokio::test]
async fn test_completion_event_carries_conversation() {
    let f = fixture(Duration::ZERO);
    let a = f.agents.create(CreateAgent::named("a")).await.unwrap();
    let b = f.agents.create(CreateAgent::named("b")).await.unwrap();
    let conversation = f
        .conversations
        .create(CreateConversation {
            title: "code".into(),
            participant_ids: vec![a.id, b.id],
        })
        .await
        .unwrap();

    let mut rx = f.events.subscribe();
    f.service.start(f.shutdown.clone()).unwrap();
    f.service
        .submit(SubmitExecution::new("rust", "println!(\"hi\");").in_conversation(conversation.id))
        .await
        .unwrap();

    loop {
        if let event @ HubEvent::ExecutionCompleted { .. } = rx.recv().await.unwrap() {
            assert_eq!(
                event.topic(),
                Some(crate::event_bus::Topic::Conversation(conversation.id))
            );
            break;
        }
    }
}

#[tokio::test]
async fn test_executor_error_becomes_failed_record() {
    let mut backend = MockBackend::new();
    backend.expect_name().return_const("flaky".to_string());
    backend
        .expect_execute()
        .times(1)
        .returning(|_, _| Err(conclave_sandbox::Error::Backend("runtime unavailable".into())));

    let f = fixture_with(Arc::new(backend), ExecutionConfig::default());
    let mut rx = f.events.subscribe();
    f.service.start(f.shutdown.clone()).unwrap();

    let record = f
        .service
        .submit(SubmitExecution::new("python", "print(1)"))
        .await
        .unwrap();
    assert_eq!(next_completion(&mut rx).await.1, ExecutionStatus::Failed);

    let output = f.service.get(record.id).await.unwrap().result.unwrap();
    assert!(output.stderr.contains("runtime unavailable"));
}

#[tokio::test]
async fn test_executor_receives_limits() {
    let mut backend = MockBackend::new();
    backend.expect_name().return_const("checked".to_string());
    backend
        .expect_execute()
        .withf(|request, _| {
            request.language == Language::Bash && request.limits.max_output_length == 8
        })
        .times(1)
        .returning(|_, _| Ok(SandboxOutput::success("ok")));

    let f = fixture_with(Arc::new(backend), ExecutionConfig::default());
    let mut rx = f.events.subscribe();
    f.service.start(f.shutdown.clone()).unwrap();

    let mut request = SubmitExecution::new("sh", "echo ok");
    request.limits = Some(ResourceLimits::default().with_output_length(8));
    f.service.submit(request).await.unwrap();
    assert_eq!(next_completion(&mut rx).await.1, ExecutionStatus::Completed);
}

#[tokio::test]
async fn test_recover_requeues_pending_and_fails_running() {
    let f = fixture(Duration::ZERO);
    let queued = f
        .service
        .submit(SubmitExecution::new("python", "print('queued')"))
        .await
        .unwrap();

    // records left behind by a previous run
    let mut leftover = queued.clone();
    leftover.id = Uuid::new_v4();
    leftover.code = "print('later')".to_string();
    f.repo.insert(leftover.clone()).await.unwrap();
    let mut stale = queued.clone();
    stale.id = Uuid::new_v4();
    stale.status = ExecutionStatus::Running;
    f.repo.insert(stale.clone()).await.unwrap();

    let report = f.service.recover().await.unwrap();
    assert_eq!(
        report,
        RecoveryReport {
            requeued: 1,
            interrupted: 1,
            deferred: 0,
        }
    );
    assert_eq!(f.service.queue_depth(), 2);

    let failed = f.service.get(stale.id).await.unwrap();
    assert_eq!(failed.status, ExecutionStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some(INTERRUPTED));

    let mut rx = f.events.subscribe();
    f.service.start(f.shutdown.clone()).unwrap();
    let mut finished = vec![next_completion(&mut rx).await, next_completion(&mut rx).await];
    finished.sort();
    let mut expected = vec![
        (queued.id, ExecutionStatus::Completed),
        (leftover.id, ExecutionStatus::Completed),
    ];
    expected.sort();
    assert_eq!(finished, expected);
}

#[tokio::test]
async fn test_recover_defers_what_does_not_fit() {
    let f = fixture_with(
        Arc::new(MockExecutor::new(MockExecutorConfig::default())),
        ExecutionConfig {
            queue_capacity: 1,
            ..ExecutionConfig::default()
        },
    );
    let template = f
        .service
        .submit(SubmitExecution::new("python", "print(0)"))
        .await
        .unwrap();
    f.service.cancel(template.id).await.unwrap();

    let mut leftovers = Vec::new();
    for _ in 0..2 {
        let mut record = template.clone();
        record.id = Uuid::new_v4();
        record.status = ExecutionStatus::Pending;
        f.repo.insert(record.clone()).await.unwrap();
        leftovers.push(record.id);
    }

    // the cancelled id still holds the only slot until the dispatcher runs
    let before_start = tokio::time::timeout(Duration::from_secs(5), f.service.recover())
        .await
        .expect("recover must not wait for a dispatcher that is not running")
        .unwrap();
    assert_eq!(before_start.requeued, 0);
    assert_eq!(before_start.deferred, 2);

    f.service.start(f.shutdown.clone()).unwrap();
    let after_start = f.service.recover().await.unwrap();
    assert_eq!(after_start.requeued, 2);
    assert_eq!(after_start.deferred, 0);
    for id in leftovers {
        wait_for_status(&f.service, id, ExecutionStatus::Completed).await;
    }
}

#[tokio::test]
async fn test_delete_requires_terminal_state() {
    let f = fixture(Duration::ZERO);
    let record = f
        .service
        .submit(SubmitExecution::new("python", "print(1)"))
        .await
        .unwrap();
    assert!(matches!(
        f.service.delete(record.id).await,
        Err(Error::InvalidState(_))
    ));

    f.service.cancel(record.id).await.unwrap();
    f.service.delete(record.id).await.unwrap();
    assert!(matches!(
        f.service.get(record.id).await,
        Err(Error::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_list_filter_and_counts() {
    let f = fixture(Duration::ZERO);
    let first = f
        .service
        .submit(SubmitExecution::new("python", "print(1)"))
        .await
        .unwrap();
    f.service
        .submit(SubmitExecution::new("python", "print(2)"))
        .await
        .unwrap();
    f.service.cancel(first.id).await.unwrap();

    let cancelled = f
        .service
        .list(PageQuery::default(), Some(ExecutionStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, first.id);
    assert_eq!(
        f.service
            .list(PageQuery::default(), None)
            .await
            .unwrap()
            .len(),
        2
    );

    let counts = f.service.count_by_status().await.unwrap();
    assert_eq!(counts[&ExecutionStatus::Pending], 1);
    assert_eq!(counts[&ExecutionStatus::Cancelled], 1);
    assert_eq!(counts[&ExecutionStatus::Running], 0);
}

#[tokio::test]
async fn test_start_twice_fails() {
    let f = fixture(Duration::ZERO);
    f.service.start(f.shutdown.clone()).unwrap();
    assert!(matches!(
        f.service.start(f.shutdown.clone()),
        Err(Error::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_shutdown_stops_dispatcher() {
    let f = fixture(Duration::ZERO);
    let handle = f.service.start(f.shutdown.clone()).unwrap();
    f.shutdown.shutdown().await;
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}

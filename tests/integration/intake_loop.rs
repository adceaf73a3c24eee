//! Message intake over the in-process channel transport.

use aoe_executor::composition::build_engine;
use aoe_executor::config::EngineConfig;
use aoe_executor::engine::DispatchOutcome;
use aoe_executor::error::TransportError;
use aoe_executor::intake::{IntakeLoop, IntakeStats};
use aoe_executor::store::InMemoryFactStore;
use aoe_executor::transport::{plan_channel, replan_channel, Delivery, PlanSource};
use aoe_executor::types::{Action, ExecutorSpec, Goal, Plan};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::test_utils::MockExecutorService;

#[tokio::test]
async fn test_mixed_stream_is_settled_in_order() {
    let service = MockExecutorService::start().await;
    let facts = Arc::new(InMemoryFactStore::new());
    let (replan_sink, mut replans) = replan_channel();
    let engine = Arc::new(
        build_engine(&EngineConfig::default(), facts.clone(), Arc::new(replan_sink)).unwrap(),
    );
    let (sender, source) = plan_channel(8);
    let source = Arc::new(source);

    let web_up = Goal::new("web-up").with_desired("service_web_healthy", true);
    let db_up = Goal::new("db-up").with_desired("service_db_healthy", true);

    sender.dispatch_raw(b"{not a plan".to_vec()).await.unwrap();
    sender
        .dispatch(&Plan::new(
            web_up.clone(),
            vec![Action::new(
                "restart_web",
                ExecutorSpec::http("POST", service.url("/restart/web")),
            )],
        ))
        .await
        .unwrap();
    sender
        .dispatch(&Plan::new(
            db_up.clone(),
            vec![Action::new("restart_db", ExecutorSpec::http("POST", service.url("/fail")))],
        ))
        .await
        .unwrap();
    drop(sender);

    let intake = IntakeLoop::new(source.clone(), engine);
    let stats = intake.run(std::future::pending()).await;

    assert_eq!(
        stats,
        IntakeStats {
            received: 3,
            rejected: 1,
            achieved: 1,
            replanned: 1,
        }
    );
    assert_eq!(source.rejected(), vec![1]);
    assert_eq!(source.acked(), vec![2, 3]);
    assert_eq!(facts.get("service_web_healthy").as_deref(), Some("true"));
    assert_eq!(replans.recv().await, Some(db_up));
    assert!(replans.try_recv().is_err());
}

#[tokio::test]
async fn test_malformed_payload_never_touches_fact_base() {
    let facts = Arc::new(InMemoryFactStore::new());
    let (replan_sink, mut replans) = replan_channel();
    let engine = Arc::new(
        build_engine(&EngineConfig::default(), facts.clone(), Arc::new(replan_sink)).unwrap(),
    );
    let (_sender, source) = plan_channel(1);
    let source = Arc::new(source);
    let intake = IntakeLoop::new(source.clone(), engine);

    // Valid JSON, wrong shape: steps carry no executor.
    let delivery = Delivery::new(
        7,
        br#"{"targetGoal": {"name": "web-up"}, "steps": [{"name": "restart", "effects": {"x": 1}}]}"#
            .to_vec(),
    );
    assert_eq!(intake.process(&delivery).await, DispatchOutcome::Rejected);
    assert!(facts.is_empty());
    assert_eq!(source.rejected(), vec![7]);
    assert!(source.acked().is_empty());
    assert!(replans.try_recv().is_err());
}

#[tokio::test]
async fn test_unknown_executor_kind_is_acked_and_replanned() {
    let facts = Arc::new(InMemoryFactStore::new());
    let (replan_sink, mut replans) = replan_channel();
    let engine = Arc::new(
        build_engine(&EngineConfig::default(), facts.clone(), Arc::new(replan_sink)).unwrap(),
    );
    let (_sender, source) = plan_channel(1);
    let source = Arc::new(source);
    let intake = IntakeLoop::new(source.clone(), engine);

    let payload = br#"{
        "targetGoal": {"name": "web-up", "desiredState": {"service_web_healthy": true}},
        "steps": [{"name": "restart", "effects": {"service_web_healthy": true},
                   "executor": {"type": "ssh"}}]
    }"#;
    let outcome = intake.process(&Delivery::new(1, payload.to_vec())).await;

    assert!(matches!(outcome, DispatchOutcome::Replanned { .. }));
    assert_eq!(source.acked(), vec![1]);
    assert!(facts.is_empty());
    let goal = replans.recv().await.unwrap();
    assert_eq!(goal.name, "web-up");
}

#[tokio::test]
async fn test_planner_payload_with_null_fields_runs() {
    let service = MockExecutorService::start().await;
    let facts = Arc::new(InMemoryFactStore::new());
    let (replan_sink, mut replans) = replan_channel();
    let engine = Arc::new(
        build_engine(&EngineConfig::default(), facts.clone(), Arc::new(replan_sink)).unwrap(),
    );
    let (_sender, source) = plan_channel(1);
    let source = Arc::new(source);
    let intake = IntakeLoop::new(source.clone(), engine);

    let payload = format!(
        r#"{{
        "targetGoal": {{"name": "port-free", "desiredState": {{"port_open": false, "port_cleared": true}}}},
        "steps": [
            {{"name": "diagnose", "preconditions": null, "effects": null, "cost": 1,
              "executor": {{"type": "http", "method": "GET", "url": "{}", "headers": null, "body": null}}}},
            {{"name": "free_port", "preconditions": null, "effects": {{"port_cleared": true}}, "cost": 1,
              "executor": {{"type": "cli", "method": null, "url": null, "headers": null, "body": null}}}}
        ],
        "totalCost": 2
    }}"#,
        service.url("/diagnostics")
    );
    let outcome = intake.process(&Delivery::new(4, payload.into_bytes())).await;

    assert_eq!(outcome, DispatchOutcome::GoalAchieved);
    assert_eq!(source.acked(), vec![4]);
    assert!(source.rejected().is_empty());
    assert_eq!(service.paths(), vec!["/diagnostics".to_string()]);
    assert_eq!(facts.get("port_open").as_deref(), Some("false"));
    assert_eq!(facts.get("port_cleared").as_deref(), Some("true"));
    assert!(replans.try_recv().is_err());
}

#[tokio::test]
async fn test_shutdown_stops_idle_loop() {
    let facts = Arc::new(InMemoryFactStore::new());
    let (replan_sink, _replans) = replan_channel();
    let engine = Arc::new(
        build_engine(&EngineConfig::default(), facts, Arc::new(replan_sink)).unwrap(),
    );
    let (_sender, source) = plan_channel(1);
    let intake = IntakeLoop::new(Arc::new(source), engine);

    let stats = tokio::time::timeout(
        Duration::from_secs(5),
        intake.run(tokio::time::sleep(Duration::from_millis(50))),
    )
    .await
    .expect("intake should stop on shutdown");
    assert_eq!(stats, IntakeStats::default());
}

/// Fails the first `failures` polls, then hands out one plan, then closes.
struct FlakySource {
    failures: AtomicUsize,
    remaining: Mutex<Vec<Vec<u8>>>,
    acked: Mutex<Vec<u64>>,
}

#[async_trait]
impl PlanSource for FlakySource {
    async fn next(&self) -> Result<Option<Delivery>, TransportError> {
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(TransportError::Connection("broker unavailable".to_string()));
        }
        Ok(self.remaining.lock().pop().map(|payload| Delivery::new(1, payload)))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), TransportError> {
        self.acked.lock().push(delivery.id);
        Ok(())
    }

    async fn reject(&self, _delivery: &Delivery) -> Result<(), TransportError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_source_errors_are_retried() {
    let facts = Arc::new(InMemoryFactStore::new());
    let (replan_sink, _replans) = replan_channel();
    let engine = Arc::new(
        build_engine(&EngineConfig::default(), facts, Arc::new(replan_sink)).unwrap(),
    );
    let plan = Plan::new(Goal::new("noop"), vec![Action::new("noop", ExecutorSpec::cli())]);
    let source = Arc::new(FlakySource {
        failures: AtomicUsize::new(2),
        remaining: Mutex::new(vec![serde_json::to_vec(&plan).unwrap()]),
        acked: Mutex::new(Vec::new()),
    });

    let intake =
        IntakeLoop::new(source.clone(), engine).with_retry_delay(Duration::from_millis(10));
    let stats = intake.run(std::future::pending()).await;

    assert_eq!(stats.received, 1);
    assert_eq!(stats.achieved, 1);
    assert_eq!(*source.acked.lock(), vec![1]);
}

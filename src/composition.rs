//! Composition root: builds fact stores, transports and the engine from an [`EngineConfig`].

use crate::config::{EngineConfig, FactStoreBackend, FactStoreConfig, TransportConfig};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::executor::PlanExecutor;
use crate::goal::GoalEvaluator;
use crate::invoker::{ActionInvoker, ExecutorInvoker};
use crate::replan::ReplanPublisher;
use crate::store::{FactStore, InMemoryFactStore, RedisFactStore, SledFactStore};
use crate::transport::{RedisPlanQueue, RedisReplanSink, ReplanSink};
use std::sync::Arc;
use tracing::{info, warn};

/// Open the configured fact store backend.
pub fn open_fact_store(config: &FactStoreConfig) -> Result<Arc<dyn FactStore>, EngineError> {
    let store: Arc<dyn FactStore> = match config.backend {
        FactStoreBackend::Redis => {
            Arc::new(RedisFactStore::new(&config.redis_url, config.hash_key.clone())?)
        }
        FactStoreBackend::Sled => {
            if let Some(parent) = config.sled_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Arc::new(SledFactStore::new(&config.sled_path, &config.hash_key)?)
        }
        FactStoreBackend::Memory => {
            warn!("Using the in-memory fact store; facts are lost when the process exits");
            Arc::new(InMemoryFactStore::new())
        }
    };
    info!(backend = store.backend_name(), key = %config.hash_key, "Fact store opened");
    Ok(store)
}

pub fn plan_queue(config: &TransportConfig) -> Result<RedisPlanQueue, EngineError> {
    Ok(RedisPlanQueue::new(
        &config.redis_url,
        config.plans_queue.clone(),
        config.processing_queue.clone(),
    )?
    .with_dead_letter_queue(config.dead_letter_queue.clone())
    .with_poll_timeout(config.poll_timeout()))
}

pub fn replan_sink(config: &TransportConfig) -> Result<RedisReplanSink, EngineError> {
    Ok(RedisReplanSink::new(
        &config.redis_url,
        config.replan_queue.clone(),
    )?)
}

/// Build the engine with the configured HTTP invoker.
pub fn build_engine(
    config: &EngineConfig,
    facts: Arc<dyn FactStore>,
    sink: Arc<dyn ReplanSink>,
) -> Result<Engine, EngineError> {
    let invoker = Arc::new(ExecutorInvoker::new(config.executor.http_timeout())?);
    Ok(build_engine_with_invoker(config, invoker, facts, sink))
}

/// Build the engine around a caller-supplied invoker.
pub fn build_engine_with_invoker(
    config: &EngineConfig,
    invoker: Arc<dyn ActionInvoker>,
    facts: Arc<dyn FactStore>,
    sink: Arc<dyn ReplanSink>,
) -> Engine {
    let executor = PlanExecutor::new(invoker, Arc::clone(&facts))
        .with_failure_fact(config.executor.failure_fact.clone());
    Engine::new(
        executor,
        GoalEvaluator::new(facts),
        ReplanPublisher::new(sink),
    )
}

//! Redis list transport.
//!
//! Plans are consumed with the reliable-queue pattern: `BLMOVE plans -> processing`
//! takes a payload, `ack` removes it from the processing list and `reject` moves it to
//! the dead-letter list (or drops it). Payloads left in the processing list by a worker
//! that died mid-plan are pushed back with [`RedisPlanQueue::recover_in_flight`].

use crate::error::TransportError;
use crate::transport::{encode_goal, encode_plan, Delivery, PlanSource, ReplanSink};
use crate::types::{Goal, Plan};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RedisPlanQueue {
    client: redis::Client,
    plans_queue: String,
    processing_queue: String,
    dead_letter_queue: Option<String>,
    poll_timeout: Duration,
    next_id: AtomicU64,
}

impl RedisPlanQueue {
    pub fn new(
        connection_url: &str,
        plans_queue: impl Into<String>,
        processing_queue: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = redis::Client::open(connection_url)
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            plans_queue: plans_queue.into(),
            processing_queue: processing_queue.into(),
            dead_letter_queue: None,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn with_dead_letter_queue(mut self, queue: Option<String>) -> Self {
        self.dead_letter_queue = queue;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn plans_queue(&self) -> &str {
        &self.plans_queue
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, TransportError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))
    }

    /// Enqueue a plan for execution.
    pub async fn dispatch(&self, plan: &Plan) -> Result<(), TransportError> {
        let payload = encode_plan(plan)?;
        let mut conn = self.connection().await?;
        conn.lpush::<_, _, ()>(&self.plans_queue, payload).await?;
        Ok(())
    }

    /// Move every payload still sitting in the processing list back to the plans queue,
    /// oldest first, so it is consumed next. Returns how many were moved.
    pub async fn recover_in_flight(&self) -> Result<usize, TransportError> {
        let mut conn = self.connection().await?;
        let mut recovered = 0usize;
        loop {
            let moved: Option<Vec<u8>> = redis::cmd("LMOVE")
                .arg(&self.processing_queue)
                .arg(&self.plans_queue)
                .arg("RIGHT")
                .arg("RIGHT")
                .query_async(&mut conn)
                .await?;
            if moved.is_none() {
                break;
            }
            recovered += 1;
        }
        if recovered > 0 {
            info!(
                recovered,
                queue = %self.plans_queue,
                "Requeued in-flight plans left by a previous worker"
            );
        }
        Ok(recovered)
    }
}

#[async_trait]
impl PlanSource for RedisPlanQueue {
    async fn next(&self) -> Result<Option<Delivery>, TransportError> {
        let mut conn = self.connection().await?;
        let timeout_secs = self.poll_timeout.as_secs().max(1);
        loop {
            let payload: Option<Vec<u8>> = redis::cmd("BLMOVE")
                .arg(&self.plans_queue)
                .arg(&self.processing_queue)
                .arg("RIGHT")
                .arg("LEFT")
                .arg(timeout_secs)
                .query_async(&mut conn)
                .await?;
            match payload {
                Some(payload) => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    return Ok(Some(Delivery::new(id, payload)));
                }
                None => debug!(queue = %self.plans_queue, "No plan dispatched yet, polling again"),
            }
        }
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), TransportError> {
        let mut conn = self.connection().await?;
        conn.lrem::<_, _, ()>(&self.processing_queue, 1, &delivery.payload)
            .await?;
        Ok(())
    }

    async fn reject(&self, delivery: &Delivery) -> Result<(), TransportError> {
        let mut conn = self.connection().await?;
        conn.lrem::<_, _, ()>(&self.processing_queue, 1, &delivery.payload)
            .await?;
        if let Some(dead_letter) = &self.dead_letter_queue {
            conn.lpush::<_, _, ()>(dead_letter, &delivery.payload).await?;
        }
        Ok(())
    }
}

/// Publishes replan requests as JSON goals onto a Redis list.
pub struct RedisReplanSink {
    client: redis::Client,
    replan_queue: String,
}

impl RedisReplanSink {
    pub fn new(connection_url: &str, replan_queue: impl Into<String>) -> Result<Self, TransportError> {
        let client = redis::Client::open(connection_url)
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            replan_queue: replan_queue.into(),
        })
    }
}

#[async_trait]
impl ReplanSink for RedisReplanSink {
    async fn publish(&self, goal: &Goal) -> Result<(), TransportError> {
        let payload = encode_goal(goal)?;
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        conn.lpush::<_, _, ()>(&self.replan_queue, payload).await?;
        Ok(())
    }
}

//! Message transport: inbound plan deliveries and outbound replan requests.
//!
//! A [`PlanSource`] hands out one [`Delivery`] at a time; the consumer settles each
//! delivery exactly once with `ack` (processed) or `reject` (dropped, never redelivered).
//! A [`ReplanSink`] publishes goals to the replanning channel.

use crate::error::TransportError;
use crate::types::{Goal, Plan};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod channel;
pub mod redis_queue;

pub use channel::{plan_channel, replan_channel, ChannelPlanSource, ChannelReplanSink, PlanSender};
pub use redis_queue::{RedisPlanQueue, RedisReplanSink};

/// One inbound message carrying an encoded plan.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Source-local delivery tag, unique per source instance.
    pub id: u64,
    pub payload: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

impl Delivery {
    pub fn new(id: u64, payload: Vec<u8>) -> Self {
        Self {
            id,
            payload,
            received_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait PlanSource: Send + Sync {
    /// Wait for the next delivery. `Ok(None)` means the source is closed for good.
    async fn next(&self) -> Result<Option<Delivery>, TransportError>;

    /// Mark a delivery as processed.
    async fn ack(&self, delivery: &Delivery) -> Result<(), TransportError>;

    /// Drop a delivery without redelivery.
    async fn reject(&self, delivery: &Delivery) -> Result<(), TransportError>;
}

#[async_trait]
pub trait ReplanSink: Send + Sync {
    async fn publish(&self, goal: &Goal) -> Result<(), TransportError>;
}

/// Encode a plan the way the planner publishes it.
pub fn encode_plan(plan: &Plan) -> Result<Vec<u8>, TransportError> {
    serde_json::to_vec(plan).map_err(|e| TransportError::Serialization(e.to_string()))
}

/// Encode a replan request body.
pub fn encode_goal(goal: &Goal) -> Result<Vec<u8>, TransportError> {
    serde_json::to_vec(goal).map_err(|e| TransportError::Serialization(e.to_string()))
}

//! In-process transport over tokio channels, for embedding the engine and for tests.

use crate::error::TransportError;
use crate::transport::{encode_plan, Delivery, PlanSource, ReplanSink};
use crate::types::{Goal, Plan};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Create a bounded plan channel.
pub fn plan_channel(capacity: usize) -> (PlanSender, ChannelPlanSource) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        PlanSender { sender },
        ChannelPlanSource {
            receiver: tokio::sync::Mutex::new(receiver),
            next_id: AtomicU64::new(1),
            acked: Mutex::new(Vec::new()),
            rejected: Mutex::new(Vec::new()),
        },
    )
}

/// Create an unbounded replan channel. The receiver gets every published goal.
pub fn replan_channel() -> (ChannelReplanSink, mpsc::UnboundedReceiver<Goal>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelReplanSink { sender }, receiver)
}

/// Producer side of [`plan_channel`]. Dropping every sender closes the source.
#[derive(Clone)]
pub struct PlanSender {
    sender: mpsc::Sender<Vec<u8>>,
}

impl PlanSender {
    pub async fn dispatch(&self, plan: &Plan) -> Result<(), TransportError> {
        self.dispatch_raw(encode_plan(plan)?).await
    }

    /// Send an arbitrary payload, well-formed or not.
    pub async fn dispatch_raw(&self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.sender
            .send(payload)
            .await
            .map_err(|_| TransportError::Closed("plan channel".to_string()))
    }
}

/// Consumer side of [`plan_channel`]. Records how each delivery was settled.
pub struct ChannelPlanSource {
    receiver: tokio::sync::Mutex<mpsc::Receiver<Vec<u8>>>,
    next_id: AtomicU64,
    acked: Mutex<Vec<u64>>,
    rejected: Mutex<Vec<u64>>,
}

impl ChannelPlanSource {
    pub fn acked(&self) -> Vec<u64> {
        self.acked.lock().clone()
    }

    pub fn rejected(&self) -> Vec<u64> {
        self.rejected.lock().clone()
    }
}

#[async_trait]
impl PlanSource for ChannelPlanSource {
    async fn next(&self) -> Result<Option<Delivery>, TransportError> {
        let mut receiver = self.receiver.lock().await;
        Ok(receiver.recv().await.map(|payload| {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            Delivery::new(id, payload)
        }))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), TransportError> {
        self.acked.lock().push(delivery.id);
        Ok(())
    }

    async fn reject(&self, delivery: &Delivery) -> Result<(), TransportError> {
        self.rejected.lock().push(delivery.id);
        Ok(())
    }
}

/// Replan sink backed by an unbounded channel.
#[derive(Clone)]
pub struct ChannelReplanSink {
    sender: mpsc::UnboundedSender<Goal>,
}

#[async_trait]
impl ReplanSink for ChannelReplanSink {
    async fn publish(&self, goal: &Goal) -> Result<(), TransportError> {
        self.sender
            .send(goal.clone())
            .map_err(|_| TransportError::Closed("replan channel".to_string()))
    }
}

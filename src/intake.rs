//! Message Intake Loop
//!
//! Pulls one delivery at a time from a [`PlanSource`] and takes it through
//! `Received -> Decoded -> Executing -> Evaluating -> Acked`, or
//! `Received -> DecodeFailed -> Rejected` for malformed payloads. A decoded plan is acked
//! whatever its outcome; only undecodable payloads are rejected.

use crate::engine::{DispatchOutcome, Engine};
use crate::error::DecodeError;
use crate::transport::{Delivery, PlanSource};
use crate::types::Plan;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Decode an inbound payload.
pub fn decode_plan(payload: &[u8]) -> Result<Plan, DecodeError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Counters for one intake run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeStats {
    pub received: usize,
    pub rejected: usize,
    pub achieved: usize,
    pub replanned: usize,
}

impl IntakeStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        self.received += 1;
        match outcome {
            DispatchOutcome::Rejected => self.rejected += 1,
            DispatchOutcome::GoalAchieved => self.achieved += 1,
            DispatchOutcome::Replanned { .. } => self.replanned += 1,
        }
    }
}

pub struct IntakeLoop {
    source: Arc<dyn PlanSource>,
    engine: Arc<Engine>,
    retry_delay: Duration,
}

impl IntakeLoop {
    pub fn new(source: Arc<dyn PlanSource>, engine: Arc<Engine>) -> Self {
        Self {
            source,
            engine,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Delay before polling again after the source returned an error.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Take one delivery to a terminal state and settle it with the source.
    pub async fn process(&self, delivery: &Delivery) -> DispatchOutcome {
        let plan = match decode_plan(&delivery.payload) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(delivery = delivery.id, error = %e, "Rejecting undecodable plan payload");
                if let Err(e) = self.source.reject(delivery).await {
                    error!(delivery = delivery.id, error = %e, "Failed to reject delivery");
                }
                return DispatchOutcome::Rejected;
            }
        };

        info!(
            delivery = delivery.id,
            goal = %plan.target_goal.name,
            steps = plan.steps.len(),
            "Plan received, executing"
        );
        let outcome = self.engine.handle_plan(&plan).await;

        if let Err(e) = self.source.ack(delivery).await {
            error!(delivery = delivery.id, error = %e, "Failed to ack delivery");
        }
        let elapsed_ms = (chrono::Utc::now() - delivery.received_at).num_milliseconds();
        info!(
            delivery = delivery.id,
            goal = %plan.target_goal.name,
            outcome = ?outcome,
            elapsed_ms,
            "Dispatch processed"
        );
        outcome
    }

    /// Process deliveries until the source closes or `shutdown` resolves. Shutdown is
    /// only observed between deliveries; a plan in progress always runs to completion.
    pub async fn run<F>(&self, shutdown: F) -> IntakeStats
    where
        F: Future<Output = ()>,
    {
        let mut stats = IntakeStats::default();
        tokio::pin!(shutdown);

        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping intake");
                    break;
                }
                next = self.source.next() => next,
            };

            match next {
                Ok(Some(delivery)) => {
                    let outcome = self.process(&delivery).await;
                    stats.record(&outcome);
                }
                Ok(None) => {
                    info!("Plan source closed, stopping intake");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Failed to receive plan, retrying");
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        info!(
            received = stats.received,
            rejected = stats.rejected,
            achieved = stats.achieved,
            replanned = stats.replanned,
            "Intake stopped"
        );
        stats
    }
}

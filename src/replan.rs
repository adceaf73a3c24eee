//! Replan Publisher: fire-and-forget replanning requests.

use crate::transport::ReplanSink;
use crate::types::Goal;
use std::sync::Arc;
use tracing::{error, info};

/// Publishes goals that need a new plan. Delivery failures are logged and swallowed;
/// the caller never sees them.
pub struct ReplanPublisher {
    sink: Arc<dyn ReplanSink>,
}

impl ReplanPublisher {
    pub fn new(sink: Arc<dyn ReplanSink>) -> Self {
        Self { sink }
    }

    /// Returns whether the request went out, for logging and tests only.
    pub async fn request_replan(&self, goal: &Goal) -> bool {
        match self.sink.publish(goal).await {
            Ok(()) => {
                info!(goal = %goal.name, "Replan requested");
                true
            }
            Err(e) => {
                error!(goal = %goal.name, error = %e, "Failed to publish replan request");
                false
            }
        }
    }
}

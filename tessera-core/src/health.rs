//! Node health tracking.
//!
//! Every data node owns one [`ResourceStatePolicy`]. The operation engine
//! reports each completed attempt against a node, and the policy turns that
//! stream of outcomes into an advisory "down" signal used for replica
//! ordering. A down node is never refused outright; it can recover while an
//! operation is running.

use crate::Result;
use crate::clustermap::HardwareState;
use crate::config::ResourceStateConfig;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

pub trait ResourceStatePolicy: Send + Sync + fmt::Debug {
    fn on_success(&self);

    fn on_error(&self);

    /// Hard down always wins over the runtime counters.
    fn is_down(&self) -> bool;

    /// Static administrative override read from the topology layout.
    fn is_hard_down(&self) -> bool;
}

pub trait ResourceStatePolicyFactory: Send + Sync {
    fn policy_for(
        &self,
        resource: &str,
        hard_state: HardwareState,
    ) -> Arc<dyn ResourceStatePolicy>;
}

/// What the engine observed about a node after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaEvent {
    /// The node answered, whatever the answer was.
    NodeResponse,
    NodeTimeout,
    /// Connection failure or a response that could not be parsed.
    NodeError,
}

#[derive(Debug, Default)]
struct Counters {
    consecutive_errors: u32,
    consecutive_successes: u32,
    down: bool,
}

/// Consecutive-error policy with a success hysteresis window.
///
/// `error_threshold` consecutive errors mark the resource down. While down,
/// `success_threshold` consecutive successes are needed to bring it back; an
/// error in between restarts that count. While up, any success clears the
/// error streak.
#[derive(Debug)]
pub struct ConsecutiveFailurePolicy {
    resource: String,
    hard_down: bool,
    error_threshold: u32,
    success_threshold: u32,
    counters: Mutex<Counters>,
}

impl ConsecutiveFailurePolicy {
    /// Fails with [`TesseraError::Config`] when either threshold is zero.
    pub fn new(
        resource: impl Into<String>,
        hard_state: HardwareState,
        config: &ResourceStateConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_validated(resource, hard_state, config))
    }

    fn with_validated(
        resource: impl Into<String>,
        hard_state: HardwareState,
        config: &ResourceStateConfig,
    ) -> Self {
        Self {
            resource: resource.into(),
            hard_down: hard_state == HardwareState::Unavailable,
            error_threshold: config.error_threshold,
            success_threshold: config.success_threshold,
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.counters.lock().consecutive_errors
    }
}

impl ResourceStatePolicy for ConsecutiveFailurePolicy {
    fn on_success(&self) {
        let mut counters = self.counters.lock();
        counters.consecutive_errors = 0;

        if !counters.down {
            return;
        }

        counters.consecutive_successes += 1;
        if counters.consecutive_successes >= self.success_threshold {
            counters.down = false;
            counters.consecutive_successes = 0;
            tracing::info!("resource {} is back up", self.resource);
        }
    }

    fn on_error(&self) {
        let mut counters = self.counters.lock();
        counters.consecutive_successes = 0;
        counters.consecutive_errors = counters.consecutive_errors.saturating_add(1);

        if !counters.down && counters.consecutive_errors >= self.error_threshold {
            counters.down = true;
            tracing::warn!(
                "resource {} marked down after {} consecutive errors",
                self.resource,
                counters.consecutive_errors
            );
        }
    }

    fn is_down(&self) -> bool {
        self.hard_down || self.counters.lock().down
    }

    fn is_hard_down(&self) -> bool {
        self.hard_down
    }
}

#[derive(Debug, Clone)]
pub struct ConsecutiveFailurePolicyFactory {
    config: ResourceStateConfig,
}

impl ConsecutiveFailurePolicyFactory {
    pub fn new(config: ResourceStateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl ResourceStatePolicyFactory for ConsecutiveFailurePolicyFactory {
    fn policy_for(
        &self,
        resource: &str,
        hard_state: HardwareState,
    ) -> Arc<dyn ResourceStatePolicy> {
        Arc::new(ConsecutiveFailurePolicy::with_validated(
            resource,
            hard_state,
            &self.config,
        ))
    }
}

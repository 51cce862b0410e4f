// src/engine/queue.rs

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::engine::TriggerReason;
use crate::types::RunRequestBehaviour;

/// Run requests that arrive while a DAG run is already executing.
///
/// Semantics:
/// - Each entry is one future run.
/// - `Queue`: requests are appended; once more than `max_runs` are waiting
///   the oldest are dropped.
/// - `Skip`: requests are dropped while a run is active.
/// - When the runtime becomes idle it calls [`RunQueue::pop_next`] to start
///   the next run.
#[derive(Debug)]
pub struct RunQueue {
    behaviour: RunRequestBehaviour,
    max_runs: usize,
    runs: VecDeque<TriggerReason>,
}

impl RunQueue {
    /// `max_runs` is clamped to at least 1.
    pub fn new(behaviour: RunRequestBehaviour, max_runs: usize) -> Self {
        Self {
            behaviour,
            max_runs: max_runs.max(1),
            runs: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Record a run request received while a run is in progress.
    pub fn record_request(&mut self, reason: TriggerReason) {
        match self.behaviour {
            RunRequestBehaviour::Queue => {
                self.runs.push_back(reason);
                debug!(?reason, queued = self.runs.len(), "queued run request");

                if self.runs.len() > self.max_runs {
                    warn!(
                        queued = self.runs.len(),
                        max_runs = self.max_runs,
                        "exceeded max_queued_runs; dropping oldest queued requests"
                    );
                    while self.runs.len() > self.max_runs {
                        self.runs.pop_front();
                    }
                }
            }
            RunRequestBehaviour::Skip => {
                debug!(?reason, "run already active; dropping request (skip mode)");
            }
        }
    }

    /// Take the next queued request, if any.
    pub fn pop_next(&mut self) -> Option<TriggerReason> {
        self.runs.pop_front()
    }
}

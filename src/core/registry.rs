// src/core/registry.rs

use crate::core::error::{Error, Result};
use crate::core::models::{ScanOptions, ScanTask, TaskState};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Holds every submitted scan task and its lifecycle state.
///
/// Submissions are fire-and-forget: the registry stores the task, signals the
/// orchestrator over a channel and returns the fresh identifier synchronously.
/// The caller never blocks on scan completion. State is an eventually
/// consistent snapshot; readers may observe a state that changes right after
/// the read lock is released.
pub struct TaskRegistry {
    tasks: RwLock<HashMap<String, ScanTask>>,
    wakeup: mpsc::UnboundedSender<String>,
}

impl TaskRegistry {
    /// Creates the registry together with the orchestrator's end of the
    /// wake-up channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (wakeup, rx) = mpsc::unbounded_channel();
        let registry = Self {
            tasks: RwLock::new(HashMap::new()),
            wakeup,
        };
        (registry, rx)
    }

    /// Validates and stores a new task, returning its identifier.
    ///
    /// An empty target list is rejected with a validation error before
    /// anything is stored or signalled. The orchestrator wake-up is best
    /// effort: a missing consumer leaves the task parked in `created`.
    pub async fn submit(
        &self,
        targets: Vec<String>,
        org_id: u64,
        options: ScanOptions,
    ) -> Result<String> {
        if targets.is_empty() {
            return Err(Error::validation("target list is empty"));
        }

        let task = ScanTask {
            id: Uuid::new_v4().to_string(),
            targets,
            org_id,
            options,
            state: TaskState::Created,
            created_at: Utc::now(),
        };
        let id = task.id.clone();

        info!(task_id = %id, org_id, targets = task.targets.len(), "Task submitted.");
        self.tasks.write().await.insert(id.clone(), task);

        if self.wakeup.send(id.clone()).is_err() {
            warn!(task_id = %id, "No orchestrator attached, task stays in created state.");
        }
        Ok(id)
    }

    /// Returns a snapshot of one task.
    pub async fn get(&self, task_id: &str) -> Option<ScanTask> {
        self.tasks.read().await.get(task_id).cloned()
    }

    /// Moves a task to `new_state`.
    ///
    /// Only the orchestrator calls this. Unknown ids and transitions that do
    /// not strictly follow `Created -> Running -> {Completed, Failed}` are
    /// rejected; terminal tasks never regress.
    pub async fn advance(&self, task_id: &str, new_state: TaskState) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| Error::UnknownTask(task_id.to_string()))?;

        if !task.state.can_advance_to(new_state) {
            return Err(Error::InvalidTransition {
                from: task.state,
                to: new_state,
            });
        }

        debug!(task_id, from = %task.state, to = %new_state, "Task state advanced.");
        task.state = new_state;
        Ok(())
    }

    /// Renders a human-readable summary of the registry contents.
    ///
    /// The counts are a snapshot at call time with no guarantee against
    /// concurrent submissions or orchestrator updates.
    pub async fn aggregate_status(&self) -> String {
        let tasks = self.tasks.read().await;
        if tasks.is_empty() {
            return "no tasks submitted".to_string();
        }

        let mut created = 0usize;
        let mut running = 0usize;
        let mut completed = 0usize;
        let mut failed = 0usize;
        for task in tasks.values() {
            match task.state {
                TaskState::Created => created += 1,
                TaskState::Running => running += 1,
                TaskState::Completed => completed += 1,
                TaskState::Failed => failed += 1,
            }
        }

        format!(
            "{} tasks: {} created, {} running, {} completed, {} failed",
            tasks.len(),
            created,
            running,
            completed,
            failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn submit_assigns_a_fresh_id_and_signals_the_orchestrator() {
        let (registry, mut rx) = TaskRegistry::new();
        let id = registry
            .submit(targets(&["example.com"]), 1, ScanOptions::default())
            .await
            .unwrap();

        assert!(!id.is_empty());
        assert_eq!(rx.recv().await.unwrap(), id);

        let task = registry.get(&id).await.unwrap();
        assert_eq!(task.state, TaskState::Created);
        assert_eq!(task.org_id, 1);
    }

    #[tokio::test]
    async fn submit_with_empty_target_list_never_reaches_the_registry() {
        let (registry, mut rx) = TaskRegistry::new();
        let err = registry
            .submit(Vec::new(), 1, ScanOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.aggregate_status().await, "no tasks submitted");
    }

    #[tokio::test]
    async fn submit_survives_a_missing_orchestrator() {
        let (registry, rx) = TaskRegistry::new();
        drop(rx);
        let id = registry
            .submit(targets(&["example.com"]), 1, ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(registry.get(&id).await.unwrap().state, TaskState::Created);
    }

    #[tokio::test]
    async fn lifecycle_advances_forward_only() {
        let (registry, _rx) = TaskRegistry::new();
        let id = registry
            .submit(targets(&["example.com"]), 1, ScanOptions::default())
            .await
            .unwrap();

        registry.advance(&id, TaskState::Running).await.unwrap();
        registry.advance(&id, TaskState::Completed).await.unwrap();

        // A terminal task never regresses.
        let err = registry.advance(&id, TaskState::Running).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(registry.get(&id).await.unwrap().state, TaskState::Completed);
    }

    #[tokio::test]
    async fn skipping_the_running_phase_is_rejected() {
        let (registry, _rx) = TaskRegistry::new();
        let id = registry
            .submit(targets(&["example.com"]), 1, ScanOptions::default())
            .await
            .unwrap();

        let err = registry
            .advance(&id, TaskState::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn advancing_an_unknown_task_fails() {
        let (registry, _rx) = TaskRegistry::new();
        let err = registry
            .advance("no-such-task", TaskState::Running)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTask(_)));
    }

    #[tokio::test]
    async fn aggregate_status_counts_every_state() {
        let (registry, _rx) = TaskRegistry::new();
        let a = registry
            .submit(targets(&["a.example.com"]), 1, ScanOptions::default())
            .await
            .unwrap();
        let b = registry
            .submit(targets(&["b.example.com"]), 1, ScanOptions::default())
            .await
            .unwrap();
        let _c = registry
            .submit(targets(&["c.example.com"]), 2, ScanOptions::default())
            .await
            .unwrap();

        registry.advance(&a, TaskState::Running).await.unwrap();
        registry.advance(&b, TaskState::Running).await.unwrap();
        registry.advance(&b, TaskState::Failed).await.unwrap();

        assert_eq!(
            registry.aggregate_status().await,
            "3 tasks: 1 created, 1 running, 0 completed, 1 failed"
        );
    }
}

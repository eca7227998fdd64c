// src/core/orchestrator.rs

use crate::config::FofaCredentials;
use crate::core::models::TaskState;
use crate::core::registry::TaskRegistry;
use crate::core::scanner;
use crate::core::store::DomainStore;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Consumes submitted tasks and drives the scanners.
///
/// One orchestrator runs per server process. It owns nothing the gateway
/// also mutates: the registry arbitrates every state change, the store every
/// record merge.
pub struct Orchestrator {
    registry: Arc<TaskRegistry>,
    store: Arc<DomainStore>,
    fofa: Option<FofaCredentials>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<TaskRegistry>,
        store: Arc<DomainStore>,
        fofa: Option<FofaCredentials>,
    ) -> Self {
        Self {
            registry,
            store,
            fofa,
        }
    }

    /// Runs until the registry side of the wake-up channel is dropped.
    pub async fn run(self, mut wakeups: mpsc::UnboundedReceiver<String>) {
        info!("Scan orchestrator started.");
        while let Some(task_id) = wakeups.recv().await {
            self.process(&task_id).await;
        }
        info!("Wake-up channel closed, scan orchestrator stopping.");
    }

    /// Executes one task end to end: advance to running, fan the targets
    /// through the enabled scanners, merge the findings, settle the final
    /// state.
    async fn process(&self, task_id: &str) {
        let Some(task) = self.registry.get(task_id).await else {
            warn!(task_id, "Woken for a task the registry does not know.");
            return;
        };

        if let Err(e) = self.registry.advance(task_id, TaskState::Running).await {
            error!(task_id, error = %e, "Could not start task.");
            return;
        }
        info!(task_id, targets = task.targets.len(), "Task running.");

        let reports = join_all(
            task.targets
                .iter()
                .map(|target| scanner::scan_target(target, &task.options, self.fofa.as_ref())),
        )
        .await;

        let mut resolved = 0usize;
        let mut errors = 0usize;
        for report in reports {
            resolved += report.resolved_findings();
            errors += report.errors.len();
            for finding in report.findings {
                self.store.upsert(task.org_id, finding).await;
            }
        }

        // Scanners degrade per target, so a task only fails when the whole
        // run produced nothing but errors.
        let final_state = if resolved == 0 && errors > 0 {
            TaskState::Failed
        } else {
            TaskState::Completed
        };

        if let Err(e) = self.registry.advance(task_id, final_state).await {
            error!(task_id, error = %e, "Could not settle task state.");
            return;
        }
        info!(task_id, state = %final_state, resolved, errors, "Task finished.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{ListQuery, ScanOptions};
    use std::time::Duration;

    /// Waits until a task settles in a terminal state.
    async fn settled_state(registry: &TaskRegistry, task_id: &str) -> TaskState {
        for _ in 0..200 {
            if let Some(task) = registry.get(task_id).await {
                if task.state.is_terminal() {
                    return task.state;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {task_id} never settled");
    }

    #[tokio::test]
    async fn a_task_with_an_address_target_runs_to_completion() {
        let (registry, wakeups) = TaskRegistry::new();
        let registry = Arc::new(registry);
        let store = Arc::new(DomainStore::new());

        let orchestrator = Orchestrator::new(registry.clone(), store.clone(), None);
        tokio::spawn(orchestrator.run(wakeups));

        // An address target with every scanner disabled needs no network at
        // all: the address is its own resolution.
        let id = registry
            .submit(vec!["192.0.2.7".to_string()], 1, ScanOptions::default())
            .await
            .unwrap();

        assert_eq!(settled_state(&registry, &id).await, TaskState::Completed);

        let listed = store.list(&ListQuery::new(0, 20)).await;
        assert_eq!(listed.records_filtered, 1);
        assert_eq!(listed.data[0].domain, "192.0.2.7");
        assert_eq!(listed.data[0].ip, "192.0.2.7");
    }

    #[tokio::test]
    async fn results_land_in_the_submitting_organization_only() {
        let (registry, wakeups) = TaskRegistry::new();
        let registry = Arc::new(registry);
        let store = Arc::new(DomainStore::new());

        let orchestrator = Orchestrator::new(registry.clone(), store.clone(), None);
        tokio::spawn(orchestrator.run(wakeups));

        let id = registry
            .submit(vec!["198.51.100.4".to_string()], 42, ScanOptions::default())
            .await
            .unwrap();
        settled_state(&registry, &id).await;

        let mut other_org = ListQuery::new(0, 20);
        other_org.org_id = Some(1);
        assert_eq!(store.list(&other_org).await.records_filtered, 0);

        let mut own_org = ListQuery::new(0, 20);
        own_org.org_id = Some(42);
        assert_eq!(store.list(&own_org).await.records_filtered, 1);
    }
}

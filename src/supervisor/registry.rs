// src/supervisor/registry.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::supervisor::stats::StatsSnapshot;
use crate::supervisor::worker::{RestartOutcome, Worker};

/// Read/control surface over the workers, keyed by worker id.
///
/// Built once from the supervisor's fixed worker set and cheap to clone;
/// this is everything the dashboard gets to see.
#[derive(Debug, Clone, Default)]
pub struct WorkerRegistry {
    workers: Arc<BTreeMap<String, Arc<Worker>>>,
}

/// One worker as listed by the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerView {
    pub id: String,
    pub command: String,
    pub stats: StatsSnapshot,
}

impl WorkerRegistry {
    pub fn new(workers: impl IntoIterator<Item = Arc<Worker>>) -> Self {
        let workers = workers
            .into_iter()
            .map(|w| (w.id().to_string(), w))
            .collect();
        Self {
            workers: Arc::new(workers),
        }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Worker>> {
        self.workers.get(id)
    }

    /// Every worker with a fresh stats snapshot, sorted by command text.
    pub fn list(&self) -> Vec<WorkerView> {
        let mut views: Vec<WorkerView> = self.workers.values().map(|w| view_of(w)).collect();
        views.sort_by(|a, b| a.command.cmp(&b.command).then_with(|| a.id.cmp(&b.id)));
        views
    }

    pub fn view(&self, id: &str) -> Option<WorkerView> {
        self.workers.get(id).map(|w| view_of(w))
    }

    /// Run the worker's termination sequence so it relaunches. `None` when
    /// no worker has this id.
    pub async fn restart(&self, id: &str) -> Option<RestartOutcome> {
        let worker = Arc::clone(self.workers.get(id)?);
        Some(worker.request_restart().await)
    }
}

fn view_of(worker: &Worker) -> WorkerView {
    WorkerView {
        id: worker.id().to_string(),
        command: worker.command().raw().to_string(),
        stats: worker.stats(),
    }
}

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{Result, SubburnError};
use super::model::{Job, JobId, JobView};

/// In-memory job table.
///
/// The outer lock only guards membership; each job sits behind its own lock
/// so a background stage writing one job never blocks readers of another.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Arc<RwLock<Job>>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: Job) -> JobId {
        let id = job.id;
        info!("[Job {}] Status: {}", id, job.status);
        self.jobs.write().await.insert(id, Arc::new(RwLock::new(job)));
        id
    }

    async fn entry(&self, id: JobId) -> Result<Arc<RwLock<Job>>> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| SubburnError::NotFound(id.to_string()))
    }

    pub async fn contains(&self, id: JobId) -> bool {
        self.jobs.read().await.contains_key(&id)
    }

    pub async fn snapshot(&self, id: JobId) -> Result<Job> {
        Ok(self.entry(id).await?.read().await.clone())
    }

    pub async fn view(&self, id: JobId) -> Result<JobView> {
        Ok(self.entry(id).await?.read().await.view())
    }

    /// Run `apply` against the job under its write lock.
    ///
    /// Nothing is stamped when `apply` fails, so a rejected check leaves the
    /// job untouched apart from whatever `apply` changed before failing.
    pub async fn update<T, F>(&self, id: JobId, apply: F) -> Result<T>
    where
        F: FnOnce(&mut Job) -> Result<T>,
    {
        let entry = self.entry(id).await?;
        let mut job = entry.write().await;
        let previous = job.status;

        let value = apply(&mut *job)?;
        job.updated_at = Utc::now();
        if job.status != previous {
            info!("[Job {}] Status: {}", id, job.status);
        }
        Ok(value)
    }

    pub async fn remove(&self, id: JobId) -> Result<Job> {
        let entry = self
            .jobs
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| SubburnError::NotFound(id.to_string()))?;
        let job = entry.read().await.clone();
        Ok(job)
    }

    /// Views of every job, oldest first.
    pub async fn list(&self) -> Vec<JobView> {
        let entries: Vec<_> = self.jobs.read().await.values().cloned().collect();
        let mut jobs = Vec::with_capacity(entries.len());
        for entry in entries {
            jobs.push(entry.read().await.clone());
        }
        jobs.sort_by_key(|job| job.created_at);
        jobs.iter().map(Job::view).collect()
    }
}

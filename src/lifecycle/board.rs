use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::directory::Role;
use crate::error::{Error, Result};
use crate::lifecycle::job::{ChecklistItem, Job, Rating};
use crate::registry::Property;

/// The lifecycle engine. Sole writer of job, checklist, and rating state.
///
/// Each job sits behind its own lock: the outer map is only read-locked to
/// fetch a handle, then the operation write-locks that one job. A claim is
/// therefore an exclusive critical section scoped to the job id, which makes
/// claim resolution linearizable, and operations on two different jobs never
/// block each other.
#[derive(Debug)]
pub struct JobBoard {
    jobs: RwLock<HashMap<u64, Arc<RwLock<Job>>>>,
    next_job_id: AtomicU64,
    next_item_id: AtomicU64,
    require_checklist_complete: bool,
}

impl Default for JobBoard {
    fn default() -> Self {
        Self::new(false)
    }
}

impl JobBoard {
    pub fn new(require_checklist_complete: bool) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            next_job_id: AtomicU64::new(0),
            next_item_id: AtomicU64::new(0),
            require_checklist_complete,
        }
    }

    /// Create a job against `property`. The acting host must own the
    /// property; admins may create on any property. One checklist item per
    /// input text, in input order, all unchecked.
    pub async fn create(
        &self,
        actor: u64,
        role: Role,
        property: &Property,
        booking_start: DateTime<Utc>,
        booking_end: DateTime<Utc>,
        checklist_texts: Vec<String>,
    ) -> Result<Job> {
        if role != Role::Admin && property.host != actor {
            return Err(Error::Forbidden(
                "property belongs to another host".to_string(),
            ));
        }

        let checklist: Vec<ChecklistItem> = checklist_texts
            .into_iter()
            .map(|text| {
                let id = self.next_item_id.fetch_add(1, Ordering::Relaxed) + 1;
                ChecklistItem::new(id, text)
            })
            .collect();

        let job_id = self.next_job_id.fetch_add(1, Ordering::Relaxed) + 1;
        let job = Job::new(
            job_id,
            property.id,
            property.host,
            booking_start,
            booking_end,
            checklist,
        )?;
        let snapshot = job.clone();

        self.jobs
            .write()
            .await
            .insert(job_id, Arc::new(RwLock::new(job)));
        tracing::info!(job_id, property_id = property.id, "Job created");
        Ok(snapshot)
    }

    async fn handle(&self, job_id: u64) -> Result<Arc<RwLock<Job>>> {
        self.jobs
            .read()
            .await
            .get(&job_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("job {}", job_id)))
    }

    pub async fn get(&self, job_id: u64) -> Result<Job> {
        let handle = self.handle(job_id).await?;
        let job = handle.read().await;
        Ok(job.clone())
    }

    /// Snapshot of every job, ordered by `(created_at, id)` ascending. The
    /// tiebreak on id keeps the order deterministic for same-instant jobs.
    async fn snapshot(&self) -> Vec<Job> {
        let handles: Vec<Arc<RwLock<Job>>> = self.jobs.read().await.values().cloned().collect();
        let mut jobs = Vec::with_capacity(handles.len());
        for handle in handles {
            jobs.push(handle.read().await.clone());
        }
        jobs.sort_by_key(|j| (j.created_at, j.id));
        jobs
    }

    pub async fn list_open(&self, limit: usize) -> Vec<Job> {
        self.snapshot()
            .await
            .into_iter()
            .filter(|j| j.is_open())
            .take(limit)
            .collect()
    }

    /// Jobs visible to `user`: for a host, jobs on their properties; for a
    /// cleaner, jobs they have claimed (including completed ones); for an
    /// admin, everything.
    pub async fn list_for(&self, user: u64, role: Role, limit: usize) -> Vec<Job> {
        self.snapshot()
            .await
            .into_iter()
            .filter(|j| match role {
                Role::Host => j.host == user,
                Role::Cleaner => j.claimant() == Some(user),
                Role::Admin => true,
            })
            .take(limit)
            .collect()
    }

    /// Atomic open -> claimed transition. Exactly one caller ever wins; the
    /// state check and the write happen under the same job lock, so no
    /// partial state (claimant set, status unchanged) can be observed.
    pub async fn claim(&self, job_id: u64, cleaner: u64) -> Result<Job> {
        let handle = self.handle(job_id).await?;
        let mut job = handle.write().await;
        job.claim(cleaner)?;
        tracing::info!(job_id, cleaner_id = cleaner, "Job claimed");
        Ok(job.clone())
    }

    /// Check off checklist items; returns the job's full checklist.
    pub async fn tick(
        &self,
        job_id: u64,
        actor: u64,
        role: Role,
        item_ids: &[u64],
    ) -> Result<Vec<ChecklistItem>> {
        let handle = self.handle(job_id).await?;
        let mut job = handle.write().await;
        job.tick(actor, role, item_ids)?;
        Ok(job.checklist().to_vec())
    }

    /// Validate that `item_id` belongs to `job_id` and that `actor` may
    /// attach evidence to it, without mutating anything. Used before the
    /// photo blob is written so a rejected caller never leaves an orphan.
    pub async fn checklist_item(
        &self,
        job_id: u64,
        item_id: u64,
        actor: u64,
        role: Role,
    ) -> Result<ChecklistItem> {
        let handle = self.handle(job_id).await?;
        let job = handle.read().await;
        job.ensure_claimant(actor, role)?;
        Ok(job.item(item_id)?.clone())
    }

    pub async fn attach_photo(
        &self,
        job_id: u64,
        item_id: u64,
        actor: u64,
        role: Role,
        photo_path: String,
    ) -> Result<ChecklistItem> {
        let handle = self.handle(job_id).await?;
        let mut job = handle.write().await;
        let item = job.attach_photo(actor, role, item_id, photo_path)?;
        Ok(item.clone())
    }

    pub async fn complete(&self, job_id: u64, actor: u64, role: Role) -> Result<Job> {
        let handle = self.handle(job_id).await?;
        let mut job = handle.write().await;
        job.complete(actor, role, self.require_checklist_complete)?;
        tracing::info!(job_id, cleaner_id = actor, "Job completed");
        Ok(job.clone())
    }

    pub async fn rate(
        &self,
        job_id: u64,
        actor: u64,
        role: Role,
        stars: u8,
        feedback: Option<String>,
    ) -> Result<Rating> {
        let handle = self.handle(job_id).await?;
        let mut job = handle.write().await;
        let rating = job.rate(actor, role, stars, feedback)?.clone();
        tracing::info!(job_id, stars, "Job rated");
        Ok(rating)
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

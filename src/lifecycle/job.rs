use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::directory::Role;
use crate::error::{Error, Result};

/// Tagged job state. The claimant lives inside the state, so an open job
/// structurally cannot carry one. Transitions happen only through the
/// methods on [`Job`]; nothing else writes this field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobState {
    Open,
    Claimed {
        cleaner: u64,
        claimed_at: DateTime<Utc>,
    },
    Completed {
        cleaner: u64,
        completed_at: DateTime<Utc>,
    },
}

impl JobState {
    pub fn name(&self) -> &'static str {
        match self {
            JobState::Open => "open",
            JobState::Claimed { .. } => "claimed",
            JobState::Completed { .. } => "completed",
        }
    }

    pub fn claimant(&self) -> Option<u64> {
        match self {
            JobState::Open => None,
            JobState::Claimed { cleaner, .. } | JobState::Completed { cleaner, .. } => {
                Some(*cleaner)
            }
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A unit of required work on a job. Text and identity are fixed at job
/// creation; only `checked` and `photo_path` ever change.
#[derive(Debug, Clone, Serialize)]
pub struct ChecklistItem {
    pub id: u64,
    pub text: String,
    pub checked: bool,
    pub photo_path: Option<String>,
}

impl ChecklistItem {
    pub fn new(id: u64, text: String) -> Self {
        Self {
            id,
            text,
            checked: false,
            photo_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Rating {
    pub stars: u8,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A cleaning job tied to a booking window on one property.
///
/// State machine: `open --claim--> claimed --complete--> completed`.
/// There is no un-claim or cancel path in scope; a claim is final.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: u64,
    pub property_id: u64,
    /// Owner of the referenced property, denormalized at creation
    pub host: u64,
    pub booking_start: DateTime<Utc>,
    pub booking_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    state: JobState,
    checklist: Vec<ChecklistItem>,
    rating: Option<Rating>,
}

impl Job {
    pub fn new(
        id: u64,
        property_id: u64,
        host: u64,
        booking_start: DateTime<Utc>,
        booking_end: DateTime<Utc>,
        checklist: Vec<ChecklistItem>,
    ) -> Result<Self> {
        if booking_end <= booking_start {
            return Err(Error::InvalidWindow);
        }
        Ok(Self {
            id,
            property_id,
            host,
            booking_start,
            booking_end,
            created_at: Utc::now(),
            state: JobState::Open,
            checklist,
            rating: None,
        })
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn claimant(&self) -> Option<u64> {
        self.state.claimant()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, JobState::Open)
    }

    pub fn checklist(&self) -> &[ChecklistItem] {
        &self.checklist
    }

    pub fn rating(&self) -> Option<&Rating> {
        self.rating.as_ref()
    }

    pub fn all_items_checked(&self) -> bool {
        self.checklist.iter().all(|item| item.checked)
    }

    /// Transition `open -> claimed`. Any attempt against a job that is no
    /// longer open loses the race and gets `AlreadyClaimed`, which callers
    /// must be able to tell apart from other failures.
    pub fn claim(&mut self, cleaner: u64) -> Result<()> {
        match self.state {
            JobState::Open => {
                self.state = JobState::Claimed {
                    cleaner,
                    claimed_at: Utc::now(),
                };
                Ok(())
            }
            JobState::Claimed { .. } | JobState::Completed { .. } => Err(Error::AlreadyClaimed),
        }
    }

    /// Transition `claimed -> completed`. Only the recorded claimant (or an
    /// admin) may complete; `require_all_checked` is the configurable
    /// completion policy.
    pub fn complete(&mut self, actor: u64, role: Role, require_all_checked: bool) -> Result<()> {
        match self.state {
            JobState::Claimed { cleaner, .. } => {
                if actor != cleaner && role != Role::Admin {
                    return Err(Error::Forbidden(
                        "only the job's claimant may complete it".to_string(),
                    ));
                }
                if require_all_checked && !self.all_items_checked() {
                    return Err(Error::InvalidTransition(
                        "all checklist items must be checked before completion".to_string(),
                    ));
                }
                self.state = JobState::Completed {
                    cleaner,
                    completed_at: Utc::now(),
                };
                Ok(())
            }
            JobState::Open => Err(Error::InvalidTransition(
                "job is open and has no claimant".to_string(),
            )),
            JobState::Completed { .. } => Err(Error::InvalidTransition(
                "job is already completed".to_string(),
            )),
        }
    }

    /// Record the host's rating. Legal only once, on a completed job, by the
    /// owning host (or an admin).
    pub fn rate(
        &mut self,
        actor: u64,
        role: Role,
        stars: u8,
        feedback: Option<String>,
    ) -> Result<&Rating> {
        if actor != self.host && role != Role::Admin {
            return Err(Error::Forbidden(
                "only the owning host may rate this job".to_string(),
            ));
        }
        if !matches!(self.state, JobState::Completed { .. }) {
            return Err(Error::InvalidTransition(format!(
                "job is {}, not completed",
                self.state
            )));
        }
        if self.rating.is_some() {
            return Err(Error::AlreadyRated);
        }
        if !(1..=5).contains(&stars) {
            return Err(Error::InvalidRating(stars));
        }
        Ok(&*self.rating.insert(Rating {
            stars,
            feedback,
            created_at: Utc::now(),
        }))
    }

    /// Check off the given items. Unknown ids are rejected up front so
    /// nothing is applied partially; re-ticking a checked item is a no-op.
    pub fn tick(&mut self, actor: u64, role: Role, item_ids: &[u64]) -> Result<()> {
        self.ensure_claimant(actor, role)?;
        for id in item_ids {
            if !self.checklist.iter().any(|item| item.id == *id) {
                return Err(Error::InvalidChecklistItem(*id));
            }
        }
        for item in &mut self.checklist {
            if item_ids.contains(&item.id) {
                item.checked = true;
            }
        }
        Ok(())
    }

    /// Store an opaque photo reference on one item. Blob contents are the
    /// media store's problem, not ours.
    pub fn attach_photo(
        &mut self,
        actor: u64,
        role: Role,
        item_id: u64,
        photo_path: String,
    ) -> Result<&ChecklistItem> {
        self.ensure_claimant(actor, role)?;
        let item = self
            .checklist
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| Error::NotFound(format!("checklist item {}", item_id)))?;
        item.photo_path = Some(photo_path);
        Ok(item)
    }

    pub fn item(&self, item_id: u64) -> Result<&ChecklistItem> {
        self.checklist
            .iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| Error::NotFound(format!("checklist item {}", item_id)))
    }

    pub(crate) fn ensure_claimant(&self, actor: u64, role: Role) -> Result<()> {
        if role == Role::Admin {
            return Ok(());
        }
        match self.state.claimant() {
            Some(cleaner) if cleaner == actor => Ok(()),
            _ => Err(Error::Forbidden(
                "only the job's claimant may modify its checklist".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn job() -> Job {
        let start = Utc::now();
        Job::new(
            1,
            10,
            100,
            start,
            start + Duration::hours(3),
            vec![
                ChecklistItem::new(1, "Change linens".to_string()),
                ChecklistItem::new(2, "Mop floors".to_string()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_job_is_open_with_unchecked_items() {
        let job = job();
        assert!(job.is_open());
        assert_eq!(job.claimant(), None);
        assert_eq!(job.checklist().len(), 2);
        assert!(job.checklist().iter().all(|i| !i.checked));
    }

    #[test]
    fn test_degenerate_window_rejected() {
        let start = Utc::now();
        let err = Job::new(1, 10, 100, start, start, vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidWindow));
    }

    #[test]
    fn test_claim_only_wins_once() {
        let mut job = job();
        job.claim(7).unwrap();
        assert_eq!(job.claimant(), Some(7));
        assert!(matches!(job.claim(8), Err(Error::AlreadyClaimed)));
        assert_eq!(job.claimant(), Some(7));
    }

    #[test]
    fn test_complete_requires_claimed_state_and_claimant() {
        let mut job = job();
        assert!(matches!(
            job.complete(7, Role::Cleaner, false),
            Err(Error::InvalidTransition(_))
        ));

        job.claim(7).unwrap();
        assert!(matches!(
            job.complete(8, Role::Cleaner, false),
            Err(Error::Forbidden(_))
        ));

        job.complete(7, Role::Cleaner, false).unwrap();
        assert_eq!(job.state().name(), "completed");
        assert!(matches!(
            job.complete(7, Role::Cleaner, false),
            Err(Error::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_completion_policy_requires_checked_items() {
        let mut job = job();
        job.claim(7).unwrap();
        assert!(matches!(
            job.complete(7, Role::Cleaner, true),
            Err(Error::InvalidTransition(_))
        ));

        job.tick(7, Role::Cleaner, &[1, 2]).unwrap();
        job.complete(7, Role::Cleaner, true).unwrap();
    }

    #[test]
    fn test_tick_is_idempotent_and_rejects_unknown_ids() {
        let mut job = job();
        job.claim(7).unwrap();

        job.tick(7, Role::Cleaner, &[1]).unwrap();
        job.tick(7, Role::Cleaner, &[1]).unwrap();
        assert!(job.item(1).unwrap().checked);
        assert!(!job.item(2).unwrap().checked);

        let err = job.tick(7, Role::Cleaner, &[2, 99]).unwrap_err();
        assert!(matches!(err, Error::InvalidChecklistItem(99)));
        // Rejected batch applied nothing
        assert!(!job.item(2).unwrap().checked);
    }

    #[test]
    fn test_tick_gated_to_claimant_or_admin() {
        let mut job = job();
        job.claim(7).unwrap();
        assert!(matches!(
            job.tick(8, Role::Cleaner, &[1]),
            Err(Error::Forbidden(_))
        ));
        job.tick(99, Role::Admin, &[1]).unwrap();
    }

    #[test]
    fn test_rating_boundaries_and_single_shot() {
        let mut job = job();
        job.claim(7).unwrap();

        assert!(matches!(
            job.rate(100, Role::Host, 5, None),
            Err(Error::InvalidTransition(_))
        ));

        job.complete(7, Role::Cleaner, false).unwrap();

        assert!(matches!(
            job.rate(100, Role::Host, 0, None),
            Err(Error::InvalidRating(0))
        ));
        assert!(matches!(
            job.rate(100, Role::Host, 6, None),
            Err(Error::InvalidRating(6))
        ));
        assert!(matches!(
            job.rate(42, Role::Host, 5, None),
            Err(Error::Forbidden(_))
        ));

        job.rate(100, Role::Host, 5, Some("Great!".to_string()))
            .unwrap();
        assert!(matches!(
            job.rate(100, Role::Host, 1, None),
            Err(Error::AlreadyRated)
        ));
    }

    #[test]
    fn test_attach_photo_requires_matching_item() {
        let mut job = job();
        job.claim(7).unwrap();
        let item = job
            .attach_photo(7, Role::Cleaner, 2, "/media/x.bin".to_string())
            .unwrap();
        assert_eq!(item.photo_path.as_deref(), Some("/media/x.bin"));

        assert!(matches!(
            job.attach_photo(7, Role::Cleaner, 99, "/media/y.bin".to_string()),
            Err(Error::NotFound(_))
        ));
    }
}

//! Pass merging and reconciliation against the stored ledger.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sleuth_core::{has_value, Clock, EnrichedJob};
use tracing::{debug, info};

use crate::error::Result;
use crate::id::stable_id;
use crate::store::{JobStore, TrackedJob};

fn job_id(job: &EnrichedJob) -> String {
    stable_id(&job.posting.company, &job.posting.title, &job.posting.url)
}

/// Replace `current` with `incoming` when only the latter carries a value.
fn backfill(current: &mut String, incoming: &str) -> bool {
    if !has_value(current) && has_value(incoming) {
        *current = incoming.to_string();
        return true;
    }
    false
}

/// Merge several scrape passes into one list keyed by stable ID.
///
/// Jobs keep the position of their first appearance. A later pass only fills
/// in salary fields the earlier ones were missing.
#[must_use]
pub fn merge_passes(passes: Vec<Vec<EnrichedJob>>) -> Vec<EnrichedJob> {
    let mut merged: Vec<EnrichedJob> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (pass, jobs) in passes.into_iter().enumerate() {
        let mut added = 0usize;
        for job in jobs {
            let id = job_id(&job);
            if let Some(&slot) = index.get(&id) {
                let kept = &mut merged[slot];
                if backfill(&mut kept.posting.salary_range, &job.posting.salary_range) {
                    debug!(id = %id, pass = pass + 1, "salary backfilled from later pass");
                }
                backfill(&mut kept.level_salary, &job.level_salary);
            } else {
                index.insert(id, merged.len());
                merged.push(job);
                added += 1;
            }
        }
        debug!(pass = pass + 1, added, total = merged.len(), "merged scrape pass");
    }

    merged
}

/// Outcome of reconciling one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Jobs seen for the first time in this pass
    pub new_jobs: Vec<TrackedJob>,
    /// Ledger reflecting exactly the jobs of this pass
    pub store: JobStore,
}

/// Reconcile `pass` against the previous ledger.
///
/// Jobs present in both keep their `first_seen`, get `last_seen = now` and
/// have empty salary fields backfilled. Jobs absent from the pass are
/// dropped. Jobs not in the previous ledger are reported as new.
#[must_use]
pub fn reconcile(pass: &[EnrichedJob], previous: JobStore, now: DateTime<Utc>) -> Reconciliation {
    let mut known: HashMap<String, TrackedJob> = previous
        .jobs
        .into_iter()
        .map(|job| (job.id.clone(), job))
        .collect();

    let mut jobs: Vec<TrackedJob> = Vec::with_capacity(pass.len());
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut new_jobs = Vec::new();

    for job in pass {
        let id = job_id(job);

        if let Some(&slot) = positions.get(&id) {
            let tracked = &mut jobs[slot];
            backfill(&mut tracked.salary_range, &job.posting.salary_range);
            backfill(&mut tracked.level_salary, &job.level_salary);
            continue;
        }

        let tracked = match known.remove(&id) {
            Some(mut existing) => {
                existing.last_seen = now;
                backfill(&mut existing.salary_range, &job.posting.salary_range);
                backfill(&mut existing.level_salary, &job.level_salary);
                existing
            }
            None => {
                let fresh = TrackedJob::from_enriched(job, now);
                new_jobs.push(fresh.clone());
                fresh
            }
        };

        positions.insert(id, jobs.len());
        jobs.push(tracked);
    }

    info!(
        total = jobs.len(),
        new = new_jobs.len(),
        removed = known.len(),
        "reconciled ledger"
    );

    Reconciliation {
        new_jobs,
        store: JobStore {
            last_updated: Some(now),
            jobs,
        },
    }
}

/// A ledger file plus the clock used to stamp it.
#[derive(Clone)]
pub struct Ledger {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Ledger stored at `path`.
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    /// Location of the ledger file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reconcile `pass` against the file, rewrite it, and return the new jobs.
    pub fn record(&self, pass: &[EnrichedJob]) -> Result<Vec<TrackedJob>> {
        let previous = JobStore::load(&self.path);
        let Reconciliation { new_jobs, store } = reconcile(pass, previous, self.clock.now());
        store.save(&self.path)?;
        Ok(new_jobs)
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").field("path", &self.path).finish()
    }
}

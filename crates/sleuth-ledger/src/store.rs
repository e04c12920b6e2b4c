//! Persisted ledger file.
//!
//! The file is a single JSON object `{last_updated, jobs}` that is rewritten
//! in full on every save.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sleuth_core::{EnrichedJob, Source};
use tracing::{debug, warn};

use crate::error::{LedgerError, Result};
use crate::id::stable_id;

/// A job as remembered across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedJob {
    /// Stable identifier derived from company, title and URL
    pub id: String,
    /// Company display name
    pub company: String,
    /// Job title
    pub title: String,
    /// Location as listed by the source
    pub location: String,
    /// Link to the posting
    pub url: String,
    /// Salary text; empty when never found
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub salary_range: String,
    /// Company compensation figure; empty when never found
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub level_salary: String,
    /// Board the posting came from
    pub source: Source,
    /// First run that saw this job
    pub first_seen: DateTime<Utc>,
    /// Latest run that saw this job
    pub last_seen: DateTime<Utc>,
}

impl TrackedJob {
    /// Track a freshly seen job.
    #[must_use]
    pub fn from_enriched(job: &EnrichedJob, now: DateTime<Utc>) -> Self {
        let posting = &job.posting;
        Self {
            id: stable_id(&posting.company, &posting.title, &posting.url),
            company: posting.company.clone(),
            title: posting.title.clone(),
            location: posting.location.clone(),
            url: posting.url.clone(),
            salary_range: posting.salary_range.clone(),
            level_salary: job.level_salary.clone(),
            source: posting.source,
            first_seen: now,
            last_seen: now,
        }
    }
}

/// All tracked jobs plus the time of the last reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStore {
    /// Time of the last save
    pub last_updated: Option<DateTime<Utc>>,
    /// Jobs from the most recent pass
    #[serde(default)]
    pub jobs: Vec<TrackedJob>,
}

impl JobStore {
    /// Load the ledger at `path`.
    ///
    /// A missing file is an empty ledger. An unreadable or corrupt file is
    /// logged and also treated as empty, so the next save replaces it.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(store)) => {
                debug!(path = %path.display(), jobs = store.jobs.len(), "loaded ledger");
                store
            }
            Ok(None) => {
                debug!(path = %path.display(), "no ledger yet, starting empty");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable ledger");
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(path).map_err(|e| LedgerError::io(path, e))?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Write the ledger to `path`, replacing the previous file.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)?;
        debug!(path = %path.display(), jobs = self.jobs.len(), "saved ledger");
        Ok(())
    }
}

/// Pretty-print `value` to `path` through a sibling temp file and a rename.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))?;
    }
    let data = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data).map_err(|e| LedgerError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| LedgerError::io(path, e))?;
    Ok(())
}

//! Learning-path bookkeeping: progress sync, achievements, certificates.
//!
//! Thin, typed layer over a [`KvStore`]. Cross-request consistency is the
//! store's concern; this module only encodes the merge rules (last-write-
//! wins progress sync, award-once achievements).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::Result;
use crate::persistence::KvStore;

/// Persisted progress for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub student_id: String,
    #[serde(default)]
    pub algorithm_progress: BTreeMap<String, Value>,
    #[serde(default)]
    pub completed_steps: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub onboarding_complete: bool,
    pub last_sync: DateTime<Utc>,
}

impl ProgressRecord {
    /// Empty record for a student with no stored progress.
    pub fn empty(student_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            student_id: student_id.into(),
            algorithm_progress: BTreeMap::new(),
            completed_steps: BTreeMap::new(),
            onboarding_complete: false,
            last_sync: now,
        }
    }
}

/// Result of a progress sync attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// Incoming timestamp was newer; updates merged and stored.
    Applied,
    /// Server copy is newer; nothing written.
    Conflict { server: ProgressRecord },
}

/// An earned achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub achievement_id: String,
    pub earned_date: DateTime<Utc>,
}

/// Result of an achievement award attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AwardOutcome {
    Awarded(Achievement),
    AlreadyAwarded,
}

/// An issued certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub certificate_id: String,
    pub certificate_type: String,
    pub student_name: String,
    pub completion_date: DateTime<Utc>,
    pub download_url: String,
    pub share_url: String,
}

/// Progress, achievement, and certificate bookkeeping over a [`KvStore`].
pub struct LearningPath<S: KvStore> {
    store: S,
}

impl<S: KvStore> LearningPath<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn progress_key(student_id: &str) -> String {
        format!("progress/{student_id}")
    }

    fn achievements_key(student_id: &str) -> String {
        format!("achievements/{student_id}")
    }

    fn certificates_key(student_id: &str) -> String {
        format!("certificates/{student_id}")
    }

    // -- Progress ------------------------------------------------------------

    pub fn save_progress(&self, record: &ProgressRecord) -> Result<()> {
        self.store.save(
            &Self::progress_key(&record.student_id),
            serde_json::to_value(record)?,
        )
    }

    /// Load a student's progress; unknown students get an empty record
    /// stamped with `now`.
    pub fn load_progress(&self, student_id: &str, now: DateTime<Utc>) -> Result<ProgressRecord> {
        match self.store.load(&Self::progress_key(student_id))? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(ProgressRecord::empty(student_id, now)),
        }
    }

    /// Merge `updates` into the stored record if `timestamp` is newer than
    /// the stored sync time; otherwise report a conflict carrying the
    /// server copy. Last write wins.
    pub fn sync_progress(
        &self,
        student_id: &str,
        updates: BTreeMap<String, Value>,
        timestamp: DateTime<Utc>,
    ) -> Result<SyncOutcome> {
        let key = Self::progress_key(student_id);
        match self.store.load(&key)? {
            None => {
                let record = ProgressRecord {
                    student_id: student_id.to_string(),
                    algorithm_progress: updates,
                    completed_steps: BTreeMap::new(),
                    onboarding_complete: false,
                    last_sync: timestamp,
                };
                self.store.save(&key, serde_json::to_value(&record)?)?;
                Ok(SyncOutcome::Applied)
            }
            Some(value) => {
                let mut record: ProgressRecord = serde_json::from_value(value)?;
                if timestamp > record.last_sync {
                    record.algorithm_progress.extend(updates);
                    record.last_sync = timestamp;
                    self.store.save(&key, serde_json::to_value(&record)?)?;
                    Ok(SyncOutcome::Applied)
                } else {
                    Ok(SyncOutcome::Conflict { server: record })
                }
            }
        }
    }

    // -- Achievements --------------------------------------------------------

    pub fn achievements(&self, student_id: &str) -> Result<Vec<Achievement>> {
        match self.store.load(&Self::achievements_key(student_id))? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Award an achievement once; repeat awards are reported, not stored.
    pub fn award(
        &self,
        student_id: &str,
        achievement_id: &str,
        earned_date: DateTime<Utc>,
    ) -> Result<AwardOutcome> {
        let mut achievements = self.achievements(student_id)?;
        if achievements
            .iter()
            .any(|a| a.achievement_id == achievement_id)
        {
            return Ok(AwardOutcome::AlreadyAwarded);
        }
        let achievement = Achievement {
            achievement_id: achievement_id.to_string(),
            earned_date,
        };
        achievements.push(achievement.clone());
        self.store.save(
            &Self::achievements_key(student_id),
            serde_json::to_value(&achievements)?,
        )?;
        Ok(AwardOutcome::Awarded(achievement))
    }

    // -- Certificates --------------------------------------------------------

    pub fn certificates(&self, student_id: &str) -> Result<Vec<Certificate>> {
        match self.store.load(&Self::certificates_key(student_id))? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn issue_certificate(
        &self,
        student_id: &str,
        certificate_type: &str,
        student_name: &str,
        completion_date: DateTime<Utc>,
    ) -> Result<Certificate> {
        let certificate_id = format!(
            "CERT-{}-{}",
            certificate_type.to_uppercase(),
            Uuid::new_v4()
        );
        let certificate = Certificate {
            download_url: format!("/api/certificates/download/{certificate_id}"),
            share_url: format!("/certificates/{certificate_id}"),
            certificate_id,
            certificate_type: certificate_type.to_string(),
            student_name: student_name.to_string(),
            completion_date,
        };
        let mut certificates = self.certificates(student_id)?;
        certificates.push(certificate.clone());
        self.store.save(
            &Self::certificates_key(student_id),
            serde_json::to_value(&certificates)?,
        )?;
        Ok(certificate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn timestamp(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn path() -> LearningPath<MemoryStore> {
        LearningPath::new(MemoryStore::new())
    }

    #[test]
    fn test_load_unknown_student_is_empty() {
        let path = path();
        let record = path.load_progress("alice", timestamp(0)).unwrap();
        assert_eq!(record.student_id, "alice");
        assert!(record.algorithm_progress.is_empty());
        assert!(!record.onboarding_complete);
    }

    #[test]
    fn test_save_then_load_progress() {
        let path = path();
        let mut record = ProgressRecord::empty("alice", timestamp(0));
        record
            .algorithm_progress
            .insert("kmeans".into(), json!({ "step": 2 }));
        record.onboarding_complete = true;
        path.save_progress(&record).unwrap();

        let loaded = path.load_progress("alice", timestamp(5)).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_sync_new_student_applies() {
        let path = path();
        let updates = BTreeMap::from([("kmeans".to_string(), json!({ "step": 1 }))]);
        let outcome = path.sync_progress("bob", updates, timestamp(10)).unwrap();
        assert_eq!(outcome, SyncOutcome::Applied);

        let record = path.load_progress("bob", timestamp(20)).unwrap();
        assert_eq!(record.algorithm_progress["kmeans"], json!({ "step": 1 }));
        assert_eq!(record.last_sync, timestamp(10));
    }

    #[test]
    fn test_sync_newer_timestamp_merges() {
        let path = path();
        let first = BTreeMap::from([("a".to_string(), json!(1))]);
        path.sync_progress("bob", first, timestamp(10)).unwrap();

        let second = BTreeMap::from([("b".to_string(), json!(2))]);
        let outcome = path.sync_progress("bob", second, timestamp(20)).unwrap();
        assert_eq!(outcome, SyncOutcome::Applied);

        let record = path.load_progress("bob", timestamp(30)).unwrap();
        assert_eq!(record.algorithm_progress.len(), 2);
        assert_eq!(record.last_sync, timestamp(20));
    }

    #[test]
    fn test_sync_older_timestamp_conflicts() {
        let path = path();
        let first = BTreeMap::from([("a".to_string(), json!(1))]);
        path.sync_progress("bob", first, timestamp(100)).unwrap();

        let stale = BTreeMap::from([("b".to_string(), json!(2))]);
        let outcome = path.sync_progress("bob", stale, timestamp(50)).unwrap();
        match outcome {
            SyncOutcome::Conflict { server } => {
                assert_eq!(server.last_sync, timestamp(100));
                assert!(!server.algorithm_progress.contains_key("b"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        // Stored data unchanged by the stale sync.
        let record = path.load_progress("bob", timestamp(0)).unwrap();
        assert_eq!(record.last_sync, timestamp(100));
        assert!(!record.algorithm_progress.contains_key("b"));
    }

    #[test]
    fn test_award_once() {
        let path = path();
        let outcome = path.award("alice", "first_run", timestamp(0)).unwrap();
        assert!(matches!(outcome, AwardOutcome::Awarded(_)));

        let repeat = path.award("alice", "first_run", timestamp(5)).unwrap();
        assert_eq!(repeat, AwardOutcome::AlreadyAwarded);

        assert_eq!(path.achievements("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_issue_certificates_unique_ids() {
        let path = path();
        let first = path
            .issue_certificate("alice", "fundamentals", "Alice", timestamp(0))
            .unwrap();
        let second = path
            .issue_certificate("alice", "fundamentals", "Alice", timestamp(1))
            .unwrap();

        assert_ne!(first.certificate_id, second.certificate_id);
        assert!(first.certificate_id.starts_with("CERT-FUNDAMENTALS-"));
        assert!(
            first
                .download_url
                .ends_with(&first.certificate_id)
        );
        assert_eq!(path.certificates("alice").unwrap().len(), 2);
    }
}

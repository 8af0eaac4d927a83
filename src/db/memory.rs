//! In-process store for handler tests. Mirrors the Postgres constraints that
//! the handlers rely on: unique emails and one analysis per submission.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{Store, StoreError, StoreTx};
use crate::auth::repo_types::User;
use crate::code::repo_types::{CodeAnalysis, CodeSubmission};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    submissions: Vec<CodeSubmission>,
    analyses: Vec<CodeAnalysis>,
    user_seq: i64,
    submission_seq: i64,
    analysis_seq: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    offline: AtomicBool,
    stale_email_lookups: AtomicBool,
    fail_analysis_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the database were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// `find_user_by_email` always misses, so only the unique constraint
    /// can catch a duplicate.
    pub fn set_stale_email_lookups(&self, stale: bool) {
        self.stale_email_lookups.store(stale, Ordering::SeqCst);
    }

    pub fn set_fail_analysis_writes(&self, fail: bool) {
        self.fail_analysis_writes.store(fail, Ordering::SeqCst);
    }

    pub fn user_count(&self) -> usize {
        lock(&self.tables).users.len()
    }

    pub fn submissions(&self) -> Vec<CodeSubmission> {
        lock(&self.tables).submissions.clone()
    }

    pub fn analyses(&self) -> Vec<CodeAnalysis> {
        lock(&self.tables).analyses.clone()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

fn lock(tables: &Mutex<Tables>) -> MutexGuard<'_, Tables> {
    tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check_online()?;
        if self.stale_email_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(lock(&self.tables)
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.check_online()?;
        Ok(lock(&self.tables).users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, StoreError> {
        self.check_online()?;
        let mut tables = lock(&self.tables);
        if tables.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict);
        }
        tables.user_seq += 1;
        let user = User {
            id: tables.user_seq,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        self.check_online()?;
        Ok(Box::new(MemoryTx {
            tables: Arc::clone(&self.tables),
            fail_analysis_writes: Arc::clone(&self.fail_analysis_writes),
            submissions: Vec::new(),
            analyses: Vec::new(),
        }))
    }
}

struct MemoryTx {
    tables: Arc<Mutex<Tables>>,
    fail_analysis_writes: Arc<AtomicBool>,
    submissions: Vec<CodeSubmission>,
    analyses: Vec<CodeAnalysis>,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_submission(
        &mut self,
        user_id: i64,
        code: &str,
    ) -> Result<CodeSubmission, StoreError> {
        let id = {
            let mut tables = lock(&self.tables);
            tables.submission_seq += 1;
            tables.submission_seq
        };
        let submission = CodeSubmission {
            id,
            user_id,
            code: code.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.submissions.push(submission.clone());
        Ok(submission)
    }

    async fn insert_analysis(
        &mut self,
        submission_id: i64,
        analysis_results: &serde_json::Value,
        model_used: &str,
    ) -> Result<CodeAnalysis, StoreError> {
        if self.fail_analysis_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".into()));
        }
        if self.analyses.iter().any(|a| a.submission_id == submission_id) {
            return Err(StoreError::Conflict);
        }
        let id = {
            let mut tables = lock(&self.tables);
            tables.analysis_seq += 1;
            tables.analysis_seq
        };
        let analysis = CodeAnalysis {
            id,
            submission_id,
            analysis_results: analysis_results.clone(),
            model_used: model_used.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.analyses.push(analysis.clone());
        Ok(analysis)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx {
            tables: shared,
            submissions,
            analyses,
            ..
        } = *self;
        let mut tables = lock(&shared);
        tables.submissions.extend(submissions);
        tables.analyses.extend(analyses);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn second_analysis_for_a_submission_conflicts() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let submission = tx.insert_submission(1, "fn main() {}").await.unwrap();
        tx.insert_analysis(submission.id, &json!({}), "m").await.unwrap();

        let err = tx
            .insert_analysis(submission.id, &json!({}), "m")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(AppError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_no_rows() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_submission(1, "x").await.unwrap();
        drop(tx);
        assert!(store.submissions().is_empty());
    }
}

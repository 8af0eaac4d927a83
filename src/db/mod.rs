use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use tracing::debug;

use crate::auth::repo_types::User;
use crate::code::repo_types::{CodeAnalysis, CodeSubmission};

#[cfg(test)]
pub mod memory;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated")]
    Conflict,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            _ => StoreError::Database(e),
        }
    }
}

/// Persistence used by the request handlers.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    /// Fails with [`StoreError::Conflict`] when the email is already taken.
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, StoreError>;
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;
}

/// A unit of work. Dropping it without `commit` discards every write.
#[async_trait]
pub trait StoreTx: Send {
    async fn insert_submission(
        &mut self,
        user_id: i64,
        code: &str,
    ) -> Result<CodeSubmission, StoreError>;
    async fn insert_analysis(
        &mut self,
        submission_id: i64,
        analysis_results: &serde_json::Value,
        model_used: &str,
    ) -> Result<CodeAnalysis, StoreError>;
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, email, hashed_password).await?)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self.pool.begin().await?;
        debug!("transaction opened");
        Ok(Box::new(PgTx { tx }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_submission(
        &mut self,
        user_id: i64,
        code: &str,
    ) -> Result<CodeSubmission, StoreError> {
        CodeSubmission::insert_tx(&mut self.tx, user_id, code)
            .await
            .map_err(StoreError::from)
    }

    async fn insert_analysis(
        &mut self,
        submission_id: i64,
        analysis_results: &serde_json::Value,
        model_used: &str,
    ) -> Result<CodeAnalysis, StoreError> {
        CodeAnalysis::insert_tx(&mut self.tx, submission_id, analysis_results, model_used)
            .await
            .map_err(StoreError::from)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        debug!("transaction committed");
        Ok(())
    }
}

//! Job repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use queuectl_core::error::{AppError, ErrorKind};
use queuectl_core::result::AppResult;
use queuectl_entity::job::{Job, JobState, NewJob};

/// Claimability predicate shared by the candidate scan and the lease update.
/// `$now` must be bound at the position noted by each caller.
const CLAIMABLE: &str = "locked_by IS NULL \
     AND (state = 'pending' OR (state = 'failed' AND next_retry_at <= {now})) \
     AND (run_at IS NULL OR run_at <= {now})";

/// Repository for job CRUD, queue scans, and lease updates.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending job; a taken id surfaces as `DuplicateId`.
    pub async fn create(&self, new: &NewJob) -> AppResult<Job> {
        let id = new
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (id, command, priority, max_retries, timeout_ms, run_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(&id)
        .bind(&new.command)
        .bind(new.priority)
        .bind(new.max_retries)
        .bind(new.timeout_ms)
        .bind(new.run_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::duplicate_id(&id),
            _ => AppError::with_source(ErrorKind::Database, "Failed to create job", e),
        })
    }

    /// Find a job by exact id.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))
    }

    /// Find up to `limit` jobs whose id starts with `prefix`.
    pub async fn find_by_prefix(&self, prefix: &str, limit: i64) -> AppResult<Vec<Job>> {
        sqlx::query_as::<_, Job>(
            r"SELECT * FROM jobs WHERE id LIKE $1 ESCAPE '\' ORDER BY id LIMIT $2",
        )
        .bind(format!("{}%", escape_like(prefix)))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job by prefix", e))
    }

    /// List all jobs, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list jobs", e))
    }

    /// List jobs in a given state, newest first.
    pub async fn find_by_state(&self, state: JobState) -> AppResult<Vec<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE state = $1 ORDER BY created_at DESC")
            .bind(state)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list jobs by state", e)
            })
    }

    /// List dead jobs, most recently updated first.
    pub async fn find_dead(&self) -> AppResult<Vec<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE state = 'dead' ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list dead jobs", e))
    }

    /// Claimable jobs at `now`, filtered and ordered by the query itself.
    pub async fn candidates(&self, limit: i64, now: DateTime<Utc>) -> AppResult<Vec<Job>> {
        let sql = format!(
            "SELECT * FROM jobs WHERE {} ORDER BY priority DESC, created_at ASC LIMIT $2",
            CLAIMABLE.replace("{now}", "$1")
        );
        sqlx::query_as::<_, Job>(&sql)
            .bind(now)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch candidates", e))
    }

    /// Compare-and-set the lease. Row-level locking in PostgreSQL serializes
    /// concurrent updates of the same row, so at most one caller sees a
    /// matching row.
    pub async fn acquire_lease(
        &self,
        job_id: &str,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let sql = format!(
            "UPDATE jobs SET locked_by = $2, locked_at = $3, updated_at = NOW() \
             WHERE id = $1 AND {}",
            CLAIMABLE.replace("{now}", "$3")
        );
        let result = sqlx::query(&sql)
            .bind(job_id)
            .bind(worker_id)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to acquire lease", e))?;
        Ok(result.rows_affected() == 1)
    }

    /// Clear the lease unconditionally.
    pub async fn release_lease(&self, job_id: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET locked_by = NULL, locked_at = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to release lease", e))?;
        Ok(())
    }

    /// Change state along a lifecycle edge; entering processing stamps
    /// `started_at` and drops the consumed retry time.
    pub async fn set_state(&self, job_id: &str, state: JobState) -> AppResult<Job> {
        let from: Vec<&str> = JobState::predecessors(state)
            .iter()
            .map(JobState::as_str)
            .collect();
        let job = sqlx::query_as::<_, Job>(
            "UPDATE jobs SET state = $2, \
                started_at = CASE WHEN $2 = 'processing'::job_state THEN NOW() ELSE started_at END, \
                next_retry_at = CASE WHEN $2 = 'processing'::job_state THEN NULL ELSE next_retry_at END, \
                updated_at = NOW() \
             WHERE id = $1 AND state::text = ANY($3) RETURNING *",
        )
        .bind(job_id)
        .bind(state)
        .bind(from)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update job state", e))?;

        match job {
            Some(job) => Ok(job),
            None => match self.find_by_id(job_id).await? {
                Some(current) => Err(AppError::invalid_transition(job_id, current.state, state)),
                None => Err(missing(job_id)),
            },
        }
    }

    /// Mark a job as completed.
    pub async fn complete(&self, job_id: &str, output: &str, duration_ms: i64) -> AppResult<Job> {
        let job = sqlx::query_as::<_, Job>(
            "UPDATE jobs SET state = 'completed', output = $2, duration_ms = $3, \
             completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(job_id)
        .bind(output)
        .bind(duration_ms)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete job", e))?;
        job.ok_or_else(|| missing(job_id))
    }

    /// Mark a job as failed with a pending retry.
    pub async fn fail(
        &self,
        job_id: &str,
        attempts: i32,
        error: &str,
        next_retry_at: DateTime<Utc>,
    ) -> AppResult<Job> {
        let job = sqlx::query_as::<_, Job>(
            "UPDATE jobs SET state = 'failed', attempts = $2, error = $3, next_retry_at = $4, \
             updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(job_id)
        .bind(attempts)
        .bind(error)
        .bind(next_retry_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to schedule retry", e))?;
        job.ok_or_else(|| missing(job_id))
    }

    /// Mark a job as dead.
    pub async fn bury(&self, job_id: &str, attempts: i32, error: &str) -> AppResult<Job> {
        let job = sqlx::query_as::<_, Job>(
            "UPDATE jobs SET state = 'dead', attempts = $2, error = $3, next_retry_at = NULL, \
             updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(job_id)
        .bind(attempts)
        .bind(error)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move job to DLQ", e))?;
        job.ok_or_else(|| missing(job_id))
    }

    /// Reset a dead job to pending. Returns `None` if it is not dead.
    pub async fn requeue_dead(&self, job_id: &str) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET state = 'pending', attempts = 0, error = NULL, next_retry_at = NULL, \
             updated_at = NOW() \
             WHERE id = $1 AND state = 'dead' RETURNING *",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to requeue job", e))
    }

    /// Count jobs grouped by state.
    pub async fn count_by_state(&self) -> AppResult<Vec<(JobState, i64)>> {
        sqlx::query_as::<_, (JobState, i64)>("SELECT state, COUNT(*) FROM jobs GROUP BY state")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count jobs", e))
    }

    /// Mean duration of completed jobs (missing durations count as zero).
    pub async fn average_completed_duration(&self) -> AppResult<Option<f64>> {
        sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(COALESCE(duration_ms, 0))::DOUBLE PRECISION FROM jobs \
             WHERE state = 'completed'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to average job durations", e)
        })
    }
}

fn missing(job_id: &str) -> AppError {
    AppError::not_found(format!("Job \"{job_id}\" not found"))
}

/// Escape `LIKE` wildcards so user input matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

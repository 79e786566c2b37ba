//! Operation orchestrator

use std::time::Duration;

use tracing::Instrument;

use crate::auth::CurrentUser;
use crate::db::{JobRepository, Operation, ProcessingJob};
use crate::error::{AppError, Result};
use crate::pdf::{CompressionResult, EngineError, EngineResult, PdfEngine};
use crate::state::AppState;

/// Value returned by a tracked engine call
pub trait EngineOutput: Send + 'static {
    /// Output filenames recorded on the job
    fn output_files(&self) -> Vec<String>;
}

impl EngineOutput for String {
    fn output_files(&self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl EngineOutput for Vec<String> {
    fn output_files(&self) -> Vec<String> {
        self.clone()
    }
}

impl EngineOutput for CompressionResult {
    fn output_files(&self) -> Vec<String> {
        vec![self.output_file.clone()]
    }
}

/// A completed job together with the engine output that completed it
#[derive(Debug, Clone)]
pub struct JobOutcome<T> {
    pub job: ProcessingJob,
    pub output: T,
}

/// Run `work` on the blocking pool, bounded by `limit`.
///
/// A timed-out call is abandoned, not cancelled; any files it writes later are
/// left for cleanup.
async fn run_blocking<T, F>(engine: PdfEngine, limit: Duration, work: F) -> EngineResult<T>
where
    T: Send + 'static,
    F: FnOnce(&PdfEngine) -> EngineResult<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || work(&engine));

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(EngineError::Aborted(join_error.to_string())),
        Err(_) => Err(EngineError::Timeout(limit.as_secs())),
    }
}

/// Run an untracked engine call, such as metadata extraction
pub async fn execute<T, F>(state: &AppState, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&PdfEngine) -> EngineResult<T> + Send + 'static,
{
    let limit = state.config().processing.timeout();
    Ok(run_blocking(state.engine().clone(), limit, work).await?)
}

/// Create a job for `user`, run `work`, and record the outcome on the job.
///
/// Engine failures mark the job failed and come back as errors carrying the
/// job id. Ledger failures propagate as-is.
pub async fn run_job<T, F>(
    state: &AppState,
    user: &CurrentUser,
    operation: Operation,
    input_files: Vec<String>,
    work: F,
) -> Result<JobOutcome<T>>
where
    T: EngineOutput,
    F: FnOnce(&PdfEngine) -> EngineResult<T> + Send + 'static,
{
    let jobs = JobRepository::new(state.db());
    let job = jobs.create(user.id, operation, &input_files).await?;

    let span = tracing::info_span!("job", job_id = job.id, operation = %operation, owner = user.id);
    let limit = state.config().processing.timeout();

    async move {
        tracing::info!(inputs = input_files.len(), "Job started");

        match run_blocking(state.engine().clone(), limit, work).await {
            Ok(output) => {
                let job = jobs.complete(job.id, &output.output_files()).await?;
                tracing::info!(outputs = job.output_files.len(), "Job completed");
                Ok(JobOutcome { job, output })
            }
            Err(e) => {
                tracing::error!(error = %e, "Job failed");
                jobs.fail(job.id, &e.to_string()).await?;
                Err(AppError::from(e).with_job(job.id))
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{create_pool, JobStatus, UserRepository};
    use crate::pdf::{test_pdf, PageRange};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, AppState, CurrentUser) {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.upload_dir = dir.path().join("uploads");
        config.storage.processed_dir = dir.path().join("processed");
        std::fs::create_dir_all(&config.storage.upload_dir).unwrap();
        std::fs::create_dir_all(&config.storage.processed_dir).unwrap();

        let pool = create_pool("sqlite::memory:").await.unwrap();
        let user = UserRepository::new(&pool)
            .create("owner", "owner-key", false)
            .await
            .unwrap();
        let state = AppState::new(config, pool).unwrap();

        let current = CurrentUser {
            id: user.id,
            username: user.username,
            is_admin: false,
        };
        (dir, state, current)
    }

    #[tokio::test]
    async fn test_successful_job_is_completed() {
        let (_dir, state, user) = setup().await;
        test_pdf::write_sample(state.store().upload_dir(), "a.pdf", 3);
        test_pdf::write_sample(state.store().upload_dir(), "b.pdf", 2);

        let files = vec!["a.pdf".to_string(), "b.pdf".to_string()];
        let inputs = files.clone();
        let outcome = run_job(&state, &user, Operation::Merge, files, move |engine| {
            engine.merge(&inputs)
        })
        .await
        .unwrap();

        assert_eq!(outcome.job.status, JobStatus::Completed);
        assert_eq!(outcome.job.user_id, user.id);
        assert_eq!(outcome.job.output_files, vec![outcome.output.clone()]);

        let output = state.store().processed_dir().join(&outcome.job.output_files[0]);
        assert_eq!(test_pdf::page_count(&output), 5);
    }

    #[tokio::test]
    async fn test_failed_job_is_recorded() {
        let (_dir, state, user) = setup().await;
        test_pdf::write_sample(state.store().upload_dir(), "a.pdf", 2);

        let err = run_job(
            &state,
            &user,
            Operation::Split,
            vec!["a.pdf".to_string()],
            |engine| engine.split("a.pdf", Some(PageRange::new(5, 6))),
        )
        .await
        .unwrap_err();

        let job_id = match err {
            AppError::Processing { job_id: Some(id), .. } => id,
            other => panic!("unexpected error: {:?}", other),
        };

        let job = JobRepository::new(state.db()).get(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.output_files.is_empty());
        assert!(!job.error_message.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_engine_call_fails_job() {
        let (_dir, state, user) = setup().await;

        let err = run_job(
            &state,
            &user,
            Operation::Compress,
            vec!["a.pdf".to_string()],
            |_engine| -> EngineResult<String> { panic!("engine blew up") },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Processing { job_id: Some(_), .. }));
    }

    #[tokio::test]
    async fn test_slow_engine_call_times_out() {
        let (_dir, state, _user) = setup().await;

        let result = run_blocking(state.engine().clone(), Duration::from_millis(20), |_engine| {
            std::thread::sleep(Duration::from_millis(500));
            Ok("late.pdf".to_string())
        })
        .await;

        assert!(matches!(result, Err(EngineError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_missing_input_fails_job() {
        let (_dir, state, user) = setup().await;

        let err = run_job(&state, &user, Operation::Compress, vec!["nope.pdf".to_string()], |engine| {
            engine.compress("nope.pdf", Default::default())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::FileNotFound(_)));

        let job = JobRepository::new(state.db()).get(1).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error_message.unwrap().contains("nope.pdf"));
    }
}

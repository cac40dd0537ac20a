//! Scheduled post worker
//!
//! Polls `scheduled_posts` for due jobs and creates the posts they describe.
//! A failed job goes back to pending and is retried on a later tick until
//! `max_attempts` is reached, after which it is marked failed for good.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::time::interval;

use crate::config::SchedulerConfig;
use crate::error::{AppError, Result};
use crate::models::{NewPost, ScheduledPost};
use crate::repository::Repositories;

/// A claim older than this is considered abandoned by a crashed worker
const CLAIM_LEASE_SECS: i64 = 300;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub created: usize,
    pub retried: usize,
    pub abandoned: usize,
}

pub async fn start_scheduled_post_worker(repos: Repositories, config: SchedulerConfig) {
    let poll_every = Duration::from_secs(config.poll_interval_secs.max(1));
    tracing::info!(
        poll_interval_secs = poll_every.as_secs(),
        batch_size = config.batch_size,
        max_attempts = config.max_attempts,
        "Starting scheduled post worker"
    );

    let mut ticker = interval(poll_every);
    loop {
        ticker.tick().await;

        let cycle_start = Instant::now();
        match run_due_jobs(&repos, &config, Utc::now()).await {
            Ok(summary) if summary == RunSummary::default() => {}
            Ok(summary) => tracing::info!(
                created = summary.created,
                retried = summary.retried,
                abandoned = summary.abandoned,
                duration_ms = cycle_start.elapsed().as_millis() as u64,
                "Scheduled post cycle completed"
            ),
            Err(e) => tracing::error!(error = %e, "Scheduled post cycle failed"),
        }
    }
}

/// Claim and execute every job due at `now`
pub async fn run_due_jobs(
    repos: &Repositories,
    config: &SchedulerConfig,
    now: DateTime<Utc>,
) -> Result<RunSummary> {
    let jobs = repos
        .scheduled_posts
        .claim_due(now, chrono::Duration::seconds(CLAIM_LEASE_SECS), config.batch_size)
        .await?;

    let mut summary = RunSummary::default();
    for job in jobs {
        match execute(repos, &job).await {
            Ok(post_id) => {
                repos.scheduled_posts.mark_completed(job.id, post_id).await?;
                tracing::info!(job_id = %job.id, %post_id, owner_id = %job.owner_id, "Scheduled post created");
                summary.created += 1;
            }
            Err(e) => {
                let give_up = job.attempts >= config.max_attempts;
                repos
                    .scheduled_posts
                    .mark_failed(job.id, &e.to_string(), give_up)
                    .await?;
                if give_up {
                    tracing::error!(job_id = %job.id, attempts = job.attempts, error = %e, "Scheduled post abandoned");
                    summary.abandoned += 1;
                } else {
                    tracing::warn!(job_id = %job.id, attempts = job.attempts, error = %e, "Scheduled post failed, will retry");
                    summary.retried += 1;
                }
            }
        }
    }
    Ok(summary)
}

async fn execute(repos: &Repositories, job: &ScheduledPost) -> Result<uuid::Uuid> {
    if repos.users.find_user(job.owner_id).await?.is_none() {
        return Err(AppError::NotFound(format!("owner {} no longer exists", job.owner_id)));
    }

    let post = repos
        .posts
        .create_post(NewPost {
            owner_id: job.owner_id,
            title: job.title.clone(),
            text: job.text.clone(),
            content: job.content_path.clone(),
        })
        .await?;
    Ok(post.id)
}

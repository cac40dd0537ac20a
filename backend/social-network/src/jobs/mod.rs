pub mod revoked_tokens;
pub mod scheduled_posts;

pub use revoked_tokens::start_revoked_token_purger;
pub use scheduled_posts::{run_due_jobs, start_scheduled_post_worker, RunSummary};

//! Cron-driven background jobs: order emails and token cleanup.

pub mod executor;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod tasks;
pub mod types;

pub use executor::{ConcurrencyTracker, JobExecutor};
pub use models::ScheduledJob;
pub use registry::JobRegistry;
pub use scheduler::JobScheduler;
pub use types::{JobContext, JobStatus, JobTask};

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};
use crate::jobs::tasks::{OrderEmailsTask, TokenCleanupTask};
use crate::jobs::types::JobTask;

type TaskFactory = Box<dyn Fn(JsonValue) -> AppResult<Box<dyn JobTask>> + Send + Sync>;

/// Registry for mapping job types to task implementations
#[derive(Default)]
pub struct JobRegistry {
    factories: HashMap<String, TaskFactory>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in task.
    pub fn with_default_tasks() -> Self {
        let mut registry = Self::new();
        registry
            .register::<OrderEmailsTask>()
            .register::<TokenCleanupTask>();
        registry
    }

    /// Register a task type with the registry
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: JobTask + DeserializeOwned + 'static,
    {
        let factory: TaskFactory = Box::new(|payload: JsonValue| {
            let task: T = serde_json::from_value(payload).map_err(|e| AppError::Validation {
                field: format!("jobs.{}", T::task_type()),
                reason: format!("Invalid task payload: {e}"),
            })?;
            Ok(Box::new(task) as Box<dyn JobTask>)
        });

        self.factories.insert(T::task_type().to_string(), factory);
        self
    }

    /// Create a task instance from job type and payload
    pub fn create_task(&self, job_type: &str, payload: JsonValue) -> AppResult<Box<dyn JobTask>> {
        let factory = self
            .factories
            .get(job_type)
            .ok_or_else(|| AppError::not_found("JobType", "type", job_type))?;

        factory(payload)
    }
}

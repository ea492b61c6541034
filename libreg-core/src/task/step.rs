use std::ops::Deref;

use crate::task::{ErrorCode, TaskException};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TaskStepResolution {
    Succeeded {
        message: String,
    },
    Failed {
        message: String,
        #[serde(rename = "errorCode")]
        error_code: ErrorCode,
        #[serde(skip_serializing_if = "Option::is_none")]
        exception: Option<TaskException>,
    },
}

impl TaskStepResolution {
    pub fn message(&self) -> &str {
        match self {
            TaskStepResolution::Succeeded { message } => message,
            TaskStepResolution::Failed { message, .. } => message,
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            TaskStepResolution::Succeeded { .. } => None,
            TaskStepResolution::Failed { error_code, .. } => Some(*error_code),
        }
    }

    pub fn exception(&self) -> Option<&TaskException> {
        match self {
            TaskStepResolution::Succeeded { .. } => None,
            TaskStepResolution::Failed { exception, .. } => exception.as_ref(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TaskStepResolution::Failed { .. })
    }
}

/// One entry of an execution log.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TaskStep {
    pub description: String,
    pub resolution: TaskStepResolution,
}

impl TaskStep {
    pub fn new(description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            resolution: TaskStepResolution::Succeeded {
                message: description.clone(),
            },
            description,
        }
    }

    pub fn message(&self) -> &str {
        self.resolution.message()
    }
}

/// A log of steps that always holds at least one entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct StepLog(Vec<TaskStep>);

impl StepLog {
    /// Returns `None` for an empty list.
    pub fn new(steps: Vec<TaskStep>) -> Option<Self> {
        if steps.is_empty() {
            None
        } else {
            Some(Self(steps))
        }
    }

    pub fn last(&self) -> &TaskStep {
        &self.0[self.0.len() - 1]
    }

    pub fn as_slice(&self) -> &[TaskStep] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<TaskStep> {
        self.0
    }

    pub(crate) fn append(&mut self, other: StepLog) {
        self.0.extend(other.0);
    }
}

impl Deref for StepLog {
    type Target = [TaskStep];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a StepLog {
    type Item = &'a TaskStep;
    type IntoIter = std::slice::Iter<'a, TaskStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

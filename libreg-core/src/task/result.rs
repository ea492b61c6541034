use std::collections::BTreeMap;

use crate::task::{ErrorCode, StepLog, TaskStep};

/// Free-form diagnostic key/value pairs collected while a task runs.
pub type Attributes = BTreeMap<String, String>;

/// Terminal outcome of a recorded operation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum TaskResult<A> {
    Success {
        result: A,
        steps: StepLog,
        attributes: Attributes,
    },
    Failure {
        steps: StepLog,
        attributes: Attributes,
    },
}

impl<A> TaskResult<A> {
    pub fn steps(&self) -> &StepLog {
        match self {
            TaskResult::Success { steps, .. } | TaskResult::Failure { steps, .. } => steps,
        }
    }

    pub fn attributes(&self) -> &Attributes {
        match self {
            TaskResult::Success { attributes, .. } | TaskResult::Failure { attributes, .. } => {
                attributes
            }
        }
    }

    /// Message of the last recorded step.
    pub fn message(&self) -> &str {
        self.steps().last().message()
    }

    /// Error code of the most recent failed step, if any step failed.
    pub fn last_error_code(&self) -> Option<ErrorCode> {
        self.steps()
            .iter()
            .rev()
            .find_map(|step| step.resolution.error_code())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskResult::Success { .. })
    }

    pub fn result(&self) -> Option<&A> {
        match self {
            TaskResult::Success { result, .. } => Some(result),
            TaskResult::Failure { .. } => None,
        }
    }

    pub fn into_steps(self) -> Vec<TaskStep> {
        match self {
            TaskResult::Success { steps, .. } | TaskResult::Failure { steps, .. } => {
                steps.into_vec()
            }
        }
    }

    pub fn map<B, F>(self, f: F) -> TaskResult<B>
    where
        F: FnOnce(A) -> B,
    {
        match self {
            TaskResult::Success {
                result,
                steps,
                attributes,
            } => TaskResult::Success {
                result: f(result),
                steps,
                attributes,
            },
            TaskResult::Failure { steps, attributes } => TaskResult::Failure { steps, attributes },
        }
    }

    /// Runs a dependent operation on success and joins both logs into one.
    ///
    /// Attributes recorded earlier in the chain win over later duplicates.
    pub fn flat_map<B, F>(self, f: F) -> TaskResult<B>
    where
        F: FnOnce(A) -> TaskResult<B>,
    {
        match self {
            TaskResult::Failure { steps, attributes } => TaskResult::Failure { steps, attributes },
            TaskResult::Success {
                result,
                mut steps,
                mut attributes,
            } => match f(result) {
                TaskResult::Success {
                    result: next,
                    steps: next_steps,
                    attributes: next_attributes,
                } => {
                    steps.append(next_steps);
                    merge_first_wins(&mut attributes, next_attributes);
                    TaskResult::Success {
                        result: next,
                        steps,
                        attributes,
                    }
                }
                TaskResult::Failure {
                    steps: next_steps,
                    attributes: next_attributes,
                } => {
                    steps.append(next_steps);
                    merge_first_wins(&mut attributes, next_attributes);
                    TaskResult::Failure { steps, attributes }
                }
            },
        }
    }
}

fn merge_first_wins(into: &mut Attributes, from: Attributes) {
    for (k, v) in from {
        into.entry(k).or_insert(v);
    }
}

use tracing::warn;

use crate::task::{
    Attributes, ErrorCode, StepLog, TaskException, TaskResult, TaskStep, TaskStepResolution,
};

/// Builds the step log of one multi-step operation.
///
/// A recorder is owned by exactly one operation and consumed when the operation finishes.
/// Calling any `current_step_*` method or finishing before a step was begun is a programming
/// error and panics.
#[derive(Debug, Default)]
pub struct TaskRecorder {
    steps: Vec<TaskStep>,
    attributes: Attributes,
}

impl TaskRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[TaskStep] {
        &self.steps
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn current_step(&self) -> Option<&TaskStep> {
        self.steps.last()
    }

    pub fn begin_new_step(&mut self, message: impl Into<String>) -> &TaskStep {
        self.steps.push(TaskStep::new(message));
        self.current_mut()
    }

    pub fn current_step_succeeded(&mut self, message: impl Into<String>) -> &TaskStep {
        let step = self.current_mut();
        step.resolution = TaskStepResolution::Succeeded {
            message: message.into(),
        };
        step
    }

    pub fn current_step_failed(
        &mut self,
        message: impl Into<String>,
        error_code: ErrorCode,
        exception: Option<TaskException>,
    ) -> &TaskStep {
        let step = self.current_mut();
        step.resolution = TaskStepResolution::Failed {
            message: message.into(),
            error_code,
            exception,
        };
        step
    }

    /// Marks the current step failed without losing an exception it already carries.
    pub fn current_step_failed_appending(
        &mut self,
        message: impl Into<String>,
        error_code: ErrorCode,
        exception: TaskException,
    ) -> &TaskStep {
        let message = message.into();
        let step = self.current_mut();
        if let TaskStepResolution::Failed { exception: slot, .. } = &mut step.resolution {
            match slot {
                Some(existing) => existing.add_suppressed(exception),
                None => *slot = Some(exception),
            }
        } else {
            step.resolution = TaskStepResolution::Failed {
                message,
                error_code,
                exception: Some(exception),
            };
        }
        step
    }

    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.get(&name) {
            Some(existing) => {
                if existing != &value {
                    warn!(
                        attribute = %name,
                        kept = %existing,
                        discarded = %value,
                        "attribute already recorded; keeping the first value"
                    );
                }
            }
            None => {
                self.attributes.insert(name, value);
            }
        }
    }

    pub fn add_attributes<I, K, V>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in attributes {
            self.add_attribute(k, v);
        }
    }

    /// Splices in a log produced by a nested operation.
    pub fn add_all<I>(&mut self, steps: I)
    where
        I: IntoIterator<Item = TaskStep>,
    {
        self.steps.extend(steps);
    }

    pub fn finish_success<A>(self, result: A) -> TaskResult<A> {
        let (steps, attributes) = self.into_parts();
        TaskResult::Success {
            result,
            steps,
            attributes,
        }
    }

    pub fn finish_failure<A>(self) -> TaskResult<A> {
        let (steps, attributes) = self.into_parts();
        TaskResult::Failure { steps, attributes }
    }

    fn into_parts(self) -> (StepLog, Attributes) {
        match StepLog::new(self.steps) {
            Some(steps) => (steps, self.attributes),
            None => panic!("a task cannot finish before at least one step has been recorded"),
        }
    }

    fn current_mut(&mut self) -> &mut TaskStep {
        match self.steps.last_mut() {
            Some(step) => step,
            None => panic!("no step has been started on this recorder"),
        }
    }
}

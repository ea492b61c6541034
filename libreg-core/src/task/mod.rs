mod error_code;
mod exception;
mod recorder;
mod result;
mod step;

pub use error_code::ErrorCode;
pub use exception::{PanicError, TaskException};
pub use recorder::TaskRecorder;
pub use result::{Attributes, TaskResult};
pub use step::{StepLog, TaskStep, TaskStepResolution};

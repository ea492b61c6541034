#![forbid(unsafe_code)]

//! Recorded-task framework and the library provider data model.
//!
//! Resolution logic, sources and the registry live in `libreg-resolve`.

pub mod error;
pub mod parser;
pub mod task;
pub mod types;

pub use crate::error::ParseError;
pub use crate::parser::{parse_descriptions_str, DocumentFormat, ParsedDescriptions};
pub use crate::task::{
    Attributes, ErrorCode, PanicError, StepLog, TaskException, TaskRecorder, TaskResult,
    TaskStep, TaskStepResolution,
};
pub use crate::types::{
    AccountProvider, AccountProviderAuthentication, AccountProviderDescription,
    BasicAuthentication, KeyboardInput, Link, Timestamped,
};

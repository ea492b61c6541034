use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// An error attached to a failed step.
///
/// Cloning shares the underlying error. Further errors raised while the same step was already
/// failing are kept as suppressed companions instead of replacing the primary one.
#[derive(Clone)]
pub struct TaskException {
    error: SharedError,
    suppressed: Vec<SharedError>,
}

impl TaskException {
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::from_arc(Arc::new(error))
    }

    pub fn from_arc(error: SharedError) -> Self {
        Self {
            error,
            suppressed: Vec::new(),
        }
    }

    /// Converts the payload of a caught panic.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::new(PanicError::from_payload(payload))
    }

    pub fn error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.error.as_ref()
    }

    pub fn suppressed(&self) -> impl Iterator<Item = &(dyn Error + Send + Sync + 'static)> {
        self.suppressed.iter().map(|e| e.as_ref())
    }

    pub fn suppressed_count(&self) -> usize {
        self.suppressed.len()
    }

    /// True when both values wrap the same error allocation.
    pub fn is_same(&self, other: &TaskException) -> bool {
        Arc::ptr_eq(&self.error, &other.error)
    }

    pub fn add_suppressed(&mut self, other: TaskException) {
        if self.is_same(&other) || self.suppressed.iter().any(|s| Arc::ptr_eq(s, &other.error)) {
            return;
        }
        self.suppressed.push(other.error);
        self.suppressed.extend(other.suppressed);
    }
}

impl fmt::Debug for TaskException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskException")
            .field("error", &self.error.to_string())
            .field(
                "suppressed",
                &self.suppressed.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for TaskException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if !self.suppressed.is_empty() {
            write!(f, " (+{} suppressed)", self.suppressed.len())?;
        }
        Ok(())
    }
}

impl PartialEq for TaskException {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other)
            && self.suppressed.len() == other.suppressed.len()
            && self
                .suppressed
                .iter()
                .zip(other.suppressed.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

impl serde::Serialize for TaskException {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let suppressed: Vec<String> = self.suppressed.iter().map(|e| e.to_string()).collect();
        let mut s = serializer.serialize_struct("TaskException", 2)?;
        s.serialize_field("message", &self.error.to_string())?;
        s.serialize_field("suppressed", &suppressed)?;
        s.end()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("panic: {message}")]
pub struct PanicError {
    pub message: String,
}

impl PanicError {
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self { message }
    }
}

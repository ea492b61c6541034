use std::sync::Arc;

use url::Url;

use crate::source::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryStatus {
    Idle,
    Refreshing,
}

impl RegistryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryStatus::Idle => "idle",
            RegistryStatus::Refreshing => "refreshing",
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            RegistryStatus::Idle => 0,
            RegistryStatus::Refreshing => 1,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => RegistryStatus::Refreshing,
            _ => RegistryStatus::Idle,
        }
    }
}

#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// A description or provider with this id was accepted into the registry.
    Updated { id: Url },
    SourceFailed {
        source: String,
        error: Arc<SourceError>,
    },
    StatusChanged { status: RegistryStatus },
}

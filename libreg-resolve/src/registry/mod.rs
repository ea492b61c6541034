//! The process-wide, merged view of provider descriptions and resolved providers.

mod events;
mod state;

pub use events::{RegistryEvent, RegistryStatus};

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use futures_util::FutureExt;
use libreg_core::{
    AccountProvider, AccountProviderDescription, ErrorCode, PanicError, TaskException,
    TaskRecorder, TaskResult,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::RegistryConfig;
use crate::resolver::RESOLVING_DESCRIPTION;
use crate::source::{AccountProviderSource, Progress, SearchQuery, SourceError, SourceResult};

use self::state::{LatestWinsMap, Merge};

/// Aggregates descriptions and resolved providers from an ordered list of sources.
///
/// All methods take `&self`; the registry is meant to be shared behind an `Arc` between
/// independent callers. Records are only ever replaced by strictly newer ones (by `updated`),
/// so concurrent writers converge on the same state regardless of arrival order.
pub struct AccountProviderRegistry {
    sources: Vec<Arc<dyn AccountProviderSource>>,
    default_provider: AccountProvider,
    descriptions: LatestWinsMap<AccountProviderDescription>,
    resolved: LatestWinsMap<AccountProvider>,
    status: AtomicU8,
    refreshed: AtomicBool,
    events: broadcast::Sender<RegistryEvent>,
}

#[derive(Clone, Copy)]
enum Collect<'a> {
    Load { include_testing: bool },
    Query(&'a SearchQuery),
}

/// Returns the registry to `Idle` however the refresh ends.
struct RefreshGuard<'a> {
    registry: &'a AccountProviderRegistry,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.registry.set_status(RegistryStatus::Idle);
    }
}

impl AccountProviderRegistry {
    pub fn new(
        default_provider: AccountProvider,
        sources: Vec<Arc<dyn AccountProviderSource>>,
        config: RegistryConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let registry = Self {
            sources,
            default_provider: default_provider.clone(),
            descriptions: LatestWinsMap::new(),
            resolved: LatestWinsMap::new(),
            status: AtomicU8::new(RegistryStatus::Idle.to_u8()),
            refreshed: AtomicBool::new(false),
            events,
        };
        registry.update_provider(default_provider);
        registry
    }

    /// Subscribes to future events; nothing published earlier is replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub fn status(&self) -> RegistryStatus {
        RegistryStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn default_provider(&self) -> &AccountProvider {
        &self.default_provider
    }

    pub fn sources(&self) -> &[Arc<dyn AccountProviderSource>] {
        &self.sources
    }

    /// Descriptions currently known, refreshing once first if that has never happened.
    pub async fn account_provider_descriptions(&self) -> BTreeMap<Url, AccountProviderDescription> {
        if !self.refreshed.load(Ordering::Acquire) {
            self.refresh(false).await;
        }
        self.descriptions_snapshot()
    }

    pub fn descriptions_snapshot(&self) -> BTreeMap<Url, AccountProviderDescription> {
        self.descriptions
            .snapshot()
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect()
    }

    pub fn find_description(&self, id: &Url) -> Option<AccountProviderDescription> {
        self.descriptions.get(id)
    }

    pub fn resolved_providers(&self) -> BTreeMap<Url, AccountProvider> {
        self.resolved
            .snapshot()
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect()
    }

    pub fn find_resolved(&self, id: &Url) -> Option<AccountProvider> {
        self.resolved.get(id)
    }

    /// Loads descriptions from every source. A failing source is reported and skipped.
    pub async fn refresh(&self, include_testing: bool) {
        self.collect(Collect::Load { include_testing }).await;
        self.refreshed.store(true, Ordering::Release);
    }

    /// Runs a search against every source and merges the matches.
    pub async fn query(&self, query: &SearchQuery) {
        self.collect(Collect::Query(query)).await;
    }

    /// Merges a description; returns whichever record the registry now holds for its id.
    pub fn update_description(
        &self,
        description: AccountProviderDescription,
    ) -> AccountProviderDescription {
        let merged = self.descriptions.merge(description, |accepted| {
            self.publish(RegistryEvent::Updated {
                id: accepted.id.clone(),
            })
        });
        match merged {
            Merge::Accepted(d) => {
                debug!(id = %d.id, updated = %d.updated, "description accepted");
                d
            }
            Merge::Kept(d) => {
                debug!(
                    id = %d.id,
                    updated = %d.updated,
                    "description kept; incoming one is not newer"
                );
                d
            }
        }
    }

    /// Merges a resolved provider and the description derived from it.
    pub fn update_provider(&self, provider: AccountProvider) -> AccountProvider {
        let merged = self.resolved.merge(provider, |accepted| {
            self.publish(RegistryEvent::Updated {
                id: accepted.id.clone(),
            })
        });
        let provider = match merged {
            Merge::Accepted(p) => {
                debug!(id = %p.id, updated = %p.updated, "provider accepted");
                p
            }
            Merge::Kept(p) => {
                debug!(
                    id = %p.id,
                    updated = %p.updated,
                    "provider kept; incoming one is not newer"
                );
                p
            }
        };
        self.update_description(provider.to_description());
        provider
    }

    /// Resolves a description with the first source that claims it.
    ///
    /// Sources are consulted in registration order; the first whose `can_resolve` returns true
    /// is used even if a later one would also accept the description.
    pub async fn resolve(
        &self,
        progress: Progress<'_>,
        description: &AccountProviderDescription,
    ) -> TaskResult<AccountProvider> {
        let id = &description.id;
        let mut recorder = TaskRecorder::new();
        progress(id, RESOLVING_DESCRIPTION);
        recorder.begin_new_step(RESOLVING_DESCRIPTION);

        let selected = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.sources.iter().find(|s| s.can_resolve(description))
        }));
        let selected = match selected {
            Ok(selected) => selected,
            Err(payload) => {
                let exception = TaskException::from_panic(payload);
                warn!(provider = %id, error = %exception, "source selection panicked");
                recorder.current_step_failed(
                    format!("Unexpected error while selecting a source: {exception}"),
                    ErrorCode::UnexpectedException,
                    Some(exception),
                );
                return recorder.finish_failure();
            }
        };
        let Some(source) = selected else {
            warn!(provider = %id, "no source can resolve description");
            recorder.current_step_failed(
                format!("No source is able to resolve {}", description.title),
                ErrorCode::NoApplicableSource,
                None,
            );
            return recorder.finish_failure();
        };
        recorder.current_step_succeeded(format!("Resolving with {}", source.name()));

        let outcome = AssertUnwindSafe(source.resolve(progress, description))
            .catch_unwind()
            .await;
        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                let exception = TaskException::from_panic(payload);
                warn!(
                    provider = %id,
                    source = source.name(),
                    error = %exception,
                    "source panicked during resolution"
                );
                recorder.current_step_failed(
                    format!("Unexpected error from {}: {exception}", source.name()),
                    ErrorCode::UnexpectedException,
                    Some(exception),
                );
                return recorder.finish_failure();
            }
        };

        recorder.add_attributes(result.attributes().clone());
        match result {
            TaskResult::Success {
                result: provider,
                steps,
                ..
            } => {
                recorder.add_all(steps.into_vec());
                self.update_provider(provider.clone());
                recorder.finish_success(provider)
            }
            TaskResult::Failure { steps, .. } => {
                recorder.add_all(steps.into_vec());
                recorder.finish_failure()
            }
        }
    }

    /// Empties both maps and asks every source to drop its caches.
    pub async fn clear(&self) {
        info!("clearing provider registry");
        self.descriptions.clear();
        self.resolved.clear();
        self.refreshed.store(false, Ordering::Release);
        for source in &self.sources {
            source.clear().await;
        }
    }

    async fn collect(&self, op: Collect<'_>) {
        self.set_status(RegistryStatus::Refreshing);
        let _guard = RefreshGuard { registry: self };

        for source in &self.sources {
            let call = async {
                match op {
                    Collect::Load { include_testing } => source.load(include_testing).await,
                    Collect::Query(query) => source.query(query).await,
                }
            };
            let outcome: SourceResult = match AssertUnwindSafe(call).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(SourceError::Panicked(PanicError::from_payload(payload))),
            };

            match outcome {
                Ok(descriptions) => {
                    debug!(
                        source = source.name(),
                        count = descriptions.len(),
                        "source returned descriptions"
                    );
                    for description in descriptions.into_values() {
                        self.update_description(description);
                    }
                }
                Err(error) => {
                    warn!(source = source.name(), error = %error, "source failed");
                    self.publish(RegistryEvent::SourceFailed {
                        source: source.name().to_string(),
                        error: Arc::new(error),
                    });
                }
            }
        }
    }

    fn set_status(&self, status: RegistryStatus) {
        self.status.store(status.to_u8(), Ordering::Release);
        self.publish(RegistryEvent::StatusChanged { status });
    }

    fn publish(&self, event: RegistryEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

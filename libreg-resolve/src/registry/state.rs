use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use libreg_core::Timestamped;
use url::Url;

pub(crate) enum Merge<T> {
    Accepted(T),
    /// The stored record is at least as recent as the incoming one.
    Kept(T),
}

/// Records keyed by id where the latest `updated` timestamp wins.
pub(crate) struct LatestWinsMap<T> {
    entries: RwLock<HashMap<Url, T>>,
}

impl<T> LatestWinsMap<T>
where
    T: Timestamped + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts `incoming` unless the stored record is not older; ties keep the stored record.
    ///
    /// `on_accept` runs while the write lock is held so observers see acceptances in order.
    pub(crate) fn merge(&self, incoming: T, on_accept: impl FnOnce(&T)) -> Merge<T> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(incoming.id()) {
            if existing.updated() >= incoming.updated() {
                return Merge::Kept(existing.clone());
            }
        }
        on_accept(&incoming);
        entries.insert(incoming.id().clone(), incoming.clone());
        Merge::Accepted(incoming)
    }

    pub(crate) fn get(&self, id: &Url) -> Option<T> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub(crate) fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

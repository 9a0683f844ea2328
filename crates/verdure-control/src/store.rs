// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The adaptive settings store.
//!
//! A single writer ([`SettingsStore`]) commits whole [`AdaptiveSettings`]
//! values; any number of [`SettingsReader`]s read the latest committed value
//! and subscribe to commits. Readers never observe a half-applied change:
//! each commit swaps one `Arc`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use verdure_core::{AdaptiveSettings, RawSettings};

type SettingsCallback = Arc<dyn Fn(&Arc<AdaptiveSettings>) + Send + Sync>;

struct SubscriberEntry {
    id: u64,
    callback: SettingsCallback,
}

struct Shared {
    current: RwLock<Arc<AdaptiveSettings>>,
    subscribers: Mutex<Vec<SubscriberEntry>>,
    next_subscriber_id: AtomicU64,
    revision: AtomicU64,
    disposed: AtomicBool,
}

impl Shared {
    fn get(&self) -> Arc<AdaptiveSettings> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<SubscriberEntry>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribe(self: &Arc<Self>, callback: SettingsCallback) -> Subscription {
        if self.disposed.load(Ordering::Acquire) {
            log::debug!("SettingsStore: subscription requested after dispose; ignoring.");
            return Subscription {
                shared: Weak::new(),
                id: 0,
            };
        }
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers().push(SubscriberEntry { id, callback });
        Subscription {
            shared: Arc::downgrade(self),
            id,
        }
    }
}

/// The single writer of the adaptive settings.
///
/// Dropping the store (or calling [`dispose`](Self::dispose)) releases every
/// subscriber. Readers keep returning the last committed value.
pub struct SettingsStore {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("current", &self.shared.get())
            .field("revision", &self.revision())
            .field("subscribers", &self.shared.subscribers().len())
            .finish()
    }
}

impl SettingsStore {
    /// Creates a store holding `initial` (clamped like any commit).
    pub fn create(initial: AdaptiveSettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                current: RwLock::new(Arc::new(initial.sanitized())),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber_id: AtomicU64::new(1),
                revision: AtomicU64::new(0),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// A read-only handle sharing this store.
    pub fn reader(&self) -> SettingsReader {
        SettingsReader {
            shared: Arc::clone(&self.shared),
        }
    }

    /// The latest committed value.
    pub fn get(&self) -> Arc<AdaptiveSettings> {
        self.shared.get()
    }

    /// Number of commits since creation.
    pub fn revision(&self) -> u64 {
        self.shared.revision.load(Ordering::Acquire)
    }

    /// Clamps `next`, publishes it and notifies subscribers in registration
    /// order. Returns the committed value.
    ///
    /// Callbacks run after the new value is visible and without any store
    /// lock held, so they may read the store.
    pub fn commit(&self, next: AdaptiveSettings) -> Arc<AdaptiveSettings> {
        let committed = Arc::new(next.sanitized());
        {
            let mut current = self
                .shared
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *current = Arc::clone(&committed);
        }
        let revision = self.shared.revision.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!(
            "SettingsStore: committed revision {revision} (tier {})",
            committed.complexity_tier
        );

        let callbacks: Vec<SettingsCallback> = self
            .shared
            .subscribers()
            .iter()
            .map(|entry| Arc::clone(&entry.callback))
            .collect();
        for callback in callbacks {
            callback(&committed);
        }
        committed
    }

    /// Commits an unvalidated value; the tier level is clamped into range.
    pub fn commit_raw(&self, raw: RawSettings) -> Arc<AdaptiveSettings> {
        self.commit(AdaptiveSettings::from(raw))
    }

    /// Registers `callback` for every future commit.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Arc<AdaptiveSettings>) + Send + Sync + 'static,
    {
        self.shared.subscribe(Arc::new(callback))
    }

    /// Releases every subscriber and the writer handle.
    pub fn dispose(self) {
        drop(self);
    }

    fn release_subscribers(&self) {
        self.shared.disposed.store(true, Ordering::Release);
        let released = std::mem::take(&mut *self.shared.subscribers()).len();
        log::info!("SettingsStore: disposed ({released} subscriber(s) released).");
    }
}

impl Drop for SettingsStore {
    fn drop(&mut self) {
        self.release_subscribers();
    }
}

/// A cloneable read-only view of a [`SettingsStore`].
#[derive(Clone)]
pub struct SettingsReader {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for SettingsReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsReader")
            .field("current", &self.shared.get())
            .finish()
    }
}

impl SettingsReader {
    /// The latest committed value.
    pub fn get(&self) -> Arc<AdaptiveSettings> {
        self.shared.get()
    }

    /// Number of commits so far.
    pub fn revision(&self) -> u64 {
        self.shared.revision.load(Ordering::Acquire)
    }

    /// Registers `callback` for every future commit.
    ///
    /// After the store is disposed this returns an inactive subscription.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Arc<AdaptiveSettings>) + Send + Sync + 'static,
    {
        self.shared.subscribe(Arc::new(callback))
    }
}

/// Handle to one settings subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    shared: Weak<Shared>,
    id: u64,
}

impl Subscription {
    /// Returns `true` while the callback is still registered.
    pub fn is_active(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.subscribers().iter().any(|entry| entry.id == self.id))
    }

    /// Removes the callback. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.subscribers().retain(|entry| entry.id != self.id);
        }
    }
}

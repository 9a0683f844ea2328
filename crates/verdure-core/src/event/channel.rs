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

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A broadcast channel: every subscriber receives every published event, in
/// publish order.
///
/// Each subscriber owns an unbounded `flume` receiver. Dropping the
/// [`EventSubscriber`] ends the subscription; the sender side is pruned on the
/// next publish. Publishing with zero subscribers is a no-op.
#[derive(Debug)]
pub struct EventChannel<T: Clone + Send + 'static> {
    subscribers: Mutex<Vec<flume::Sender<T>>>,
}

impl<T: Clone + Send + 'static> EventChannel<T> {
    /// Creates a channel with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn senders(&self) -> MutexGuard<'_, Vec<flume::Sender<T>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new subscriber. It only sees events published after this call.
    pub fn subscribe(&self) -> EventSubscriber<T> {
        let (sender, receiver) = flume::unbounded();
        let mut senders = self.senders();
        senders.push(sender);
        log::debug!("EventChannel: subscriber added ({} total).", senders.len());
        EventSubscriber { receiver }
    }

    /// Delivers `event` to every live subscriber and returns how many received it.
    pub fn publish(&self, event: T) -> usize {
        let mut senders = self.senders();
        senders.retain(|sender| sender.send(event.clone()).is_ok());
        log::trace!("EventChannel: event delivered to {} subscriber(s).", senders.len());
        senders.len()
    }

    /// Number of subscribers still connected as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        let mut senders = self.senders();
        senders.retain(|sender| !sender.is_disconnected());
        senders.len()
    }

    /// Disconnects every subscriber. Their receivers drain what is queued and
    /// then report the channel as closed.
    pub fn close(&self) {
        self.senders().clear();
    }
}

impl<T: Clone + Send + 'static> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The receiving end of one [`EventChannel`] subscription.
#[derive(Debug)]
pub struct EventSubscriber<T> {
    receiver: flume::Receiver<T>,
}

impl<T> EventSubscriber<T> {
    /// Returns the next queued event without blocking.
    pub fn try_recv(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Drains every queued event, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Number of events waiting.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` once the channel was closed and the queue is empty.
    pub fn is_closed(&self) -> bool {
        self.receiver.is_disconnected() && self.receiver.is_empty()
    }
}

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

//! A fixed-capacity FIFO window over the most recent samples.

/// A ring buffer holding at most `capacity` values.
///
/// Pushing into a full buffer overwrites the oldest value. The capacity is
/// chosen at runtime so windows can follow the controller configuration.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    index: usize,
    count: usize,
}

impl<T: Default + Copy> RingBuffer<T> {
    /// Creates a new, empty ring buffer.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be non-zero");
        Self {
            data: vec![T::default(); capacity],
            index: 0,
            count: 0,
        }
    }

    /// Pushes a new value into the buffer, overwriting the oldest if full.
    pub fn push(&mut self, value: T) {
        let capacity = self.data.len();
        self.data[self.index] = value;
        self.index = (self.index + 1) % capacity;
        if self.count < capacity {
            self.count += 1;
        }
    }

    /// Returns the number of elements currently in the buffer.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Maximum number of elements the buffer retains.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no value has been pushed since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns `true` once `capacity` values are held.
    pub fn is_full(&self) -> bool {
        self.count == self.data.len()
    }

    /// Drops every value.
    pub fn clear(&mut self) {
        self.index = 0;
        self.count = 0;
    }

    /// The most recently pushed value.
    pub fn latest(&self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let capacity = self.data.len();
        Some(self.data[(self.index + capacity - 1) % capacity])
    }

    /// Returns an iterator over the values in chronological order (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (left, right) = self.data.split_at(self.index);
        if self.count < self.data.len() {
            // Not full yet: the values are exactly `left`.
            right[..0].iter().chain(left.iter())
        } else {
            // Full: the oldest value sits at the write index.
            right.iter().chain(left.iter())
        }
    }
}

impl RingBuffer<f64> {
    /// Arithmetic mean of the values, or `0.0` if empty.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.iter().sum::<f64>() / self.count as f64
    }

    /// Population variance of the values, or `0.0` with fewer than two samples.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let avg = self.average();
        let sum_sq: f64 = self.iter().map(|v| (v - avg) * (v - avg)).sum();
        sum_sq / self.count as f64
    }

    /// Smallest value, or `None` if empty.
    pub fn min(&self) -> Option<f64> {
        self.iter().copied().reduce(f64::min)
    }

    /// Largest value, or `None` if empty.
    pub fn max(&self) -> Option<f64> {
        self.iter().copied().reduce(f64::max)
    }

    /// Returns `true` if the buffer is full and every value satisfies `predicate`.
    pub fn all_full_window(&self, predicate: impl Fn(f64) -> bool) -> bool {
        self.is_full() && self.iter().all(|v| predicate(*v))
    }
}

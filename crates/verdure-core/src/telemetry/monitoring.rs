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

//! Contracts for polling host resources.
//!
//! Exact device memory is often not queryable (browsers, sandboxed hosts).
//! A probe that cannot measure reports `None`; consumers must skip their
//! dependent checks rather than treat the value as zero.

use std::fmt::Debug;

/// A source of memory-usage readings.
pub trait MemoryProbe: Send + Sync + Debug {
    /// Human-readable identifier, used in logs.
    fn probe_name(&self) -> &str;

    /// Bytes currently in use, or `None` if unavailable right now.
    fn used_bytes(&self) -> Option<u64>;
}

/// A probe for hosts without memory introspection. Always reports `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableMemoryProbe;

impl MemoryProbe for UnavailableMemoryProbe {
    fn probe_name(&self) -> &str {
        "unavailable"
    }

    fn used_bytes(&self) -> Option<u64> {
        None
    }
}

/// A probe returning a fixed reading. Useful for hosts that push their own
/// numbers and for deterministic tests.
#[derive(Debug, Default)]
pub struct FixedMemoryProbe {
    bytes: std::sync::atomic::AtomicU64,
}

impl FixedMemoryProbe {
    /// Creates a probe that reports `bytes`.
    pub fn new(bytes: u64) -> Self {
        Self {
            bytes: std::sync::atomic::AtomicU64::new(bytes),
        }
    }

    /// Updates the reported value.
    pub fn set(&self, bytes: u64) {
        self.bytes
            .store(bytes, std::sync::atomic::Ordering::Relaxed);
    }
}

impl MemoryProbe for FixedMemoryProbe {
    fn probe_name(&self) -> &str {
        "fixed"
    }

    fn used_bytes(&self) -> Option<u64> {
        Some(self.bytes.load(std::sync::atomic::Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_probe_reports_none() {
        assert_eq!(UnavailableMemoryProbe.used_bytes(), None);
    }

    #[test]
    fn test_fixed_probe_reports_latest_value() {
        let probe = FixedMemoryProbe::new(10);
        assert_eq!(probe.used_bytes(), Some(10));
        probe.set(42);
        assert_eq!(probe.used_bytes(), Some(42));
    }
}

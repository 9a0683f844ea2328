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

//! Resource usage tracker: per-resource records, per-kind totals and eviction
//! of stale low-priority resources.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use verdure_core::telemetry::{OptimizationSuggestion, Severity, SuggestionCategory};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// Textures at or below this size are always kept resident.
pub const SMALL_TEXTURE_BYTES: u64 = 256 * KIB;
/// Resources at or below this size get [`ResourcePriority::High`].
pub const HIGH_PRIORITY_MAX_BYTES: u64 = MIB;
/// Resources at or below this size get [`ResourcePriority::Medium`].
pub const MEDIUM_PRIORITY_MAX_BYTES: u64 = 5 * MIB;

/// The category of a tracked resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Images sampled by materials.
    Texture,
    /// Vertex and index buffers.
    Geometry,
    /// Material parameter blocks.
    Material,
    /// Compiled shader programs.
    Shader,
    /// Audio buffers.
    Sound,
}

/// Eviction priority, assigned once when a resource is first tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourcePriority {
    /// Never evicted.
    Critical,
    /// Kept unless the host removes it.
    High,
    /// Kept unless the host removes it.
    Medium,
    /// Eligible for eviction once idle.
    Low,
}

impl ResourcePriority {
    /// Derives the priority from the kind and size of a resource.
    pub fn classify(kind: ResourceKind, size_bytes: u64) -> Self {
        match kind {
            ResourceKind::Shader => Self::Critical,
            ResourceKind::Texture if size_bytes <= SMALL_TEXTURE_BYTES => Self::Critical,
            ResourceKind::Geometry => Self::High,
            _ if size_bytes <= HIGH_PRIORITY_MAX_BYTES => Self::High,
            _ if size_bytes <= MEDIUM_PRIORITY_MAX_BYTES => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// Bookkeeping for one tracked resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Host identifier.
    pub id: String,
    /// Resource category.
    pub kind: ResourceKind,
    /// Declared size in bytes.
    pub size_bytes: u64,
    /// Timestamp of the most recent `track` call.
    pub last_used_at_ms: f64,
    /// Number of `track` calls, starting at 1.
    pub use_count: u32,
    /// Priority fixed at insertion.
    pub priority: ResourcePriority,
}

/// Bytes in use per resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTotals {
    /// Bytes of textures.
    pub texture: u64,
    /// Bytes of geometry.
    pub geometry: u64,
    /// Bytes of materials.
    pub material: u64,
    /// Bytes of shaders.
    pub shader: u64,
    /// Bytes of sounds.
    pub sound: u64,
}

impl ResourceTotals {
    /// Sum over every kind.
    pub fn total(&self) -> u64 {
        self.texture + self.geometry + self.material + self.shader + self.sound
    }

    fn add(&mut self, kind: ResourceKind, bytes: u64) {
        let slot = match kind {
            ResourceKind::Texture => &mut self.texture,
            ResourceKind::Geometry => &mut self.geometry,
            ResourceKind::Material => &mut self.material,
            ResourceKind::Shader => &mut self.shader,
            ResourceKind::Sound => &mut self.sound,
        };
        *slot = slot.saturating_add(bytes);
    }
}

/// Tracks the resources the host declares and which of them may be evicted.
#[derive(Debug, Clone)]
pub struct ResourceTracker {
    records: HashMap<String, ResourceRecord>,
    max_single_resource_bytes: u64,
}

impl ResourceTracker {
    /// Creates a tracker warning about resources larger than `max_single_resource_bytes`.
    pub fn new(max_single_resource_bytes: u64) -> Self {
        Self {
            records: HashMap::new(),
            max_single_resource_bytes,
        }
    }

    /// Records a use of resource `id`.
    ///
    /// A new id gets a record with a priority derived from `kind` and
    /// `size_bytes`. A known id gets its use count and timestamp bumped and
    /// its size refreshed; its priority does not change.
    ///
    /// Oversized resources are still tracked, and a memory warning is returned.
    pub fn track(
        &mut self,
        id: &str,
        kind: ResourceKind,
        size_bytes: u64,
        now_ms: f64,
    ) -> Option<OptimizationSuggestion> {
        match self.records.get_mut(id) {
            Some(record) => {
                record.use_count = record.use_count.saturating_add(1);
                record.last_used_at_ms = now_ms;
                record.size_bytes = size_bytes;
            }
            None => {
                let priority = ResourcePriority::classify(kind, size_bytes);
                log::trace!("ResourceTracker: tracking '{id}' ({kind:?}, {size_bytes} B, {priority:?})");
                self.records.insert(
                    id.to_owned(),
                    ResourceRecord {
                        id: id.to_owned(),
                        kind,
                        size_bytes,
                        last_used_at_ms: now_ms,
                        use_count: 1,
                        priority,
                    },
                );
            }
        }

        if size_bytes > self.max_single_resource_bytes {
            log::warn!(
                "ResourceTracker: '{id}' is {:.1} MiB, above the {:.1} MiB ceiling",
                size_bytes as f64 / MIB as f64,
                self.max_single_resource_bytes as f64 / MIB as f64
            );
            return Some(OptimizationSuggestion::new(
                SuggestionCategory::Memory,
                Severity::Warning,
                format!(
                    "Resource '{id}' uses {:.1} MiB; consider compressing or splitting it",
                    size_bytes as f64 / MIB as f64
                ),
            ));
        }
        None
    }

    /// Bytes in use per kind.
    pub fn totals_by_kind(&self) -> ResourceTotals {
        let mut totals = ResourceTotals::default();
        for record in self.records.values() {
            totals.add(record.kind, record.size_bytes);
        }
        totals
    }

    /// Removes every [`ResourcePriority::Low`] record idle for longer than
    /// `idle_threshold_ms`, and returns how many were removed.
    pub fn evict_stale(&mut self, now_ms: f64, idle_threshold_ms: f64) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| {
            record.priority != ResourcePriority::Low
                || now_ms - record.last_used_at_ms <= idle_threshold_ms
        });
        let evicted = before - self.records.len();
        if evicted > 0 {
            log::debug!("ResourceTracker: evicted {evicted} stale resource(s)");
        }
        evicted
    }

    /// The record for `id`, if tracked.
    pub fn get(&self, id: &str) -> Option<&ResourceRecord> {
        self.records.get(id)
    }

    /// Stops tracking `id`, returning its record.
    pub fn remove(&mut self, id: &str) -> Option<ResourceRecord> {
        self.records.remove(id)
    }

    /// Number of tracked resources.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record, sorted by id.
    pub fn records(&self) -> Vec<&ResourceRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ResourceTracker {
        ResourceTracker::new(100 * MIB)
    }

    #[test]
    fn test_priority_rules() {
        use ResourceKind::*;
        use ResourcePriority as P;

        assert_eq!(P::classify(Shader, 50 * MIB), P::Critical);
        assert_eq!(P::classify(Texture, 256 * KIB), P::Critical);
        assert_eq!(P::classify(Texture, 256 * KIB + 1), P::High);
        assert_eq!(P::classify(Geometry, 80 * MIB), P::High);
        assert_eq!(P::classify(Material, MIB), P::High);
        assert_eq!(P::classify(Sound, 3 * MIB), P::Medium);
        assert_eq!(P::classify(Texture, 5 * MIB), P::Medium);
        assert_eq!(P::classify(Texture, 5 * MIB + 1), P::Low);
        assert_eq!(P::classify(Sound, 20 * MIB), P::Low);
    }

    #[test]
    fn test_repeat_track_bumps_use_count_and_keeps_priority() {
        let mut tracker = tracker();
        assert!(tracker.track("bark", ResourceKind::Texture, 100 * KIB, 0.0).is_none());
        tracker.track("bark", ResourceKind::Texture, 8 * MIB, 500.0);

        let record = tracker.get("bark").expect("tracked");
        assert_eq!(record.use_count, 2);
        assert_eq!(record.last_used_at_ms, 500.0);
        assert_eq!(record.size_bytes, 8 * MIB);
        assert_eq!(record.priority, ResourcePriority::Critical);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_oversized_resource_is_tracked_with_warning() {
        let mut tracker = tracker();
        let suggestion = tracker
            .track("terrain", ResourceKind::Geometry, 150 * MIB, 0.0)
            .expect("oversize warning");
        assert_eq!(suggestion.category, SuggestionCategory::Memory);
        assert_eq!(suggestion.severity, Severity::Warning);
        assert!(tracker.get("terrain").is_some());
    }

    #[test]
    fn test_totals_by_kind() {
        let mut tracker = tracker();
        tracker.track("a", ResourceKind::Texture, 2 * MIB, 0.0);
        tracker.track("b", ResourceKind::Texture, 3 * MIB, 0.0);
        tracker.track("c", ResourceKind::Shader, 64 * KIB, 0.0);
        tracker.track("d", ResourceKind::Sound, MIB, 0.0);

        let totals = tracker.totals_by_kind();
        assert_eq!(totals.texture, 5 * MIB);
        assert_eq!(totals.shader, 64 * KIB);
        assert_eq!(totals.sound, MIB);
        assert_eq!(totals.geometry, 0);
        assert_eq!(totals.total(), 6 * MIB + 64 * KIB);
    }

    #[test]
    fn test_evict_stale_only_removes_idle_low_priority() {
        let mut tracker = tracker();
        tracker.track("skybox", ResourceKind::Texture, 12 * MIB, 0.0);
        tracker.track("ambience", ResourceKind::Sound, 8 * MIB, 100_000.0);
        tracker.track("leaf", ResourceKind::Texture, 128 * KIB, 0.0);
        tracker.track("trunk", ResourceKind::Geometry, 12 * MIB, 0.0);

        let evicted = tracker.evict_stale(120_000.0, 60_000.0);
        assert_eq!(evicted, 1);
        assert!(tracker.get("skybox").is_none());
        assert!(tracker.get("ambience").is_some());
        assert!(tracker.get("leaf").is_some());
        assert!(tracker.get("trunk").is_some());
    }

    #[test]
    fn test_evict_stale_removes_every_idle_low_and_keeps_critical() {
        let mut tracker = tracker();
        tracker.track("skybox", ResourceKind::Texture, 12 * MIB, 0.0);
        tracker.track("cliffs", ResourceKind::Texture, 9 * MIB, 0.0);
        tracker.track("rain-loop", ResourceKind::Sound, 20 * MIB, 0.0);
        tracker.track("foliage", ResourceKind::Shader, 64 * KIB, 0.0);

        assert_eq!(tracker.evict_stale(120_000.0, 60_000.0), 3);
        assert_eq!(tracker.len(), 1);
        let kept = tracker.get("foliage").expect("critical survives");
        assert_eq!(kept.priority, ResourcePriority::Critical);
    }

    #[test]
    fn test_use_count_saturates() {
        let mut tracker = tracker();
        tracker.track("moss", ResourceKind::Material, KIB, 0.0);
        tracker
            .records
            .get_mut("moss")
            .expect("tracked")
            .use_count = u32::MAX;
        tracker.track("moss", ResourceKind::Material, KIB, 10.0);
        assert_eq!(tracker.get("moss").expect("tracked").use_count, u32::MAX);
    }

    #[test]
    fn test_idle_exactly_at_threshold_is_kept() {
        let mut tracker = tracker();
        tracker.track("skybox", ResourceKind::Texture, 12 * MIB, 0.0);
        assert_eq!(tracker.evict_stale(60_000.0, 60_000.0), 0);
    }

    #[test]
    fn test_records_sorted_by_id() {
        let mut tracker = tracker();
        tracker.track("moss", ResourceKind::Material, KIB, 0.0);
        tracker.track("fern", ResourceKind::Material, KIB, 0.0);
        let ids: Vec<_> = tracker.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["fern", "moss"]);
        assert!(tracker.remove("fern").is_some());
        assert_eq!(tracker.len(), 1);
    }
}

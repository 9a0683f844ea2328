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

//! Ordered per-frame update callbacks.

use verdure_core::AdaptiveSettings;

/// What every update callback sees for the current frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Frame counter, starting at 1.
    pub frame: u64,
    /// Timestamp of the frame.
    pub now_ms: f64,
    /// Time since the previous frame (`0.0` on the first frame).
    pub delta_ms: f64,
    /// Settings committed for this frame.
    pub settings: &'a AdaptiveSettings,
}

type UpdateFn = Box<dyn FnMut(&FrameContext<'_>) + Send>;

struct UpdateEntry {
    name: String,
    priority: f32,
    update: UpdateFn,
}

/// Registry of per-frame updates, run in priority order (highest first).
/// Updates with equal priority run in registration order.
#[derive(Default)]
pub struct UpdateRegistry {
    entries: Vec<UpdateEntry>,
}

impl std::fmt::Debug for UpdateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl UpdateRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `update` under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, priority: f32, update: F)
    where
        F: FnMut(&FrameContext<'_>) + Send + 'static,
    {
        let name = name.into();
        log::info!("UpdateRegistry: registered '{name}' (priority={priority:.2})");
        self.entries.push(UpdateEntry {
            name,
            priority,
            update: Box::new(update),
        });
        // `sort_by` is stable, so ties keep registration order.
        self.entries.sort_by(|a, b| {
            b.priority
                .partial_cmp(&a.priority)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Removes every update registered under `name`. Returns `true` if one existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.name != name);
        before != self.entries.len()
    }

    /// Returns the number of registered updates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no updates are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Runs every update in order.
    pub fn run_all(&mut self, context: &FrameContext<'_>) {
        for entry in &mut self.entries {
            (entry.update)(context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn context(settings: &AdaptiveSettings) -> FrameContext<'_> {
        FrameContext {
            frame: 1,
            now_ms: 16.0,
            delta_ms: 16.0,
            settings,
        }
    }

    #[test]
    fn test_updates_run_by_priority_then_registration() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut registry = UpdateRegistry::new();
        for (name, priority) in [("wind", 1.0), ("particles", 5.0), ("water", 1.0), ("camera", 10.0)] {
            let order = Arc::clone(&order);
            registry.register(name, priority, move |_| order.lock().unwrap().push(name));
        }

        let settings = AdaptiveSettings::default();
        registry.run_all(&context(&settings));

        assert_eq!(
            *order.lock().unwrap(),
            vec!["camera", "particles", "wind", "water"]
        );
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["camera", "particles", "wind", "water"]
        );
    }

    #[test]
    fn test_updates_see_frame_context() {
        let seen = Arc::new(Mutex::new(None));
        let mut registry = UpdateRegistry::new();
        let sink = Arc::clone(&seen);
        registry.register("probe", 0.0, move |ctx| {
            *sink.lock().unwrap() = Some((ctx.frame, ctx.settings.particles_enabled));
        });

        let settings = AdaptiveSettings::default();
        registry.run_all(&context(&settings));
        assert_eq!(*seen.lock().unwrap(), Some((1, true)));
    }

    #[test]
    fn test_unregister() {
        let mut registry = UpdateRegistry::new();
        registry.register("wind", 0.0, |_| {});
        assert!(registry.unregister("wind"));
        assert!(!registry.unregister("wind"));
        assert!(registry.is_empty());
    }
}

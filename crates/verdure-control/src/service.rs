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

//! The per-frame driver.
//!
//! [`FrameLoop::on_frame`] runs the pipeline in a fixed order:
//!
//! 1. the frame timer records the frame;
//! 2. the monitor evaluates, using only data from previous frames;
//! 3. the visibility filter culls the scene against the camera;
//! 4. LOD levels are assigned with the tier committed in step 2;
//! 5. registered updates run with the committed settings.
//!
//! Stopping the controller is dropping the `FrameLoop`.

use crate::config::{ConfigError, ControllerConfig};
use crate::monitor::{BudgetState, PerformanceMonitor};
use crate::registry::{FrameContext, UpdateRegistry};
use serde::Serialize;
use std::sync::Arc;
use verdure_core::platform::DeviceCapabilities;
use verdure_core::scene::{CameraState, SceneObjectRef};
use verdure_core::telemetry::{
    MemoryProbe, OptimizationSuggestion, PerformanceSnapshot, RenderStats,
};
use verdure_core::AdaptiveSettings;
use verdure_lanes::scene_lane::{CullingLane, CullingStats, LodAssignment, LodTable};
use verdure_telemetry::{ResourceKind, ResourceTotals};

/// Result of one [`FrameLoop::on_frame`] call.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Frame counter, starting at 1.
    pub frame: u64,
    /// LOD assignment of every visible object, in input order.
    pub assignments: Vec<LodAssignment>,
    /// Number of objects rejected by the visibility filter.
    pub culled: usize,
    /// The settings the frame was prepared with.
    pub settings: Arc<AdaptiveSettings>,
    /// Set when an evaluation ran on this frame.
    pub budget_state: Option<BudgetState>,
}

/// Serializable state of the controller for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsSnapshot {
    /// Frames recorded so far.
    pub frame: u64,
    /// Live FPS estimate.
    pub current_fps: f64,
    /// Snapshot of the last evaluation.
    pub performance: PerformanceSnapshot,
    /// Committed settings.
    pub settings: AdaptiveSettings,
    /// Outcome of the last tier decision.
    pub budget_state: BudgetState,
    /// Tracked bytes per resource kind.
    pub resource_totals: ResourceTotals,
    /// Number of tracked resources.
    pub resource_count: usize,
    /// Last culling pass.
    pub culling: CullingStats,
    /// Recent suggestions, oldest first.
    pub recent_suggestions: Vec<OptimizationSuggestion>,
}

/// Drives the controller once per frame.
#[derive(Debug)]
pub struct FrameLoop {
    monitor: PerformanceMonitor,
    culling: CullingLane,
    lod_table: LodTable,
    updates: UpdateRegistry,
    last_now_ms: Option<f64>,
}

impl FrameLoop {
    /// Validates `config` and builds a loop with the default LOD table.
    pub fn new(config: ControllerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            culling: CullingLane::new(config.culling_margin),
            monitor: PerformanceMonitor::new(config),
            lod_table: LodTable::default(),
            updates: UpdateRegistry::new(),
            last_now_ms: None,
        })
    }

    /// Replaces the LOD table.
    pub fn with_lod_table(mut self, table: LodTable) -> Self {
        self.lod_table = table;
        self
    }

    /// Installs a memory probe.
    pub fn with_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.monitor.set_memory_probe(probe);
        self
    }

    /// Applies device hints.
    pub fn set_device_capabilities(&mut self, capabilities: DeviceCapabilities) {
        self.monitor.set_device_capabilities(capabilities);
    }

    /// Registers a per-frame update (higher priority runs first).
    pub fn register_update<F>(&mut self, name: impl Into<String>, priority: f32, update: F)
    where
        F: FnMut(&FrameContext<'_>) + Send + 'static,
    {
        self.updates.register(name, priority, update);
    }

    /// Prepares one frame.
    ///
    /// # Panics
    ///
    /// Panics if `now_ms` is not finite or is earlier than the previous frame.
    pub fn on_frame(
        &mut self,
        now_ms: f64,
        camera: &CameraState,
        objects: &[SceneObjectRef],
    ) -> FrameOutput {
        self.monitor.record_frame(now_ms);
        let budget_state = self.monitor.evaluate(now_ms);

        let settings = self.monitor.settings();
        let visible = self.culling.run(camera, objects);
        let assignments =
            self.lod_table
                .assign_lod(&visible, camera.position, settings.complexity_tier);

        let frame = self.monitor.frame_count();
        let delta_ms = self.last_now_ms.map_or(0.0, |last| now_ms - last);
        self.last_now_ms = Some(now_ms);
        self.updates.run_all(&FrameContext {
            frame,
            now_ms,
            delta_ms,
            settings: settings.as_ref(),
        });

        log::trace!(
            "FrameLoop: frame {frame} drew {} object(s) at tier {}",
            assignments.len(),
            settings.complexity_tier
        );
        FrameOutput {
            frame,
            assignments,
            culled: self.culling.last_stats().culled(),
            settings,
            budget_state,
        }
    }

    /// Records the render statistics of the previous frame.
    pub fn record_render(&mut self, stats: RenderStats) {
        self.monitor.record_render(stats);
    }

    /// Declares a use of a resource at the latest frame's timestamp.
    pub fn track_resource(
        &mut self,
        id: &str,
        kind: ResourceKind,
        size_bytes: u64,
    ) -> Option<OptimizationSuggestion> {
        let now_ms = self.last_now_ms.unwrap_or(0.0);
        self.monitor.track_resource(id, kind, size_bytes, now_ms)
    }

    /// The controller.
    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// Mutable access to the controller, for overrides and actions.
    pub fn monitor_mut(&mut self) -> &mut PerformanceMonitor {
        &mut self.monitor
    }

    /// Captures the current diagnostics.
    pub fn export_snapshot(&self) -> DiagnosticsSnapshot {
        let resources = self.monitor.resources();
        DiagnosticsSnapshot {
            frame: self.monitor.frame_count(),
            current_fps: self.monitor.current_fps(),
            performance: *self.monitor.snapshot(),
            settings: (*self.monitor.settings()).clone(),
            budget_state: self.monitor.budget_state(),
            resource_totals: resources.totals_by_kind(),
            resource_count: resources.len(),
            culling: self.culling.last_stats(),
            recent_suggestions: self.monitor.recent_suggestions().cloned().collect(),
        }
    }

    /// The diagnostics as a JSON object with camelCase keys.
    ///
    /// Every value is a scalar except `recentSuggestions`, a list of
    /// `{ category, severity, message }` objects, oldest first.
    pub fn export_json(&self) -> serde_json::Value {
        let snapshot = self.export_snapshot();
        let settings = &snapshot.settings;
        let performance = &snapshot.performance;
        let totals = &snapshot.resource_totals;
        let suggestions: Vec<_> = snapshot
            .recent_suggestions
            .iter()
            .map(|s| {
                serde_json::json!({
                    "category": format!("{:?}", s.category),
                    "severity": format!("{:?}", s.severity),
                    "message": s.message,
                })
            })
            .collect();
        serde_json::json!({
            "frame": snapshot.frame,
            "fps": snapshot.current_fps,
            "evaluatedFps": performance.fps,
            "avgFrameTimeMs": performance.avg_frame_time_ms,
            "avgRenderTimeMs": performance.avg_render_time_ms,
            "memoryUsedBytes": performance.memory_used_bytes,
            "drawCalls": performance.draw_calls,
            "triangleCount": performance.triangle_count,
            "budgetState": format!("{:?}", snapshot.budget_state),
            "complexityTier": settings.complexity_tier.level(),
            "particlesEnabled": settings.particles_enabled,
            "shadowsEnabled": settings.shadows_enabled,
            "antialiasing": settings.antialiasing,
            "postProcessing": settings.post_processing,
            "renderScale": settings.render_scale,
            "maxParticleCount": settings.max_particle_count,
            "lodDistance": settings.lod_distance,
            "resourceCount": snapshot.resource_count,
            "resourceBytes": totals.total(),
            "textureBytes": totals.texture,
            "geometryBytes": totals.geometry,
            "materialBytes": totals.material,
            "shaderBytes": totals.shader,
            "soundBytes": totals.sound,
            "visibleObjects": snapshot.culling.visible,
            "culledObjects": snapshot.culling.culled(),
            "suggestionCount": suggestions.len(),
            "recentSuggestions": suggestions,
        })
    }
}

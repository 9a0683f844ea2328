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

//! The performance monitor: the adaptive controller proper.
//!
//! Every `evaluation_interval` frames the monitor builds a fresh
//! [`PerformanceSnapshot`], pushes the period FPS into a history of
//! `history_window` periods, and runs the tier state machine. The period FPS
//! only counts frames recorded since the previous evaluation, so one period
//! never leaks into the next.
//!
//!
//! - **OverBudget**: every period in a full history is below
//!   `low_fps_threshold`. The tier drops one step, shadows and
//!   post-processing are switched off, particles survive only at High or
//!   above, and the particle budget is halved. At the lowest tier a critical
//!   suggestion is published instead.
//! - **UnderBudget**: every period in a full history is above
//!   `high_fps_threshold` and the device allows a higher tier. The tier rises
//!   one step and the render scale grows by `render_scale_step`.
//! - **AtBudget**: anything else. Nothing is committed.
//!
//! The history is cleared after each transition, so a further move needs a
//! whole new window of evidence.

use crate::analysis::{AnalysisInput, BudgetAnalyzer};
use crate::config::ControllerConfig;
use crate::store::{SettingsReader, SettingsStore, Subscription};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use verdure_core::event::{EventChannel, EventSubscriber};
use verdure_core::platform::DeviceCapabilities;
use verdure_core::settings::MAX_RENDER_SCALE;
use verdure_core::telemetry::{
    MemoryProbe, OptimizationSuggestion, PerformanceSnapshot, RenderStats, Severity,
    SuggestedAction, SuggestionCategory,
};
use verdure_core::{AdaptiveSettings, ComplexityTier};
use verdure_telemetry::{FrameTimer, ResourceKind, ResourceTracker, RingBuffer};

/// Outcome of the last tier decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum BudgetState {
    /// Sustained headroom; the tier was raised.
    UnderBudget,
    /// No sustained trend either way.
    #[default]
    AtBudget,
    /// Sustained low frame rate; the tier was lowered (or is already at the floor).
    OverBudget,
}

/// Watches frame timings and budgets and adapts the committed settings.
pub struct PerformanceMonitor {
    config: ControllerConfig,
    store: SettingsStore,
    frame_timer: FrameTimer,
    period_duration_ms: f64,
    period_frames: u32,
    render_times: RingBuffer<f64>,
    draw_calls: RingBuffer<f64>,
    last_render: RenderStats,
    fps_history: RingBuffer<f64>,
    resources: ResourceTracker,
    analyzer: BudgetAnalyzer,
    suggestions: EventChannel<OptimizationSuggestion>,
    recent_suggestions: VecDeque<OptimizationSuggestion>,
    memory_probe: Option<Arc<dyn MemoryProbe>>,
    device: Option<DeviceCapabilities>,
    snapshot: PerformanceSnapshot,
    budget_state: BudgetState,
    floor_alert_latched: bool,
    frame_count: u64,
    last_evaluated_frame: u64,
    last_now_ms: f64,
}

impl std::fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("frame_count", &self.frame_count)
            .field("tier", &self.store.get().complexity_tier)
            .field("budget_state", &self.budget_state)
            .field("snapshot", &self.snapshot)
            .field("memory_probe", &self.memory_probe)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl PerformanceMonitor {
    /// Creates a monitor starting at the preset of `config.initial_tier`.
    ///
    /// The configuration is assumed valid (see [`ControllerConfig::validate`]).
    pub fn new(config: ControllerConfig) -> Self {
        let store = SettingsStore::create(AdaptiveSettings::for_tier(config.initial_tier));
        let analyzer = BudgetAnalyzer::new(
            config.budgets.clone(),
            config.evaluation_interval as usize,
        );
        log::info!(
            "PerformanceMonitor: starting at tier {} (evaluation every {} frames, window {})",
            config.initial_tier,
            config.evaluation_interval,
            config.history_window
        );
        Self {
            frame_timer: FrameTimer::new(config.frame_window, config.max_frame_delta_ms),
            period_duration_ms: 0.0,
            period_frames: 0,
            render_times: RingBuffer::new(config.frame_window),
            draw_calls: RingBuffer::new(config.frame_window),
            last_render: RenderStats::default(),
            fps_history: RingBuffer::new(config.history_window),
            resources: ResourceTracker::new(config.resources.max_single_resource_bytes),
            recent_suggestions: VecDeque::with_capacity(config.suggestion_history),
            analyzer,
            store,
            config,
            suggestions: EventChannel::new(),
            memory_probe: None,
            device: None,
            snapshot: PerformanceSnapshot::default(),
            budget_state: BudgetState::AtBudget,
            floor_alert_latched: false,
            frame_count: 0,
            last_evaluated_frame: 0,
            last_now_ms: 0.0,
        }
    }

    /// Installs the memory probe used for the memory budget and leak checks.
    pub fn set_memory_probe(&mut self, probe: Arc<dyn MemoryProbe>) {
        log::debug!("PerformanceMonitor: using memory probe '{}'", probe.probe_name());
        self.memory_probe = Some(probe);
    }

    /// Applies device hints. They cap future tier increases and may produce a
    /// one-off network suggestion; they never lower the current tier.
    pub fn set_device_capabilities(&mut self, capabilities: DeviceCapabilities) {
        log::info!(
            "PerformanceMonitor: device ceiling is tier {}",
            capabilities.max_tier()
        );
        if capabilities.has_slow_connection() {
            self.emit(OptimizationSuggestion::new(
                SuggestionCategory::Network,
                Severity::Info,
                format!(
                    "Slow '{}' connection detected; defer streaming of optional assets",
                    capabilities.connection_type
                ),
            ));
        }
        self.device = Some(capabilities);
    }

    /// Records the start of a frame.
    ///
    /// # Panics
    ///
    /// Panics if `now_ms` is not finite or goes backwards.
    pub fn record_frame(&mut self, now_ms: f64) {
        if let Some(duration_ms) = self.frame_timer.record_frame(now_ms) {
            self.period_duration_ms += duration_ms;
            self.period_frames += 1;
        }
        self.frame_count += 1;
        self.last_now_ms = now_ms;
    }

    /// Records the render statistics of the previous frame.
    pub fn record_render(&mut self, stats: RenderStats) {
        self.render_times.push(stats.render_time_ms);
        self.draw_calls.push(f64::from(stats.draw_calls));
        self.last_render = stats;
    }

    /// Declares a use of a resource. Oversized resources publish a warning.
    pub fn track_resource(
        &mut self,
        id: &str,
        kind: ResourceKind,
        size_bytes: u64,
        now_ms: f64,
    ) -> Option<OptimizationSuggestion> {
        let suggestion = self.resources.track(id, kind, size_bytes, now_ms)?;
        self.emit(suggestion.clone());
        Some(suggestion)
    }

    /// Runs the periodic work due at the current frame.
    ///
    /// Returns the new [`BudgetState`] when an evaluation ran, `None` when the
    /// current frame is not on an evaluation boundary (or was already
    /// evaluated).
    pub fn evaluate(&mut self, now_ms: f64) -> Option<BudgetState> {
        if self.frame_count == self.last_evaluated_frame {
            return None;
        }
        self.last_evaluated_frame = self.frame_count;

        if self.frame_count % self.config.resources.eviction_interval == 0 {
            self.housekeeping(now_ms);
        }
        if self.frame_count % self.config.evaluation_interval != 0 {
            return None;
        }

        self.snapshot = self.build_snapshot();
        self.period_duration_ms = 0.0;
        self.period_frames = 0;
        self.fps_history.push(self.snapshot.fps);
        log::debug!(
            "PerformanceMonitor: frame {} fps {:.1} (history {}/{})",
            self.frame_count,
            self.snapshot.fps,
            self.fps_history.count(),
            self.fps_history.capacity()
        );

        self.budget_state = self.decide();

        let snapshot = self.snapshot;
        let avg_draw_calls = (!self.draw_calls.is_empty()).then(|| self.draw_calls.average());
        let suggestions = self.analyzer.analyze(&AnalysisInput {
            now_ms,
            snapshot: &snapshot,
            render_samples: self.render_times.count(),
            avg_draw_calls,
        });
        for suggestion in suggestions {
            self.emit(suggestion);
        }

        Some(self.budget_state)
    }

    /// Mean frame duration of the period that is ending.
    fn period_frame_time_ms(&self) -> Option<f64> {
        (self.period_frames > 0 && self.period_duration_ms > 0.0)
            .then(|| self.period_duration_ms / f64::from(self.period_frames))
    }

    fn build_snapshot(&self) -> PerformanceSnapshot {
        let avg_frame_time_ms = self
            .period_frame_time_ms()
            .unwrap_or(1000.0 / verdure_telemetry::metrics::frame_timer::DEFAULT_FPS);
        PerformanceSnapshot {
            fps: 1000.0 / avg_frame_time_ms,
            avg_frame_time_ms,
            avg_render_time_ms: self.render_times.average(),
            memory_used_bytes: self.memory_probe.as_ref().and_then(|p| p.used_bytes()),
            draw_calls: self.last_render.draw_calls,
            triangle_count: self.last_render.triangle_count,
        }
    }

    fn decide(&mut self) -> BudgetState {
        let low = self.config.low_fps_threshold;
        let high = self.config.high_fps_threshold;
        let current = self.store.get();
        let tier = current.complexity_tier;

        if self.fps_history.all_full_window(|fps| fps < low) {
            if tier == ComplexityTier::Low {
                if !self.floor_alert_latched {
                    self.floor_alert_latched = true;
                    self.emit(
                        OptimizationSuggestion::new(
                            SuggestionCategory::Performance,
                            Severity::Critical,
                            format!(
                                "Frame rate stays below {low:.0} FPS at the lowest quality tier"
                            ),
                        )
                        .with_action(SuggestedAction::ReduceRenderScale),
                    );
                }
            } else {
                self.step_down(&current);
                self.fps_history.clear();
            }
            return BudgetState::OverBudget;
        }
        self.floor_alert_latched = false;

        if self.fps_history.all_full_window(|fps| fps > high) && self.can_raise(tier) {
            self.step_up(&current);
            self.fps_history.clear();
            return BudgetState::UnderBudget;
        }

        BudgetState::AtBudget
    }

    fn can_raise(&self, tier: ComplexityTier) -> bool {
        let (ceiling, low_performance) = match &self.device {
            Some(device) => (device.max_tier(), device.is_low_performance()),
            None => (ComplexityTier::Ultra, false),
        };
        tier < ComplexityTier::Ultra && tier < ceiling && !low_performance
    }

    fn step_down(&mut self, current: &AdaptiveSettings) {
        let tier = current.complexity_tier.step_down();
        let next = AdaptiveSettings {
            complexity_tier: tier,
            shadows_enabled: false,
            post_processing: false,
            particles_enabled: current.particles_enabled && tier.allows_particles(),
            max_particle_count: current.max_particle_count / 2,
            ..current.clone()
        };
        log::info!(
            "PerformanceMonitor: lowering tier {} -> {} ({:.1} FPS)",
            current.complexity_tier,
            tier,
            self.snapshot.fps
        );
        self.store.commit(next);
    }

    fn step_up(&mut self, current: &AdaptiveSettings) {
        let tier = current.complexity_tier.step_up();
        let next = AdaptiveSettings {
            complexity_tier: tier,
            render_scale: (current.render_scale + self.config.render_scale_step)
                .min(MAX_RENDER_SCALE),
            particles_enabled: current.particles_enabled || tier.allows_particles(),
            ..current.clone()
        };
        log::info!(
            "PerformanceMonitor: raising tier {} -> {} ({:.1} FPS)",
            current.complexity_tier,
            tier,
            self.snapshot.fps
        );
        self.store.commit(next);
    }

    fn housekeeping(&mut self, now_ms: f64) {
        let evicted = self
            .resources
            .evict_stale(now_ms, self.config.resources.idle_threshold_ms);
        log::trace!("PerformanceMonitor: housekeeping evicted {evicted} resource(s)");
    }

    /// Commits a user override through the single writer. The FPS history is
    /// reset so the controller judges the new settings on fresh evidence.
    pub fn apply_override(&mut self, settings: AdaptiveSettings) -> Arc<AdaptiveSettings> {
        log::info!(
            "PerformanceMonitor: user override to tier {}",
            settings.complexity_tier
        );
        self.fps_history.clear();
        self.store.commit(settings)
    }

    /// Carries out a suggested action. Returns `true` if anything changed.
    pub fn apply_action(&mut self, action: SuggestedAction) -> bool {
        let current = self.store.get();
        log::debug!("PerformanceMonitor: applying {action:?}");
        match action {
            SuggestedAction::LowerTier => {
                if current.complexity_tier == ComplexityTier::Low {
                    return false;
                }
                self.step_down(&current);
                self.fps_history.clear();
                true
            }
            SuggestedAction::DisableShadows => self.commit_if_changed(
                &current,
                AdaptiveSettings {
                    shadows_enabled: false,
                    ..(*current).clone()
                },
            ),
            SuggestedAction::DisableParticles => self.commit_if_changed(
                &current,
                AdaptiveSettings {
                    particles_enabled: false,
                    ..(*current).clone()
                },
            ),
            SuggestedAction::ReduceRenderScale => self.commit_if_changed(
                &current,
                AdaptiveSettings {
                    render_scale: current.render_scale - self.config.render_scale_step,
                    ..(*current).clone()
                },
            ),
            SuggestedAction::EvictStaleResources => {
                let idle = self.config.resources.idle_threshold_ms;
                self.resources.evict_stale(self.last_now_ms, idle) > 0
            }
        }
    }

    fn commit_if_changed(&mut self, current: &AdaptiveSettings, next: AdaptiveSettings) -> bool {
        let next = next.sanitized();
        if next == *current {
            return false;
        }
        self.store.commit(next);
        true
    }

    fn emit(&mut self, suggestion: OptimizationSuggestion) {
        match suggestion.severity {
            Severity::Info => log::info!("Suggestion: {suggestion}"),
            Severity::Warning | Severity::Critical => log::warn!("Suggestion: {suggestion}"),
        }
        if self.recent_suggestions.len() == self.config.suggestion_history {
            self.recent_suggestions.pop_front();
        }
        self.recent_suggestions.push_back(suggestion.clone());
        self.suggestions.publish(suggestion);
    }

    /// Subscribes to every suggestion published from now on.
    pub fn subscribe_suggestions(&self) -> EventSubscriber<OptimizationSuggestion> {
        self.suggestions.subscribe()
    }

    /// Subscribes to settings commits.
    pub fn subscribe_settings<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Arc<AdaptiveSettings>) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    /// The most recent suggestions, oldest first.
    pub fn recent_suggestions(&self) -> impl Iterator<Item = &OptimizationSuggestion> {
        self.recent_suggestions.iter()
    }

    /// The snapshot built at the last evaluation.
    pub fn snapshot(&self) -> &PerformanceSnapshot {
        &self.snapshot
    }

    /// The committed settings.
    pub fn settings(&self) -> Arc<AdaptiveSettings> {
        self.store.get()
    }

    /// A read-only handle on the settings store.
    pub fn reader(&self) -> SettingsReader {
        self.store.reader()
    }

    /// Outcome of the last tier decision.
    pub fn budget_state(&self) -> BudgetState {
        self.budget_state
    }

    /// Frames recorded so far (the baseline frame included).
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Live FPS estimate over the frame window.
    pub fn current_fps(&self) -> f64 {
        self.frame_timer.current_fps()
    }

    /// Timestamp of the most recent frame.
    pub fn last_frame_time_ms(&self) -> Option<f64> {
        self.frame_timer.last_frame_time_ms()
    }

    /// The resource tracker.
    pub fn resources(&self) -> &ResourceTracker {
        &self.resources
    }

    /// The device hints in effect, if any.
    pub fn device_capabilities(&self) -> Option<&DeviceCapabilities> {
        self.device.as_ref()
    }

    /// The active configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use verdure_core::platform::MemoryLevel;
    use verdure_core::telemetry::FixedMemoryProbe;

    fn small_config() -> ControllerConfig {
        ControllerConfig {
            evaluation_interval: 10,
            history_window: 3,
            ..Default::default()
        }
    }

    /// Feeds `frames` frames at a constant `fps`, returning the next timestamp.
    fn run(monitor: &mut PerformanceMonitor, start_ms: f64, frames: usize, fps: f64) -> f64 {
        let mut now = start_ms;
        for _ in 0..frames {
            monitor.record_frame(now);
            monitor.evaluate(now);
            now += 1000.0 / fps;
        }
        now
    }

    #[test]
    fn test_evaluation_only_on_interval() {
        let mut monitor = PerformanceMonitor::new(small_config());
        monitor.record_frame(0.0);
        assert_eq!(monitor.evaluate(0.0), None);
        for i in 1..10 {
            monitor.record_frame(i as f64 * 16.0);
        }
        assert_eq!(monitor.evaluate(144.0), Some(BudgetState::AtBudget));
        assert_eq!(monitor.evaluate(144.0), None);
    }

    #[test]
    fn test_sustained_low_fps_steps_down_once() {
        let mut monitor = PerformanceMonitor::new(small_config());
        run(&mut monitor, 0.0, 30, 12.0);

        let settings = monitor.settings();
        assert_eq!(settings.complexity_tier, ComplexityTier::Medium);
        assert!(!settings.shadows_enabled);
        assert!(!settings.post_processing);
        assert!(!settings.particles_enabled);
        assert_eq!(settings.max_particle_count, 2000);
        assert_eq!(monitor.budget_state(), BudgetState::OverBudget);
    }

    #[test]
    fn test_single_good_period_blocks_step_down() {
        let mut monitor = PerformanceMonitor::new(small_config());
        let now = run(&mut monitor, 0.0, 20, 12.0);
        let now = run(&mut monitor, now, 10, 40.0);
        run(&mut monitor, now, 1, 12.0);
        assert_eq!(monitor.settings().complexity_tier, ComplexityTier::High);
    }

    #[test]
    fn test_period_fps_ignores_previous_period() {
        let mut monitor = PerformanceMonitor::new(small_config());
        let now = run(&mut monitor, 0.0, 10, 10.0);
        assert_relative_eq!(monitor.snapshot().fps, 10.0, epsilon = 1e-6);

        // The first frame of the new period still spans the old cadence.
        run(&mut monitor, now, 10, 50.0);
        let expected = 1000.0 * 10.0 / (100.0 + 9.0 * 20.0);
        assert_relative_eq!(monitor.snapshot().fps, expected, epsilon = 1e-6);
        // The live estimate still spans both periods.
        assert_relative_eq!(monitor.current_fps(), 19_000.0 / 1180.0, epsilon = 1e-6);
    }

    #[test]
    fn test_floor_emits_single_critical_suggestion() {
        let mut monitor = PerformanceMonitor::new(ControllerConfig {
            initial_tier: ComplexityTier::Low,
            ..small_config()
        });
        let suggestions = monitor.subscribe_suggestions();
        run(&mut monitor, 0.0, 90, 10.0);

        assert_eq!(monitor.settings().complexity_tier, ComplexityTier::Low);
        let critical: Vec<_> = suggestions
            .drain()
            .into_iter()
            .filter(|s| s.severity == Severity::Critical)
            .collect();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].category, SuggestionCategory::Performance);
    }

    #[test]
    fn test_sustained_high_fps_steps_up() {
        let mut monitor = PerformanceMonitor::new(ControllerConfig {
            initial_tier: ComplexityTier::Medium,
            ..small_config()
        });
        monitor.apply_override(AdaptiveSettings {
            render_scale: 0.8,
            ..AdaptiveSettings::for_tier(ComplexityTier::Medium)
        });
        run(&mut monitor, 0.0, 30, 60.0);

        let settings = monitor.settings();
        assert_eq!(settings.complexity_tier, ComplexityTier::High);
        assert_relative_eq!(settings.render_scale, 0.9, epsilon = 1e-6);
        assert!(settings.particles_enabled);
        assert_eq!(monitor.budget_state(), BudgetState::UnderBudget);
    }

    #[test]
    fn test_device_ceiling_caps_raising() {
        let mut monitor = PerformanceMonitor::new(small_config());
        monitor.set_device_capabilities(DeviceCapabilities::mobile(MemoryLevel::High));
        run(&mut monitor, 0.0, 60, 60.0);
        assert_eq!(monitor.settings().complexity_tier, ComplexityTier::High);
        assert_eq!(monitor.budget_state(), BudgetState::AtBudget);
    }

    #[test]
    fn test_low_performance_device_never_raises_but_keeps_tier() {
        let mut monitor = PerformanceMonitor::new(small_config());
        monitor.set_device_capabilities(DeviceCapabilities {
            memory_level: MemoryLevel::Low,
            ..Default::default()
        });
        run(&mut monitor, 0.0, 60, 60.0);
        assert_eq!(monitor.settings().complexity_tier, ComplexityTier::High);
    }

    #[test]
    fn test_slow_connection_emits_info() {
        let mut monitor = PerformanceMonitor::new(small_config());
        let suggestions = monitor.subscribe_suggestions();
        monitor.set_device_capabilities(DeviceCapabilities {
            connection_type: "2g".to_owned(),
            ..Default::default()
        });
        let received = suggestions.drain();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].category, SuggestionCategory::Network);
        assert_eq!(received[0].severity, Severity::Info);
    }

    #[test]
    fn test_memory_probe_feeds_snapshot() {
        let mut monitor = PerformanceMonitor::new(small_config());
        let probe = Arc::new(FixedMemoryProbe::new(64 * 1024 * 1024));
        monitor.set_memory_probe(probe.clone());
        run(&mut monitor, 0.0, 10, 60.0);
        assert_eq!(monitor.snapshot().memory_used_bytes, Some(64 * 1024 * 1024));

        probe.set(900 * 1024 * 1024);
        let suggestions = monitor.subscribe_suggestions();
        run(&mut monitor, 1000.0, 10, 60.0);
        assert!(suggestions
            .drain()
            .iter()
            .any(|s| s.category == SuggestionCategory::Memory && s.severity == Severity::Critical));
    }

    #[test]
    fn test_without_probe_memory_is_unknown() {
        let mut monitor = PerformanceMonitor::new(small_config());
        run(&mut monitor, 0.0, 10, 60.0);
        assert_eq!(monitor.snapshot().memory_used_bytes, None);
    }

    #[test]
    fn test_apply_actions() {
        let mut monitor = PerformanceMonitor::new(small_config());
        assert!(monitor.apply_action(SuggestedAction::DisableShadows));
        assert!(!monitor.settings().shadows_enabled);
        assert!(!monitor.apply_action(SuggestedAction::DisableShadows));

        assert!(monitor.apply_action(SuggestedAction::ReduceRenderScale));
        assert_relative_eq!(monitor.settings().render_scale, 0.9, epsilon = 1e-6);

        assert!(monitor.apply_action(SuggestedAction::LowerTier));
        assert_eq!(monitor.settings().complexity_tier, ComplexityTier::Medium);

        assert!(!monitor.apply_action(SuggestedAction::EvictStaleResources));
    }

    #[test]
    fn test_recent_suggestions_are_bounded() {
        let mut monitor = PerformanceMonitor::new(ControllerConfig {
            suggestion_history: 2,
            ..small_config()
        });
        for i in 0..5 {
            monitor.track_resource(&format!("huge-{i}"), ResourceKind::Texture, 200 * 1024 * 1024, 0.0);
        }
        assert_eq!(monitor.recent_suggestions().count(), 2);
    }
}

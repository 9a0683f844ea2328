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

use approx::assert_relative_eq;
use std::sync::{Arc, Mutex};
use verdure_control::{BudgetState, ControllerConfig, PerformanceMonitor};
use verdure_core::telemetry::{RenderStats, Severity, SuggestionCategory};
use verdure_core::{AdaptiveSettings, ComplexityTier};

/// Drives `frames` frames at a constant frame rate and returns the timestamp
/// the next frame would start at.
fn drive(monitor: &mut PerformanceMonitor, start_ms: f64, frames: usize, fps: f64) -> f64 {
    let mut now = start_ms;
    for _ in 0..frames {
        monitor.record_frame(now);
        monitor.evaluate(now);
        now += 1000.0 / fps;
    }
    now
}

#[test]
fn test_sustained_12_fps_lowers_tier_exactly_once() {
    // --- 1. ARRANGE ---
    let mut monitor = PerformanceMonitor::new(ControllerConfig::default());
    let commits = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&commits);
    let _subscription = monitor.subscribe_settings(move |settings| {
        sink.lock().unwrap().push(settings.complexity_tier);
    });

    // --- 2. ACT ---
    // 149 frames: four full evaluation periods below threshold.
    let now = drive(&mut monitor, 0.0, 149, 12.0);
    assert_eq!(
        monitor.settings().complexity_tier,
        ComplexityTier::High,
        "four low periods must not be enough"
    );
    drive(&mut monitor, now, 1, 12.0);

    // --- 3. ASSERT ---
    let settings = monitor.settings();
    assert_eq!(settings.complexity_tier, ComplexityTier::Medium);
    assert!(!settings.particles_enabled);
    assert_eq!(settings.max_particle_count, 2000);
    assert_eq!(*commits.lock().unwrap(), vec![ComplexityTier::Medium]);
    assert_eq!(monitor.budget_state(), BudgetState::OverBudget);
}

#[test]
fn test_one_normal_period_resets_the_decision() {
    let mut monitor = PerformanceMonitor::new(ControllerConfig::default());

    let now = drive(&mut monitor, 0.0, 120, 12.0);
    let now = drive(&mut monitor, now, 30, 60.0);

    assert_eq!(monitor.settings().complexity_tier, ComplexityTier::High);
    assert_eq!(monitor.budget_state(), BudgetState::AtBudget);
    assert!(monitor.snapshot().fps > 25.0);

    // Four more low periods still leave one good period in the window.
    drive(&mut monitor, now, 120, 12.0);
    assert_eq!(monitor.settings().complexity_tier, ComplexityTier::High);
}

#[test]
fn test_each_step_needs_a_fresh_window() {
    let mut monitor = PerformanceMonitor::new(ControllerConfig::default());
    let now = drive(&mut monitor, 0.0, 150, 10.0);
    assert_eq!(monitor.settings().complexity_tier, ComplexityTier::Medium);

    // The history was cleared: 149 more slow frames are not enough.
    let now = drive(&mut monitor, now, 149, 10.0);
    assert_eq!(monitor.settings().complexity_tier, ComplexityTier::Medium);

    drive(&mut monitor, now, 1, 10.0);
    assert_eq!(monitor.settings().complexity_tier, ComplexityTier::Low);
}

#[test]
fn test_recovery_raises_tier_and_render_scale() {
    let mut monitor = PerformanceMonitor::new(ControllerConfig {
        initial_tier: ComplexityTier::Low,
        ..Default::default()
    });
    assert_eq!(monitor.settings().render_scale, 0.6);

    drive(&mut monitor, 0.0, 150, 60.0);

    let settings = monitor.settings();
    assert_eq!(settings.complexity_tier, ComplexityTier::Medium);
    assert_relative_eq!(settings.render_scale, 0.7, epsilon = 1e-6);
    assert!(!settings.particles_enabled, "particles stay off below High");
}

#[test]
fn test_every_subscriber_sees_every_commit_in_order() {
    let mut monitor = PerformanceMonitor::new(ControllerConfig::default());
    let first = Arc::new(Mutex::new(Vec::new()));
    let second = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&first);
    let _a = monitor.subscribe_settings(move |s| sink.lock().unwrap().push(s.complexity_tier));
    let sink = Arc::clone(&second);
    let _b = monitor
        .reader()
        .subscribe(move |s| sink.lock().unwrap().push(s.complexity_tier));

    let now = drive(&mut monitor, 0.0, 150, 12.0);
    let now = drive(&mut monitor, now, 150, 12.0);
    // Five fast periods raise the tier once; the sixth starts a new window.
    drive(&mut monitor, now, 180, 60.0);

    let expected = vec![
        ComplexityTier::Medium,
        ComplexityTier::Low,
        ComplexityTier::Medium,
    ];
    assert_eq!(*first.lock().unwrap(), expected);
    assert_eq!(*second.lock().unwrap(), expected);
}

#[test]
fn test_render_budget_warning_is_not_repeated() {
    let mut monitor = PerformanceMonitor::new(ControllerConfig::default());
    let suggestions = monitor.subscribe_suggestions();

    let mut now = 0.0;
    for _ in 0..300 {
        monitor.record_frame(now);
        monitor.evaluate(now);
        monitor.record_render(RenderStats {
            render_time_ms: 14.0,
            draw_calls: 40,
            triangle_count: 120_000,
        });
        now += 1000.0 / 60.0;
    }

    let render_warnings = suggestions
        .drain()
        .into_iter()
        .filter(|s| s.category == SuggestionCategory::Performance && s.severity == Severity::Warning)
        .count();
    assert_eq!(render_warnings, 1);
    assert_eq!(monitor.snapshot().draw_calls, 40);
}

#[test]
fn test_unknown_memory_never_raises_memory_suggestions() {
    let mut monitor = PerformanceMonitor::new(ControllerConfig::default());
    let suggestions = monitor.subscribe_suggestions();

    // Ten minutes at 60 FPS, no memory probe installed.
    drive(&mut monitor, 0.0, 36_000, 60.0);

    assert_eq!(monitor.snapshot().memory_used_bytes, None);
    assert!(suggestions
        .drain()
        .iter()
        .all(|s| s.category != SuggestionCategory::Memory));
}

#[test]
fn test_user_override_is_clamped_and_wins() {
    let mut monitor = PerformanceMonitor::new(ControllerConfig::default());
    let committed = monitor.apply_override(AdaptiveSettings {
        render_scale: 4.0,
        ..AdaptiveSettings::for_tier(ComplexityTier::Ultra)
    });
    assert_eq!(committed.render_scale, 1.0);
    assert_eq!(monitor.settings().complexity_tier, ComplexityTier::Ultra);
    assert_eq!(monitor.reader().revision(), 1);
}

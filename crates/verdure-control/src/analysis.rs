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

//! Budget analysis.
//!
//! The `BudgetAnalyzer` checks each new snapshot against the configured
//! budgets and produces suggestions. It never touches the settings; the tier
//! state machine in the monitor is independent of it.
//!
//! Every check is latched: a suggestion is produced when the check starts
//! failing and the latch re-arms only once the check passes again.

use crate::config::BudgetConfig;
use std::collections::VecDeque;
use verdure_core::telemetry::{
    OptimizationSuggestion, PerformanceSnapshot, Severity, SuggestedAction, SuggestionCategory,
};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;
const MINUTE_MS: f64 = 60_000.0;
/// Memory readings older than this multiple of the leak runtime are dropped.
const LEAK_HISTORY_FACTOR: f64 = 2.0;

/// Inputs gathered by the monitor for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    /// Timestamp of the evaluation.
    pub now_ms: f64,
    /// The snapshot just built.
    pub snapshot: &'a PerformanceSnapshot,
    /// Number of render-time samples behind `snapshot.avg_render_time_ms`.
    pub render_samples: usize,
    /// Average draw calls over the draw-call window, if any frame reported them.
    pub avg_draw_calls: Option<f64>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Latch {
    tripped: bool,
}

impl Latch {
    /// Returns `true` only on the transition into violation.
    fn update(&mut self, violated: bool) -> bool {
        let fire = violated && !self.tripped;
        self.tripped = violated;
        fire
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Latches {
    render_time: Latch,
    draw_calls: Latch,
    memory: Latch,
    leak: Latch,
}

/// Checks snapshots against render-time, draw-call and memory budgets.
#[derive(Debug, Clone)]
pub struct BudgetAnalyzer {
    budgets: BudgetConfig,
    min_render_samples: usize,
    latches: Latches,
    started_at_ms: Option<f64>,
    memory_history: VecDeque<(f64, u64)>,
}

impl BudgetAnalyzer {
    /// Creates an analyzer. The render-time check waits for at least
    /// `min_render_samples` samples.
    pub fn new(budgets: BudgetConfig, min_render_samples: usize) -> Self {
        Self {
            budgets,
            min_render_samples: min_render_samples.max(1),
            latches: Latches::default(),
            started_at_ms: None,
            memory_history: VecDeque::new(),
        }
    }

    /// The budgets being enforced.
    pub fn budgets(&self) -> &BudgetConfig {
        &self.budgets
    }

    /// Runs every check and returns the suggestions that became due.
    pub fn analyze(&mut self, input: &AnalysisInput<'_>) -> Vec<OptimizationSuggestion> {
        let started_at = *self.started_at_ms.get_or_insert(input.now_ms);
        let mut suggestions = Vec::new();

        let render_over = input.render_samples >= self.min_render_samples
            && input.snapshot.avg_render_time_ms > self.budgets.render_time_ms;
        if self.latches.render_time.update(render_over) {
            suggestions.push(
                OptimizationSuggestion::new(
                    SuggestionCategory::Performance,
                    Severity::Warning,
                    format!(
                        "Average render time {:.1} ms exceeds the {:.1} ms budget",
                        input.snapshot.avg_render_time_ms, self.budgets.render_time_ms
                    ),
                )
                .with_action(SuggestedAction::ReduceRenderScale),
            );
        }

        let draw_calls_over = input
            .avg_draw_calls
            .is_some_and(|avg| avg > f64::from(self.budgets.draw_calls));
        if self.latches.draw_calls.update(draw_calls_over) {
            suggestions.push(
                OptimizationSuggestion::new(
                    SuggestionCategory::Rendering,
                    Severity::Warning,
                    format!(
                        "Average of {:.0} draw calls per frame exceeds the budget of {}; consider batching or instancing",
                        input.avg_draw_calls.unwrap_or_default(),
                        self.budgets.draw_calls
                    ),
                )
                .with_action(SuggestedAction::DisableShadows),
            );
        }

        // Unknown memory is never treated as zero: the memory checks simply
        // keep their previous latch state until a reading arrives.
        if let Some(used) = input.snapshot.memory_used_bytes {
            let memory_over = used > self.budgets.memory_bytes;
            if self.latches.memory.update(memory_over) {
                suggestions.push(
                    OptimizationSuggestion::new(
                        SuggestionCategory::Memory,
                        Severity::Critical,
                        format!(
                            "Memory use {:.0} MiB exceeds the {:.0} MiB budget",
                            used as f64 / BYTES_PER_MIB,
                            self.budgets.memory_bytes as f64 / BYTES_PER_MIB
                        ),
                    )
                    .with_action(SuggestedAction::EvictStaleResources),
                );
            }

            self.record_memory(input.now_ms, used);
            let leak_rate = self.leak_rate(input.now_ms - started_at);
            let leaking =
                leak_rate.is_some_and(|rate| rate > self.budgets.leak_rate_bytes_per_minute as f64);
            if self.latches.leak.update(leaking) {
                suggestions.push(OptimizationSuggestion::new(
                    SuggestionCategory::Memory,
                    Severity::Warning,
                    format!(
                        "Memory grows by {:.1} MiB per minute; possible leak",
                        leak_rate.unwrap_or_default() / BYTES_PER_MIB
                    ),
                ));
            }
        }

        for suggestion in &suggestions {
            log::debug!("BudgetAnalyzer: {suggestion}");
        }
        suggestions
    }

    fn record_memory(&mut self, now_ms: f64, used: u64) {
        self.memory_history.push_back((now_ms, used));
        let horizon = now_ms - self.budgets.leak_min_runtime_ms * LEAK_HISTORY_FACTOR;
        while self
            .memory_history
            .front()
            .is_some_and(|(at, _)| *at < horizon)
        {
            self.memory_history.pop_front();
        }
    }

    /// Growth in bytes per minute between the oldest and newest reading, once
    /// the runtime and the observed span both reach the leak window.
    fn leak_rate(&self, runtime_ms: f64) -> Option<f64> {
        if runtime_ms < self.budgets.leak_min_runtime_ms {
            return None;
        }
        let (oldest_at, oldest) = *self.memory_history.front()?;
        let (newest_at, newest) = *self.memory_history.back()?;
        let span_ms = newest_at - oldest_at;
        if span_ms < self.budgets.leak_min_runtime_ms {
            return None;
        }
        let growth = newest as f64 - oldest as f64;
        Some(growth / (span_ms / MINUTE_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn snapshot(render_ms: f64, memory: Option<u64>) -> PerformanceSnapshot {
        PerformanceSnapshot {
            avg_render_time_ms: render_ms,
            memory_used_bytes: memory,
            ..Default::default()
        }
    }

    fn input(now_ms: f64, snapshot: &PerformanceSnapshot) -> AnalysisInput<'_> {
        AnalysisInput {
            now_ms,
            snapshot,
            render_samples: 60,
            avg_draw_calls: None,
        }
    }

    #[test]
    fn test_render_time_warning_is_latched() {
        let mut analyzer = BudgetAnalyzer::new(BudgetConfig::default(), 30);
        let slow = snapshot(20.0, None);

        let first = analyzer.analyze(&input(0.0, &slow));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].category, SuggestionCategory::Performance);
        assert_eq!(first[0].suggested_action, Some(SuggestedAction::ReduceRenderScale));

        assert!(analyzer.analyze(&input(500.0, &slow)).is_empty());

        // Clearing re-arms the latch.
        assert!(analyzer.analyze(&input(1000.0, &snapshot(5.0, None))).is_empty());
        assert_eq!(analyzer.analyze(&input(1500.0, &slow)).len(), 1);
    }

    #[test]
    fn test_render_time_needs_enough_samples() {
        let mut analyzer = BudgetAnalyzer::new(BudgetConfig::default(), 30);
        let slow = snapshot(20.0, None);
        let mut early = input(0.0, &slow);
        early.render_samples = 10;
        assert!(analyzer.analyze(&early).is_empty());
    }

    #[test]
    fn test_draw_call_warning() {
        let mut analyzer = BudgetAnalyzer::new(BudgetConfig::default(), 30);
        let snap = snapshot(1.0, None);
        let mut heavy = input(0.0, &snap);
        heavy.avg_draw_calls = Some(180.0);

        let suggestions = analyzer.analyze(&heavy);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].category, SuggestionCategory::Rendering);
        assert_eq!(suggestions[0].severity, Severity::Warning);
    }

    #[test]
    fn test_memory_over_budget_is_critical() {
        let mut analyzer = BudgetAnalyzer::new(BudgetConfig::default(), 30);
        let snap = snapshot(1.0, Some(600 * MIB));
        let suggestions = analyzer.analyze(&input(0.0, &snap));
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].severity, Severity::Critical);
        assert!(suggestions[0].is_user_facing());
    }

    #[test]
    fn test_unknown_memory_never_triggers() {
        let mut analyzer = BudgetAnalyzer::new(BudgetConfig::default(), 30);
        let snap = snapshot(1.0, None);
        for minute in 0..20 {
            assert!(analyzer.analyze(&input(minute as f64 * MINUTE_MS, &snap)).is_empty());
        }
    }

    #[test]
    fn test_leak_detected_after_min_runtime() {
        let mut analyzer = BudgetAnalyzer::new(BudgetConfig::default(), 30);
        let mut fired = Vec::new();
        // 20 MiB per minute from 100 MiB, one evaluation every 30 s.
        for step in 0..=12 {
            let now = step as f64 * 30_000.0;
            let used = 100 * MIB + step as u64 * 10 * MIB;
            let snap = snapshot(1.0, Some(used));
            for suggestion in analyzer.analyze(&input(now, &snap)) {
                fired.push((now, suggestion));
            }
        }
        assert_eq!(fired.len(), 1);
        let (at, suggestion) = &fired[0];
        assert_eq!(*at, 300_000.0);
        assert_eq!(suggestion.category, SuggestionCategory::Memory);
        assert_eq!(suggestion.severity, Severity::Warning);
    }

    #[test]
    fn test_slow_growth_is_not_a_leak() {
        let mut analyzer = BudgetAnalyzer::new(BudgetConfig::default(), 30);
        for step in 0..=20 {
            let used = 100 * MIB + step as u64 * MIB;
            let snap = snapshot(1.0, Some(used));
            assert!(analyzer
                .analyze(&input(step as f64 * 30_000.0, &snap))
                .is_empty());
        }
    }
}

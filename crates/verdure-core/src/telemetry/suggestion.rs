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

//! Optimization suggestions emitted when a budget is violated.
//!
//! Suggestions are ephemeral events. They are never persisted and the core
//! behaves the same whether anyone listens or not.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What part of the system a suggestion is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestionCategory {
    /// Frame rate or frame/render time.
    Performance,
    /// Memory footprint or growth.
    Memory,
    /// Connection quality reported by the host.
    Network,
    /// Renderer load (draw calls, triangles).
    Rendering,
}

/// How urgent a suggestion is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational only.
    Info,
    /// A budget is being exceeded.
    Warning,
    /// Quality cannot be reduced further or a hard limit is exceeded.
    Critical,
}

/// An action the host may hand back to the controller to act on a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestedAction {
    /// Drop one complexity tier.
    LowerTier,
    /// Turn shadow maps off.
    DisableShadows,
    /// Turn particle systems off.
    DisableParticles,
    /// Render at a smaller target scale.
    ReduceRenderScale,
    /// Evict idle low-priority resources now.
    EvictStaleResources,
}

/// A single optimization suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    /// Area the suggestion concerns.
    pub category: SuggestionCategory,
    /// Urgency.
    pub severity: Severity,
    /// Human-readable explanation.
    pub message: String,
    /// Optional action the host can apply.
    pub suggested_action: Option<SuggestedAction>,
}

impl OptimizationSuggestion {
    /// Creates a suggestion without an attached action.
    pub fn new(
        category: SuggestionCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            message: message.into(),
            suggested_action: None,
        }
    }

    /// Attaches an action to the suggestion.
    pub fn with_action(mut self, action: SuggestedAction) -> Self {
        self.suggested_action = Some(action);
        self
    }

    /// Only critical suggestions should ever reach an end user.
    pub fn is_user_facing(&self) -> bool {
        self.severity == Severity::Critical
    }
}

impl fmt::Display for OptimizationSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}/{:?}] {}", self.severity, self.category, self.message)
    }
}

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

//! Host device hints used to cap how far the controller may raise quality.

use crate::settings::ComplexityTier;
use serde::{Deserialize, Serialize};

/// Coarse classification of the device's memory capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryLevel {
    /// The host did not report a memory class.
    #[default]
    Unknown,
    /// Constrained devices (roughly 2 GiB or less).
    Low,
    /// Mid-range devices.
    Medium,
    /// Devices with plenty of memory.
    High,
}

/// Connection types reported as too slow for streaming optional content.
const SLOW_CONNECTIONS: [&str; 2] = ["slow-2g", "2g"];

/// Capability hints supplied by the host.
///
/// These are advisory: they only ever cap tier increases and never lower
/// the current tier on their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Whether the host runs on a phone or tablet class device.
    pub is_mobile: bool,
    /// Coarse memory classification.
    pub memory_level: MemoryLevel,
    /// Effective network connection type (for example `"4g"` or `"2g"`).
    /// Empty when unknown.
    pub connection_type: String,
}

impl DeviceCapabilities {
    /// A desktop device with unknown memory and connection.
    pub fn desktop() -> Self {
        Self::default()
    }

    /// A mobile device with the given memory class.
    pub fn mobile(memory_level: MemoryLevel) -> Self {
        Self {
            is_mobile: true,
            memory_level,
            connection_type: String::new(),
        }
    }

    /// Returns `true` for devices that should never be stepped up automatically.
    pub fn is_low_performance(&self) -> bool {
        self.memory_level == MemoryLevel::Low
    }

    /// The highest tier the controller may raise to on this device.
    pub fn max_tier(&self) -> ComplexityTier {
        if self.memory_level == MemoryLevel::Low {
            ComplexityTier::Medium
        } else if self.is_mobile {
            ComplexityTier::High
        } else {
            ComplexityTier::Ultra
        }
    }

    /// Returns `true` when the reported connection is `slow-2g` or `2g`.
    pub fn has_slow_connection(&self) -> bool {
        let connection = self.connection_type.trim().to_ascii_lowercase();
        SLOW_CONNECTIONS.contains(&connection.as_str())
    }
}

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

//! sysinfo-based implementation of the MemoryProbe trait.

use std::sync::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};
use verdure_core::telemetry::MemoryProbe;

/// Reports the resident set size of the current process.
pub struct SysinfoMemoryProbe {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl std::fmt::Debug for SysinfoMemoryProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoMemoryProbe")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl SysinfoMemoryProbe {
    /// Creates a probe for the current process.
    ///
    /// On platforms where the current process cannot be identified the probe
    /// is still created and always reports `None`.
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                log::warn!("SysinfoMemoryProbe: cannot identify current process: {e}");
                None
            }
        };
        Self {
            system: Mutex::new(System::new()),
            pid,
        }
    }
}

impl Default for SysinfoMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SysinfoMemoryProbe {
    fn probe_name(&self) -> &str {
        "sysinfo"
    }

    fn used_bytes(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let used = system.process(pid).map(|process| process.memory());
        if used.is_none() {
            log::trace!("SysinfoMemoryProbe: process {pid} not found");
        }
        used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_reports_own_process() {
        let probe = SysinfoMemoryProbe::new();
        assert_eq!(probe.probe_name(), "sysinfo");
        // Some sandboxes hide /proc; a reading, when present, is non-zero.
        if let Some(bytes) = probe.used_bytes() {
            assert!(bytes > 0);
        }
    }
}

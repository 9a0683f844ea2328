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

// Verdure Sandbox
// Runs a simulated garden through the controller on a virtual clock.
//
// Usage: sandbox [config.ron]

use std::sync::Arc;

use anyhow::{Context, Result};
use verdure_control::{ControllerConfig, FrameLoop};
use verdure_core::math::{Vec3, FRAC_PI_3};
use verdure_core::platform::DeviceCapabilities;
use verdure_core::scene::{CameraState, SceneObjectRef};
use verdure_core::telemetry::RenderStats;
use verdure_core::AdaptiveSettings;
use verdure_infra::SysinfoMemoryProbe;
use verdure_telemetry::ResourceKind;

const FRAMES: usize = 1800;
/// Frames during which a storm makes every object more expensive.
const STORM: std::ops::Range<usize> = 120..900;

/// A grid of plants with a few large landmarks.
fn build_garden() -> Vec<SceneObjectRef> {
    let mut objects = Vec::new();
    for row in 0..20 {
        for col in 0..20 {
            let position = Vec3::new((col - 10) as f32 * 3.0, 0.0, -(row as f32) * 3.0);
            objects.push(SceneObjectRef::new(format!("plant-{row}-{col}"), position, 1.0));
        }
    }
    objects.push(SceneObjectRef::new("greenhouse", Vec3::new(-20.0, 0.0, -30.0), 8.0));
    objects.push(SceneObjectRef::new("old-oak", Vec3::new(15.0, 0.0, -70.0), 10.0));
    objects.push(SceneObjectRef::new("tool-shed", Vec3::new(0.0, 0.0, 40.0), 4.0));
    objects
}

/// Estimated cost of drawing one frame with `settings`.
fn simulated_frame_ms(settings: &AdaptiveSettings, visible: usize, frame: usize) -> f64 {
    let storm = if STORM.contains(&frame) { 2.5 } else { 1.0 };
    let per_object = 0.04 * storm;
    let mut cost = 4.0 + visible as f64 * per_object;
    if settings.shadows_enabled {
        cost += 6.0 * storm;
    }
    if settings.post_processing {
        cost += 3.0;
    }
    if settings.particles_enabled {
        cost += settings.max_particle_count as f64 / 1000.0 * storm;
    }
    let scale = f64::from(settings.render_scale);
    let jitter = (frame as f64 * 0.37).sin() * 0.8;
    (cost * scale * scale + jitter).max(1.0)
}

fn load_config() -> Result<ControllerConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let document = std::fs::read_to_string(&path)
                .with_context(|| format!("reading controller configuration {path}"))?;
            let config = ControllerConfig::from_ron_str(&document)
                .with_context(|| format!("loading controller configuration {path}"))?;
            log::info!("Loaded configuration from {path}");
            Ok(config)
        }
        None => Ok(ControllerConfig::default()),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let mut frame_loop =
        FrameLoop::new(config)?.with_memory_probe(Arc::new(SysinfoMemoryProbe::new()));
    frame_loop.set_device_capabilities(DeviceCapabilities {
        connection_type: "4g".to_owned(),
        ..DeviceCapabilities::desktop()
    });

    let suggestions = frame_loop.monitor().subscribe_suggestions();
    let _settings_log = frame_loop.monitor().subscribe_settings(|settings| {
        log::info!(
            "Settings committed: tier {} scale {:.2} shadows {} particles {} ({} max)",
            settings.complexity_tier,
            settings.render_scale,
            settings.shadows_enabled,
            settings.particles_enabled,
            settings.max_particle_count
        );
    });

    let objects = build_garden();
    let camera = CameraState::look_at(
        Vec3::new(0.0, 6.0, 12.0),
        Vec3::new(0.0, 0.0, -20.0),
        Vec3::Y,
        FRAC_PI_3,
        16.0 / 9.0,
        0.1,
        200.0,
    )
    .context("camera placement is degenerate")?;

    frame_loop.track_resource("terrain-heightmap", ResourceKind::Texture, 16 * 1024 * 1024);
    frame_loop.track_resource("plant-shader", ResourceKind::Shader, 96 * 1024);
    frame_loop.track_resource("plant-mesh", ResourceKind::Geometry, 2 * 1024 * 1024);

    let mut now_ms = 0.0;
    for frame in 0..FRAMES {
        let output = frame_loop.on_frame(now_ms, &camera, &objects);
        let frame_ms = simulated_frame_ms(&output.settings, output.assignments.len(), frame);

        frame_loop.record_render(RenderStats {
            render_time_ms: frame_ms * 0.7,
            draw_calls: output.assignments.len() as u32,
            triangle_count: output
                .assignments
                .iter()
                .map(|a| (2_000.0 * a.level.geometry_detail) as u32)
                .sum(),
        });
        if frame % 60 == 0 {
            frame_loop.track_resource("plant-mesh", ResourceKind::Geometry, 2 * 1024 * 1024);
        }
        if let Some(state) = output.budget_state {
            log::debug!("Frame {}: {:?}", output.frame, state);
        }

        for suggestion in suggestions.drain() {
            if suggestion.is_user_facing() {
                log::error!("User-facing: {suggestion}");
            }
        }

        now_ms += frame_ms;
    }

    let report = serde_json::to_string_pretty(&frame_loop.export_json())?;
    log::info!("Final diagnostics:\n{report}");
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulated image-generation backend. Produces `num_images` placeholder
//! output files under `outputs/{job_id}/`, optionally applying a
//! previously-trained LoRA path supplied in config (spec §1's real
//! generation engine is out of scope; this stands in for it).

use async_trait::async_trait;
use oj_core::{runtime_keys, CancelToken, JobId, Plugin, PluginCapabilities, ProgressSink, RunResult, Stage};
use serde_json::Value as Json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::entry;

/// `image-generator`: renders one or more images from a prompt, optionally
/// conditioned on a trained character LoRA.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageGenerationPlugin;

impl ImageGenerationPlugin {
    pub fn new() -> Self {
        Self
    }
}

fn config_str(config: &Json, key: &str) -> Option<String> {
    config.get(key).and_then(Json::as_str).map(str::to_string)
}

fn config_u64(config: &Json, key: &str, default: u64) -> u64 {
    config.get(key).and_then(Json::as_u64).unwrap_or(default)
}

fn config_f64(config: &Json, key: &str, default: f64) -> f64 {
    config.get(key).and_then(Json::as_f64).unwrap_or(default)
}

#[async_trait]
impl Plugin for ImageGenerationPlugin {
    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities {
            backend: "image-generator".to_string(),
            parameters: [
                ("prompt".to_string(), "string, required".to_string()),
                ("num_images".to_string(), "integer 1..=8, default 1".to_string()),
                ("cfg_scale".to_string(), "float, default 7.0".to_string()),
                ("sampler".to_string(), "string, default \"euler_a\"".to_string()),
                ("steps".to_string(), "integer, default 30".to_string()),
                ("lora".to_string(), "string, optional (character LoRA path)".to_string()),
                ("seed".to_string(), "integer, optional".to_string()),
            ]
            .into_iter()
            .collect(),
            wired: true,
            reason: None,
        }
    }

    async fn run(&self, config: Json, logger: Arc<dyn ProgressSink>, cancel_token: CancelToken) -> RunResult {
        let job_id = config
            .get(runtime_keys::JOB_ID)
            .and_then(Json::as_str)
            .map(JobId::from_string)
            .unwrap_or_else(|| JobId::from_string("gen-unknown"));
        let volume_root = config.get(runtime_keys::VOLUME_ROOT).and_then(Json::as_str).map(PathBuf::from);

        let Some(prompt) = config_str(&config, "prompt") else {
            return RunResult {
                success: false,
                artifact_path: None,
                samples: vec![],
                error: Some("config is missing required key \"prompt\"".to_string()),
                error_type: Some("InvalidConfig".to_string()),
            };
        };

        let num_images = config_u64(&config, "num_images", 1).clamp(1, 8);
        let per_image_steps = config_u64(&config, "steps", 30).clamp(1, 150);
        let render_delay = Duration::from_millis(config_u64(&config, "step_delay_ms", 30));
        let lora = config_str(&config, "lora");

        logger
            .log(entry::lifecycle(
                job_id,
                Stage::Initializing,
                0.0,
                format!("loading generation model (lora={})", lora.as_deref().unwrap_or("none")),
            ))
            .await;
        if cancel_token.is_set() {
            return cancelled();
        }

        let output_dir = volume_root.as_ref().map(|root| root.join("outputs").join(job_id.as_str()));
        if let Some(dir) = &output_dir {
            let _ = std::fs::create_dir_all(dir);
        }

        let mut samples = Vec::new();
        for image_index in 1..=num_images {
            for substep in 1..=per_image_steps {
                tokio::time::sleep(render_delay).await;
                if cancel_token.is_set() {
                    return cancelled();
                }
                let completed_steps = (image_index - 1) * per_image_steps + substep;
                let total_steps = num_images * per_image_steps;
                let progress_pct = 5.0 + (completed_steps as f64 / total_steps as f64) * 85.0;
                logger
                    .log(entry::step(
                        job_id,
                        Stage::Sampling,
                        completed_steps,
                        total_steps,
                        progress_pct,
                        None,
                        None,
                        format!("image {image_index}/{num_images} step {substep}/{per_image_steps}: {prompt}"),
                    ))
                    .await;
            }

            if let Some(dir) = &output_dir {
                let file_name = format!("image_{image_index:03}.png");
                let path = dir.join(&file_name);
                if std::fs::write(&path, simulated_image_bytes(&prompt, image_index)).is_ok() {
                    let relative = format!("outputs/{}/{}", job_id.as_str(), file_name);
                    logger.log(entry::sample(job_id, image_index as u32, relative.clone())).await;
                    samples.push(relative);
                }
            }
        }

        logger
            .log(entry::lifecycle(job_id, Stage::Exporting, 95.0, "finalizing generated images"))
            .await;

        RunResult {
            success: true,
            artifact_path: output_dir.map(|_| format!("outputs/{}", job_id.as_str())),
            samples,
            error: None,
            error_type: None,
        }
    }
}

fn cancelled() -> RunResult {
    RunResult {
        success: false,
        artifact_path: None,
        samples: vec![],
        error: Some("generation cancelled".to_string()),
        error_type: Some("Cancelled".to_string()),
    }
}

/// Deterministic placeholder bytes standing in for a rendered PNG.
fn simulated_image_bytes(prompt: &str, index: u64) -> Vec<u8> {
    format!("simulated-image index={index} prompt={prompt:?}\n").into_bytes()
}

#[cfg(test)]
#[path = "generation_tests.rs"]
mod tests;

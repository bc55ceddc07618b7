// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulated LoRA training backend. The real trainer is an external
//! collaborator invoked through the same `Plugin` contract (spec §1); this
//! one produces a deterministic progress curve and placeholder artifacts so
//! the rest of the system can be exercised without a GPU.

use async_trait::async_trait;
use oj_core::{runtime_keys, CancelToken, JobId, Plugin, PluginCapabilities, ProgressSink, RunResult, Stage};
use serde_json::Value as Json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::entry;

/// `lora-trainer`: fine-tunes a LoRA adapter for one character from a
/// caller-supplied config (spec §3/§4.5's `{character_id, config}` body).
#[derive(Debug, Clone, Copy, Default)]
pub struct LoraTrainingPlugin;

impl LoraTrainingPlugin {
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

/// Finds the next free `v{n}.safetensors` slot for a character's LoRA
/// directory, starting at 1.
fn next_lora_version(character_dir: &Path) -> u32 {
    let Ok(entries) = std::fs::read_dir(character_dir) else {
        return 1;
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter_map(|name| name.strip_prefix('v')?.strip_suffix(".safetensors")?.parse::<u32>().ok())
        .max()
        .map(|n| n + 1)
        .unwrap_or(1)
}

#[async_trait]
impl Plugin for LoraTrainingPlugin {
    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities {
            backend: "lora-trainer".to_string(),
            parameters: [
                ("character_id".to_string(), "string, required".to_string()),
                ("steps".to_string(), "integer 1..=10000, default 1000".to_string()),
                ("learning_rate".to_string(), "float, default 0.0001".to_string()),
                ("resolution".to_string(), "integer, default 512".to_string()),
                ("base_model".to_string(), "string, default \"sdxl-base\"".to_string()),
                ("trigger_word".to_string(), "string, optional".to_string()),
                ("sample_every".to_string(), "integer, default steps/5 (min 1)".to_string()),
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
            .unwrap_or_else(|| JobId::from_string("train-unknown"));
        let sample_dir = config.get(runtime_keys::SAMPLE_DIR).and_then(Json::as_str).map(PathBuf::from);
        let volume_root = config.get(runtime_keys::VOLUME_ROOT).and_then(Json::as_str).map(PathBuf::from);
        let character_id = config_str(&config, "character_id").unwrap_or_else(|| "unknown".to_string());

        let steps = config_u64(&config, "steps", 1000).clamp(1, 10_000);
        let learning_rate = config_f64(&config, "learning_rate", 0.0001);
        let sample_every = config_u64(&config, "sample_every", (steps / 5).max(1)).max(1);
        let step_delay = Duration::from_millis(config_u64(&config, "step_delay_ms", 20));

        for (stage, progress, msg) in [
            (Stage::Initializing, 0.0, "loading base model"),
            (Stage::PreparingDataset, 2.0, "preparing training dataset"),
            (Stage::Captioning, 4.0, "captioning training images"),
        ] {
            logger.log(entry::lifecycle(job_id, stage, progress, msg)).await;
            if cancel_token.is_set() {
                return cancelled();
            }
        }

        let mut last_loss = 1.8_f64;
        let mut samples = Vec::new();

        for step in 1..=steps {
            tokio::time::sleep(step_delay).await;
            if cancel_token.is_set() {
                return cancelled();
            }

            last_loss *= 0.985;
            let progress_pct = 5.0 + (step as f64 / steps as f64) * 85.0;
            logger
                .log(entry::step(
                    job_id,
                    Stage::Training,
                    step,
                    steps,
                    progress_pct,
                    Some(last_loss),
                    Some(learning_rate),
                    format!("step {step}/{steps}"),
                ))
                .await;

            if step % sample_every == 0 || step == steps {
                if let Some(dir) = &sample_dir {
                    let file_name = format!("step_{step:05}.png");
                    let sample_path = dir.join(&file_name);
                    if std::fs::write(&sample_path, simulated_sample_bytes(step)).is_ok() {
                        let relative = format!("samples/{file_name}");
                        logger.log(entry::sample(job_id, step as u32, relative.clone())).await;
                        samples.push(relative);
                    }
                }
            }
        }

        logger
            .log(entry::lifecycle(job_id, Stage::Exporting, 95.0, "exporting LoRA weights"))
            .await;

        let artifact_path = volume_root.map(|root| {
            let character_dir = root.join("loras").join(&character_id);
            let _ = std::fs::create_dir_all(&character_dir);
            let version = next_lora_version(&character_dir);
            let file_name = format!("v{version}.safetensors");
            let _ = std::fs::write(character_dir.join(&file_name), simulated_weights_bytes(steps));
            format!("loras/{character_id}/{file_name}")
        });

        RunResult {
            success: true,
            artifact_path,
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
        error: Some("training cancelled".to_string()),
        error_type: Some("Cancelled".to_string()),
    }
}

/// Deterministic placeholder bytes standing in for a rendered PNG sample.
fn simulated_sample_bytes(step: u64) -> Vec<u8> {
    format!("simulated-sample step={step}\n").into_bytes()
}

/// Deterministic placeholder bytes standing in for exported LoRA weights.
fn simulated_weights_bytes(steps: u64) -> Vec<u8> {
    format!("simulated-lora-weights steps={steps}\n").into_bytes()
}

#[cfg(test)]
#[path = "training_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! oj-adapters: the concrete `Plugin` implementations the daemon wires up
//! for the two supported backends. Both are deterministic simulations —
//! the real LoRA trainer and image-generation engine are external
//! collaborators invoked through this same contract, out of scope here
//! (spec §1).

mod entry;
pub mod generation;
pub mod training;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use generation::ImageGenerationPlugin;
pub use training::LoraTrainingPlugin;

/// Re-exported for convenience: the `__job_id`/`__sample_dir`/
/// `__volume_root` keys the executor injects into a job's config before
/// calling `Plugin::run` (see `oj_core::plugin::runtime_keys`).
pub use oj_core::runtime_keys;

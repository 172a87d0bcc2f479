//! Ambient render defaults: a `config::Config` builder reading a YAML
//! file under `configuration/`, deserialized through `serde` with
//! `serde-aux` coercing numbers that may arrive as strings (environment
//! overrides).
//!
//! This is strictly about *ambient* configuration — batch size, default
//! seed behavior, logging — not scene content, which lives in
//! [`crate::scene`] and is validated by [`crate::diagnostics`].

use config::ConfigError;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Deserialize, Clone)]
struct RenderDefaultsImpl {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    batch_size: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    max_reflection: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    exposure: f64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    gamma: f64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    no_hit_margin: f64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    dither_seed: u32,
    log_level: String,
}

#[derive(Clone)]
pub struct RenderDefaults {
    pub batch_size: u32,
    pub max_reflection: u32,
    pub exposure: f64,
    pub gamma: f64,
    /// Multiple of the viewport's larger extent used to place the no-hit
    /// bounding box a missed ray is clipped against, instead of `FLT_MAX`.
    pub no_hit_margin: f64,
    /// Fixed seed for the tone-map's per-pixel dither, kept separate from
    /// the scene's `baseSeed` so render determinism doesn't depend on ray
    /// count.
    pub dither_seed: u32,
    pub log_level: String,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        RenderDefaults {
            batch_size: 100_000,
            max_reflection: 1000,
            exposure: 0.0,
            gamma: 1.0,
            no_hit_margin: 1_000.0,
            dither_seed: 0,
            log_level: "info".to_string(),
        }
    }
}

impl From<RenderDefaultsImpl> for RenderDefaults {
    fn from(d: RenderDefaultsImpl) -> Self {
        RenderDefaults {
            batch_size: d.batch_size,
            max_reflection: d.max_reflection,
            exposure: d.exposure,
            gamma: d.gamma,
            no_hit_margin: d.no_hit_margin,
            dither_seed: d.dither_seed,
            log_level: d.log_level,
        }
    }
}

/// Load `configuration/base.yaml` relative to the current directory. A
/// missing or malformed file is a real `Result` error, propagated with
/// `?` — unlike scene-content validation, which never aborts.
pub fn load_render_defaults() -> Result<RenderDefaults, ConfigError> {
    let base_path = std::env::current_dir().expect("failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");
    let f = config::File::from(configuration_directory.join("base.yaml"));
    let settings = config::Config::builder().add_source(f).build()?;

    settings
        .try_deserialize::<RenderDefaultsImpl>()
        .map(RenderDefaults::from)
}

/// Bounds what the `log` facade emits to `defaults.log_level`
/// (`"error"`/`"warn"`/`"info"`/`"debug"`/`"trace"`/`"off"`). The embedding
/// binary still owns the actual logger (`env_logger::init`, etc.); this only
/// narrows what reaches it. An unparseable level is ignored, leaving the
/// previous max level in place.
pub fn apply_log_level(defaults: &RenderDefaults) {
    if let Ok(level) = defaults.log_level.parse::<log::LevelFilter>() {
        log::set_max_level(level);
    }
}

/// Derives a seed from wall-clock time when the scene omits `seed`.
pub fn derive_seed_from_clock() -> u32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    nanos as u32
}

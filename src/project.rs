//! Playback session description.
//!
//! The serialized form a host hands to [`Player::load`](crate::player::Player):
//! optional renderer configuration, opaque scene and camera subtrees for the
//! loader, and the per-object behavior scripts.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Shadow-map filtering mode, applied by the renderer if it supports shadows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowType {
    Basic,
    Pcf,
    PcfSoft,
    Vsm,
}

/// Tone-mapping operator, applied by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapping {
    None,
    Linear,
    Reinhard,
    Cineon,
    AcesFilmic,
}

/// Optional renderer configuration carried in the description. Absent fields
/// leave the renderer's current settings untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub shadows: Option<bool>,
    pub shadow_type: Option<ShadowType>,
    pub tone_mapping: Option<ToneMapping>,
    pub tone_mapping_exposure: Option<f32>,
}

/// One behavior script entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptSource {
    pub source: String,
}

/// A complete playback session description.
///
/// `scene` and `camera` are opaque JSON subtrees interpreted by the
/// [`ObjectLoader`](crate::loader::ObjectLoader). `scripts` maps a target
/// object uuid to its ordered script list; the map is a `BTreeMap` so the
/// cross-object registration order is deterministic (within one object, list
/// order is preserved).
#[derive(Debug, Clone, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub project: Option<ProjectConfig>,
    pub scene: serde_json::Value,
    pub camera: serde_json::Value,
    #[serde(default)]
    pub scripts: BTreeMap<String, Vec<ScriptSource>>,
}

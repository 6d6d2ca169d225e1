//! Scene and camera deserialization boundary.
//!
//! Real deserialization of a full scene format (geometry, materials, assets)
//! lives outside this crate; the player only requires the [`ObjectLoader`]
//! contract. [`JsonLoader`] is the bundled reference implementation for the
//! crate's own minimal JSON object format, enough for headless playback and
//! tests.

use anyhow::{Context, Result};
use glam::Vec3;
use serde::Deserialize;

use crate::camera::Camera;
use crate::scene::{ObjectData, ObjectHandle, Scene};

/// Parses the opaque `scene`/`camera` subtrees of a description.
pub trait ObjectLoader {
    fn parse_scene(&self, value: &serde_json::Value) -> Result<Scene>;
    fn parse_camera(&self, value: &serde_json::Value) -> Result<Camera>;
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct RawObject {
    #[serde(default)]
    uuid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    position: [f32; 3],
    #[serde(default)]
    rotation: [f32; 3],
    #[serde(default = "default_scale")]
    scale: [f32; 3],
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    children: Vec<RawObject>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawScene {
    #[serde(default)]
    children: Vec<RawObject>,
}

fn default_fov() -> f32 {
    45.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 0.0, 10.0]
}

#[derive(Debug, Clone, Deserialize)]
struct RawCamera {
    #[serde(default = "default_fov")]
    fov: f32,
    #[serde(default = "default_near")]
    near: f32,
    #[serde(default = "default_far")]
    far: f32,
    #[serde(default = "default_camera_position")]
    position: [f32; 3],
    #[serde(default)]
    target: [f32; 3],
}

fn build_object(raw: RawObject) -> ObjectHandle {
    let mut data = ObjectData::new(raw.uuid, raw.name);
    data.transform.position = Vec3::from_array(raw.position);
    data.transform.rotation = Vec3::from_array(raw.rotation);
    data.transform.scale = Vec3::from_array(raw.scale);
    data.visible = raw.visible;
    data.children = raw.children.into_iter().map(build_object).collect();
    ObjectHandle::new(data)
}

/// Reference loader for the crate's own JSON object format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl ObjectLoader for JsonLoader {
    fn parse_scene(&self, value: &serde_json::Value) -> Result<Scene> {
        let raw: RawScene =
            serde_json::from_value(value.clone()).context("failed to parse scene description")?;

        let mut scene = Scene::new();
        for child in raw.children {
            scene.add(build_object(child));
        }
        Ok(scene)
    }

    fn parse_camera(&self, value: &serde_json::Value) -> Result<Camera> {
        let raw: RawCamera =
            serde_json::from_value(value.clone()).context("failed to parse camera description")?;

        let mut camera = Camera::new();
        camera.fov = raw.fov;
        camera.near = raw.near;
        camera.far = raw.far;
        camera.position = Vec3::from_array(raw.position);
        camera.target = Vec3::from_array(raw.target);
        camera.update_projection_matrix();
        Ok(camera)
    }
}

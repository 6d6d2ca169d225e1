//! The host API surface visible to behavior scripts.
//!
//! Scripts see a deliberately narrow surface: the bound target object as
//! `this`, a `scene` handle for lookups, and a `camera` handle. Everything
//! writes through shared handles, so mutations are visible to the renderer on
//! the same tick without any sync pass.
//!
//! Inside a handler:
//! - `this.position.x`, `this.rotation.y`, `this.scale.z` - transform access
//! - `this.scale = 2.0` - uniform scale shorthand
//! - `this.visible`, `this.name`, `this.uuid`
//! - `scene.find("name or uuid")` - object lookup, `()` when absent
//! - `camera.position`, `camera.fov`, `camera.look_at(x, y, z)`
//! - `print(...)` / `debug(...)` - routed to the host log, rate-limited

use glam::Vec3;
use rhai::{Dynamic, Engine};

use crate::camera::CameraHandle;
use crate::scene::{ObjectHandle, SceneHandle};
use crate::script_log::{script_log, LogLevel};

/// Handles seeded into every script's scope.
#[derive(Clone)]
pub struct ScriptApi {
    pub scene: SceneHandle,
    pub camera: CameraHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VecField {
    Position,
    Rotation,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
}

/// Write-through accessor for one vector of an object or the camera.
///
/// Property reads produce a proxy, not a copy, so `this.position.x = 1.0`
/// lands on the live node.
#[derive(Clone)]
pub struct Vec3Proxy {
    target: ProxyTarget,
    field: VecField,
}

#[derive(Clone)]
enum ProxyTarget {
    Object(ObjectHandle),
    Camera(CameraHandle),
}

impl Vec3Proxy {
    fn object(handle: ObjectHandle, field: VecField) -> Self {
        Self {
            target: ProxyTarget::Object(handle),
            field,
        }
    }

    fn camera_position(handle: CameraHandle) -> Self {
        Self {
            target: ProxyTarget::Camera(handle),
            field: VecField::Position,
        }
    }

    fn read(&self) -> Vec3 {
        match &self.target {
            ProxyTarget::Object(object) => {
                let object = object.borrow();
                match self.field {
                    VecField::Position => object.transform.position,
                    VecField::Rotation => object.transform.rotation,
                    VecField::Scale => object.transform.scale,
                }
            }
            ProxyTarget::Camera(camera) => camera.borrow().position,
        }
    }

    fn write(&self, value: Vec3) {
        match &self.target {
            ProxyTarget::Object(object) => {
                let mut object = object.borrow_mut();
                let slot = match self.field {
                    VecField::Position => &mut object.transform.position,
                    VecField::Rotation => &mut object.transform.rotation,
                    VecField::Scale => &mut object.transform.scale,
                };
                *slot = value;
            }
            ProxyTarget::Camera(camera) => camera.borrow_mut().position = value,
        }
    }

    fn get(&self, axis: Axis) -> f64 {
        let v = self.read();
        let value = match axis {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        };
        value as f64
    }

    fn set(&self, axis: Axis, value: f64) {
        let mut v = self.read();
        match axis {
            Axis::X => v.x = value as f32,
            Axis::Y => v.y = value as f32,
            Axis::Z => v.z = value as f32,
        }
        self.write(v);
    }
}

/// Register the script-facing types and functions on an engine.
pub fn register_api(engine: &mut Engine) {
    engine.on_print(|message| script_log(LogLevel::Info, message));
    engine.on_debug(|message, _source, _pos| script_log(LogLevel::Debug, message));

    register_vec3_proxy(engine);
    register_object(engine);
    register_scene(engine);
    register_camera(engine);
}

fn register_vec3_proxy(engine: &mut Engine) {
    engine.register_type_with_name::<Vec3Proxy>("Vec3");

    for (name, axis) in [("x", Axis::X), ("y", Axis::Y), ("z", Axis::Z)] {
        engine.register_get_set(
            name,
            move |proxy: &mut Vec3Proxy| proxy.get(axis),
            move |proxy: &mut Vec3Proxy, value: f64| proxy.set(axis, value),
        );
        // Integer literals are i64 in scripts; accept them too.
        engine.register_set(name, move |proxy: &mut Vec3Proxy, value: i64| {
            proxy.set(axis, value as f64)
        });
    }
}

fn register_object(engine: &mut Engine) {
    engine.register_type_with_name::<ObjectHandle>("SceneObject");

    engine.register_get("position", |object: &mut ObjectHandle| {
        Vec3Proxy::object(object.clone(), VecField::Position)
    });
    engine.register_get("rotation", |object: &mut ObjectHandle| {
        Vec3Proxy::object(object.clone(), VecField::Rotation)
    });
    engine.register_get("scale", |object: &mut ObjectHandle| {
        Vec3Proxy::object(object.clone(), VecField::Scale)
    });

    // Whole-vector assignment copies the resolved values, e.g.
    // `this.position = other.position`.
    engine.register_set("position", |object: &mut ObjectHandle, value: Vec3Proxy| {
        // Resolve before borrowing; the proxy may alias this object.
        let value = value.read();
        object.borrow_mut().transform.position = value;
    });
    engine.register_set("rotation", |object: &mut ObjectHandle, value: Vec3Proxy| {
        let value = value.read();
        object.borrow_mut().transform.rotation = value;
    });

    // Uniform scale shorthand: `this.scale = 2.0`.
    engine.register_set("scale", |object: &mut ObjectHandle, value: f64| {
        object.borrow_mut().transform.scale = Vec3::splat(value as f32);
    });
    engine.register_set("scale", |object: &mut ObjectHandle, value: i64| {
        object.borrow_mut().transform.scale = Vec3::splat(value as f32);
    });

    engine.register_get_set(
        "visible",
        |object: &mut ObjectHandle| object.borrow().visible,
        |object: &mut ObjectHandle, value: bool| object.borrow_mut().visible = value,
    );
    engine.register_get("name", |object: &mut ObjectHandle| object.name());
    engine.register_get("uuid", |object: &mut ObjectHandle| object.uuid());
}

fn register_scene(engine: &mut Engine) {
    engine.register_type_with_name::<SceneHandle>("Scene");

    // Lookup by uuid first, then by name; unit when absent.
    engine.register_fn("find", |scene: &mut SceneHandle, key: &str| -> Dynamic {
        let scene = scene.borrow();
        match scene.object_by_uuid(key).or_else(|| scene.object_by_name(key)) {
            Some(object) => Dynamic::from(object),
            None => Dynamic::UNIT,
        }
    });
}

fn register_camera(engine: &mut Engine) {
    engine.register_type_with_name::<CameraHandle>("Camera");

    engine.register_get("position", |camera: &mut CameraHandle| {
        Vec3Proxy::camera_position(camera.clone())
    });
    engine.register_get_set(
        "fov",
        |camera: &mut CameraHandle| camera.borrow().fov as f64,
        |camera: &mut CameraHandle, value: f64| {
            let mut camera = camera.borrow_mut();
            camera.fov = value as f32;
            camera.update_projection_matrix();
        },
    );
    engine.register_get("aspect", |camera: &mut CameraHandle| {
        camera.borrow().aspect as f64
    });
    engine.register_fn(
        "look_at",
        |camera: &mut CameraHandle, x: f64, y: f64, z: f64| {
            camera
                .borrow_mut()
                .look_at(Vec3::new(x as f32, y as f32, z as f32));
        },
    );
}

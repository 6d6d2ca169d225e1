//! Scene-object tree.
//!
//! The player owns the scene; behavior scripts and the camera controller see
//! it through shared handles. Objects use `Rc<RefCell<_>>` because the whole
//! runtime is single-threaded and cooperative: a handler bound to an object
//! mutates it synchronously during dispatch, and the renderer reads it on the
//! same tick.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use glam::Vec3;

/// Local transform of a scene object.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// One node of the scene tree.
#[derive(Debug, Clone, Default)]
pub struct ObjectData {
    pub uuid: String,
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub children: Vec<ObjectHandle>,
}

impl ObjectData {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            transform: Transform::default(),
            visible: true,
            children: Vec::new(),
        }
    }
}

/// Shared handle to a scene object. Cloning is cheap and aliases the node.
#[derive(Debug, Clone)]
pub struct ObjectHandle(Rc<RefCell<ObjectData>>);

impl ObjectHandle {
    pub fn new(data: ObjectData) -> Self {
        Self(Rc::new(RefCell::new(data)))
    }

    pub fn borrow(&self) -> Ref<'_, ObjectData> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ObjectData> {
        self.0.borrow_mut()
    }

    pub fn uuid(&self) -> String {
        self.0.borrow().uuid.clone()
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }
}

/// The scene: a list of root objects.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub children: Vec<ObjectHandle>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root object to the scene.
    pub fn add(&mut self, object: ObjectHandle) {
        self.children.push(object);
    }

    /// Depth-first lookup by uuid.
    pub fn object_by_uuid(&self, uuid: &str) -> Option<ObjectHandle> {
        self.find(|o| o.uuid == uuid)
    }

    /// Depth-first lookup by name.
    pub fn object_by_name(&self, name: &str) -> Option<ObjectHandle> {
        self.find(|o| o.name == name)
    }

    fn find(&self, pred: impl Fn(&ObjectData) -> bool) -> Option<ObjectHandle> {
        fn walk(
            node: &ObjectHandle,
            pred: &impl Fn(&ObjectData) -> bool,
        ) -> Option<ObjectHandle> {
            if pred(&node.borrow()) {
                return Some(node.clone());
            }
            let children = node.borrow().children.clone();
            children.iter().find_map(|c| walk(c, pred))
        }
        self.children.iter().find_map(|c| walk(c, &pred))
    }

    /// Total number of objects in the tree.
    pub fn object_count(&self) -> usize {
        fn count(node: &ObjectHandle) -> usize {
            1 + node.borrow().children.iter().map(count).sum::<usize>()
        }
        self.children.iter().map(count).sum()
    }
}

/// Shared handle to the scene, exposed to scripts and held by the player.
#[derive(Debug, Clone)]
pub struct SceneHandle(Rc<RefCell<Scene>>);

impl SceneHandle {
    pub fn new(scene: Scene) -> Self {
        Self(Rc::new(RefCell::new(scene)))
    }

    pub fn borrow(&self) -> Ref<'_, Scene> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Scene> {
        self.0.borrow_mut()
    }

    /// Replace the scene contents, keeping existing aliases valid.
    pub fn replace(&self, scene: Scene) {
        *self.0.borrow_mut() = scene;
    }
}

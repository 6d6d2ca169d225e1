//! Rendering boundary.
//!
//! Rasterization, shadow maps, and tone mapping live behind the [`Renderer`]
//! trait; the player only asks a renderer to configure itself, resize, and
//! draw a scene/camera pair once per tick. [`HeadlessRenderer`] is a
//! frame-counting no-op for offline use and tests.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use crate::camera::Camera;
use crate::project::ProjectConfig;
use crate::scene::Scene;

pub trait Renderer {
    /// Apply the optional project configuration from a description.
    fn configure(&mut self, config: &ProjectConfig);

    /// Draw one frame of the scene from the camera.
    fn render(&mut self, scene: &Scene, camera: &Camera);

    fn set_size(&mut self, width: u32, height: u32);

    fn set_pixel_ratio(&mut self, ratio: f32);

    /// Release GPU/windowing resources. Called once, on player dispose.
    fn dispose(&mut self);

    /// Opaque handle to the display surface the renderer draws into, for the
    /// host to attach wherever it wants. Headless renderers return `None`.
    fn surface(&self) -> Option<&dyn Any> {
        None
    }
}

/// Renderer that draws nothing and counts frames.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames: Rc<Cell<u64>>,
    size: (u32, u32),
    pixel_ratio: f32,
    config: Option<ProjectConfig>,
    disposed: bool,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            frames: Rc::new(Cell::new(0)),
            size: (0, 0),
            pixel_ratio: 1.0,
            config: None,
            disposed: false,
        }
    }

    /// Shared frame counter, valid after the renderer moves into a player.
    pub fn frame_counter(&self) -> Rc<Cell<u64>> {
        Rc::clone(&self.frames)
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn config(&self) -> Option<&ProjectConfig> {
        self.config.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Renderer for HeadlessRenderer {
    fn configure(&mut self, config: &ProjectConfig) {
        self.config = Some(config.clone());
    }

    fn render(&mut self, _scene: &Scene, _camera: &Camera) {
        self.frames.set(self.frames.get() + 1);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

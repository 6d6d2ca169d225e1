//! Embeddable playback runtime for serialized 3D scenes.
//!
//! A [`Player`](player::Player) loads a scene graph and camera from a JSON
//! [`SceneDescription`](project::SceneDescription), compiles the description's
//! Rhai behavior scripts against their target objects, and drives a per-frame
//! loop that dispatches lifecycle, input, and update events into those
//! scripts before each render. An orbit/zoom camera controller is built in
//! and driven by raw pointer and wheel input forwarded by the host.
//!
//! The rendering engine, the scene format, and the window/event loop are all
//! collaborators behind traits ([`renderer::Renderer`],
//! [`loader::ObjectLoader`]); the host runs its own frame scheduler and calls
//! [`Player::tick`](player::Player::tick) while playback is active.

pub mod camera;
pub mod channel;
pub mod diagnostics;
pub mod event_bus;
pub mod input;
pub mod loader;
pub mod orbit;
pub mod player;
pub mod project;
pub mod renderer;
pub mod scene;
pub mod script_api;
pub mod script_host;
pub mod script_log;

pub use camera::{Camera, CameraHandle};
pub use channel::Channel;
pub use event_bus::{Event, EventBus};
pub use input::InputEvent;
pub use player::{Player, PlayerState};
pub use project::{ProjectConfig, SceneDescription, ScriptSource};
pub use scene::{ObjectData, ObjectHandle, Scene, SceneHandle};

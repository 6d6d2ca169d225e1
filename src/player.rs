//! Playback orchestration.
//!
//! [`Player`] owns the session: it loads a description, compiles behaviors
//! into the event bus, runs the playback clock, routes raw input through the
//! orbit controller, and drives one dispatch-then-render tick per scheduled
//! frame.
//!
//! The frame-scheduling primitive is external: the host runs its own
//! display-synchronized loop and calls [`Player::tick`] while
//! [`Player::is_playing`]. `play`/`stop` only make the player eligible or
//! ineligible for ticking; they do not own a thread or a timer.
//!
//! Failure isolation is deliberately asymmetric: an `update` handler failure
//! during a tick is caught and logged so rendering still happens, while every
//! other channel (including `update` via the offline [`Player::render`] path)
//! propagates to the caller.

use std::any::Any;
use std::time::Instant;

use anyhow::{bail, Result};

use crate::camera::{Camera, CameraHandle};
use crate::channel::Channel;
use crate::event_bus::{Event, EventBus};
use crate::input::InputEvent;
use crate::loader::ObjectLoader;
use crate::orbit::CameraController;
use crate::project::SceneDescription;
use crate::renderer::Renderer;
use crate::scene::{ObjectHandle, Scene, SceneHandle};
use crate::script_api::ScriptApi;
use crate::script_host::ScriptHost;
use crate::script_log::reset_frame_log_count;

/// Playback lifecycle states. `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Loaded,
    Playing,
    Stopped,
    Disposed,
}

/// Wall-clock anchor of the running session, in milliseconds.
///
/// Defined only between `play` and `dispose`; reset on every `play`.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    start: f64,
    prev: f64,
}

impl PlaybackClock {
    fn start_at(now: f64) -> Self {
        Self { start: now, prev: now }
    }

    /// Elapsed-since-start and elapsed-since-previous-tick for `now`.
    fn timing(&self, now: f64) -> (f64, f64) {
        (now - self.start, now - self.prev)
    }

    fn advance(&mut self, now: f64) {
        self.prev = now;
    }

    pub fn start_time(&self) -> f64 {
        self.start
    }

    pub fn previous_time(&self) -> f64 {
        self.prev
    }
}

pub struct Player {
    renderer: Box<dyn Renderer>,
    loader: Box<dyn ObjectLoader>,
    host: ScriptHost,
    bus: EventBus,
    controller: CameraController,
    scene: Option<SceneHandle>,
    camera: Option<CameraHandle>,
    clock: Option<PlaybackClock>,
    state: PlayerState,
    /// Whether raw input is being delivered (between `play` and `stop`).
    listening: bool,
    width: u32,
    height: u32,
    epoch: Instant,
}

impl Player {
    pub fn new(renderer: Box<dyn Renderer>, loader: Box<dyn ObjectLoader>) -> Self {
        Self {
            renderer,
            loader,
            host: ScriptHost::new(),
            bus: EventBus::new(),
            controller: CameraController::new(),
            scene: None,
            camera: None,
            clock: None,
            state: PlayerState::Idle,
            listening: false,
            width: 500,
            height: 500,
            epoch: Instant::now(),
        }
    }

    /// Load a session: configure the renderer, parse scene and camera,
    /// rebuild the event bus from the description's scripts, dispatch `init`.
    ///
    /// Script parse and top-level errors are fatal to the load and surface
    /// here; a script targeting an unknown object uuid is skipped with a
    /// warning.
    pub fn load(&mut self, description: &SceneDescription) -> Result<()> {
        if self.state == PlayerState::Disposed {
            bail!("player is disposed");
        }

        if let Some(project) = &description.project {
            self.renderer.configure(project);
        }

        self.set_scene(self.loader.parse_scene(&description.scene)?);
        self.set_camera(self.loader.parse_camera(&description.camera)?);

        self.bus.clear();

        let scene = self.scene.clone().expect("scene was just set");
        let camera = self.camera.clone().expect("camera was just set");
        let api = ScriptApi {
            scene: scene.clone(),
            camera,
        };

        for (uuid, scripts) in &description.scripts {
            let target = scene.borrow().object_by_uuid(uuid);
            let Some(target) = target else {
                log::warn!("script without object: {uuid}");
                continue;
            };

            for script in scripts {
                let behavior = self.host.compile(&script.source, target.clone(), &api)?;
                self.host.bind(&behavior, &mut self.bus);
            }
        }

        self.bus.dispatch(Channel::Init, &Event::Lifecycle)?;
        self.state = PlayerState::Loaded;
        Ok(())
    }

    /// Start playback using the player's own monotonic clock.
    pub fn play(&mut self) -> Result<()> {
        self.play_at(self.now_ms())
    }

    /// Start playback anchored at an explicit host timestamp (milliseconds).
    pub fn play_at(&mut self, now_ms: f64) -> Result<()> {
        if self.state == PlayerState::Disposed {
            bail!("player is disposed");
        }
        if self.scene.is_none() || self.camera.is_none() {
            bail!("nothing loaded; call load() before play()");
        }

        self.clock = Some(PlaybackClock::start_at(now_ms));
        self.listening = true;
        self.bus.dispatch(Channel::Start, &Event::Lifecycle)?;
        self.state = PlayerState::Playing;
        Ok(())
    }

    /// One frame of the continuous loop, using the player's own clock.
    pub fn tick(&mut self) {
        self.tick_at(self.now_ms());
    }

    /// One frame of the continuous loop at an explicit host timestamp.
    ///
    /// Dispatches `update` with `{time, delta}`, renders, then advances the
    /// clock. An `update` handler failure is logged (message and script
    /// position) and the render still happens. A no-op unless playing.
    pub fn tick_at(&mut self, now_ms: f64) {
        if self.state != PlayerState::Playing {
            return;
        }
        let Some(clock) = self.clock else {
            return;
        };

        reset_frame_log_count();

        let (time, delta) = clock.timing(now_ms);
        if let Err(diag) = self
            .bus
            .dispatch(Channel::Update, &Event::Update { time, delta })
        {
            log::error!("update handler failed: {diag}");
        }

        self.render_frame();

        if let Some(clock) = &mut self.clock {
            clock.advance(now_ms);
        }
    }

    /// Offline single-frame render at `seconds` of playback time.
    ///
    /// Dispatches `update` with `{time: seconds * 1000, delta: 0}` and
    /// renders once. Requires a load but not a play; never advances the
    /// clock, and handler failures propagate.
    pub fn render(&mut self, seconds: f64) -> Result<()> {
        if self.scene.is_none() || self.camera.is_none() {
            bail!("nothing loaded; call load() before render()");
        }

        reset_frame_log_count();
        self.bus.dispatch(
            Channel::Update,
            &Event::Update { time: seconds * 1000.0, delta: 0.0 },
        )?;
        self.render_frame();
        Ok(())
    }

    /// Stop playback. Idempotent, and safe without a prior `play`.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == PlayerState::Disposed {
            return Ok(());
        }

        // Unsubscribing when not subscribed is a no-op.
        self.listening = false;
        self.bus.dispatch(Channel::Stop, &Event::Lifecycle)?;
        if self.state == PlayerState::Playing {
            self.state = PlayerState::Stopped;
        }
        Ok(())
    }

    /// Release renderer resources and drop the session. Terminal.
    pub fn dispose(&mut self) {
        self.renderer.dispose();
        self.scene = None;
        self.camera = None;
        self.clock = None;
        self.listening = false;
        self.state = PlayerState::Disposed;
    }

    /// Deliver a raw input event from the host.
    ///
    /// Ignored while input is not subscribed (outside `play`..`stop`).
    /// Pointer and wheel events drive the orbit controller first, then every
    /// event is dispatched unchanged to its channel; handler failures on
    /// these channels propagate to the caller.
    pub fn handle_input(&mut self, event: &InputEvent) -> Result<()> {
        if !self.listening {
            return Ok(());
        }

        if let Some(camera) = &self.camera {
            match *event {
                InputEvent::PointerDown { x, y } => {
                    self.controller.pointer_down(&camera.borrow(), x, y);
                }
                InputEvent::PointerUp { .. } => {
                    self.controller.pointer_up();
                }
                InputEvent::PointerMove { x, y } => {
                    self.controller.pointer_move(&mut camera.borrow_mut(), x, y);
                }
                InputEvent::Wheel { delta_y } => {
                    self.controller.wheel(&mut camera.borrow_mut(), delta_y);
                }
                InputEvent::KeyDown { .. } | InputEvent::KeyUp { .. } => {}
            }
        }

        self.bus.dispatch(event.channel(), &event.to_event())?;
        Ok(())
    }

    /// Replace the scene, keeping script-held aliases valid.
    pub fn set_scene(&mut self, scene: Scene) {
        match &self.scene {
            Some(handle) => handle.replace(scene),
            None => self.scene = Some(SceneHandle::new(scene)),
        }
    }

    /// Replace the camera and re-establish the aspect invariant.
    pub fn set_camera(&mut self, camera: Camera) {
        match &self.camera {
            Some(handle) => handle.replace(camera),
            None => self.camera = Some(CameraHandle::new(camera)),
        }
        self.apply_aspect();
    }

    /// Resize the viewport. Keeps `camera.aspect == width / height` when a
    /// camera is held; a no-op on the camera (and renderer) after dispose.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.apply_aspect();
        if self.state != PlayerState::Disposed {
            self.renderer.set_size(width, height);
        }
    }

    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        if self.state != PlayerState::Disposed {
            self.renderer.set_pixel_ratio(ratio);
        }
    }

    /// Add a root object to the held scene.
    pub fn add(&mut self, object: ObjectHandle) {
        match &self.scene {
            Some(scene) => scene.borrow_mut().add(object),
            None => log::warn!("add() called with no scene held"),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn scene(&self) -> Option<SceneHandle> {
        self.scene.clone()
    }

    pub fn camera(&self) -> Option<CameraHandle> {
        self.camera.clone()
    }

    pub fn clock(&self) -> Option<PlaybackClock> {
        self.clock
    }

    /// Handlers currently registered under a channel.
    pub fn handler_count(&self, channel: Channel) -> usize {
        self.bus.handler_count(channel)
    }

    /// The renderer's display surface, if it has one.
    pub fn surface(&self) -> Option<&dyn Any> {
        self.renderer.surface()
    }

    fn apply_aspect(&mut self) {
        if let Some(camera) = &self.camera {
            let mut camera = camera.borrow_mut();
            camera.set_aspect(self.width as f32 / self.height as f32);
            camera.update_projection_matrix();
        }
    }

    fn render_frame(&mut self) {
        if let (Some(scene), Some(camera)) = (&self.scene, &self.camera) {
            self.renderer.render(&scene.borrow(), &camera.borrow());
        }
    }

    /// Milliseconds since player construction; the default time source when
    /// the host does not supply timestamps.
    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::JsonLoader;
    use crate::renderer::HeadlessRenderer;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn new_player() -> (Player, Rc<Cell<u64>>) {
        let renderer = HeadlessRenderer::new();
        let frames = renderer.frame_counter();
        (
            Player::new(Box::new(renderer), Box::new(JsonLoader)),
            frames,
        )
    }

    fn description(scripts: serde_json::Value) -> SceneDescription {
        serde_json::from_value(json!({
            "scene": {
                "children": [{ "uuid": "uuid-1", "name": "cube" }]
            },
            "camera": { "position": [0.0, 0.0, 10.0] },
            "scripts": scripts
        }))
        .unwrap()
    }

    #[test]
    fn test_lifecycle_states() {
        let (mut player, _) = new_player();
        assert_eq!(player.state(), PlayerState::Idle);

        player.load(&description(json!({}))).unwrap();
        assert_eq!(player.state(), PlayerState::Loaded);

        player.play_at(0.0).unwrap();
        assert_eq!(player.state(), PlayerState::Playing);

        player.stop().unwrap();
        assert_eq!(player.state(), PlayerState::Stopped);

        player.play_at(100.0).unwrap();
        assert!(player.is_playing());

        player.dispose();
        assert_eq!(player.state(), PlayerState::Disposed);
    }

    #[test]
    fn test_first_tick_timing() {
        let (mut player, _) = new_player();
        player
            .load(&description(json!({
                "uuid-1": [
                    { "source": "fn update(ev) { this.position.x = ev.time; this.position.y = ev.delta; }" }
                ]
            })))
            .unwrap();

        player.play_at(1000.0).unwrap();
        player.tick_at(1016.0);

        let object = player
            .scene()
            .unwrap()
            .borrow()
            .object_by_uuid("uuid-1")
            .unwrap();
        // First tick: time == delta == now - start.
        assert_eq!(object.borrow().transform.position.x, 16.0);
        assert_eq!(object.borrow().transform.position.y, 16.0);
    }

    #[test]
    fn test_delta_tracks_previous_tick() {
        let (mut player, _) = new_player();
        player
            .load(&description(json!({
                "uuid-1": [
                    { "source": "fn update(ev) { this.position.x = ev.time; this.position.y = ev.delta; }" }
                ]
            })))
            .unwrap();

        player.play_at(0.0).unwrap();
        player.tick_at(16.0);
        player.tick_at(48.0);

        let object = player
            .scene()
            .unwrap()
            .borrow()
            .object_by_uuid("uuid-1")
            .unwrap();
        assert_eq!(object.borrow().transform.position.x, 48.0);
        assert_eq!(object.borrow().transform.position.y, 32.0);
    }

    #[test]
    fn test_clock_resets_on_replay() {
        let (mut player, _) = new_player();
        player.load(&description(json!({}))).unwrap();

        player.play_at(1000.0).unwrap();
        player.tick_at(1500.0);
        player.stop().unwrap();

        player.play_at(5000.0).unwrap();
        let clock = player.clock().unwrap();
        assert_eq!(clock.start_time(), 5000.0);
        assert_eq!(clock.previous_time(), 5000.0);
    }

    #[test]
    fn test_tick_outside_playing_is_noop() {
        let (mut player, frames) = new_player();
        player.load(&description(json!({}))).unwrap();

        player.tick_at(0.0);
        assert_eq!(frames.get(), 0);

        player.play_at(0.0).unwrap();
        player.tick_at(16.0);
        assert_eq!(frames.get(), 1);

        player.stop().unwrap();
        player.tick_at(32.0);
        assert_eq!(frames.get(), 1);
    }

    #[test]
    fn test_update_failure_does_not_abort_tick() {
        let (mut player, frames) = new_player();
        player
            .load(&description(json!({
                "uuid-1": [ { "source": "fn update(ev) { this.no_such_property = 1; }" } ]
            })))
            .unwrap();

        player.play_at(0.0).unwrap();
        player.tick_at(16.0);

        // The failure was caught and logged; the frame was still rendered.
        assert_eq!(frames.get(), 1);
        assert!(player.is_playing());
    }

    #[test]
    fn test_offline_render_timing() {
        let (mut player, frames) = new_player();
        player
            .load(&description(json!({
                "uuid-1": [
                    { "source": "fn update(ev) { this.position.x = ev.time; this.position.y = ev.delta; }" }
                ]
            })))
            .unwrap();

        player.render(2.5).unwrap();
        assert_eq!(frames.get(), 1);

        let object = player
            .scene()
            .unwrap()
            .borrow()
            .object_by_uuid("uuid-1")
            .unwrap();
        assert_eq!(object.borrow().transform.position.x, 2500.0);
        assert_eq!(object.borrow().transform.position.y, 0.0);
    }

    #[test]
    fn test_script_without_object_is_skipped() {
        let (mut player, _) = new_player();
        player
            .load(&description(json!({
                "missing-uuid": [ { "source": "fn update(ev) {}" } ],
                "uuid-1": [ { "source": "fn update(ev) {}" } ]
            })))
            .unwrap();

        // Only the script with a resolvable target was registered.
        assert_eq!(player.handler_count(Channel::Update), 1);
    }

    #[test]
    fn test_script_compile_error_fails_load() {
        let (mut player, _) = new_player();
        player
            .load(&description(json!({
                "uuid-1": [ { "source": "fn update(ev) { let x = ; }" } ]
            })))
            .unwrap_err();
        // The failed load never reached Loaded.
        assert_eq!(player.state(), PlayerState::Idle);
    }

    #[test]
    fn test_stop_without_play_is_safe() {
        let (mut player, _) = new_player();
        player.stop().unwrap();
        assert_eq!(player.state(), PlayerState::Idle);

        player.load(&description(json!({}))).unwrap();
        player.stop().unwrap();
        player.stop().unwrap();
    }

    #[test]
    fn test_dispose_then_resize_is_noop() {
        let (mut player, _) = new_player();
        player.load(&description(json!({}))).unwrap();
        player.dispose();

        player.set_size(800, 600);
        player.set_pixel_ratio(2.0);
        assert!(player.camera().is_none());
        assert!(player.clock().is_none());
    }

    #[test]
    fn test_aspect_invariant_on_resize() {
        let (mut player, _) = new_player();
        player.load(&description(json!({}))).unwrap();

        player.set_size(800, 400);
        let camera = player.camera().unwrap();
        assert_eq!(camera.borrow().aspect, 2.0);
    }

    #[test]
    fn test_input_ignored_when_not_playing() {
        let (mut player, _) = new_player();
        player
            .load(&description(json!({
                "uuid-1": [ { "source": "fn pointerdown(ev) { this.position.x = ev.x; }" } ]
            })))
            .unwrap();

        player
            .handle_input(&InputEvent::PointerDown { x: 9.0, y: 9.0 })
            .unwrap();

        let object = player
            .scene()
            .unwrap()
            .borrow()
            .object_by_uuid("uuid-1")
            .unwrap();
        assert_eq!(object.borrow().transform.position.x, 0.0);
    }

    #[test]
    fn test_lifecycle_channels_fire() {
        let (mut player, _) = new_player();
        player
            .load(&description(json!({
                "uuid-1": [ { "source": "
                    fn init() { this.position.x = 1.0; }
                    fn start() { this.position.y = 1.0; }
                    fn stop() { this.position.z = 1.0; }
                " } ]
            })))
            .unwrap();

        let object = player
            .scene()
            .unwrap()
            .borrow()
            .object_by_uuid("uuid-1")
            .unwrap();
        assert_eq!(object.borrow().transform.position.x, 1.0);
        assert_eq!(object.borrow().transform.position.y, 0.0);

        player.play_at(0.0).unwrap();
        assert_eq!(object.borrow().transform.position.y, 1.0);

        player.stop().unwrap();
        assert_eq!(object.borrow().transform.position.z, 1.0);
    }

    #[test]
    fn test_load_rebuilds_bus() {
        let (mut player, _) = new_player();
        let desc = description(json!({
            "uuid-1": [ { "source": "fn update(ev) {}" } ]
        }));

        player.load(&desc).unwrap();
        player.load(&desc).unwrap();
        // No handler carry-over across loads.
        assert_eq!(player.handler_count(Channel::Update), 1);
    }
}

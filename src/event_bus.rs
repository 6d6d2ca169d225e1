//! Ordered multicast registry for channel handlers.
//!
//! The bus holds no timing or domain logic: `register` appends a handler to a
//! channel's list and `dispatch` invokes the list in registration order. The
//! whole bus is rebuilt from empty on every load.
//!
//! A handler failure stops that dispatch and is returned to the caller; the
//! playback tick catches `update` failures, every other channel propagates
//! (the asymmetry is deliberate, see the player module).

use rhai::Dynamic;

use crate::channel::Channel;
use crate::diagnostics::ScriptDiagnostic;

/// Payload passed to handlers. Converted to a Rhai map at the call boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `init`, `start`, `stop`: no payload.
    Lifecycle,
    /// Per-frame tick. Both fields are in milliseconds.
    Update { time: f64, delta: f64 },
    /// `keydown` / `keyup`.
    Key { code: String },
    /// `pointerdown` / `pointerup` / `pointermove`, in host pixels.
    Pointer { x: f32, y: f32 },
    /// `onWheel`.
    Wheel { delta_y: f32 },
}

impl Event {
    /// Build the Rhai-side event object.
    pub fn to_rhai(&self) -> Dynamic {
        let mut map = rhai::Map::new();
        match self {
            Event::Lifecycle => {}
            Event::Update { time, delta } => {
                map.insert("time".into(), Dynamic::from(*time));
                map.insert("delta".into(), Dynamic::from(*delta));
            }
            Event::Key { code } => {
                map.insert("code".into(), Dynamic::from(code.clone()));
            }
            Event::Pointer { x, y } => {
                map.insert("x".into(), Dynamic::from(*x as f64));
                map.insert("y".into(), Dynamic::from(*y as f64));
            }
            Event::Wheel { delta_y } => {
                map.insert("delta_y".into(), Dynamic::from(*delta_y as f64));
            }
        }
        Dynamic::from(map)
    }
}

/// A bound channel handler. Return values of script handlers are ignored;
/// only failures surface.
pub type Handler = Box<dyn FnMut(&Event) -> Result<(), ScriptDiagnostic>>;

/// Fixed-channel handler registry.
pub struct EventBus {
    channels: [Vec<Handler>; Channel::COUNT],
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|_| Vec::new()),
        }
    }

    /// Append a handler to a channel's ordered list.
    pub fn register(&mut self, channel: Channel, handler: Handler) {
        self.channels[channel.index()].push(handler);
    }

    /// Invoke every handler registered under `channel`, in registration
    /// order. Stops at (and returns) the first failure.
    pub fn dispatch(&mut self, channel: Channel, event: &Event) -> Result<(), ScriptDiagnostic> {
        for handler in &mut self.channels[channel.index()] {
            handler(event)?;
        }
        Ok(())
    }

    /// Number of handlers registered under a channel.
    pub fn handler_count(&self, channel: Channel) -> usize {
        self.channels[channel.index()].len()
    }

    /// Drop all handlers. Called on every load.
    pub fn clear(&mut self) {
        for list in &mut self.channels {
            list.clear();
        }
    }
}
